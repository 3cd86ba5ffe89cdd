//! Progress mutation engine.
//!
//! Applies draft, completion and skip updates to a single exercise slot,
//! then recomputes the aggregate counters and session status from the slot
//! statuses. Functions here are pure over a `SessionProgress`; callers wrap
//! them in a store transaction.
//!
//! ## Status derivation
//!
//! 1. `completed == total` and `total > 0` → `completed`
//! 2. `completed > 0` or `in_progress > 0` → `partial`
//! 3. otherwise → `not_started`
//!
//! `completed` is terminal: once reached, naturally or through
//! `end_workout`, later mutations keep it. A completed slot cannot be
//! skipped, so counters never fall below a natural completion.

use crate::initializer::build_slot;
use crate::template::SessionTemplate;
use crate::validation::validate_progress;
use crate::{
    Error, ExerciseData, ExerciseProgressSlot, ExerciseUpdate, ProgressDocument, ProgressPayload,
    ProgressSummary, Result, SessionProgress, SessionStatus, SlotStatus,
};
use chrono::{DateTime, Utc};

/// Outcome of rebuilding a record's slots from its template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepairReport {
    /// Slots whose progress survived the rebuild
    pub carried: usize,
    /// Slots seeded fresh from the template
    pub seeded: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotAction {
    Draft,
    Complete,
}

/// Recount summary counters from slot statuses
pub fn recompute_summary(exercises: &[ExerciseProgressSlot]) -> ProgressSummary {
    let count = |status: SlotStatus| exercises.iter().filter(|s| s.status == status).count() as u32;

    ProgressSummary {
        total_exercises: exercises.len() as u32,
        completed_exercises: count(SlotStatus::Completed),
        in_progress_exercises: count(SlotStatus::InProgress),
        skipped_exercises: count(SlotStatus::Skipped),
    }
}

/// Derive the session status from counters alone
pub fn derive_status(summary: &ProgressSummary) -> SessionStatus {
    if summary.total_exercises > 0 && summary.completed_exercises == summary.total_exercises {
        SessionStatus::Completed
    } else if summary.completed_exercises > 0 || summary.in_progress_exercises > 0 {
        SessionStatus::Partial
    } else {
        SessionStatus::NotStarted
    }
}

/// Recompute counters and status as the last step of every mutation
fn settle(record: &mut SessionProgress, now: DateTime<Utc>) {
    record.progress.summary = recompute_summary(&record.progress.exercises);
    if record.status != SessionStatus::Completed {
        record.status = derive_status(&record.progress.summary);
    }
    if record.status == SessionStatus::Completed && record.completed_at.is_none() {
        record.completed_at = Some(now);
    }
    record.updated_at = now;
}

/// Whether `index` cannot be served by the current slot list
pub fn needs_repair(document: &ProgressDocument, index: usize) -> bool {
    document.exercises.is_empty() || index >= document.exercises.len()
}

/// Rebuild the slot list from the current template
///
/// Slots whose prescribed exercise still exists with the same type keep
/// their status, data, notes and videos; everything else is seeded fresh.
pub fn repair_slots(
    record: &mut SessionProgress,
    template: &SessionTemplate,
    now: DateTime<Utc>,
) -> Result<RepairReport> {
    let mut exercises: Vec<_> = template.exercises.iter().collect();
    exercises.sort_by_key(|e| e.position);
    let fresh = exercises
        .into_iter()
        .map(build_slot)
        .collect::<Result<Vec<_>>>()?;

    let mut previous = std::mem::take(&mut record.progress.exercises);
    let mut rebuilt = Vec::with_capacity(fresh.len());
    let mut report = RepairReport {
        carried: 0,
        seeded: 0,
    };

    for mut slot in fresh {
        if let Some(idx) = previous.iter().position(|old| {
            old.prescribed_id == slot.prescribed_id && old.exercise_type == slot.exercise_type
        }) {
            let old = previous.swap_remove(idx);
            slot.status = old.status;
            slot.data = old.data;
            slot.notes = old.notes;
            slot.videos = old.videos;
            report.carried += 1;
        } else {
            report.seeded += 1;
        }
        rebuilt.push(slot);
    }

    tracing::warn!(
        "Repaired progress {} from session {} template: {} slots carried, {} seeded, {} dropped",
        record.id,
        template.id,
        report.carried,
        report.seeded,
        previous.len()
    );

    record.progress.exercises = rebuilt;
    record.progress.repaired_at = Some(now);
    settle(record, now);
    Ok(report)
}

/// Make sure `index` addresses a slot, repairing from the template if not
///
/// The template is only loaded when a repair is needed. Returns the repair
/// report when one happened.
pub fn ensure_slot<F>(
    record: &mut SessionProgress,
    index: usize,
    load_template: F,
    now: DateTime<Utc>,
) -> Result<Option<RepairReport>>
where
    F: FnOnce(&str) -> Result<SessionTemplate>,
{
    if !needs_repair(&record.progress, index) {
        return Ok(None);
    }

    // Past the end of the template no rebuild can serve the index
    let template = load_template(&record.session_id)?;
    if index >= template.exercises.len() {
        return Err(Error::invalid(format!(
            "exercise index {} out of range, session has {} exercises",
            index,
            template.exercises.len()
        )));
    }

    let report = repair_slots(record, &template, now)?;
    Ok(Some(report))
}

/// Partial save of one slot; repeatable
pub fn apply_draft(
    record: &mut SessionProgress,
    index: usize,
    update: &ExerciseUpdate,
    now: DateTime<Utc>,
) -> Result<()> {
    apply_update(record, index, update, SlotAction::Draft, now)
}

/// Terminal save of one slot; marks it completed regardless of prior state
pub fn complete_exercise(
    record: &mut SessionProgress,
    index: usize,
    update: &ExerciseUpdate,
    now: DateTime<Utc>,
) -> Result<()> {
    apply_update(record, index, update, SlotAction::Complete, now)
}

/// Mark one slot skipped, recording the reason in its notes
///
/// A completed slot stays completed; skipping it is rejected.
pub fn skip_exercise(
    record: &mut SessionProgress,
    index: usize,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let slot = slot_mut(record, index)?;
    if slot.status == SlotStatus::Completed {
        return Err(Error::invalid(format!(
            "exercise {} is already completed and cannot be skipped",
            index
        )));
    }
    slot.status = SlotStatus::Skipped;
    slot.notes = reason.to_string();
    tracing::debug!("Skipped exercise {} of progress {}", index, record.id);

    settle(record, now);
    Ok(())
}

/// Explicit student finish: forces `completed` independent of the counters
pub fn end_workout(
    record: &mut SessionProgress,
    notes: Option<&str>,
    videos: &[String],
    now: DateTime<Utc>,
) {
    if let Some(notes) = notes {
        record.notes = notes.to_string();
    }
    merge_videos(&mut record.videos, videos);

    record.progress.summary = recompute_summary(&record.progress.exercises);
    record.status = SessionStatus::Completed;
    record.completed_at.get_or_insert(now);
    record.updated_at = now;
}

fn slot_mut(record: &mut SessionProgress, index: usize) -> Result<&mut ExerciseProgressSlot> {
    let len = record.progress.exercises.len();
    record.progress.exercises.get_mut(index).ok_or_else(|| {
        Error::invalid(format!(
            "exercise index {} out of range, session has {} exercises",
            index, len
        ))
    })
}

fn apply_update(
    record: &mut SessionProgress,
    index: usize,
    update: &ExerciseUpdate,
    action: SlotAction,
    now: DateTime<Utc>,
) -> Result<()> {
    let record_id = record.id;
    let slot = slot_mut(record, index)?;

    // Validate everything before touching the slot
    if let Some(payload) = &update.progress {
        validate_progress(payload, slot.exercise_type, &slot.config)?;
        merge_payload(&mut slot.data, payload)?;
    }

    if let Some(notes) = &update.notes {
        slot.notes = notes.clone();
    }
    merge_videos(&mut slot.videos, &update.videos);

    slot.status = match action {
        SlotAction::Complete => SlotStatus::Completed,
        SlotAction::Draft if slot.status == SlotStatus::Completed => SlotStatus::Completed,
        SlotAction::Draft => SlotStatus::InProgress,
    };

    tracing::debug!(
        "Applied {:?} to exercise {} ({}) of progress {}",
        action,
        index,
        slot.exercise_type,
        record_id
    );

    settle(record, now);
    Ok(())
}

/// Set-union append of video references, preserving first-seen order
fn merge_videos(existing: &mut Vec<String>, incoming: &[String]) {
    for video in incoming {
        if !existing.contains(video) {
            existing.push(video.clone());
        }
    }
}

/// Merge a validated payload into slot data; omitted fields are kept
fn merge_payload(data: &mut ExerciseData, payload: &ProgressPayload) -> Result<()> {
    match (data, payload) {
        (
            ExerciseData::Standard {
                sets_completed,
                reps_completed,
                reps_per_set,
                weight_used,
                rpe,
                notes,
            },
            ProgressPayload::Standard {
                sets_completed: new_sets,
                reps_completed: new_reps,
                reps_per_set: new_reps_per_set,
                weight_used: new_weight,
                rpe: new_rpe,
                notes: new_notes,
            },
        ) => {
            set_if_some(sets_completed, *new_sets);
            // Per-set reps are the source of truth for the total
            if let Some(per_set) = new_reps_per_set {
                *reps_per_set = per_set.clone();
                *reps_completed = per_set.iter().fold(0u32, |acc, r| acc.saturating_add(*r));
            } else {
                set_if_some(reps_completed, *new_reps);
            }
            set_option_if_some(weight_used, *new_weight);
            set_option_if_some(rpe, *new_rpe);
            set_notes(notes, new_notes);
        }
        (
            ExerciseData::Emom {
                reps_per_minute,
                rpe,
                notes,
            },
            ProgressPayload::Emom {
                reps_per_minute: new_minutes,
                rpe: new_rpe,
                notes: new_notes,
            },
        ) => {
            if let Some(minutes) = new_minutes {
                *reps_per_minute = minutes.clone();
            }
            set_option_if_some(rpe, *new_rpe);
            set_notes(notes, new_notes);
        }
        (
            ExerciseData::Amrap {
                total_reps,
                rpe,
                notes,
            },
            ProgressPayload::Amrap {
                total_reps: new_total,
                rpe: new_rpe,
                notes: new_notes,
            },
        ) => {
            set_if_some(total_reps, *new_total);
            set_option_if_some(rpe, *new_rpe);
            set_notes(notes, new_notes);
        }
        (
            ExerciseData::Circuit {
                rounds_completed,
                total_reps,
                weight_used,
                rpe,
                notes,
            },
            ProgressPayload::Circuit {
                rounds_completed: new_rounds,
                total_reps: new_total,
                weight_used: new_weight,
                rpe: new_rpe,
                notes: new_notes,
            },
        ) => {
            set_if_some(rounds_completed, *new_rounds);
            set_if_some(total_reps, *new_total);
            set_option_if_some(weight_used, *new_weight);
            set_option_if_some(rpe, *new_rpe);
            set_notes(notes, new_notes);
        }
        (data, payload) => {
            return Err(Error::invalid(format!(
                "cannot merge {} progress into {} data",
                payload.exercise_type(),
                data.exercise_type()
            )))
        }
    }
    Ok(())
}

fn set_if_some<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

fn set_option_if_some<T: Copy>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

fn set_notes(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializer::build_record;
    use crate::sample::sample_library;
    use crate::template::TemplateReader;

    fn record_for(session_id: &str) -> SessionProgress {
        let template = sample_library().session_template(session_id).unwrap();
        build_record(&template, "student-1", None, Utc::now()).unwrap()
    }

    fn single_standard_template() -> SessionTemplate {
        let mut template = sample_library().session_template("w1-upper").unwrap();
        template.exercises.truncate(1);
        template
    }

    fn standard(sets: u32, per_set: Vec<u32>) -> ExerciseUpdate {
        ExerciseUpdate {
            progress: Some(ProgressPayload::Standard {
                sets_completed: Some(sets),
                reps_completed: None,
                reps_per_set: Some(per_set),
                weight_used: None,
                rpe: None,
                notes: None,
            }),
            ..ExerciseUpdate::default()
        }
    }

    fn summary(total: u32, completed: u32, in_progress: u32) -> ProgressSummary {
        ProgressSummary {
            total_exercises: total,
            completed_exercises: completed,
            in_progress_exercises: in_progress,
            skipped_exercises: 0,
        }
    }

    fn assert_invariants(record: &SessionProgress) {
        let s = record.progress.summary();
        assert_eq!(s.total_exercises as usize, record.progress.exercises().len());
        assert!(
            s.completed_exercises + s.in_progress_exercises + s.skipped_exercises
                <= s.total_exercises
        );
        for slot in record.progress.exercises() {
            assert_eq!(slot.data.exercise_type(), slot.exercise_type);
        }
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(derive_status(&summary(3, 0, 0)), SessionStatus::NotStarted);
        assert_eq!(derive_status(&summary(3, 1, 0)), SessionStatus::Partial);
        assert_eq!(derive_status(&summary(3, 0, 2)), SessionStatus::Partial);
        assert_eq!(derive_status(&summary(3, 3, 0)), SessionStatus::Completed);
        assert_eq!(derive_status(&summary(0, 0, 0)), SessionStatus::NotStarted);
    }

    #[test]
    fn test_standard_draft_then_complete() {
        let template = single_standard_template();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();

        apply_draft(&mut record, 0, &standard(2, vec![8, 9]), Utc::now()).unwrap();
        let slot = &record.progress.exercises()[0];
        assert_eq!(slot.status, SlotStatus::InProgress);
        match &slot.data {
            ExerciseData::Standard { reps_completed, sets_completed, .. } => {
                assert_eq!(*reps_completed, 17);
                assert_eq!(*sets_completed, 2);
            }
            other => panic!("Expected standard data, got {:?}", other),
        }
        assert_eq!(record.status(), SessionStatus::Partial);

        complete_exercise(&mut record, 0, &standard(3, vec![8, 9, 10]), Utc::now()).unwrap();
        let slot = &record.progress.exercises()[0];
        assert_eq!(slot.status, SlotStatus::Completed);
        match &slot.data {
            ExerciseData::Standard { reps_completed, .. } => assert_eq!(*reps_completed, 27),
            other => panic!("Expected standard data, got {:?}", other),
        }
        assert_eq!(record.status(), SessionStatus::Completed);
        assert!(record.completed_at.is_some());
        assert_invariants(&record);
    }

    #[test]
    fn test_reps_per_set_overrides_caller_total() {
        let mut record = record_for("w1-upper");
        let update = ExerciseUpdate {
            progress: Some(ProgressPayload::Standard {
                sets_completed: Some(2),
                reps_completed: Some(100),
                reps_per_set: Some(vec![5, 6]),
                weight_used: None,
                rpe: None,
                notes: None,
            }),
            ..ExerciseUpdate::default()
        };
        apply_draft(&mut record, 0, &update, Utc::now()).unwrap();
        match &record.progress.exercises()[0].data {
            ExerciseData::Standard { reps_completed, .. } => assert_eq!(*reps_completed, 11),
            other => panic!("Expected standard data, got {:?}", other),
        }
    }

    #[test]
    fn test_draft_keeps_omitted_fields() {
        let mut record = record_for("w1-lower");
        let first = ExerciseUpdate {
            progress: Some(ProgressPayload::Circuit {
                rounds_completed: Some(2),
                total_reps: Some(24),
                weight_used: Some(16.0),
                rpe: Some(7),
                notes: None,
            }),
            ..ExerciseUpdate::default()
        };
        apply_draft(&mut record, 3, &first, Utc::now()).unwrap();

        let second = ExerciseUpdate {
            progress: Some(ProgressPayload::Circuit {
                rounds_completed: Some(3),
                total_reps: None,
                weight_used: None,
                rpe: None,
                notes: Some("grip gave out".into()),
            }),
            ..ExerciseUpdate::default()
        };
        apply_draft(&mut record, 3, &second, Utc::now()).unwrap();

        assert_eq!(
            record.progress.exercises()[3].data,
            ExerciseData::Circuit {
                rounds_completed: 3,
                total_reps: 24,
                weight_used: Some(16.0),
                rpe: Some(7),
                notes: "grip gave out".into(),
            }
        );
    }

    #[test]
    fn test_draft_does_not_reopen_completed_slot() {
        let mut record = record_for("w1-upper");
        complete_exercise(&mut record, 1, &standard(3, vec![5, 5, 5]), Utc::now()).unwrap();
        apply_draft(&mut record, 1, &standard(3, vec![5, 5, 4]), Utc::now()).unwrap();
        assert_eq!(record.progress.exercises()[1].status, SlotStatus::Completed);
    }

    #[test]
    fn test_wrong_shape_rejected_without_change() {
        let mut record = record_for("w1-lower");
        let before = record.updated_at;
        let update = ExerciseUpdate {
            progress: Some(ProgressPayload::Amrap {
                total_reps: Some(40),
                rpe: None,
                notes: None,
            }),
            videos: vec!["vid-1".into()],
            notes: None,
        };

        let result = apply_draft(&mut record, 0, &update, Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(record.progress.exercises()[0].status, SlotStatus::NotStarted);
        assert!(record.progress.exercises()[0].videos.is_empty());
        assert_eq!(record.updated_at, before);
    }

    #[test]
    fn test_videos_are_deduplicated() {
        let mut record = record_for("w1-lower");
        let update = ExerciseUpdate {
            progress: None,
            videos: vec!["a.mp4".into(), "b.mp4".into(), "a.mp4".into()],
            notes: None,
        };
        apply_draft(&mut record, 2, &update, Utc::now()).unwrap();
        apply_draft(&mut record, 2, &update, Utc::now()).unwrap();
        assert_eq!(
            record.progress.exercises()[2].videos,
            vec!["a.mp4".to_string(), "b.mp4".to_string()]
        );
    }

    #[test]
    fn test_skip_counts_and_recomputes() {
        let mut template = sample_library().session_template("w1-upper").unwrap();
        template.exercises.truncate(2);
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();

        skip_exercise(&mut record, 0, "sore shoulder", Utc::now()).unwrap();
        assert_eq!(record.progress.summary().skipped_exercises, 1);
        assert_eq!(record.progress.summary().total_exercises, 2);
        assert_eq!(record.progress.exercises()[0].notes, "sore shoulder");
        assert_eq!(record.status(), SessionStatus::NotStarted);

        complete_exercise(&mut record, 1, &standard(3, vec![5, 5, 5]), Utc::now()).unwrap();
        assert_eq!(record.status(), SessionStatus::Partial);
        assert_invariants(&record);
    }

    #[test]
    fn test_skip_status_follows_counters() {
        let mut record = record_for("w1-upper");
        apply_draft(&mut record, 0, &standard(1, vec![10]), Utc::now()).unwrap();
        assert_eq!(record.status(), SessionStatus::Partial);

        // The only in-progress slot is skipped
        skip_exercise(&mut record, 0, "skipped", Utc::now()).unwrap();
        assert_eq!(record.status(), SessionStatus::NotStarted);
        assert_eq!(record.status(), derive_status(record.progress.summary()));
    }

    #[test]
    fn test_completed_slot_cannot_be_skipped() {
        let template = single_standard_template();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();
        complete_exercise(&mut record, 0, &standard(3, vec![10, 10, 10]), Utc::now()).unwrap();
        assert_eq!(record.status(), SessionStatus::Completed);
        let updated_at = record.updated_at;

        let result = skip_exercise(&mut record, 0, "changed my mind", Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(record.progress.exercises()[0].status, SlotStatus::Completed);
        assert_eq!(record.progress.summary().completed_exercises, 1);
        assert_eq!(record.progress.summary().skipped_exercises, 0);
        assert_eq!(record.status(), derive_status(record.progress.summary()));
        assert_eq!(record.updated_at, updated_at);
    }

    #[test]
    fn test_zero_reps_per_set_keeps_previous_total() {
        let template = single_standard_template();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();
        apply_draft(&mut record, 0, &standard(2, vec![8, 9]), Utc::now()).unwrap();

        for bad in [vec![0, 0], vec![]] {
            let result = apply_draft(&mut record, 0, &standard(2, bad), Utc::now());
            assert!(matches!(result, Err(Error::InvalidInput(_))));
        }

        match &record.progress.exercises()[0].data {
            ExerciseData::Standard {
                reps_completed,
                reps_per_set,
                ..
            } => {
                assert_eq!(*reps_completed, 17);
                assert_eq!(reps_per_set, &vec![8, 9]);
            }
            other => panic!("Expected standard data, got {:?}", other),
        }
    }

    #[test]
    fn test_end_workout_forces_completed() {
        let mut record = record_for("w1-lower");
        complete_exercise(&mut record, 0, &standard(3, vec![10, 10, 10]), Utc::now()).unwrap();
        assert_eq!(record.progress.summary().completed_exercises, 1);

        end_workout(&mut record, Some("felt strong"), &["final.mp4".into()], Utc::now());
        assert_eq!(record.status(), SessionStatus::Completed);
        assert_eq!(record.progress.summary().completed_exercises, 1);
        assert_eq!(record.notes, "felt strong");
        assert_eq!(record.videos, vec!["final.mp4".to_string()]);

        let completed_at = record.completed_at;
        apply_draft(&mut record, 1, &ExerciseUpdate::default(), Utc::now()).unwrap();
        assert_eq!(record.status(), SessionStatus::Completed);
        assert_eq!(record.completed_at, completed_at);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let mut record = record_for("w1-upper");
        let result = skip_exercise(&mut record, 5, "x", Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_repair_rebuilds_empty_slots() {
        let template = sample_library().session_template("w1-lower").unwrap();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();
        record.progress.exercises.clear();
        record.progress.summary = ProgressSummary::default();

        let report = ensure_slot(&mut record, 2, |_| Ok(template.clone()), Utc::now())
            .unwrap()
            .expect("repair should run");
        assert_eq!(report, RepairReport { carried: 0, seeded: 4 });
        assert_eq!(record.progress.exercises().len(), 4);
        assert!(record.progress.repaired_at.is_some());
        assert_invariants(&record);
    }

    #[test]
    fn test_repair_carries_matching_progress() {
        let mut template = sample_library().session_template("w1-upper").unwrap();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();
        complete_exercise(&mut record, 1, &standard(3, vec![5, 5, 5]), Utc::now()).unwrap();

        // Coach drops the first exercise and adds two new ones
        template.exercises.remove(0);
        let mut added = template.exercises[0].clone();
        added.id = "w1-upper-3".into();
        added.position = 3;
        let mut added_again = added.clone();
        added_again.id = "w1-upper-4".into();
        added_again.position = 4;
        template.exercises.push(added);
        template.exercises.push(added_again);

        let report = ensure_slot(&mut record, 2, |_| Ok(template.clone()), Utc::now())
            .unwrap()
            .expect("repair should run");
        assert_eq!(report, RepairReport { carried: 1, seeded: 2 });
        assert_eq!(record.progress.exercises()[0].prescribed_id, "w1-upper-2");
        assert_eq!(record.progress.exercises()[0].status, SlotStatus::Completed);
        assert_eq!(record.progress.summary().completed_exercises, 1);
        assert_invariants(&record);
    }

    #[test]
    fn test_ensure_slot_skips_template_when_healthy() {
        let mut record = record_for("w1-lower");
        let result = ensure_slot(
            &mut record,
            1,
            |_| -> Result<SessionTemplate> { panic!("template should not be loaded") },
            Utc::now(),
        )
        .unwrap();
        assert!(result.is_none());
        assert!(record.progress.repaired_at.is_none());
    }

    #[test]
    fn test_repair_still_out_of_range_is_invalid() {
        let template = sample_library().session_template("w2-deload").unwrap();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();

        let result = ensure_slot(&mut record, 7, |_| Ok(template.clone()), Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(record.progress.exercises().len(), 1);
        assert!(record.progress.repaired_at.is_none());
    }

    #[test]
    fn test_bad_index_on_unchanged_template_is_not_repaired() {
        let template = sample_library().session_template("w1-upper").unwrap();
        let mut record = build_record(&template, "student-1", None, Utc::now()).unwrap();
        complete_exercise(&mut record, 0, &standard(3, vec![10, 10, 10]), Utc::now()).unwrap();
        let updated_at = record.updated_at;

        let result = ensure_slot(&mut record, 2, |_| Ok(template.clone()), Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(record.progress.repaired_at.is_none());
        assert_eq!(record.updated_at, updated_at);
        assert_eq!(record.progress.exercises()[0].status, SlotStatus::Completed);
    }
}

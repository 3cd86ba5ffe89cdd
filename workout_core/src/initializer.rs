//! Lazy creation of session progress records from a session template.
//!
//! A record is seeded the first time a student touches a session: one
//! `not_started` slot per prescribed exercise, each holding zeroed progress
//! data of the exercise's shape.

use crate::store::ProgressStore;
use crate::template::{PrescribedExercise, SessionTemplate};
use crate::validation::validate_config;
use crate::{
    Error, ExerciseData, ExerciseProgressSlot, ExerciseType, ProgressDocument, ProgressSummary,
    Result, SessionContext, SessionProgress, SessionStatus, SlotStatus,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Zeroed progress data for an exercise type
pub fn placeholder_data(exercise_type: ExerciseType) -> ExerciseData {
    match exercise_type {
        ExerciseType::Standard => ExerciseData::Standard {
            sets_completed: 0,
            reps_completed: 0,
            reps_per_set: Vec::new(),
            weight_used: None,
            rpe: None,
            notes: String::new(),
        },
        ExerciseType::Emom => ExerciseData::Emom {
            reps_per_minute: Vec::new(),
            rpe: None,
            notes: String::new(),
        },
        ExerciseType::Amrap => ExerciseData::Amrap {
            total_reps: 0,
            rpe: None,
            notes: String::new(),
        },
        ExerciseType::Circuit => ExerciseData::Circuit {
            rounds_completed: 0,
            total_reps: 0,
            weight_used: None,
            rpe: None,
            notes: String::new(),
        },
    }
}

/// Build a fresh slot for one prescribed exercise
pub fn build_slot(exercise: &PrescribedExercise) -> Result<ExerciseProgressSlot> {
    validate_config(&exercise.config, exercise.exercise_type).map_err(|e| {
        Error::invalid(format!(
            "prescribed exercise {} has an invalid config: {}",
            exercise.id, e
        ))
    })?;

    Ok(ExerciseProgressSlot {
        position: exercise.position,
        prescribed_id: exercise.id.clone(),
        exercise_id: exercise.exercise_id.clone(),
        exercise_name: exercise.exercise_name.clone(),
        exercise_type: exercise.exercise_type,
        config: exercise.config.clone(),
        status: SlotStatus::NotStarted,
        data: placeholder_data(exercise.exercise_type),
        notes: String::new(),
        videos: Vec::new(),
    })
}

/// Build slots for every exercise of a template, in position order
pub fn build_slots(template: &SessionTemplate) -> Result<Vec<ExerciseProgressSlot>> {
    let mut exercises: Vec<&PrescribedExercise> = template.exercises.iter().collect();
    exercises.sort_by_key(|e| e.position);
    exercises.into_iter().map(build_slot).collect()
}

fn context_of(template: &SessionTemplate) -> SessionContext {
    SessionContext {
        session_title: template.title.clone(),
        session_notes: template.notes.clone(),
        week_number: template.week.week_number,
        block_title: template.week.block.title.clone(),
        program_id: template.week.block.program.id.clone(),
        program_title: template.week.block.program.title.clone(),
    }
}

/// Build an unsaved record for a student from a template
pub fn build_record(
    template: &SessionTemplate,
    student_id: &str,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SessionProgress> {
    let exercises = build_slots(template)?;
    let summary = ProgressSummary {
        total_exercises: exercises.len() as u32,
        ..ProgressSummary::default()
    };

    Ok(SessionProgress {
        id: Uuid::new_v4(),
        session_id: template.id.clone(),
        student_id: student_id.to_string(),
        status: SessionStatus::NotStarted,
        progress: ProgressDocument {
            exercises,
            summary,
            context: context_of(template),
            repaired_at: None,
        },
        notes: notes.unwrap_or_default().to_string(),
        videos: Vec::new(),
        created_at: now,
        updated_at: now,
        completed_at: None,
    })
}

/// Return the student's record for a session, creating it if needed
///
/// Never creates a second record for the same (session, student) pair: an
/// existing record is returned unchanged, and a concurrent creator losing the
/// store's uniqueness check falls back to reading the winner's record.
/// The boolean is `true` when this call created the record.
pub fn get_or_create<S: ProgressStore>(
    store: &S,
    template: &SessionTemplate,
    student_id: &str,
    notes: Option<&str>,
) -> Result<(SessionProgress, bool)> {
    if let Some(existing) = store.find(&template.id, student_id)? {
        tracing::debug!(
            "Reusing progress {} for session {} and student {}",
            existing.id,
            template.id,
            student_id
        );
        return Ok((existing, false));
    }

    let record = build_record(template, student_id, notes, Utc::now())?;
    match store.create(record) {
        Ok(created) => {
            tracing::info!(
                "Created progress {} for session {} and student {} ({} exercises)",
                created.id,
                template.id,
                student_id,
                created.progress.summary.total_exercises
            );
            Ok((created, true))
        }
        Err(Error::Conflict(msg)) => {
            tracing::debug!("Lost creation race ({}), reading existing record", msg);
            store
                .find(&template.id, student_id)?
                .map(|existing| (existing, false))
                .ok_or(Error::Conflict(msg))
        }
        Err(e) => Err(e),
    }
}

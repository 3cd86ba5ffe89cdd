//! Session lifecycle controller.
//!
//! `WorkoutService` is the operation surface callers use: it enforces
//! assignment and ownership checks, delegates record creation to the
//! initializer, and runs every slot mutation inside one store transaction.

use crate::config::ProgressConfig;
use crate::engine;
use crate::history::{completed_history, completion_percentage};
use crate::initializer::get_or_create;
use crate::store::ProgressStore;
use crate::template::{SessionTemplate, TemplateReader};
use crate::{
    Error, ExerciseUpdate, ProgressDocument, ProgressSummary, Result, SessionProgress,
    SessionStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Options accepted when starting a workout
#[derive(Clone, Debug, Default)]
pub struct StartOptions {
    /// Session notes stored only if this call creates the record
    pub notes: Option<String>,
}

/// Options accepted when ending a workout
#[derive(Clone, Debug, Default)]
pub struct EndOptions {
    pub notes: Option<String>,
    pub videos: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StartedWorkout {
    pub progress_id: Uuid,
    pub session_id: String,
    pub program_id: String,
    pub total_exercises: u32,
    pub progress: ProgressDocument,
}

#[derive(Clone, Debug, Serialize)]
pub struct SavedProgress {
    pub progress_id: Uuid,
    pub progress: ProgressDocument,
    pub status: SessionStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkipAck {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct EndedWorkout {
    pub progress_id: Uuid,
    pub status: SessionStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derived completion view over a record's summary
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Completion {
    pub completed: u32,
    pub total: u32,
    pub percentage: u32,
    pub summary: ProgressSummary,
}

impl Completion {
    pub fn from_summary(summary: &ProgressSummary) -> Self {
        Self {
            completed: summary.completed_exercises,
            total: summary.total_exercises,
            percentage: completion_percentage(
                summary.completed_exercises,
                summary.total_exercises,
            ),
            summary: summary.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ProgressView {
    /// Current template, absent if the session has since been removed
    pub session: Option<SessionTemplate>,
    pub session_progress: SessionProgress,
    pub status: SessionStatus,
    pub progress: Completion,
}

/// Workout progress operations over a template reader and a record store
pub struct WorkoutService<R, S> {
    reader: R,
    store: S,
    settings: ProgressConfig,
}

fn ensure_owner(record: &SessionProgress, student_id: &str) -> Result<()> {
    if record.student_id != student_id {
        tracing::warn!(
            progress_id = %record.id,
            "Student {} attempted to modify progress owned by another student",
            student_id
        );
        return Err(Error::Forbidden(format!(
            "progress {} does not belong to student {}",
            record.id, student_id
        )));
    }
    Ok(())
}

impl<R: TemplateReader, S: ProgressStore> WorkoutService<R, S> {
    pub fn new(reader: R, store: S, settings: ProgressConfig) -> Self {
        Self {
            reader,
            store,
            settings,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a session template and check the student's assignment to its program
    fn authorized_template(&self, student_id: &str, session_id: &str) -> Result<SessionTemplate> {
        let template = self.reader.session_template(session_id)?;
        if !self
            .reader
            .is_student_assigned(student_id, template.program_id())?
        {
            tracing::warn!(
                "Student {} has no assignment to program {}",
                student_id,
                template.program_id()
            );
            return Err(Error::Forbidden(format!(
                "student {} is not assigned to program {}",
                student_id,
                template.program_id()
            )));
        }
        Ok(template)
    }

    /// Start (or resume) a workout for a session
    pub fn start_workout(
        &self,
        student_id: &str,
        session_id: &str,
        options: &StartOptions,
    ) -> Result<StartedWorkout> {
        let template = self.authorized_template(student_id, session_id)?;
        let (record, created) =
            get_or_create(&self.store, &template, student_id, options.notes.as_deref())?;

        tracing::info!(
            "Workout {} for session {} ({})",
            record.id,
            session_id,
            if created { "started" } else { "resumed" }
        );

        Ok(StartedWorkout {
            progress_id: record.id,
            session_id: record.session_id.clone(),
            program_id: record.program_id().to_string(),
            total_exercises: record.progress.summary().total_exercises,
            progress: record.progress,
        })
    }

    /// Run an ownership-checked mutation with slot repair inside one transaction
    fn mutate_slot<F>(
        &self,
        student_id: &str,
        progress_id: Uuid,
        index: usize,
        mutate: F,
    ) -> Result<SessionProgress>
    where
        F: FnOnce(&mut SessionProgress, DateTime<Utc>) -> Result<()>,
    {
        self.store.update_with(progress_id, |record| {
            ensure_owner(record, student_id)?;
            let now = Utc::now();
            engine::ensure_slot(
                record,
                index,
                |session_id| self.reader.session_template(session_id),
                now,
            )?;
            mutate(record, now)
        })
    }

    /// Partial save of one exercise
    pub fn save_draft(
        &self,
        student_id: &str,
        progress_id: Uuid,
        index: usize,
        update: &ExerciseUpdate,
    ) -> Result<SavedProgress> {
        let record = self.mutate_slot(student_id, progress_id, index, |record, now| {
            engine::apply_draft(record, index, update, now)
        })?;
        Ok(saved(record))
    }

    /// Partial save addressed by session, creating the record on first use
    pub fn save_session_draft(
        &self,
        student_id: &str,
        session_id: &str,
        index: usize,
        update: &ExerciseUpdate,
    ) -> Result<SavedProgress> {
        let template = self.authorized_template(student_id, session_id)?;
        let (record, _) = get_or_create(&self.store, &template, student_id, None)?;
        self.save_draft(student_id, record.id, index, update)
    }

    /// Terminal save of one exercise
    pub fn complete_exercise(
        &self,
        student_id: &str,
        progress_id: Uuid,
        index: usize,
        update: &ExerciseUpdate,
    ) -> Result<SavedProgress> {
        let record = self.mutate_slot(student_id, progress_id, index, |record, now| {
            engine::complete_exercise(record, index, update, now)
        })?;
        tracing::info!(
            "Completed exercise {} of progress {} (session now {:?})",
            index,
            progress_id,
            record.status()
        );
        Ok(saved(record))
    }

    /// Skip one exercise, with an optional reason
    pub fn skip_exercise(
        &self,
        student_id: &str,
        progress_id: Uuid,
        index: usize,
        reason: Option<&str>,
    ) -> Result<SkipAck> {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(self.settings.default_skip_reason.as_str());
        self.mutate_slot(student_id, progress_id, index, |record, now| {
            engine::skip_exercise(record, index, reason, now)
        })?;
        Ok(SkipAck {
            message: format!("Exercise {} skipped", index),
        })
    }

    /// Explicitly finish a workout, regardless of remaining exercises
    pub fn end_workout(
        &self,
        student_id: &str,
        progress_id: Uuid,
        options: &EndOptions,
    ) -> Result<EndedWorkout> {
        let record = self.store.update_with(progress_id, |record| {
            ensure_owner(record, student_id)?;
            engine::end_workout(
                record,
                options.notes.as_deref(),
                &options.videos,
                Utc::now(),
            );
            Ok(())
        })?;

        tracing::info!(
            "Workout {} ended with {}/{} exercises completed",
            record.id,
            record.progress.summary().completed_exercises,
            record.progress.summary().total_exercises
        );

        Ok(EndedWorkout {
            progress_id: record.id,
            status: record.status(),
            completed_at: record.completed_at,
        })
    }

    /// Load a record with its template and a derived completion view
    pub fn get_progress(&self, student_id: &str, progress_id: Uuid) -> Result<ProgressView> {
        let record = self
            .store
            .find_by_id(progress_id)?
            .ok_or_else(|| Error::NotFound(format!("progress {} not found", progress_id)))?;
        ensure_owner(&record, student_id)?;

        let session = match self.reader.session_template(&record.session_id) {
            Ok(template) => Some(template),
            Err(Error::NotFound(msg)) => {
                tracing::warn!("Rendering progress {} without template: {}", progress_id, msg);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(ProgressView {
            session,
            status: record.status(),
            progress: Completion::from_summary(record.progress.summary()),
            session_progress: record,
        })
    }

    /// Completed workouts for a student, most recent first
    pub fn get_history(&self, student_id: &str, limit: Option<usize>) -> Result<Vec<SessionProgress>> {
        let limit = limit.unwrap_or(self.settings.history_limit);
        let records = self.store.list_for_student(student_id)?;
        Ok(completed_history(records, limit))
    }
}

fn saved(record: SessionProgress) -> SavedProgress {
    SavedProgress {
        progress_id: record.id,
        status: record.status(),
        progress: record.progress,
    }
}

//! Core domain types for the workout progress engine.
//!
//! This module defines the data contracts shared by every layer:
//! - The exercise-type discriminator and its four config/progress shapes
//! - Caller-supplied progress payloads (partial, every field optional)
//! - The per-student session progress record and its slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// Discriminator selecting one of the four exercise shapes
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Standard,
    Emom,
    Amrap,
    Circuit,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Standard => "standard",
            ExerciseType::Emom => "emom",
            ExerciseType::Amrap => "amrap",
            ExerciseType::Circuit => "circuit",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coach-authored configuration for a prescribed exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseConfig {
    Standard {
        sets: u32,
        reps: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    Emom {
        total_minutes: u32,
        reps_per_minute: u32,
    },
    Amrap {
        time_minutes: u32,
        target_reps: u32,
    },
    Circuit {
        rounds: u32,
        reps_per_round: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest_seconds: Option<u32>,
    },
}

impl ExerciseConfig {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseConfig::Standard { .. } => ExerciseType::Standard,
            ExerciseConfig::Emom { .. } => ExerciseType::Emom,
            ExerciseConfig::Amrap { .. } => ExerciseType::Amrap,
            ExerciseConfig::Circuit { .. } => ExerciseType::Circuit,
        }
    }
}

/// Recorded progress for one exercise slot
///
/// The variant always matches the owning slot's `exercise_type`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseData {
    Standard {
        sets_completed: u32,
        reps_completed: u32,
        #[serde(default)]
        reps_per_set: Vec<u32>,
        #[serde(default)]
        weight_used: Option<f64>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: String,
    },
    Emom {
        #[serde(default)]
        reps_per_minute: Vec<u32>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: String,
    },
    Amrap {
        total_reps: u32,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: String,
    },
    Circuit {
        rounds_completed: u32,
        total_reps: u32,
        #[serde(default)]
        weight_used: Option<f64>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: String,
    },
}

impl ExerciseData {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseData::Standard { .. } => ExerciseType::Standard,
            ExerciseData::Emom { .. } => ExerciseType::Emom,
            ExerciseData::Amrap { .. } => ExerciseType::Amrap,
            ExerciseData::Circuit { .. } => ExerciseType::Circuit,
        }
    }
}

/// Partial progress update sent by a student
///
/// Omitted fields keep their stored value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressPayload {
    Standard {
        #[serde(default)]
        sets_completed: Option<u32>,
        #[serde(default)]
        reps_completed: Option<u32>,
        #[serde(default)]
        reps_per_set: Option<Vec<u32>>,
        #[serde(default)]
        weight_used: Option<f64>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: Option<String>,
    },
    Emom {
        #[serde(default)]
        reps_per_minute: Option<Vec<u32>>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: Option<String>,
    },
    Amrap {
        #[serde(default)]
        total_reps: Option<u32>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: Option<String>,
    },
    Circuit {
        #[serde(default)]
        rounds_completed: Option<u32>,
        #[serde(default)]
        total_reps: Option<u32>,
        #[serde(default)]
        weight_used: Option<f64>,
        #[serde(default)]
        rpe: Option<u8>,
        #[serde(default)]
        notes: Option<String>,
    },
}

impl ProgressPayload {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ProgressPayload::Standard { .. } => ExerciseType::Standard,
            ProgressPayload::Emom { .. } => ExerciseType::Emom,
            ProgressPayload::Amrap { .. } => ExerciseType::Amrap,
            ProgressPayload::Circuit { .. } => ExerciseType::Circuit,
        }
    }

    pub fn rpe(&self) -> Option<u8> {
        match self {
            ProgressPayload::Standard { rpe, .. }
            | ProgressPayload::Emom { rpe, .. }
            | ProgressPayload::Amrap { rpe, .. }
            | ProgressPayload::Circuit { rpe, .. } => *rpe,
        }
    }
}

/// Everything a draft or completion call may carry for one slot
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExerciseUpdate {
    #[serde(default)]
    pub progress: Option<ProgressPayload>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Status Types
// ============================================================================

/// Lifecycle of a single exercise slot
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    NotStarted,
    InProgress,
    Completed,
    Skipped,
}

/// Overall session lifecycle, ordered from earliest to terminal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Partial,
    Completed,
}

// ============================================================================
// Progress Record Types
// ============================================================================

/// Per-exercise unit of progress inside a session record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseProgressSlot {
    pub position: u32,
    /// Id of the prescribed exercise this slot was seeded from
    pub prescribed_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub exercise_type: ExerciseType,
    pub config: ExerciseConfig,
    pub status: SlotStatus,
    pub data: ExerciseData,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub videos: Vec<String>,
}

/// Aggregate counters, always recomputed from slot statuses
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_exercises: u32,
    pub completed_exercises: u32,
    pub in_progress_exercises: u32,
    pub skipped_exercises: u32,
}

/// Descriptive context captured when the record is created
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionContext {
    pub session_title: String,
    #[serde(default)]
    pub session_notes: Option<String>,
    pub week_number: u32,
    pub block_title: String,
    pub program_id: String,
    pub program_title: String,
}

/// Structured progress document stored on each record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressDocument {
    #[serde(default)]
    pub(crate) exercises: Vec<ExerciseProgressSlot>,
    #[serde(default)]
    pub(crate) summary: ProgressSummary,
    pub context: SessionContext,
    /// Set when the slot list had to be rebuilt from a changed template
    #[serde(default)]
    pub repaired_at: Option<DateTime<Utc>>,
}

impl ProgressDocument {
    pub fn exercises(&self) -> &[ExerciseProgressSlot] {
        &self.exercises
    }

    pub fn summary(&self) -> &ProgressSummary {
        &self.summary
    }
}

/// One student's progress through one session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionProgress {
    pub id: Uuid,
    pub session_id: String,
    pub student_id: String,
    pub(crate) status: SessionStatus,
    pub progress: ProgressDocument,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub videos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionProgress {
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn program_id(&self) -> &str {
        &self.progress.context.program_id
    }
}

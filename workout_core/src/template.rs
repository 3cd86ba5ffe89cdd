//! Read-only access to coach-authored program templates.
//!
//! Programs are stored as a JSON library of blocks → weeks → sessions →
//! prescribed exercises, together with the student assignments that gate
//! who may start a session.

use crate::validation::validate_config;
use crate::{Error, ExerciseConfig, ExerciseType, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ============================================================================
// Materialized session template
// ============================================================================

/// An exercise as the coach prescribed it for a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PrescribedExercise {
    pub id: String,
    pub position: u32,
    pub exercise_id: String,
    pub exercise_name: String,
    pub exercise_type: ExerciseType,
    pub config: ExerciseConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgramRef {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockRef {
    pub title: String,
    pub program: ProgramRef,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeekRef {
    pub week_number: u32,
    pub block: BlockRef,
}

/// A session with its ancestry, exercises ordered by position
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionTemplate {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    pub week: WeekRef,
    pub exercises: Vec<PrescribedExercise>,
}

impl SessionTemplate {
    pub fn program_id(&self) -> &str {
        &self.week.block.program.id
    }
}

/// Source of session templates and program assignments
pub trait TemplateReader {
    fn session_template(&self, session_id: &str) -> Result<SessionTemplate>;
    fn is_student_assigned(&self, student_id: &str, program_id: &str) -> Result<bool>;
}

// ============================================================================
// Library file format
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub title: String,
    #[serde(default)]
    pub weeks: Vec<Week>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Week {
    pub week_number: u32,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<PrescribedExercise>,
}

/// Link between a student and a program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub student_id: String,
    pub program_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// All programs and assignments known to this installation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgramLibrary {
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl ProgramLibrary {
    /// Load a library from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "program library {:?} does not exist",
                path
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        let library: ProgramLibrary = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded {} programs and {} assignments from {:?}",
            library.programs.len(),
            library.assignments.len(),
            path
        );
        Ok(library)
    }

    /// Write the library atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            Error::Config(format!("program library path {:?} has no parent", path))
        })?;
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut temp, self)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved program library to {:?}", path);
        Ok(())
    }

    /// Add an active assignment unless one already exists
    pub fn assign(&mut self, student_id: &str, program_id: &str) {
        if let Some(existing) = self
            .assignments
            .iter_mut()
            .find(|a| a.student_id == student_id && a.program_id == program_id)
        {
            existing.active = true;
            return;
        }
        self.assignments.push(Assignment {
            student_id: student_id.to_string(),
            program_id: program_id.to_string(),
            active: true,
        });
    }

    /// Check library consistency, returning a list of problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut session_ids = HashSet::new();
        let program_ids: HashSet<&str> = self.programs.iter().map(|p| p.id.as_str()).collect();

        for program in &self.programs {
            for block in &program.blocks {
                for week in &block.weeks {
                    for session in &week.sessions {
                        if !session_ids.insert(session.id.as_str()) {
                            errors.push(format!("Duplicate session id {}", session.id));
                        }

                        let mut positions = HashSet::new();
                        for exercise in &session.exercises {
                            if !positions.insert(exercise.position) {
                                errors.push(format!(
                                    "Session {} has duplicate position {}",
                                    session.id, exercise.position
                                ));
                            }
                            if let Err(e) =
                                validate_config(&exercise.config, exercise.exercise_type)
                            {
                                errors.push(format!(
                                    "Session {} exercise {}: {}",
                                    session.id, exercise.id, e
                                ));
                            }
                        }
                    }
                }
            }
        }

        for assignment in &self.assignments {
            if !program_ids.contains(assignment.program_id.as_str()) {
                errors.push(format!(
                    "Assignment for {} references unknown program {}",
                    assignment.student_id, assignment.program_id
                ));
            }
        }

        errors
    }
}

impl TemplateReader for ProgramLibrary {
    fn session_template(&self, session_id: &str) -> Result<SessionTemplate> {
        for program in &self.programs {
            for block in &program.blocks {
                for week in &block.weeks {
                    if let Some(session) = week.sessions.iter().find(|s| s.id == session_id) {
                        let mut exercises = session.exercises.clone();
                        exercises.sort_by_key(|e| e.position);

                        return Ok(SessionTemplate {
                            id: session.id.clone(),
                            title: session.title.clone(),
                            notes: session.notes.clone(),
                            week: WeekRef {
                                week_number: week.week_number,
                                block: BlockRef {
                                    title: block.title.clone(),
                                    program: ProgramRef {
                                        id: program.id.clone(),
                                        title: program.title.clone(),
                                    },
                                },
                            },
                            exercises,
                        });
                    }
                }
            }
        }

        Err(Error::NotFound(format!("session {} not found", session_id)))
    }

    fn is_student_assigned(&self, student_id: &str, program_id: &str) -> Result<bool> {
        Ok(self
            .assignments
            .iter()
            .any(|a| a.active && a.student_id == student_id && a.program_id == program_id))
    }
}

/// Template reader backed by a library file, re-read on every call
///
/// Coach edits to the file are visible immediately, which the slot
/// repair path depends on.
pub struct FileTemplateReader {
    path: PathBuf,
}

impl FileTemplateReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemplateReader for FileTemplateReader {
    fn session_template(&self, session_id: &str) -> Result<SessionTemplate> {
        ProgramLibrary::load(&self.path)?.session_template(session_id)
    }

    fn is_student_assigned(&self, student_id: &str, program_id: &str) -> Result<bool> {
        ProgramLibrary::load(&self.path)?.is_student_assigned(student_id, program_id)
    }
}

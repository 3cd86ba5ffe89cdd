//! Built-in sample program library.
//!
//! Used by `wkt init` to seed a fresh data directory and by tests that need
//! a realistic program with all four exercise types.

use crate::template::{
    Assignment, Block, PrescribedExercise, Program, ProgramLibrary, Session, Week,
};
use crate::ExerciseConfig;
use once_cell::sync::Lazy;

/// Program id of the sample program
pub const SAMPLE_PROGRAM_ID: &str = "strength-foundations";

/// Student assigned to the sample program out of the box
pub const SAMPLE_STUDENT_ID: &str = "student-1";

static SAMPLE_LIBRARY: Lazy<ProgramLibrary> = Lazy::new(build_sample_library);

/// Get a reference to the cached sample library
pub fn sample_library() -> &'static ProgramLibrary {
    &SAMPLE_LIBRARY
}

fn prescribed(
    id: &str,
    position: u32,
    exercise_id: &str,
    exercise_name: &str,
    config: ExerciseConfig,
) -> PrescribedExercise {
    PrescribedExercise {
        id: id.into(),
        position,
        exercise_id: exercise_id.into(),
        exercise_name: exercise_name.into(),
        exercise_type: config.exercise_type(),
        config,
    }
}

fn build_sample_library() -> ProgramLibrary {
    // Week 1, day 1: one exercise of every type
    let lower = Session {
        id: "w1-lower".into(),
        title: "Lower Body".into(),
        notes: Some("Warm up for 10 minutes before the first set.".into()),
        exercises: vec![
            prescribed(
                "w1-lower-1",
                1,
                "back_squat",
                "Back Squat",
                ExerciseConfig::Standard {
                    sets: 3,
                    reps: 10,
                    weight: Some(60.0),
                    notes: Some("Controlled descent".into()),
                },
            ),
            prescribed(
                "w1-lower-2",
                2,
                "burpee",
                "Burpee",
                ExerciseConfig::Emom {
                    total_minutes: 10,
                    reps_per_minute: 5,
                },
            ),
            prescribed(
                "w1-lower-3",
                3,
                "kb_swing",
                "Kettlebell Swing",
                ExerciseConfig::Amrap {
                    time_minutes: 8,
                    target_reps: 60,
                },
            ),
            prescribed(
                "w1-lower-4",
                4,
                "leg_circuit",
                "Leg Circuit",
                ExerciseConfig::Circuit {
                    rounds: 3,
                    reps_per_round: 12,
                    weight: None,
                    rest_seconds: Some(60),
                },
            ),
        ],
    };

    // Week 1, day 2: two standard lifts
    let upper = Session {
        id: "w1-upper".into(),
        title: "Upper Body".into(),
        notes: None,
        exercises: vec![
            prescribed(
                "w1-upper-1",
                1,
                "push_up",
                "Push-up",
                ExerciseConfig::Standard {
                    sets: 3,
                    reps: 10,
                    weight: None,
                    notes: None,
                },
            ),
            prescribed(
                "w1-upper-2",
                2,
                "pull_up",
                "Pull-up",
                ExerciseConfig::Standard {
                    sets: 3,
                    reps: 5,
                    weight: None,
                    notes: None,
                },
            ),
        ],
    };

    let deload = Session {
        id: "w2-deload".into(),
        title: "Deload".into(),
        notes: None,
        exercises: vec![prescribed(
            "w2-deload-1",
            1,
            "kb_swing",
            "Kettlebell Swing",
            ExerciseConfig::Emom {
                total_minutes: 5,
                reps_per_minute: 8,
            },
        )],
    };

    ProgramLibrary {
        programs: vec![Program {
            id: SAMPLE_PROGRAM_ID.into(),
            title: "Strength Foundations".into(),
            blocks: vec![Block {
                title: "Base Building".into(),
                weeks: vec![
                    Week {
                        week_number: 1,
                        sessions: vec![lower, upper],
                    },
                    Week {
                        week_number: 2,
                        sessions: vec![deload],
                    },
                ],
            }],
        }],
        assignments: vec![Assignment {
            student_id: SAMPLE_STUDENT_ID.into(),
            program_id: SAMPLE_PROGRAM_ID.into(),
            active: true,
        }],
    }
}

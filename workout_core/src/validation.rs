//! Pure config/progress validators for the four exercise shapes.
//!
//! Nothing here touches storage; every check runs before a write so a
//! rejected payload leaves the record unchanged.

use crate::{Error, ExerciseConfig, ExerciseType, ProgressPayload, Result};
use std::ops::RangeInclusive;

/// Upper bound for EMOM `total_minutes` and AMRAP `time_minutes`
pub const MAX_TIMED_MINUTES: u32 = 60;

/// Accepted Rate of Perceived Exertion values
pub const RPE_RANGE: RangeInclusive<u8> = 1..=10;

/// Check a coach-authored config against the declared exercise type
pub fn validate_config(config: &ExerciseConfig, exercise_type: ExerciseType) -> Result<()> {
    if config.exercise_type() != exercise_type {
        return Err(Error::invalid(format!(
            "config of type {} does not match exercise type {}",
            config.exercise_type(),
            exercise_type
        )));
    }

    match config {
        ExerciseConfig::Standard { sets, reps, weight, .. } => {
            require_positive("sets", *sets)?;
            require_positive("reps", *reps)?;
            require_non_negative_weight("weight", *weight)
        }
        ExerciseConfig::Emom {
            total_minutes,
            reps_per_minute,
        } => {
            require_minutes("total_minutes", *total_minutes)?;
            require_positive("reps_per_minute", *reps_per_minute)
        }
        ExerciseConfig::Amrap {
            time_minutes,
            target_reps,
        } => {
            require_minutes("time_minutes", *time_minutes)?;
            require_positive("target_reps", *target_reps)
        }
        ExerciseConfig::Circuit {
            rounds,
            reps_per_round,
            weight,
            ..
        } => {
            require_positive("rounds", *rounds)?;
            require_positive("reps_per_round", *reps_per_round)?;
            require_non_negative_weight("weight", *weight)
        }
    }
}

/// Check a progress payload against the slot's type and config
pub fn validate_progress(
    payload: &ProgressPayload,
    exercise_type: ExerciseType,
    config: &ExerciseConfig,
) -> Result<()> {
    if payload.exercise_type() != exercise_type {
        return Err(Error::invalid(format!(
            "progress of type {} sent for a {} exercise",
            payload.exercise_type(),
            exercise_type
        )));
    }

    if let Some(rpe) = payload.rpe() {
        if !RPE_RANGE.contains(&rpe) {
            return Err(Error::invalid(format!(
                "rpe must be between {} and {}, got {}",
                RPE_RANGE.start(),
                RPE_RANGE.end(),
                rpe
            )));
        }
    }

    match payload {
        ProgressPayload::Standard {
            sets_completed,
            reps_completed,
            reps_per_set,
            weight_used,
            ..
        } => {
            optional_positive("sets_completed", *sets_completed)?;
            optional_positive("reps_completed", *reps_completed)?;
            // Sums into reps_completed, which must stay positive
            if let Some(per_set) = reps_per_set {
                if per_set.is_empty() {
                    return Err(Error::invalid("reps_per_set must not be empty"));
                }
                if let Some(set) = per_set.iter().position(|r| *r == 0) {
                    return Err(Error::invalid(format!(
                        "reps_per_set entry {} must be positive",
                        set
                    )));
                }
            }
            require_non_negative_weight("weight_used", *weight_used)
        }
        ProgressPayload::Emom {
            reps_per_minute, ..
        } => {
            let total_minutes = match config {
                ExerciseConfig::Emom { total_minutes, .. } => *total_minutes,
                other => {
                    return Err(Error::invalid(format!(
                        "emom progress needs an emom config, slot has {}",
                        other.exercise_type()
                    )))
                }
            };
            if let Some(minutes) = reps_per_minute {
                if minutes.len() > total_minutes as usize {
                    return Err(Error::invalid(format!(
                        "reps_per_minute has {} entries but the exercise lasts {} minutes",
                        minutes.len(),
                        total_minutes
                    )));
                }
            }
            Ok(())
        }
        ProgressPayload::Amrap { total_reps, .. } => optional_positive("total_reps", *total_reps),
        ProgressPayload::Circuit {
            rounds_completed,
            total_reps,
            weight_used,
            ..
        } => {
            optional_positive("rounds_completed", *rounds_completed)?;
            optional_positive("total_reps", *total_reps)?;
            require_non_negative_weight("weight_used", *weight_used)
        }
    }
}

fn require_positive(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::invalid(format!("{} must be positive", field)));
    }
    Ok(())
}

fn optional_positive(field: &str, value: Option<u32>) -> Result<()> {
    match value {
        Some(v) => require_positive(field, v),
        None => Ok(()),
    }
}

fn require_minutes(field: &str, minutes: u32) -> Result<()> {
    if minutes == 0 || minutes > MAX_TIMED_MINUTES {
        return Err(Error::invalid(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_TIMED_MINUTES, minutes
        )));
    }
    Ok(())
}

fn require_non_negative_weight(field: &str, weight: Option<f64>) -> Result<()> {
    match weight {
        Some(w) if !w.is_finite() || w < 0.0 => Err(Error::invalid(format!(
            "{} must be a non-negative number",
            field
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emom(total_minutes: u32) -> ExerciseConfig {
        ExerciseConfig::Emom {
            total_minutes,
            reps_per_minute: 5,
        }
    }

    fn emom_progress(len: usize) -> ProgressPayload {
        ProgressPayload::Emom {
            reps_per_minute: Some(vec![5; len]),
            rpe: None,
            notes: None,
        }
    }

    #[test]
    fn test_emom_array_bound() {
        let config = emom(10);
        let too_long = validate_progress(&emom_progress(11), ExerciseType::Emom, &config);
        assert!(matches!(too_long, Err(Error::InvalidInput(_))));

        assert!(validate_progress(&emom_progress(10), ExerciseType::Emom, &config).is_ok());
        assert!(validate_progress(&emom_progress(0), ExerciseType::Emom, &config).is_ok());
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let payload = ProgressPayload::Amrap {
            total_reps: Some(40),
            rpe: None,
            notes: None,
        };
        let result = validate_progress(&payload, ExerciseType::Emom, &emom(10));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_zero_counts_rejected() {
        let config = ExerciseConfig::Circuit {
            rounds: 3,
            reps_per_round: 10,
            weight: None,
            rest_seconds: Some(60),
        };
        let payload = ProgressPayload::Circuit {
            rounds_completed: Some(0),
            total_reps: Some(30),
            weight_used: None,
            rpe: None,
            notes: None,
        };
        assert!(validate_progress(&payload, ExerciseType::Circuit, &config).is_err());

        let amrap = ProgressPayload::Amrap {
            total_reps: Some(0),
            rpe: None,
            notes: None,
        };
        let amrap_config = ExerciseConfig::Amrap {
            time_minutes: 8,
            target_reps: 60,
        };
        assert!(validate_progress(&amrap, ExerciseType::Amrap, &amrap_config).is_err());
    }

    #[test]
    fn test_reps_per_set_must_be_positive() {
        let config = ExerciseConfig::Standard {
            sets: 3,
            reps: 10,
            weight: None,
            notes: None,
        };
        let with_sets = |per_set: Vec<u32>| ProgressPayload::Standard {
            sets_completed: Some(2),
            reps_completed: None,
            reps_per_set: Some(per_set),
            weight_used: None,
            rpe: None,
            notes: None,
        };

        assert!(validate_progress(&with_sets(vec![8, 9]), ExerciseType::Standard, &config).is_ok());
        assert!(matches!(
            validate_progress(&with_sets(vec![0, 0]), ExerciseType::Standard, &config),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_progress(&with_sets(vec![8, 0, 9]), ExerciseType::Standard, &config),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_progress(&with_sets(vec![]), ExerciseType::Standard, &config),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rpe_bounds() {
        let config = ExerciseConfig::Amrap {
            time_minutes: 8,
            target_reps: 60,
        };
        let with_rpe = |rpe| ProgressPayload::Amrap {
            total_reps: Some(42),
            rpe: Some(rpe),
            notes: None,
        };
        assert!(validate_progress(&with_rpe(1), ExerciseType::Amrap, &config).is_ok());
        assert!(validate_progress(&with_rpe(10), ExerciseType::Amrap, &config).is_ok());
        assert!(validate_progress(&with_rpe(0), ExerciseType::Amrap, &config).is_err());
        assert!(validate_progress(&with_rpe(11), ExerciseType::Amrap, &config).is_err());
    }

    #[test]
    fn test_validate_config_bounds() {
        assert!(validate_config(&emom(60), ExerciseType::Emom).is_ok());
        assert!(validate_config(&emom(61), ExerciseType::Emom).is_err());
        assert!(validate_config(&emom(0), ExerciseType::Emom).is_err());

        let standard = ExerciseConfig::Standard {
            sets: 3,
            reps: 10,
            weight: Some(60.0),
            notes: None,
        };
        assert!(validate_config(&standard, ExerciseType::Standard).is_ok());
        assert!(validate_config(&standard, ExerciseType::Circuit).is_err());

        let negative = ExerciseConfig::Standard {
            sets: 3,
            reps: 10,
            weight: Some(-5.0),
            notes: None,
        };
        assert!(validate_config(&negative, ExerciseType::Standard).is_err());
    }
}

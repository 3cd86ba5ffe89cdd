//! Completed workout history and CSV export.
//!
//! History is the student's completed records, newest first. Export appends
//! nothing: each call writes a fresh CSV file atomically.

use crate::{Error, Result, SessionProgress, SessionStatus};
use chrono::{DateTime, Utc};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    progress_id: String,
    session_id: String,
    session_title: String,
    week_number: u32,
    block_title: String,
    program_title: String,
    status: SessionStatus,
    completed_exercises: u32,
    skipped_exercises: u32,
    total_exercises: u32,
    percentage: u32,
    completed_at: Option<String>,
}

impl From<&SessionProgress> for CsvRow {
    fn from(record: &SessionProgress) -> Self {
        let summary = record.progress.summary();
        let context = &record.progress.context;
        CsvRow {
            progress_id: record.id.to_string(),
            session_id: record.session_id.clone(),
            session_title: context.session_title.clone(),
            week_number: context.week_number,
            block_title: context.block_title.clone(),
            program_title: context.program_title.clone(),
            status: record.status(),
            completed_exercises: summary.completed_exercises,
            skipped_exercises: summary.skipped_exercises,
            total_exercises: summary.total_exercises,
            percentage: completion_percentage(summary.completed_exercises, summary.total_exercises),
            completed_at: record.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Whole-number completion percentage; zero when there is nothing to complete
pub fn completion_percentage(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

fn finished_at(record: &SessionProgress) -> DateTime<Utc> {
    record.completed_at.unwrap_or(record.updated_at)
}

/// Keep completed records, newest first, at most `limit` of them
pub fn completed_history(records: Vec<SessionProgress>, limit: usize) -> Vec<SessionProgress> {
    let mut completed: Vec<SessionProgress> = records
        .into_iter()
        .filter(|r| r.status() == SessionStatus::Completed)
        .collect();

    completed.sort_by(|a, b| finished_at(b).cmp(&finished_at(a)));
    completed.truncate(limit);

    tracing::debug!("Selected {} completed records for history", completed.len());
    completed
}

/// Write records to a CSV file, replacing any previous export
///
/// Returns the number of rows written.
pub fn export_csv(records: &[SessionProgress], csv_path: &Path) -> Result<usize> {
    let parent = csv_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        for record in records {
            writer.serialize(CsvRow::from(record))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} records to {:?}", records.len(), csv_path);
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{end_workout, skip_exercise};
    use crate::initializer::build_record;
    use crate::sample::sample_library;
    use crate::template::TemplateReader;
    use chrono::Duration;

    fn finished(session_id: &str, days_ago: i64) -> SessionProgress {
        let template = sample_library().session_template(session_id).unwrap();
        let when = Utc::now() - Duration::days(days_ago);
        let mut record = build_record(&template, "student-1", None, when).unwrap();
        end_workout(&mut record, None, &[], when);
        record
    }

    #[test]
    fn test_percentage_guards_zero_total() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(4, 4), 100);
    }

    #[test]
    fn test_history_newest_first_and_limited() {
        let template = sample_library().session_template("w1-upper").unwrap();
        let open = build_record(&template, "student-1", None, Utc::now()).unwrap();

        let records = vec![
            finished("w1-lower", 5),
            open,
            finished("w1-upper", 1),
            finished("w2-deload", 3),
        ];

        let history = completed_history(records.clone(), 10);
        let ids: Vec<&str> = history.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["w1-upper", "w2-deload", "w1-lower"]);

        let limited = completed_history(records, 2);
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].session_id, "w1-upper");
    }

    #[test]
    fn test_export_csv_writes_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("exports/history.csv");

        let mut partial = finished("w1-upper", 1);
        skip_exercise(&mut partial, 0, "travel", Utc::now()).unwrap();

        let count = export_csv(&[finished("w1-lower", 2), partial], &csv_path).unwrap();
        assert_eq!(count, 2);

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("progress_id,session_id,session_title"));
        assert!(lines[1].contains("Lower Body"));
        assert!(lines[2].contains("Upper Body"));
        assert!(lines[2].contains(",completed,0,1,2,0,"));
    }

    #[test]
    fn test_export_replaces_previous_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");

        export_csv(&[finished("w1-lower", 2), finished("w1-upper", 1)], &csv_path).unwrap();
        export_csv(&[finished("w2-deload", 1)], &csv_path).unwrap();

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}

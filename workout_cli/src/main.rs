use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;
use workout_core::lifecycle::{EndOptions, StartOptions};
use workout_core::sample::SAMPLE_PROGRAM_ID;
use workout_core::*;

#[derive(Parser)]
#[command(name = "wkt")]
#[command(about = "Workout session progress tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the data directory with the sample program library
    Init {
        /// Assign these students to the sample program
        #[arg(long = "student")]
        students: Vec<String>,

        /// Replace an existing program library
        #[arg(long)]
        force: bool,
    },

    /// Start (or resume) a workout for a session
    Start {
        #[arg(long)]
        student: String,

        #[arg(long)]
        session: String,

        /// Session notes, stored only when the record is created
        #[arg(long)]
        notes: Option<String>,
    },

    /// Save partial progress for one exercise
    Draft {
        #[arg(long)]
        student: String,

        /// Progress record id
        #[arg(long, conflicts_with = "session", required_unless_present = "session")]
        progress: Option<Uuid>,

        /// Session id; creates the progress record on first save
        #[arg(long)]
        session: Option<String>,

        /// Zero-based exercise index
        #[arg(long)]
        index: usize,

        #[command(flatten)]
        update: UpdateArgs,
    },

    /// Mark one exercise completed
    Complete {
        #[arg(long)]
        student: String,

        #[arg(long)]
        progress: Uuid,

        #[arg(long)]
        index: usize,

        #[command(flatten)]
        update: UpdateArgs,
    },

    /// Skip one exercise
    Skip {
        #[arg(long)]
        student: String,

        #[arg(long)]
        progress: Uuid,

        #[arg(long)]
        index: usize,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Finish a workout regardless of remaining exercises
    End {
        #[arg(long)]
        student: String,

        #[arg(long)]
        progress: Uuid,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long = "video")]
        videos: Vec<String>,
    },

    /// Show a progress record with its session template
    Show {
        #[arg(long)]
        student: String,

        #[arg(long)]
        progress: Uuid,
    },

    /// List completed workouts, most recent first
    History {
        #[arg(long)]
        student: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export completed workouts to CSV
    Export {
        #[arg(long)]
        student: String,

        #[arg(long)]
        output: PathBuf,

        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Exercise data shared by draft and complete
#[derive(clap::Args)]
struct UpdateArgs {
    /// Progress payload as JSON, e.g. '{"type":"standard","sets_completed":2}'
    #[arg(long)]
    data: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long = "video")]
    videos: Vec<String>,
}

impl UpdateArgs {
    fn into_update(self) -> Result<ExerciseUpdate> {
        let progress = match self.data {
            Some(raw) => Some(serde_json::from_str::<ProgressPayload>(&raw).map_err(|e| {
                Error::InvalidInput(format!("invalid progress data: {}", e))
            })?),
            None => None,
        };
        Ok(ExerciseUpdate {
            progress,
            videos: self.videos,
            notes: self.notes,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    workout_core::logging::init_with_level(workout_core::logging::level_for_verbosity(
        cli.verbose,
    ));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = e.kind(), "Command failed: {:?}", e);
            eprintln!("error[{}]: {}", e.kind(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &Error) -> u8 {
    match error {
        Error::InvalidInput(_) => 2,
        Error::NotFound(_) => 3,
        Error::Forbidden(_) => 4,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    let program_path = config.data.program_path(&data_dir);
    let service = WorkoutService::new(
        FileTemplateReader::new(&program_path),
        JsonFileStore::new(config.data.store_path(&data_dir)),
        config.progress.clone(),
    );

    match cli.command {
        Commands::Init { students, force } => cmd_init(&data_dir, &program_path, &students, force),
        Commands::Start {
            student,
            session,
            notes,
        } => print_json(&service.start_workout(&student, &session, &StartOptions { notes })?),
        Commands::Draft {
            student,
            progress,
            session,
            index,
            update,
        } => {
            let update = update.into_update()?;
            let saved = match (progress, session) {
                (Some(progress_id), _) => service.save_draft(&student, progress_id, index, &update)?,
                (None, Some(session_id)) => {
                    service.save_session_draft(&student, &session_id, index, &update)?
                }
                (None, None) => {
                    return Err(Error::InvalidInput(
                        "either --progress or --session is required".into(),
                    ))
                }
            };
            print_json(&saved)
        }
        Commands::Complete {
            student,
            progress,
            index,
            update,
        } => {
            let update = update.into_update()?;
            print_json(&service.complete_exercise(&student, progress, index, &update)?)
        }
        Commands::Skip {
            student,
            progress,
            index,
            reason,
        } => print_json(&service.skip_exercise(&student, progress, index, reason.as_deref())?),
        Commands::End {
            student,
            progress,
            notes,
            videos,
        } => print_json(&service.end_workout(&student, progress, &EndOptions { notes, videos })?),
        Commands::Show { student, progress } => {
            print_json(&service.get_progress(&student, progress)?)
        }
        Commands::History { student, limit } => print_json(&service.get_history(&student, limit)?),
        Commands::Export {
            student,
            output,
            limit,
        } => {
            let history = service.get_history(&student, limit)?;
            let rows = export_csv(&history, &output)?;
            print_json(&json!({
                "output": output,
                "rows": rows,
            }))
        }
    }
}

fn cmd_init(data_dir: &Path, program_path: &Path, students: &[String], force: bool) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;

    let mut library = if program_path.exists() && !force {
        ProgramLibrary::load(program_path)?
    } else {
        sample_library().clone()
    };

    let problems = library.validate();
    if !problems.is_empty() {
        eprintln!("Program library validation errors:");
        for problem in &problems {
            eprintln!("  - {}", problem);
        }
        return Err(Error::InvalidInput("invalid program library".into()));
    }

    for student in students {
        library.assign(student, SAMPLE_PROGRAM_ID);
    }
    library.save(program_path)?;

    print_json(&json!({
        "program_file": program_path,
        "programs": library.programs.iter().map(|p| &p.id).collect::<Vec<_>>(),
        "assignments": library.assignments,
    }))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#![forbid(unsafe_code)]

//! Core domain model and business logic for workout session progress.
//!
//! This crate provides:
//! - Domain types (exercise types, configs, payloads, progress records)
//! - Program template reading and assignment checks
//! - Persistence (locked JSON store, CSV export)
//! - The mutation engine and lifecycle service

pub mod types;
pub mod error;
pub mod validation;
pub mod template;
pub mod sample;
pub mod config;
pub mod logging;
pub mod store;
pub mod initializer;
pub mod engine;
pub mod lifecycle;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use template::{FileTemplateReader, ProgramLibrary, SessionTemplate, TemplateReader};
pub use store::{JsonFileStore, ProgressStore};
pub use sample::sample_library;
pub use history::export_csv;
pub use lifecycle::{EndOptions, StartOptions, WorkoutService};

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};
pub use config::Settings;

pub use adapters::{OcrService, OllamaClient, RemoteVisionClient, TesseractEngine};
pub use core::orchestrator::{Orchestrator, OrchestratorSettings};
pub use domain::model::{Analysis, AnalysisSource, ImageRef, StructureMode, TaskType};
pub use utils::error::{AppError, Result};

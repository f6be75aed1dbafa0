pub mod orchestrator;
pub mod prompts;

pub use crate::domain::model::{Analysis, AnalysisSource, ImageRef, StructureMode, TaskType};
pub use crate::domain::ports::{OcrEngine, TextExtractor, TextGenerator, VisionService};
pub use crate::utils::error::Result;

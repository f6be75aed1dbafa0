// 轉接層：遠端視覺服務、本地生成服務與本地 OCR 引擎的實作

pub mod ocr;
pub mod ollama;
pub mod vision;

pub use ocr::{OcrService, TesseractEngine};
pub use ollama::OllamaClient;
pub use vision::RemoteVisionClient;

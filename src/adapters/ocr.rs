//! 本地文字擷取
//!
//! `OcrService` 啟動時為空，透過 `initialize` 只設定一次引擎。
//! 初始化之前呼叫會回傳 `NotInitialized` 錯誤

use crate::domain::model::ImageRef;
use crate::domain::ports::{OcrEngine, TextExtractor};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, OnceLock};

pub const DEFAULT_LANGUAGES: &[&str] = &["eng"];

/// 透過命令列執行 tesseract
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    languages: Vec<String>,
}

impl TesseractEngine {
    pub fn new(languages: &[String]) -> Self {
        Self::with_binary("tesseract", languages)
    }

    pub fn with_binary(binary: &str, languages: &[String]) -> Self {
        let languages = if languages.is_empty() {
            DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect()
        } else {
            languages.to_vec()
        };
        Self {
            binary: binary.to_string(),
            languages,
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}

impl OcrEngine for TesseractEngine {
    fn read_text(&self, image_path: &Path) -> std::result::Result<Vec<String>, String> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.languages.join("+")])
            .output();

        match output {
            Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect()),
            Ok(output) => Err(format!(
                "{} failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(format!(
                "{} not found (install tesseract-ocr)",
                self.binary
            )),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// 去除空白後保留非空片段，依原順序每行一段
pub fn join_fragments<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
pub struct OcrService {
    engine: OnceLock<Arc<dyn OcrEngine>>,
}

impl OcrService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以指定語言安裝 tesseract 引擎
    pub fn initialize(&self, languages: &[String], binary: &str) {
        let engine = TesseractEngine::with_binary(binary, languages);
        tracing::info!(
            "Initializing OCR engine ({}) for languages: {}",
            binary,
            engine.languages().join(", ")
        );
        self.initialize_with(Arc::new(engine));
    }

    pub fn initialize_with(&self, engine: Arc<dyn OcrEngine>) {
        if self.engine.set(engine).is_err() {
            tracing::warn!("OCR service already initialized, keeping the existing engine");
        }
    }
}

#[async_trait]
impl TextExtractor for OcrService {
    async fn extract_text(&self, image: &ImageRef) -> Result<String> {
        let engine = self
            .engine
            .get()
            .cloned()
            .ok_or_else(|| AppError::NotInitialized {
                component: "OCR service".to_string(),
            })?;

        let path = image.path().to_path_buf();
        let fragments = tokio::task::spawn_blocking(move || engine.read_text(&path))
            .await
            .map_err(|e| AppError::Extraction {
                message: e.to_string(),
            })?
            .map_err(|message| AppError::Extraction { message })?;

        let text = join_fragments(&fragments);
        tracing::debug!(
            "OCR produced {} fragments, {} chars",
            fragments.len(),
            text.len()
        );
        Ok(text)
    }
}

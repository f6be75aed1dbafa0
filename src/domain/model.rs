use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 指向磁碟上影像的參照，僅在單次呼叫期間借用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    path: PathBuf,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 向遠端視覺服務請求的分析類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Text,
    Auto,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Text => "text",
            TaskType::Auto => "auto",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 本地備援提示詞要求模型輸出的格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMode {
    #[default]
    Auto,
    Table,
    Mindmap,
}

impl FromStr for StructureMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StructureMode::Auto),
            "table" => Ok(StructureMode::Table),
            "mindmap" => Ok(StructureMode::Mindmap),
            other => Err(AppError::Validation {
                message: format!(
                    "Invalid mode '{}'. Must be 'auto', 'table' or 'mindmap'.",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for StructureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StructureMode::Auto => "auto",
            StructureMode::Table => "table",
            StructureMode::Mindmap => "mindmap",
        };
        f.write_str(name)
    }
}

/// `POST /api/generate` 的請求內容，永遠關閉串流
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl GenerationRequest {
    pub fn new(model: &str, prompt: &str, images: Option<Vec<String>>) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            // 空陣列視為沒有圖片
            images: images.filter(|imgs| !imgs.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Remote,
    Local,
    NoText,
}

/// 成功的分析結果，`output` 不做任何格式驗證
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub output: String,
    pub source: AnalysisSource,
}

impl Analysis {
    pub fn remote(output: String) -> Self {
        Self {
            output,
            source: AnalysisSource::Remote,
        }
    }

    pub fn local(output: String) -> Self {
        Self {
            output,
            source: AnalysisSource::Local,
        }
    }

    pub fn no_text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            source: AnalysisSource::NoText,
        }
    }
}

use crate::utils::error::{AppError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 磁碟上的配置檔。每個區段與欄位皆為選填，未填寫者沿用內建預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub local_generation: Option<LocalGenerationConfig>,
    pub remote_vision: Option<RemoteVisionConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub timeouts: Option<TimeoutConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalGenerationConfig {
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub vision_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteVisionConfig {
    pub base_url: Option<String>,
    pub use_for_extract: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub languages: Option<Vec<String>>,
    pub tesseract_binary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub health_secs: Option<u64>,
    pub analyze_secs: Option<u64>,
    pub generate_secs: Option<u64>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VLM_BASE_URL})，未設定的變數保持原樣交由驗證回報
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

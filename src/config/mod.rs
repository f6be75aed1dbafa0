#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::orchestrator::OrchestratorSettings;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_list, validate_non_empty_string, validate_positive_number, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use self::toml_config::TomlConfig;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TEXT_MODEL: &str = "qwen2.5:1.5b";
pub const DEFAULT_VISION_MODEL: &str = "qwen2.5vl:3b";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub health_secs: u64,
    pub analyze_secs: u64,
    pub generate_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health_secs: 5,
            analyze_secs: 180,
            generate_secs: 120,
        }
    }
}

impl Timeouts {
    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    pub fn analyze(&self) -> Duration {
        Duration::from_secs(self.analyze_secs)
    }

    pub fn generate(&self) -> Duration {
        Duration::from_secs(self.generate_secs)
    }
}

/// 解析完成的執行期設定。每次啟動時解析一次，遠端位址不寫死在程式中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub ollama_base_url: String,
    pub text_model: String,
    pub vision_model: String,
    /// 未設定時完全略過遠端階段
    pub vlm_base_url: Option<String>,
    pub remote_extract: bool,
    pub ocr_languages: Vec<String>,
    pub tesseract_binary: String,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            vlm_base_url: None,
            remote_extract: false,
            ocr_languages: vec!["eng".to_string()],
            tesseract_binary: "tesseract".to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// 以配置檔覆蓋預設值
    pub fn from_toml(config: &TomlConfig) -> Self {
        let mut settings = Self::default();

        if let Some(local) = &config.local_generation {
            if let Some(url) = &local.base_url {
                settings.ollama_base_url = url.clone();
            }
            if let Some(model) = &local.text_model {
                settings.text_model = model.clone();
            }
            if let Some(model) = &local.vision_model {
                settings.vision_model = model.clone();
            }
        }
        if let Some(remote) = &config.remote_vision {
            if remote.base_url.is_some() {
                settings.vlm_base_url = remote.base_url.clone();
            }
            if let Some(flag) = remote.use_for_extract {
                settings.remote_extract = flag;
            }
        }
        if let Some(extraction) = &config.extraction {
            if let Some(languages) = &extraction.languages {
                settings.ocr_languages = languages.clone();
            }
            if let Some(binary) = &extraction.tesseract_binary {
                settings.tesseract_binary = binary.clone();
            }
        }
        if let Some(timeouts) = &config.timeouts {
            if let Some(secs) = timeouts.health_secs {
                settings.timeouts.health_secs = secs;
            }
            if let Some(secs) = timeouts.analyze_secs {
                settings.timeouts.analyze_secs = secs;
            }
            if let Some(secs) = timeouts.generate_secs {
                settings.timeouts.generate_secs = secs;
            }
        }

        settings
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            text_model: self.text_model.clone(),
            remote_extract: self.remote_extract,
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("ollama_base_url", &self.ollama_base_url)?;
        if let Some(url) = &self.vlm_base_url {
            validate_url("vlm_base_url", url)?;
        }
        validate_non_empty_string("text_model", &self.text_model)?;
        validate_non_empty_string("vision_model", &self.vision_model)?;
        validate_non_empty_list("ocr_languages", &self.ocr_languages)?;
        validate_non_empty_string("tesseract_binary", &self.tesseract_binary)?;
        validate_positive_number("timeouts.health_secs", self.timeouts.health_secs, 1)?;
        validate_positive_number("timeouts.analyze_secs", self.timeouts.analyze_secs, 1)?;
        validate_positive_number("timeouts.generate_secs", self.timeouts.generate_secs, 1)?;
        Ok(())
    }
}

use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::domain::model::StructureMode;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "vision-relay")]
#[command(about = "Image to text, description or structure, remote first with a local fallback")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, global = true, env = "OLLAMA_BASE_URL")]
    pub ollama_url: Option<String>,

    #[arg(long, global = true, env = "LLM_MODEL")]
    pub text_model: Option<String>,

    #[arg(long, global = true, env = "VLM_MODEL")]
    pub vision_model: Option<String>,

    /// Base URL of the remote vision service (changes with every tunnel)
    #[arg(long, global = true, env = "VLM_BASE_URL")]
    pub vlm_url: Option<String>,

    #[arg(long, global = true, env = "OCR_LANGUAGES", value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Try the remote service before local OCR for extract (true or false)
    #[arg(long, global = true, env = "REMOTE_EXTRACT")]
    pub remote_extract: Option<bool>,

    /// Path or name of the tesseract binary
    #[arg(long, global = true, env = "TESSERACT_BINARY")]
    pub tesseract_binary: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Describe an image in natural language
    Describe { image: PathBuf },
    /// Turn an image into a JSON table or a Markdown outline
    Structure {
        image: PathBuf,
        #[arg(long, default_value = "auto")]
        mode: StructureMode,
    },
    /// Extract plain text from an image
    Extract { image: PathBuf },
    /// Structure text that was already extracted
    StructureText {
        text: String,
        #[arg(long, default_value = "table")]
        mode: StructureMode,
    },
    /// Ask the local vision model about an image directly
    Vision {
        image: PathBuf,
        #[arg(long, default_value = "Describe this image.")]
        prompt: String,
    },
    /// Probe the remote vision service
    Health,
}

impl Cli {
    /// 依序套用預設值、配置檔、環境變數與命令列參數
    pub fn resolve_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_toml(&TomlConfig::from_file(path)?),
            None => Settings::default(),
        };

        if let Some(url) = &self.ollama_url {
            settings.ollama_base_url = url.clone();
        }
        if let Some(model) = &self.text_model {
            settings.text_model = model.clone();
        }
        if let Some(model) = &self.vision_model {
            settings.vision_model = model.clone();
        }
        if let Some(url) = &self.vlm_url {
            settings.vlm_base_url = Some(url.clone());
        }
        if let Some(languages) = &self.languages {
            settings.ocr_languages = languages.clone();
        }
        if let Some(enabled) = self.remote_extract {
            settings.remote_extract = enabled;
        }
        if let Some(binary) = &self.tesseract_binary {
            settings.tesseract_binary = binary.clone();
        }

        Ok(settings)
    }
}

use clap::Parser;
use std::sync::Arc;
use vision_relay::core::VisionService;
use vision_relay::domain::ports::TextGenerator;
use vision_relay::utils::error::ErrorSeverity;
use vision_relay::utils::image::encode_image_to_base64;
use vision_relay::utils::{logger, validation::Validate};
use vision_relay::{
    Analysis, AppError, Cli, Command, ImageRef, OcrService, OllamaClient, Orchestrator,
    RemoteVisionClient, Settings,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting vision-relay");

    // 解析並驗證配置
    let settings = match cli.resolve_settings().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Resolved settings: {:?}", settings);

    // 建立本地生成服務的連線
    let ollama = Arc::new(OllamaClient::with_timeout(
        &settings.ollama_base_url,
        settings.timeouts.generate(),
    ));

    let result = run(cli.command, &settings, ollama.clone()).await;
    ollama.shutdown().await;

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            if e.is_transient() {
                tracing::warn!("🔁 The failure looks transient, running again may succeed");
            }

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
    }
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(error: &AppError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 4,      // 輸入錯誤
        ErrorSeverity::Medium => 2,   // 可重試的服務錯誤
        ErrorSeverity::High => 1,     // 處理或配置錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

/// 未設定遠端位址時不建立客戶端，直接走本地流程
fn remote_client(settings: &Settings) -> Option<RemoteVisionClient> {
    settings.vlm_base_url.as_deref().map(|url| {
        RemoteVisionClient::with_timeouts(
            url,
            settings.timeouts.health(),
            settings.timeouts.analyze(),
        )
    })
}

async fn run(
    command: Command,
    settings: &Settings,
    ollama: Arc<OllamaClient>,
) -> Result<String, AppError> {
    match command {
        Command::Health => {
            let remote = remote_client(settings).ok_or_else(|| AppError::MissingConfigError {
                field: "vlm_base_url".to_string(),
            })?;
            let healthy = remote.health_check().await;
            Ok(format!(
                "{} is {}",
                remote.base_url(),
                if healthy { "healthy" } else { "unavailable" }
            ))
        }
        Command::Vision { image, prompt } => {
            ollama.startup().await?;
            let encoded = encode_image_to_base64(&image).await?;
            ollama
                .generate(&settings.vision_model, &prompt, Some(vec![encoded]))
                .await
        }
        Command::Describe { image } => {
            let orchestrator = build_orchestrator(settings, ollama).await?;
            Ok(report(orchestrator.describe(&ImageRef::new(image)).await?))
        }
        Command::Structure { image, mode } => {
            let orchestrator = build_orchestrator(settings, ollama).await?;
            Ok(report(orchestrator.structure(&ImageRef::new(image), mode).await?))
        }
        Command::Extract { image } => {
            let orchestrator = build_orchestrator(settings, ollama).await?;
            Ok(report(orchestrator.extract(&ImageRef::new(image)).await?))
        }
        Command::StructureText { text, mode } => {
            let orchestrator = build_orchestrator(settings, ollama).await?;
            Ok(report(orchestrator.structure_text(&text, mode).await?))
        }
    }
}

type CliOrchestrator = Orchestrator<RemoteVisionClient, Arc<OllamaClient>, Arc<OcrService>>;

/// 每個指令各自初始化 OCR 並啟動本地生成服務
async fn build_orchestrator(
    settings: &Settings,
    ollama: Arc<OllamaClient>,
) -> Result<CliOrchestrator, AppError> {
    let ocr = Arc::new(OcrService::new());
    ocr.initialize(&settings.ocr_languages, &settings.tesseract_binary);
    ollama.startup().await?;

    Ok(Orchestrator::new(
        remote_client(settings),
        ollama,
        ocr,
        settings.orchestrator_settings(),
    ))
}

fn report(analysis: Analysis) -> String {
    tracing::info!("✅ Completed via {:?} path", analysis.source);
    analysis.output
}

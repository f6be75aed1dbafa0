//! 遠端優先、本地備援的影像分析
//!
//! 每個操作都走相同流程：先探測遠端視覺服務，健康時使用遠端結果；
//! 遠端不可用或失敗時改用本地 OCR 加本地文字生成。
//! 遠端錯誤不會傳給呼叫者，本地錯誤一律回傳

use crate::core::prompts;
use crate::domain::model::{Analysis, ImageRef, StructureMode, TaskType};
use crate::domain::ports::{TextExtractor, TextGenerator, VisionService};
use crate::utils::error::{AppError, Result};

pub const NO_TEXT_DESCRIPTION: &str = "No readable text found in the image.";
pub const NO_TEXT_STRUCTURE: &str = "No readable text found.";

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub text_model: String,
    /// `extract` 是否先嘗試遠端服務再使用本地 OCR
    pub remote_extract: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            text_model: "qwen2.5:1.5b".to_string(),
            remote_extract: false,
        }
    }
}

pub struct Orchestrator<V: VisionService, G: TextGenerator, E: TextExtractor> {
    remote: Option<V>,
    generator: G,
    extractor: E,
    settings: OrchestratorSettings,
}

impl<V: VisionService, G: TextGenerator, E: TextExtractor> Orchestrator<V, G, E> {
    pub fn new(
        remote: Option<V>,
        generator: G,
        extractor: E,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            remote,
            generator,
            extractor,
            settings,
        }
    }

    /// 以自然語言描述影像
    pub async fn describe(&self, image: &ImageRef) -> Result<Analysis> {
        if let Some(output) = self.try_remote(image, TaskType::Text).await {
            return Ok(Analysis::remote(output));
        }
        self.local_generate(image, NO_TEXT_DESCRIPTION, prompts::describe_prompt)
            .await
    }

    /// 將影像整理成表格或大綱。遠端一律使用 auto 模式，`mode` 只決定備援提示詞
    pub async fn structure(&self, image: &ImageRef, mode: StructureMode) -> Result<Analysis> {
        if let Some(output) = self.try_remote(image, TaskType::Auto).await {
            return Ok(Analysis::remote(output));
        }
        self.local_generate(image, NO_TEXT_STRUCTURE, |text| {
            prompts::structure_prompt(mode, text)
        })
        .await
    }

    /// 擷取影像中的純文字，空結果直接回傳
    pub async fn extract(&self, image: &ImageRef) -> Result<Analysis> {
        if self.settings.remote_extract {
            if let Some(output) = self.try_remote(image, TaskType::Text).await {
                return Ok(Analysis::remote(output));
            }
        }

        let text = self.extractor.extract_text(image).await?;
        if text.trim().is_empty() {
            return Ok(Analysis::no_text(text));
        }
        Ok(Analysis::local(text))
    }

    /// 將已擷取的文字結構化，只使用本地模型
    pub async fn structure_text(&self, text: &str, mode: StructureMode) -> Result<Analysis> {
        if text.trim().is_empty() {
            return Err(AppError::Validation {
                message: "Text must not be empty".to_string(),
            });
        }
        let prompt = prompts::structure_prompt(mode, text);
        let output = self
            .generator
            .generate(&self.settings.text_model, &prompt, None)
            .await?;
        Ok(Analysis::local(output))
    }

    /// 回傳遠端結果，需要走備援流程時回傳 `None`
    async fn try_remote(&self, image: &ImageRef, task_type: TaskType) -> Option<String> {
        let remote = self.remote.as_ref()?;

        // 每次請求都重新探測，不快取健康狀態
        if !remote.health_check().await {
            tracing::info!("VLM unavailable, using OCR fallback path");
            return None;
        }

        tracing::info!("Using VLM ({}) path", task_type);
        match remote.analyze(image, task_type).await {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::warn!("VLM failed ({}), switching to fallback", e);
                None
            }
        }
    }

    async fn local_generate<F>(
        &self,
        image: &ImageRef,
        no_text: &str,
        build_prompt: F,
    ) -> Result<Analysis>
    where
        F: Fn(&str) -> String,
    {
        // 本地 OCR
        let text = self.extractor.extract_text(image).await?;
        if text.trim().is_empty() {
            tracing::info!("OCR found no text in {}", image.path().display());
            return Ok(Analysis::no_text(no_text));
        }

        // 本地文字生成
        let prompt = build_prompt(&text);
        let output = self
            .generator
            .generate(&self.settings.text_model, &prompt, None)
            .await?;
        Ok(Analysis::local(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AnalysisSource;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Calls {
        probes: Arc<Mutex<usize>>,
        analyzes: Arc<Mutex<Vec<TaskType>>>,
        prompts: Arc<Mutex<Vec<String>>>,
        extractions: Arc<Mutex<usize>>,
    }

    enum RemoteBehavior {
        Down,
        Fails,
        Answers(&'static str),
    }

    struct FakeRemote {
        behavior: RemoteBehavior,
        calls: Calls,
    }

    #[async_trait]
    impl VisionService for FakeRemote {
        async fn health_check(&self) -> bool {
            *self.calls.probes.lock().unwrap() += 1;
            !matches!(self.behavior, RemoteBehavior::Down)
        }

        async fn analyze(&self, _image: &ImageRef, task_type: TaskType) -> Result<String> {
            self.calls.analyzes.lock().unwrap().push(task_type);
            match self.behavior {
                RemoteBehavior::Answers(output) => Ok(output.to_string()),
                _ => Err(AppError::UpstreamStatus {
                    service: "VLM".to_string(),
                    status: 502,
                    body: "Bad Gateway".to_string(),
                }),
            }
        }
    }

    struct FakeGenerator {
        reply: Option<&'static str>,
        calls: Calls,
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(
            &self,
            _model: &str,
            prompt: &str,
            _images: Option<Vec<String>>,
        ) -> Result<String> {
            self.calls.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => Err(AppError::EmptyResponse {
                    service: "Ollama".to_string(),
                }),
            }
        }
    }

    struct FakeExtractor {
        text: &'static str,
        calls: Calls,
    }

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        async fn extract_text(&self, _image: &ImageRef) -> Result<String> {
            *self.calls.extractions.lock().unwrap() += 1;
            Ok(self.text.to_string())
        }
    }

    fn orchestrator(
        remote: Option<RemoteBehavior>,
        ocr_text: &'static str,
        reply: Option<&'static str>,
        calls: &Calls,
    ) -> Orchestrator<FakeRemote, FakeGenerator, FakeExtractor> {
        Orchestrator::new(
            remote.map(|behavior| FakeRemote {
                behavior,
                calls: calls.clone(),
            }),
            FakeGenerator {
                reply,
                calls: calls.clone(),
            },
            FakeExtractor {
                text: ocr_text,
                calls: calls.clone(),
            },
            OrchestratorSettings::default(),
        )
    }

    fn image() -> ImageRef {
        ImageRef::new("notes.png")
    }

    #[tokio::test]
    async fn test_unhealthy_probe_never_calls_analyze() {
        let calls = Calls::default();
        let orch = orchestrator(Some(RemoteBehavior::Down), "some text", Some("local"), &calls);

        let result = orch.describe(&image()).await.unwrap();

        assert_eq!(result, Analysis::local("local".to_string()));
        assert_eq!(*calls.probes.lock().unwrap(), 1);
        assert!(calls.analyzes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_matches_unhealthy_result() {
        let down_calls = Calls::default();
        let down = orchestrator(Some(RemoteBehavior::Down), "Cells: A B", Some("{}"), &down_calls);
        let failing_calls = Calls::default();
        let failing =
            orchestrator(Some(RemoteBehavior::Fails), "Cells: A B", Some("{}"), &failing_calls);

        for mode in [StructureMode::Auto, StructureMode::Table, StructureMode::Mindmap] {
            let expected = down.structure(&image(), mode).await.unwrap();
            let actual = failing.structure(&image(), mode).await.unwrap();
            assert_eq!(expected, actual);
        }
        assert_eq!(
            *down_calls.prompts.lock().unwrap(),
            *failing_calls.prompts.lock().unwrap()
        );
        assert_eq!(failing_calls.analyzes.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_healthy_remote_output_is_verbatim() {
        let calls = Calls::default();
        let orch = orchestrator(
            Some(RemoteBehavior::Answers("  A whiteboard about cells.  ")),
            "ignored",
            Some("local"),
            &calls,
        );

        let result = orch.describe(&image()).await.unwrap();

        assert_eq!(result.output, "  A whiteboard about cells.  ");
        assert_eq!(result.source, AnalysisSource::Remote);
        assert_eq!(*calls.analyzes.lock().unwrap(), vec![TaskType::Text]);
        assert!(calls.prompts.lock().unwrap().is_empty());
        assert_eq!(*calls.extractions.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_structure_uses_auto_task_type() {
        let calls = Calls::default();
        let orch = orchestrator(Some(RemoteBehavior::Answers("- root")), "", None, &calls);

        orch.structure(&image(), StructureMode::Table).await.unwrap();
        assert_eq!(*calls.analyzes.lock().unwrap(), vec![TaskType::Auto]);
    }

    #[tokio::test]
    async fn test_every_call_reprobes() {
        let calls = Calls::default();
        let orch = orchestrator(Some(RemoteBehavior::Answers("ok")), "", None, &calls);

        orch.describe(&image()).await.unwrap();
        orch.describe(&image()).await.unwrap();
        assert_eq!(*calls.probes.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_blank_ocr_returns_sentinel_without_generation() {
        let calls = Calls::default();
        let orch = orchestrator(Some(RemoteBehavior::Down), "  \n ", Some("unused"), &calls);

        let described = orch.describe(&image()).await.unwrap();
        let structured = orch.structure(&image(), StructureMode::Auto).await.unwrap();

        assert_eq!(described, Analysis::no_text(NO_TEXT_DESCRIPTION));
        assert_eq!(structured, Analysis::no_text(NO_TEXT_STRUCTURE));
        assert!(calls.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces() {
        let calls = Calls::default();
        let orch = orchestrator(Some(RemoteBehavior::Fails), "text", None, &calls);

        let err = orch.describe(&image()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_no_remote_configured_goes_local() {
        let calls = Calls::default();
        let orch = orchestrator(None, "Photosynthesis", Some("About plants."), &calls);

        let result = orch.describe(&image()).await.unwrap();

        assert_eq!(result.output, "About plants.");
        assert_eq!(*calls.probes.lock().unwrap(), 0);
        assert_eq!(
            calls.prompts.lock().unwrap()[0],
            prompts::describe_prompt("Photosynthesis")
        );
    }

    #[tokio::test]
    async fn test_extract_is_local_only_by_default() {
        let calls = Calls::default();
        let remote = Some(RemoteBehavior::Answers("remote"));
        let orch = orchestrator(remote, "line 1\nline 2", None, &calls);

        let result = orch.extract(&image()).await.unwrap();

        assert_eq!(result, Analysis::local("line 1\nline 2".to_string()));
        assert_eq!(*calls.probes.lock().unwrap(), 0);
        assert!(calls.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extract_empty_text_is_success() {
        let calls = Calls::default();
        let orch = orchestrator(None, "", None, &calls);

        let result = orch.extract(&image()).await.unwrap();
        assert_eq!(result, Analysis::no_text(""));
    }

    #[tokio::test]
    async fn test_extract_with_remote_enabled() {
        let calls = Calls::default();
        let remote = Some(RemoteBehavior::Answers("remote text"));
        let mut orch = orchestrator(remote, "local", None, &calls);
        orch.settings.remote_extract = true;

        let result = orch.extract(&image()).await.unwrap();

        assert_eq!(result, Analysis::remote("remote text".to_string()));
        assert_eq!(*calls.analyzes.lock().unwrap(), vec![TaskType::Text]);
        assert_eq!(*calls.extractions.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_structure_text_rejects_blank_input() {
        let calls = Calls::default();
        let orch = orchestrator(None, "", Some("ok"), &calls);

        let err = orch
            .structure_text("   ", StructureMode::Table)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(calls.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_structure_text_uses_mode_prompt() {
        let calls = Calls::default();
        let orch = orchestrator(None, "", Some("- Topic"), &calls);

        let result = orch
            .structure_text("Topic\nSub", StructureMode::Mindmap)
            .await
            .unwrap();

        assert_eq!(result.output, "- Topic");
        assert_eq!(
            calls.prompts.lock().unwrap()[0],
            prompts::mindmap_prompt("Topic\nSub")
        );
    }
}

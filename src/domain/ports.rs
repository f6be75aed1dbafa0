use crate::domain::model::{ImageRef, TaskType};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// 遠端影像分析服務，可用性在每次呼叫之間都可能改變
#[async_trait]
pub trait VisionService: Send + Sync {
    /// 任何失敗都回傳 `false`
    async fn health_check(&self) -> bool;
    async fn analyze(&self, image: &ImageRef, task_type: TaskType) -> Result<String>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: Option<Vec<String>>,
    ) -> Result<String>;
}

/// 影像轉純文字，空字串代表沒有偵測到文字
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &ImageRef) -> Result<String>;
}

/// 文字擷取服務背後的同步 OCR 引擎
pub trait OcrEngine: Send + Sync {
    /// 依偵測順序回傳文字片段
    fn read_text(&self, image_path: &Path) -> std::result::Result<Vec<String>, String>;
}

#[async_trait]
impl<T: VisionService + ?Sized> VisionService for Arc<T> {
    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }

    async fn analyze(&self, image: &ImageRef, task_type: TaskType) -> Result<String> {
        (**self).analyze(image, task_type).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: Option<Vec<String>>,
    ) -> Result<String> {
        (**self).generate(model, prompt, images).await
    }
}

#[async_trait]
impl<T: TextExtractor + ?Sized> TextExtractor for Arc<T> {
    async fn extract_text(&self, image: &ImageRef) -> Result<String> {
        (**self).extract_text(image).await
    }
}

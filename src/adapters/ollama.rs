use crate::domain::model::GenerationRequest;
use crate::domain::ports::TextGenerator;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;

const SERVICE: &str = "Ollama";
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// 與本地 Ollama 相容生成服務的持久連線
pub struct OllamaClient {
    base_url: String,
    timeout: Duration,
    client: RwLock<Option<Client>>,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 建立底層 HTTP 客戶端，重複呼叫不會有任何效果
    pub async fn startup(&self) -> Result<()> {
        let mut guard = self.client.write().await;
        if guard.is_none() {
            let client = Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| AppError::ConfigError {
                    message: format!("Failed to build HTTP client: {}", e),
                })?;
            tracing::debug!("Ollama client started for {}", self.base_url);
            *guard = Some(client);
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        if self.client.write().await.take().is_some() {
            tracing::debug!("Ollama client shut down");
        }
    }

    pub async fn is_started(&self) -> bool {
        self.client.read().await.is_some()
    }

    async fn handle(&self) -> Result<Client> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }
        self.startup().await?;
        self.client
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::NotInitialized {
                component: "LLM client".to_string(),
            })
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: Option<Vec<String>>,
    ) -> Result<String> {
        let client = self.handle().await?;
        let request = GenerationRequest::new(model, prompt, images);

        tracing::debug!(
            "Generating with model {} ({} prompt chars, {} images)",
            model,
            prompt.len(),
            request.images.as_ref().map_or(0, Vec::len)
        );

        let response = client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|source| AppError::Transport {
                target: self.base_url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            // 錯誤內容只保留前 500 個字元
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamStatus {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::MalformedResponse {
                    service: SERVICE.to_string(),
                    message: e.to_string(),
                })?;

        let text = body.response.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(AppError::EmptyResponse {
                service: SERVICE.to_string(),
            });
        }
        Ok(text)
    }
}

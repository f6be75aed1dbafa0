use crate::domain::model::{ImageRef, TaskType};
use crate::domain::ports::VisionService;
use crate::utils::error::{AppError, Result};
use crate::utils::image::upload_file_name;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const SERVICE: &str = "VLM";

/// 遠端 GPU 視覺服務的客戶端。位址通常是臨時通道，不記錄任何健康狀態
#[derive(Debug, Clone)]
pub struct RemoteVisionClient {
    base_url: String,
    client: Client,
    health_timeout: Duration,
    analyze_timeout: Duration,
}

impl RemoteVisionClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeouts(base_url, Duration::from_secs(5), Duration::from_secs(180))
    }

    pub fn with_timeouts(
        base_url: &str,
        health_timeout: Duration,
        analyze_timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            health_timeout,
            analyze_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn probe(&self) -> Result<StatusCode> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|source| AppError::Transport {
                target: self.base_url.clone(),
                source,
            })?;
        Ok(response.status())
    }
}

#[async_trait]
impl VisionService for RemoteVisionClient {
    async fn health_check(&self) -> bool {
        match self.probe().await {
            Ok(status) => {
                tracing::debug!("VLM health probe returned {}", status);
                status == StatusCode::OK
            }
            Err(e) => {
                tracing::debug!("VLM health probe failed: {}", e);
                false
            }
        }
    }

    async fn analyze(&self, image: &ImageRef, task_type: TaskType) -> Result<String> {
        let bytes = tokio::fs::read(image.path()).await?;
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(upload_file_name(image.path())))
            .text("task_type", task_type.as_str());

        let url = format!("{}/analyze", self.base_url);
        tracing::debug!("Sending image to {} with task_type={}", url, task_type);

        let response = self
            .client
            .post(&url)
            .timeout(self.analyze_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|source| AppError::Transport {
                target: self.base_url.clone(),
                source,
            })?;

        // 只有 200 視為成功
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamStatus {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| AppError::MalformedResponse {
                    service: SERVICE.to_string(),
                    message: e.to_string(),
                })?;

        json.get("output")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::MalformedResponse {
                service: SERVICE.to_string(),
                message: "missing 'output' field".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn image_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake image bytes").unwrap();
        file
    }

    #[tokio::test]
    async fn test_health_check_ok() {
        let server = MockServer::start();
        let health = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).body("ok");
        });

        let client = RemoteVisionClient::new(&server.base_url());
        assert!(client.health_check().await);
        health.assert();
    }

    #[tokio::test]
    async fn test_health_check_non_200_is_unhealthy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(204);
        });

        let client = RemoteVisionClient::new(&server.base_url());
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_connection_refused_is_unhealthy() {
        let client = RemoteVisionClient::new("http://127.0.0.1:1");
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_timeout_is_unhealthy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).delay(Duration::from_millis(500));
        });

        let client = RemoteVisionClient::with_timeouts(
            &server.base_url(),
            Duration::from_millis(50),
            Duration::from_secs(1),
        );
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_analyze_returns_output_field() {
        let server = MockServer::start();
        let analyze = server.mock(|when, then| {
            when.method(POST)
                .path("/analyze")
                .body_contains("name=\"task_type\"\r\n\r\nauto")
                .body_contains("name=\"file\"");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"output": "| a | b |"}));
        });

        let file = image_file();
        let client = RemoteVisionClient::new(&format!("{}/", server.base_url()));
        let output = client
            .analyze(&ImageRef::new(file.path()), TaskType::Auto)
            .await
            .unwrap();

        analyze.assert();
        assert_eq!(output, "| a | b |");
    }

    #[tokio::test]
    async fn test_analyze_non_200_carries_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/analyze");
            then.status(500).body("CUDA out of memory");
        });

        let file = image_file();
        let client = RemoteVisionClient::new(&server.base_url());
        let err = client
            .analyze(&ImageRef::new(file.path()), TaskType::Text)
            .await
            .unwrap_err();

        match err {
            AppError::UpstreamStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "CUDA out of memory");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_missing_output_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/analyze");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"result": "text"}));
        });

        let file = image_file();
        let client = RemoteVisionClient::new(&server.base_url());
        let err = client
            .analyze(&ImageRef::new(file.path()), TaskType::Text)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_analyze_missing_image_is_io_error() {
        let client = RemoteVisionClient::new("http://127.0.0.1:1");
        let err = client
            .analyze(&ImageRef::new("/nonexistent/image.png"), TaskType::Text)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IoError(_)));
    }
}

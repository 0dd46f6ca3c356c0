//! Gemini REST client.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::error::{GeminiError, GeminiResult};
use crate::types::{
    ApiErrorBody, Blob, Content, GenerateContentRequest, GenerateContentResponse, ModelRequest,
    Part, VIDEO_MIME_TYPE,
};

/// A remote model that turns a prompt (and optional video) into text.
///
/// The analyzer and merger only talk to this trait, so tests can script
/// responses without a network.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, credential: &str, request: &ModelRequest) -> GeminiResult<String>;
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> GeminiResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(request: &ModelRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(video) = &request.video {
            parts.push(Part::InlineData {
                inline_data: Blob {
                    mime_type: VIDEO_MIME_TYPE.to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(video),
                },
            });
        }
        parts.push(Part::Text {
            text: request.prompt.clone(),
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, credential: &str, request: &ModelRequest) -> GeminiResult<String> {
        let body = Self::build_body(request);

        debug!(
            model = %self.model,
            video_bytes = request.video.as_ref().map_or(0, Vec::len),
            prompt_chars = request.prompt.len(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", credential)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("quadcam_model_requests_total", "outcome" => "network_error")
                    .increment(1);
                GeminiError::Network(e.without_url())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            warn!(model = %self.model, status = status.as_u16(), "Gemini API error: {}", message);
            metrics::counter!(
                "quadcam_model_requests_total",
                "outcome" => status.as_u16().to_string()
            )
            .increment(1);
            return Err(GeminiError::api(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.first_text().ok_or_else(|| {
            let reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            GeminiError::invalid_response(format!("No text in Gemini response ({})", reason))
        })?;

        metrics::counter!("quadcam_model_requests_total", "outcome" => "success").increment(1);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        let config = GeminiConfig::default().with_base_url(server.uri());
        GeminiClient::new(&config).unwrap()
    }

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        })
    }

    #[tokio::test]
    async fn test_generate_sends_video_inline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "video/mp4", "data": "AQID"}},
                    {"text": "describe"}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("00:00–00:01 : ok")))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate("secret", &ModelRequest::with_video(vec![1, 2, 3], "describe"))
            .await
            .unwrap();
        assert_eq!(text, "00:00–00:01 : ok");
    }

    #[tokio::test]
    async fn test_generate_text_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "summarize"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("summary")))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate("k", &ModelRequest::text("summarize"))
            .await
            .unwrap();
        assert_eq!(text, "summary");
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("k", &ModelRequest::text("x"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert!(err.is_transient());
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("bad", &ModelRequest::text("x"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"candidates": [{"finishReason": "SAFETY"}]})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("k", &ModelRequest::text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::InvalidResponse(ref m) if m.contains("SAFETY")));
    }
}

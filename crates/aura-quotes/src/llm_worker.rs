//! HTTP worker for the local Ollama model.
//!
//! Chat completions drive the hybrid/full classifier stages; the embeddings
//! endpoint backs the vector retrieval engine. Both are plain request/response
//! calls against a localhost model server.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

pub struct OllamaWorker {
    host: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaWorker {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/api/embeddings", self.host)
    }

    /// Single-turn completion with bounded output length and low temperature.
    /// The caller owns the outer deadline; this method only maps transport
    /// and status failures into errors.
    pub async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        debug!("Ollama chat request ({} message(s))", messages.len());
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: ChatOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response = self
            .http_client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Model backend request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Model backend returned {}: {}", status, body));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse model response: {}", e))?;

        let content = completion
            .message
            .map(|m| m.content)
            .unwrap_or_default();
        Ok(content)
    }

    /// Embed a single text. Dimension validation happens at the retrieval
    /// layer, which knows the configured index dimension.
    pub async fn generate_embedding(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Generating embedding ({} chars)", text.len());
        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .http_client
            .post(self.embeddings_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Embedding request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Embedding endpoint returned {}: {}", status, body));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse embedding response: {}", e))?;

        Ok(embedding_response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_parses_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":{"role":"assistant","content":"{\"category\":\"funny\"}"}}"#)
            .create_async()
            .await;

        let worker = OllamaWorker::new(server.url(), "test-model");
        let out = worker
            .generate(
                vec![ChatMessage {
                    role: "user".to_string(),
                    content: "classify this".to_string(),
                }],
                0.1,
                200,
            )
            .await
            .unwrap();

        assert_eq!(out, r#"{"category":"funny"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_maps_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let worker = OllamaWorker::new(server.url(), "test-model");
        let result = worker
            .generate(
                vec![ChatMessage {
                    role: "user".to_string(),
                    content: "hi".to_string(),
                }],
                0.1,
                50,
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generate_embedding_parses_vector() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding":[0.25,-0.5,1.0]}"#)
            .create_async()
            .await;

        let worker = OllamaWorker::new(server.url(), "test-model");
        let embedding = worker.generate_embedding("some text").await.unwrap();
        assert_eq!(embedding, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_generate_embedding_empty_text_short_circuits() {
        let worker = OllamaWorker::new("http://127.0.0.1:1", "test-model");
        let embedding = worker.generate_embedding("").await.unwrap();
        assert!(embedding.is_empty());
    }
}

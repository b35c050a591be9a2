use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::registry::{Endpoint, ModelRegistry};
use super::sse::{SseData, SseLineDecoder};
use super::{ChatModel, CompletionRequest, LlmError, TokenStream};

/// Streams completions from any OpenAI-compatible `/chat/completions`
/// endpoint.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    registry: ModelRegistry,
}

impl OpenAiCompatClient {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            http: reqwest::Client::new(),
            registry,
        }
    }

    pub fn completions_url(api_url: &str) -> String {
        let base = api_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    async fn open(&self, endpoint: &Endpoint, request: &CompletionRequest) -> Result<reqwest::Response, LlmError> {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let body = json!({
            "model": request.model.model_key,
            "messages": messages,
            "stream": true,
            "max_tokens": request.max_tokens,
        });

        let url = Self::completions_url(&endpoint.api_url);
        tracing::debug!(url = %url, model = %request.model.model_key, messages = messages.len(), "Opening completion stream");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", endpoint.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Model provider rejected request: {}", body);
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<TokenStream, LlmError> {
        let endpoint = self.registry.endpoint(&request.model);
        let response = self.open(&endpoint, &request).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseLineDecoder::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Request(e))).await;
                        return;
                    }
                };
                for data in decoder.push(&chunk) {
                    match data {
                        SseData::Delta(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                        SseData::Done => return,
                    }
                }
            }

            if let Some(SseData::Delta(text)) = decoder.finish() {
                let _ = tx.send(Ok(text)).await;
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completions_url_is_appended_once() {
        assert_eq!(
            OpenAiCompatClient::completions_url("https://api.example/v1/"),
            "https://api.example/v1/chat/completions"
        );
        assert_eq!(
            OpenAiCompatClient::completions_url("https://api.example/v1/chat/completions"),
            "https://api.example/v1/chat/completions"
        );
    }
}

//! Translation through a local Ollama server (`/api/chat`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use honyaku_config::translator::TranslatorConfig;
use honyaku_types::{SourceLanguage, TargetLanguage};
use serde::Serialize;

use crate::{ProviderMetadata, TranslateError, Translation, Translator};

/// Model picked when the listing contains it
pub const DEFAULT_MODEL: &str = "gemma2:latest";

fn system_prompt(from: SourceLanguage, to: TargetLanguage) -> String {
    format!(
        "You are a translator. You receive text captured from a screen in {from} and \
         translate it into fluent, grammatically correct {to}. Drop meaningless \
         characters or symbols left over from text recognition. Do not comment on the \
         text or the result, do not explain anything. Reply with the translation only."
    )
}

fn user_prompt(text: &str, to: TargetLanguage) -> String {
    format!("Translate the following text to {to}: {text}")
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Clone)]
pub struct OllamaTranslator {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    temperature: f32,
    num_ctx: u32,
}

impl OllamaTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        Self::with_timeout(config, Duration::from_secs(config.timeout_seconds))
    }

    pub fn with_timeout(
        config: &TranslatorConfig,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            temperature: config.temperature,
            num_ctx: config.num_ctx,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> TranslateError {
        if e.is_timeout() {
            TranslateError::Timeout(self.timeout)
        } else if e.is_connect() {
            TranslateError::Unreachable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            TranslateError::Network(e)
        }
    }

    /// Send a request and return the JSON body of a 2xx response
    async fn fetch_json(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, TranslateError> {
        let response = request.send().await.map_err(|e| self.classify(url, e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(url, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|json| json["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(TranslateError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| TranslateError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        from: SourceLanguage,
        to: TargetLanguage,
        model: &str,
    ) -> Result<Translation, TranslateError> {
        let url = self.endpoint("/api/chat");
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(from, to),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(text, to),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
                num_ctx: self.num_ctx,
            },
        };

        let start = Instant::now();
        let result = self.fetch_json(&url, self.client.post(&url).json(&body)).await;
        let latency = start.elapsed();
        tracing::info!("Translation took {:.2} seconds", latency.as_secs_f64());

        let json = result?;
        let translated = json["message"]["content"]
            .as_str()
            .ok_or_else(|| TranslateError::MalformedResponse("no message content".to_string()))?;

        Ok(Translation {
            text: translated.trim().to_string(),
            from,
            to,
            model: model.to_string(),
            latency,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, TranslateError> {
        let url = self.endpoint("/api/tags");
        let json = self.fetch_json(&url, self.client.get(&url)).await?;

        let models = json["models"]
            .as_array()
            .ok_or_else(|| TranslateError::MalformedResponse("no model list".to_string()))?;

        Ok(models
            .iter()
            .filter_map(|m| m["name"].as_str().map(str::to_string))
            .collect())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Ollama".to_string(),
            endpoint: self.base_url.clone(),
        }
    }
}

/// Choose `preferred` when it is available, else the first listed model.
/// An empty listing keeps `preferred`.
pub fn pick_model(available: &[String], preferred: &str) -> String {
    if available.iter().any(|m| m == preferred) {
        return preferred.to_string();
    }
    available
        .first()
        .cloned()
        .unwrap_or_else(|| preferred.to_string())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Answer exactly one request with a canned response.
    /// The handle yields the raw request body.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request_body = read_request_body(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request_body
        });

        (url, handle)
    }

    async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    return String::from_utf8_lossy(&data[header_end + 4..]).to_string();
                }
            }
        }
        String::new()
    }

    fn translator_for(url: &str) -> OllamaTranslator {
        let config = TranslatorConfig {
            base_url: url.to_string(),
            ..TranslatorConfig::default()
        };
        OllamaTranslator::with_timeout(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_translate_sends_chat_request() {
        let reply = r#"{"message":{"role":"assistant","content":" 你好 \n"}}"#;
        let (url, server) = serve_once("200 OK", reply).await;
        let translator = translator_for(&url);

        let translation = translator
            .translate(
                "こんにちは",
                SourceLanguage::Japanese,
                TargetLanguage::TraditionalChinese,
                "gemma2:latest",
            )
            .await
            .unwrap();
        assert_eq!(translation.text, "你好");
        assert_eq!(translation.model, "gemma2:latest");

        let request: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(request["model"], "gemma2:latest");
        assert_eq!(request["stream"], false);
        assert_eq!(request["options"]["num_ctx"].as_u64(), Some(1024));
        assert!((request["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"].as_str().unwrap().contains("Traditional Chinese"));
        assert_eq!(messages[1]["role"], "user");
        assert!(messages[1]["content"].as_str().unwrap().ends_with("こんにちは"));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let (url, _server) =
            serve_once("500 Internal Server Error", r#"{"error":"model not loaded"}"#).await;
        let translator = translator_for(&url);

        let err = translator
            .translate("hi", SourceLanguage::English, TargetLanguage::English, "m")
            .await
            .unwrap_err();

        match err {
            TranslateError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model not loaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_reported() {
        let (url, _server) = serve_once("200 OK", "not json").await;
        let translator = translator_for(&url);

        let err = translator
            .translate("hi", SourceLanguage::English, TargetLanguage::English, "m")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_content_is_reported() {
        let (url, _server) = serve_once("200 OK", r#"{"done":true}"#).await;
        let translator = translator_for(&url);

        let err = translator
            .translate("hi", SourceLanguage::English, TargetLanguage::English, "m")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = translator_for(&url)
            .translate("hi", SourceLanguage::English, TargetLanguage::English, "m")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::Unreachable { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let config = TranslatorConfig {
            base_url: url,
            ..TranslatorConfig::default()
        };
        let translator =
            OllamaTranslator::with_timeout(&config, Duration::from_millis(200)).unwrap();

        let err = translator
            .translate("hi", SourceLanguage::English, TargetLanguage::English, "m")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_list_models_reads_names() {
        let (url, _server) = serve_once(
            "200 OK",
            r#"{"models":[{"name":"llama3:8b","size":1},{"name":"gemma2:latest","size":2}]}"#,
        )
        .await;

        let models = translator_for(&url).list_models().await.unwrap();

        assert_eq!(models, vec!["llama3:8b".to_string(), "gemma2:latest".to_string()]);
    }

    #[test]
    fn test_pick_model_prefers_default() {
        let available = vec!["llama3:8b".to_string(), DEFAULT_MODEL.to_string()];
        assert_eq!(pick_model(&available, DEFAULT_MODEL), DEFAULT_MODEL);
    }

    #[test]
    fn test_pick_model_falls_back_to_first() {
        let available = vec!["llama3:8b".to_string(), "qwen2.5:7b".to_string()];
        assert_eq!(pick_model(&available, DEFAULT_MODEL), "llama3:8b");
        assert_eq!(pick_model(&[], DEFAULT_MODEL), DEFAULT_MODEL);
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let translator = translator_for("http://localhost:11434/");
        assert_eq!(translator.endpoint("/api/chat"), "http://localhost:11434/api/chat");
    }
}

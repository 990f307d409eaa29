use crate::llm::client::{FragmentStream, LLMClient};
use crate::types::{AppError, Result};
use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};
use reqwest::Url;

/// Default chat model served by Ollama
pub const DEFAULT_CHAT_MODEL: &str = "qwq";

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Build an Ollama handle from a base URL such as `http://localhost:11434`.
///
/// The URL is kept as given, path prefix included, so a proxied server such
/// as `https://gw.lan/ollama` works. Only a URL with no port at all gets
/// Ollama's default port; an explicit `:80` or `:443` is honored.
pub fn connect(base_url: &str) -> std::result::Result<Ollama, String> {
    let invalid = |reason: &str| format!("Invalid Ollama URL '{}': {}", base_url, reason);

    let mut url = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if !has_explicit_port(base_url) {
        url.set_port(Some(DEFAULT_OLLAMA_PORT))
            .map_err(|_| invalid("cannot carry a port"))?;
    }

    // Endpoints are appended as `api/...`, so the prefix must end in a slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(Ollama::from_url(url))
}

/// Whether the authority of `raw` names a port. `Url::port` cannot tell,
/// since it hides a port equal to the scheme's default.
fn has_explicit_port(raw: &str) -> bool {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host.contains(':')
}

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = connect(base_url).map_err(AppError::GenerationProvider)?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt.to_string())];
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::GenerationProvider(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }

    async fn stream(&self, prompt: &str) -> Result<FragmentStream> {
        let messages = vec![ChatMessage::user(prompt.to_string())];
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let mut stream_response = self
            .client
            .send_chat_messages_stream(request)
            .await
            .map_err(|e| AppError::GenerationProvider(format!("Ollama stream error: {}", e)))?;

        let model = self.model.clone();
        let output_stream = stream! {
            let mut finished = false;
            while let Some(chunk_result) = stream_response.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        let content = chunk.message.content;
                        if !content.is_empty() {
                            yield Ok(content);
                        }
                        if chunk.done {
                            finished = true;
                            break;
                        }
                    }
                    Err(_) => {
                        yield Err(AppError::GenerationProvider(format!(
                            "'{}' sent a malformed stream chunk",
                            model
                        )));
                        finished = true;
                        break;
                    }
                }
            }
            // The connection closed without the model's end-of-stream marker
            if !finished {
                yield Err(AppError::GenerationProvider(format!(
                    "'{}' stream ended before completion",
                    model
                )));
            }
        };

        Ok(Box::new(Box::pin(output_stream)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_full_url() {
        let ollama = connect("http://localhost:11434").unwrap();
        assert_eq!(ollama.url_str(), "http://localhost:11434/");

        let ollama = connect("https://ollama.internal:8443").unwrap();
        assert_eq!(ollama.url_str(), "https://ollama.internal:8443/");
    }

    #[test]
    fn test_connect_without_port_uses_ollama_default() {
        let ollama = connect("http://192.168.1.100").unwrap();
        assert_eq!(ollama.url_str(), "http://192.168.1.100:11434/");
    }

    #[test]
    fn test_connect_keeps_explicit_default_ports() {
        // The URL parser drops these ports from the serialized form, but the
        // request still goes to the scheme's port rather than 11434
        let ollama = connect("http://ollama.lan:80").unwrap();
        assert_eq!(ollama.url_str(), "http://ollama.lan/");
        assert_eq!(ollama.url().port_or_known_default(), Some(80));

        let ollama = connect("https://ollama.lan:443").unwrap();
        assert_eq!(ollama.url().port_or_known_default(), Some(443));
    }

    #[test]
    fn test_connect_keeps_path_prefix() {
        let ollama = connect("http://gw.lan/ollama").unwrap();
        assert_eq!(ollama.url_str(), "http://gw.lan:11434/ollama/");

        let ollama = connect("https://gw.lan:443/proxy/ollama/").unwrap();
        assert_eq!(ollama.url_str(), "https://gw.lan/proxy/ollama/");
    }

    #[test]
    fn test_has_explicit_port() {
        assert!(has_explicit_port("http://ollama.lan:80"));
        assert!(has_explicit_port("http://user:pw@ollama.lan:8080/x"));
        assert!(has_explicit_port("http://[::1]:11434"));
        assert!(!has_explicit_port("http://[::1]/ollama"));
        assert!(!has_explicit_port("http://user:pw@ollama.lan/x:y"));
    }

    #[test]
    fn test_connect_rejects_missing_scheme_or_host() {
        let err = connect("localhost:11434").unwrap_err();
        assert!(err.contains("localhost:11434"));
        assert!(connect("not a url").is_err());
    }

    #[test]
    fn test_client_model_name() {
        let client = OllamaClient::new(DEFAULT_OLLAMA_URL, DEFAULT_CHAT_MODEL).unwrap();
        assert_eq!(client.model_name(), "qwq");
    }
}

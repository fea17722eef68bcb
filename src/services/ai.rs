//! OpenAI-compatible chat completions and prompt-to-image generation.

use crate::{
    config::settings::AiConfig,
    core::conversation::Turn,
    errors::{Error, Result},
    services::{check_status, http_client},
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::instrument;

const SERVICE: &str = "ai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client for the configured inference provider.
#[derive(Debug, Clone)]
pub struct AiClient {
    chat: reqwest::Client,
    images: reqwest::Client,
    config: AiConfig,
    api_key: Option<String>,
}

impl AiClient {
    /// Creates the client. Without an API key every chat call fails with
    /// [`Error::ExternalService`]; image generation needs no key.
    pub fn new(config: &AiConfig, user_agent: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            chat: http_client(config.timeout(), user_agent)?,
            images: http_client(config.image_timeout(), user_agent)?,
            config: config.clone(),
            api_key,
        })
    }

    /// The full message list for a request: system prompt, prior turns, new question.
    #[must_use]
    pub fn messages(&self, history: &[Turn], question: &str) -> Vec<Turn> {
        std::iter::once(Turn::user(self.config.system_prompt.clone()))
            .chain(history.iter().cloned())
            .chain(std::iter::once(Turn::user(question)))
            .collect()
    }

    /// Asks the model `question` in the context of `history`.
    #[instrument(skip(self, history, question), fields(turns = history.len()))]
    pub async fn chat(&self, history: &[Turn], question: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| Error::ExternalService {
            service: SERVICE,
            message: "AI_API_KEY is not set".to_string(),
        })?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: self.messages(history, question),
        };

        let response = self.chat.post(url).bearer_auth(api_key).json(&body).send().await?;
        let response: ChatResponse = check_status(SERVICE, response)?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::ExternalService {
                service: SERVICE,
                message: "empty completion".to_string(),
            })
    }

    /// URL of the generated image for `prompt`; the prompt is one encoded path segment.
    pub fn image_url(&self, prompt: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.image_url).map_err(|e| Error::Config {
            message: format!("invalid ai.image_url: {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|()| Error::Config {
                message: "ai.image_url cannot take path segments".to_string(),
            })?
            .pop_if_empty()
            .push(prompt);
        Ok(url)
    }

    /// Generates an image and returns its bytes.
    #[instrument(skip(self))]
    pub async fn draw(&self, prompt: &str) -> Result<Vec<u8>> {
        let response = self.images.get(self.image_url(prompt)?).send().await?;
        let bytes = check_status(SERVICE, response)?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn client(api_key: Option<&str>) -> AiClient {
        AiClient::new(&AiConfig::default(), "comet-test", api_key.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_messages_wrap_history() {
        let ai = client(None);
        let messages = ai.messages(&[Turn::user("P"), Turn::assistant("A")], "Q");
        assert_eq!(messages.len(), 4);
        assert!(messages[0].content.starts_with("[SYSTEM]"));
        assert_eq!(messages[1], Turn::user("P"));
        assert_eq!(messages[2], Turn::assistant("A"));
        assert_eq!(messages[3], Turn::user("Q"));
    }

    #[test]
    fn test_image_url_encodes_prompt() {
        let url = client(None).image_url("ein Hund/Katze & mehr?").unwrap();
        assert_eq!(
            url.as_str(),
            "https://image.pollinations.ai/prompt/ein%20Hund%2FKatze%20&%20mehr%3F"
        );
    }

    #[tokio::test]
    async fn test_chat_without_key_fails_fast() {
        let result = client(None).chat(&[], "Hallo").await;
        assert!(matches!(result, Err(Error::ExternalService { service: "ai", .. })));
    }

    #[test]
    fn test_completion_parsing() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hallo!"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Hallo!"));
    }
}

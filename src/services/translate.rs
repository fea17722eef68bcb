//! Machine translation of card texts.
//!
//! All texts are written in German. Before a text is sent to the translator, Discord
//! markup that must survive verbatim (`:emoji:` names, `<@mentions>`, `<t:..:R>`
//! timestamps, custom emoji) is swapped for numbered tokens and restored afterwards.
//! Any failure returns the original text.

use crate::{
    config::settings::TranslationConfig,
    core::settings::Language,
    errors::{Error, Result},
    services::check_status,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::instrument;

const SERVICE: &str = "translate";

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<[^<>\s]+>|:[A-Za-z0-9_]+:").ok());

/// Translates texts to a target language.
#[derive(Debug, Clone)]
pub struct Translator {
    http: reqwest::Client,
    endpoint: String,
}

impl Translator {
    /// Creates a translator on top of a shared HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &TranslationConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
        }
    }

    /// Translates `text` into `target`, returning `text` unchanged for German, for
    /// blank input, and on any failure.
    pub async fn translate(&self, text: &str, target: Language) -> String {
        if target == Language::De || text.trim().is_empty() {
            return text.to_string();
        }
        match self.try_translate(text, target).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Translation to {target} failed, using original text: {e}");
                text.to_string()
            }
        }
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn try_translate(&self, text: &str, target: Language) -> Result<String> {
        let (protected, placeholders) = protect(text);

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", protected.as_str()),
            ])
            .send()
            .await?;
        let body: Value = check_status(SERVICE, response)?.json().await?;

        let translated = parse_response(&body).ok_or_else(|| Error::ExternalService {
            service: SERVICE,
            message: "unexpected response shape".to_string(),
        })?;
        Ok(restore(&translated, &placeholders))
    }
}

/// Replaces protected markup with `[[n]]` tokens. Returns the text and the originals.
#[must_use]
pub fn protect(text: &str) -> (String, Vec<String>) {
    let Some(pattern) = PLACEHOLDER.as_ref() else {
        return (text.to_string(), Vec::new());
    };

    let mut originals: Vec<String> = Vec::new();
    let replaced = pattern.replace_all(text, |caps: &regex::Captures<'_>| {
        let original = caps[0].to_string();
        let index = originals
            .iter()
            .position(|known| *known == original)
            .unwrap_or_else(|| {
                originals.push(original);
                originals.len() - 1
            });
        format!("[[{index}]]")
    });
    (replaced.into_owned(), originals)
}

/// Puts the originals back in place of their tokens.
#[must_use]
pub fn restore(text: &str, originals: &[String]) -> String {
    originals
        .iter()
        .enumerate()
        .fold(text.to_string(), |acc, (index, original)| {
            acc.replace(&format!("[[{index}]]"), original)
        })
}

/// Joins the translated sentences of a `translate_a/single` response
/// (`[[["Hello", "Hallo", ...], ...], ...]`).
#[must_use]
pub fn parse_response(body: &Value) -> Option<String> {
    let sentences = body.get(0)?.as_array()?;
    let text: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0)?.as_str())
        .collect();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protect_and_restore() {
        let text = "<a:coin:1414662564029272235> <@42> hat **10 Coins** :tada: :tada: <t:1700000000:R>";
        let (protected, originals) = protect(text);
        assert_eq!(protected, "[[0]] [[1]] hat **10 Coins** [[2]] [[2]] [[3]]");
        assert_eq!(originals.len(), 4);
        assert_eq!(restore(&protected, &originals), text);
    }

    #[test]
    fn test_restore_after_translation() {
        let (_, originals) = protect("Du hast :coin: erhalten");
        assert_eq!(restore("You received [[0]]", &originals), "You received :coin:");
    }

    #[test]
    fn test_parse_response() {
        let body = json!([[["Hello ", "Hallo ", null, null], ["world", "Welt", null, null]], null, "de"]);
        assert_eq!(parse_response(&body).as_deref(), Some("Hello world"));
        assert_eq!(parse_response(&json!({"error": 1})), None);
        assert_eq!(parse_response(&json!([[]])), None);
    }

    #[tokio::test]
    async fn test_german_is_never_sent() {
        let translator = Translator::new(
            reqwest::Client::new(),
            &TranslationConfig {
                endpoint: "http://127.0.0.1:9/unreachable".to_string(),
                buttons_timeout_secs: 1,
            },
        );
        assert_eq!(translator.translate("Hallo", Language::De).await, "Hallo");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let translator = Translator::new(
            reqwest::Client::new(),
            &TranslationConfig {
                endpoint: "http://127.0.0.1:9/unreachable".to_string(),
                buttons_timeout_secs: 1,
            },
        );
        assert_eq!(translator.translate("Hallo :coin:", Language::En).await, "Hallo :coin:");
    }
}

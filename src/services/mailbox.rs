//! Disposable mailboxes on a mail.tm compatible API.

use crate::{
    config::settings::MailboxConfig,
    errors::{Error, Result},
    services::check_status,
};
use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use tracing::instrument;

const SERVICE: &str = "mail.tm";
/// Characters of a mail body shown in the inbox card
pub const PREVIEW_CHARS: usize = 200;
/// Number of mails listed in the inbox card
pub const INBOX_SIZE: usize = 5;

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());
static BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").ok());

/// A registered mailbox
#[derive(Debug, Clone)]
pub struct Mailbox {
    /// Full e-mail address
    pub address: String,
    token: String,
}

/// One received mail, reduced to what the inbox card shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    /// Provider id
    pub id: String,
    /// Subject or a placeholder
    pub subject: String,
    /// Sender address or a placeholder
    pub from: String,
    /// Plain text body (HTML bodies are reduced to text)
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct Domain {
    domain: String,
    #[serde(default = "active", rename = "isActive")]
    is_active: bool,
}

const fn active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Token {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageSummary {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    id: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    from: Option<Sender>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    html: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Sender {
    #[serde(default)]
    address: Option<String>,
}

impl From<MessageDetail> for Mail {
    fn from(detail: MessageDetail) -> Self {
        let text = detail
            .text
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| html_to_text(&detail.html.join("\n")));
        Self {
            id: detail.id,
            subject: detail
                .subject
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "(Kein Betreff)".to_string()),
            from: detail
                .from
                .and_then(|sender| sender.address)
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| "(Unbekannter Absender)".to_string()),
            text,
        }
    }
}

/// Client for the mailbox provider.
#[derive(Debug, Clone)]
pub struct MailboxClient {
    http: reqwest::Client,
    api_base: String,
}

impl MailboxClient {
    /// Creates the client on top of a shared HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &MailboxConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Registers a new random mailbox and logs into it.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Mailbox> {
        let response = self
            .http
            .get(self.url("/domains"))
            .header("Accept", "application/json")
            .send()
            .await?;
        let domains: Vec<Domain> = check_status(SERVICE, response)?.json().await?;
        let domain = domains
            .into_iter()
            .find(|d| d.is_active)
            .ok_or_else(|| Error::ExternalService {
                service: SERVICE,
                message: "no active domain".to_string(),
            })?
            .domain;

        let (local, password) = {
            let mut rng = rand::rng();
            (random_string(&mut rng, 10).to_lowercase(), random_string(&mut rng, 16))
        };
        let address = format!("{local}@{domain}");
        let credentials = json!({"address": address, "password": password});

        let response = self
            .http
            .post(self.url("/accounts"))
            .json(&credentials)
            .send()
            .await?;
        check_status(SERVICE, response)?;

        let response = self
            .http
            .post(self.url("/token"))
            .json(&credentials)
            .send()
            .await?;
        let token: Token = check_status(SERVICE, response)?.json().await?;

        tracing::info!("Created temporary mailbox");
        Ok(Mailbox {
            address,
            token: token.token,
        })
    }

    /// The newest [`INBOX_SIZE`] mails, newest first.
    #[instrument(skip(self, mailbox))]
    pub async fn inbox(&self, mailbox: &Mailbox) -> Result<Vec<Mail>> {
        let response = self
            .http
            .get(self.url("/messages"))
            .header("Accept", "application/json")
            .bearer_auth(&mailbox.token)
            .send()
            .await?;
        let summaries: Vec<MessageSummary> = check_status(SERVICE, response)?.json().await?;

        let mut mails = Vec::new();
        for summary in summaries.into_iter().take(INBOX_SIZE) {
            let response = self
                .http
                .get(self.url(&format!("/messages/{}", summary.id)))
                .header("Accept", "application/json")
                .bearer_auth(&mailbox.token)
                .send()
                .await?;
            let detail: MessageDetail = check_status(SERVICE, response)?.json().await?;
            mails.push(detail.into());
        }
        Ok(mails)
    }
}

fn random_string<R>(rng: &mut R, len: usize) -> String
where
    R: Rng,
{
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Strips tags, scripts and styles and collapses whitespace.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let (Some(block), Some(tag)) = (BLOCK.as_ref(), TAG.as_ref()) else {
        return html.to_string();
    };
    let without_blocks = block.replace_all(html, " ");
    let without_tags = tag.replace_all(&without_blocks, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First [`PREVIEW_CHARS`] characters of a body, with an ellipsis when cut.
#[must_use]
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

//! Outbound HTTP services: AI inference, translation, public fun APIs and the
//! disposable mailbox provider.
//!
//! Each service owns a `reqwest::Client` with its own deadline so one slow provider
//! cannot stall a command for longer than configured.

/// Chat completion and image generation
pub mod ai;
/// Public trivia, joke and image APIs
pub mod fun_api;
/// Disposable mailboxes (mail.tm)
pub mod mailbox;
/// Machine translation with placeholder protection
pub mod translate;

use crate::{
    config::{AppConfig, Environment},
    errors::{Error, Result},
};
use std::time::Duration;

pub use ai::AiClient;
pub use fun_api::FunApi;
pub use mailbox::MailboxClient;
pub use translate::Translator;

/// All outbound clients, built once at start-up and shared by the commands.
#[derive(Debug, Clone)]
pub struct Services {
    /// Chat and image generation
    pub ai: AiClient,
    /// Card translation
    pub translator: Translator,
    /// Fun APIs
    pub fun: FunApi,
    /// Temporary mail
    pub mailbox: MailboxClient,
}

impl Services {
    /// Builds every client from the configuration.
    pub fn new(config: &AppConfig, env: &Environment) -> Result<Self> {
        let user_agent = config.http.user_agent.as_str();
        let public = http_client(Duration::from_secs(config.http.timeout_secs), user_agent)?;

        Ok(Self {
            ai: AiClient::new(&config.ai, user_agent, env.ai_api_key.clone())?,
            translator: Translator::new(public.clone(), &config.translation),
            fun: FunApi::new(public.clone()),
            mailbox: MailboxClient::new(public, &config.mailbox),
        })
    }
}

/// A client with a total request deadline.
pub(crate) fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(Error::from)
}

/// Turns a non-success status into an [`Error::ExternalService`].
pub(crate) fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::ExternalService {
            service,
            message: format!("HTTP {status}"),
        })
    }
}

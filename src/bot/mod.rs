//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the framework-agnostic core to Discord: slash command groups,
//! gateway event handlers, the shared card renderer, and the client start-up.

/// Slash command groups
pub mod commands;
/// Gateway event handlers (AI reply threads, guild defaults, presence)
pub mod handlers;
/// Card rendering, translation, and language buttons
pub mod render;

use crate::{
    config::AppConfig,
    core::economy::Participant,
    errors::{Error, Result},
    services::Services,
    web::Control,
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands and handlers.
#[derive(Clone)]
pub struct BotData {
    /// Database connection for all state reads and writes
    pub database: DatabaseConnection,
    /// Tunables from `config.toml`
    pub config: Arc<AppConfig>,
    /// Outbound HTTP clients
    pub services: Services,
}

impl BotData {
    /// Creates the shared context handed to the framework on start-up.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: Arc<AppConfig>, services: Services) -> Self {
        Self {
            database,
            config,
            services,
        }
    }
}

/// Command context used throughout the bot layer
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Guild id of the invoking server.
///
/// Every command that touches per-server state is `guild_only`, so this only fails
/// when the framework invariant is broken.
pub fn guild_id(ctx: Context<'_>) -> Result<u64> {
    ctx.guild_id().map(serenity::GuildId::get).ok_or_else(|| Error::NotFound {
        what: "Server".to_string(),
    })
}

/// A Discord user as an economy participant.
#[must_use]
pub fn participant(user: &serenity::User) -> Participant {
    Participant {
        id: user.id.get(),
        is_bot: user.bot,
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                info!("Command `{}` refused: {}", ctx.command().qualified_name, error);
            } else {
                error!("Error in command `{}`: {:?}", ctx.command().qualified_name, error);
            }
            let card = render::Card::failure(render::failure_text(&error));
            if let Err(e) = render::respond(ctx, card, render::ResponseOptions::ephemeral()).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and runs until the shards stop.
///
/// Returns `Ok` when the shards were shut down through `control`, so the caller can
/// decide to start a fresh client.
#[instrument(skip_all)]
pub async fn run_bot(token: &str, data: BotData, control: Arc<Control>) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    control
        .attach(Arc::clone(&client.cache), Arc::clone(&client.shard_manager))
        .await;

    info!("Starting bot client...");
    let result = client.start_autosharded().await;
    control.detach().await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("Client stopped with error: {:?}", e);
            Err(e.into())
        }
    }
}

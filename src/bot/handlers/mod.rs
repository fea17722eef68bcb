//! Gateway event handlers
//!
//! Commands are dispatched by poise; everything else that reacts to raw gateway events
//! lives here: the AI reply listener, default seeding for servers, and the presence.

/// Server defaults and presence
pub mod guild;
/// AI conversation threads continued by replies
pub mod message;

use crate::{bot::BotData, errors::Error};
use poise::serenity_prelude as serenity;

/// Routes gateway events to their handlers.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            guild::on_ready(ctx, data_about_bot);
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            guild::on_guild_create(guild, data).await?;
        }
        serenity::FullEvent::Message { new_message } => {
            message::on_message(ctx, new_message, data).await?;
        }
        _ => {}
    }
    Ok(())
}

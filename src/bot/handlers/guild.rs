//! Server availability and presence.

use crate::{bot::BotData, core::settings, errors::Result};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Text shown as the bot's activity
pub const PRESENCE: &str = "Comet 2.0 | /help";

/// Sets the presence once the gateway session is ready.
pub fn on_ready(ctx: &serenity::Context, ready: &serenity::Ready) {
    ctx.set_activity(Some(serenity::ActivityData::playing(PRESENCE)));
    info!("{} is ready in {} guilds", ready.user.name, ready.guilds.len());
}

/// Writes the missing defaults for a server and its cached human members.
pub async fn on_guild_create(guild: &serenity::Guild, data: &BotData) -> Result<()> {
    let members = guild
        .members
        .values()
        .filter(|member| !member.user.bot)
        .map(|member| member.user.id.get())
        .collect::<Vec<u64>>();

    let written = settings::ensure_guild_defaults(&data.database, guild.id.get(), members).await?;
    if written > 0 {
        info!(guild = guild.id.get(), written, "Seeded defaults for {}", guild.name);
    }
    Ok(())
}

//! YouTube announcement commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            render::{Card, ResponseOptions, respond},
        },
        core::schedule::{self, TimestampStyle},
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;

    const YOUTUBE_RED: serenity::Colour = serenity::Colour::from_rgb(255, 0, 0);

    /// YouTube announcements.
    #[poise::command(slash_command, guild_only, subcommands("premiere"), subcommand_required)]
    pub async fn yt(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Announce a YouTube premiere.
    #[poise::command(slash_command, guild_only)]
    pub async fn premiere(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Titel des Videos"] title: String,
        #[description = "HH:MM, YYYY-MM-DD HH:MM oder 1d2h30m"] time: String,
        #[description = "Link zum Video"] url: Option<String>,
    ) -> Result<()> {
        let at = schedule::parse_time(&time, Utc::now(), &chrono::Local)?;

        let mut card = Card::new(
            "🎬 YouTube Premiere",
            format!(
                "**{title}** startet {}!",
                schedule::discord_timestamp(at, TimestampStyle::Relative)
            ),
        )
        .colour(YOUTUBE_RED)
        .field(
            "Datum",
            schedule::discord_timestamp(at, TimestampStyle::LongDateTime),
            true,
        )
        .field(
            "Uhrzeit",
            schedule::discord_timestamp(at, TimestampStyle::ShortTime),
            true,
        )
        .footer(format!("Angekündigt von {}", ctx.author().name));
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            card = card.field("Link", url, false);
        }
        respond(ctx, card, ResponseOptions::default()).await
    }
}

// Re-export all commands
pub use inner::*;

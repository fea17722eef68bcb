//! Continues `/ai ask` conversations when somebody replies into the thread.

use crate::{
    bot::BotData,
    core::conversation::{self, ChainMessage, ChainOutcome, MESSAGE_LIMIT, MessageLookup},
    errors::Result,
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{debug, warn};

/// Placeholder shown while the model is answering
pub const THINKING: &str = "🤔 Denke nach...";
/// Shown instead of an answer when the AI call failed
pub const AI_APOLOGY: &str =
    "❌ Entschuldigung, bei der Anfrage an die KI ist ein Fehler aufgetreten. Bitte versuche es später erneut.";

/// Reads chain messages from one Discord channel and thread roots from the store.
pub struct DiscordLookup<'a> {
    ctx: &'a serenity::Context,
    database: &'a DatabaseConnection,
    channel: serenity::ChannelId,
    guild: u64,
    bot: serenity::UserId,
}

impl<'a> DiscordLookup<'a> {
    /// A lookup for `channel` of `guild`.
    #[must_use]
    pub fn new(
        ctx: &'a serenity::Context,
        database: &'a DatabaseConnection,
        channel: serenity::ChannelId,
        guild: u64,
    ) -> Self {
        Self {
            ctx,
            database,
            channel,
            guild,
            bot: ctx.cache.current_user().id,
        }
    }

    /// Converts a Discord message into its chain form.
    #[must_use]
    pub fn chain_message(&self, message: &serenity::Message) -> ChainMessage {
        ChainMessage {
            id: message.id.get(),
            parent_id: message
                .message_reference
                .as_ref()
                .and_then(|reference| reference.message_id)
                .map(serenity::MessageId::get),
            from_bot: message.author.id == self.bot,
            content: message.content.clone(),
        }
    }
}

impl MessageLookup for DiscordLookup<'_> {
    async fn fetch(&self, id: u64) -> Result<Option<ChainMessage>> {
        match self.channel.message(self.ctx, serenity::MessageId::new(id)).await {
            Ok(message) => Ok(Some(self.chain_message(&message))),
            Err(e) => {
                debug!("Reply chain parent {id} unavailable: {e}");
                Ok(None)
            }
        }
    }

    async fn ask_prompt(&self, root: u64) -> Result<Option<String>> {
        conversation::thread_question(self.database, self.guild, root).await
    }
}

/// Answers a human reply that continues an AI thread. Other messages are ignored.
pub async fn on_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &BotData,
) -> Result<()> {
    if message.author.bot {
        return Ok(());
    }
    let Some(guild) = message.guild_id else {
        return Ok(());
    };
    let Some(reference) = message.message_reference.as_ref().and_then(|r| r.message_id) else {
        return Ok(());
    };

    let lookup = DiscordLookup::new(ctx, &data.database, message.channel_id, guild.get());
    let parent = match message.referenced_message.as_deref() {
        Some(parent) => lookup.chain_message(parent),
        None => match lookup.fetch(reference.get()).await? {
            Some(parent) => parent,
            None => return Ok(()),
        },
    };

    let max_depth = data.config.conversation.max_depth;
    let ChainOutcome::Rooted(history) =
        conversation::reconstruct_history(&lookup, parent, max_depth).await?
    else {
        return Ok(());
    };
    debug!(turns = history.len(), "Continuing AI thread");

    let mut thinking = message.reply(ctx, THINKING).await?;
    let _typing = message.channel_id.start_typing(&ctx.http);

    let answer = match data.services.ai.chat(&history, &message.content).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("AI reply failed: {e}");
            AI_APOLOGY.to_string()
        }
    };

    let mut chunks = conversation::chunk_text(&answer, MESSAGE_LIMIT).into_iter();
    if let Some(first) = chunks.next() {
        thinking
            .edit(ctx, serenity::EditMessage::new().content(first))
            .await?;
    }
    for chunk in chunks {
        message.channel_id.say(ctx, chunk).await?;
    }
    Ok(())
}

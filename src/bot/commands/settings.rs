//! Server settings commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, guild_id,
            render::{Card, ResponseOptions, respond},
        },
        core::settings::{self, Language},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Response language
    #[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
    pub enum LanguageChoice {
        #[name = "Deutsch"]
        De,
        #[name = "English"]
        En,
    }

    impl From<LanguageChoice> for Language {
        fn from(choice: LanguageChoice) -> Self {
            match choice {
                LanguageChoice::De => Self::De,
                LanguageChoice::En => Self::En,
            }
        }
    }

    /// Server settings.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        subcommands("language", "modlog"),
        subcommand_required
    )]
    pub async fn settings(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Set the language of the bot's answers.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
    pub async fn language(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Sprache"] language: LanguageChoice,
    ) -> Result<()> {
        let language = Language::from(language);
        settings::set_language(&ctx.data().database, guild_id(ctx)?, language).await?;

        let card = Card::success(
            "🌐 Sprache geändert",
            format!("Die Sprache des Bots ist jetzt **{}**.", language.code().to_uppercase()),
        );
        let options = ResponseOptions {
            language: Some(language),
            ..ResponseOptions::default()
        };
        respond(ctx, card, options).await
    }

    /// Set or clear the moderation log channel.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
    pub async fn modlog(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Kanal (leer: deaktivieren)"]
        #[channel_types("Text")]
        channel: Option<serenity::GuildChannel>,
    ) -> Result<()> {
        let id = channel.as_ref().map(|channel| channel.id.get());
        settings::set_mod_log_channel(&ctx.data().database, guild_id(ctx)?, id).await?;

        let card = match id {
            Some(id) => Card::success(
                "📝 Moderations-Log",
                format!("Moderationsaktionen werden jetzt in <#{id}> protokolliert."),
            ),
            None => Card::success("📝 Moderations-Log", "Das Moderations-Log wurde deaktiviert."),
        };
        respond(ctx, card, ResponseOptions::default()).await
    }
}

// Re-export all commands
pub use inner::*;

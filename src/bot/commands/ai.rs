//! AI commands - questions that start a reply thread, and image generation.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, guild_id,
            handlers::message::{AI_APOLOGY, THINKING},
            render::{Card, ResponseOptions, respond},
        },
        core::conversation::{self, MESSAGE_LIMIT},
        errors::{Error, Result},
    };
    use poise::{CreateReply, serenity_prelude as serenity};
    use std::time::Instant;

    const PROMPT_PREVIEW_CHARS: usize = 800;
    const IMAGE_NAME: &str = "generated_image.png";

    /// Chat with the AI.
    #[poise::command(slash_command, guild_only, subcommands("ask", "draw"), subcommand_required)]
    pub async fn ai(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Ask the AI a question. Reply to the answer to continue the conversation.
    #[poise::command(slash_command, guild_only)]
    pub async fn ask(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Deine Frage"] question: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let handle = ctx.send(CreateReply::default().content(THINKING)).await?;

        let answer = match ctx.data().services.ai.chat(&[], &question).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("AI question failed: {e}");
                handle
                    .edit(ctx, CreateReply::default().content(AI_APOLOGY))
                    .await?;
                return Ok(());
            }
        };

        let mut chunks = conversation::chunk_text(&answer, MESSAGE_LIMIT).into_iter();
        if let Some(first) = chunks.next() {
            handle.edit(ctx, CreateReply::default().content(first)).await?;
        }

        let root = handle.message().await?.id.get();
        conversation::record_thread(&ctx.data().database, guild_id(ctx)?, root, &question).await?;

        for chunk in chunks {
            ctx.send(CreateReply::default().content(chunk)).await?;
        }
        Ok(())
    }

    /// Let the AI draw a picture.
    #[poise::command(slash_command, guild_only)]
    pub async fn draw(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Was soll gezeichnet werden?"] prompt: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let started = Instant::now();

        let image = match ctx.data().services.ai.draw(&prompt).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Image generation failed: {e}");
                let card = Card::failure("Das Bild konnte nicht erstellt werden. Bitte versuche es später erneut.");
                return respond(ctx, card, ResponseOptions::default()).await;
            }
        };

        let shown_prompt: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        let card = Card::success("🎨 Bild generiert", "")
            .field("Prompt", shown_prompt, false)
            .field(
                "Dauer",
                format!("{:.1} Sekunden", started.elapsed().as_secs_f64()),
                true,
            )
            .image(format!("attachment://{IMAGE_NAME}"));

        let options = ResponseOptions {
            attachment: Some(serenity::CreateAttachment::bytes(image, IMAGE_NAME)),
            ..ResponseOptions::default()
        };
        respond(ctx, card, options).await
    }
}

// Re-export all commands
pub use inner::*;

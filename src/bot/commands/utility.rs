//! Utility commands - polls, temporary mail, latency and countdowns.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            render::{
                Card, ResponseOptions, failure_text, notify_press, respond, server_language,
                update_press,
            },
        },
        core::{
            poll::{NUMBER_EMOJIS, Poll},
            schedule::{self, TimestampStyle},
        },
        errors::{Error, Result},
        services::mailbox::{self, Mail},
    };
    use chrono::Utc;
    use poise::{CreateReply, serenity_prelude as serenity};
    use std::{
        fmt::Write,
        time::{Duration, Instant},
    };

    const BAR_WIDTH: usize = 10;

    /// How votes are collected
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, poise::ChoiceParameter)]
    pub enum PollMethod {
        #[default]
        #[name = "Buttons"]
        Buttons,
        #[name = "Reaktionen"]
        Reactions,
    }

    /// Useful tools.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("create", "teampmail", "ping", "countdown"),
        subcommand_required
    )]
    pub async fn utility(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    fn poll_card(poll: &Poll, finished: bool) -> Result<Card> {
        let tally = poll.tally();
        let total: usize = tally.iter().sum();

        let mut description = String::new();
        for (index, (option, votes)) in poll.options().iter().zip(&tally).enumerate() {
            let filled = if total == 0 { 0 } else { votes * BAR_WIDTH / total };
            writeln!(
                description,
                "{} {option}\n`{}{}` **{votes}**",
                NUMBER_EMOJIS[index],
                "█".repeat(filled),
                "░".repeat(BAR_WIDTH - filled),
            )?;
        }

        let footer = if finished {
            format!("Umfrage beendet - {total} Stimmen")
        } else {
            format!("{total} Stimmen - erneutes Abstimmen ändert deine Stimme")
        };
        Ok(Card::new(format!("📊 {}", poll.question()), description).footer(footer))
    }

    fn poll_buttons(poll_id: u64, poll: &Poll) -> Vec<serenity::CreateActionRow> {
        vec![serenity::CreateActionRow::Buttons(
            poll.options()
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let label: String = option.chars().take(70).collect();
                    serenity::CreateButton::new(format!("poll:{poll_id}:{index}"))
                        .label(label)
                        .emoji(serenity::ReactionType::Unicode(NUMBER_EMOJIS[index].to_string()))
                        .style(serenity::ButtonStyle::Secondary)
                })
                .collect(),
        )]
    }

    /// Start a poll with two to four options.
    #[poise::command(slash_command, guild_only)]
    pub async fn create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Frage"] question: String,
        #[description = "Option 1"] option1: String,
        #[description = "Option 2"] option2: String,
        #[description = "Option 3"] option3: Option<String>,
        #[description = "Option 4"] option4: Option<String>,
        #[description = "Abstimmung per Buttons oder Reaktionen"] method: Option<PollMethod>,
    ) -> Result<()> {
        let options = [Some(option1), Some(option2), option3, option4]
            .into_iter()
            .flatten();
        let mut poll = Poll::new(question, options)?;
        let language = server_language(ctx).await?;
        let translator = &ctx.data().services.translator;

        if method.unwrap_or_default() == PollMethod::Reactions {
            let card = poll_card(&poll, false)?.footer("Stimme mit den Reaktionen ab");
            let embed = card.translated(translator, language).await.into_embed();
            let message = ctx
                .send(CreateReply::default().embed(embed))
                .await?
                .into_message()
                .await?;
            for emoji in NUMBER_EMOJIS.iter().take(poll.options().len()) {
                message
                    .react(
                        ctx.serenity_context(),
                        serenity::ReactionType::Unicode((*emoji).to_string()),
                    )
                    .await?;
            }
            return Ok(());
        }

        let poll_id = ctx.id();
        let embed = poll_card(&poll, false)?
            .translated(translator, language)
            .await
            .into_embed();
        let handle = ctx
            .send(
                CreateReply::default()
                    .embed(embed)
                    .components(poll_buttons(poll_id, &poll)),
            )
            .await?;

        let sctx = ctx.serenity_context();
        let idle = Duration::from_secs(ctx.data().config.games.poll_timeout_secs);
        let prefix = format!("poll:{poll_id}:");

        while let Some(press) = serenity::ComponentInteractionCollector::new(sctx)
            .filter({
                let prefix = prefix.clone();
                move |press| press.data.custom_id.starts_with(&prefix)
            })
            .timeout(idle)
            .await
        {
            let voted: Result<()> = async {
                let option = press
                    .data
                    .custom_id
                    .trim_start_matches(&prefix)
                    .parse::<usize>()
                    .map_err(|_| Error::NotFound {
                        what: format!("Option '{}'", press.data.custom_id),
                    })?;
                poll.vote(press.user.id.get(), option)?;

                let embed = poll_card(&poll, false)?
                    .translated(translator, language)
                    .await
                    .into_embed();
                update_press(sctx, &press, embed, poll_buttons(poll_id, &poll)).await
            }
            .await;

            if let Err(e) = voted {
                tracing::warn!(poll = poll_id, "Could not record vote: {e}");
                if let Err(e) =
                    notify_press(sctx, &press, translator, language, &failure_text(&e)).await
                {
                    tracing::debug!(poll = poll_id, "Could not answer vote: {e}");
                }
            }
        }

        let embed = poll_card(&poll, true)?
            .translated(translator, language)
            .await
            .into_embed();
        handle
            .edit(ctx, CreateReply::default().embed(embed).components(Vec::new()))
            .await?;
        Ok(())
    }

    fn inbox_card(address: &str, mails: &[Mail], lifetime: Duration, expired: bool) -> Card {
        let description = format!(
            "Deine Adresse: `{address}`\nDas Postfach wird regelmäßig geprüft und ist {} Minuten aktiv.",
            lifetime.as_secs() / 60
        );
        let mut card = Card::new("📬 Temporäre E-Mail", description);
        if mails.is_empty() {
            card = card.field("Posteingang", "Noch keine E-Mails erhalten.", false);
        }
        for mail in mails {
            let body = mailbox::preview(&mail.text);
            let body = if body.is_empty() {
                "(Kein Inhalt)".to_string()
            } else {
                body
            };
            card = card.field(format!("{} - von {}", mail.subject, mail.from), body, false);
        }
        if expired {
            card = card.footer("Das Postfach ist abgelaufen.");
        }
        card
    }

    /// Create a temporary e-mail address (only visible to you).
    #[poise::command(slash_command, guild_only)]
    pub async fn teampmail(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let client = &ctx.data().services.mailbox;
        let config = &ctx.data().config.mailbox;
        let lifetime = Duration::from_secs(config.lifetime_secs);
        let interval = Duration::from_secs(config.poll_interval_secs.max(1));

        let mailbox = match client.create().await {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!("Mailbox creation failed: {e}");
                let card = Card::failure("Die temporäre E-Mail konnte nicht erstellt werden.");
                return respond(ctx, card, ResponseOptions::ephemeral()).await;
            }
        };

        let handle = ctx
            .send(CreateReply::default().content("📬").ephemeral(true))
            .await?;
        let edit = || ResponseOptions {
            ephemeral: true,
            ..ResponseOptions::edit(&handle)
        };
        respond(ctx, inbox_card(&mailbox.address, &[], lifetime, false), edit()).await?;

        let started = Instant::now();
        let mut shown: Vec<String> = Vec::new();
        while started.elapsed() < lifetime {
            tokio::time::sleep(interval).await;
            let mails = match client.inbox(&mailbox).await {
                Ok(mails) => mails,
                Err(e) => {
                    tracing::debug!("Inbox poll failed: {e}");
                    continue;
                }
            };
            let ids: Vec<String> = mails.iter().map(|mail| mail.id.clone()).collect();
            if ids != shown {
                shown = ids;
                respond(ctx, inbox_card(&mailbox.address, &mails, lifetime, false), edit()).await?;
            }
        }

        let mails = client.inbox(&mailbox).await.unwrap_or_default();
        respond(ctx, inbox_card(&mailbox.address, &mails, lifetime, true), edit()).await
    }

    /// Show the bot's latency.
    #[poise::command(slash_command, guild_only)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let latency = ctx.ping().await;
        let text = if latency.is_zero() {
            "Die Latenz wird noch gemessen.".to_string()
        } else {
            format!("Latenz: **{} ms**", latency.as_millis())
        };
        respond(ctx, Card::new("🏓 Pong!", text), ResponseOptions::default()).await
    }

    /// Count down to a point in time.
    #[poise::command(slash_command, guild_only)]
    pub async fn countdown(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "HH:MM, YYYY-MM-DD HH:MM oder 1d2h30m"] time: String,
        #[description = "Titel"] title: Option<String>,
    ) -> Result<()> {
        let at = schedule::parse_time(&time, Utc::now(), &chrono::Local)?;
        let title = title.unwrap_or_else(|| "Countdown".to_string());

        let card = Card::new(
            format!("⏳ {title}"),
            format!("Endet {}", schedule::discord_timestamp(at, TimestampStyle::Relative)),
        )
        .field(
            "Zeitpunkt",
            schedule::discord_timestamp(at, TimestampStyle::LongDateTime),
            false,
        );
        respond(ctx, card, ResponseOptions::default()).await
    }
}

// Re-export all commands
pub use inner::*;

//! Economy commands - daily bonus, balances, transfers, theft and conversion.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, guild_id, participant,
            render::{Card, FAILURE, ResponseOptions, respond},
        },
        core::{
            economy::{self, StealRoll},
            leaderboard::{self, Board, Entry},
        },
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;
    use rand::{SeedableRng, rngs::StdRng};
    use std::fmt::Write;

    /// The coin economy.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("daily", "balance", "pay", "steal", "leaderboard", "change_to_points"),
        subcommand_required
    )]
    pub async fn eco(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Claim your daily bonus.
    #[poise::command(slash_command, guild_only)]
    pub async fn daily(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let mut rng = StdRng::from_os_rng();
        let reward = economy::claim_daily(
            &ctx.data().database,
            guild_id(ctx)?,
            ctx.author().id.get(),
            Utc::now(),
            &mut rng,
        )
        .await?;

        let card = Card::success(
            "💰 Täglicher Bonus",
            format!("Du hast **{}** :coin: erhalten!", reward.bonus),
        )
        .field("🔥 Streak", format!("{} Tage", reward.streak), true)
        .field("Kontostand", format!("{} :coin:", reward.balance), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Show your balance or that of another member.
    #[poise::command(slash_command, guild_only)]
    pub async fn balance(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied (Standard: du selbst)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let user = user.as_ref().unwrap_or_else(|| ctx.author());
        let balance = economy::balance(&ctx.data().database, guild_id(ctx)?, user.id.get()).await?;

        let card = Card::new(
            "💰 Kontostand",
            format!("<@{}> hat **{balance}** :coin:", user.id),
        )
        .thumbnail(user.face());
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Send coins to another member.
    #[poise::command(slash_command, guild_only)]
    pub async fn pay(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Empfänger"] user: serenity::User,
        #[description = "Betrag"] amount: i64,
    ) -> Result<()> {
        let transfer = economy::pay(
            &ctx.data().database,
            guild_id(ctx)?,
            ctx.author().id.get(),
            participant(&user),
            amount,
        )
        .await?;

        let card = Card::success(
            "💸 Überweisung",
            format!("Du hast <@{}> **{}** :coin: gesendet.", user.id, transfer.amount),
        )
        .field("Dein Kontostand", format!("{} :coin:", transfer.sender_balance), true)
        .field(
            "Kontostand Empfänger",
            format!("{} :coin:", transfer.recipient_balance),
            true,
        );
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Try to steal coins from another member.
    #[poise::command(slash_command, guild_only)]
    pub async fn steal(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Opfer"] user: serenity::User,
    ) -> Result<()> {
        let mut rng = StdRng::from_os_rng();
        let outcome = economy::steal(
            &ctx.data().database,
            guild_id(ctx)?,
            ctx.author().id.get(),
            participant(&user),
            &mut rng,
        )
        .await?;

        let card = match outcome.roll {
            StealRoll::Success { amount } => Card::success(
                "🦹 Diebstahl erfolgreich",
                format!("Du hast <@{}> **{amount}** :coin: gestohlen!", user.id),
            ),
            StealRoll::Caught { penalty } => Card::new(
                "🚨 Erwischt!",
                format!("Du wurdest erwischt und musst **{penalty}** :coin: Strafe zahlen!"),
            )
            .colour(FAILURE),
        }
        .field("Dein Kontostand", format!("{} :coin:", outcome.thief_balance), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// The ten richest members.
    #[poise::command(slash_command, guild_only)]
    pub async fn leaderboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let card = leaderboard_card(ctx, Board::Coins, "🏆 Reichste Mitglieder", ":coin:").await?;
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Convert coins into points (2 coins = 1 point).
    #[poise::command(slash_command, guild_only, rename = "change-to-points")]
    pub async fn change_to_points(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Anzahl Coins"] amount: i64,
    ) -> Result<()> {
        let conversion = economy::coins_to_points(
            &ctx.data().database,
            guild_id(ctx)?,
            ctx.author().id.get(),
            amount,
        )
        .await?;

        let card = Card::success(
            "🔄 Umgetauscht",
            format!(
                "**{}** :coin: wurden in **{}** Punkte umgetauscht.",
                conversion.spent, conversion.received
            ),
        )
        .field("Coins", conversion.coins.to_string(), true)
        .field("Punkte", conversion.points.to_string(), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Builds a ranked card. Names come from the cache; members missing there are
    /// shown as mentions.
    pub(crate) async fn leaderboard_card(
        ctx: poise::Context<'_, BotData, Error>,
        board: Board,
        title: &str,
        unit: &str,
    ) -> Result<Card> {
        let guild = guild_id(ctx)?;
        let entries = leaderboard::load(&ctx.data().database, guild, board).await?;
        if entries.is_empty() {
            return Ok(Card::new(title, "Noch keine Einträge vorhanden."));
        }

        let names: Vec<Option<String>> = {
            let cached = ctx.serenity_context().cache.guild(serenity::GuildId::new(guild));
            entries
                .iter()
                .map(|entry| {
                    let member = cached
                        .as_ref()?
                        .members
                        .get(&serenity::UserId::new(entry.user))?;
                    Some(member.display_name().to_string())
                })
                .collect()
        };

        let mut lines = String::new();
        for (rank, (Entry { user, value }, name)) in entries.iter().zip(names).enumerate() {
            let name = name.unwrap_or_else(|| format!("<@{user}>"));
            writeln!(lines, "**{}.** {name} - {value} {unit}", rank + 1)?;
        }
        Ok(Card::new(title, lines))
    }
}

// Re-export all commands
pub use inner::*;

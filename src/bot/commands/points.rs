//! Point commands - balances, staff adjustments, gifts and conversion.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::eco::leaderboard_card,
            guild_id, participant,
            render::{Card, ResponseOptions, respond},
        },
        core::{economy, leaderboard::Board, points},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Point balances.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "show",
            "add",
            "remove",
            "set",
            "leaderboard",
            "reset",
            "give",
            "change_to_coin"
        ),
        subcommand_required
    )]
    pub async fn points(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Show your points or those of another member.
    #[poise::command(slash_command, guild_only)]
    pub async fn show(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied (Standard: du selbst)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let user = user.as_ref().unwrap_or_else(|| ctx.author());
        let balance = points::points(&ctx.data().database, guild_id(ctx)?, user.id.get()).await?;

        let card = Card::new("⭐ Punkte", format!("<@{}> hat **{balance}** Punkte.", user.id))
            .thumbnail(user.face());
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Give points to a member.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
    pub async fn add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] user: serenity::User,
        #[description = "Anzahl"] amount: i64,
    ) -> Result<()> {
        let total = points::add(&ctx.data().database, guild_id(ctx)?, participant(&user), amount).await?;
        let card = Card::success(
            "⭐ Punkte hinzugefügt",
            format!("<@{}> hat **{amount}** Punkte erhalten.", user.id),
        )
        .field("Neuer Stand", total.to_string(), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Take points from a member.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
    pub async fn remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] user: serenity::User,
        #[description = "Anzahl"] amount: i64,
    ) -> Result<()> {
        let total =
            points::remove(&ctx.data().database, guild_id(ctx)?, participant(&user), amount).await?;
        let card = Card::success(
            "⭐ Punkte entfernt",
            format!("<@{}> wurden **{amount}** Punkte abgezogen.", user.id),
        )
        .field("Neuer Stand", total.to_string(), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Set the points of a member.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
    pub async fn set(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] user: serenity::User,
        #[description = "Neuer Stand"] amount: i64,
    ) -> Result<()> {
        let total = points::set(&ctx.data().database, guild_id(ctx)?, participant(&user), amount).await?;
        let card = Card::success(
            "⭐ Punkte gesetzt",
            format!("<@{}> hat jetzt **{total}** Punkte.", user.id),
        );
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// The ten members with the most points.
    #[poise::command(slash_command, guild_only)]
    pub async fn leaderboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let card = leaderboard_card(ctx, Board::Points, "🏆 Punkte-Rangliste", "Punkte").await?;
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Reset the points of every member to zero.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
    pub async fn reset(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let users = points::reset(&ctx.data().database, guild_id(ctx)?).await?;
        let card = Card::success(
            "♻️ Punkte zurückgesetzt",
            format!("Die Punkte von **{users}** Mitgliedern wurden auf 0 gesetzt."),
        );
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Give some of your points to another member.
    #[poise::command(slash_command, guild_only)]
    pub async fn give(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Empfänger"] user: serenity::User,
        #[description = "Anzahl"] amount: i64,
    ) -> Result<()> {
        let gift = points::give(
            &ctx.data().database,
            guild_id(ctx)?,
            ctx.author().id.get(),
            participant(&user),
            amount,
        )
        .await?;

        let card = Card::success(
            "🎁 Punkte verschenkt",
            format!("Du hast <@{}> **{amount}** Punkte geschenkt.", user.id),
        )
        .field("Deine Punkte", gift.sender_points.to_string(), true)
        .field("Punkte Empfänger", gift.recipient_points.to_string(), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Convert points into coins (1 point = 2 coins).
    #[poise::command(slash_command, guild_only, rename = "change-to-coin")]
    pub async fn change_to_coin(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Anzahl Punkte"] amount: i64,
    ) -> Result<()> {
        let conversion = economy::points_to_coins(
            &ctx.data().database,
            guild_id(ctx)?,
            ctx.author().id.get(),
            amount,
        )
        .await?;

        let card = Card::success(
            "🔄 Umgetauscht",
            format!(
                "**{}** Punkte wurden in **{}** :coin: umgetauscht.",
                conversion.spent, conversion.received
            ),
        )
        .field("Punkte", conversion.points.to_string(), true)
        .field("Coins", conversion.coins.to_string(), true);
        respond(ctx, card, ResponseOptions::default()).await
    }
}

// Re-export all commands
pub use inner::*;

//! Moderation commands - kick, ban, mute, warnings and the ban list.
//!
//! Every action checks the role hierarchy first: the bot's highest role has to sit
//! strictly above the target's. Results are answered with a card carrying DE/EN
//! buttons and mirrored into the moderation log channel when one is configured.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, guild_id, participant,
            render::{Card, ResponseOptions, respond, server_language},
        },
        core::{
            economy::Participant,
            moderation::{self, Action, MUTED_ROLE},
            settings,
        },
        errors::{Error, Result, TargetIssue},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    const BANLIST_LIMIT: usize = 20;

    /// Moderation tools.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "kick",
            "ban",
            "mute",
            "unmute",
            "warn",
            "warnings",
            "clearwarnings",
            "banlist"
        ),
        subcommand_required
    )]
    pub async fn moderation(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Refuses targets whose highest role is not below the bot's.
    async fn ensure_can_moderate(
        ctx: poise::Context<'_, BotData, Error>,
        target: &serenity::Member,
    ) -> Result<()> {
        let bot_id = ctx.serenity_context().cache.current_user().id;
        let bot = target.guild_id.member(ctx.serenity_context(), bot_id).await?;

        let cache = &ctx.serenity_context().cache;
        let bot_top = bot.highest_role_info(cache).map(|(_, position)| position);
        let target_top = target.highest_role_info(cache).map(|(_, position)| position);
        moderation::ensure_outranks(bot_top, target_top)
    }

    const fn reject_bot(target: Participant) -> Result<()> {
        if target.is_bot {
            return Err(Error::InvalidTarget {
                issue: TargetIssue::Bot,
            });
        }
        Ok(())
    }

    fn action_card(
        title: &str,
        description: String,
        ctx: poise::Context<'_, BotData, Error>,
        target: &serenity::Member,
        reason: Option<&str>,
    ) -> Card {
        Card::success(title, description)
            .field("Mitglied", format!("<@{}>", target.user.id), true)
            .field("Moderator", format!("<@{}>", ctx.author().id), true)
            .field("Grund", moderation::reason_or_default(reason), false)
            .thumbnail(target.face())
    }

    /// Answers with `card` and mirrors it into the moderation log.
    async fn publish(ctx: poise::Context<'_, BotData, Error>, card: Card) -> Result<()> {
        let guild = guild_id(ctx)?;
        let log_channel = settings::mod_log_channel(&ctx.data().database, guild).await?;

        if let Some(channel) = log_channel.filter(|&id| id != ctx.channel_id().get()) {
            let language = server_language(ctx).await?;
            let embed = card
                .translated(&ctx.data().services.translator, language)
                .await
                .into_embed();
            let message = serenity::CreateMessage::new().embed(embed);
            if let Err(e) = serenity::ChannelId::new(channel)
                .send_message(ctx.serenity_context(), message)
                .await
            {
                tracing::warn!(guild, channel, "Could not post to moderation log: {e}");
            }
        }

        respond(ctx, card, ResponseOptions::with_language_buttons()).await
    }

    /// Kick a member.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "KICK_MEMBERS",
        required_bot_permissions = "KICK_MEMBERS"
    )]
    pub async fn kick(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] member: serenity::Member,
        #[description = "Grund"] reason: Option<String>,
    ) -> Result<()> {
        ensure_can_moderate(ctx, &member).await?;
        let reason = reason.as_deref();

        member
            .kick_with_reason(ctx.serenity_context(), moderation::reason_or_default(reason))
            .await?;
        let kicks = moderation::record(
            &ctx.data().database,
            guild_id(ctx)?,
            member.user.id.get(),
            Action::Kick,
        )
        .await?;

        let card = action_card(
            "👢 Mitglied gekickt",
            format!("**{}** wurde gekickt.", member.user.name),
            ctx,
            &member,
            reason,
        )
        .field("Kicks insgesamt", kicks.to_string(), true);
        publish(ctx, card).await
    }

    /// Ban a member.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "BAN_MEMBERS",
        required_bot_permissions = "BAN_MEMBERS"
    )]
    pub async fn ban(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] member: serenity::Member,
        #[description = "Grund"] reason: Option<String>,
    ) -> Result<()> {
        ensure_can_moderate(ctx, &member).await?;
        let reason = reason.as_deref();

        member
            .ban_with_reason(ctx.serenity_context(), 0, moderation::reason_or_default(reason))
            .await?;
        let bans = moderation::record(
            &ctx.data().database,
            guild_id(ctx)?,
            member.user.id.get(),
            Action::Ban,
        )
        .await?;

        let card = action_card(
            "🔨 Mitglied gebannt",
            format!("**{}** wurde gebannt.", member.user.name),
            ctx,
            &member,
            reason,
        )
        .field("Bans insgesamt", bans.to_string(), true);
        publish(ctx, card).await
    }

    /// The `Muted` role, if the server has one.
    async fn find_muted_role(
        ctx: poise::Context<'_, BotData, Error>,
        guild: serenity::GuildId,
    ) -> Result<Option<serenity::RoleId>> {
        let roles = guild.roles(ctx.serenity_context()).await?;
        Ok(roles
            .values()
            .find(|role| role.name == MUTED_ROLE)
            .map(|role| role.id))
    }

    /// Creates the `Muted` role and denies it speaking on every channel.
    async fn create_muted_role(
        ctx: poise::Context<'_, BotData, Error>,
        guild: serenity::GuildId,
    ) -> Result<serenity::RoleId> {
        let sctx = ctx.serenity_context();
        let role = guild
            .create_role(
                sctx,
                serenity::EditRole::new()
                    .name(MUTED_ROLE)
                    .permissions(serenity::Permissions::empty()),
            )
            .await?;

        let overwrite = serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::SEND_MESSAGES
                | serenity::Permissions::SEND_MESSAGES_IN_THREADS
                | serenity::Permissions::ADD_REACTIONS
                | serenity::Permissions::SPEAK,
            kind: serenity::PermissionOverwriteType::Role(role.id),
        };
        for channel in guild.channels(sctx).await?.into_values() {
            if let Err(e) = channel.create_permission(sctx, overwrite.clone()).await {
                tracing::warn!("Could not restrict muted role in #{}: {e}", channel.name);
            }
        }

        tracing::info!(guild = guild.get(), "Created muted role");
        Ok(role.id)
    }

    /// Mute a member.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_ROLES",
        required_bot_permissions = "MANAGE_ROLES"
    )]
    pub async fn mute(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] member: serenity::Member,
        #[description = "Grund"] reason: Option<String>,
    ) -> Result<()> {
        ensure_can_moderate(ctx, &member).await?;
        ctx.defer().await?;

        let role = match find_muted_role(ctx, member.guild_id).await? {
            Some(role) => role,
            None => create_muted_role(ctx, member.guild_id).await?,
        };
        if member.roles.contains(&role) {
            return Err(Error::Game {
                message: format!("**{}** ist bereits stummgeschaltet.", member.user.name),
            });
        }

        member.add_role(ctx.serenity_context(), role).await?;
        let mutes = moderation::record(
            &ctx.data().database,
            guild_id(ctx)?,
            member.user.id.get(),
            Action::Mute,
        )
        .await?;

        let card = action_card(
            "🔇 Mitglied stummgeschaltet",
            format!("**{}** wurde stummgeschaltet.", member.user.name),
            ctx,
            &member,
            reason.as_deref(),
        )
        .field("Mutes insgesamt", mutes.to_string(), true);
        publish(ctx, card).await
    }

    /// Unmute a member.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_ROLES",
        required_bot_permissions = "MANAGE_ROLES"
    )]
    pub async fn unmute(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] member: serenity::Member,
    ) -> Result<()> {
        ensure_can_moderate(ctx, &member).await?;

        let role = find_muted_role(ctx, member.guild_id)
            .await?
            .filter(|role| member.roles.contains(role))
            .ok_or_else(|| Error::Game {
                message: format!("**{}** ist nicht stummgeschaltet.", member.user.name),
            })?;

        member.remove_role(ctx.serenity_context(), role).await?;

        let card = action_card(
            "🔊 Stummschaltung aufgehoben",
            format!("**{}** kann wieder schreiben und sprechen.", member.user.name),
            ctx,
            &member,
            None,
        );
        publish(ctx, card).await
    }

    /// Warn a member. They receive a direct message.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
    pub async fn warn(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] member: serenity::Member,
        #[description = "Grund"] reason: Option<String>,
    ) -> Result<()> {
        reject_bot(participant(&member.user))?;
        let reason = reason.as_deref();

        let guild_name = ctx
            .guild()
            .map_or_else(|| "dem Server".to_string(), |guild| guild.name.clone());
        let dm = serenity::CreateMessage::new().content(moderation::warning_dm(&guild_name, reason));
        if let Err(e) = member.user.direct_message(ctx.serenity_context(), dm).await {
            tracing::debug!("Warning DM to {} failed: {e}", member.user.id);
        }

        let warnings = moderation::record(
            &ctx.data().database,
            guild_id(ctx)?,
            member.user.id.get(),
            Action::Warn,
        )
        .await?;

        let card = action_card(
            "⚠️ Verwarnung",
            format!("**{}** wurde verwarnt.", member.user.name),
            ctx,
            &member,
            reason,
        )
        .field("Verwarnungen", warnings.to_string(), true);
        publish(ctx, card).await
    }

    /// Show the moderation record of a member.
    #[poise::command(slash_command, guild_only)]
    pub async fn warnings(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied (Standard: du selbst)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let user = user.as_ref().unwrap_or_else(|| ctx.author());
        let guild = guild_id(ctx)?;
        let db = &ctx.data().database;

        let mut card = Card::new(
            "📋 Verwarnungen",
            format!("Moderationsübersicht für <@{}>", user.id),
        )
        .thumbnail(user.face());
        for (label, action) in [
            ("Verwarnungen", Action::Warn),
            ("Kicks", Action::Kick),
            ("Mutes", Action::Mute),
            ("Bans", Action::Ban),
        ] {
            let count = moderation::count(db, guild, user.id.get(), action).await?;
            card = card.field(label, count.to_string(), true);
        }
        respond(ctx, card, ResponseOptions::with_language_buttons()).await
    }

    /// Reset the warnings of a member.
    #[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
    pub async fn clearwarnings(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied"] user: serenity::User,
    ) -> Result<()> {
        reject_bot(participant(&user))?;
        moderation::clear_warnings(&ctx.data().database, guild_id(ctx)?, user.id.get()).await?;

        let card = Card::success(
            "🧹 Verwarnungen gelöscht",
            format!("Alle Verwarnungen von <@{}> wurden entfernt.", user.id),
        );
        respond(ctx, card, ResponseOptions::with_language_buttons()).await
    }

    /// List the banned users.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "BAN_MEMBERS",
        required_bot_permissions = "BAN_MEMBERS"
    )]
    pub async fn banlist(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild = serenity::GuildId::new(guild_id(ctx)?);
        let bans = guild.bans(ctx.serenity_context(), None, None).await?;

        if bans.is_empty() {
            let card = Card::new("🔨 Gebannte Nutzer", "Es sind keine Nutzer gebannt.");
            return respond(ctx, card, ResponseOptions::with_language_buttons()).await;
        }

        let mut lines = String::new();
        for ban in bans.iter().take(BANLIST_LIMIT) {
            writeln!(
                lines,
                "• **{}** - {}",
                ban.user.name,
                moderation::reason_or_default(ban.reason.as_deref())
            )?;
        }
        if bans.len() > BANLIST_LIMIT {
            writeln!(lines, "... und {} weitere", bans.len() - BANLIST_LIMIT)?;
        }

        let card = Card::new("🔨 Gebannte Nutzer", lines).footer(format!("{} Banns", bans.len()));
        respond(ctx, card, ResponseOptions::with_language_buttons()).await
    }
}

// Re-export all commands
pub use inner::*;

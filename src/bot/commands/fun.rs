//! Fun commands - coin flips, dice, rock-paper-scissors and public API toys.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, guild_id, participant,
            render::{
                Card, FAILURE, NEUTRAL, ResponseOptions, SUCCESS, failure_text, notify_press,
                respond, server_language, update_press,
            },
        },
        core::{
            economy::{self, check_target},
            rps::{self, Choice, GameState, Press, Resolution, RpsGame, Verdict},
            settings::Language,
        },
        errors::{Error, Result, TargetIssue},
        services::Translator,
    };
    use poise::{CreateReply, serenity_prelude as serenity};
    use rand::Rng;
    use sea_orm::DatabaseConnection;
    use std::{str::FromStr, time::Duration};

    const API_FALLBACK: &str = "Der Dienst ist gerade nicht erreichbar. Versuche es später erneut.";

    /// A hand for `/fun rps`
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum Hand {
        #[name = "Schere ✂️"]
        Schere,
        #[name = "Stein 🪨"]
        Stein,
        #[name = "Papier 📜"]
        Papier,
    }

    impl From<Hand> for Choice {
        fn from(hand: Hand) -> Self {
            match hand {
                Hand::Schere => Self::Schere,
                Hand::Stein => Self::Stein,
                Hand::Papier => Self::Papier,
            }
        }
    }

    /// Games and random fun.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "coinflip",
            "roll",
            "rps",
            "rps_online",
            "useless_fact",
            "excuser",
            "chucknorris",
            "dog",
            "advice",
            "pokemon",
            "age",
            "gender"
        ),
        subcommand_required
    )]
    pub async fn fun(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Flip a coin.
    #[poise::command(slash_command, guild_only)]
    pub async fn coinflip(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let side = if rand::rng().random_bool(0.5) { "Kopf" } else { "Zahl" };
        let card = Card::new("🪙 Münzwurf", format!("Die Münze zeigt: **{side}**"));
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Roll a die.
    #[poise::command(slash_command, guild_only)]
    pub async fn roll(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let value = rand::rng().random_range(1..=6);
        let card = Card::new("🎲 Würfel", format!("Du hast eine **{value}** gewürfelt!"));
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// Play rock-paper-scissors against the bot.
    #[poise::command(slash_command, guild_only)]
    pub async fn rps(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Deine Wahl"] hand: Hand,
    ) -> Result<()> {
        let player = Choice::from(hand);
        let bot = Choice::random(&mut rand::rng());

        let (title, colour) = match rps::judge(player, bot) {
            Verdict::FirstWins => ("🏆 Du gewinnst!", SUCCESS),
            Verdict::SecondWins => ("😢 Du verlierst!", FAILURE),
            Verdict::Tie => ("🤝 Unentschieden!", NEUTRAL),
        };
        let card = Card::new(title, "")
            .colour(colour)
            .field("Du", player.label(), true)
            .field("Bot", bot.label(), true);
        respond(ctx, card, ResponseOptions::default()).await
    }

    fn game_buttons(game_id: u64) -> Vec<serenity::CreateActionRow> {
        vec![serenity::CreateActionRow::Buttons(
            Choice::ALL
                .into_iter()
                .map(|choice| {
                    serenity::CreateButton::new(format!("rps:{game_id}:{}", choice.name()))
                        .label(choice.label())
                        .style(serenity::ButtonStyle::Primary)
                })
                .collect(),
        )]
    }

    fn game_card(game: &RpsGame) -> Card {
        let opponent = game
            .player_two()
            .map_or_else(|| "Wartet auf Gegner...".to_string(), |id| format!("<@{id}>"));
        let status = match game.state() {
            GameState::AwaitingOpponent => {
                "Drücke einen Knopf, um gegen den Herausforderer anzutreten!"
            }
            _ => "Beide Spieler wählen jetzt ihre Hand.",
        };
        Card::new("✂️ Schere, Stein, Papier", status)
            .field("Spieler 1", format!("<@{}>", game.player_one()), true)
            .field("Spieler 2", opponent, true)
            .field("Einsatz", format!("{} :coin:", game.wager()), true)
    }

    async fn result_card(
        db: &DatabaseConnection,
        guild: u64,
        game: &RpsGame,
        resolution: Resolution,
    ) -> Result<Card> {
        match resolution {
            Resolution::Tie(choice) => Ok(Card::new(
                "🤝 Unentschieden!",
                format!("Beide haben **{}** gewählt. Es werden keine Coins bewegt.", choice.label()),
            )
            .colour(NEUTRAL)),
            Resolution::Win {
                winner,
                loser,
                winning,
                losing,
            } => {
                let moved = economy::settle_wager(db, guild, winner, loser, game.wager()).await?;
                let mut card = Card::success(
                    "🏆 Spiel beendet",
                    format!(
                        "<@{winner}> gewinnt! **{}** schlägt **{}**.",
                        winning.label(),
                        losing.label()
                    ),
                );
                if moved > 0 {
                    card = card.field("Gewinn", format!("{moved} :coin:"), true);
                }
                Ok(card)
            }
        }
    }

    async fn ensure_can_cover(
        db: &DatabaseConnection,
        guild: u64,
        user: u64,
        wager: i64,
    ) -> Result<()> {
        let balance = economy::balance(db, guild, user).await?;
        if balance < wager {
            return Err(Error::Game {
                message: format!(
                    "<@{user}> hat nicht genug Coins für diesen Einsatz ({balance}/{wager} :coin:)."
                ),
            });
        }
        Ok(())
    }

    async fn render_embed(
        card: &Card,
        translator: &Translator,
        language: Language,
    ) -> serenity::CreateEmbed {
        card.translated(translator, language).await.into_embed()
    }

    /// Play rock-paper-scissors against another member for coins.
    #[poise::command(slash_command, guild_only, rename = "rps-online")]
    pub async fn rps_online(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Gegner (leer: der Erste, der drückt)"] opponent: Option<serenity::User>,
        #[description = "Einsatz in Coins"]
        #[min = 0]
        wager: Option<i64>,
    ) -> Result<()> {
        let guild = guild_id(ctx)?;
        let db = &ctx.data().database;
        let translator = &ctx.data().services.translator;
        let author = ctx.author().id.get();
        let wager = wager.unwrap_or(0);

        if let Some(opponent) = &opponent {
            check_target(author, participant(opponent))?;
        }
        let mut game = RpsGame::new(ctx.id(), author, opponent.map(|user| user.id.get()), wager)?;
        ensure_can_cover(db, guild, author, wager).await?;
        if let Some(opponent) = game.player_two() {
            ensure_can_cover(db, guild, opponent, wager).await?;
        }

        let language = server_language(ctx).await?;
        let embed = render_embed(&game_card(&game), translator, language).await;
        let handle = ctx
            .send(
                CreateReply::default()
                    .embed(embed)
                    .components(game_buttons(game.id())),
            )
            .await?;

        let sctx = ctx.serenity_context();
        let idle = Duration::from_secs(ctx.data().config.games.rps_timeout_secs);
        let prefix = format!("rps:{}:", game.id());

        // Set once the message shows a final card without buttons.
        let mut closed = false;
        let mut final_card = None;

        while let Some(press) = serenity::ComponentInteractionCollector::new(sctx)
            .filter({
                let prefix = prefix.clone();
                move |press| press.data.custom_id.starts_with(&prefix)
            })
            .timeout(idle)
            .await
        {
            let presser = press.user.id.get();
            let outcome: Result<()> = async {
                let choice = Choice::from_str(press.data.custom_id.trim_start_matches(&prefix))?;

                if game.would_join(presser) {
                    if press.user.bot {
                        return Err(Error::InvalidTarget {
                            issue: TargetIssue::Bot,
                        });
                    }
                    ensure_can_cover(db, guild, presser, wager).await?;
                }

                match game.press(presser, choice)? {
                    Press::Joined(_) => {
                        let embed = render_embed(&game_card(&game), translator, language).await;
                        update_press(sctx, &press, embed, game_buttons(game.id())).await
                    }
                    Press::Recorded => {
                        let text = format!("Deine Wahl ({}) wurde gespeichert.", choice.label());
                        notify_press(sctx, &press, translator, language, &text).await
                    }
                    Press::Resolved(resolution) => {
                        let card = result_card(db, guild, &game, resolution)
                            .await
                            .unwrap_or_else(|e| {
                                tracing::error!(game = game.id(), "rps settlement failed: {e}");
                                Card::failure(failure_text(&e))
                            });
                        let embed = render_embed(&card, translator, language).await;
                        final_card = Some(card);
                        update_press(sctx, &press, embed, Vec::new()).await?;
                        closed = true;
                        Ok(())
                    }
                }
            }
            .await;

            if let Err(e) = outcome {
                tracing::debug!(game = game.id(), presser, "rps press rejected: {e}");
                if let Err(e) =
                    notify_press(sctx, &press, translator, language, &failure_text(&e)).await
                {
                    tracing::warn!(game = game.id(), "Could not answer rps press: {e}");
                }
            }
            if game.is_finished() {
                break;
            }
        }

        if !game.is_finished() {
            game.cancel();
            tracing::debug!(game = game.id(), "rps game timed out");
            final_card = Some(
                Card::new(
                    "⌛ Zeit abgelaufen",
                    "Das Spiel wurde abgebrochen. Es wurden keine Coins bewegt.",
                )
                .colour(NEUTRAL),
            );
        }
        if !closed {
            let mut reply = CreateReply::default().components(Vec::new());
            if let Some(card) = &final_card {
                reply = reply.embed(render_embed(card, translator, language).await);
            }
            handle.edit(ctx, reply).await?;
        }
        Ok(())
    }

    async fn api_card(
        ctx: poise::Context<'_, BotData, Error>,
        title: &str,
        text: Result<String>,
    ) -> Result<()> {
        let text = text.unwrap_or_else(|e| {
            tracing::warn!("{title} failed: {e}");
            API_FALLBACK.to_string()
        });
        respond(ctx, Card::new(title, text), ResponseOptions::default()).await
    }

    /// A random useless fact.
    #[poise::command(slash_command, guild_only, rename = "useless-fact")]
    pub async fn useless_fact(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let fact = ctx.data().services.fun.useless_fact().await;
        api_card(ctx, "🤓 Nutzloser Fakt", fact).await
    }

    /// A random excuse.
    #[poise::command(slash_command, guild_only)]
    pub async fn excuser(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let excuse = ctx.data().services.fun.excuse().await;
        api_card(ctx, "🙈 Ausrede", excuse).await
    }

    /// A random Chuck Norris joke.
    #[poise::command(slash_command, guild_only)]
    pub async fn chucknorris(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let joke = ctx.data().services.fun.chuck_norris().await;
        api_card(ctx, "🥋 Chuck Norris", joke).await
    }

    /// A random dog picture.
    #[poise::command(slash_command, guild_only)]
    pub async fn dog(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let card = match ctx.data().services.fun.dog_image().await {
            Ok(url) => Card::new("🐶 Wuff!", "").image(url),
            Err(e) => {
                tracing::warn!("dog image failed: {e}");
                Card::new("🐶 Wuff!", API_FALLBACK)
            }
        };
        respond(ctx, card, ResponseOptions::default()).await
    }

    /// A random piece of advice.
    #[poise::command(slash_command, guild_only)]
    pub async fn advice(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let advice = ctx.data().services.fun.advice().await;
        api_card(ctx, "💡 Ratschlag", advice).await
    }

    /// Look up a Pokémon.
    #[poise::command(slash_command, guild_only)]
    pub async fn pokemon(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Name oder Nummer"] name: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let card = match ctx.data().services.fun.pokemon(&name).await {
            Ok(pokemon) => {
                let mut card = Card::new(format!("#{} {}", pokemon.id, pokemon.name), "")
                    .field("Typen", pokemon.types.join(", "), true)
                    .field("Fähigkeiten", pokemon.abilities.join(", "), true);
                if let Some(sprite) = pokemon.sprite {
                    card = card.thumbnail(sprite);
                }
                card
            }
            Err(e @ Error::NotFound { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!("pokemon lookup failed: {e}");
                Card::new("Pokémon", API_FALLBACK)
            }
        };
        respond(ctx, card, ResponseOptions::default()).await
    }

    fn age_text(shown: &str, guess: Result<Option<u32>>) -> String {
        match guess {
            Ok(Some(age)) => format!("Das geschätzte Alter von **{shown}** ist **{age}** Jahre."),
            Ok(None) => format!("Für **{shown}** gibt es keine Schätzung."),
            Err(e) => {
                tracing::warn!("age guess failed: {e}");
                API_FALLBACK.to_string()
            }
        }
    }

    /// Guess a member's age from their name.
    #[poise::command(slash_command, guild_only)]
    pub async fn age(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Mitglied (Standard: du selbst)"] user: Option<serenity::User>,
    ) -> Result<()> {
        ctx.defer().await?;
        let user = user.as_ref().unwrap_or_else(|| ctx.author());
        let guess = ctx.data().services.fun.age(&user.name).await;
        let text = age_text(user.display_name(), guess);
        respond(ctx, Card::new("🎂 Altersschätzung", text), ResponseOptions::default()).await
    }

    /// Guess the gender behind a first name.
    #[poise::command(slash_command, guild_only)]
    pub async fn gender(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Vorname"] name: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let text = match ctx.data().services.fun.gender(&name).await {
            Ok(guess) => match guess.gender.as_deref() {
                Some("male") => format!(
                    "**{name}** ist zu **{:.0}%** männlich.",
                    guess.probability
                ),
                Some("female") => format!(
                    "**{name}** ist zu **{:.0}%** weiblich.",
                    guess.probability
                ),
                _ => format!("Für **{name}** gibt es keine Schätzung."),
            },
            Err(e) => {
                tracing::warn!("gender guess failed: {e}");
                API_FALLBACK.to_string()
            }
        };
        respond(ctx, Card::new("⚧ Geschlechtsschätzung", text), ResponseOptions::default()).await
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_age_text_names_the_member() {
            assert_eq!(
                age_text("Lena", Ok(Some(31))),
                "Das geschätzte Alter von **Lena** ist **31** Jahre."
            );
            assert_eq!(age_text("Lena", Ok(None)), "Für **Lena** gibt es keine Schätzung.");
            let failed = age_text(
                "Lena",
                Err(Error::ExternalService {
                    service: "agify",
                    message: "503".to_string(),
                }),
            );
            assert_eq!(failed, API_FALLBACK);
        }
    }
}

// Re-export all commands
pub use inner::*;

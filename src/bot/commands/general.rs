//! General Discord commands - help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            render::{Card, ResponseOptions, respond},
        },
        errors::{Error, Result},
    };

    /// Displays an overview of all command groups.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let card = Card::new(
            "☄️ Comet Hilfe",
            "Hier ist eine Übersicht aller Befehlsgruppen von Comet.",
        )
        .field(
            "🤖 /ai",
            "`ask` stellt der KI eine Frage (antworte auf die Antwort, um weiterzureden), `draw` erstellt ein Bild.",
            false,
        )
        .field(
            "💰 /eco",
            "`daily`, `balance`, `pay`, `steal`, `leaderboard`, `change-to-points`",
            false,
        )
        .field(
            "⭐ /points",
            "`show`, `give`, `leaderboard`, `change-to-coin` sowie für Admins `add`, `remove`, `set`, `reset`",
            false,
        )
        .field(
            "🛡️ /moderation",
            "`kick`, `ban`, `mute`, `unmute`, `warn`, `warnings`, `clearwarnings`, `banlist`",
            false,
        )
        .field(
            "🎮 /fun",
            "`coinflip`, `roll`, `rps`, `rps-online`, `useless-fact`, `excuser`, `chucknorris`, `dog`, `advice`, `pokemon`, `age`, `gender`",
            false,
        )
        .field(
            "🧰 /utility",
            "`create` (Umfrage), `teampmail`, `ping`, `countdown`",
            false,
        )
        .field("🎬 /yt", "`premiere` kündigt eine YouTube-Premiere an.", false)
        .field("⚙️ /settings", "`language`, `modlog` (Server verwalten)", false);

        respond(ctx, card, ResponseOptions::with_language_buttons()).await
    }
}

// Re-export all commands
pub use inner::*;

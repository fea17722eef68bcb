//! Shared response rendering.
//!
//! Every command builds a [`Card`] in German and hands it to [`respond`] together with
//! [`ResponseOptions`]. The card is translated into the server language, sent as a new
//! message or as an edit of an earlier reply, and optionally carries DE/EN buttons that
//! re-render it in the other language until they expire.

use crate::{
    bot::Context,
    core::settings::Language,
    errors::{Error, Result, TargetIssue},
    services::Translator,
};
use poise::{CreateReply, ReplyHandle, serenity_prelude as serenity};
use serenity::{
    ButtonStyle, Colour, ComponentInteractionCollector, CreateActionRow, CreateAttachment,
    CreateButton, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditMessage,
};
use std::time::Duration;

/// Green used for successful actions
pub const SUCCESS: Colour = Colour::DARK_GREEN;
/// Red used for failures
pub const FAILURE: Colour = Colour::RED;
/// Blue used for neutral information
pub const INFO: Colour = Colour::BLUE;
/// Grey used for ties
pub const NEUTRAL: Colour = Colour::from_rgb(153, 170, 181);

const LANG_PREFIX: &str = "lang:";

/// A message card, independent of how it is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Title line
    pub title: String,
    /// Body text
    pub description: String,
    /// Side colour
    pub colour: Colour,
    /// `(name, value, inline)` fields
    pub fields: Vec<(String, String, bool)>,
    /// Large image URL
    pub image: Option<String>,
    /// Small image URL
    pub thumbnail: Option<String>,
    /// Footer text
    pub footer: Option<String>,
}

impl Card {
    /// A neutral card.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            colour: INFO,
            fields: Vec::new(),
            image: None,
            thumbnail: None,
            footer: None,
        }
    }

    /// A green card.
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description).colour(SUCCESS)
    }

    /// A red "❌ Fehler" card.
    pub fn failure(description: impl Into<String>) -> Self {
        Self::new("❌ Fehler", description).colour(FAILURE)
    }

    /// Sets the colour.
    #[must_use]
    pub const fn colour(mut self, colour: Colour) -> Self {
        self.colour = colour;
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push((name.into(), value.into(), inline));
        self
    }

    /// Sets the large image.
    #[must_use]
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Sets the thumbnail.
    #[must_use]
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// Sets the footer.
    #[must_use]
    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// A copy with every text translated into `language`.
    pub async fn translated(&self, translator: &Translator, language: Language) -> Self {
        if language == Language::De {
            return self.clone();
        }

        let (title, description) = tokio::join!(
            translator.translate(&self.title, language),
            translator.translate(&self.description, language),
        );
        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, value, inline) in &self.fields {
            let (name, value) = tokio::join!(
                translator.translate(name, language),
                translator.translate(value, language),
            );
            fields.push((name, value, *inline));
        }
        let footer = match &self.footer {
            Some(text) => Some(translator.translate(text, language).await),
            None => None,
        };

        Self {
            title,
            description,
            fields,
            footer,
            ..self.clone()
        }
    }

    /// Converts the card into a Discord embed.
    #[must_use]
    pub fn into_embed(self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(self.title)
            .colour(self.colour)
            .fields(self.fields);
        if !self.description.is_empty() {
            embed = embed.description(self.description);
        }
        if let Some(url) = self.image {
            embed = embed.image(url);
        }
        if let Some(url) = self.thumbnail {
            embed = embed.thumbnail(url);
        }
        if let Some(text) = self.footer {
            embed = embed.footer(CreateEmbedFooter::new(text));
        }
        embed
    }
}

/// Where a response goes
#[derive(Clone, Copy)]
pub enum Mode<'a> {
    /// A new reply (poise sends a follow-up when the interaction was already answered)
    New,
    /// Replace an earlier reply
    Edit(&'a ReplyHandle<'a>),
}

/// How a card is delivered
pub struct ResponseOptions<'a> {
    /// Target language; `None` reads the server setting
    pub language: Option<Language>,
    /// New message or edit
    pub mode: Mode<'a>,
    /// File to attach, referenced from the card as `attachment://{filename}`
    pub attachment: Option<CreateAttachment>,
    /// Only visible to the invoking user
    pub ephemeral: bool,
    /// Show DE/EN switch buttons
    pub language_buttons: bool,
}

impl Default for ResponseOptions<'_> {
    fn default() -> Self {
        Self {
            language: None,
            mode: Mode::New,
            attachment: None,
            ephemeral: false,
            language_buttons: false,
        }
    }
}

impl<'a> ResponseOptions<'a> {
    /// Options for editing `handle`.
    #[must_use]
    pub fn edit(handle: &'a ReplyHandle<'a>) -> Self {
        Self {
            mode: Mode::Edit(handle),
            ..Self::default()
        }
    }

    /// Options for a reply with language buttons.
    #[must_use]
    pub fn with_language_buttons() -> Self {
        Self {
            language_buttons: true,
            ..Self::default()
        }
    }

    /// Options for an ephemeral reply.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            ephemeral: true,
            ..Self::default()
        }
    }
}

/// The DE/EN button row; the button of the shown language is disabled.
#[must_use]
pub fn language_row(shown: Language) -> CreateActionRow {
    CreateActionRow::Buttons(
        [Language::De, Language::En]
            .into_iter()
            .map(|language| {
                CreateButton::new(format!("{LANG_PREFIX}{}", language.code()))
                    .label(language.code().to_uppercase())
                    .style(ButtonStyle::Secondary)
                    .disabled(language == shown)
            })
            .collect(),
    )
}

/// Language of the invoking server, German outside of servers.
pub async fn server_language(ctx: Context<'_>) -> Result<Language> {
    match ctx.guild_id() {
        Some(guild) => crate::core::settings::language(&ctx.data().database, guild.get()).await,
        None => Ok(Language::De),
    }
}

/// Sends `card` as described by `options`.
pub async fn respond(ctx: Context<'_>, card: Card, options: ResponseOptions<'_>) -> Result<()> {
    let language = match options.language {
        Some(language) => language,
        None => server_language(ctx).await?,
    };
    let translator = &ctx.data().services.translator;
    let rendered = card.translated(translator, language).await;
    // Ephemeral messages cannot be edited from a background task.
    let buttons = options.language_buttons && !options.ephemeral;

    let mut reply = CreateReply::default()
        .embed(rendered.into_embed())
        .ephemeral(options.ephemeral);
    if buttons {
        reply = reply.components(vec![language_row(language)]);
    }
    if let Some(attachment) = options.attachment {
        reply = reply.attachment(attachment);
    }

    let message = match options.mode {
        Mode::New => ctx.send(reply).await?.into_message().await?,
        Mode::Edit(handle) => {
            handle.edit(ctx, reply).await?;
            handle.message().await?.into_owned()
        }
    };

    if buttons {
        spawn_language_switch(
            ctx.serenity_context().clone(),
            translator.clone(),
            message.channel_id,
            message.id,
            card,
            Duration::from_secs(ctx.data().config.translation.buttons_timeout_secs),
        );
    }
    Ok(())
}

fn spawn_language_switch(
    ctx: serenity::Context,
    translator: Translator,
    channel: serenity::ChannelId,
    message: serenity::MessageId,
    card: Card,
    lifetime: Duration,
) {
    tokio::spawn(async move {
        while let Some(press) = ComponentInteractionCollector::new(&ctx)
            .message_id(message)
            .filter(|press| press.data.custom_id.starts_with(LANG_PREFIX))
            .timeout(lifetime)
            .await
        {
            let code = press.data.custom_id.trim_start_matches(LANG_PREFIX);
            let language = Language::parse(code).unwrap_or_default();
            let embed = card.translated(&translator, language).await.into_embed();

            let components = vec![language_row(language)];
            if let Err(e) = update_press(&ctx, &press, embed, components).await {
                tracing::warn!("Failed to switch card language: {e}");
            }
        }

        let cleared = EditMessage::new().components(Vec::new());
        if let Err(e) = channel.edit_message(&ctx, message, cleared).await {
            tracing::debug!("Could not remove language buttons: {e}");
        }
    });
}

/// Answers a button press with an ephemeral note in `language`.
pub async fn notify_press(
    ctx: &serenity::Context,
    press: &serenity::ComponentInteraction,
    translator: &Translator,
    language: Language,
    text: &str,
) -> Result<()> {
    let text = translator.translate(text, language).await;
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(text)
            .ephemeral(true),
    );
    press.create_response(ctx, response).await?;
    Ok(())
}

/// Answers a button press by replacing the message's card and components.
pub async fn update_press(
    ctx: &serenity::Context,
    press: &serenity::ComponentInteraction,
    embed: CreateEmbed,
    components: Vec<CreateActionRow>,
) -> Result<()> {
    let response = CreateInteractionResponse::UpdateMessage(
        CreateInteractionResponseMessage::new()
            .embed(embed)
            .components(components),
    );
    press.create_response(ctx, response).await?;
    Ok(())
}

/// German text shown for a user-facing error.
#[must_use]
pub fn failure_text(error: &Error) -> String {
    match error {
        Error::InvalidAmount { amount } => {
            format!("Ungültiger Betrag: **{amount}**. Der Betrag muss positiv sein.")
        }
        Error::InsufficientFunds { current, required } => format!(
            "Du hast nicht genug Guthaben. Vorhanden: **{current}**, benötigt: **{required}**."
        ),
        Error::InvalidTarget { issue } => match issue {
            TargetIssue::Bot => "Bots können nicht das Ziel dieser Aktion sein.".to_string(),
            TargetIssue::SelfTarget => "Du kannst dich nicht selbst auswählen.".to_string(),
            TargetIssue::NotParticipant => "Du bist nicht Teil dieses Spiels!".to_string(),
            TargetIssue::RoleHierarchy => {
                "Ich kann diesen Nutzer nicht bearbeiten (höhere Rolle).".to_string()
            }
        },
        Error::AlreadyClaimed { remaining_secs } => {
            let hours = remaining_secs / 3600;
            let minutes = (remaining_secs % 3600) / 60;
            format!(
                ":coin: Du hast deinen täglichen Bonus bereits erhalten. \
                 Komm in **{hours}h {minutes}m** wieder!"
            )
        }
        Error::InvalidTime { input } => format!(
            "Ungültige Zeitangabe `{input}`. Erlaubt sind `HH:MM`, `YYYY-MM-DD HH:MM` oder `1d2h30m`."
        ),
        Error::NotFound { what } => format!("{what} wurde nicht gefunden."),
        Error::Game { message } => message.clone(),
        _ => "Es ist ein Fehler aufgetreten. Bitte versuche es später erneut.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_builder() {
        let card = Card::success("✅ Titel", "Text")
            .field("A", "1", false)
            .footer("Fuß");
        assert_eq!(card.colour, SUCCESS);
        assert_eq!(card.fields, vec![("A".to_string(), "1".to_string(), false)]);
        assert_eq!(card.footer.as_deref(), Some("Fuß"));
        assert_eq!(Card::failure("x").title, "❌ Fehler");
    }

    #[test]
    fn test_failure_texts() {
        assert!(failure_text(&Error::AlreadyClaimed { remaining_secs: 3_700 }).contains("1h 1m"));
        assert!(
            failure_text(&Error::InvalidTarget {
                issue: TargetIssue::RoleHierarchy
            })
            .contains("höhere Rolle")
        );
        assert!(failure_text(&Error::InvalidTime { input: "bald".into() }).contains("`bald`"));
        assert!(
            failure_text(&Error::Config {
                message: "secret".into()
            })
            .starts_with("Es ist ein Fehler")
        );
    }

    #[tokio::test]
    async fn test_german_card_is_not_translated() {
        let translator = Translator::new(
            reqwest::Client::new(),
            &crate::config::settings::TranslationConfig::default(),
        );
        let card = Card::new("Titel", "Text").field("Name", "Wert", true);
        assert_eq!(card.translated(&translator, Language::De).await, card);
    }
}

//! Discord command implementations organized by group.

#![allow(clippy::too_long_first_doc_paragraph)]

/// `/ai` - chat and image generation
pub mod ai;

/// `/eco` - coin economy
pub mod eco;

/// `/fun` - games and public API toys
pub mod fun;

/// `/help`
pub mod general;

/// `/moderation` - member discipline
pub mod moderation;

/// `/points` - point balances
pub mod points;

/// `/settings` - per-server settings
pub mod settings;

/// `/utility` - polls, temporary mail, ping, countdowns
pub mod utility;

/// `/yt` - YouTube announcements
pub mod youtube;

use crate::{bot::BotData, errors::Error};

// Export the top-level command of each group
pub use ai::ai;
pub use eco::eco;
pub use fun::fun;
pub use general::help;
pub use moderation::moderation;
pub use points::points;
pub use settings::settings;
pub use utility::utility;
pub use youtube::yt;

/// Every command group registered with Discord.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ai(),
        eco(),
        points(),
        moderation(),
        fun(),
        utility(),
        yt(),
        settings(),
        help(),
    ]
}

//! Layout of the state tree: path builders and the defaults written for new servers
//! and users.

use serde_json::{Value, json};

/// Per-user feature sub-trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Warning/kick/mute/ban counters
    Moderation,
    /// Coins, daily bonus bookkeeping, inventory
    Eco,
    /// Point balance
    Points,
}

impl Feature {
    /// Path segment of the feature
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Moderation => "moderation",
            Self::Eco => "eco",
            Self::Points => "points",
        }
    }
}

/// `servers/{guild}`
#[must_use]
pub fn server(guild: u64) -> String {
    format!("servers/{guild}")
}

/// `servers/{guild}/settings`
#[must_use]
pub fn settings(guild: u64) -> String {
    format!("servers/{guild}/settings")
}

/// `servers/{guild}/users`
#[must_use]
pub fn users(guild: u64) -> String {
    format!("servers/{guild}/users")
}

/// `servers/{guild}/users/{user}`
#[must_use]
pub fn user(guild: u64, user: u64) -> String {
    format!("servers/{guild}/users/{user}")
}

/// `servers/{guild}/users/{user}/{feature}`
#[must_use]
pub fn feature(guild: u64, user: u64, feature: Feature) -> String {
    format!("servers/{guild}/users/{user}/{}", feature.as_str())
}

/// `servers/{guild}/users/{user}/{feature}/{field}`
#[must_use]
pub fn field(guild: u64, user: u64, feature: Feature, field: &str) -> String {
    format!("servers/{guild}/users/{user}/{}/{field}", feature.as_str())
}

/// `servers/{guild}/ai/threads/{message}` - marks a message as the root of an AI thread
#[must_use]
pub fn ai_thread(guild: u64, message: u64) -> String {
    format!("servers/{guild}/ai/threads/{message}")
}

/// Defaults written below `servers/{guild}` when a server becomes available
#[must_use]
pub fn server_defaults() -> Value {
    json!({
        "settings": {
            "language": "de",
        },
    })
}

/// Defaults written below `servers/{guild}/users/{user}` for every known member
#[must_use]
pub fn user_defaults() -> Value {
    json!({
        "moderation": {
            "warnings": 0,
            "mutes": 0,
            "kicks": 0,
            "bans": 0,
        },
        "eco": {
            "balance": 0,
            "inventory": {"_init": true},
            "last_daily": 0,
            "daily_streak": 0,
        },
        "points": {
            "points": 0,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(server(1), "servers/1");
        assert_eq!(users(1), "servers/1/users");
        assert_eq!(feature(1, 2, Feature::Eco), "servers/1/users/2/eco");
        assert_eq!(
            field(1, 2, Feature::Points, "points"),
            "servers/1/users/2/points/points"
        );
        assert_eq!(ai_thread(1, 3), "servers/1/ai/threads/3");
    }

    #[test]
    fn test_user_defaults_shape() {
        let defaults = user_defaults();
        assert_eq!(defaults["eco"]["balance"], 0);
        assert_eq!(defaults["moderation"]["warnings"], 0);
        assert_eq!(defaults["points"]["points"], 0);
    }
}

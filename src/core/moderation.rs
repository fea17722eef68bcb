//! Moderation bookkeeping: per-user action counters and the role hierarchy rule.

use crate::{
    core::{
        layout::{self, Feature},
        store,
    },
    errors::{Error, Result, TargetIssue},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

/// Name of the role used to silence members
pub const MUTED_ROLE: &str = "Muted";
/// Reason shown when the moderator gave none
pub const NO_REASON: &str = "Keiner";

/// Moderation counters tracked per user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `/moderation warn`
    Warn,
    /// `/moderation kick`
    Kick,
    /// `/moderation mute`
    Mute,
    /// `/moderation ban`
    Ban,
}

impl Action {
    /// Counter field below `moderation/`
    #[must_use]
    pub const fn counter(self) -> &'static str {
        match self {
            Self::Warn => "warnings",
            Self::Kick => "kicks",
            Self::Mute => "mutes",
            Self::Ban => "bans",
        }
    }
}

/// Whether a member whose highest role sits at `bot_top` may act on one at
/// `target_top`. Members without roles count as position 0; equal positions fail.
#[must_use]
pub fn outranks(bot_top: Option<u16>, target_top: Option<u16>) -> bool {
    bot_top.unwrap_or(0) > target_top.unwrap_or(0)
}

/// [`outranks`] as a `Result` for use with `?`.
pub fn ensure_outranks(bot_top: Option<u16>, target_top: Option<u16>) -> Result<()> {
    if outranks(bot_top, target_top) {
        Ok(())
    } else {
        Err(Error::InvalidTarget {
            issue: TargetIssue::RoleHierarchy,
        })
    }
}

/// The reason to display for an optional moderator-supplied reason.
#[must_use]
pub fn reason_or_default(reason: Option<&str>) -> &str {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(NO_REASON)
}

/// Current value of a counter.
pub async fn count<C>(db: &C, guild: u64, user: u64, action: Action) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(store::get_i64(
        db,
        &layout::field(guild, user, Feature::Moderation, action.counter()),
    )
    .await?
    .unwrap_or(0))
}

/// Increments a counter and returns the new value.
pub async fn record(db: &DatabaseConnection, guild: u64, user: u64, action: Action) -> Result<i64> {
    let txn = db.begin().await?;
    let next = count(&txn, guild, user, action).await? + 1;
    store::set(
        &txn,
        &layout::feature(guild, user, Feature::Moderation),
        action.counter(),
        next,
    )
    .await?;
    txn.commit().await?;

    tracing::info!(guild, user, action = action.counter(), count = next, "moderation action recorded");
    Ok(next)
}

/// Resets the warning counter to zero.
pub async fn clear_warnings(db: &DatabaseConnection, guild: u64, user: u64) -> Result<()> {
    store::set(
        db,
        &layout::feature(guild, user, Feature::Moderation),
        Action::Warn.counter(),
        0,
    )
    .await
}

/// Text of the direct message sent to a warned member, German first.
#[must_use]
pub fn warning_dm(guild_name: &str, reason: Option<&str>) -> String {
    let de = reason_or_default(reason);
    let en = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("None");
    format!(
        "⚠️ Du wurdest in {guild_name} verwarnt. Grund: {de}\n\n--\n\n\
         You were warned in {guild_name}. Reason: {en}\n\n--\n\n\
         *Dies ist eine automatische Nachricht. / This is an automated message.*"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_outranks_requires_strictly_higher_role() {
        assert!(outranks(Some(5), Some(3)));
        assert!(!outranks(Some(3), Some(3)));
        assert!(!outranks(Some(2), Some(3)));
        assert!(outranks(Some(1), None));
        assert!(!outranks(None, None));
        assert!(matches!(
            ensure_outranks(Some(1), Some(1)),
            Err(Error::InvalidTarget {
                issue: TargetIssue::RoleHierarchy
            })
        ));
    }

    #[test]
    fn test_reason_defaults() {
        assert_eq!(reason_or_default(None), "Keiner");
        assert_eq!(reason_or_default(Some("  ")), "Keiner");
        assert_eq!(reason_or_default(Some("Spam")), "Spam");
        assert!(warning_dm("Comet", None).contains("Reason: None"));
    }

    #[tokio::test]
    async fn test_counters_increment_and_clear() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(record(&db, 1, 2, Action::Warn).await?, 1);
        assert_eq!(record(&db, 1, 2, Action::Warn).await?, 2);
        assert_eq!(record(&db, 1, 2, Action::Kick).await?, 1);
        assert_eq!(count(&db, 1, 2, Action::Warn).await?, 2);

        clear_warnings(&db, 1, 2).await?;
        assert_eq!(count(&db, 1, 2, Action::Warn).await?, 0);
        assert_eq!(count(&db, 1, 2, Action::Kick).await?, 1);
        Ok(())
    }
}

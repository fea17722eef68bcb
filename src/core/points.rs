//! Point balances. Points are granted by moderators and can be given away or
//! exchanged for coins (see [`crate::core::economy`]).

use crate::{
    core::{
        economy::{Participant, check_target},
        layout::{self, Feature},
        store,
    },
    errors::{Error, Result, TargetIssue},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

/// Points a sender must hold before they may give any away
pub const GIVE_MIN_BALANCE: i64 = 50;

/// Current point balance, zero for unknown users.
pub async fn points<C>(db: &C, guild: u64, user: u64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(
        store::get_i64(db, &layout::field(guild, user, Feature::Points, "points"))
            .await?
            .unwrap_or(0)
            .max(0),
    )
}

pub(crate) async fn write_points<C>(db: &C, guild: u64, user: u64, value: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    store::set(
        db,
        &layout::feature(guild, user, Feature::Points),
        "points",
        value.max(0),
    )
    .await
}

const fn reject_bot(target: Participant) -> Result<()> {
    if target.is_bot {
        return Err(Error::InvalidTarget {
            issue: TargetIssue::Bot,
        });
    }
    Ok(())
}

/// Adds `amount` points to `target`. Returns the new balance.
pub async fn add(db: &DatabaseConnection, guild: u64, target: Participant, amount: i64) -> Result<i64> {
    reject_bot(target)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    let new_points = points(&txn, guild, target.id).await? + amount;
    write_points(&txn, guild, target.id, new_points).await?;
    txn.commit().await?;

    Ok(new_points)
}

/// Removes up to `amount` points from `target`, never going below zero.
/// Returns the new balance.
pub async fn remove(
    db: &DatabaseConnection,
    guild: u64,
    target: Participant,
    amount: i64,
) -> Result<i64> {
    reject_bot(target)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    let new_points = (points(&txn, guild, target.id).await? - amount).max(0);
    write_points(&txn, guild, target.id, new_points).await?;
    txn.commit().await?;

    Ok(new_points)
}

/// Overwrites the balance of `target`.
pub async fn set(db: &DatabaseConnection, guild: u64, target: Participant, amount: i64) -> Result<i64> {
    reject_bot(target)?;
    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }
    write_points(db, guild, target.id, amount).await?;
    Ok(amount)
}

/// Sets the points of every stored user of the guild to zero.
/// Returns the number of users touched.
pub async fn reset(db: &DatabaseConnection, guild: u64) -> Result<usize> {
    let txn = db.begin().await?;

    let users = store::children(&txn, &layout::users(guild)).await?;
    for user in users.keys() {
        store::set(
            &txn,
            &format!("{}/{user}/{}", layout::users(guild), Feature::Points.as_str()),
            "points",
            0,
        )
        .await?;
    }

    txn.commit().await?;
    tracing::info!(guild, users = users.len(), "points reset");
    Ok(users.len())
}

/// Result of a point gift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gift {
    /// Sender balance afterwards
    pub sender_points: i64,
    /// Recipient balance afterwards
    pub recipient_points: i64,
}

/// Moves `amount` points from `sender` to `recipient`.
///
/// The sender must own at least `amount` and at least [`GIVE_MIN_BALANCE`] points.
pub async fn give(
    db: &DatabaseConnection,
    guild: u64,
    sender: u64,
    recipient: Participant,
    amount: i64,
) -> Result<Gift> {
    check_target(sender, recipient)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let sender_points = points(&txn, guild, sender).await?;
    if sender_points < amount || sender_points < GIVE_MIN_BALANCE {
        return Err(Error::InsufficientFunds {
            current: sender_points,
            required: amount.max(GIVE_MIN_BALANCE),
        });
    }
    let recipient_points = points(&txn, guild, recipient.id).await?;

    let gift = Gift {
        sender_points: sender_points - amount,
        recipient_points: recipient_points + amount,
    };
    write_points(&txn, guild, sender, gift.sender_points).await?;
    write_points(&txn, guild, recipient.id, gift.recipient_points).await?;

    txn.commit().await?;
    Ok(gift)
}

//! Coin economy - daily bonus, transfers, theft, currency conversion and wager
//! settlement.
//!
//! Every operation reads the balances it needs, computes the new values (never below
//! zero) and writes them back inside one database transaction, so two commands racing
//! on the same user cannot lose an update.

use crate::{
    core::{
        layout::{self, Feature},
        store,
    },
    errors::{Error, Result, TargetIssue},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde_json::json;

/// Minimum time between two daily claims
pub const DAILY_COOLDOWN_SECS: i64 = 86_400;
/// A claim later than this after the previous one resets the streak
pub const STREAK_WINDOW_SECS: i64 = 172_800;
/// Victims with less than this are not worth robbing
pub const STEAL_MIN_VICTIM_BALANCE: i64 = 50;
/// Probability that a theft succeeds
pub const STEAL_SUCCESS_CHANCE: f64 = 0.4;
/// Coins needed for one point
pub const COINS_PER_POINT: i64 = 2;

/// A user taking part in an economy action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    /// Discord user id
    pub id: u64,
    /// Whether the user is a bot account
    pub is_bot: bool,
}

impl Participant {
    /// A human participant
    #[must_use]
    pub const fn human(id: u64) -> Self {
        Self { id, is_bot: false }
    }
}

/// Rejects bots and self-targeting.
pub const fn check_target(actor: u64, target: Participant) -> Result<()> {
    if target.is_bot {
        return Err(Error::InvalidTarget {
            issue: TargetIssue::Bot,
        });
    }
    if target.id == actor {
        return Err(Error::InvalidTarget {
            issue: TargetIssue::SelfTarget,
        });
    }
    Ok(())
}

/// Current coin balance, zero for unknown users.
pub async fn balance<C>(db: &C, guild: u64, user: u64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(
        store::get_i64(db, &layout::field(guild, user, Feature::Eco, "balance"))
            .await?
            .unwrap_or(0)
            .max(0),
    )
}

async fn write_balance<C>(db: &C, guild: u64, user: u64, value: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    store::set(db, &layout::feature(guild, user, Feature::Eco), "balance", value.max(0)).await
}

/// Computes the streak for a claim at `now`.
///
/// A `last_claim` of `None` or `0` means the user never claimed. Claims less than
/// [`DAILY_COOLDOWN_SECS`] apart are rejected; a gap of [`STREAK_WINDOW_SECS`] or more
/// restarts the streak at 1.
pub const fn next_streak(last_claim: Option<i64>, previous_streak: i64, now: i64) -> Result<i64> {
    let last = match last_claim {
        Some(last) if last > 0 => last,
        _ => return Ok(1),
    };

    let gap = now - last;
    if gap < DAILY_COOLDOWN_SECS {
        return Err(Error::AlreadyClaimed {
            remaining_secs: DAILY_COOLDOWN_SECS - gap,
        });
    }
    if gap >= STREAK_WINDOW_SECS {
        Ok(1)
    } else {
        Ok(previous_streak + 1)
    }
}

/// Scales a base reward by the streak multiplier `min(3, 1 + streak * 0.1)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn daily_bonus(base: i64, streak: i64) -> i64 {
    let multiplier = (1.0 + streak as f64 * 0.1).min(3.0);
    (base as f64 * multiplier) as i64
}

/// Result of a successful daily claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyReward {
    /// Coins granted
    pub bonus: i64,
    /// Streak after this claim
    pub streak: i64,
    /// Balance after this claim
    pub balance: i64,
}

/// Claims the daily bonus for `user`.
pub async fn claim_daily<R>(
    db: &DatabaseConnection,
    guild: u64,
    user: u64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<DailyReward>
where
    R: Rng,
{
    let base = rng.random_range(50..=150);
    let eco = layout::feature(guild, user, Feature::Eco);

    let txn = db.begin().await?;

    let last_claim = store::get_i64(&txn, &format!("{eco}/last_daily")).await?;
    let previous_streak = store::get_i64(&txn, &format!("{eco}/daily_streak"))
        .await?
        .unwrap_or(0);
    let streak = next_streak(last_claim, previous_streak, now.timestamp())?;

    let bonus = daily_bonus(base, streak);
    let balance = balance(&txn, guild, user).await? + bonus;

    store::update(
        &txn,
        &eco,
        store::object(json!({
            "balance": balance,
            "last_daily": now.timestamp(),
            "daily_streak": streak,
        })),
    )
    .await?;

    txn.commit().await?;

    tracing::debug!(guild, user, bonus, streak, "daily bonus claimed");
    Ok(DailyReward {
        bonus,
        streak,
        balance,
    })
}

/// Result of a transfer between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Amount moved
    pub amount: i64,
    /// Sender balance afterwards
    pub sender_balance: i64,
    /// Recipient balance afterwards
    pub recipient_balance: i64,
}

/// Moves `amount` coins from `sender` to `recipient`. No fee is taken.
pub async fn pay(
    db: &DatabaseConnection,
    guild: u64,
    sender: u64,
    recipient: Participant,
    amount: i64,
) -> Result<Transfer> {
    check_target(sender, recipient)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let sender_balance = balance(&txn, guild, sender).await?;
    if sender_balance < amount {
        return Err(Error::InsufficientFunds {
            current: sender_balance,
            required: amount,
        });
    }
    let recipient_balance = balance(&txn, guild, recipient.id).await?;

    let transfer = Transfer {
        amount,
        sender_balance: sender_balance - amount,
        recipient_balance: recipient_balance + amount,
    };
    write_balance(&txn, guild, sender, transfer.sender_balance).await?;
    write_balance(&txn, guild, recipient.id, transfer.recipient_balance).await?;

    txn.commit().await?;
    Ok(transfer)
}

/// The two ways a theft can end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealRoll {
    /// The thief got away with `amount` coins
    Success {
        /// Coins taken from the victim
        amount: i64,
    },
    /// The thief was caught and pays `penalty`
    Caught {
        /// Coins lost by the thief
        penalty: i64,
    },
}

/// Decides the outcome of a theft.
///
/// On success the loot is `random(10..=clamp(victim / 10, 10, 100))`, capped at the
/// victim's balance. On failure the thief pays `random(5..=20)`, capped at their own
/// balance.
pub fn roll_steal<R>(rng: &mut R, thief_balance: i64, victim_balance: i64) -> StealRoll
where
    R: Rng,
{
    if rng.random_bool(STEAL_SUCCESS_CHANCE) {
        let upper = (victim_balance / 10).clamp(10, 100);
        let amount = rng.random_range(10..=upper).min(victim_balance.max(0));
        StealRoll::Success { amount }
    } else {
        let penalty = rng.random_range(5..=20).min(thief_balance.max(0));
        StealRoll::Caught { penalty }
    }
}

/// Result of a theft attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StealOutcome {
    /// What happened
    pub roll: StealRoll,
    /// Thief balance afterwards
    pub thief_balance: i64,
    /// Victim balance afterwards
    pub victim_balance: i64,
}

/// Attempts to steal coins from `victim`.
pub async fn steal<R>(
    db: &DatabaseConnection,
    guild: u64,
    thief: u64,
    victim: Participant,
    rng: &mut R,
) -> Result<StealOutcome>
where
    R: Rng,
{
    check_target(thief, victim)?;

    let txn = db.begin().await?;

    let thief_balance = balance(&txn, guild, thief).await?;
    let victim_balance = balance(&txn, guild, victim.id).await?;
    if victim_balance < STEAL_MIN_VICTIM_BALANCE {
        return Err(Error::InsufficientFunds {
            current: victim_balance,
            required: STEAL_MIN_VICTIM_BALANCE,
        });
    }

    let roll = roll_steal(rng, thief_balance, victim_balance);
    let outcome = match roll {
        StealRoll::Success { amount } => {
            let outcome = StealOutcome {
                roll,
                thief_balance: thief_balance + amount,
                victim_balance: victim_balance - amount,
            };
            write_balance(&txn, guild, thief, outcome.thief_balance).await?;
            write_balance(&txn, guild, victim.id, outcome.victim_balance).await?;
            outcome
        }
        StealRoll::Caught { penalty } => {
            let outcome = StealOutcome {
                roll,
                thief_balance: thief_balance - penalty,
                victim_balance,
            };
            write_balance(&txn, guild, thief, outcome.thief_balance).await?;
            outcome
        }
    };

    txn.commit().await?;
    Ok(outcome)
}

/// Points received for `coins` coins (odd remainders are lost)
#[must_use]
pub const fn points_for_coins(coins: i64) -> i64 {
    coins / COINS_PER_POINT
}

/// Coins received for `points` points
#[must_use]
pub const fn coins_for_points(points: i64) -> i64 {
    points * COINS_PER_POINT
}

/// Result of a currency conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Amount taken from the source currency
    pub spent: i64,
    /// Amount added to the target currency
    pub received: i64,
    /// Coin balance afterwards
    pub coins: i64,
    /// Point balance afterwards
    pub points: i64,
}

/// Converts `amount` coins into `amount / 2` points.
pub async fn coins_to_points(
    db: &DatabaseConnection,
    guild: u64,
    user: u64,
    amount: i64,
) -> Result<Conversion> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let coins = balance(&txn, guild, user).await?;
    if coins < amount {
        return Err(Error::InsufficientFunds {
            current: coins,
            required: amount,
        });
    }
    let points = crate::core::points::points(&txn, guild, user).await?;

    let conversion = Conversion {
        spent: amount,
        received: points_for_coins(amount),
        coins: coins - amount,
        points: points + points_for_coins(amount),
    };
    write_balance(&txn, guild, user, conversion.coins).await?;
    crate::core::points::write_points(&txn, guild, user, conversion.points).await?;

    txn.commit().await?;
    Ok(conversion)
}

/// Converts `amount` points into `amount * 2` coins.
pub async fn points_to_coins(
    db: &DatabaseConnection,
    guild: u64,
    user: u64,
    amount: i64,
) -> Result<Conversion> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let points = crate::core::points::points(&txn, guild, user).await?;
    if points < amount {
        return Err(Error::InsufficientFunds {
            current: points,
            required: amount,
        });
    }
    let coins = balance(&txn, guild, user).await?;

    let conversion = Conversion {
        spent: amount,
        received: coins_for_points(amount),
        coins: coins + coins_for_points(amount),
        points: points - amount,
    };
    crate::core::points::write_points(&txn, guild, user, conversion.points).await?;
    write_balance(&txn, guild, user, conversion.coins).await?;

    txn.commit().await?;
    Ok(conversion)
}

/// Pays a game wager from `loser` to `winner`.
///
/// Wagers are not escrowed, so the loser pays at most what they still own; the
/// returned amount is what actually moved.
pub async fn settle_wager(
    db: &DatabaseConnection,
    guild: u64,
    winner: u64,
    loser: u64,
    wager: i64,
) -> Result<i64> {
    if wager <= 0 {
        return Ok(0);
    }

    let txn = db.begin().await?;

    let loser_balance = balance(&txn, guild, loser).await?;
    let winner_balance = balance(&txn, guild, winner).await?;
    let moved = wager.min(loser_balance);

    write_balance(&txn, guild, loser, loser_balance - moved).await?;
    write_balance(&txn, guild, winner, winner_balance + moved).await?;

    txn.commit().await?;
    Ok(moved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{set_balance, set_points, setup_test_db};
    use chrono::TimeZone;
    use rand::{SeedableRng, rngs::StdRng};

    const GUILD: u64 = 1;
    const ALICE: u64 = 10;
    const BOB: u64 = 20;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_next_streak_rules() {
        let day = DAILY_COOLDOWN_SECS;
        assert_eq!(next_streak(None, 0, 1_000).unwrap(), 1);
        assert_eq!(next_streak(Some(0), 7, 1_000).unwrap(), 1);
        assert_eq!(next_streak(Some(1_000), 3, 1_000 + day).unwrap(), 4);
        assert_eq!(next_streak(Some(1_000), 3, 1_000 + 2 * day - 1).unwrap(), 4);
        assert_eq!(next_streak(Some(1_000), 3, 1_000 + 2 * day).unwrap(), 1);
        assert!(matches!(
            next_streak(Some(1_000), 3, 1_000 + day - 10),
            Err(Error::AlreadyClaimed { remaining_secs: 10 })
        ));
    }

    #[test]
    fn test_daily_bonus_multiplier_is_capped() {
        assert_eq!(daily_bonus(100, 1), 110);
        assert_eq!(daily_bonus(100, 10), 200);
        assert_eq!(daily_bonus(100, 20), 300);
        assert_eq!(daily_bonus(100, 500), 300);
    }

    #[tokio::test]
    async fn test_first_daily_then_rejected_within_24h() -> Result<()> {
        let db = setup_test_db().await?;
        let mut rng = StdRng::seed_from_u64(7);
        let start = 1_700_000_000;

        let reward = claim_daily(&db, GUILD, ALICE, at(start), &mut rng).await?;
        assert_eq!(reward.streak, 1);
        assert!((55..=165).contains(&reward.bonus));
        assert_eq!(reward.balance, reward.bonus);

        let again = claim_daily(&db, GUILD, ALICE, at(start + 3_600), &mut rng).await;
        assert!(matches!(again, Err(Error::AlreadyClaimed { .. })));
        assert_eq!(balance(&db, GUILD, ALICE).await?, reward.balance);
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_streak_sequence() -> Result<()> {
        let db = setup_test_db().await?;
        let mut rng = StdRng::seed_from_u64(42);
        let day = DAILY_COOLDOWN_SECS;
        let mut now = 1_700_000_000;

        let mut streaks = Vec::new();
        for gap in [0, day, day + 3_600, 2 * day - 1, 2 * day, day] {
            now += gap;
            streaks.push(claim_daily(&db, GUILD, ALICE, at(now), &mut rng).await?.streak);
        }
        assert_eq!(streaks, vec![1, 2, 3, 4, 1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_conserves_coins() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, GUILD, ALICE, 100).await?;
        set_balance(&db, GUILD, BOB, 5).await?;

        let transfer = pay(&db, GUILD, ALICE, Participant::human(BOB), 40).await?;
        assert_eq!(transfer.sender_balance, 60);
        assert_eq!(transfer.recipient_balance, 45);
        assert_eq!(balance(&db, GUILD, ALICE).await? + balance(&db, GUILD, BOB).await?, 105);
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_rejections_leave_balances_untouched() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, GUILD, ALICE, 30).await?;

        let bot = Participant { id: BOB, is_bot: true };
        assert!(matches!(
            pay(&db, GUILD, ALICE, bot, 10).await,
            Err(Error::InvalidTarget { issue: TargetIssue::Bot })
        ));
        assert!(matches!(
            pay(&db, GUILD, ALICE, Participant::human(ALICE), 10).await,
            Err(Error::InvalidTarget { issue: TargetIssue::SelfTarget })
        ));
        assert!(matches!(
            pay(&db, GUILD, ALICE, Participant::human(BOB), 0).await,
            Err(Error::InvalidAmount { amount: 0 })
        ));
        assert!(matches!(
            pay(&db, GUILD, ALICE, Participant::human(BOB), 31).await,
            Err(Error::InsufficientFunds { current: 30, required: 31 })
        ));
        assert_eq!(balance(&db, GUILD, ALICE).await?, 30);
        assert_eq!(balance(&db, GUILD, BOB).await?, 0);
        Ok(())
    }

    #[test]
    fn test_roll_steal_bounds() {
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            let victim = 50 + i64::try_from(seed).unwrap() * 7;
            match roll_steal(&mut rng, 12, victim) {
                StealRoll::Success { amount } => {
                    assert!(amount >= 10);
                    assert!(amount <= victim);
                    assert!(amount <= 100);
                }
                StealRoll::Caught { penalty } => {
                    assert!(penalty <= 12);
                    assert!(penalty >= 5);
                }
            }
        }
    }

    #[test]
    fn test_roll_steal_penalty_capped_by_thief_balance() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let StealRoll::Caught { penalty } = roll_steal(&mut rng, 3, 500) {
                assert!(penalty <= 3);
            }
        }
    }

    #[tokio::test]
    async fn test_steal_requires_rich_victim() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, GUILD, BOB, 49).await?;
        let mut rng = StdRng::seed_from_u64(1);

        let result = steal(&db, GUILD, ALICE, Participant::human(BOB), &mut rng).await;
        assert!(matches!(result, Err(Error::InsufficientFunds { current: 49, required: 50 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_steal_rejects_bots_and_self() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, GUILD, ALICE, 500).await?;
        set_balance(&db, GUILD, BOB, 500).await?;
        let mut rng = StdRng::seed_from_u64(3);

        let bot = Participant { id: BOB, is_bot: true };
        assert!(matches!(
            steal(&db, GUILD, ALICE, bot, &mut rng).await,
            Err(Error::InvalidTarget { issue: TargetIssue::Bot })
        ));
        assert!(matches!(
            steal(&db, GUILD, ALICE, Participant::human(ALICE), &mut rng).await,
            Err(Error::InvalidTarget { issue: TargetIssue::SelfTarget })
        ));

        assert_eq!(balance(&db, GUILD, ALICE).await?, 500);
        assert_eq!(balance(&db, GUILD, BOB).await?, 500);
        Ok(())
    }

    #[tokio::test]
    async fn test_steal_applies_exactly_one_branch() -> Result<()> {
        let db = setup_test_db().await?;
        for seed in 0..20 {
            set_balance(&db, GUILD, ALICE, 15).await?;
            set_balance(&db, GUILD, BOB, 400).await?;
            let mut rng = StdRng::seed_from_u64(seed);

            let outcome = steal(&db, GUILD, ALICE, Participant::human(BOB), &mut rng).await?;
            match outcome.roll {
                StealRoll::Success { amount } => {
                    assert_eq!(outcome.thief_balance, 15 + amount);
                    assert_eq!(outcome.victim_balance, 400 - amount);
                }
                StealRoll::Caught { penalty } => {
                    assert_eq!(outcome.thief_balance, 15 - penalty);
                    assert_eq!(outcome.victim_balance, 400);
                }
            }
            assert_eq!(balance(&db, GUILD, ALICE).await?, outcome.thief_balance);
            assert_eq!(balance(&db, GUILD, BOB).await?, outcome.victim_balance);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_conversion_is_exact() -> Result<()> {
        let db = setup_test_db().await?;
        set_points(&db, GUILD, ALICE, 10).await?;

        let to_coins = points_to_coins(&db, GUILD, ALICE, 7).await?;
        assert_eq!(to_coins.received, 14);
        assert_eq!(to_coins.points, 3);
        assert_eq!(to_coins.coins, 14);

        let to_points = coins_to_points(&db, GUILD, ALICE, 14).await?;
        assert_eq!(to_points.received, 7);
        assert_eq!(to_points.coins, 0);
        assert_eq!(to_points.points, 10);

        set_balance(&db, GUILD, ALICE, 5).await?;
        let odd = coins_to_points(&db, GUILD, ALICE, 5).await?;
        assert_eq!(odd.received, 2);
        assert_eq!(odd.coins, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_conversion_rejections() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, GUILD, ALICE, 3).await?;
        assert!(matches!(
            coins_to_points(&db, GUILD, ALICE, 4).await,
            Err(Error::InsufficientFunds { .. })
        ));
        assert!(matches!(
            points_to_coins(&db, GUILD, ALICE, -1).await,
            Err(Error::InvalidAmount { amount: -1 })
        ));
        assert_eq!(balance(&db, GUILD, ALICE).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_settle_wager() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, GUILD, ALICE, 100).await?;
        set_balance(&db, GUILD, BOB, 100).await?;

        assert_eq!(settle_wager(&db, GUILD, ALICE, BOB, 20).await?, 20);
        assert_eq!(balance(&db, GUILD, ALICE).await?, 120);
        assert_eq!(balance(&db, GUILD, BOB).await?, 80);

        set_balance(&db, GUILD, BOB, 5).await?;
        assert_eq!(settle_wager(&db, GUILD, ALICE, BOB, 20).await?, 5);
        assert_eq!(balance(&db, GUILD, BOB).await?, 0);
        Ok(())
    }
}

//! Ranking of guild members by a per-user counter.

use crate::{
    core::{
        layout::{self, Feature},
        store,
    },
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde_json::{Map, Value};

/// Number of entries shown on a leaderboard
pub const TOP: usize = 10;

/// One ranked user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Discord user id
    pub user: u64,
    /// Counter value
    pub value: i64,
}

/// Which counter to rank by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    /// `eco/balance`
    Coins,
    /// `points/points`, users with zero points are left out
    Points,
}

impl Board {
    const fn feature(self) -> (Feature, &'static str) {
        match self {
            Self::Coins => (Feature::Eco, "balance"),
            Self::Points => (Feature::Points, "points"),
        }
    }
}

/// Ranks the `users` subtree of a guild, highest value first. Ties keep ascending user
/// id order. Non-numeric user keys are ignored.
#[must_use]
pub fn rank(users: &Map<String, Value>, board: Board) -> Vec<Entry> {
    let (feature, field) = board.feature();

    let mut entries: Vec<Entry> = users
        .iter()
        .filter_map(|(id, data)| {
            let user = id.parse().ok()?;
            let value = data
                .get(feature.as_str())
                .and_then(|f| f.get(field))
                .and_then(store::as_i64)
                .unwrap_or(0);
            Some(Entry { user, value })
        })
        .filter(|entry| board != Board::Points || entry.value > 0)
        .collect();

    entries.sort_by(|a, b| b.value.cmp(&a.value).then(a.user.cmp(&b.user)));
    entries
}

/// The first [`TOP`] entries of a guild's ranking.
pub async fn load<C>(db: &C, guild: u64, board: Board) -> Result<Vec<Entry>>
where
    C: ConnectionTrait,
{
    let users = store::children(db, &layout::users(guild)).await?;
    let mut ranking = rank(&users, board);
    ranking.truncate(TOP);
    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> Map<String, Value> {
        store::object(json!({
            "1": {"eco": {"balance": 50}, "points": {"points": 0}},
            "2": {"eco": {"balance": 300}, "points": {"points": 4}},
            "3": {"eco": {"balance": 50}},
            "x": {"eco": {"balance": 9999}},
        }))
    }

    #[test]
    fn test_coin_ranking_orders_and_breaks_ties() {
        let ranking = rank(&users(), Board::Coins);
        let ids: Vec<u64> = ranking.iter().map(|e| e.user).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(ranking[0].value, 300);
    }

    #[test]
    fn test_point_ranking_skips_zero() {
        let ranking = rank(&users(), Board::Points);
        assert_eq!(ranking, vec![Entry { user: 2, value: 4 }]);
    }

    #[tokio::test]
    async fn test_load_reads_store() -> crate::errors::Result<()> {
        let db = crate::test_utils::setup_test_db().await?;
        crate::test_utils::set_balance(&db, 1, 7, 10).await?;
        crate::test_utils::set_balance(&db, 1, 8, 20).await?;
        let ranking = load(&db, 1, Board::Coins).await?;
        assert_eq!(ranking.first().map(|e| e.user), Some(8));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_stops_at_top() -> crate::errors::Result<()> {
        let db = crate::test_utils::setup_test_db().await?;
        for user in 1..=15 {
            crate::test_utils::set_balance(&db, 1, user, i64::try_from(user * 10).unwrap_or(0)).await?;
        }
        let ranking = load(&db, 1, Board::Coins).await?;
        assert_eq!(ranking.len(), TOP);
        assert_eq!(ranking.first(), Some(&Entry { user: 15, value: 150 }));
        assert_eq!(ranking.last(), Some(&Entry { user: 6, value: 60 }));
        Ok(())
    }
}

//! Hierarchical key-path store.
//!
//! The bot's state is a tree (`servers/{g}/users/{u}/eco/balance`, ...). Each leaf is
//! one row of the `documents` table, keyed by its full path. Reads of an inner node
//! reassemble the subtree into a JSON object; updates replace the named children of a
//! node, Firebase style:
//!
//! * `get(path)` - the leaf at `path`, the object assembled from the leaves below it,
//!   or `None` when nothing is stored there
//! * `update(path, map)` - every key of `map` replaces the child subtree of the same
//!   name; nested objects are flattened into leaves and `null` deletes the child
//!
//! All functions are generic over [`ConnectionTrait`] so they can run inside a
//! database transaction.

use crate::{
    entities::{Document, document},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Reads the value stored at `path`.
pub async fn get<C>(db: &C, path: &str) -> Result<Option<Value>>
where
    C: ConnectionTrait,
{
    let path = normalize(path);

    if let Some(leaf) = Document::find_by_id(path.to_string()).one(db).await? {
        return Ok(Some(serde_json::from_str(&leaf.value)?));
    }

    let prefix = format!("{path}/");
    let rows = subtree(db, path).await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut root = Map::new();
    for row in rows {
        let Some(rest) = row.path.strip_prefix(&prefix) else {
            continue;
        };
        let segments: Vec<&str> = rest.split('/').collect();
        insert_leaf(&mut root, &segments, serde_json::from_str(&row.value)?);
    }

    Ok(Some(Value::Object(root)))
}

/// Replaces the named children of `path` with the given values.
pub async fn update<C>(db: &C, path: &str, fields: Map<String, Value>) -> Result<()>
where
    C: ConnectionTrait,
{
    if fields.is_empty() {
        return Ok(());
    }

    let path = normalize(path);
    // A scalar stored at `path` or above it cannot coexist with children.
    delete_leaves(db, ancestors_and_self(path)).await?;

    let now = Utc::now();
    for (key, value) in fields {
        let child = join(path, &key);

        let existing: Vec<String> = subtree(db, &child)
            .await?
            .into_iter()
            .map(|row| row.path)
            .chain(std::iter::once(child.clone()))
            .collect();
        delete_leaves(db, existing).await?;

        let mut leaves = Vec::new();
        flatten(&child, value, &mut leaves);
        insert_leaves(db, leaves, now).await?;
    }

    Ok(())
}

/// Convenience wrapper around [`update`] for a single child.
pub async fn set<C, V>(db: &C, path: &str, key: &str, value: V) -> Result<()>
where
    C: ConnectionTrait,
    V: Into<Value>,
{
    let mut fields = Map::new();
    fields.insert(key.to_string(), value.into());
    update(db, path, fields).await
}

/// Writes every leaf of `defaults` below `path` that is not stored yet.
///
/// Existing values are never overwritten. Returns the number of leaves written.
pub async fn ensure_defaults<C>(db: &C, path: &str, defaults: &Value) -> Result<usize>
where
    C: ConnectionTrait,
{
    let path = normalize(path);
    let present: HashSet<String> = subtree(db, path)
        .await?
        .into_iter()
        .map(|row| row.path)
        .collect();

    let mut leaves = Vec::new();
    flatten(path, defaults.clone(), &mut leaves);
    leaves.retain(|(leaf_path, _)| !present.contains(leaf_path));

    let written = leaves.len();
    insert_leaves(db, leaves, Utc::now()).await?;
    Ok(written)
}

/// Reads an integer leaf. Floats are truncated, anything else counts as absent.
pub async fn get_i64<C>(db: &C, path: &str) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    Ok(get(db, path).await?.as_ref().and_then(as_i64))
}

/// Reads a string leaf.
pub async fn get_string<C>(db: &C, path: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    Ok(get(db, path)
        .await?
        .and_then(|value| value.as_str().map(str::to_string)))
}

/// Reads the children of an inner node, empty when the node is missing or a leaf.
pub async fn children<C>(db: &C, path: &str) -> Result<Map<String, Value>>
where
    C: ConnectionTrait,
{
    Ok(match get(db, path).await? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

/// Turns a `json!({...})` literal into the field map expected by [`update`].
/// Non-object values yield an empty map.
#[must_use]
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Interprets a JSON value as an integer the way the bot stores counters.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // stored floats are whole-second timestamps
pub fn as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|float| float as i64))
}

/// All rows strictly below `path`.
async fn subtree<C>(db: &C, path: &str) -> Result<Vec<document::Model>>
where
    C: ConnectionTrait,
{
    let prefix = format!("{path}/");
    // LIKE treats `_` as a wildcard, so the prefix is re-checked in Rust.
    let rows = Document::find()
        .filter(document::Column::Path.starts_with(prefix.as_str()))
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter(|row| row.path.starts_with(&prefix))
        .collect())
}

async fn delete_leaves<C>(db: &C, paths: Vec<String>) -> Result<()>
where
    C: ConnectionTrait,
{
    if paths.is_empty() {
        return Ok(());
    }
    Document::delete_many()
        .filter(document::Column::Path.is_in(paths))
        .exec(db)
        .await?;
    Ok(())
}

async fn insert_leaves<C>(
    db: &C,
    leaves: Vec<(String, Value)>,
    now: chrono::DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if leaves.is_empty() {
        return Ok(());
    }
    let models = leaves.into_iter().map(|(path, value)| document::ActiveModel {
        path: Set(path),
        value: Set(value.to_string()),
        updated_at: Set(now),
    });
    Document::insert_many(models).exec_without_returning(db).await?;
    Ok(())
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn join(path: &str, key: &str) -> String {
    let key = normalize(key);
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}/{key}")
    }
}

fn ancestors_and_self(path: &str) -> Vec<String> {
    path.match_indices('/')
        .map(|(idx, _)| path[..idx].to_string())
        .chain(std::iter::once(path.to_string()))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Splits a value into `(path, scalar)` leaves. `null` and empty objects produce none.
fn flatten(path: &str, value: Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&join(path, &key), child, out);
            }
        }
        scalar => out.push((path.to_string(), scalar)),
    }
}

fn insert_leaf(node: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            node.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_leaf(map, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_is_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get(&db, "servers/1/users/2/eco/balance").await?.is_none());
        assert!(get(&db, "servers/1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_then_get_leaf_and_subtree() -> Result<()> {
        let db = setup_test_db().await?;
        update(
            &db,
            "servers/1/users/2/eco",
            object(json!({"balance": 120, "last_daily": 1_700_000_000, "daily_streak": 3})),
        )
        .await?;

        assert_eq!(get_i64(&db, "servers/1/users/2/eco/balance").await?, Some(120));
        assert_eq!(
            get(&db, "servers/1/users/2/eco").await?,
            Some(json!({"balance": 120, "last_daily": 1_700_000_000, "daily_streak": 3}))
        );
        assert_eq!(
            get(&db, "servers/1/users").await?,
            Some(json!({"2": {"eco": {"balance": 120, "last_daily": 1_700_000_000, "daily_streak": 3}}}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_unnamed_siblings() -> Result<()> {
        let db = setup_test_db().await?;
        update(&db, "servers/1/users/2/eco", object(json!({"balance": 10, "daily_streak": 1}))).await?;
        update(&db, "servers/1/users/2/eco", object(json!({"balance": 25}))).await?;

        assert_eq!(get_i64(&db, "servers/1/users/2/eco/balance").await?, Some(25));
        assert_eq!(get_i64(&db, "servers/1/users/2/eco/daily_streak").await?, Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_child_subtree() -> Result<()> {
        let db = setup_test_db().await?;
        update(&db, "servers/1/users/2", object(json!({"eco": {"balance": 10, "inventory": {"sword": 1}}}))).await?;
        update(&db, "servers/1/users/2", object(json!({"eco": {"balance": 5}}))).await?;

        assert_eq!(get(&db, "servers/1/users/2/eco").await?, Some(json!({"balance": 5})));
        Ok(())
    }

    #[tokio::test]
    async fn test_null_deletes_child() -> Result<()> {
        let db = setup_test_db().await?;
        set(&db, "servers/1/settings", "mod_log_channel", 99).await?;
        set(&db, "servers/1/settings", "mod_log_channel", Value::Null).await?;
        assert!(get(&db, "servers/1/settings/mod_log_channel").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_prefix_does_not_leak_into_similar_paths() -> Result<()> {
        let db = setup_test_db().await?;
        set(&db, "servers/1/users/2/eco", "last_daily", 5).await?;
        set(&db, "servers/1/users/2/eco", "lastXdaily", 7).await?;
        set(&db, "servers/1/users/2/eco", "last_daily", 6).await?;

        assert_eq!(get_i64(&db, "servers/1/users/2/eco/lastXdaily").await?, Some(7));
        assert_eq!(get_i64(&db, "servers/1/users/2/eco/last_daily").await?, Some(6));
        assert!(get(&db, "servers/1/users/22").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_scalar_parent_is_replaced_by_children() -> Result<()> {
        let db = setup_test_db().await?;
        set(&db, "servers/1/users/2", "eco", 3).await?;
        set(&db, "servers/1/users/2/eco", "balance", 4).await?;
        assert_eq!(get(&db, "servers/1/users/2/eco").await?, Some(json!({"balance": 4})));
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_defaults_only_fills_gaps() -> Result<()> {
        let db = setup_test_db().await?;
        set(&db, "servers/1/users/2/eco", "balance", 77).await?;

        let written = ensure_defaults(
            &db,
            "servers/1/users/2",
            &json!({"eco": {"balance": 0, "daily_streak": 0}, "points": {"points": 0}}),
        )
        .await?;

        assert_eq!(written, 2);
        assert_eq!(get_i64(&db, "servers/1/users/2/eco/balance").await?, Some(77));
        assert_eq!(get_i64(&db, "servers/1/users/2/eco/daily_streak").await?, Some(0));
        assert_eq!(get_i64(&db, "servers/1/users/2/points/points").await?, Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_typed_getters() -> Result<()> {
        let db = setup_test_db().await?;
        update(&db, "servers/1/settings", object(json!({"language": "en", "ratio": 1.9}))).await?;
        assert_eq!(get_string(&db, "servers/1/settings/language").await?, Some("en".to_string()));
        assert_eq!(get_i64(&db, "servers/1/settings/ratio").await?, Some(1));
        assert_eq!(get_i64(&db, "servers/1/settings/language").await?, None);
        assert_eq!(children(&db, "servers/1/settings").await?.len(), 2);
        assert!(children(&db, "servers/9").await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_ancestors_and_self() {
        assert_eq!(
            ancestors_and_self("servers/1/users"),
            vec!["servers", "servers/1", "servers/1/users"]
        );
    }
}

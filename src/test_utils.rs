//! Shared test utilities for Comet.
//!
//! Helpers for setting up an in-memory database and seeding balances directly in the
//! state tree, bypassing the validation of the economy operations.

use crate::{
    core::{
        layout::{self, Feature},
        store,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Overwrites the coin balance of a user.
pub async fn set_balance(db: &DatabaseConnection, guild: u64, user: u64, balance: i64) -> Result<()> {
    store::set(db, &layout::feature(guild, user, Feature::Eco), "balance", balance).await
}

/// Overwrites the point balance of a user.
pub async fn set_points(db: &DatabaseConnection, guild: u64, user: u64, points: i64) -> Result<()> {
    store::set(db, &layout::feature(guild, user, Feature::Points), "points", points).await
}

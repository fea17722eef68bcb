//! Core logic - framework-agnostic operations on the state tree.
//!
//! Nothing in here knows about Discord. Functions take a database connection (or any
//! [`sea_orm::ConnectionTrait`]) plus plain ids, and return domain results or
//! [`crate::errors::Error`] rejections that the bot layer renders.

/// Reply-chain history reconstruction and AI thread records
pub mod conversation;
/// Coins: daily bonus, transfers, theft, conversion, wagers
pub mod economy;
/// Paths and defaults of the state tree
pub mod layout;
/// Top-10 rankings
pub mod leaderboard;
/// Moderation counters and role hierarchy
pub mod moderation;
/// Point balances
pub mod points;
/// Button poll state
pub mod poll;
/// Rock-paper-scissors game state machine
pub mod rps;
/// Time parsing and Discord timestamps
pub mod schedule;
/// Per-server settings and default seeding
pub mod settings;
/// Hierarchical key-path store on top of the `documents` table
pub mod store;

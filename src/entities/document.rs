//! Document entity - one leaf of the hierarchical server/user tree.
//!
//! A leaf is addressed by its full slash-separated path
//! (e.g. `servers/1/users/2/eco/balance`) and stores its JSON-encoded scalar value.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Full path of the leaf, unique
    #[sea_orm(primary_key, auto_increment = false)]
    pub path: String,
    /// JSON-encoded scalar value
    pub value: String,
    /// When this leaf was last written
    pub updated_at: DateTimeUtc,
}

/// Documents have no relationships; hierarchy is encoded in the path
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

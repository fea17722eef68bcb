//! Entity module - `SeaORM` entity definitions backing the key-path store.
//! The store keeps one row per leaf of the server/user tree; see `core::store`.

pub mod document;

pub use document::{Column as DocumentColumn, Entity as Document, Model as DocumentModel};

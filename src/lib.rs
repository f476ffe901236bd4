//! Typed record mapping over on-disk full-text indexes.
//!
//! A [`schema::RecordSchema`] declares how a record's fields are stored and
//! indexed; [`index::IndexContext`] opens an [`index::IndexStore`] per index
//! name; the store funnels every write through a process-wide per-index
//! mutex and serves reads from fresh snapshot searchers.

pub mod analysis;
pub mod core;
pub mod index;
pub mod lock;
pub mod mapper;
pub mod oid;
pub mod schema;

pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::types::{DocField, Document, IndexMode, StoreMode};
pub use crate::index::{IndexContext, IndexStore, QueryInfo, QueryOutput, QueryPageInfo, SortSpec};
pub use crate::oid::ObjectId;
pub use crate::schema::{FieldPolicy, IndexRecord, RecordSchema, SchemaBuilder};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::schema::record::{IndexRecord, RecordSchema};

/// Process-scoped cache of built record schemas, keyed by record type.
///
/// Entries are built at most once per type and live for the registry's
/// lifetime; there is no eviction. The registry is an explicit service passed
/// into the facade rather than an ambient global.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Fetch the cached schema for `T`, building it on first use. Reads of an
    /// existing entry take only the read lock; the first build for a type is
    /// serialized under the write lock.
    pub fn get<T: IndexRecord>(&self) -> Arc<RecordSchema<T>> {
        let key = TypeId::of::<T>();
        if let Some(entry) = self.entries.read().get(&key) {
            return downcast::<T>(entry.clone());
        }
        let mut entries = self.entries.write();
        let entry = entries
            .entry(key)
            .or_insert_with(|| Arc::new(T::schema()) as Arc<dyn Any + Send + Sync>);
        downcast::<T>(entry.clone())
    }

    /// Number of record types registered so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn downcast<T: IndexRecord>(entry: Arc<dyn Any + Send + Sync>) -> Arc<RecordSchema<T>> {
    // Entries are only ever inserted under their own TypeId.
    entry
        .downcast::<RecordSchema<T>>()
        .expect("schema registry entry matches its type key")
}

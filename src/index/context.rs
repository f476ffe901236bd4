use std::sync::Arc;

use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::index::store::IndexStore;
use crate::lock::registry::MutexRegistry;
use crate::schema::record::IndexRecord;
use crate::schema::registry::SchemaRegistry;

/// Shared entry point for opening index stores. Holds the configuration
/// plus the schema and write-mutex registries, so every store opened
/// through one context shares them. Clone-cheap; registries are behind
/// `Arc`.
#[derive(Clone)]
pub struct IndexContext {
    config: Config,
    schemas: Arc<SchemaRegistry>,
    mutexes: Arc<MutexRegistry>,
}

impl IndexContext {
    pub fn new(config: Config) -> Self {
        IndexContext {
            config,
            schemas: Arc::new(SchemaRegistry::new()),
            mutexes: Arc::new(MutexRegistry::new()),
        }
    }

    /// Build a context around existing registries, for callers that share
    /// them across several contexts.
    pub fn with_registries(
        config: Config,
        schemas: Arc<SchemaRegistry>,
        mutexes: Arc<MutexRegistry>,
    ) -> Self {
        IndexContext {
            config,
            schemas,
            mutexes,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mutexes(&self) -> &Arc<MutexRegistry> {
        &self.mutexes
    }

    /// Open the store named after the record type.
    pub fn open<T: IndexRecord>(&self) -> Result<IndexStore<T>> {
        self.open_as::<T>(T::index_name())
    }

    /// Open the store under an explicit name. Two stores opened under the
    /// same name share one write mutex.
    pub fn open_as<T: IndexRecord>(&self, index_name: &str) -> Result<IndexStore<T>> {
        self.open_with_analyzer::<T>(index_name, Arc::new(StandardTokenizer::default()))
    }

    /// Open the store with a caller-supplied analyzer for tokenized fields.
    pub fn open_with_analyzer<T: IndexRecord>(
        &self,
        index_name: &str,
        analyzer: Arc<dyn Tokenizer>,
    ) -> Result<IndexStore<T>> {
        let schema = self.schemas.get::<T>();
        let mutex = self.mutexes.get(index_name);
        IndexStore::open(&self.config, index_name, schema, mutex, analyzer)
    }
}

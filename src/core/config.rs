use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application base path; index directories live below it.
    pub base_path: PathBuf,
    /// Fixed path segment between the base path and the index name.
    pub index_dir: String,
    /// Heap budget handed to the engine writer per mutating transaction.
    pub writer_heap_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_path: PathBuf::from("./data"),
            index_dir: "index_store".to_string(),
            writer_heap_bytes: 50 * 1024 * 1024, // 50MB writer heap
        }
    }
}

impl Config {
    /// On-disk directory for a named index: `{base_path}/{index_dir}/{name}`.
    pub fn index_path(&self, index_name: &str) -> PathBuf {
        self.base_path.join(&self.index_dir).join(index_name)
    }
}

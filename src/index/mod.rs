pub mod context;
pub mod query;
pub mod store;

pub use context::IndexContext;
pub use query::{QueryInfo, QueryOutput, QueryPageInfo, SortOrder, SortSpec};
pub use store::IndexStore;

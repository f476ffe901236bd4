pub mod record;
pub mod registry;

pub use record::{FieldPolicy, FieldSpec, IndexRecord, RecordSchema, SchemaBuilder};
pub use registry::SchemaRegistry;

pub mod registry;

pub use registry::MutexRegistry;

// Pipeline ingestion: reading per-network seller lists from disk

pub mod source_loader;

pub use source_loader::{discover_sources, SourceLoader};

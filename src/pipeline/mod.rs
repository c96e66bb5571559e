// Build pipeline: ingestion, processing, and storage

pub mod context;
pub mod ingestion;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod processing;
pub mod storage;

// Re-export key types for the binary and integration tests
pub use context::{BuildContext, BuildResult, NetworkFile, NetworkStats};
pub use pipeline::{BuildOptions, BuildOutcome, Pipeline};

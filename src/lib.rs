pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::{Config, Environment};
pub use error::{BuildError, Result};
pub use pipeline::{BuildOptions, BuildOutcome, Pipeline};

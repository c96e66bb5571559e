/// Defaults shared by the configuration loader, the writer and the CLI

// Configuration
pub const DEFAULT_CONFIG_FILE: &str = "ads.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "app-ads.txt";
pub const DEFAULT_LOG_DIR: &str = "logs";

// Build log written next to the tracing output
pub const BUILD_LOG_FILE: &str = "ads-build-latest.log";
pub const TRACE_LOG_FILE: &str = "app-ads-builder.log";

// Environment selection
pub const ENV_VAR: &str = "ADS_ENV";
pub const DEFAULT_ENV: &str = "test";
pub const PRODUCTION_ENV: &str = "prod";

// Output format
pub const NETWORK_HEADER_PREFIX: &str = "## ";
pub const COMMENT_PREFIX: char = '#';
pub const SOURCE_EXTENSION: &str = "txt";

// Mode for a manifest or log written where no file existed before
pub const NEW_FILE_MODE: u32 = 0o644;

// Certification ids are issued in exactly one of these lengths
pub const CERT_ID_LENGTHS: [usize; 2] = [9, 16];

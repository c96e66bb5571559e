// Pipeline storage: manifest serialization and the human-readable build log

pub mod build_log;
pub mod output_file;

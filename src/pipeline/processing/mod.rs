// Pipeline processing: line validation, deduplication, change detection and gating

pub mod change_report;
pub mod dedup;
pub mod normalize;
pub mod quality_gate;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Environment;
use crate::error::{BuildError, Result};

/// Issue tallies a build hands to the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub duplicates: usize,
    pub invalid_lines: usize,
    pub dropped_certs: usize,
    pub missing_sources: usize,
}

impl IssueCounts {
    /// Issues that fail a production build
    pub fn blocking(&self) -> usize {
        self.duplicates + self.invalid_lines
    }

    pub fn total(&self) -> usize {
        self.blocking() + self.dropped_certs + self.missing_sources
    }
}

/// Gate verdict for a whole build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateDecision {
    /// Nothing to report
    Pass,
    /// Issues were recorded but the environment tolerates them
    PassWithWarnings,
    /// Production build with duplicates or invalid lines
    Fail,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Pass => "PASS",
            GateDecision::PassWithWarnings => "PASS (with warnings)",
            GateDecision::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateAssessment {
    pub decision: GateDecision,
    pub environment: String,
    pub counts: IssueCounts,
}

impl GateAssessment {
    pub fn passed(&self) -> bool {
        self.decision != GateDecision::Fail
    }

    /// Turn a failed assessment into the error the process exits with.
    pub fn into_result(self) -> Result<()> {
        match self.decision {
            GateDecision::Fail => Err(BuildError::GateFailed {
                duplicates: self.counts.duplicates,
                invalid: self.counts.invalid_lines,
            }),
            GateDecision::Pass | GateDecision::PassWithWarnings => Ok(()),
        }
    }
}

/// Trait for deciding whether a finished build is acceptable
pub trait QualityGate {
    fn assess(&self, counts: &IssueCounts) -> GateAssessment;
}

/// Fails production builds on duplicates or invalid lines; everything else
/// is a warning.
pub struct BuildGate {
    environment: Environment,
}

impl BuildGate {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl QualityGate for BuildGate {
    fn assess(&self, counts: &IssueCounts) -> GateAssessment {
        let decision = if counts.blocking() > 0 && self.environment.is_production() {
            GateDecision::Fail
        } else if counts.total() > 0 {
            GateDecision::PassWithWarnings
        } else {
            GateDecision::Pass
        };

        match decision {
            GateDecision::Fail => warn!(
                env = %self.environment,
                duplicates = counts.duplicates,
                invalid = counts.invalid_lines,
                "Build gate failed"
            ),
            GateDecision::PassWithWarnings => warn!(
                env = %self.environment,
                issues = counts.total(),
                "Build gate passed with warnings"
            ),
            GateDecision::Pass => info!(env = %self.environment, "Build gate passed"),
        }

        GateAssessment {
            decision,
            environment: self.environment.tag().to_string(),
            counts: *counts,
        }
    }
}

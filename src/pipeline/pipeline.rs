use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::{Config, Environment};
use crate::error::Result;
use crate::pipeline::context::{BuildContext, BuildResult};
use crate::pipeline::ingestion::SourceLoader;
use crate::pipeline::processing::change_report::{ChangeReport, PreviousOutput};
use crate::pipeline::processing::quality_gate::{BuildGate, GateAssessment, QualityGate};
use crate::pipeline::storage::build_log::{self, BuildLogHeader};
use crate::pipeline::storage::output_file;

/// Per-invocation switches layered over the configuration
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub environment: Environment,
    /// Overrides the environment-derived output path
    pub output_override: Option<PathBuf>,
    pub write_log: bool,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct BuildOutcome {
    pub environment: String,
    pub output_path: PathBuf,
    /// False for dry runs
    pub written: bool,
    pub output_sha256: String,
    pub log_path: Option<PathBuf>,
    pub result: BuildResult,
    pub gate: GateAssessment,
}

pub struct Pipeline {
    config: Config,
    options: BuildOptions,
}

impl Pipeline {
    pub fn new(config: Config, options: BuildOptions) -> Self {
        Self { config, options }
    }

    pub fn output_path(&self) -> PathBuf {
        self.options
            .output_override
            .clone()
            .unwrap_or_else(|| self.config.output_path_for(&self.options.environment))
    }

    /// Load, validate and deduplicate every configured network, then diff the
    /// result against the manifest currently at the output path. Writes nothing.
    #[instrument(skip(self), fields(env = %self.options.environment))]
    pub fn assemble(&self) -> Result<BuildResult> {
        self.config.validate()?;
        let output_path = self.output_path();
        let previous = output_file::read_previous(&output_path)?
            .map(|content| PreviousOutput::parse(&content))
            .unwrap_or_default();

        let mut ctx = BuildContext::new(self.config.cert_policy);
        let mut networks = Vec::with_capacity(self.config.networks.len());
        for source in &self.config.networks {
            let lines = SourceLoader::load(source)?;
            networks.push(ctx.process_network(source, lines));
        }

        let changes = ChangeReport::compare(
            &previous,
            networks
                .iter()
                .map(|n| (n.name.as_str(), n.entries.as_slice())),
        );
        Ok(ctx.finish(networks, changes))
    }

    /// Full build: write the manifest and the build log, then apply the gate.
    /// A failed gate is reported in the outcome; the files stay written.
    #[instrument(skip(self), fields(env = %self.options.environment))]
    pub fn run(&self) -> Result<BuildOutcome> {
        let started = Instant::now();
        let output_path = self.output_path();
        let result = self.assemble()?;

        let contents = output_file::render(&result.networks);
        let output_sha256 = output_file::sha256_hex(&contents);
        output_file::write_atomic(&output_path, &contents)?;
        info!(
            output = %output_path.display(),
            entries = result.total_entries(),
            "Manifest written"
        );

        let gate = BuildGate::new(self.options.environment.clone()).assess(&result.issue_counts());

        let log_path = if self.options.write_log {
            let header = BuildLogHeader {
                built_at: Utc::now(),
                environment: self.options.environment.tag().to_string(),
                output_path: output_path.clone(),
                output_sha256: output_sha256.clone(),
            };
            let path = self.config.build_log_path();
            output_file::write_atomic(&path, &build_log::render(&header, &result, &gate))?;
            Some(path)
        } else {
            None
        };

        counter!("ads_builds_total", "env" => self.options.environment.tag().to_string()).increment(1);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            decision = gate.decision.as_str(),
            "Build finished"
        );

        Ok(BuildOutcome {
            environment: self.options.environment.tag().to_string(),
            output_path,
            written: true,
            output_sha256,
            log_path,
            result,
            gate,
        })
    }

    /// Dry run: same analysis and gate as `run` without touching disk.
    pub fn check(&self) -> Result<BuildOutcome> {
        let result = self.assemble()?;
        let output_sha256 = output_file::sha256_hex(&output_file::render(&result.networks));
        let gate = BuildGate::new(self.options.environment.clone()).assess(&result.issue_counts());

        Ok(BuildOutcome {
            environment: self.options.environment.tag().to_string(),
            output_path: self.output_path(),
            written: false,
            output_sha256,
            log_path: None,
            result,
            gate,
        })
    }
}

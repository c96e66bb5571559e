use metrics::counter;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::domain::NetworkSource;
use crate::pipeline::processing::change_report::ChangeReport;
use crate::pipeline::processing::dedup::{Admission, Deduplicator, DuplicateRecord};
use crate::pipeline::processing::normalize::{CertPolicy, InvalidReason, LineNormalizer};
use crate::pipeline::processing::quality_gate::IssueCounts;

/// A candidate line that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidLineRecord {
    pub network: String,
    pub line: String,
    pub reason: InvalidReason,
}

/// A line kept after its certification id was stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedCertRecord {
    pub network: String,
    pub line: String,
    pub removed_cert: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    /// Non-blank, non-comment lines read
    pub seen: usize,
    /// Entries that survived validation and dedup
    pub kept: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub dropped_certs: usize,
}

impl NetworkStats {
    pub fn skipped(&self) -> usize {
        self.invalid + self.duplicates
    }
}

/// One configured network after processing
#[derive(Debug, Clone, Serialize)]
pub struct NetworkFile {
    pub name: String,
    pub path: PathBuf,
    /// False when the source file was missing; such networks are left out of the manifest.
    pub loaded: bool,
    /// Canonical entries that passed validation, before dedup
    pub valid_entries: Vec<String>,
    /// Entries this network owns after dedup, in first-seen order
    pub entries: Vec<String>,
    pub stats: NetworkStats,
}

/// Everything one build produced
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub networks: Vec<NetworkFile>,
    pub duplicates: Vec<DuplicateRecord>,
    pub invalid_lines: Vec<InvalidLineRecord>,
    pub dropped_certs: Vec<DroppedCertRecord>,
    pub missing_sources: Vec<String>,
    pub changes: ChangeReport,
}

impl BuildResult {
    pub fn issue_counts(&self) -> IssueCounts {
        IssueCounts {
            duplicates: self.duplicates.len(),
            invalid_lines: self.invalid_lines.len(),
            dropped_certs: self.dropped_certs.len(),
            missing_sources: self.missing_sources.len(),
        }
    }

    pub fn network(&self, name: &str) -> Option<&NetworkFile> {
        self.networks.iter().find(|n| n.name == name)
    }

    pub fn total_entries(&self) -> usize {
        self.networks.iter().map(|n| n.entries.len()).sum()
    }
}

/// Bookkeeping shared across every network of a single build.
///
/// Networks must be fed in declaration order; dedup attribution depends on it.
pub struct BuildContext {
    normalizer: LineNormalizer,
    dedup: Deduplicator,
    duplicates: Vec<DuplicateRecord>,
    invalid_lines: Vec<InvalidLineRecord>,
    dropped_certs: Vec<DroppedCertRecord>,
    missing_sources: Vec<String>,
}

impl BuildContext {
    pub fn new(policy: CertPolicy) -> Self {
        Self {
            normalizer: LineNormalizer::new(policy),
            dedup: Deduplicator::new(),
            duplicates: Vec::new(),
            invalid_lines: Vec::new(),
            dropped_certs: Vec::new(),
            missing_sources: Vec::new(),
        }
    }

    /// `lines` is `None` when the source file was missing.
    pub fn process_network(&mut self, source: &NetworkSource, lines: Option<Vec<String>>) -> NetworkFile {
        let mut file = NetworkFile {
            name: source.name.clone(),
            path: source.path.clone(),
            loaded: lines.is_some(),
            valid_entries: Vec::new(),
            entries: Vec::new(),
            stats: NetworkStats::default(),
        };

        let Some(lines) = lines else {
            self.missing_sources.push(source.name.clone());
            return file;
        };

        for line in lines {
            file.stats.seen += 1;

            let normalized = match self.normalizer.normalize(&line) {
                Ok(normalized) => normalized,
                Err(reason) => {
                    debug!(network = %source.name, %reason, "Rejected line: {}", line);
                    file.stats.invalid += 1;
                    self.invalid_lines.push(InvalidLineRecord {
                        network: source.name.clone(),
                        line,
                        reason,
                    });
                    continue;
                }
            };

            let canonical = normalized.canonical();
            if let Some(removed_cert) = normalized.dropped_cert {
                file.stats.dropped_certs += 1;
                self.dropped_certs.push(DroppedCertRecord {
                    network: source.name.clone(),
                    line: line.clone(),
                    removed_cert,
                });
            }
            file.valid_entries.push(canonical.clone());

            match self.dedup.admit(&canonical, &source.name) {
                Admission::Fresh => {
                    file.stats.kept += 1;
                    file.entries.push(canonical);
                }
                Admission::Duplicate(record) => {
                    file.stats.duplicates += 1;
                    self.duplicates.push(record);
                }
            }
        }

        if file.stats.skipped() > 0 {
            warn!(
                network = %source.name,
                invalid = file.stats.invalid,
                duplicates = file.stats.duplicates,
                "Skipped lines while processing network"
            );
        }

        let network = source.name.clone();
        counter!("ads_lines_seen_total", "network" => network.clone()).increment(file.stats.seen as u64);
        counter!("ads_entries_kept_total", "network" => network.clone()).increment(file.stats.kept as u64);
        counter!("ads_lines_invalid_total", "network" => network.clone()).increment(file.stats.invalid as u64);
        counter!("ads_lines_duplicate_total", "network" => network).increment(file.stats.duplicates as u64);

        file
    }

    pub fn finish(self, networks: Vec<NetworkFile>, changes: ChangeReport) -> BuildResult {
        BuildResult {
            networks,
            duplicates: self.duplicates,
            invalid_lines: self.invalid_lines,
            dropped_certs: self.dropped_certs,
            missing_sources: self.missing_sources,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_process_network_counts() {
        let mut ctx = BuildContext::new(CertPolicy::Drop);
        let source = NetworkSource::new("Admob", "admob.txt");
        let file = ctx.process_network(
            &source,
            lines(&[
                "google.com, pub-1, DIRECT, f08c47fec0942fa0",
                "GOOGLE.com,pub-1,direct,F08C47FEC0942FA0",
                "bad line",
                "appnexus.com, 7, RESELLER, nope",
            ]),
        );

        assert_eq!(file.stats.seen, 4);
        assert_eq!(file.stats.kept, 2);
        assert_eq!(file.stats.duplicates, 1);
        assert_eq!(file.stats.invalid, 1);
        assert_eq!(file.stats.dropped_certs, 1);
        assert_eq!(file.valid_entries.len(), 3);
        assert_eq!(
            file.entries,
            vec![
                "google.com, pub-1, DIRECT, f08c47fec0942fa0".to_string(),
                "appnexus.com, 7, RESELLER".to_string(),
            ]
        );

        let result = ctx.finish(vec![file], ChangeReport::default());
        assert_eq!(result.duplicates[0].first_network, "Admob");
        assert_eq!(result.duplicates[0].colliding_network, "Admob");
        assert_eq!(result.invalid_lines[0].reason, InvalidReason::FieldCount(1));
        assert_eq!(result.dropped_certs[0].removed_cert, "nope");
    }

    #[test]
    fn test_missing_source_recorded() {
        let mut ctx = BuildContext::new(CertPolicy::Drop);
        let file = ctx.process_network(&NetworkSource::new("Meta", "meta.txt"), None);
        assert!(!file.loaded);

        let result = ctx.finish(vec![file], ChangeReport::default());
        assert_eq!(result.missing_sources, vec!["Meta".to_string()]);
        assert_eq!(result.issue_counts().missing_sources, 1);
        assert_eq!(result.issue_counts().blocking(), 0);
    }

    #[test]
    fn test_cross_network_duplicate_attribution() {
        let mut ctx = BuildContext::new(CertPolicy::Drop);
        let a = ctx.process_network(&NetworkSource::new("A", "a.txt"), lines(&["x.com, 1, DIRECT"]));
        let b = ctx.process_network(&NetworkSource::new("B", "b.txt"), lines(&["X.COM, 1, direct"]));

        assert_eq!(a.entries.len(), 1);
        assert!(b.entries.is_empty());
        assert_eq!(b.valid_entries, vec!["x.com, 1, DIRECT".to_string()]);

        let result = ctx.finish(vec![a, b], ChangeReport::default());
        assert_eq!(
            result.duplicates,
            vec![DuplicateRecord {
                entry: "x.com, 1, DIRECT".to_string(),
                first_network: "A".to_string(),
                colliding_network: "B".to_string(),
            }]
        );
    }
}

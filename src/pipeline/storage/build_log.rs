use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;

use crate::pipeline::context::BuildResult;
use crate::pipeline::processing::quality_gate::GateAssessment;

/// Run metadata printed at the top of the build log
#[derive(Debug, Clone)]
pub struct BuildLogHeader {
    pub built_at: DateTime<Utc>,
    pub environment: String,
    pub output_path: PathBuf,
    pub output_sha256: String,
}

#[derive(Default)]
struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn section<T>(&mut self, title: &str, items: &[T], mut write: impl FnMut(&mut Self, &T)) {
        self.line(title);
        if items.is_empty() {
            self.line("None");
            self.blank();
            return;
        }
        for item in items {
            write(self, item);
        }
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.blank();
        }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Human-readable summary of one build, overwritten on every run.
pub fn render(header: &BuildLogHeader, result: &BuildResult, gate: &GateAssessment) -> String {
    let mut log = LogBuffer::default();

    log.line(format!(
        "BUILD: {}",
        header.built_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    log.line(format!("ENV: {}", header.environment));
    log.line(format!("OUTPUT: {}", header.output_path.display()));
    log.line(format!("SHA256: {}", header.output_sha256));
    log.line(format!("ENTRIES: {}", result.total_entries()));
    log.blank();

    log.section("CHANGE SUMMARY", &result.changes.networks, |log, change| {
        let skipped = result
            .network(&change.network)
            .map_or(0, |n| n.stats.skipped());
        let mut line = format!(
            "{}: +{} / -{} / Δ{:+} (total {}, skipped {})",
            change.network, change.added, change.removed, change.net, change.total, skipped
        );
        if result.missing_sources.contains(&change.network) {
            line.push_str(" [source missing]");
        }
        log.line(line);
    });

    log.section("RETIRED NETWORKS", &result.changes.retired, |log, retired| {
        log.line(format!("{}: -{} entries", retired.network, retired.entries));
    });

    log.section("MISSING SOURCES", &result.missing_sources, |log, network| {
        let path = result
            .network(network)
            .map(|n| n.path.display().to_string())
            .unwrap_or_default();
        log.line(format!("{}: {}", network, path));
    });

    log.section("DUPLICATES", &result.duplicates, |log, dup| {
        log.line("DUPLICATE ENTRY:");
        log.line(dup.entry.clone());
        log.line(format!("• first seen in: {}", dup.first_network));
        log.line(format!("• skipped from: {}", dup.colliding_network));
        log.blank();
    });

    log.section("INVALID CERT IDS REMOVED", &result.dropped_certs, |log, dropped| {
        log.line(format!(
            "INVALID CERT ID REMOVED [{}]: {}",
            dropped.network, dropped.removed_cert
        ));
        log.line(dropped.line.clone());
        log.blank();
    });

    log.section("INVALID LINES", &result.invalid_lines, |log, invalid| {
        log.line(format!("INVALID LINE [{}]: {}", invalid.network, invalid.reason));
        log.line(invalid.line.clone());
        log.blank();
    });

    log.line(format!("GATE: {}", gate.decision.as_str()));
    log.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::domain::NetworkSource;
    use crate::pipeline::context::BuildContext;
    use crate::pipeline::processing::change_report::{ChangeReport, PreviousOutput};
    use crate::pipeline::processing::normalize::CertPolicy;
    use crate::pipeline::processing::quality_gate::{BuildGate, QualityGate};
    use chrono::TimeZone;

    fn to_lines(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    fn build(lines_a: &[&str], lines_b: &[&str], previous: &str) -> BuildResult {
        let mut ctx = BuildContext::new(CertPolicy::Drop);
        let a = ctx.process_network(&NetworkSource::new("Admob", "ads/admob.txt"), to_lines(lines_a));
        let b = ctx.process_network(&NetworkSource::new("Meta", "ads/meta.txt"), to_lines(lines_b));
        let changes = ChangeReport::compare(
            &PreviousOutput::parse(previous),
            [(a.name.as_str(), a.entries.as_slice()), (b.name.as_str(), b.entries.as_slice())],
        );
        ctx.finish(vec![a, b], changes)
    }

    fn header() -> BuildLogHeader {
        BuildLogHeader {
            built_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
            environment: "test".to_string(),
            output_path: PathBuf::from("app-ads.test.txt"),
            output_sha256: "abc".to_string(),
        }
    }

    #[test]
    fn test_clean_build_log() {
        let result = build(&["google.com, pub-1, DIRECT"], &["facebook.com, 9, DIRECT"], "");
        let gate = BuildGate::new(Environment::default()).assess(&result.issue_counts());
        let text = render(&header(), &result, &gate);

        assert!(text.starts_with("BUILD: 2026-10-16T09:30:00Z\nENV: test\nOUTPUT: app-ads.test.txt\n"));
        assert!(text.contains("Admob: +1 / -0 / Δ+1 (total 1, skipped 0)"));
        assert!(text.contains("DUPLICATES\nNone\n"));
        assert!(text.contains("INVALID LINES\nNone\n"));
        assert!(text.ends_with("GATE: PASS\n"));
    }

    #[test]
    fn test_issues_are_listed() {
        let result = build(
            &["google.com, pub-1, DIRECT", "oops"],
            &["google.com, pub-1, DIRECT", "facebook.com, 9, DIRECT, bad"],
            "## Admob\nold.com, 1, DIRECT\n",
        );
        let gate = BuildGate::new(Environment::Production).assess(&result.issue_counts());
        let text = render(&header(), &result, &gate);

        assert!(text.contains("Admob: +1 / -1 / Δ+0 (total 1, skipped 1)"));
        assert!(text.contains(
            "DUPLICATE ENTRY:\ngoogle.com, pub-1, DIRECT\n• first seen in: Admob\n• skipped from: Meta\n"
        ));
        assert!(text.contains("INVALID CERT ID REMOVED [Meta]: bad\nfacebook.com, 9, DIRECT, bad\n"));
        assert!(text.contains("INVALID LINE [Admob]: expected 3 or 4 fields, found 1\noops\n"));
        assert!(text.ends_with("GATE: FAIL\n"));
    }
}

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::domain::NetworkSource;
use crate::error::{BuildError, Result};
use crate::pipeline::ingestion::source_loader;
use crate::pipeline::processing::normalize::CertPolicy;

/// On-disk shape of `ads.toml`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_output_file")]
    output_file: PathBuf,
    #[serde(default = "default_log_dir")]
    log_dir: PathBuf,
    ads_dir: Option<PathBuf>,
    #[serde(default)]
    cert_policy: CertPolicy,
    #[serde(default)]
    networks: Vec<NetworkSource>,
}

fn default_output_file() -> PathBuf {
    PathBuf::from(constants::DEFAULT_OUTPUT_FILE)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_LOG_DIR)
}

/// Resolved build configuration. All paths are already joined onto the
/// directory holding the config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_file: PathBuf,
    pub log_dir: PathBuf,
    pub cert_policy: CertPolicy,
    /// Declaration order drives output order and dedup attribution.
    pub networks: Vec<NetworkSource>,
}

impl Config {
    pub fn new(networks: Vec<NetworkSource>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
            log_dir: default_log_dir(),
            cert_policy: CertPolicy::default(),
            networks,
        }
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_cert_policy(mut self, cert_policy: CertPolicy) -> Self {
        self.cert_policy = cert_policy;
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BuildError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&content, base_dir)
    }

    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;

        let mut config = Self {
            output_file: base_dir.join(file.output_file),
            log_dir: base_dir.join(file.log_dir),
            cert_policy: file.cert_policy,
            networks: file
                .networks
                .into_iter()
                .map(|n| NetworkSource::new(n.name.trim(), base_dir.join(n.path)))
                .collect(),
        };

        if config.networks.is_empty() {
            let dir = match &file.ads_dir {
                Some(dir) => base_dir.join(dir),
                None => {
                    return Err(BuildError::Config(
                        "no networks configured and no ads_dir to discover them from".to_string(),
                    ))
                }
            };
            let discovered = source_loader::discover_sources(&dir)?;
            let networks: Vec<NetworkSource> = discovered
                .into_iter()
                .filter(|source| {
                    let generated = config.is_generated_output(&source.path);
                    if generated {
                        debug!("Skipping generated manifest {}", source.path.display());
                    }
                    !generated
                })
                .collect();
            config.networks = networks;
            debug!(
                "Discovered {} network source(s) in {}",
                config.networks.len(),
                dir.display()
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Network names become `## <name>` headers in the manifest, so they must
    /// read back identically: no line breaks, no surrounding whitespace.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for network in &self.networks {
            if network.name.is_empty() {
                return Err(BuildError::Config(format!(
                    "network for '{}' has an empty name",
                    network.path.display()
                )));
            }
            if network.name.contains(['\n', '\r']) || network.name.trim() != network.name {
                return Err(BuildError::Config(format!(
                    "network name {:?} has line breaks or surrounding whitespace",
                    network.name
                )));
            }
            if !names.insert(network.name.as_str()) {
                return Err(BuildError::Config(format!(
                    "network '{}' is declared more than once",
                    network.name
                )));
            }
        }
        Ok(())
    }

    /// Whether `path` is the manifest this config writes, for any environment:
    /// `app-ads.txt` itself or a tagged `app-ads.<tag>.txt` next to it.
    pub fn is_generated_output(&self, path: &Path) -> bool {
        if path.parent() != self.output_file.parent() {
            return false;
        }
        let (Some(name), Some(output_name)) = (
            path.file_name().and_then(|s| s.to_str()),
            self.output_file.file_name().and_then(|s| s.to_str()),
        ) else {
            return false;
        };
        if name == output_name {
            return true;
        }
        let stem = self
            .output_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(output_name);
        let Some(rest) = name.strip_prefix(stem).and_then(|r| r.strip_prefix('.')) else {
            return false;
        };
        match self.output_file.extension().and_then(|s| s.to_str()) {
            Some(ext) => rest
                .strip_suffix(ext)
                .and_then(|tag| tag.strip_suffix('.'))
                .is_some_and(|tag| !tag.is_empty()),
            None => !rest.is_empty() && !rest.contains('.'),
        }
    }

    /// Production writes the configured file; any other environment gets its
    /// tag spliced in before the extension (`app-ads.txt` -> `app-ads.test.txt`).
    pub fn output_path_for(&self, env: &Environment) -> PathBuf {
        if env.is_production() {
            return self.output_file.clone();
        }
        let stem = self
            .output_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match self.output_file.extension() {
            Some(ext) => format!("{}.{}.{}", stem, env.tag(), ext.to_string_lossy()),
            None => format!("{}.{}", stem, env.tag()),
        };
        self.output_file.with_file_name(file_name)
    }

    pub fn build_log_path(&self) -> PathBuf {
        self.log_dir.join(constants::BUILD_LOG_FILE)
    }
}

/// Selects whether recorded issues are fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Production,
    Named(String),
}

impl Environment {
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        match tag.to_ascii_lowercase().as_str() {
            "prod" | "production" => Environment::Production,
            "" => Environment::Named(constants::DEFAULT_ENV.to_string()),
            _ => Environment::Named(tag.to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn tag(&self) -> &str {
        match self {
            Environment::Production => constants::PRODUCTION_ENV,
            Environment::Named(tag) => tag,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Named(constants::DEFAULT_ENV.to_string())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

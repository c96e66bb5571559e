use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Seller relationship declared by an authorization record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relationship {
    Direct,
    Reseller,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Direct => "DIRECT",
            Relationship::Reseller => "RESELLER",
        }
    }
}

impl FromStr for Relationship {
    type Err = ();

    /// Expects an already upper-cased token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIRECT" => Ok(Relationship::Direct),
            "RESELLER" => Ok(Relationship::Reseller),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authorized-seller record after normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NetworkEntry {
    /// Lower-cased advertising system domain
    pub domain: String,
    /// Seller account id, kept verbatim
    pub publisher_id: String,
    pub relationship: Relationship,
    /// Only present when it passed the length and charset check
    pub certification_id: Option<String>,
}

impl NetworkEntry {
    /// Canonical comma-joined form used both as the dedup key and the output line
    pub fn canonical(&self) -> String {
        let mut line = format!(
            "{}, {}, {}",
            self.domain, self.publisher_id, self.relationship
        );
        if let Some(cert) = &self.certification_id {
            line.push_str(", ");
            line.push_str(cert);
        }
        line
    }
}

impl fmt::Display for NetworkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// A configured network and the file its seller list is read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSource {
    pub name: String,
    pub path: PathBuf,
}

impl NetworkSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_without_cert() {
        let entry = NetworkEntry {
            domain: "google.com".to_string(),
            publisher_id: "pub-1".to_string(),
            relationship: Relationship::Direct,
            certification_id: None,
        };
        assert_eq!(entry.canonical(), "google.com, pub-1, DIRECT");
    }

    #[test]
    fn test_canonical_with_cert() {
        let entry = NetworkEntry {
            domain: "google.com".to_string(),
            publisher_id: "pub-1".to_string(),
            relationship: Relationship::Reseller,
            certification_id: Some("f08c47fec0942fa0".to_string()),
        };
        assert_eq!(entry.to_string(), "google.com, pub-1, RESELLER, f08c47fec0942fa0");
    }

    #[test]
    fn test_relationship_parses_only_upper_tokens() {
        assert_eq!("DIRECT".parse::<Relationship>(), Ok(Relationship::Direct));
        assert_eq!("RESELLER".parse::<Relationship>(), Ok(Relationship::Reseller));
        assert!("direct".parse::<Relationship>().is_err());
        assert!("PARTNER".parse::<Relationship>().is_err());
    }
}

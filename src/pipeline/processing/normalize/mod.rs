use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::domain::{NetworkEntry, Relationship};

static DOMAIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9.-]+$").expect("valid domain pattern"));
static CERT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+$").expect("valid cert id pattern"));

/// What to do with a line whose certification id fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertPolicy {
    /// Keep the line, strip the certification id
    #[default]
    Drop,
    /// Reject the whole line as invalid
    Reject,
}

/// Why a candidate line was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum InvalidReason {
    #[error("expected 3 or 4 fields, found {0}")]
    FieldCount(usize),

    #[error("empty {0} field")]
    EmptyField(&'static str),

    #[error("invalid domain '{0}'")]
    InvalidDomain(String),

    #[error("invalid relationship '{0}'")]
    InvalidRelationship(String),

    #[error("invalid certification id '{0}'")]
    InvalidCertificationId(String),
}

/// A line that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub entry: NetworkEntry,
    /// Set when the certification id failed validation and was stripped
    pub dropped_cert: Option<String>,
}

impl Normalized {
    pub fn canonical(&self) -> String {
        self.entry.canonical()
    }
}

/// Parses and canonicalizes `domain, publisherId, relationship[, certId]` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineNormalizer {
    pub policy: CertPolicy,
}

impl LineNormalizer {
    pub fn new(policy: CertPolicy) -> Self {
        Self { policy }
    }

    pub fn normalize(&self, line: &str) -> Result<Normalized, InvalidReason> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if !(3..=4).contains(&fields.len()) {
            return Err(InvalidReason::FieldCount(fields.len()));
        }

        let (domain, publisher_id, relationship) = (fields[0], fields[1], fields[2]);
        if domain.is_empty() {
            return Err(InvalidReason::EmptyField("domain"));
        }
        if publisher_id.is_empty() {
            return Err(InvalidReason::EmptyField("publisher id"));
        }
        if relationship.is_empty() {
            return Err(InvalidReason::EmptyField("relationship"));
        }

        let domain = domain.to_lowercase();
        if !DOMAIN_PATTERN.is_match(&domain) {
            return Err(InvalidReason::InvalidDomain(domain));
        }

        let relationship_token = relationship.to_uppercase();
        let relationship = relationship_token
            .parse::<Relationship>()
            .map_err(|_| InvalidReason::InvalidRelationship(relationship_token.clone()))?;

        // A trailing comma leaves an empty fourth field; that is "no cert", not a bad one.
        let raw_cert = fields.get(3).copied().filter(|c| !c.is_empty());
        let (certification_id, dropped_cert) = match raw_cert {
            None => (None, None),
            Some(raw) => {
                let cert = raw.to_lowercase();
                if is_valid_cert_id(&cert) {
                    (Some(cert), None)
                } else {
                    match self.policy {
                        CertPolicy::Drop => (None, Some(raw.to_string())),
                        CertPolicy::Reject => {
                            return Err(InvalidReason::InvalidCertificationId(raw.to_string()))
                        }
                    }
                }
            }
        };

        Ok(Normalized {
            entry: NetworkEntry {
                domain,
                publisher_id: publisher_id.to_string(),
                relationship,
                certification_id,
            },
            dropped_cert,
        })
    }
}

/// Expects an already lower-cased id.
pub fn is_valid_cert_id(cert: &str) -> bool {
    constants::CERT_ID_LENGTHS.contains(&cert.len()) && CERT_ID_PATTERN.is_match(cert)
}

use serde::Serialize;
use std::collections::HashMap;

/// A later occurrence of an entry that some network already claimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub entry: String,
    pub first_network: String,
    pub colliding_network: String,
}

/// Outcome of offering one canonical entry to the deduplicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Fresh,
    Duplicate(DuplicateRecord),
}

/// First-claim-wins registry of canonical entries across all networks.
///
/// Attribution depends on call order, so entries must be offered in network
/// declaration order and then file order.
#[derive(Debug, Default)]
pub struct Deduplicator {
    first_seen: HashMap<String, String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, entry: &str, network: &str) -> Admission {
        match self.first_seen.get(entry) {
            Some(first) => Admission::Duplicate(DuplicateRecord {
                entry: entry.to_string(),
                first_network: first.clone(),
                colliding_network: network.to_string(),
            }),
            None => {
                self.first_seen.insert(entry.to_string(), network.to_string());
                Admission::Fresh
            }
        }
    }
}

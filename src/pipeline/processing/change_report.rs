use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::constants;

/// Per-network entry sets recovered from a previously written manifest
#[derive(Debug, Default, Clone)]
pub struct PreviousOutput {
    /// Header order as it appeared in the file
    order: Vec<String>,
    sets: HashMap<String, HashSet<String>>,
}

impl PreviousOutput {
    /// Lines beginning with `## ` open a network block; every following
    /// non-empty line belongs to that block. Lines before the first header are
    /// ignored. A repeated header merges into the earlier block.
    pub fn parse(content: &str) -> Self {
        let mut previous = PreviousOutput::default();
        let mut current: Option<String> = None;

        for raw in content.lines() {
            if let Some(name) = raw.strip_prefix(constants::NETWORK_HEADER_PREFIX) {
                let name = name.trim().to_string();
                if !previous.sets.contains_key(&name) {
                    previous.order.push(name.clone());
                    previous.sets.insert(name.clone(), HashSet::new());
                }
                current = Some(name);
                continue;
            }

            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = &current {
                if let Some(set) = previous.sets.get_mut(name) {
                    set.insert(line.to_string());
                }
            }
        }

        previous
    }

    pub fn entries(&self, network: &str) -> Option<&HashSet<String>> {
        self.sets.get(network)
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Delta for one configured network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub network: String,
    pub added: usize,
    pub removed: usize,
    pub net: i64,
    pub total: usize,
}

/// A network present in the previous manifest but no longer configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetiredNetwork {
    pub network: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub networks: Vec<ChangeSummary>,
    pub retired: Vec<RetiredNetwork>,
}

impl ChangeReport {
    /// `current` is every configured network in declaration order paired with
    /// the entries it now contributes.
    pub fn compare<'a, I>(previous: &PreviousOutput, current: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let empty = HashSet::new();
        let mut configured = HashSet::new();
        let mut networks = Vec::new();

        for (name, entries) in current {
            configured.insert(name);
            let old = previous.entries(name).unwrap_or(&empty);
            let new: HashSet<&str> = entries.iter().map(String::as_str).collect();

            let added = new.iter().filter(|e| !old.contains(**e)).count();
            let removed = old.iter().filter(|e| !new.contains(e.as_str())).count();

            networks.push(ChangeSummary {
                network: name.to_string(),
                added,
                removed,
                net: added as i64 - removed as i64,
                total: new.len(),
            });
        }

        let retired = previous
            .networks()
            .filter(|name| !configured.contains(*name))
            .map(|name| RetiredNetwork {
                network: name.to_string(),
                entries: previous.entries(name).map_or(0, HashSet::len),
            })
            .collect();

        Self { networks, retired }
    }

    pub fn is_unchanged(&self) -> bool {
        self.retired.is_empty() && self.networks.iter().all(|n| n.added == 0 && n.removed == 0)
    }

    pub fn get(&self, network: &str) -> Option<&ChangeSummary> {
        self.networks.iter().find(|n| n.network == network)
    }
}

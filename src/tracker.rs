// src/tracker.rs

//! Denormalized step-metadata table for auditing.
//!
//! Read-only consumer of the DAG and the graph algorithms; nothing here
//! affects planning or execution.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::dag::{Dag, all_nodes, reverse_graph};
use crate::errors::Result;
use crate::step::uri::{Scheme, StepUri};

/// One row of the tracker table.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub scheme: Scheme,
    /// Path segments for catalog-style paths (`channel/namespace/version/dataset`).
    pub channel: Option<String>,
    pub namespace: Option<String>,
    pub version: Option<String>,
    pub dataset: Option<String>,
    pub direct_dependencies: Vec<String>,
    pub direct_usages: Vec<String>,
    /// Every step that (indirectly) depends on this one.
    pub all_usages: Vec<String>,
}

#[derive(Debug)]
pub struct VersionTracker {
    records: BTreeMap<String, StepRecord>,
}

impl VersionTracker {
    pub fn from_dag(dag: &Dag) -> Result<Self> {
        let reversed = reverse_graph(dag);
        let mut records = BTreeMap::new();

        for name in all_nodes(dag) {
            let uri = StepUri::from_str(&name)?;
            let segments: Vec<&str> = uri.path.split('/').collect();

            let (channel, namespace, version, dataset) = match segments.as_slice() {
                [channel, namespace, version, dataset, ..] => (
                    Some(channel.to_string()),
                    Some(namespace.to_string()),
                    Some(version.to_string()),
                    Some(dataset.to_string()),
                ),
                _ => (None, None, None, None),
            };

            let direct_dependencies: Vec<String> = dag
                .get(&name)
                .map(|deps| deps.iter().cloned().collect())
                .unwrap_or_default();
            let direct_usages: Vec<String> = reversed
                .get(&name)
                .map(|users| users.iter().cloned().collect())
                .unwrap_or_default();
            let all_usages = transitive_usages(&reversed, &name);

            records.insert(
                name.clone(),
                StepRecord {
                    name,
                    scheme: uri.scheme,
                    channel,
                    namespace,
                    version,
                    dataset,
                    direct_dependencies,
                    direct_usages,
                    all_usages,
                },
            );
        }

        Ok(Self { records })
    }

    pub fn get(&self, name: &str) -> Option<&StepRecord> {
        self.records.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.values()
    }

    /// Latest known version per (scheme, channel, namespace, dataset).
    pub fn latest_versions(&self) -> BTreeMap<(String, String, String, String), String> {
        let mut latest: BTreeMap<(String, String, String, String), String> = BTreeMap::new();
        for record in self.records.values() {
            let (Some(channel), Some(namespace), Some(version), Some(dataset)) = (
                &record.channel,
                &record.namespace,
                &record.version,
                &record.dataset,
            ) else {
                continue;
            };
            let key = (
                record.scheme.as_str().to_string(),
                channel.clone(),
                namespace.clone(),
                dataset.clone(),
            );
            match latest.get_mut(&key) {
                Some(existing) if existing.as_str() >= version.as_str() => {}
                _ => {
                    latest.insert(key, version.clone());
                }
            }
        }
        latest
    }

    /// Advisory findings: steps superseded by a newer version of the same
    /// dataset but still used by other steps. Never fatal.
    pub fn audit(&self) -> Vec<String> {
        let latest = self.latest_versions();
        let mut findings = Vec::new();

        for record in self.records.values() {
            let (Some(channel), Some(namespace), Some(version), Some(dataset)) = (
                &record.channel,
                &record.namespace,
                &record.version,
                &record.dataset,
            ) else {
                continue;
            };
            let key = (
                record.scheme.as_str().to_string(),
                channel.clone(),
                namespace.clone(),
                dataset.clone(),
            );
            if let Some(newest) = latest.get(&key) {
                if newest.as_str() > version.as_str() && !record.all_usages.is_empty() {
                    findings.push(format!(
                        "step '{}' is superseded by version {} but still used by {} step(s)",
                        record.name,
                        newest,
                        record.all_usages.len()
                    ));
                }
            }
        }

        findings
    }
}

fn transitive_usages(reversed: &Dag, name: &str) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut stack: Vec<String> = reversed
        .get(name)
        .map(|users| users.iter().cloned().collect())
        .unwrap_or_default();

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(users) = reversed.get(&current) {
            stack.extend(users.iter().cloned());
        }
    }

    seen.into_iter().collect()
}

//! Plugin dependency graph.
//!
//! Edges point from dependent to dependency: if A depends on B, the edge is
//! `A -> B`. Removing a plugin also removes the dependencies that were only
//! installed for it, dependents first.

use std::collections::{BTreeMap, BTreeSet};

use crate::metadata::FetchJson;

#[derive(Debug, Clone, Default)]
pub struct PluginGraph {
    /// Plugin id to whether it was installed on request
    nodes: BTreeMap<String, bool>,
    /// Key depends on each value
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl PluginGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of everything recorded in `fetch.json`
    pub fn from_fetch_json(fetch: &FetchJson) -> Self {
        let mut graph = Self::new();
        for (id, record) in fetch.iter() {
            graph.add_plugin(id, record.is_top_level);
        }
        for (id, record) in fetch.iter() {
            for dep in &record.dependencies {
                graph.add_edge(id, dep);
            }
        }
        graph
    }

    /// Add a plugin. An existing plugin keeps its edges.
    pub fn add_plugin(&mut self, id: &str, is_top_level: bool) {
        self.nodes.insert(id.to_string(), is_top_level);
        self.edges.entry(id.to_string()).or_default();
    }

    /// Declare that `from` depends on `to`. Edges to unknown plugins are
    /// kept but never cascade.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_top_level(&self, id: &str) -> bool {
        self.nodes.get(id).copied().unwrap_or(false)
    }

    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .get(id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Plugins that depend on `id`
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(id))
            .map(|(from, _)| from.as_str())
            .collect()
    }

    /// `targets` plus every dependency left without a reason to stay.
    ///
    /// A dependency is removed along with the targets when it was not
    /// installed on request and every plugin depending on it is being
    /// removed too. Applied until nothing more qualifies.
    pub fn removal_set(&self, targets: &[&str]) -> BTreeSet<String> {
        let mut removing: BTreeSet<String> = targets.iter().map(|t| t.to_string()).collect();
        loop {
            let orphaned: Vec<String> = self
                .nodes
                .iter()
                .filter(|(id, top_level)| !**top_level && !removing.contains(id.as_str()))
                .filter(|(id, _)| {
                    let dependents = self.dependents_of(id);
                    !dependents.is_empty() && dependents.iter().all(|d| removing.contains(*d))
                })
                .map(|(id, _)| id.clone())
                .collect();
            if orphaned.is_empty() {
                return removing;
            }
            removing.extend(orphaned);
        }
    }

    /// Order `set` so every plugin comes before its dependencies.
    ///
    /// Kahn's algorithm over the subgraph, alphabetical among plugins that
    /// are ready at the same time. Members of a cycle follow in
    /// alphabetical order.
    pub fn removal_order(&self, set: &BTreeSet<String>) -> Vec<String> {
        // Dependents still to be removed, per plugin
        let mut pending: BTreeMap<&str, usize> = set.iter().map(|id| (id.as_str(), 0)).collect();
        for id in set {
            for dep in self.dependencies_of(id) {
                if let Some(count) = pending.get_mut(dep) {
                    *count += 1;
                }
            }
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(set.len());

        while let Some(current) = ready.pop_first() {
            order.push(current.to_string());
            pending.remove(current);
            for dep in self.dependencies_of(current) {
                if let Some(count) = pending.get_mut(dep) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(dep);
                    }
                }
            }
        }

        // Cycles: whatever is left, alphabetically
        order.extend(pending.keys().map(|id| id.to_string()));
        order
    }

    /// Every plugin, dependencies before their dependents
    pub fn install_order(&self) -> Vec<String> {
        let all: BTreeSet<String> = self.nodes.keys().cloned().collect();
        let mut order = self.removal_order(&all);
        order.reverse();
        order
    }
}

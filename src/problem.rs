//! Problem definition for the Maximum Coverage Location Problem.

use crate::coverage::{CoverageModel, Weight};
use crate::error::Result;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// A demand node with its weight (population, demand, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandNode<K> {
    pub id: K,
    pub weight: Weight,
}

impl<K> DemandNode<K> {
    /// Create a new demand node.
    pub fn new(id: K, weight: Weight) -> Self {
        DemandNode { id, weight }
    }
}

/// One row of an origin/destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord<K> {
    pub origin: K,
    pub destination: K,
    pub distance: f64,
    pub time: f64,
}

/// Coverage threshold applied to a distance table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    /// Cover destinations whose distance is at most the given value.
    Distance(f64),
    /// Cover destinations whose travel time is at most the given value.
    Time(f64),
}

impl Threshold {
    fn admits<K>(&self, record: &DistanceRecord<K>) -> bool {
        match *self {
            Threshold::Distance(max) => record.distance <= max,
            Threshold::Time(max) => record.time <= max,
        }
    }
}

/// Which demand nodes each site covers.
///
/// Self-coverage is not stored here; the coverage model adds it when the
/// matrix is built.
#[derive(Debug, Clone, Default)]
pub struct CoverageRelation<K> {
    covers: HashMap<K, Vec<K>>,
}

impl<K: Clone + Eq + Hash> CoverageRelation<K> {
    /// Create an empty relation.
    pub fn new() -> Self {
        CoverageRelation {
            covers: HashMap::new(),
        }
    }

    /// Record that `site` covers `node`.
    pub fn insert(&mut self, site: K, node: K) {
        self.covers.entry(site).or_default().push(node);
    }

    /// Build from pairs that are already known to be within the threshold.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, K)>,
    {
        let mut relation = CoverageRelation::new();
        for (site, node) in pairs {
            relation.insert(site, node);
        }
        relation
    }

    /// Build from `(site, node, within_threshold)` triples.
    pub fn from_triples<I>(triples: I) -> Self
    where
        I: IntoIterator<Item = (K, K, bool)>,
    {
        Self::from_pairs(
            triples
                .into_iter()
                .filter(|(_, _, within)| *within)
                .map(|(site, node, _)| (site, node)),
        )
    }

    /// Build from a distance table, keeping the records inside `threshold`.
    pub fn from_distances<'a, I>(records: I, threshold: Threshold) -> Self
    where
        I: IntoIterator<Item = &'a DistanceRecord<K>>,
        K: 'a,
    {
        Self::from_pairs(
            records
                .into_iter()
                .filter(|record| threshold.admits(record))
                .map(|record| (record.origin.clone(), record.destination.clone())),
        )
    }

    /// Nodes covered by `site` according to the raw relation.
    pub fn covered_by(&self, site: &K) -> &[K] {
        self.covers.get(site).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Consume the relation into `(site, node)` pairs.
    pub fn into_pairs(self) -> impl Iterator<Item = (K, K)> {
        self.covers
            .into_iter()
            .flat_map(|(site, nodes)| nodes.into_iter().map(move |node| (site.clone(), node)))
    }

    /// Number of sites with at least one recorded pair.
    pub fn site_count(&self) -> usize {
        self.covers.len()
    }

    /// Number of recorded pairs.
    pub fn pair_count(&self) -> usize {
        self.covers.values().map(Vec::len).sum()
    }
}

/// A complete MCLP instance: demand, sites and coverage.
#[derive(Debug, Clone)]
pub struct Problem<K> {
    /// Demand nodes in column order
    pub demand: Vec<DemandNode<K>>,
    /// Candidate sites in row order
    pub candidates: Vec<K>,
    /// Sites that are permanently open
    pub existing_sites: Vec<K>,
    pub coverage: CoverageRelation<K>,
}

impl<K: Clone + Eq + Hash + Debug> Problem<K> {
    /// Create a problem whose candidates are every demand node that is not
    /// an existing site.
    pub fn new(
        demand: Vec<DemandNode<K>>,
        coverage: CoverageRelation<K>,
        existing_sites: Vec<K>,
    ) -> Self {
        let existing: HashSet<&K> = existing_sites.iter().collect();
        let candidates = demand
            .iter()
            .map(|node| &node.id)
            .filter(|id| !existing.contains(id))
            .unique()
            .cloned()
            .collect();

        Problem {
            demand,
            candidates,
            existing_sites,
            coverage,
        }
    }

    /// Replace the candidate universe. Existing sites and repeated ids are
    /// dropped.
    pub fn with_candidates(mut self, candidates: Vec<K>) -> Self {
        let existing: HashSet<&K> = self.existing_sites.iter().collect();
        self.candidates = candidates
            .into_iter()
            .filter(|id| !existing.contains(id))
            .unique()
            .collect();
        self
    }

    /// Demand node ids, first occurrence wins.
    pub fn node_ids(&self) -> Vec<K> {
        self.demand
            .iter()
            .map(|node| node.id.clone())
            .unique()
            .collect()
    }

    /// Demand weights keyed by node id, first occurrence wins.
    pub fn demand_weights(&self) -> HashMap<K, Weight> {
        let mut weights = HashMap::with_capacity(self.demand.len());
        for node in &self.demand {
            weights.entry(node.id.clone()).or_insert(node.weight);
        }
        weights
    }

    /// Total weight of all demand nodes.
    pub fn total_demand(&self) -> Weight {
        self.demand_weights().values().sum()
    }

    /// Nodes covered by existing sites before any candidate is opened.
    ///
    /// An existing site also covers itself when it is a demand node.
    pub fn pre_covered_nodes(&self) -> HashSet<K> {
        let weights = self.demand_weights();
        let mut covered = HashSet::new();

        for site in &self.existing_sites {
            covered.extend(self.coverage.covered_by(site).iter().cloned());
            if weights.contains_key(site) {
                covered.insert(site.clone());
            }
        }

        covered
    }

    /// Build the sparse coverage model for this instance.
    pub fn build_model(&self) -> Result<CoverageModel<K>> {
        CoverageModel::build(
            &self.candidates,
            &self.node_ids(),
            &self.demand_weights(),
            &self.coverage,
            &self.pre_covered_nodes(),
        )
    }
}

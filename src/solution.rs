//! Solution representation for the MCLP.

use crate::coverage::{CoverageModel, Weight};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;

/// A set of selected candidate rows and the demand they cover together
/// with the existing sites.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Selected candidate rows, in construction or swap order
    pub sites: Vec<usize>,
    /// Covered demand, existing sites included
    pub objective: Weight,
}

impl Solution {
    /// Create a solution from rows and an already known objective.
    pub fn new(sites: Vec<usize>, objective: Weight) -> Self {
        Solution { sites, objective }
    }

    /// Create a solution and compute its objective with the model's evaluator.
    pub fn evaluated<K>(model: &CoverageModel<K>, sites: Vec<usize>) -> Self {
        let objective = model.evaluate(&sites);
        Solution { sites, objective }
    }

    /// Number of selected sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.sites.contains(&row)
    }

    /// Selected candidate ids.
    pub fn site_ids<K: Clone + Eq + Hash + Debug>(&self, model: &CoverageModel<K>) -> Vec<K> {
        model.ids_of(&self.sites)
    }

    /// Per-site breakdown of the covered demand.
    pub fn contributions<K: Clone + Eq + Hash + Debug>(
        &self,
        model: &CoverageModel<K>,
    ) -> Vec<SiteContribution<K>> {
        let demand = model.demand();
        let pre_covered = model.initial_coverage();

        self.sites
            .iter()
            .map(|&row| {
                let site = model.candidate_id(row).clone();
                let own_column = model.node_column(&site);

                let mut contribution = SiteContribution {
                    own_demand: own_column.map_or(0, |col| demand[col]),
                    site,
                    neighbours: 0,
                    new_neighbour_demand: 0,
                    newly_covered_demand: 0,
                };

                for &col in model.matrix().row(row) {
                    let is_new = pre_covered[col] == 0;
                    if is_new {
                        contribution.newly_covered_demand += demand[col];
                    }
                    if Some(col) != own_column {
                        contribution.neighbours += 1;
                        if is_new {
                            contribution.new_neighbour_demand += demand[col];
                        }
                    }
                }

                contribution
            })
            .collect()
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        writeln!(f, "  Objective: {}", self.objective)?;
        writeln!(f, "  Sites ({}): {:?}", self.sites.len(), self.sites)
    }
}

/// What one selected site brings, measured against the existing sites only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteContribution<K> {
    pub site: K,
    /// Demand of the site's own node
    pub own_demand: Weight,
    /// Covered nodes other than the site itself
    pub neighbours: usize,
    /// Demand of neighbours not covered by an existing site
    pub new_neighbour_demand: Weight,
    /// Demand covered by this site and by no existing site
    pub newly_covered_demand: Weight,
}

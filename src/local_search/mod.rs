//! Swap local search for the MCLP.
//!
//! A move closes one selected site and opens one site from the pool (the
//! candidates that are not selected). The search keeps, for every
//! candidate, the demand it would add if it were opened right now and
//! updates it incrementally after each accepted swap.

pub mod best;
pub mod delta;
pub mod first;

use crate::config::LsStrategy;
use crate::coverage::{CoverageModel, CoverageState, Weight};
use crate::error::{MclpError, Result};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::solution::Solution;
use log::{debug, trace};
use rand::Rng;

/// A swap chosen by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMove {
    /// Position of the closed site in the selected list
    pub selected_pos: usize,
    /// Position of the opened site in the pool
    pub pool_pos: usize,
    /// Exact objective change
    pub delta: Weight,
}

/// Manages the local search phase.
#[derive(Debug, Clone, Copy)]
pub struct LocalSearch {
    pub max_iterations: usize,
    pub strategy: LsStrategy,
    /// Break ties among equally good swaps at random (best strategy only)
    pub random_tie_break: bool,
}

impl LocalSearch {
    /// Create a new local search instance.
    pub fn new(max_iterations: usize, strategy: LsStrategy) -> Self {
        LocalSearch {
            max_iterations,
            strategy,
            random_tie_break: false,
        }
    }

    /// Enable or disable random tie breaking.
    pub fn with_random_tie_break(mut self, random_tie_break: bool) -> Self {
        self.random_tie_break = random_tie_break;
        self
    }

    /// Improve the solution made of `sites` until no improving swap exists
    /// or the iteration cap is reached.
    ///
    /// With `max_iterations == 0` the sites are returned unchanged with
    /// their exact objective.
    pub fn run<K, R: Rng + ?Sized>(
        &self,
        model: &CoverageModel<K>,
        sites: &[usize],
        rng: &mut R,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Solution> {
        let mut state = SearchState::new(model, sites)?;
        debug!(
            "Local search ({}) starting at objective {}",
            self.strategy,
            state.objective()
        );

        observer.notify(&ProgressEvent::Inner {
            iteration: 0,
            max_iterations: self.max_iterations,
            objective: state.objective(),
            sampled_objectives: Vec::new(),
        })?;

        let mut iteration = 0;
        while iteration < self.max_iterations {
            iteration += 1;

            let mut sampled = Vec::new();
            let found = match self.strategy {
                LsStrategy::Best => {
                    state.best_improvement(rng, self.random_tie_break, &mut sampled)
                }
                LsStrategy::First => state.first_improvement(rng),
            };

            let swap = match found {
                Some(swap) => swap,
                None => {
                    debug!("Local search: no improving swap at iteration {}", iteration);
                    break;
                }
            };

            let before = state.objective();
            state.apply_swap(swap);
            debug_assert_eq!(state.objective(), before + swap.delta);

            observer.notify(&ProgressEvent::Inner {
                iteration,
                max_iterations: self.max_iterations,
                objective: state.objective(),
                sampled_objectives: sampled,
            })?;
        }

        debug!(
            "Local search finished after {} iterations, objective {}",
            iteration,
            state.objective()
        );
        Ok(state.into_solution())
    }
}

/// Working data of one local search run.
pub struct SearchState<'a, K> {
    model: &'a CoverageModel<K>,
    coverage: CoverageState,
    selected: Vec<usize>,
    pool: Vec<usize>,
    /// Demand each candidate would add if opened now
    potential_gain: Vec<Weight>,
    /// Demand of the closed site's uniquely covered nodes that each
    /// candidate also covers
    recovery: Vec<Weight>,
    touched: Vec<usize>,
}

impl<'a, K> SearchState<'a, K> {
    /// Rebuild coverage and potential gains for `sites`.
    pub fn new(model: &'a CoverageModel<K>, sites: &[usize]) -> Result<Self> {
        let n_candidates = model.n_candidates();
        let in_solution = check_sites(sites, n_candidates)?;

        let coverage = CoverageState::from_rows(model, sites);
        let uncovered = coverage.uncovered_demand(model.demand());
        let potential_gain = model.matrix().mul_vec(&uncovered);
        let pool = (0..n_candidates).filter(|&row| !in_solution[row]).collect();

        Ok(SearchState {
            model,
            coverage,
            selected: sites.to_vec(),
            pool,
            potential_gain,
            recovery: vec![0; n_candidates],
            touched: Vec::new(),
        })
    }

    pub fn objective(&self) -> Weight {
        self.coverage.objective()
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn pool(&self) -> &[usize] {
        &self.pool
    }

    pub fn potential_gain(&self) -> &[Weight] {
        &self.potential_gain
    }

    pub fn coverage(&self) -> &CoverageState {
        &self.coverage
    }

    /// Apply a swap: update coverage, objective and potential gains.
    pub fn apply_swap(&mut self, swap: SwapMove) {
        let removed = self.selected[swap.selected_pos];
        let added = self.pool[swap.pool_pos];
        let matrix = self.model.matrix();
        let demand = self.model.demand();

        // Nodes only `removed` covers become open opportunities, nodes
        // `added` takes over stop being ones. Shared nodes cancel out.
        let mut net_change = Vec::new();
        for &col in matrix.row(removed) {
            if self.coverage.count(col) == 1 {
                net_change.push((col, demand[col]));
            }
        }
        for &col in matrix.row(added) {
            let count = self.coverage.count(col);
            if count == 0 || (count == 1 && matrix.covers(removed, col)) {
                net_change.push((col, -demand[col]));
            }
        }
        matrix.scatter_add(&net_change, &mut self.potential_gain);

        self.coverage.remove_row(self.model, removed);
        self.coverage.add_row(self.model, added);

        self.selected[swap.selected_pos] = added;
        self.pool[swap.pool_pos] = removed;

        trace!(
            "Swap: close {} open {} (delta {}, objective {})",
            removed,
            added,
            swap.delta,
            self.coverage.objective()
        );
    }

    pub fn into_solution(self) -> Solution {
        Solution::new(self.selected, self.coverage.objective())
    }
}

/// Membership mask of `sites`, rejecting out-of-range and repeated rows.
pub(crate) fn check_sites(sites: &[usize], n_candidates: usize) -> Result<Vec<bool>> {
    let mut in_solution = vec![false; n_candidates];
    for &row in sites {
        if row >= n_candidates {
            return Err(MclpError::InvalidConfiguration(format!(
                "site row {} is out of range ({} candidates)",
                row, n_candidates
            )));
        }
        if in_solution[row] {
            return Err(MclpError::InvalidConfiguration(format!(
                "site row {} appears twice in the solution",
                row
            )));
        }
        in_solution[row] = true;
    }
    Ok(in_solution)
}

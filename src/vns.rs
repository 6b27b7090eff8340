//! Variable Neighborhood Search on top of the swap local search.
//!
//! Each outer iteration walks the neighbourhoods `k = 1..=k_max`: shake the
//! current solution with `k` random swaps, re-optimise it with local search
//! and either move there (back to `k = 1`) or try the next `k`.

use crate::config::{Config, LsStrategy};
use crate::coverage::CoverageModel;
use crate::error::Result;
use crate::local_search::{check_sites, LocalSearch};
use crate::problem::Problem;
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::solution::Solution;
use log::{debug, info};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Budgets and strategy of a VNS run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VnsParams {
    pub k_max: usize,
    pub max_iter: usize,
    pub max_no_improv: usize,
    pub max_time: Duration,
    pub ls_strategy: LsStrategy,
    /// Iteration cap of each inner local search
    pub ls_max_iter: usize,
}

impl VnsParams {
    /// Take the VNS part of a configuration.
    pub fn from_config(config: &Config) -> Self {
        VnsParams {
            k_max: config.vns_k_max,
            max_iter: config.vns_max_iter,
            max_no_improv: config.vns_max_no_improv,
            max_time: config.vns_max_time,
            ls_strategy: config.vns_ls_strategy,
            ls_max_iter: config.vns_ls_max_iter,
        }
    }
}

impl Default for VnsParams {
    fn default() -> Self {
        VnsParams::from_config(&Config::default())
    }
}

/// Why the outer loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    MaxIterations,
    NoImprovement,
    TimeLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxIterations => write!(f, "iteration limit"),
            StopReason::NoImprovement => write!(f, "no improvement"),
            StopReason::TimeLimit => write!(f, "time limit"),
        }
    }
}

/// Result of a VNS run.
#[derive(Debug, Clone)]
pub struct VnsOutcome {
    /// Incumbent solution
    pub best: Solution,
    /// Outer iterations executed
    pub iterations: usize,
    /// Number of times the incumbent improved
    pub improvements: usize,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Variable Neighborhood Search runner.
#[derive(Debug, Clone, Copy)]
pub struct Vns {
    pub params: VnsParams,
}

impl Vns {
    pub fn new(params: VnsParams) -> Self {
        Vns { params }
    }

    /// Run VNS from `initial`. Its objective is recomputed, not trusted;
    /// out-of-range or repeated rows are `InvalidConfiguration`.
    pub fn run<K, R: Rng + ?Sized>(
        &self,
        model: &CoverageModel<K>,
        initial: &Solution,
        rng: &mut R,
        observer: &mut dyn ProgressObserver,
    ) -> Result<VnsOutcome> {
        let params = &self.params;
        info!(
            "Running VNS (k_max={}, max_iter={}, max_no_improv={}, time limit {:?}, ls={})",
            params.k_max, params.max_iter, params.max_no_improv, params.max_time, params.ls_strategy
        );

        check_sites(&initial.sites, model.n_candidates())?;

        let start = Instant::now();
        let local_search =
            LocalSearch::new(params.ls_max_iter, params.ls_strategy).with_random_tie_break(true);

        let mut current = Solution::evaluated(model, initial.sites.clone());
        let mut best = current.clone();
        let mut no_improvement = 0;
        let mut iteration = 0;
        let mut improvements = 0;

        let stop_reason = loop {
            if no_improvement >= params.max_no_improv {
                break StopReason::NoImprovement;
            }
            if iteration >= params.max_iter {
                break StopReason::MaxIterations;
            }
            let elapsed = start.elapsed();
            if elapsed >= params.max_time {
                break StopReason::TimeLimit;
            }

            iteration += 1;
            let mut k = 1;

            while k <= params.k_max {
                observer.notify(&ProgressEvent::Outer {
                    iteration,
                    max_iterations: params.max_iter,
                    k,
                    best_objective: best.objective,
                    current_objective: current.objective,
                    elapsed,
                })?;

                let shaken = shake(&current.sites, model.n_candidates(), k, rng)?;
                let candidate = local_search.run(model, &shaken, rng, observer)?;

                if candidate.objective > current.objective {
                    current = candidate;
                    if current.objective > best.objective {
                        best = current.clone();
                        improvements += 1;
                        no_improvement = 0;
                        info!(
                            "New best objective {} (iteration {}, k={})",
                            best.objective, iteration, k
                        );
                    }
                    k = 1;
                } else {
                    k += 1;
                }
            }

            no_improvement += 1;
            observer.notify(&ProgressEvent::Outer {
                iteration,
                max_iterations: params.max_iter,
                k: params.k_max,
                best_objective: best.objective,
                current_objective: current.objective,
                elapsed: start.elapsed(),
            })?;
        };

        let elapsed = start.elapsed();
        info!(
            "VNS stopped ({}) after {} iterations, best objective {}",
            stop_reason, iteration, best.objective
        );

        Ok(VnsOutcome {
            best,
            iterations: iteration,
            improvements,
            stop_reason,
            elapsed,
        })
    }

    /// Build the coverage model from `problem` and run VNS from the given
    /// site ids. Prefer [`Vns::run`] with a shared model when running
    /// several stages on the same instance.
    pub fn run_on_problem<K, R>(
        &self,
        problem: &Problem<K>,
        initial: &[K],
        rng: &mut R,
        observer: &mut dyn ProgressObserver,
    ) -> Result<(Vec<K>, VnsOutcome)>
    where
        K: Clone + Eq + Hash + Debug,
        R: Rng + ?Sized,
    {
        let model = problem.build_model()?;
        let start = Solution::evaluated(&model, model.rows_of(initial)?);
        let outcome = self.run(&model, &start, rng, observer)?;
        Ok((outcome.best.site_ids(&model), outcome))
    }
}

/// Replace `k` random selected sites by `k` random pool candidates.
///
/// When the solution or the pool has fewer than `k` members the solution
/// is returned unchanged.
pub fn shake<R: Rng + ?Sized>(
    sites: &[usize],
    n_candidates: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let in_solution = check_sites(sites, n_candidates)?;
    let pool: Vec<usize> = (0..n_candidates).filter(|&row| !in_solution[row]).collect();

    if k == 0 || sites.len() < k || pool.len() < k {
        debug!(
            "Shake with k={} skipped ({} selected, {} in pool)",
            k,
            sites.len(),
            pool.len()
        );
        return Ok(sites.to_vec());
    }

    let mut shaken = sites.to_vec();
    let removed = index::sample(rng, sites.len(), k);
    let added = index::sample(rng, pool.len(), k);
    for (pos, pool_pos) in removed.iter().zip(added.iter()) {
        shaken[pos] = pool[pool_pos];
    }
    Ok(shaken)
}

//! # MCLP-VNS
//!
//! Heuristics for the Maximum Coverage Location Problem: open `p` candidate
//! sites, on top of the sites that already exist, so that the demand lying
//! within the coverage threshold of at least one open site is maximal.
//!
//! The pipeline builds a sparse coverage model once, constructs a solution
//! greedily, improves it with a swap local search and then runs a Variable
//! Neighborhood Search. Each stage can also be called on its own.

pub mod config;
pub mod coverage;
pub mod error;
pub mod greedy;
pub mod local_search;
pub mod problem;
pub mod progress;
pub mod solution;
pub mod utils;
pub mod vns;

use crate::config::Config;
use crate::coverage::{CoverageModel, Weight};
use crate::error::Result;
use crate::greedy::GreedyConstructor;
use crate::local_search::LocalSearch;
use crate::problem::Problem;
use crate::progress::{NoProgress, ProgressEvent, ProgressObserver};
use crate::solution::{SiteContribution, Solution};
use crate::utils::{RunSummary, StageResult};
use crate::vns::{Vns, VnsOutcome, VnsParams};

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

/// Pipeline stage a trace point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greedy,
    LocalSearch,
    Vns,
}

/// Objective value after one step of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePoint {
    pub stage: Stage,
    pub step: usize,
    pub objective: Weight,
}

/// Outcome of [`solve`].
#[derive(Debug, Clone, Serialize)]
pub struct SolveResult<K> {
    /// Selected candidate ids (existing sites not included)
    pub solution: Vec<K>,
    pub objective: Weight,
    pub trace: Vec<TracePoint>,
    pub summary: RunSummary,
    pub contributions: Vec<SiteContribution<K>>,
}

/// Forwards events to the caller's observer and keeps the objective trace.
struct TraceRecorder<'o> {
    inner: &'o mut dyn ProgressObserver,
    stage: Stage,
    points: Vec<TracePoint>,
}

impl<'o> TraceRecorder<'o> {
    fn new(inner: &'o mut dyn ProgressObserver) -> Self {
        TraceRecorder {
            inner,
            stage: Stage::Greedy,
            points: Vec::new(),
        }
    }

    fn record(&mut self, stage: Stage, step: usize, objective: Weight) {
        if let Some(last) = self.points.last_mut() {
            if last.stage == stage && last.step == step {
                last.objective = objective;
                return;
            }
        }
        self.points.push(TracePoint {
            stage,
            step,
            objective,
        });
    }
}

impl ProgressObserver for TraceRecorder<'_> {
    fn notify(&mut self, event: &ProgressEvent) -> Result<()> {
        match *event {
            ProgressEvent::Greedy {
                step, objective, ..
            } => self.record(Stage::Greedy, step, objective),
            ProgressEvent::Inner {
                iteration,
                objective,
                ..
            } if self.stage == Stage::LocalSearch => {
                self.record(Stage::LocalSearch, iteration, objective)
            }
            ProgressEvent::Outer {
                iteration,
                best_objective,
                ..
            } => self.record(Stage::Vns, iteration, best_objective),
            _ => {}
        }
        self.inner.notify(event)
    }
}

/// Orchestrates the Greedy → Local Search → VNS pipeline on one instance.
pub struct MclpSolver<K> {
    pub problem: Problem<K>,
    pub model: CoverageModel<K>,
    pub config: Config,
    pub p: usize,
    rng: ChaCha8Rng,
}

impl<K: Clone + Eq + Hash + Debug> MclpSolver<K> {
    /// Validate the configuration and build the coverage model.
    pub fn new(problem: Problem<K>, p: usize, config: Config) -> Result<Self> {
        config.validate(p)?;
        let seed = config.random_seed.unwrap_or_else(rand::random);
        info!("Building coverage model (random seed {})", seed);
        let model = problem.build_model()?;

        Ok(MclpSolver {
            problem,
            model,
            config,
            p,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Greedy construction stage.
    pub fn greedy(&mut self, observer: &mut dyn ProgressObserver) -> Result<Solution> {
        GreedyConstructor::new(self.p).construct(&self.model, observer)
    }

    /// Standalone local search stage, deterministic tie breaking.
    pub fn local_search(
        &mut self,
        start: &Solution,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Solution> {
        LocalSearch::new(self.config.ls_max_iter, self.config.ls_strategy).run(
            &self.model,
            &start.sites,
            &mut self.rng,
            observer,
        )
    }

    /// VNS stage.
    pub fn vns(
        &mut self,
        start: &Solution,
        observer: &mut dyn ProgressObserver,
    ) -> Result<VnsOutcome> {
        Vns::new(VnsParams::from_config(&self.config)).run(
            &self.model,
            start,
            &mut self.rng,
            observer,
        )
    }

    /// Run the full pipeline.
    pub fn run(&mut self, observer: &mut dyn ProgressObserver) -> Result<SolveResult<K>> {
        let mut recorder = TraceRecorder::new(observer);
        let mut stages = Vec::with_capacity(3);

        recorder.stage = Stage::Greedy;
        let started = Instant::now();
        let greedy = self.greedy(&mut recorder)?;
        stages.push(StageResult {
            name: "Greedy".to_string(),
            objective: greedy.objective,
            runtime: started.elapsed(),
        });

        recorder.stage = Stage::LocalSearch;
        let started = Instant::now();
        let improved = self.local_search(&greedy, &mut recorder)?;
        stages.push(StageResult {
            name: format!("Local search ({})", self.config.ls_strategy),
            objective: improved.objective,
            runtime: started.elapsed(),
        });

        recorder.stage = Stage::Vns;
        let started = Instant::now();
        let outcome = self.vns(&improved, &mut recorder)?;
        stages.push(StageResult {
            name: format!("VNS (ls: {})", self.config.vns_ls_strategy),
            objective: outcome.best.objective,
            runtime: started.elapsed(),
        });

        let summary = RunSummary {
            p: self.p,
            candidates: self.model.n_candidates(),
            demand_nodes: self.model.n_nodes(),
            existing_sites: self.problem.existing_sites.len(),
            total_demand: self.model.total_demand(),
            initial_objective: self.model.initial_objective(),
            stages,
            vns_iterations: outcome.iterations,
            stop_reason: outcome.stop_reason,
        };

        Ok(SolveResult {
            solution: outcome.best.site_ids(&self.model),
            objective: outcome.best.objective,
            trace: recorder.points,
            summary,
            contributions: outcome.best.contributions(&self.model),
        })
    }
}

/// Solve an instance with the full pipeline and no progress reporting.
pub fn solve<K: Clone + Eq + Hash + Debug>(
    problem: Problem<K>,
    p: usize,
    config: Config,
) -> Result<SolveResult<K>> {
    MclpSolver::new(problem, p, config)?.run(&mut NoProgress)
}

/// Same as [`solve`], reporting progress to `observer`.
pub fn solve_with_observer<K: Clone + Eq + Hash + Debug>(
    problem: Problem<K>,
    p: usize,
    config: Config,
    observer: &mut dyn ProgressObserver,
) -> Result<SolveResult<K>> {
    MclpSolver::new(problem, p, config)?.run(observer)
}

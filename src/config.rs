//! Configuration parameters for the MCLP heuristics.

use crate::error::{MclpError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Acceptance rule used by the swap local search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LsStrategy {
    /// Apply the single best improving swap of a full sweep.
    Best,
    /// Apply the first improving swap found.
    First,
}

impl fmt::Display for LsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LsStrategy::Best => write!(f, "best"),
            LsStrategy::First => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for LsStrategy {
    type Err = MclpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(LsStrategy::Best),
            "first" => Ok(LsStrategy::First),
            other => Err(MclpError::InvalidConfiguration(format!(
                "unknown local search strategy '{}'",
                other
            ))),
        }
    }
}

/// Configuration settings for a full Greedy → Local Search → VNS run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Iteration cap of the local search that follows the greedy stage
    pub ls_max_iter: usize,
    /// Acceptance rule of the local search that follows the greedy stage
    pub ls_strategy: LsStrategy,
    /// Largest shaking neighbourhood (number of simultaneous swaps)
    pub vns_k_max: usize,
    /// Maximum number of VNS outer iterations
    pub vns_max_iter: usize,
    /// Consecutive outer iterations without a new incumbent before stopping
    pub vns_max_no_improv: usize,
    /// Wall-clock budget of the VNS stage
    pub vns_max_time: Duration,
    /// Acceptance rule of the local search run inside VNS
    pub vns_ls_strategy: LsStrategy,
    /// Iteration cap of the local search run inside VNS
    pub vns_ls_max_iter: usize,
    /// Seed of the run's random generator; drawn at random when absent
    pub random_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ls_max_iter: 1000,
            ls_strategy: LsStrategy::Best,
            vns_k_max: 10,
            vns_max_iter: 5000,
            vns_max_no_improv: 500,
            vns_max_time: Duration::from_secs(300),
            vns_ls_strategy: LsStrategy::First,
            vns_ls_max_iter: 500,
            random_seed: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the iteration cap of the standalone local search.
    pub fn with_ls_max_iter(mut self, iterations: usize) -> Self {
        self.ls_max_iter = iterations;
        self
    }

    /// Set the acceptance rule of the standalone local search.
    pub fn with_ls_strategy(mut self, strategy: LsStrategy) -> Self {
        self.ls_strategy = strategy;
        self
    }

    /// Set the largest shaking neighbourhood.
    pub fn with_vns_k_max(mut self, k_max: usize) -> Self {
        self.vns_k_max = k_max;
        self
    }

    /// Set the maximum number of VNS outer iterations.
    pub fn with_vns_max_iter(mut self, iterations: usize) -> Self {
        self.vns_max_iter = iterations;
        self
    }

    /// Set the no-improvement cap of VNS.
    pub fn with_vns_max_no_improv(mut self, iterations: usize) -> Self {
        self.vns_max_no_improv = iterations;
        self
    }

    /// Set the wall-clock budget of VNS.
    pub fn with_vns_max_time(mut self, duration: Duration) -> Self {
        self.vns_max_time = duration;
        self
    }

    /// Set the acceptance rule of the local search run inside VNS.
    pub fn with_vns_ls_strategy(mut self, strategy: LsStrategy) -> Self {
        self.vns_ls_strategy = strategy;
        self
    }

    /// Set the iteration cap of the local search run inside VNS.
    pub fn with_vns_ls_max_iter(mut self, iterations: usize) -> Self {
        self.vns_ls_max_iter = iterations;
        self
    }

    /// Fix the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Check every parameter against the number of sites to open.
    pub fn validate(&self, p: usize) -> Result<()> {
        if p == 0 {
            return Err(invalid("p must be at least 1"));
        }
        if self.ls_max_iter == 0 {
            return Err(invalid("ls_max_iter must be greater than zero"));
        }
        if self.vns_k_max == 0 || self.vns_k_max > p {
            return Err(invalid(&format!(
                "vns_k_max must lie in [1, {}], got {}",
                p, self.vns_k_max
            )));
        }
        if self.vns_max_iter == 0 {
            return Err(invalid("vns_max_iter must be greater than zero"));
        }
        if self.vns_max_no_improv == 0 {
            return Err(invalid("vns_max_no_improv must be greater than zero"));
        }
        if self.vns_max_time.is_zero() {
            return Err(invalid("vns_max_time must be greater than zero"));
        }
        if self.vns_ls_max_iter == 0 {
            return Err(invalid("vns_ls_max_iter must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> MclpError {
    MclpError::InvalidConfiguration(message.to_string())
}

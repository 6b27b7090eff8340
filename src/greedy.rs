//! Greedy construction of an initial solution.

use crate::coverage::{CoverageModel, CoverageState, Weight};
use crate::error::Result;
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::solution::Solution;
use log::{debug, info};

/// Builds a solution by repeatedly opening the candidate with the largest
/// marginal gain.
#[derive(Debug, Clone, Copy)]
pub struct GreedyConstructor {
    /// Number of sites to open
    pub p: usize,
}

impl GreedyConstructor {
    /// Create a constructor that opens at most `p` sites.
    pub fn new(p: usize) -> Self {
        GreedyConstructor { p }
    }

    /// Run the construction.
    ///
    /// Ties are broken by the lowest row. Construction stops early when no
    /// available candidate has a positive gain, so the solution may hold
    /// fewer than `p` sites. The returned objective comes from the model's
    /// evaluator.
    pub fn construct<K>(
        &self,
        model: &CoverageModel<K>,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Solution> {
        info!(
            "Running greedy construction (p={}, {} candidates)",
            self.p,
            model.n_candidates()
        );

        let mut state = CoverageState::initial(model);
        let mut available = vec![true; model.n_candidates()];
        let mut selected = Vec::with_capacity(self.p);

        for step in 0..self.p {
            // Gain of every candidate against the currently uncovered demand.
            let uncovered = state.uncovered_demand(model.demand());
            let gains = model.matrix().mul_vec(&uncovered);

            let best = best_available(&gains, &available);
            let (row, gain) = match best {
                Some((row, gain)) if gain > 0 => (row, gain),
                _ => {
                    debug!("Greedy step {}: no candidate with positive gain", step + 1);
                    break;
                }
            };

            available[row] = false;
            selected.push(row);
            let added = state.add_row(model, row);
            debug_assert_eq!(added, gain);

            debug!(
                "Greedy step {}: row {} gains {} (objective {})",
                step + 1,
                row,
                gain,
                state.objective()
            );
            observer.notify(&ProgressEvent::Greedy {
                step: step + 1,
                total_steps: self.p,
                objective: state.objective(),
            })?;
        }

        let solution = Solution::evaluated(model, selected);
        debug_assert_eq!(solution.objective, state.objective());

        info!(
            "Greedy construction opened {} sites, objective {}",
            solution.len(),
            solution.objective
        );
        Ok(solution)
    }
}

/// Largest gain among available rows, lowest row first on ties.
fn best_available(gains: &[Weight], available: &[bool]) -> Option<(usize, Weight)> {
    let mut best: Option<(usize, Weight)> = None;
    for (row, &gain) in gains.iter().enumerate() {
        if !available[row] {
            continue;
        }
        match best {
            Some((_, best_gain)) if gain <= best_gain => {}
            _ => best = Some((row, gain)),
        }
    }
    best
}

//! Best improvement sweep.

use crate::coverage::Weight;
use rand::Rng;

use super::{SearchState, SwapMove};

impl<'a, K> SearchState<'a, K> {
    /// Find the swap with the largest positive delta over every removal and
    /// every pool candidate.
    ///
    /// Without `random_tie_break` the first maximum in scan order wins.
    /// With it, every swap reaching the maximum is equally likely
    /// (reservoir sampling over the ties). For each removal the objective
    /// reached by its best swap is pushed to `sampled`.
    pub fn best_improvement<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        random_tie_break: bool,
        sampled: &mut Vec<Weight>,
    ) -> Option<SwapMove> {
        let objective = self.objective();
        let mut best: Option<SwapMove> = None;
        let mut ties = 0u32;

        for selected_pos in 0..self.selected.len() {
            let removed = self.selected[selected_pos];
            let loss = self.scan_removal(removed);
            let mut removal_best: Option<Weight> = None;

            for pool_pos in 0..self.pool.len() {
                let delta = self.swap_delta(loss, self.pool[pool_pos]);
                if removal_best.map_or(true, |b| delta > b) {
                    removal_best = Some(delta);
                }
                if delta <= 0 {
                    continue;
                }

                let candidate = SwapMove {
                    selected_pos,
                    pool_pos,
                    delta,
                };
                match best {
                    Some(current) if delta < current.delta => {}
                    Some(current) if delta == current.delta => {
                        if random_tie_break {
                            ties += 1;
                            if rng.gen_range(0..ties) == 0 {
                                best = Some(candidate);
                            }
                        }
                    }
                    _ => {
                        best = Some(candidate);
                        ties = 1;
                    }
                }
            }

            self.clear_recovery();
            if let Some(delta) = removal_best {
                sampled.push(objective + delta);
            }
        }

        best
    }
}

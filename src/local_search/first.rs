//! First improvement sweep.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{SearchState, SwapMove};

impl<'a, K> SearchState<'a, K> {
    /// Visit removals in random order and return an improving swap for the
    /// first removal that has one, chosen uniformly among that removal's
    /// improving swaps.
    pub fn first_improvement<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<SwapMove> {
        let mut order: Vec<usize> = (0..self.selected.len()).collect();
        order.shuffle(rng);

        let mut improving = Vec::new();
        for selected_pos in order {
            let removed = self.selected[selected_pos];
            let loss = self.scan_removal(removed);

            improving.clear();
            for pool_pos in 0..self.pool.len() {
                let delta = self.swap_delta(loss, self.pool[pool_pos]);
                if delta > 0 {
                    improving.push((pool_pos, delta));
                }
            }
            self.clear_recovery();

            if let Some(&(pool_pos, delta)) = improving.choose(rng) {
                return Some(SwapMove {
                    selected_pos,
                    pool_pos,
                    delta,
                });
            }
        }

        None
    }
}

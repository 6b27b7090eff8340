//! Exact objective change of a swap.
//!
//! For a closed site `r` and an opened site `a`:
//! `delta = potential_gain[a] - loss(r) + recovery(r, a)`, where `loss(r)`
//! is the demand only `r` covers and `recovery(r, a)` the part of it `a`
//! covers as well.

use crate::coverage::Weight;

use super::SearchState;

impl<'a, K> SearchState<'a, K> {
    /// Prepare the evaluation of every swap closing `removed`.
    ///
    /// Returns `loss(removed)` and fills the recovery of every candidate
    /// covering one of the uniquely covered nodes. Call
    /// [`SearchState::clear_recovery`] before the next removal.
    pub fn scan_removal(&mut self, removed: usize) -> Weight {
        let matrix = self.model.matrix();
        let demand = self.model.demand();
        let mut loss = 0;

        for &col in matrix.row(removed) {
            if self.coverage.count(col) != 1 || demand[col] == 0 {
                continue;
            }
            loss += demand[col];
            for &row in matrix.column(col) {
                if self.recovery[row] == 0 {
                    self.touched.push(row);
                }
                self.recovery[row] += demand[col];
            }
        }

        loss
    }

    /// Objective change of opening `added` after [`SearchState::scan_removal`].
    pub fn swap_delta(&self, loss: Weight, added: usize) -> Weight {
        self.potential_gain[added] - loss + self.recovery[added]
    }

    /// Reset the recovery entries written by the last scan.
    pub fn clear_recovery(&mut self) {
        for row in self.touched.drain(..) {
            self.recovery[row] = 0;
        }
    }

    /// Evaluate a single swap from scratch. Used by tests and debugging.
    pub fn evaluate_swap(&mut self, selected_pos: usize, pool_pos: usize) -> Weight {
        let removed = self.selected[selected_pos];
        let added = self.pool[pool_pos];
        let loss = self.scan_removal(removed);
        let delta = self.swap_delta(loss, added);
        self.clear_recovery();
        delta
    }
}

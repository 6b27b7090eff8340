//! Sparse coverage model shared by every heuristic of a run.
//!
//! Candidates are rows and demand nodes are columns. The id ↔ index maps are
//! fixed when the model is built and never change afterwards.

use crate::error::{MclpError, Result};
use crate::problem::CoverageRelation;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Demand weight and objective value type.
pub type Weight = i64;

/// Boolean sparse matrix stored in compressed-sparse-row form, together
/// with its transpose so that both rows (nodes of a site) and columns
/// (sites of a node) can be walked without dense scans.
#[derive(Debug, Clone)]
pub struct CoverageMatrix {
    n_rows: usize,
    n_cols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    col_offsets: Vec<usize>,
    row_indices: Vec<usize>,
}

impl CoverageMatrix {
    /// Build a matrix from `(row, col)` entries. Duplicates are merged and
    /// entries outside the shape are ignored.
    pub fn from_pairs<I>(n_rows: usize, n_cols: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut entries: Vec<(usize, usize)> = pairs
            .into_iter()
            .filter(|&(r, c)| r < n_rows && c < n_cols)
            .collect();
        entries.sort_unstable();
        entries.dedup();

        let mut row_offsets = vec![0; n_rows + 1];
        let mut col_offsets = vec![0; n_cols + 1];
        for &(r, c) in &entries {
            row_offsets[r + 1] += 1;
            col_offsets[c + 1] += 1;
        }
        for i in 0..n_rows {
            row_offsets[i + 1] += row_offsets[i];
        }
        for j in 0..n_cols {
            col_offsets[j + 1] += col_offsets[j];
        }

        // Entries are sorted by row then column, so each row is sorted.
        let col_indices: Vec<usize> = entries.iter().map(|&(_, c)| c).collect();

        // Rows are visited in increasing order, so each column is sorted too.
        let mut row_indices = vec![0; entries.len()];
        let mut fill = col_offsets.clone();
        for &(r, c) in &entries {
            row_indices[fill[c]] = r;
            fill[c] += 1;
        }

        CoverageMatrix {
            n_rows,
            n_cols,
            row_offsets,
            col_indices,
            col_offsets,
            row_indices,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// Columns covered by `row`, sorted.
    pub fn row(&self, row: usize) -> &[usize] {
        &self.col_indices[self.row_offsets[row]..self.row_offsets[row + 1]]
    }

    /// Rows covering `col`, sorted.
    pub fn column(&self, col: usize) -> &[usize] {
        &self.row_indices[self.col_offsets[col]..self.col_offsets[col + 1]]
    }

    /// Whether `row` covers `col`.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.row(row).binary_search(&col).is_ok()
    }

    /// Dense product `M · v`, one entry per row.
    pub fn mul_vec(&self, v: &[Weight]) -> Vec<Weight> {
        (0..self.n_rows)
            .map(|r| self.row(r).iter().map(|&c| v[c]).sum())
            .collect()
    }

    /// `out += M · v` for a sparse `v` given as `(col, value)` entries.
    pub fn scatter_add(&self, v: &[(usize, Weight)], out: &mut [Weight]) {
        for &(col, value) in v {
            if value == 0 {
                continue;
            }
            for &row in self.column(col) {
                out[row] += value;
            }
        }
    }
}

/// Coverage matrix, demand vector, initial coverage and the id maps.
#[derive(Debug, Clone)]
pub struct CoverageModel<K> {
    matrix: CoverageMatrix,
    demand: Vec<Weight>,
    initial_coverage: Vec<u32>,
    candidate_ids: Vec<K>,
    node_ids: Vec<K>,
    candidate_index: HashMap<K, usize>,
    node_index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash + Debug> CoverageModel<K> {
    /// Build the model.
    ///
    /// Every candidate gets a row and covers itself when it is also a demand
    /// node. Pairs whose site is not a candidate or whose node is not in
    /// `nodes` are dropped silently, as are duplicate ids.
    pub fn build(
        candidates: &[K],
        nodes: &[K],
        demand: &HashMap<K, Weight>,
        relation: &CoverageRelation<K>,
        pre_covered: &HashSet<K>,
    ) -> Result<Self> {
        let (candidate_ids, candidate_index) = index_ids(candidates);
        let (node_ids, node_index) = index_ids(nodes);

        let mut pairs = Vec::new();
        for (row, site) in candidate_ids.iter().enumerate() {
            pairs.extend(
                relation
                    .covered_by(site)
                    .iter()
                    .filter_map(|node| node_index.get(node))
                    .map(|&col| (row, col)),
            );
            if let Some(&col) = node_index.get(site) {
                pairs.push((row, col));
            }
        }
        let matrix = CoverageMatrix::from_pairs(candidate_ids.len(), node_ids.len(), pairs);

        let mut demand_vector = vec![0; node_ids.len()];
        for (id, &weight) in demand {
            if weight < 0 {
                return Err(MclpError::NegativeDemand {
                    node: format!("{:?}", id),
                    weight,
                });
            }
            if let Some(&col) = node_index.get(id) {
                demand_vector[col] = weight;
            }
        }

        let mut initial_coverage = vec![0; node_ids.len()];
        for id in pre_covered {
            if let Some(&col) = node_index.get(id) {
                initial_coverage[col] = 1;
            }
        }

        debug!(
            "Coverage model: {} candidates x {} nodes, {} entries, {} pre-covered nodes",
            candidate_ids.len(),
            node_ids.len(),
            matrix.nnz(),
            initial_coverage.iter().filter(|&&c| c > 0).count()
        );

        Ok(CoverageModel {
            matrix,
            demand: demand_vector,
            initial_coverage,
            candidate_ids,
            node_ids,
            candidate_index,
            node_index,
        })
    }

    /// Row of a candidate id.
    pub fn candidate_row(&self, id: &K) -> Option<usize> {
        self.candidate_index.get(id).copied()
    }

    /// Column of a demand node id.
    pub fn node_column(&self, id: &K) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn candidate_id(&self, row: usize) -> &K {
        &self.candidate_ids[row]
    }

    pub fn node_id(&self, col: usize) -> &K {
        &self.node_ids[col]
    }

    pub fn candidate_ids(&self) -> &[K] {
        &self.candidate_ids
    }

    /// Map candidate ids to rows, failing on ids outside the universe.
    pub fn rows_of(&self, ids: &[K]) -> Result<Vec<usize>> {
        ids.iter()
            .map(|id| {
                self.candidate_row(id).ok_or_else(|| MclpError::UnknownCandidate {
                    id: format!("{:?}", id),
                })
            })
            .collect()
    }

    /// Map rows back to candidate ids.
    pub fn ids_of(&self, rows: &[usize]) -> Vec<K> {
        rows.iter().map(|&row| self.candidate_ids[row].clone()).collect()
    }
}

impl<K> CoverageModel<K> {
    pub fn matrix(&self) -> &CoverageMatrix {
        &self.matrix
    }

    /// Demand weight per column.
    pub fn demand(&self) -> &[Weight] {
        &self.demand
    }

    /// Pre-existing coverage per column (0 or 1).
    pub fn initial_coverage(&self) -> &[u32] {
        &self.initial_coverage
    }

    pub fn n_candidates(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn n_nodes(&self) -> usize {
        self.matrix.n_cols()
    }

    /// Sum of every demand weight in the model.
    pub fn total_demand(&self) -> Weight {
        self.demand.iter().sum()
    }

    /// Objective of the existing sites alone.
    pub fn initial_objective(&self) -> Weight {
        CoverageState::initial(self).objective()
    }

    /// Objective of a set of selected rows. This is the one evaluator every
    /// stage reports through.
    pub fn evaluate(&self, rows: &[usize]) -> Weight {
        CoverageState::from_rows(self, rows).objective()
    }
}

fn index_ids<K: Clone + Eq + Hash>(ids: &[K]) -> (Vec<K>, HashMap<K, usize>) {
    let mut ordered = Vec::with_capacity(ids.len());
    let mut index = HashMap::with_capacity(ids.len());
    for id in ids {
        if !index.contains_key(id) {
            index.insert(id.clone(), ordered.len());
            ordered.push(id.clone());
        }
    }
    (ordered, index)
}

/// Per-node coverage counts (`initial + Σ selected rows`) with the
/// objective kept in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageState {
    counts: Vec<u32>,
    objective: Weight,
}

impl CoverageState {
    /// State with only the existing sites open.
    pub fn initial<K>(model: &CoverageModel<K>) -> Self {
        let counts = model.initial_coverage().to_vec();
        let objective = covered_weight(&counts, model.demand());
        CoverageState { counts, objective }
    }

    /// State with the existing sites and `rows` open.
    pub fn from_rows<K>(model: &CoverageModel<K>, rows: &[usize]) -> Self {
        let mut counts = model.initial_coverage().to_vec();
        for &row in rows {
            for &col in model.matrix().row(row) {
                counts[col] += 1;
            }
        }
        let objective = covered_weight(&counts, model.demand());
        CoverageState { counts, objective }
    }

    /// Covered demand.
    pub fn objective(&self) -> Weight {
        self.objective
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn count(&self, col: usize) -> u32 {
        self.counts[col]
    }

    pub fn is_covered(&self, col: usize) -> bool {
        self.counts[col] > 0
    }

    /// Demand vector masked to zero on covered nodes.
    pub fn uncovered_demand(&self, demand: &[Weight]) -> Vec<Weight> {
        self.counts
            .iter()
            .zip(demand)
            .map(|(&count, &weight)| if count == 0 { weight } else { 0 })
            .collect()
    }

    /// Open `row`; returns the demand it newly covers.
    pub fn add_row<K>(&mut self, model: &CoverageModel<K>, row: usize) -> Weight {
        let mut gained = 0;
        for &col in model.matrix().row(row) {
            if self.counts[col] == 0 {
                gained += model.demand()[col];
            }
            self.counts[col] += 1;
        }
        self.objective += gained;
        gained
    }

    /// Close `row`; returns the demand that is no longer covered.
    pub fn remove_row<K>(&mut self, model: &CoverageModel<K>, row: usize) -> Weight {
        let mut lost = 0;
        for &col in model.matrix().row(row) {
            debug_assert!(self.counts[col] > 0, "closing a row that is not open");
            self.counts[col] -= 1;
            if self.counts[col] == 0 {
                lost += model.demand()[col];
            }
        }
        self.objective -= lost;
        lost
    }

    /// Objective recomputed from the counts, ignoring the running total.
    pub fn recompute_objective(&self, demand: &[Weight]) -> Weight {
        covered_weight(&self.counts, demand)
    }
}

fn covered_weight(counts: &[u32], demand: &[Weight]) -> Weight {
    counts
        .iter()
        .zip(demand)
        .filter(|(&count, _)| count > 0)
        .map(|(_, &weight)| weight)
        .sum()
}

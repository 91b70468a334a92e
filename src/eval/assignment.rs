//! Assignment-problem solvers.
//!
//! Cluster alignment reduces to a minimum-cost perfect matching on a square
//! cost matrix. The solver sits behind [`AssignmentSolver`] so the
//! combinatorial strategy can be swapped without touching alignment or scoring.
//!
//! | Solver | Optimal | Complexity |
//! |--------|---------|------------|
//! | [`Hungarian`] | yes | O(n³) |
//! | [`GreedyAssignment`] | no | O(n² log n) |

use std::fmt;

use crate::{Error, Result};

// =============================================================================
// CostMatrix
// =============================================================================

/// Square matrix of non-negative integer costs, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    size: usize,
    cells: Vec<i64>,
}

impl CostMatrix {
    /// An `n × n` matrix filled with `fill`.
    #[must_use]
    pub fn filled(size: usize, fill: i64) -> Self {
        Self {
            size,
            cells: vec![fill; size * size],
        }
    }

    /// Build from rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows do not form a square matrix.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let size = rows.len();
        if let Some(bad) = rows.iter().position(|row| row.len() != size) {
            return Err(Error::invalid_input(format!(
                "cost matrix row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                size
            )));
        }
        Ok(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Side length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the matrix is `0 × 0`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Cost at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.cells[row * self.size + col]
    }

    /// Set the cost at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, cost: i64) {
        self.cells[row * self.size + col] = cost;
    }

    /// Total cost of an assignment (`assignment[row] = col`).
    #[must_use]
    pub fn total(&self, assignment: &[usize]) -> i64 {
        assignment
            .iter()
            .enumerate()
            .map(|(row, &col)| self.get(row, col))
            .sum()
    }
}

// =============================================================================
// Solver trait
// =============================================================================

/// Solves a square assignment problem.
///
/// `solve` returns a permutation: `result[row]` is the column matched to `row`.
pub trait AssignmentSolver: fmt::Debug + Send + Sync {
    /// Find a minimum-cost perfect matching.
    fn solve(&self, costs: &CostMatrix) -> Vec<usize>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Hungarian (Kuhn–Munkres)
// =============================================================================

/// Exact minimum-cost matching via the Kuhn–Munkres algorithm with potentials.
///
/// Rows are inserted one at a time; each insertion grows a shortest
/// augmenting path in the reduced-cost graph. Ties resolve towards the
/// lowest column index, which keeps results deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hungarian;

impl AssignmentSolver for Hungarian {
    fn solve(&self, costs: &CostMatrix) -> Vec<usize> {
        let n = costs.size();
        if n == 0 {
            return Vec::new();
        }

        const INF: i64 = i64::MAX / 4;
        // 1-indexed; index 0 is the virtual root of each augmenting search
        let mut u = vec![0i64; n + 1];
        let mut v = vec![0i64; n + 1];
        let mut row_of_col = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for row in 1..=n {
            row_of_col[0] = row;
            let mut col0 = 0usize;
            let mut min_reduced = vec![INF; n + 1];
            let mut used = vec![false; n + 1];

            loop {
                used[col0] = true;
                let row0 = row_of_col[col0];
                let mut delta = INF;
                let mut col1 = 0usize;

                for col in 1..=n {
                    if used[col] {
                        continue;
                    }
                    let reduced = costs.get(row0 - 1, col - 1) - u[row0] - v[col];
                    if reduced < min_reduced[col] {
                        min_reduced[col] = reduced;
                        way[col] = col0;
                    }
                    if min_reduced[col] < delta {
                        delta = min_reduced[col];
                        col1 = col;
                    }
                }

                for col in 0..=n {
                    if used[col] {
                        u[row_of_col[col]] += delta;
                        v[col] -= delta;
                    } else {
                        min_reduced[col] -= delta;
                    }
                }

                col0 = col1;
                if row_of_col[col0] == 0 {
                    break;
                }
            }

            // Flip the augmenting path
            loop {
                let prev = way[col0];
                row_of_col[col0] = row_of_col[prev];
                col0 = prev;
                if col0 == 0 {
                    break;
                }
            }
        }

        let mut assignment = vec![0usize; n];
        for col in 1..=n {
            if row_of_col[col] != 0 {
                assignment[row_of_col[col] - 1] = col - 1;
            }
        }
        assignment
    }

    fn name(&self) -> &'static str {
        "hungarian"
    }
}

// =============================================================================
// Greedy
// =============================================================================

/// Greedy matching: repeatedly take the cheapest cell whose row and column are free.
///
/// Not optimal; useful as a fast baseline and for comparing totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAssignment;

impl AssignmentSolver for GreedyAssignment {
    fn solve(&self, costs: &CostMatrix) -> Vec<usize> {
        let n = costs.size();
        let mut cells: Vec<(i64, usize, usize)> = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                cells.push((costs.get(row, col), row, col));
            }
        }
        cells.sort_unstable();

        let mut assignment = vec![usize::MAX; n];
        let mut col_used = vec![false; n];
        let mut remaining = n;
        for (_, row, col) in cells {
            if remaining == 0 {
                break;
            }
            if assignment[row] == usize::MAX && !col_used[col] {
                assignment[row] = col;
                col_used[col] = true;
                remaining -= 1;
            }
        }
        assignment
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

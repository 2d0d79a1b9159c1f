//! Transfer problem as a linear program.
//!
//! For `n` instruments there is one variable per ordered pair `(i, j)`,
//! `i != j`, holding the amount moved from `i` to `j`. Variables are laid out
//! row-major over the instrument order with the diagonal skipped:
//!
//! ```text
//! (0,1) (0,2) .. (0,n-1) (1,0) (1,2) .. (n-1,n-2)
//! ```
//!
//! Each instrument contributes one equality row, outflow minus inflow equal
//! to its balance. The objective is the total moved volume.

use serde::Serialize;

use crate::balance::Balances;

/// One constraint row: `lower <= coefficients . x <= upper`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintRow {
    pub lower: f64,
    pub coefficients: Vec<f64>,
    pub upper: f64,
}

impl ConstraintRow {
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }
}

/// A dense linear program in the shape the solver adapter loads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpProblem {
    pub objective: Vec<f64>,
    pub bounds: Vec<(f64, f64)>,
    pub constraints: Vec<ConstraintRow>,
}

impl LpProblem {
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }
}

/// Number of transfer variables for `n` instruments.
pub fn num_transfer_vars(n: usize) -> usize {
    n * n.saturating_sub(1)
}

/// Column of the variable moving value from instrument `from` to `to`.
///
/// Returns `None` on the diagonal or when either index is out of range.
pub fn pair_index(n: usize, from: usize, to: usize) -> Option<usize> {
    if from == to || from >= n || to >= n {
        return None;
    }
    let skip = usize::from(to > from);
    Some(from * (n - 1) + to - skip)
}

/// Iterate `(column, from, to)` in column order.
pub fn pairs(n: usize) -> impl Iterator<Item = (usize, usize, usize)> {
    (0..n)
        .flat_map(move |i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
        .enumerate()
        .map(|(k, (i, j))| (k, i, j))
}

/// The transfer problem for a fixed instrument order.
#[derive(Debug, Clone)]
pub struct TransferProblem {
    instruments: Vec<String>,
    balances: Vec<f64>,
}

impl TransferProblem {
    pub fn new(balances: &Balances) -> Self {
        Self {
            instruments: balances.instruments().map(str::to_string).collect(),
            balances: balances.values().collect(),
        }
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn num_vars(&self) -> usize {
        num_transfer_vars(self.instruments.len())
    }

    /// Minimize total volume: every coefficient is one.
    pub fn objective(&self) -> Vec<f64> {
        vec![1.0; self.num_vars()]
    }

    /// Every transfer is non-negative and otherwise unbounded.
    pub fn var_bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, f64::INFINITY); self.num_vars()]
    }

    /// One equality row per instrument: outflow - inflow = balance.
    pub fn constraints(&self) -> Vec<ConstraintRow> {
        let n = self.instruments.len();
        let mut rows: Vec<ConstraintRow> = self
            .balances
            .iter()
            .map(|&b| ConstraintRow {
                lower: b,
                coefficients: vec![0.0; self.num_vars()],
                upper: b,
            })
            .collect();

        for (k, from, to) in pairs(n) {
            rows[from].coefficients[k] = 1.0;
            rows[to].coefficients[k] = -1.0;
        }
        rows
    }

    pub fn build(&self) -> LpProblem {
        LpProblem {
            objective: self.objective(),
            bounds: self.var_bounds(),
            constraints: self.constraints(),
        }
    }

    /// Like [`build`](Self::build) but without the last instrument's row.
    ///
    /// Every column sums to zero over the rows, so the rows have rank `n - 1`
    /// and the last one is implied by the others once the balances conserve.
    /// Dropping it keeps rounding residue in the balances from making the
    /// system inconsistent.
    pub fn build_reduced(&self) -> LpProblem {
        let mut lp = self.build();
        lp.constraints.pop();
        lp
    }
}

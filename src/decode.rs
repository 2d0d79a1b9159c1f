//! Solution decoder: solver output back to named transfers.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::lp::pairs;

/// Amounts at or below this are treated as solver noise.
///
/// Well above the simplex feasibility tolerance and well below the smallest
/// currency unit, so real transfers are never dropped.
pub const DEFAULT_ZERO_TOLERANCE: f64 = 1e-6;

/// Move `amount` of value from one instrument to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {:.2}", self.from, self.to, self.amount)
    }
}

/// Every non-zero transfer of one optimization run, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferPlan {
    pub transfers: Vec<Transfer>,
}

impl TransferPlan {
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter()
    }

    /// Sum of all transfer amounts.
    pub fn total_volume(&self) -> f64 {
        self.transfers.iter().map(|t| t.amount).sum()
    }

    /// Net outflow per instrument (outgoing minus incoming).
    pub fn net_outflow(&self) -> FxHashMap<&str, f64> {
        let mut net: FxHashMap<&str, f64> = FxHashMap::default();
        for t in &self.transfers {
            *net.entry(t.from.as_str()).or_insert(0.0) += t.amount;
            *net.entry(t.to.as_str()).or_insert(0.0) -= t.amount;
        }
        net
    }

    /// Apply every transfer to a map of instrument values.
    ///
    /// Instruments absent from `values` start at zero.
    pub fn apply(&self, values: &mut FxHashMap<String, f64>) {
        for t in &self.transfers {
            *values.entry(t.from.clone()).or_insert(0.0) -= t.amount;
            *values.entry(t.to.clone()).or_insert(0.0) += t.amount;
        }
    }

    /// Pairs that carry value in both directions.
    pub fn bidirectional_pairs(&self) -> Vec<(&str, &str)> {
        let mut found = Vec::new();
        for (i, a) in self.transfers.iter().enumerate() {
            for b in &self.transfers[i + 1..] {
                if a.from == b.to && a.to == b.from {
                    found.push((a.from.as_str(), a.to.as_str()));
                }
            }
        }
        found
    }
}

impl IntoIterator for TransferPlan {
    type Item = Transfer;
    type IntoIter = std::vec::IntoIter<Transfer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transfers.into_iter()
    }
}

/// Walk the column enumeration and emit a transfer for every amount above
/// `tolerance`.
///
/// No netting is done: should both directions of a pair carry value, both
/// appear in the plan.
pub fn decode_solution(instruments: &[String], solution: &[f64], tolerance: f64) -> TransferPlan {
    let transfers = pairs(instruments.len())
        .filter_map(|(k, from, to)| {
            let amount = solution.get(k).copied()?;
            (amount > tolerance).then(|| Transfer {
                from: instruments[from].clone(),
                to: instruments[to].clone(),
                amount,
            })
        })
        .collect();
    TransferPlan { transfers }
}

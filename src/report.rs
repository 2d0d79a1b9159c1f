//! Plain-text report of a planning run.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::balance::Balances;
use crate::decode::TransferPlan;
use crate::position::{Distribution, Position};

/// Everything the `calculate` command prints.
pub struct Report<'a> {
    pub positions: &'a [Position],
    pub distributions: &'a [Distribution],
    pub balances: &'a Balances,
    pub plan: &'a TransferPlan,
}

impl Report<'_> {
    /// Transfer amount as a percentage of the source position's value.
    ///
    /// `None` when the source holds nothing (a target-only instrument).
    pub fn source_share(&self, from: &str, amount: f64) -> Option<f64> {
        let held: f64 = self
            .positions
            .iter()
            .filter(|p| p.name() == from)
            .map(|p| p.value.value)
            .sum();
        (held != 0.0).then(|| amount / held * 100.0)
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CURRENT POSITIONS ({}):", self.positions.len())?;
        for p in self.positions {
            writeln!(f, "  {:45} {:>12.2} {}", p.name(), p.value.value, p.value.unit)?;
        }

        let target_sum: f64 = self.distributions.iter().map(|d| d.fraction).sum();
        writeln!(f, "\nTARGET DISTRIBUTION ({:.2}%):", target_sum * 100.0)?;
        for d in self.distributions {
            writeln!(f, "  {:45} {:>11.2}%", d.instrument, d.fraction * 100.0)?;
        }

        writeln!(f, "\nDEVIATIONS (sum {:+.6}):", self.balances.sum())?;
        for (name, balance) in self.balances.iter() {
            writeln!(f, "  {:45} {:>+12.2}", name, balance)?;
        }

        writeln!(
            f,
            "\nTRANSFERS ({}, volume {:.2}):",
            self.plan.len(),
            self.plan.total_volume()
        )?;
        if self.plan.is_empty() {
            writeln!(f, "  none, portfolio matches target")?;
        }
        for t in self.plan.iter() {
            match self.source_share(&t.from, t.amount) {
                Some(pct) => writeln!(
                    f,
                    "  {:30} -> {:30} {:>12.2}  ({:.4}% of source)",
                    t.from, t.to, t.amount, pct
                )?,
                None => writeln!(f, "  {:30} -> {:30} {:>12.2}", t.from, t.to, t.amount)?,
            }
        }
        Ok(())
    }
}

/// Per-instrument values after applying `plan` to `positions`.
pub fn projected_values(positions: &[Position], plan: &TransferPlan) -> FxHashMap<String, f64> {
    let mut values: FxHashMap<String, f64> = FxHashMap::default();
    for p in positions {
        *values.entry(p.name().to_string()).or_insert(0.0) += p.value.value;
    }
    plan.apply(&mut values);
    values
}

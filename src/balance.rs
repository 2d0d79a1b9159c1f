//! Deviation calculator: current positions vs. target distribution.
//!
//! A balance is `current value - target fraction * total value`. Positive
//! balances are overweight and must give value away, negative balances are
//! underweight and must receive it. Because the target fractions sum to one,
//! the balances of a well-formed input sum to zero.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{Error, Inconsistency, InconsistencyKind, Result};
use crate::position::{Distribution, Position};

/// Signed deviation per instrument, in a fixed instrument order.
///
/// The order established here is the one the LP builder, the solver call and
/// the decoder all enumerate, so it must never be re-derived from a map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Balances {
    entries: Vec<(String, f64)>,
}

impl Balances {
    /// Build from explicit `(instrument, balance)` pairs, keeping their order.
    ///
    /// Later duplicates are merged into the first occurrence.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        let mut entries: Vec<(String, f64)> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for (name, balance) in pairs {
            let name = name.into();
            match index.get(&name) {
                Some(&i) => entries[i].1 += balance,
                None => {
                    index.insert(name.clone(), entries.len());
                    entries.push((name, balance));
                }
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instrument names in enumeration order.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Balances in enumeration order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(_, b)| b)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, b)| (name.as_str(), *b))
    }

    pub fn get(&self, instrument: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == instrument)
            .map(|&(_, b)| b)
    }

    /// Sum of all balances. Approximately zero for consistent input.
    pub fn sum(&self) -> f64 {
        self.values().sum()
    }

    /// Sum of absolute balances.
    pub fn gross(&self) -> f64 {
        self.values().map(f64::abs).sum()
    }

    /// Sum of the positive balances: the least volume any plan must move.
    pub fn excess(&self) -> f64 {
        self.values().filter(|b| *b > 0.0).sum()
    }

    /// True when no instrument deviates by more than `tolerance`.
    pub fn is_settled(&self, tolerance: f64) -> bool {
        self.values().all(|b| b.abs() <= tolerance)
    }
}

/// Checks that every position shares the tags of a reference position.
#[derive(Debug)]
pub struct PositionVerifier {
    currency: String,
    unit: String,
    unit_type: String,
    found: Vec<Inconsistency>,
}

impl PositionVerifier {
    /// Use the first position as reference.
    pub fn sample(positions: &[Position]) -> Result<Self> {
        let p = positions.first().ok_or(Error::EmptyInput("positions"))?;
        Ok(Self {
            currency: p.instrument.currency.clone(),
            unit: p.value.unit.clone(),
            unit_type: p.value.unit_type.clone(),
            found: Vec::new(),
        })
    }

    pub fn inspect(&mut self, p: &Position) {
        let checks = [
            (InconsistencyKind::Currency, &self.currency, &p.instrument.currency),
            (InconsistencyKind::Unit, &self.unit, &p.value.unit),
            (InconsistencyKind::UnitType, &self.unit_type, &p.value.unit_type),
        ];
        let mut found = Vec::new();
        for (kind, expected, actual) in checks {
            if expected != actual {
                found.push(Inconsistency {
                    instrument: p.instrument.name.clone(),
                    kind,
                    expected: expected.clone(),
                    found: actual.clone(),
                });
            }
        }
        self.found.extend(found);
    }

    pub fn finish(self) -> Result<()> {
        if self.found.is_empty() {
            Ok(())
        } else {
            Err(Error::DataConsistency(self.found))
        }
    }
}

/// Compute the per-instrument balances for one account.
///
/// Positions referencing the same instrument are summed before the target is
/// subtracted. Instruments with a target but no position get a zero-value
/// entry so they show up as underweight. Instruments are returned in
/// lexicographic order.
pub fn compute_balances(positions: &[Position], distributions: &[Distribution]) -> Result<Balances> {
    if positions.is_empty() {
        return Err(Error::EmptyInput("positions"));
    }
    if distributions.is_empty() {
        return Err(Error::EmptyInput("distributions"));
    }

    let mut verifier = PositionVerifier::sample(positions)?;
    let mut total = 0.0_f64;
    let mut current: FxHashMap<&str, f64> = FxHashMap::default();
    for p in positions {
        verifier.inspect(p);
        total += p.value.value;
        *current.entry(p.name()).or_insert(0.0) += p.value.value;
    }
    verifier.finish()?;

    let mut targets: FxHashMap<&str, f64> = FxHashMap::default();
    for d in distributions {
        *targets.entry(d.instrument.as_str()).or_insert(0.0) += d.fraction;
        current.entry(d.instrument.as_str()).or_insert(0.0);
    }

    let mut entries: Vec<(String, f64)> = current
        .into_iter()
        .map(|(name, value)| {
            let fraction = targets.get(name).copied().unwrap_or(0.0);
            (name.to_string(), value - fraction * total)
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(Balances { entries })
}

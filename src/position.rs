//! Portfolio data model: accounts, instruments, positions, and target
//! distributions.

use serde::{Deserialize, Serialize};

/// A brokerage account holding positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// A tradable instrument, keyed by its human-readable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub isin: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl Instrument {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A numeric value tagged with its unit (usually a currency code).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub unit_type: String,
    #[serde(default)]
    pub decimal_precision: u32,
}

/// What an account currently holds of one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub id: String,
    pub account: Account,
    pub instrument: Instrument,
    pub value: Value,
}

impl Position {
    /// A position in `instrument` worth `value` of the given currency.
    pub fn new(instrument: impl Into<String>, value: f64, currency: &str) -> Self {
        Self {
            id: String::new(),
            account: Account::default(),
            instrument: Instrument {
                currency: currency.to_string(),
                ..Instrument::named(instrument)
            },
            value: Value {
                value,
                unit: currency.to_string(),
                ..Value::default()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.instrument.name
    }
}

/// Target share of total portfolio value for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub instrument: String,
    /// Decimal fraction, e.g. 0.15 for 15%.
    pub fraction: f64,
}

impl Distribution {
    pub fn new(instrument: impl Into<String>, fraction: f64) -> Self {
        Self {
            instrument: instrument.into(),
            fraction,
        }
    }
}

//! Cached brokerage documents (Avanza JSON payloads).
//!
//! The cache is populated out of band; this module only reads it. Layout:
//!
//! ```text
//! <cache dir>/avanza/<username>/instrument_positions.json
//! <cache dir>/avanza/<username>/monthly_savings.json
//! ```

use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::position::{Account, Distribution, Instrument, Position, Value};

pub const POSITIONS_FILE: &str = "instrument_positions.json";
pub const SAVINGS_FILE: &str = "monthly_savings.json";

/// Cache directory of one brokerage user.
pub fn user_dir(cache_dir: &Path, username: &str) -> PathBuf {
    cache_dir.join("avanza").join(username)
}

pub fn positions_path(cache_dir: &Path, username: &str) -> PathBuf {
    user_dir(cache_dir, username).join(POSITIONS_FILE)
}

pub fn savings_path(cache_dir: &Path, username: &str) -> PathBuf {
    user_dir(cache_dir, username).join(SAVINGS_FILE)
}

/// `/_mobile/account/positions` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsPayload {
    #[serde(default)]
    pub instrument_positions: Vec<InstrumentPositions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentPositions {
    #[serde(default)]
    pub instrument_type: String,
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEntry {
    pub name: String,
    #[serde(default)]
    pub tradable: bool,
    #[serde(default)]
    pub orderbook_id: String,
    pub currency: String,
    pub value: f64,
    pub account_id: String,
    #[serde(default)]
    pub account_name: String,
}

/// Periodic savings (monthly savings plans) response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPayload {
    #[serde(default)]
    pub periodic_savings: Vec<PeriodicSaving>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicSaving {
    pub account_id: u64,
    #[serde(default)]
    pub allocation_views: Vec<AllocationView>,
    #[serde(default)]
    pub monthly_savings_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationView {
    /// Percent, e.g. 15.0 for 15%.
    pub allocation: f64,
    pub name: String,
    #[serde(default)]
    pub orderbook_id: u64,
}

impl PositionsPayload {
    /// Flatten into positions across all accounts.
    pub fn into_positions(self) -> Vec<Position> {
        let mut out = Vec::new();
        for group in self.instrument_positions {
            for p in group.positions {
                out.push(Position {
                    id: p.orderbook_id,
                    account: Account {
                        id: p.account_id,
                        name: p.account_name,
                    },
                    instrument: Instrument {
                        name: p.name,
                        currency: p.currency.clone(),
                        isin: String::new(),
                        kind: group.instrument_type.clone(),
                    },
                    value: Value {
                        value: p.value,
                        unit: p.currency,
                        ..Value::default()
                    },
                });
            }
        }
        out
    }
}

impl SavingsPayload {
    /// Target distribution of one account. Allocations are converted from
    /// percent to fractions.
    pub fn distribution(&self, account_id: &str) -> Vec<Distribution> {
        self.periodic_savings
            .iter()
            .filter(|ps| ps.account_id.to_string() == account_id)
            .flat_map(|ps| &ps.allocation_views)
            .map(|av| Distribution::new(av.name.clone(), av.allocation / 100.0))
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::CacheRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| Error::CacheParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read positions of every account from a positions cache file.
pub fn read_all_positions(path: &Path) -> Result<Vec<Position>> {
    let payload: PositionsPayload = read_json(path)?;
    let positions = payload.into_positions();
    debug!("read {} positions from {}", positions.len(), path.display());
    Ok(positions)
}

/// Keep only the positions held in `account_id`.
pub fn filter_positions(positions: Vec<Position>, account_id: &str) -> Vec<Position> {
    positions
        .into_iter()
        .filter(|p| p.account.id == account_id)
        .collect()
}

/// Read the target distribution of `account_id` from a savings cache file.
pub fn read_distribution(path: &Path, account_id: &str) -> Result<Vec<Distribution>> {
    let payload: SavingsPayload = read_json(path)?;
    let dist = payload.distribution(account_id);
    debug!(
        "read {} allocations for account {account_id} from {}",
        dist.len(),
        path.display()
    );
    Ok(dist)
}

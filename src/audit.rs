//! JSONL audit trail of computed plans.
//!
//! Each successful calculation appends one JSON object per line.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decode::Transfer;
use crate::engine::Rebalance;
use crate::error::Result;

/// One line of the trail: event name, timestamp and the flattened payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent<T> {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

/// Payload of a `plan_computed` event.
#[derive(Debug, Serialize)]
pub struct PlanRecord<'a> {
    pub account: &'a str,
    pub balances: serde_json::Map<String, serde_json::Value>,
    pub transfers: &'a [Transfer],
    pub total_volume: f64,
}

impl<'a> PlanRecord<'a> {
    pub fn new(account: &'a str, rebalance: &'a Rebalance) -> Self {
        Self {
            account,
            balances: rebalance
                .balances
                .iter()
                .map(|(name, b)| (name.to_string(), b.into()))
                .collect(),
            transfers: &rebalance.plan.transfers,
            total_volume: rebalance.plan.total_volume(),
        }
    }
}

/// Append-only JSONL file.
pub struct AuditLog {
    file: File,
}

impl AuditLog {
    /// Open the trail for appending, creating it and its directory as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Append one event. The line is written with a single call so
    /// concurrent appenders do not interleave.
    pub fn record<T: Serialize>(&mut self, event: &'static str, data: T) -> Result<()> {
        let mut line = serde_json::to_vec(&AuditEvent {
            event,
            ts: Utc::now(),
            data,
        })?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        Ok(())
    }
}

/// Log a computed plan.
pub fn log_plan(audit: &mut AuditLog, account_id: &str, rebalance: &Rebalance) -> Result<()> {
    audit.record("plan_computed", PlanRecord::new(account_id, rebalance))
}

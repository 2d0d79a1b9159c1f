//! Command workflows: read caches → plan → report → audit.

use std::time::Instant;

use log::{info, warn};

use crate::audit::{self, AuditLog};
use crate::cache;
use crate::config::Config;
use crate::engine::{self, Rebalance};
use crate::error::Result;
use crate::position::{Distribution, Position};
use crate::report::Report;

/// Options for a `calculate` run.
pub struct CalculateOptions {
    pub username: String,
    pub account_id: String,
    /// Print the plan as JSON instead of the text report.
    pub json: bool,
}

/// Load the cached inputs of one account.
pub fn load_inputs(
    config: &Config,
    username: &str,
    account_id: &str,
) -> Result<(Vec<Position>, Vec<Distribution>)> {
    let positions_file = cache::positions_path(&config.cache.dir, username);
    let all = cache::read_all_positions(&positions_file)?;
    let total = all.len();
    let positions = cache::filter_positions(all, account_id);
    info!(
        "{} of {total} cached positions belong to account {account_id}",
        positions.len()
    );

    let savings_file = cache::savings_path(&config.cache.dir, username);
    let distributions = cache::read_distribution(&savings_file, account_id)?;
    info!("{} target allocations for account {account_id}", distributions.len());

    Ok((positions, distributions))
}

/// Smallest deviation the report can show (half a cent).
const REPORTED_PRECISION: f64 = 0.005;

/// Instruments whose balance the plan does not move to zero.
pub fn residual_deviations(rebalance: &Rebalance) -> Vec<(&str, f64)> {
    let net = rebalance.plan.net_outflow();
    rebalance
        .balances
        .iter()
        .map(|(name, balance)| (name, balance - net.get(name).copied().unwrap_or(0.0)))
        .filter(|(_, left)| left.abs() >= REPORTED_PRECISION)
        .collect()
}

/// Plan transfers for already-loaded inputs, logging around the pure core.
pub fn plan(
    config: &Config,
    positions: &[Position],
    distributions: &[Distribution],
) -> Result<Rebalance> {
    let target_sum: f64 = distributions.iter().map(|d| d.fraction).sum();
    if !distributions.is_empty() && (target_sum - 1.0).abs() > 1e-6 {
        warn!(
            "target distribution sums to {:.4}%, expected 100%",
            target_sum * 100.0
        );
    }

    let started = Instant::now();
    let rebalance = engine::optimal_transfers(positions, distributions, &config.plan_options())?;
    info!(
        "planned {} transfers over {} instruments in {:?}",
        rebalance.plan.len(),
        rebalance.balances.len(),
        started.elapsed()
    );

    if rebalance.balances.is_settled(config.solver.zero_tolerance) {
        info!("account already matches its target distribution");
    }
    for (name, left) in residual_deviations(&rebalance) {
        warn!("plan leaves {name} off target by {left:.2}");
    }

    let bidirectional = rebalance.plan.bidirectional_pairs();
    if !bidirectional.is_empty() {
        warn!("plan moves value both ways between {bidirectional:?}");
    }
    Ok(rebalance)
}

/// The `calculate` command.
pub fn calculate(config: &Config, opts: &CalculateOptions) -> Result<()> {
    let (positions, distributions) = load_inputs(config, &opts.username, &opts.account_id)?;
    let rebalance = plan(config, &positions, &distributions)?;

    if config.audit.enabled {
        let mut log = AuditLog::open(&config.audit.path)?;
        audit::log_plan(&mut log, &opts.account_id, &rebalance)?;
        info!("plan appended to {}", config.audit.path.display());
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&rebalance)?);
    } else {
        let report = Report {
            positions: &positions,
            distributions: &distributions,
            balances: &rebalance.balances,
            plan: &rebalance.plan,
        };
        print!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::balance::Balances;
    use crate::decode::{Transfer, TransferPlan};
    use crate::error::Error;

    fn write_cache(dir: &Path) {
        let user = cache::user_dir(dir, "alice");
        std::fs::create_dir_all(&user).unwrap();
        std::fs::write(
            user.join(cache::POSITIONS_FILE),
            r#"{"instrumentPositions":[{"instrumentType":"FUND","positions":[
                {"name":"A","currency":"SEK","value":100,"accountId":"1"},
                {"name":"B","currency":"SEK","value":200,"accountId":"1"},
                {"name":"C","currency":"SEK","value":300,"accountId":"1"},
                {"name":"X","currency":"USD","value":999,"accountId":"2"}
            ]}]}"#,
        )
        .unwrap();
        std::fs::write(
            user.join(cache::SAVINGS_FILE),
            r#"{"periodicSavings":[{"accountId":1,"allocationViews":[
                {"allocation":10,"name":"A"},
                {"allocation":50,"name":"B"},
                {"allocation":40,"name":"C"}
            ]}]}"#,
        )
        .unwrap();
    }

    fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.cache.dir = dir.to_path_buf();
        config.audit.path = dir.join("logs").join("plans.jsonl");
        config
    }

    #[test]
    fn inputs_are_filtered_to_account() {
        let dir = tempfile::tempdir().unwrap();
        write_cache(dir.path());
        let (p, d) = load_inputs(&config(dir.path()), "alice", "1").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn plan_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_cache(dir.path());
        let config = config(dir.path());
        let (p, d) = load_inputs(&config, "alice", "1").unwrap();
        let r = plan(&config, &p, &d).unwrap();
        assert!((r.plan.total_volume() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn planned_transfers_leave_no_residue() {
        let dir = tempfile::tempdir().unwrap();
        write_cache(dir.path());
        let config = config(dir.path());
        let (p, d) = load_inputs(&config, "alice", "1").unwrap();
        let r = plan(&config, &p, &d).unwrap();
        assert!(residual_deviations(&r).is_empty());
    }

    #[test]
    fn short_plan_leaves_residue() {
        let r = Rebalance {
            balances: Balances::from_pairs([("A", 40.0), ("B", -100.0), ("C", 60.0)]),
            plan: TransferPlan {
                transfers: vec![Transfer {
                    from: "C".into(),
                    to: "B".into(),
                    amount: 60.0,
                }],
            },
        };
        let left = residual_deviations(&r);
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].0, "A");
        assert!((left[0].1 - 40.0).abs() < 1e-9);
        assert_eq!(left[1].0, "B");
        assert!((left[1].1 + 40.0).abs() < 1e-9);
    }

    #[test]
    fn calculate_writes_audit_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write_cache(dir.path());
        let mut config = config(dir.path());
        config.audit.enabled = true;
        let opts = CalculateOptions {
            username: "alice".into(),
            account_id: "1".into(),
            json: true,
        };
        calculate(&config, &opts).unwrap();
        let log = std::fs::read_to_string(&config.audit.path).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[test]
    fn unknown_account_has_no_positions() {
        let dir = tempfile::tempdir().unwrap();
        write_cache(dir.path());
        let config = config(dir.path());
        let (p, d) = load_inputs(&config, "alice", "9").unwrap();
        let err = plan(&config, &p, &d).unwrap_err();
        assert!(matches!(err, Error::EmptyInput("positions")));
    }
}

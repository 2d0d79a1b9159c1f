//! # rebalance-transfers
//!
//! Plans the smallest-volume set of pairwise transfers that moves a portfolio
//! from its current allocation to a target allocation.
//!
//! The pipeline is pure and synchronous:
//!
//! ```text
//! positions + distributions ─► balances ─► linear program ─► solution ─► transfers
//!        (balance)                (lp)         (solver)        (decode)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use rebalance_transfers::{optimal_transfers, Distribution, PlanOptions, Position};
//!
//! let positions = vec![
//!     Position::new("A", 100.0, "SEK"),
//!     Position::new("B", 200.0, "SEK"),
//!     Position::new("C", 300.0, "SEK"),
//! ];
//! let target = vec![
//!     Distribution::new("A", 0.10),
//!     Distribution::new("B", 0.50),
//!     Distribution::new("C", 0.40),
//! ];
//!
//! let r = optimal_transfers(&positions, &target, &PlanOptions::default()).unwrap();
//! assert!((r.balances.get("B").unwrap() + 100.0).abs() < 1e-9);
//! assert!((r.plan.total_volume() - 100.0).abs() < 1e-6);
//! assert!(r.plan.iter().all(|t| t.to == "B"));
//! ```
//!
//! ## Formulation
//!
//! One non-negative variable per ordered instrument pair, one equality row
//! per instrument (outflow − inflow = balance), objective = total volume.
//! See [`lp`] for the column layout.

pub mod audit;
pub mod balance;
pub mod cache;
pub mod command;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod lp;
pub mod position;
pub mod report;
pub mod solver;

pub use balance::{Balances, compute_balances};
pub use decode::{Transfer, TransferPlan, decode_solution};
pub use engine::{PlanOptions, Rebalance, optimal_transfers};
pub use error::{Error, Result};
pub use lp::{ConstraintRow, LpProblem, TransferProblem};
pub use position::{Account, Distribution, Instrument, Position, Value};
pub use solver::{LpSolver, SimplexSolver, SolveOptions};

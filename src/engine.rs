//! Positions + distributions -> balances -> LP -> transfers.
//!
//! Every call is a pure computation: nothing is cached between runs.

use serde::Serialize;

use crate::balance::{self, Balances};
use crate::decode::{self, DEFAULT_ZERO_TOLERANCE, TransferPlan};
use crate::error::{Error, Result};
use crate::lp::TransferProblem;
use crate::position::{Distribution, Position};
use crate::solver::{LpSolver, SimplexSolver, SolveOptions};

/// Relative slack, against the gross balance, allowed in the balance sum
/// before the input counts as non-conserving.
pub const CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Knobs for one planning run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanOptions {
    /// Decoded amounts at or below this are dropped.
    pub zero_tolerance: f64,
    pub solve: SolveOptions,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            zero_tolerance: DEFAULT_ZERO_TOLERANCE,
            solve: SolveOptions::default(),
        }
    }
}

/// Balances and the plan that settles them.
#[derive(Debug, Clone, Serialize)]
pub struct Rebalance {
    pub balances: Balances,
    pub plan: TransferPlan,
}

/// Compute the minimal-volume transfer plan for one account.
pub fn optimal_transfers(
    positions: &[Position],
    distributions: &[Distribution],
    options: &PlanOptions,
) -> Result<Rebalance> {
    let balances = balance::compute_balances(positions, distributions)?;
    let solver = SimplexSolver::new(options.solve);
    let plan = settle_with(&solver, &balances, options.zero_tolerance)?;
    Ok(Rebalance { balances, plan })
}

/// Solve the transfer problem for `balances` with the given solver.
///
/// Balances that sum to zero within rounding are solved without the redundant
/// last row. Anything else is handed over in full so the solver reports it as
/// infeasible. With fewer than two instruments there are no variables and the
/// solver is not invoked; a lone balance must already be zero.
pub fn settle_with<S: LpSolver + ?Sized>(
    solver: &S,
    balances: &Balances,
    zero_tolerance: f64,
) -> Result<TransferPlan> {
    let conserving = conserves(balances, zero_tolerance);

    if balances.len() < 2 {
        return if conserving {
            Ok(TransferPlan::default())
        } else {
            Err(Error::Infeasible)
        };
    }

    let problem = TransferProblem::new(balances);
    let lp = if conserving {
        problem.build_reduced()
    } else {
        problem.build()
    };
    let solution = solver.minimize(&lp)?;
    Ok(decode::decode_solution(
        problem.instruments(),
        &solution,
        zero_tolerance,
    ))
}

/// Balances sum to zero up to rounding in their own magnitude.
fn conserves(balances: &Balances, zero_tolerance: f64) -> bool {
    let slack = zero_tolerance.max(CONSERVATION_TOLERANCE * balances.gross());
    balances.sum().abs() <= slack
}

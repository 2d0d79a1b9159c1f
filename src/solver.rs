//! LP solver adapter.
//!
//! Loads an [`LpProblem`] into a bounded-variable simplex solver, minimizes,
//! and reads back the primal solution in variable order. Infeasible and
//! unbounded outcomes are reported as distinct errors.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};

use crate::error::{Error, Result};
use crate::lp::LpProblem;

/// Anything that can minimize an [`LpProblem`].
pub trait LpSolver {
    /// Return the primal solution, one value per variable, in variable order.
    fn minimize(&self, problem: &LpProblem) -> Result<Vec<f64>>;
}

/// Options for a solver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveOptions {
    /// Give up after this long. `None` waits indefinitely.
    ///
    /// The simplex loop has no interruption point, so a run that misses its
    /// deadline keeps its worker thread busy until it finishes on its own.
    /// The late result is discarded. Callers that retry after timeouts should
    /// bound their retries accordingly.
    pub deadline: Option<Duration>,
}

/// Dual/primal simplex from the `minilp` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplexSolver {
    options: SolveOptions,
}

impl SimplexSolver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }
}

impl LpSolver for SimplexSolver {
    fn minimize(&self, problem: &LpProblem) -> Result<Vec<f64>> {
        validate(problem)?;

        if problem.num_vars() == 0 {
            return solve_empty(problem);
        }

        let Some(deadline) = self.options.deadline else {
            return solve_now(problem);
        };

        // The simplex loop cannot be interrupted, so it runs on its own
        // thread and is abandoned when the deadline passes.
        let (tx, rx) = mpsc::channel();
        let owned = problem.clone();
        thread::spawn(move || {
            let _ = tx.send(solve_now(&owned));
        });

        match rx.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::SolverTimeout(deadline)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Solver("solver thread terminated without a result".into()))
            }
        }
    }
}

fn solve_now(problem: &LpProblem) -> Result<Vec<f64>> {
    let mut lp = Problem::new(OptimizationDirection::Minimize);
    let vars: Vec<Variable> = problem
        .objective
        .iter()
        .zip(&problem.bounds)
        .map(|(&c, &bounds)| lp.add_var(c, bounds))
        .collect();

    for row in &problem.constraints {
        let expr = || row_expr(&vars, &row.coefficients);
        if row.is_equality() {
            lp.add_constraint(expr(), ComparisonOp::Eq, row.lower);
            continue;
        }
        if row.lower.is_finite() {
            lp.add_constraint(expr(), ComparisonOp::Ge, row.lower);
        }
        if row.upper.is_finite() {
            lp.add_constraint(expr(), ComparisonOp::Le, row.upper);
        }
    }

    let solution = match lp.solve() {
        Ok(solution) => solution,
        Err(minilp::Error::Infeasible) => return Err(Error::Infeasible),
        Err(minilp::Error::Unbounded) => return Err(Error::Unbounded),
    };

    // minilp can hand back an unbounded ray as infinite values.
    let values: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
    if !solution.objective().is_finite() || values.iter().any(|x| !x.is_finite()) {
        return Err(Error::Unbounded);
    }
    Ok(values)
}

fn row_expr(vars: &[Variable], coefficients: &[f64]) -> LinearExpr {
    let mut expr = LinearExpr::empty();
    for (&var, &coef) in vars.iter().zip(coefficients) {
        if coef != 0.0 {
            expr.add(var, coef);
        }
    }
    expr
}

/// With no variables every row reads `lower <= 0 <= upper`.
fn solve_empty(problem: &LpProblem) -> Result<Vec<f64>> {
    if problem
        .constraints
        .iter()
        .all(|r| r.lower <= 0.0 && 0.0 <= r.upper)
    {
        Ok(Vec::new())
    } else {
        Err(Error::Infeasible)
    }
}

fn validate(problem: &LpProblem) -> Result<()> {
    let n = problem.num_vars();
    if problem.bounds.len() != n {
        return Err(Error::MalformedProblem(format!(
            "{} bounds for {n} variables",
            problem.bounds.len()
        )));
    }
    if let Some(c) = problem.objective.iter().find(|c| !c.is_finite()) {
        return Err(Error::MalformedProblem(format!("objective coefficient {c}")));
    }
    for (i, &(lo, hi)) in problem.bounds.iter().enumerate() {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(Error::MalformedProblem(format!(
                "variable {i} has bounds [{lo}, {hi}]"
            )));
        }
    }
    for (i, row) in problem.constraints.iter().enumerate() {
        if row.coefficients.len() != n {
            return Err(Error::MalformedProblem(format!(
                "row {i} has {} coefficients for {n} variables",
                row.coefficients.len()
            )));
        }
        if row.lower.is_nan() || row.upper.is_nan() || row.lower > row.upper {
            return Err(Error::MalformedProblem(format!(
                "row {i} has bounds [{}, {}]",
                row.lower, row.upper
            )));
        }
        if row.is_equality() && !row.lower.is_finite() {
            return Err(Error::MalformedProblem(format!(
                "row {i} is fixed at {}",
                row.lower
            )));
        }
    }
    Ok(())
}

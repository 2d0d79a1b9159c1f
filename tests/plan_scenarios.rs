//! End-to-end planning scenarios through the public API.

use std::time::Duration;

use rebalance_transfers::error::InconsistencyKind;
use rebalance_transfers::solver::SolveOptions;
use rebalance_transfers::{
    Balances, Distribution, Error, LpSolver, PlanOptions, Position, SimplexSolver,
    TransferProblem, decode_solution, optimal_transfers,
};

fn sek(name: &str, value: f64) -> Position {
    Position::new(name, value, "SEK")
}

fn amount(r: &rebalance_transfers::Rebalance, from: &str, to: &str) -> f64 {
    r.plan
        .iter()
        .filter(|t| t.from == from && t.to == to)
        .map(|t| t.amount)
        .sum()
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn three_funds_flow_into_the_underweight_one() {
    let positions = vec![sek("A", 100.0), sek("B", 200.0), sek("C", 300.0)];
    let target = vec![
        Distribution::new("A", 0.10),
        Distribution::new("B", 0.50),
        Distribution::new("C", 0.40),
    ];

    let r = optimal_transfers(&positions, &target, &PlanOptions::default()).unwrap();

    assert!((r.balances.get("A").unwrap() - 40.0).abs() < 1e-9);
    assert!((r.balances.get("B").unwrap() + 100.0).abs() < 1e-9);
    assert!((r.balances.get("C").unwrap() - 60.0).abs() < 1e-9);

    assert_eq!(r.plan.len(), 2);
    assert!((amount(&r, "A", "B") - 40.0).abs() < 1e-6);
    assert!((amount(&r, "C", "B") - 60.0).abs() < 1e-6);
    assert!((r.plan.total_volume() - 100.0).abs() < 1e-6);
}

#[test]
fn new_fund_in_target_is_bought_from_holdings() {
    let positions = vec![sek("Old", 600.0), sek("Keep", 400.0)];
    let target = vec![
        Distribution::new("Keep", 0.40),
        Distribution::new("New", 0.60),
    ];

    let r = optimal_transfers(&positions, &target, &PlanOptions::default()).unwrap();

    assert_eq!(r.balances.len(), 3);
    assert!((amount(&r, "Old", "New") - 600.0).abs() < 1e-6);
    assert_eq!(r.plan.len(), 1);
}

#[test]
fn single_instrument_portfolio_is_a_no_op() {
    let r = optimal_transfers(
        &[sek("Only", 1234.5)],
        &[Distribution::new("Only", 1.0)],
        &PlanOptions::default(),
    )
    .unwrap();
    assert_eq!(r.balances.len(), 1);
    assert!(r.plan.is_empty());
}

#[test]
fn many_sources_many_sinks() {
    // total 1000, equal quarters of 250
    let positions = vec![sek("A", 400.0), sek("B", 350.0), sek("C", 150.0), sek("D", 100.0)];
    let target: Vec<Distribution> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| Distribution::new(*n, 0.25))
        .collect();

    let r = optimal_transfers(&positions, &target, &PlanOptions::default()).unwrap();

    assert!((r.plan.total_volume() - 250.0).abs() < 1e-6);
    let out_a = amount(&r, "A", "C") + amount(&r, "A", "D");
    let out_b = amount(&r, "B", "C") + amount(&r, "B", "D");
    assert!((out_a - 150.0).abs() < 1e-6);
    assert!((out_b - 100.0).abs() < 1e-6);
    assert!(r.plan.bidirectional_pairs().is_empty());
}

#[test]
fn deadline_does_not_change_the_plan() {
    let positions = vec![sek("A", 100.0), sek("B", 200.0), sek("C", 300.0)];
    let target = vec![
        Distribution::new("A", 0.10),
        Distribution::new("B", 0.50),
        Distribution::new("C", 0.40),
    ];
    let options = PlanOptions {
        solve: SolveOptions {
            deadline: Some(Duration::from_secs(60)),
        },
        ..PlanOptions::default()
    };

    let with = optimal_transfers(&positions, &target, &options).unwrap();
    let without = optimal_transfers(&positions, &target, &PlanOptions::default()).unwrap();
    assert_eq!(with.plan, without.plan);
}

// ============================================================================
// Building blocks composed by hand
// ============================================================================

#[test]
fn caller_supplied_order_drives_columns() {
    let balances = Balances::from_pairs([("Z", -5.0), ("A", 5.0)]);
    let problem = TransferProblem::new(&balances);
    assert_eq!(problem.instruments(), ["Z", "A"]);

    let solution = SimplexSolver::default().minimize(&problem.build()).unwrap();
    // columns: (Z,A) (A,Z)
    assert!(solution[0].abs() < 1e-9);
    assert!((solution[1] - 5.0).abs() < 1e-9);

    let plan = decode_solution(problem.instruments(), &solution, 1e-6);
    assert_eq!(plan.transfers[0].from, "A");
    assert_eq!(plan.transfers[0].to, "Z");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn empty_inputs_fail_fast() {
    let d = vec![Distribution::new("A", 1.0)];
    assert!(matches!(
        optimal_transfers(&[], &d, &PlanOptions::default()),
        Err(Error::EmptyInput(_))
    ));
    assert!(matches!(
        optimal_transfers(&[sek("A", 1.0)], &[], &PlanOptions::default()),
        Err(Error::EmptyInput(_))
    ));
}

#[test]
fn mixed_currencies_are_rejected() {
    let positions = vec![sek("A", 100.0), Position::new("B", 100.0, "EUR")];
    let target = vec![Distribution::new("A", 0.5), Distribution::new("B", 0.5)];
    match optimal_transfers(&positions, &target, &PlanOptions::default()) {
        Err(Error::DataConsistency(found)) => {
            assert!(found.iter().any(|i| i.kind == InconsistencyKind::Currency));
            assert!(found.iter().all(|i| i.instrument == "B"));
        }
        other => panic!("expected consistency error, got {other:?}"),
    }
}

#[test]
fn non_conserving_targets_are_infeasible() {
    let positions = vec![sek("A", 100.0), sek("B", 100.0)];
    let target = vec![Distribution::new("A", 0.7), Distribution::new("B", 0.7)];
    assert!(matches!(
        optimal_transfers(&positions, &target, &PlanOptions::default()),
        Err(Error::Infeasible)
    ));
}

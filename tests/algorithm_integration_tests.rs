//! Integration tests for the full Greedy → Local Search → VNS pipeline.

use mclp_vns::config::{Config, LsStrategy};
use mclp_vns::error::MclpError;
use mclp_vns::problem::{CoverageRelation, DemandNode, DistanceRecord, Problem, Threshold};
use mclp_vns::progress::ProgressEvent;
use mclp_vns::{solve, solve_with_observer, MclpSolver, Stage};
use std::time::Duration;

fn create_example_problem() -> Problem<&'static str> {
    let demand = vec![
        DemandNode::new("n0", 10),
        DemandNode::new("n1", 20),
        DemandNode::new("n2", 5),
        DemandNode::new("n3", 1),
    ];
    let coverage = CoverageRelation::from_pairs(vec![
        ("A", "n0"),
        ("A", "n1"),
        ("B", "n2"),
        ("B", "n3"),
        ("C", "n0"),
    ]);
    Problem::new(demand, coverage, vec![]).with_candidates(vec!["A", "B", "C"])
}

/// Towns on a 6 x 6 grid, 10 km apart, with the two corner towns already
/// served. A town covers every town within the radius.
fn create_moderate_problem(radius_km: f64) -> Problem<u32> {
    let side = 6u32;
    let position = |id: u32| ((id % side) as f64 * 10.0, (id / side) as f64 * 10.0);

    let demand = (0..side * side)
        .map(|id| DemandNode::new(id, 100 + ((id * 37) % 90) as i64))
        .collect();

    let mut records = Vec::new();
    for origin in 0..side * side {
        for destination in 0..side * side {
            let (x1, y1) = position(origin);
            let (x2, y2) = position(destination);
            let distance = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt();
            records.push(DistanceRecord {
                origin,
                destination,
                distance,
                time: distance / 60.0,
            });
        }
    }
    let coverage = CoverageRelation::from_distances(&records, Threshold::Distance(radius_km));

    Problem::new(demand, coverage, vec![0, side * side - 1])
}

fn quick_config(k_max: usize) -> Config {
    Config::new()
        .with_vns_k_max(k_max)
        .with_vns_max_iter(30)
        .with_vns_max_no_improv(10)
        .with_vns_max_time(Duration::from_secs(10))
        .with_random_seed(2024)
}

#[test]
fn test_solve_example() {
    let result = solve(create_example_problem(), 2, quick_config(2)).unwrap();

    let mut ids = result.solution.clone();
    ids.sort();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(result.objective, 36);
    assert_eq!(result.summary.final_objective(), 36);
    assert!((result.summary.coverage_percentage() - 100.0).abs() < 1e-9);
}

#[test]
fn test_solve_stage_objectives_ordered() {
    let problem = create_moderate_problem(12.0);
    let result = solve(problem, 5, quick_config(3)).unwrap();

    let stages = &result.summary.stages;
    assert_eq!(stages.len(), 3);
    assert!(stages[0].objective <= stages[1].objective);
    assert!(stages[1].objective <= stages[2].objective);
    assert_eq!(stages[2].objective, result.objective);
    assert!(result.objective >= result.summary.initial_objective);
    assert!(result.objective <= result.summary.total_demand);
    assert_eq!(result.solution.len(), 5);
    assert!(!result.solution.contains(&0));
}

#[test]
fn test_solve_objective_matches_evaluator() {
    let problem = create_moderate_problem(15.0);
    let mut solver = MclpSolver::new(problem, 4, quick_config(2)).unwrap();
    let result = solver.run(&mut mclp_vns::progress::NoProgress).unwrap();

    let rows = solver.model.rows_of(&result.solution).unwrap();
    assert_eq!(solver.model.evaluate(&rows), result.objective);
}

#[test]
fn test_solve_trace_covers_all_stages() {
    let result = solve(create_moderate_problem(12.0), 4, quick_config(2)).unwrap();

    assert!(result.trace.iter().any(|t| t.stage == Stage::Greedy));
    assert!(result.trace.iter().any(|t| t.stage == Stage::LocalSearch));
    assert!(result.trace.iter().any(|t| t.stage == Stage::Vns));

    let greedy: Vec<_> = result
        .trace
        .iter()
        .filter(|t| t.stage == Stage::Greedy)
        .collect();
    assert_eq!(greedy.len(), 4);
    assert!(greedy.windows(2).all(|w| w[0].objective <= w[1].objective));

    let vns: Vec<_> = result
        .trace
        .iter()
        .filter(|t| t.stage == Stage::Vns)
        .collect();
    assert!(vns.windows(2).all(|w| w[0].step < w[1].step));
    assert_eq!(vns.last().unwrap().objective, result.objective);
}

#[test]
fn test_solve_reproducible_with_seed() {
    let a = solve(create_moderate_problem(12.0), 5, quick_config(3)).unwrap();
    let b = solve(create_moderate_problem(12.0), 5, quick_config(3)).unwrap();

    assert_eq!(a.solution, b.solution);
    assert_eq!(a.objective, b.objective);
}

#[test]
fn test_invalid_configuration_rejected() {
    let cases = vec![
        (0, quick_config(1)),
        (2, quick_config(0)),
        (2, quick_config(3)),
        (2, quick_config(1).with_vns_max_time(Duration::ZERO)),
        (2, quick_config(1).with_ls_max_iter(0)),
        (2, quick_config(1).with_vns_max_no_improv(0)),
    ];

    for (p, config) in cases {
        let result = solve(create_example_problem(), p, config);
        assert!(
            matches!(result, Err(MclpError::InvalidConfiguration(_))),
            "p={} should be rejected",
            p
        );
    }
}

#[test]
fn test_observer_abort_propagates() {
    let mut abort_in_vns = |event: &ProgressEvent| match event {
        ProgressEvent::Outer { .. } => Err(MclpError::Aborted("user cancelled".to_string())),
        _ => Ok(()),
    };

    let result = solve_with_observer(
        create_moderate_problem(12.0),
        3,
        quick_config(2),
        &mut abort_in_vns,
    );
    assert!(matches!(result, Err(MclpError::Aborted(_))));
}

#[test]
fn test_contributions_report() {
    let demand = vec![
        DemandNode::new("x", 10),
        DemandNode::new("y", 20),
        DemandNode::new("z", 5),
        DemandNode::new("w", 8),
    ];
    // Existing site x already covers y.
    let coverage = CoverageRelation::from_pairs(vec![("x", "y"), ("z", "y"), ("z", "w")]);
    let problem = Problem::new(demand, coverage, vec!["x"]);

    let result = solve(
        problem,
        1,
        quick_config(1).with_ls_strategy(LsStrategy::First),
    )
    .unwrap();

    assert_eq!(result.solution, vec!["z"]);
    assert_eq!(result.objective, 43);

    let report = &result.contributions[0];
    assert_eq!(report.site, "z");
    assert_eq!(report.own_demand, 5);
    assert_eq!(report.neighbours, 2);
    assert_eq!(report.new_neighbour_demand, 8);
    assert_eq!(report.newly_covered_demand, 13);
}

#[test]
fn test_p_larger_than_useful_candidates() {
    let demand = vec![DemandNode::new(1u32, 4), DemandNode::new(2, 6)];
    let coverage = CoverageRelation::from_pairs(vec![(1u32, 2u32)]);
    let problem = Problem::new(demand, coverage, vec![]);

    // Candidate 1 covers everything; candidate 2 adds nothing afterwards.
    let result = solve(problem, 2, quick_config(1)).unwrap();
    assert_eq!(result.solution, vec![1]);
    assert_eq!(result.objective, 10);
}

//! Unit tests for the coverage model and its building blocks.

use mclp_vns::coverage::{CoverageMatrix, CoverageModel, CoverageState};
use mclp_vns::error::MclpError;
use mclp_vns::problem::{CoverageRelation, DemandNode, DistanceRecord, Problem, Threshold};
use std::collections::{HashMap, HashSet};

/// Four demand nodes and three candidates that are not demand nodes.
///
/// Weights are `[10, 20, 5, 1]`; `A` covers n0 and n1, `B` covers n2 and n3,
/// `C` covers n0.
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

#[test]
fn test_matrix_merges_duplicates_and_sorts() {
    let matrix = CoverageMatrix::from_pairs(2, 4, vec![(0, 3), (0, 1), (0, 3), (1, 0), (1, 3)]);

    assert_eq!(matrix.n_rows(), 2);
    assert_eq!(matrix.n_cols(), 4);
    assert_eq!(matrix.nnz(), 4);
    assert_eq!(matrix.row(0), &[1, 3]);
    assert_eq!(matrix.row(1), &[0, 3]);
    assert_eq!(matrix.column(3), &[0, 1]);
    assert!(matrix.column(2).is_empty());
    assert!(matrix.covers(0, 1));
    assert!(!matrix.covers(0, 0));
}

#[test]
fn test_matrix_ignores_out_of_range_entries() {
    let matrix = CoverageMatrix::from_pairs(1, 2, vec![(0, 1), (0, 5), (3, 0)]);
    assert_eq!(matrix.nnz(), 1);
    assert_eq!(matrix.row(0), &[1]);
}

#[test]
fn test_matrix_products() {
    let matrix = CoverageMatrix::from_pairs(3, 3, vec![(0, 0), (0, 1), (1, 1), (2, 2)]);

    assert_eq!(matrix.mul_vec(&[1, 10, 100]), vec![11, 10, 100]);

    let mut out = vec![0, 0, 0];
    matrix.scatter_add(&[(1, 5), (2, -3)], &mut out);
    assert_eq!(out, vec![5, 5, -3]);
}

#[test]
fn test_model_rows_and_demand() {
    let problem = create_example_problem();
    let model = problem.build_model().unwrap();

    assert_eq!(model.n_candidates(), 3);
    assert_eq!(model.n_nodes(), 4);
    assert_eq!(model.demand(), &[10, 20, 5, 1]);
    assert_eq!(model.total_demand(), 36);
    assert_eq!(model.initial_objective(), 0);

    let a = model.candidate_row(&"A").unwrap();
    let n1 = model.node_column(&"n1").unwrap();
    assert!(model.matrix().covers(a, n1));
    assert_eq!(model.candidate_id(a), &"A");
    assert_eq!(model.node_id(n1), &"n1");
}

#[test]
fn test_model_adds_self_coverage() {
    let demand = vec![DemandNode::new(1u32, 7), DemandNode::new(2, 3)];
    // Candidate 2 has no pair at all in the relation.
    let coverage = CoverageRelation::from_pairs(vec![(1u32, 2u32)]);
    let problem = Problem::new(demand, coverage, vec![]);
    let model = problem.build_model().unwrap();

    let row = model.candidate_row(&2).unwrap();
    let col = model.node_column(&2).unwrap();
    assert_eq!(model.matrix().row(row), &[col]);
    assert_eq!(model.evaluate(&[row]), 3);
}

#[test]
fn test_model_drops_unknown_ids_silently() {
    let candidates = vec!["A", "B"];
    let nodes = vec!["n0", "n1"];
    let demand: HashMap<&str, i64> = [("n0", 4), ("n1", 6), ("ghost", 100)].into_iter().collect();
    let relation = CoverageRelation::from_pairs(vec![
        ("A", "n0"),
        ("A", "elsewhere"),
        ("Z", "n1"),
        ("B", "n1"),
    ]);

    let model =
        CoverageModel::build(&candidates, &nodes, &demand, &relation, &HashSet::new()).unwrap();

    assert_eq!(model.matrix().nnz(), 2);
    assert_eq!(model.total_demand(), 10);
    assert!(model.candidate_row(&"Z").is_none());
}

#[test]
fn test_model_zero_demand_for_unweighted_nodes() {
    let candidates = vec!["A"];
    let nodes = vec!["n0", "n1"];
    let demand: HashMap<&str, i64> = [("n0", 4)].into_iter().collect();
    let relation = CoverageRelation::from_pairs(vec![("A", "n0"), ("A", "n1")]);

    let model =
        CoverageModel::build(&candidates, &nodes, &demand, &relation, &HashSet::new()).unwrap();
    assert_eq!(model.demand(), &[4, 0]);
    assert_eq!(model.evaluate(&[0]), 4);
}

#[test]
fn test_model_rejects_negative_demand() {
    let demand = vec![DemandNode::new("n0", 4), DemandNode::new("n1", -1)];
    let problem = Problem::new(demand, CoverageRelation::new(), vec![]);

    match problem.build_model() {
        Err(MclpError::NegativeDemand { weight, .. }) => assert_eq!(weight, -1),
        other => panic!("expected NegativeDemand, got {:?}", other),
    }
}

#[test]
fn test_model_rows_of_unknown_candidate() {
    let model = create_example_problem().build_model().unwrap();
    assert_eq!(model.rows_of(&["B", "A"]).unwrap(), vec![1, 0]);
    assert!(matches!(
        model.rows_of(&["A", "n0"]),
        Err(MclpError::UnknownCandidate { .. })
    ));
}

#[test]
fn test_explicit_candidates_skip_existing_sites() {
    let demand = vec![DemandNode::new("x", 10), DemandNode::new("y", 20)];
    let coverage = CoverageRelation::from_pairs(vec![("x", "y"), ("S", "x")]);
    let problem =
        Problem::new(demand, coverage, vec!["x"]).with_candidates(vec!["x", "S", "y", "S"]);

    assert_eq!(problem.candidates, vec!["S", "y"]);
    let model = problem.build_model().unwrap();
    assert_eq!(model.candidate_ids(), &["S", "y"]);
    assert!(matches!(
        model.rows_of(&["x"]),
        Err(MclpError::UnknownCandidate { .. })
    ));
}

#[test]
fn test_initial_coverage_from_existing_sites() {
    let demand = vec![
        DemandNode::new("x", 10),
        DemandNode::new("y", 20),
        DemandNode::new("z", 5),
    ];
    let coverage = CoverageRelation::from_pairs(vec![("x", "y"), ("y", "z")]);
    let problem = Problem::new(demand, coverage, vec!["x"]);

    assert_eq!(problem.candidates, vec!["y", "z"]);

    let pre_covered = problem.pre_covered_nodes();
    assert_eq!(pre_covered, ["x", "y"].into_iter().collect());

    let model = problem.build_model().unwrap();
    assert_eq!(model.initial_coverage(), &[1, 1, 0]);
    assert_eq!(model.initial_objective(), 30);
    assert_eq!(model.evaluate(&[]), 30);
}

#[test]
fn test_relation_from_triples_and_distances() {
    let triples = CoverageRelation::from_triples(vec![(1, 2, true), (1, 3, false), (2, 3, true)]);
    assert_eq!(triples.covered_by(&1), &[2]);
    assert_eq!(triples.pair_count(), 2);
    assert_eq!(triples.site_count(), 2);
    assert!(triples.covered_by(&9).is_empty());

    let records = vec![
        DistanceRecord {
            origin: 1,
            destination: 2,
            distance: 40.0,
            time: 2.0,
        },
        DistanceRecord {
            origin: 1,
            destination: 3,
            distance: 80.0,
            time: 0.5,
        },
    ];
    let by_distance = CoverageRelation::from_distances(&records, Threshold::Distance(50.0));
    assert_eq!(by_distance.covered_by(&1), &[2]);

    let by_time = CoverageRelation::from_distances(&records, Threshold::Time(1.0));
    assert_eq!(by_time.covered_by(&1), &[3]);
}

#[test]
fn test_state_add_remove_matches_evaluator() {
    let model = create_example_problem().build_model().unwrap();
    let mut state = CoverageState::initial(&model);

    assert_eq!(state.add_row(&model, 0), 30);
    assert_eq!(state.add_row(&model, 2), 0);
    assert_eq!(state.add_row(&model, 1), 6);
    assert_eq!(state.objective(), model.evaluate(&[0, 1, 2]));

    // n0 is still covered by C.
    assert_eq!(state.remove_row(&model, 0), 20);
    assert_eq!(state.objective(), 16);
    assert_eq!(state, CoverageState::from_rows(&model, &[2, 1]));
    assert_eq!(state.recompute_objective(model.demand()), state.objective());
    assert_eq!(state.uncovered_demand(model.demand()), vec![0, 20, 0, 0]);
}

//! Command line driver: load a JSON instance, run the pipeline, report.

use clap::{ArgGroup, Parser};
use log::{info, warn};
use mclp_vns::config::{Config, LsStrategy};
use mclp_vns::problem::{CoverageRelation, DemandNode, DistanceRecord, Problem, Threshold};
use mclp_vns::progress::ProgressEvent;
use mclp_vns::utils::{
    duration_from_secs, format_duration, print_contributions, print_results_table, save_solution,
};
use mclp_vns::{error::Result, solve_with_observer};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

/// Maximum Coverage Location Problem solver (Greedy + Local Search + VNS).
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("threshold").args(["max_distance", "max_time"])))]
struct Args {
    /// JSON instance file
    instance: PathBuf,

    /// Number of sites to open
    #[arg(short, long)]
    p: usize,

    /// Coverage radius applied to the distance column
    #[arg(long)]
    max_distance: Option<f64>,

    /// Coverage radius applied to the travel time column
    #[arg(long)]
    max_time: Option<f64>,

    /// Strategy of the local search after the greedy stage (best|first)
    #[arg(long, default_value = "best")]
    ls_strategy: LsStrategy,

    #[arg(long, default_value_t = 1000)]
    ls_max_iter: usize,

    #[arg(long, default_value_t = 10)]
    k_max: usize,

    #[arg(long, default_value_t = 5000)]
    vns_max_iter: usize,

    #[arg(long, default_value_t = 500)]
    vns_max_no_improv: usize,

    /// VNS time budget in seconds
    #[arg(long, default_value_t = 300.0)]
    time_limit: f64,

    /// Strategy of the local search inside VNS (best|first)
    #[arg(long, default_value = "first")]
    vns_ls_strategy: LsStrategy,

    #[arg(long, default_value_t = 500)]
    vns_ls_max_iter: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Write the result as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Instance file layout.
#[derive(Debug, Deserialize)]
struct Instance {
    demand: Vec<DemandNode<String>>,
    #[serde(default)]
    existing_sites: Vec<String>,
    #[serde(default)]
    candidates: Option<Vec<String>>,
    /// Origin/destination table, filtered with `--max-distance` or `--max-time`
    #[serde(default)]
    distances: Vec<DistanceRecord<String>>,
    /// Pre-filtered `[site, node]` pairs
    #[serde(default)]
    coverage: Vec<(String, String)>,
}

fn load_problem(args: &Args) -> Result<Problem<String>> {
    let reader = BufReader::new(File::open(&args.instance)?);
    let instance: Instance = serde_json::from_reader(reader)?;

    let mut relation = CoverageRelation::from_pairs(instance.coverage);
    let threshold = match (args.max_distance, args.max_time) {
        (Some(d), _) => Some(Threshold::Distance(d)),
        (None, Some(t)) => Some(Threshold::Time(t)),
        (None, None) => None,
    };
    match threshold {
        Some(threshold) => {
            for (site, node) in CoverageRelation::from_distances(&instance.distances, threshold)
                .into_pairs()
            {
                relation.insert(site, node);
            }
        }
        None if !instance.distances.is_empty() => {
            warn!("Distance table ignored: pass --max-distance or --max-time to use it");
        }
        None => {}
    }

    let mut problem = Problem::new(instance.demand, relation, instance.existing_sites);
    if let Some(candidates) = instance.candidates {
        problem = problem.with_candidates(candidates);
    }
    Ok(problem)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Loading instance from {}", args.instance.display());
    let problem = load_problem(&args)?;
    info!(
        "Loaded {} demand nodes, {} candidates, {} existing sites, {} coverage pairs",
        problem.demand.len(),
        problem.candidates.len(),
        problem.existing_sites.len(),
        problem.coverage.pair_count()
    );

    let mut config = Config::new()
        .with_ls_strategy(args.ls_strategy)
        .with_ls_max_iter(args.ls_max_iter)
        .with_vns_k_max(args.k_max)
        .with_vns_max_iter(args.vns_max_iter)
        .with_vns_max_no_improv(args.vns_max_no_improv)
        .with_vns_max_time(duration_from_secs(args.time_limit)?)
        .with_vns_ls_strategy(args.vns_ls_strategy)
        .with_vns_ls_max_iter(args.vns_ls_max_iter);
    if let Some(seed) = args.seed {
        config = config.with_random_seed(seed);
    }

    let mut last_reported = 0;
    let mut report = |event: &ProgressEvent| -> Result<()> {
        if let ProgressEvent::Outer {
            iteration,
            k,
            best_objective,
            elapsed,
            ..
        } = *event
        {
            if iteration % 100 == 0 && iteration != last_reported {
                last_reported = iteration;
                info!(
                    "VNS iteration {} (k={}): best {} after {}",
                    iteration,
                    k,
                    best_objective,
                    format_duration(elapsed)
                );
            }
        }
        Ok(())
    };

    let start = Instant::now();
    let result = solve_with_observer(problem, args.p, config, &mut report)?;

    print_results_table(&result.summary);
    print_contributions(&result.contributions);
    println!("{}", result.summary.format());
    info!("Finished in {}", format_duration(start.elapsed()));

    if let Some(path) = &args.output {
        info!("Saving result to {}", path.display());
        save_solution(&result, path)?;
    }

    Ok(())
}

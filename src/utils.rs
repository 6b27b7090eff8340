//! Reporting helpers: run statistics, results table and solution export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use itertools::Itertools;
use serde::Serialize;

use crate::coverage::Weight;
use crate::error::{MclpError, Result};
use crate::solution::SiteContribution;
use crate::vns::StopReason;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Parse a time budget given in seconds.
pub fn duration_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|err| {
        MclpError::InvalidConfiguration(format!("invalid time limit {}s: {}", secs, err))
    })
}

/// Objective and runtime of one pipeline stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub name: String,
    pub objective: Weight,
    pub runtime: Duration,
}

/// Statistics about a full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub p: usize,
    pub candidates: usize,
    pub demand_nodes: usize,
    pub existing_sites: usize,
    pub total_demand: Weight,
    /// Demand covered by the existing sites alone
    pub initial_objective: Weight,
    pub stages: Vec<StageResult>,
    pub vns_iterations: usize,
    pub stop_reason: StopReason,
}

impl RunSummary {
    /// Objective of the last stage.
    pub fn final_objective(&self) -> Weight {
        self.stages
            .last()
            .map_or(self.initial_objective, |stage| stage.objective)
    }

    /// Share of the total demand covered at the end, in percent.
    pub fn coverage_percentage(&self) -> f64 {
        if self.total_demand == 0 {
            return 0.0;
        }
        100.0 * self.final_objective() as f64 / self.total_demand as f64
    }

    /// Total runtime across stages.
    pub fn runtime(&self) -> Duration {
        self.stages.iter().map(|stage| stage.runtime).sum()
    }

    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Run Statistics:
- Sites to open (p): {}
- Candidates: {}
- Demand nodes: {}
- Existing sites: {}
- Total demand: {}
- Initial objective: {}
- Final objective: {} ({:.2}%)
- VNS iterations: {} (stopped on {})
- Runtime: {}",
            self.p,
            self.candidates,
            self.demand_nodes,
            self.existing_sites,
            self.total_demand,
            self.initial_objective,
            self.final_objective(),
            self.coverage_percentage(),
            self.vns_iterations,
            self.stop_reason,
            format_duration(self.runtime())
        )
    }
}

/// Print the per-stage results to the console.
pub fn print_results_table(summary: &RunSummary) {
    println!("{:<24} {:>16} {:>10}", "Method", "Objective", "Time (s)");
    println!("{}", "-".repeat(52));
    for stage in &summary.stages {
        println!(
            "{:<24} {:>16} {:>10.2}",
            stage.name,
            stage.objective,
            stage.runtime.as_secs_f64()
        );
    }
    println!();
}

/// Print the contribution of every selected site.
pub fn print_contributions<K: std::fmt::Display>(contributions: &[SiteContribution<K>]) {
    println!(
        "{:<16} {:>12} {:>10} {:>16} {:>16}",
        "Site", "Own demand", "Neighbours", "New neighbours", "Newly covered"
    );
    for c in contributions {
        println!(
            "{:<16} {:>12} {:>10} {:>16} {:>16}",
            c.site, c.own_demand, c.neighbours, c.new_neighbour_demand, c.newly_covered_demand
        );
    }
    println!(
        "Selected: {}",
        contributions.iter().map(|c| c.site.to_string()).join(", ")
    );
    println!();
}

/// Save a serializable result as pretty JSON.
pub fn save_solution<T: Serialize, P: AsRef<Path>>(result: &T, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)?;
    Ok(())
}

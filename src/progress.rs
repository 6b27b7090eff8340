//! Progress notifications emitted by the heuristics.
//!
//! A single observer receives every event of a run. Greedy steps, local
//! search iterations and VNS outer iterations are distinguished by the
//! event variant instead of shared counters.

use crate::coverage::Weight;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A tagged progress payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A greedy insertion was made.
    Greedy {
        step: usize,
        total_steps: usize,
        objective: Weight,
    },
    /// A local search iteration finished (iteration 0 reports the start state).
    Inner {
        iteration: usize,
        max_iterations: usize,
        objective: Weight,
        /// Objective values of a few explored swaps; diagnostic only.
        sampled_objectives: Vec<Weight>,
    },
    /// VNS outer loop status.
    Outer {
        iteration: usize,
        max_iterations: usize,
        k: usize,
        best_objective: Weight,
        current_objective: Weight,
        elapsed: Duration,
    },
}

/// Receives progress events. Returning an error aborts the run and the
/// error is handed back to the caller unchanged.
pub trait ProgressObserver {
    fn notify(&mut self, event: &ProgressEvent) -> Result<()>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent) -> Result<()>,
{
    fn notify(&mut self, event: &ProgressEvent) -> Result<()> {
        self(event)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn notify(&mut self, _event: &ProgressEvent) -> Result<()> {
        Ok(())
    }
}

/// Observer that records every event, used for traces and tests.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<ProgressEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog::default()
    }
}

impl ProgressObserver for EventLog {
    fn notify(&mut self, event: &ProgressEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

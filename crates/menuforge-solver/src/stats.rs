//! Solve statistics for logging and offline benchmarking.

use std::time::{Duration, Instant};

use tracing::info;

/// Counters collected across one solve.
///
/// Returned alongside the solution and never read back by the solver;
/// benchmarking tooling compares runs through it.
#[derive(Debug, Clone)]
pub struct SolveStats {
    started: Instant,
    wall_time: Duration,
    /// Generations actually run (0 for the naive strategy).
    pub generations: u64,
    /// Full evaluations plus incremental re-scores.
    pub score_calculations: u64,
    /// Children that survived elitist truncation.
    pub accepted_children: u64,
    /// Best total cost at the end of each generation.
    pub best_costs: Vec<f64>,
    /// The soft time limit expired before the budgets did.
    pub timed_out: bool,
    /// The stall budget stopped the search.
    pub stalled: bool,
}

impl SolveStats {
    pub fn start() -> Self {
        SolveStats {
            started: Instant::now(),
            wall_time: Duration::ZERO,
            generations: 0,
            score_calculations: 0,
            accepted_children: 0,
            best_costs: Vec::new(),
            timed_out: false,
            stalled: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn record_generation(&mut self, best_cost: f64) {
        self.generations += 1;
        self.best_costs.push(best_cost);
    }

    /// Freezes the wall time and emits the summary line.
    pub fn finish(&mut self, strategy: &str, final_cost: f64) {
        self.wall_time = self.started.elapsed();
        info!(
            strategy,
            final_cost,
            generations = self.generations,
            score_calculations = self.score_calculations,
            accepted_children = self.accepted_children,
            wall_time_ms = self.wall_time.as_millis() as u64,
            timed_out = self.timed_out,
            stalled = self.stalled,
            "solve finished"
        );
    }

    pub fn wall_time(&self) -> Duration {
        self.wall_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_track_best_costs() {
        let mut stats = SolveStats::start();
        stats.record_generation(10.0);
        stats.record_generation(4.0);
        stats.finish("darwin", 4.0);
        assert_eq!(stats.generations, 2);
        assert_eq!(stats.best_costs, vec![10.0, 4.0]);
        assert!(stats.wall_time() > Duration::ZERO);
    }
}

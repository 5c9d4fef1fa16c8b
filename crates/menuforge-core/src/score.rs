//! Scores and user-facing indicator rows.

use serde::Serialize;

/// Cost breakdown of one evaluated solution.
///
/// Entries are ordered by rule position inside the compiled constraint set;
/// zero entries are kept (an indicator reads a zero as "satisfied"). The
/// total is recomputed from the parts, so `total == sum(entries)` holds by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    total: f64,
    by_rule: Vec<f64>,
}

impl Score {
    pub fn new(by_rule: Vec<f64>) -> Self {
        let total = by_rule.iter().sum();
        Score { total, by_rule }
    }

    /// Aggregate cost. Always >= 0 for well-formed rules.
    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Cost of the rule at `index` inside the compiled set.
    #[inline]
    pub fn rule_cost(&self, index: usize) -> f64 {
        self.by_rule[index]
    }

    pub fn costs(&self) -> &[f64] {
        &self.by_rule
    }

    pub fn is_zero(&self) -> bool {
        self.total == 0.0
    }

    /// Copy with one rule's cost replaced; used by incremental re-scoring.
    pub(crate) fn with_rule_cost(mut self, index: usize, cost: f64) -> Self {
        self.by_rule[index] = cost;
        self.total = self.by_rule.iter().sum();
        self
    }
}

/// Position of an observed value relative to a constraint band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandFlag {
    Ok,
    Under,
    Over,
}

/// One user-facing row of the evaluation breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct Indicator {
    /// Rule label, e.g. `"protein / day 3"`.
    pub key: String,
    pub cost: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Observed aggregated value, when the rule has one.
    pub value: Option<f64>,
    /// Percent deviation outside the band; 0 when satisfied.
    pub percent_out: f64,
    pub flag: BandFlag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_entries() {
        let score = Score::new(vec![1.5, 0.0, 3.5]);
        assert_eq!(score.total(), 5.0);
        assert_eq!(score.costs().len(), 3);
        assert_eq!(score.rule_cost(1), 0.0);
    }

    #[test]
    fn with_rule_cost_keeps_the_invariant() {
        let score = Score::new(vec![1.0, 2.0]).with_rule_cost(0, 4.0);
        assert_eq!(score.total(), 6.0);
    }
}

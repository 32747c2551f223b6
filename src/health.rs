// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Weakest-Link Health

use serde::{Deserialize, Serialize};

use crate::state::{NodeState, VarId};

/// Health at or below this is treated as a breach by reports and tests.
pub const CRITICAL_FLOOR: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Healthy above the floor.
    Normal,
    /// Healthy below the floor (the floor acts as a ceiling).
    Inverted,
}

/// A variable whose adequacy caps the node's health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Critical {
    pub var: VarId,
    pub floor: f64,
    pub direction: Direction,
}

impl Critical {
    pub const fn normal(var: VarId, floor: f64) -> Self {
        Self { var, floor, direction: Direction::Normal }
    }

    pub const fn inverted(var: VarId, floor: f64) -> Self {
        Self { var, floor, direction: Direction::Inverted }
    }

    /// Normalized distance from the floor, 0 when breached.
    pub fn score(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        let raw = match self.direction {
            Direction::Normal => (value - self.floor) / (1.0 - self.floor),
            Direction::Inverted => (self.floor - value) / self.floor,
        };
        raw.max(0.0)
    }
}

/// Health plus the index (into the critical list) of the variable that set it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub health: f64,
    pub limiting: Option<usize>,
}

/// Minimum score across all criticals; ties go to the first declared.
///
/// Deliberately not an average: one catastrophic dimension must dominate.
/// With no criticals the node is fully healthy.
pub fn evaluate(criticals: &[Critical], state: &NodeState) -> HealthReport {
    let mut report = HealthReport { health: 1.0, limiting: None };
    for (i, critical) in criticals.iter().enumerate() {
        let score = critical.score(state[critical.var]);
        if report.limiting.is_none() || score < report.health {
            report = HealthReport { health: score, limiting: Some(i) };
        }
    }
    report
}

/// Every critical's score, in declaration order.
pub fn scores(criticals: &[Critical], state: &NodeState) -> Vec<f64> {
    criticals.iter().map(|c| c.score(state[c.var])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criticals() -> Vec<Critical> {
        vec![
            Critical::normal(VarId(0), 0.30),
            Critical::normal(VarId(1), 0.25),
            Critical::inverted(VarId(2), 0.65),
        ]
    }

    #[test]
    fn test_normal_score() {
        let c = Critical::normal(VarId(0), 0.30);
        assert!((c.score(0.65) - 0.5).abs() < 1e-12);
        assert_eq!(c.score(0.10), 0.0);
        assert_eq!(c.score(1.0), 1.0);
    }

    #[test]
    fn test_inverted_score() {
        let c = Critical::inverted(VarId(0), 0.65);
        assert!((c.score(0.13) - 0.8).abs() < 1e-12);
        assert_eq!(c.score(0.9), 0.0);
        assert_eq!(c.score(0.0), 1.0);
    }

    #[test]
    fn test_minimum_not_average() {
        let state = NodeState(vec![0.95, 0.30, 0.10]);
        let report = evaluate(&criticals(), &state);
        let expected = (0.30 - 0.25) / 0.75;
        assert!((report.health - expected).abs() < 1e-12);
        assert_eq!(report.limiting, Some(1));
    }

    #[test]
    fn test_inverted_can_limit() {
        let state = NodeState(vec![0.95, 0.95, 0.60]);
        let report = evaluate(&criticals(), &state);
        assert_eq!(report.limiting, Some(2));
        assert!((report.health - 0.05 / 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        let cs = vec![Critical::normal(VarId(0), 0.5), Critical::normal(VarId(1), 0.5)];
        let report = evaluate(&cs, &NodeState(vec![0.4, 0.2]));
        assert_eq!(report.health, 0.0);
        assert_eq!(report.limiting, Some(0));
    }

    #[test]
    fn test_total_on_empty_and_nan() {
        let report = evaluate(&[], &NodeState(vec![0.1]));
        assert_eq!(report, HealthReport { health: 1.0, limiting: None });

        let report = evaluate(&criticals(), &NodeState(vec![f64::NAN, 0.9, 0.1]));
        assert_eq!(report.health, 0.0);
        assert_eq!(report.limiting, Some(0));
    }

    #[test]
    fn test_scores_in_declaration_order() {
        let s = scores(&criticals(), &NodeState(vec![0.65, 0.25, 0.0]));
        assert_eq!(s.len(), 3);
        assert!((s[0] - 0.5).abs() < 1e-12);
        assert_eq!(s[1], 0.0);
        assert_eq!(s[2], 1.0);
    }
}

// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Federation Aggregate -- network-wide coordination metrics.
//!
//! Every metric is a first-order relaxation toward a target computed from
//! population statistics. The adversarial loop is the capture chain: a node
//! pulling far ahead of the mean raises capture risk, capture erodes
//! transparency, and transparency gates both resource redistribution and
//! migration governance, which are the multipliers the flow computation
//! uses. Dominance therefore throttles the very flows that sustain it.

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::state::NodeState;
use crate::types::AggregateMetric;

// -- Parameters -------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateParams {
    /// Lead over the mean health tolerated before capture risk builds.
    pub capture_slack: f64,
    pub capture_rate: f64,
    pub transparency_recovery: f64,
    /// Transparency lost per unit of capture risk.
    pub transparency_erosion: f64,
    /// Rate for containment, migration governance, redistribution and accounting.
    pub slow_rate: f64,
    /// Rate for diversity and externalization.
    pub fast_rate: f64,
    pub diversity_floor: f64,
    pub diversity_gain: f64,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            capture_slack: 0.2,
            capture_rate: 1.0,
            transparency_recovery: 0.02,
            transparency_erosion: 0.10,
            slow_rate: 0.02,
            fast_rate: 0.5,
            diversity_floor: 0.3,
            diversity_gain: 10.0,
        }
    }
}

// -- Population statistics --------------------------------------------------

/// Summary of the node population after a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub mean_health: f64,
    pub max_health: f64,
    pub std_health: f64,
    pub min_health: f64,
    pub mean_governance: f64,
    pub mean_assimilation: f64,
    /// Standard deviation of each capability dimension across nodes.
    pub capability_std: Vec<f64>,
}

impl PopulationStats {
    pub fn collect(model: &Model, states: &[&NodeState], healths: &[f64]) -> Self {
        if states.is_empty() {
            return Self::default();
        }
        let bindings = &model.flows;
        let governance: Vec<f64> = states
            .iter()
            .map(|s| model.eval_on_state(&bindings.governance, s))
            .collect();
        let assimilation: Vec<f64> = states
            .iter()
            .map(|s| model.eval_on_state(&bindings.assimilation, s))
            .collect();
        let capability_std = bindings
            .capabilities
            .iter()
            .map(|id| {
                let column: Vec<f64> = states.iter().map(|s| s[*id]).collect();
                std_dev(&column)
            })
            .collect();
        Self {
            mean_health: mean(healths),
            max_health: healths.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_health: std_dev(healths),
            min_health: healths.iter().copied().fold(f64::INFINITY, f64::min),
            mean_governance: mean(&governance),
            mean_assimilation: mean(&assimilation),
            capability_std,
        }
    }
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation.
pub(crate) fn std_dev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
}

// -- FederationAggregate ----------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FederationAggregate {
    pub transparency: f64,
    pub capture_risk: f64,
    pub knowledge_diversity: f64,
    /// Isolation protocol effectiveness; isolation only fires above the
    /// activation threshold.
    pub containment: f64,
    pub migration_governance: f64,
    pub resource_redistribution: f64,
    pub ecological_accounting: f64,
    pub externalization: f64,
}

impl Default for FederationAggregate {
    fn default() -> Self {
        Self {
            transparency: 0.80,
            capture_risk: 0.10,
            knowledge_diversity: 0.75,
            containment: 0.70,
            migration_governance: 0.72,
            resource_redistribution: 0.65,
            ecological_accounting: 0.68,
            externalization: 0.10,
        }
    }
}

impl FederationAggregate {
    pub fn metric(&self, metric: AggregateMetric) -> f64 {
        match metric {
            AggregateMetric::Transparency => self.transparency,
            AggregateMetric::CaptureRisk => self.capture_risk,
            AggregateMetric::KnowledgeDiversity => self.knowledge_diversity,
            AggregateMetric::Containment => self.containment,
            AggregateMetric::MigrationGovernance => self.migration_governance,
            AggregateMetric::ResourceRedistribution => self.resource_redistribution,
            AggregateMetric::EcologicalAccounting => self.ecological_accounting,
            AggregateMetric::Externalization => self.externalization,
        }
    }

    /// Capture risk the current population is pushing toward.
    pub fn capture_target(stats: &PopulationStats, params: &AggregateParams) -> f64 {
        let lead = (stats.max_health - stats.mean_health - params.capture_slack).max(0.0);
        (2.0 * lead).min(1.0)
    }

    /// Advance every metric by one step.
    pub fn update(&mut self, stats: &PopulationStats, params: &AggregateParams, dt: f64) {
        let relax = |x: &mut f64, target: f64, rate: f64| *x += dt * rate * (target - *x);

        relax(
            &mut self.capture_risk,
            Self::capture_target(stats, params),
            params.capture_rate,
        );
        self.transparency += dt
            * (params.transparency_recovery * (1.0 - self.transparency)
                - params.transparency_erosion * self.capture_risk);

        relax(&mut self.containment, stats.mean_governance, params.slow_rate);
        relax(
            &mut self.migration_governance,
            stats.mean_assimilation * self.transparency,
            params.slow_rate,
        );
        relax(
            &mut self.resource_redistribution,
            self.transparency,
            params.slow_rate,
        );
        relax(
            &mut self.ecological_accounting,
            stats.mean_health,
            params.slow_rate,
        );

        let spread = mean(&stats.capability_std);
        relax(
            &mut self.knowledge_diversity,
            (params.diversity_floor + params.diversity_gain * spread).min(1.0),
            params.fast_rate,
        );
        relax(
            &mut self.externalization,
            (0.5 - stats.mean_health).max(0.0) * stats.std_health,
            params.fast_rate,
        );

        self.clamp();
    }

    fn fields_mut(&mut self) -> [&mut f64; 8] {
        [
            &mut self.transparency,
            &mut self.capture_risk,
            &mut self.knowledge_diversity,
            &mut self.containment,
            &mut self.migration_governance,
            &mut self.resource_redistribution,
            &mut self.ecological_accounting,
            &mut self.externalization,
        ]
    }

    /// Force every metric into `[0, 1]`; NaN resets to 0.
    pub fn clamp(&mut self) {
        for field in self.fields_mut() {
            *field = if field.is_nan() { 0.0 } else { field.clamp(0.0, 1.0) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean_h: f64, max_h: f64) -> PopulationStats {
        PopulationStats {
            mean_health: mean_h,
            max_health: max_h,
            std_health: 0.1,
            min_health: 0.0,
            mean_governance: 0.7,
            mean_assimilation: 0.5,
            capability_std: vec![0.05, 0.05],
        }
    }

    fn run(s: &PopulationStats, steps: usize) -> FederationAggregate {
        let params = AggregateParams::default();
        let mut agg = FederationAggregate::default();
        for _ in 0..steps {
            agg.update(s, &params, 0.1);
        }
        agg
    }

    #[test]
    fn test_capture_needs_lead_beyond_slack() {
        let p = AggregateParams::default();
        assert_eq!(FederationAggregate::capture_target(&stats(0.5, 0.65), &p), 0.0);
        let t = FederationAggregate::capture_target(&stats(0.4, 0.9), &p);
        assert!((t - 0.6).abs() < 1e-12);
        assert_eq!(FederationAggregate::capture_target(&stats(0.0, 1.0), &p), 1.0);
    }

    #[test]
    fn test_dominance_erodes_transparency_then_redistribution() {
        let balanced = run(&stats(0.5, 0.6), 300);
        let dominated = run(&stats(0.4, 0.9), 300);

        assert!(balanced.capture_risk < 0.01);
        assert!(dominated.capture_risk > 0.5);
        assert!(dominated.transparency < balanced.transparency - 0.3);
        assert!(dominated.resource_redistribution < balanced.resource_redistribution);
        assert!(dominated.migration_governance < balanced.migration_governance);
    }

    #[test]
    fn test_relaxations_track_population() {
        let agg = run(&stats(0.5, 0.6), 2000);
        assert!((agg.containment - 0.7).abs() < 0.01);
        assert!((agg.knowledge_diversity - 0.8).abs() < 1e-6);
        assert!((agg.ecological_accounting - 0.5).abs() < 0.01);
        assert!(agg.externalization < 1e-6);
    }

    #[test]
    fn test_metrics_stay_in_unit_range() {
        let mut agg = FederationAggregate {
            transparency: 1.4,
            externalization: f64::NAN,
            ..FederationAggregate::default()
        };
        agg.clamp();
        assert_eq!(agg.transparency, 1.0);
        assert_eq!(agg.externalization, 0.0);

        let extreme = PopulationStats {
            capability_std: vec![0.5],
            ..stats(0.0, 1.0)
        };
        let agg = run(&extreme, 500);
        for m in AggregateMetric::ALL {
            let v = agg.metric(m);
            assert!((0.0..=1.0).contains(&v), "{} = {v}", m.as_str());
        }
    }

    #[test]
    fn test_population_std_helpers() {
        assert_eq!(mean(&[]), 0.0);
        assert!((std_dev(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(std_dev(&[0.4]), 0.0);
    }
}

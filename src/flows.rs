// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Inter-Node Flows

use serde::{Deserialize, Serialize};

use crate::federation::FederationAggregate;
use crate::model::Model;
use crate::state::{NodeState, VarId};
use crate::topology::Network;
use crate::types::{FlowKind, FlowTotals};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    /// Capability level above which a node has something to share.
    pub surplus_level: f64,
    pub knowledge_rate: f64,
    /// Complementary surplus product below which no synergy bonus applies.
    pub synergy_threshold: f64,
    /// Fraction of the synergy product credited to each side.
    pub synergy_share: f64,
    pub resource_rate: f64,
    /// Reserve level that separates exporters from importers.
    pub reserve: f64,
    pub migration_rate: f64,
    pub ecological_rate: f64,
    /// Ecology below this leaks degradation downstream.
    pub ecological_threshold: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            surplus_level: 0.65,
            knowledge_rate: 0.4,
            synergy_threshold: 0.03,
            synergy_share: 0.5,
            resource_rate: 0.03,
            reserve: 0.60,
            migration_rate: 0.02,
            ecological_rate: 0.10,
            ecological_threshold: 0.75,
        }
    }
}

/// A complementary pair that cleared the materiality threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynergyEvent {
    pub source: usize,
    pub target: usize,
    /// Index into the model's synergy pairs.
    pub pair: usize,
    pub magnitude: f64,
}

/// Everything flowing across the network in one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowField {
    pub totals: Vec<FlowTotals>,
    pub synergy: Vec<SynergyEvent>,
    /// Bonus credited per synergy pair, both sides counted.
    pub synergy_totals: Vec<f64>,
}

impl FlowField {
    /// All-zero field for `size` nodes.
    pub fn empty(size: usize, pairs: usize) -> Self {
        Self {
            totals: vec![FlowTotals::default(); size],
            synergy: Vec::new(),
            synergy_totals: vec![0.0; pairs],
        }
    }

    /// Network-wide inflow of one kind.
    pub fn total(&self, kind: FlowKind) -> f64 {
        self.totals.iter().map(|t| t.inflow(kind)).sum()
    }
}

/// Compute one step of flows from a consistent snapshot.
///
/// Every ordered pair `(i, j)` with an edge is visited once; `i` is the
/// source. Isolated nodes neither send nor receive anything.
pub fn compute(
    model: &Model,
    states: &[&NodeState],
    healths: &[f64],
    network: &Network,
    isolated: &[bool],
    aggregate: &FederationAggregate,
    params: &FlowParams,
) -> FlowField {
    let n = states.len();
    let bindings = &model.flows;
    let mut field = FlowField::empty(n, bindings.synergy.len());

    let surplus = |x: f64| (x - params.surplus_level).max(0.0);
    let assimilation: Vec<f64> = states
        .iter()
        .map(|s| model.eval_on_state(&bindings.assimilation, s))
        .collect();
    let governance: Vec<f64> = states
        .iter()
        .map(|s| model.eval_on_state(&bindings.governance, s))
        .collect();
    let ecology: Vec<f64> = states
        .iter()
        .map(|s| model.eval_on_state(&bindings.ecology, s))
        .collect();
    let weights: Vec<Vec<f64>> = states
        .iter()
        .map(|s| {
            bindings
                .surplus_weights
                .iter()
                .map(|w| model.eval_on_state(w, s))
                .collect()
        })
        .collect();
    let weight = |node: usize, dim: Option<usize>| {
        dim.and_then(|d| weights[node].get(d).copied()).unwrap_or(1.0)
    };
    let dim_of = |id: VarId| bindings.capabilities.iter().position(|&c| c == id);
    let pair_dims: Vec<(Option<usize>, Option<usize>)> = bindings
        .synergy
        .iter()
        .map(|p| (dim_of(p.a), dim_of(p.b)))
        .collect();

    for i in 0..n {
        if isolated[i] {
            continue;
        }
        let a = states[i];
        for &(j, w) in network.neighbors(i) {
            if j >= n || isolated[j] {
                continue;
            }
            let b = states[j];

            // knowledge: source surplus times target deficit, per dimension
            let knowledge: f64 = bindings
                .capabilities
                .iter()
                .enumerate()
                .map(|(k, &d)| surplus(a[d]) * weight(i, Some(k)) * (a[d] - b[d]).max(0.0))
                .sum();
            field.totals[j].knowledge_in += w * params.knowledge_rate * knowledge;

            for (p, pair) in bindings.synergy.iter().enumerate() {
                let (da, db) = pair_dims[p];
                let product =
                    surplus(a[pair.a]) * weight(i, da) * surplus(b[pair.b]) * weight(j, db);
                if product > params.synergy_threshold {
                    let bonus = params.synergy_share * product * w;
                    field.totals[i].knowledge_in += bonus;
                    field.totals[j].knowledge_in += bonus;
                    field.synergy_totals[p] += 2.0 * bonus;
                    field.synergy.push(SynergyEvent {
                        source: i,
                        target: j,
                        pair: p,
                        magnitude: product * w,
                    });
                }
            }

            let r = bindings.reserve;
            let resources = w
                * params.resource_rate
                * (a[r] - params.reserve).max(0.0)
                * (params.reserve - b[r]).max(0.0)
                * aggregate.resource_redistribution;
            field.totals[j].resources_in += resources;
            field.totals[i].resources_out += resources;

            let migration = w
                * params.migration_rate
                * (healths[j] - healths[i]).max(0.0)
                * assimilation[j]
                * governance[j]
                * aggregate.migration_governance;
            field.totals[j].migration_in += migration;
            field.totals[i].migration_out += migration;

            // physical spillover, not gated by any federation multiplier
            field.totals[j].ecological_in +=
                w * params.ecological_rate * (params.ecological_threshold - ecology[i]).max(0.0);
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::presets;
    use crate::types::TopologyPolicy;

    fn pair_network(w: f64) -> Network {
        Network::from_matrix(TopologyPolicy::Random, 2, vec![0.0, w, w, 0.0])
    }

    fn states(model: &Model) -> (NodeState, NodeState) {
        let base = model.schema.base_state();
        (base.clone(), base)
    }

    fn set(model: &Model, s: &mut NodeState, name: &str, v: f64) {
        let id = model.var(name).unwrap();
        s[id] = v;
    }

    #[test]
    fn test_knowledge_flows_down_the_gradient() {
        let model = presets::federation().unwrap();
        let (mut a, b) = states(&model);
        set(&model, &mut a, "k_kinesthetic", 0.95);
        let field = compute(
            &model,
            &[&a, &b],
            &[0.5, 0.5],
            &pair_network(0.8),
            &[false, false],
            &FederationAggregate::default(),
            &FlowParams::default(),
        );
        // 0.8 * 0.4 * (0.95 - 0.65) * (0.95 - 0.70)
        assert!((field.totals[1].knowledge_in - 0.024).abs() < 1e-9);
        assert_eq!(field.totals[0].knowledge_in, 0.0);
    }

    #[test]
    fn test_surplus_weights_scale_exports() {
        let model = presets::seeded().unwrap();
        let (mut a, b) = states(&model);
        set(&model, &mut a, "k_kinesthetic", 0.95);
        let received = |a: &NodeState| {
            compute(
                &model,
                &[a, &b],
                &[0.5, 0.5],
                &pair_network(0.8),
                &[false, false],
                &FederationAggregate::default(),
                &FlowParams::default(),
            )
            .totals[1]
                .knowledge_in
        };
        // craft surplus is weighted by practice depth: 0.8 * 0.4 * 0.30 * 0.65 * 0.27
        assert!((received(&a) - 0.016848).abs() < 1e-9);
        set(&model, &mut a, "practice_depth", 0.0);
        assert_eq!(received(&a), 0.0);
    }

    #[test]
    fn test_synergy_is_a_hard_cutoff() {
        let model = presets::federation().unwrap();
        let (mut a, mut b) = states(&model);
        set(&model, &mut a, "k_kinesthetic", 0.90);
        set(&model, &mut a, "k_relational", 0.90);
        set(&model, &mut b, "k_kinesthetic", 0.90);
        set(&model, &mut b, "k_relational", 0.90);
        let params = FlowParams::default();
        let agg = FederationAggregate::default();
        let run = |a: &NodeState, b: &NodeState| {
            compute(&model, &[a, b], &[0.5, 0.5], &pair_network(1.0), &[false, false], &agg, &params)
        };

        // 0.25 * 0.25 = 0.0625 > 0.03 in both directions
        let field = run(&a, &b);
        assert_eq!(field.synergy.len(), 2);
        assert!((field.synergy_totals[0] - 2.0 * 0.0625).abs() < 1e-9);

        // 0.15 * 0.15 = 0.0225 just under the threshold: nothing at all
        set(&model, &mut a, "k_kinesthetic", 0.80);
        set(&model, &mut b, "k_kinesthetic", 0.70);
        set(&model, &mut b, "k_relational", 0.80);
        let field = run(&a, &b);
        assert!(field.synergy.is_empty());
        assert_eq!(field.synergy_totals[0], 0.0);
    }

    #[test]
    fn test_resources_move_from_surplus_to_deficit() {
        let model = presets::federation().unwrap();
        let (mut a, mut b) = states(&model);
        set(&model, &mut a, "food_security", 0.90);
        set(&model, &mut b, "food_security", 0.40);
        let agg = FederationAggregate::default();
        let field = compute(
            &model,
            &[&a, &b],
            &[0.5, 0.5],
            &pair_network(1.0),
            &[false, false],
            &agg,
            &FlowParams::default(),
        );
        let expected = 0.03 * 0.30 * 0.20 * agg.resource_redistribution;
        assert!((field.totals[1].resources_in - expected).abs() < 1e-12);
        assert!((field.totals[0].resources_out - expected).abs() < 1e-12);
        assert_eq!(field.totals[0].resources_in, 0.0);
    }

    #[test]
    fn test_migration_is_governed_by_the_receiver() {
        let model = presets::federation().unwrap();
        let (a, mut b) = states(&model);
        let agg = FederationAggregate::default();
        let field = compute(
            &model,
            &[&a, &b],
            &[0.2, 0.6],
            &pair_network(1.0),
            &[false, false],
            &agg,
            &FlowParams::default(),
        );
        let expected = 0.02 * 0.4 * 0.60 * 0.72 * agg.migration_governance;
        assert!((field.totals[1].migration_in - expected).abs() < 1e-12);
        assert!((field.totals[0].migration_out - expected).abs() < 1e-12);

        set(&model, &mut b, "assimilation_cap", 0.0);
        let field = compute(
            &model,
            &[&a, &b],
            &[0.2, 0.6],
            &pair_network(1.0),
            &[false, false],
            &agg,
            &FlowParams::default(),
        );
        assert_eq!(field.total(FlowKind::Migration), 0.0);
    }

    #[test]
    fn test_ecological_spillover_ignores_multipliers() {
        let model = presets::federation().unwrap();
        let (mut a, b) = states(&model);
        set(&model, &mut a, "soil_carbon", 0.2);
        set(&model, &mut a, "biodiversity", 0.2);
        set(&model, &mut a, "water_retention", 0.2);
        let agg = FederationAggregate {
            transparency: 0.0,
            resource_redistribution: 0.0,
            migration_governance: 0.0,
            ..FederationAggregate::default()
        };
        let field = compute(
            &model,
            &[&a, &b],
            &[0.5, 0.5],
            &pair_network(0.5),
            &[false, false],
            &agg,
            &FlowParams::default(),
        );
        assert!((field.totals[1].ecological_in - 0.5 * 0.10 * 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_nodes_are_cut_off() {
        let model = presets::federation().unwrap();
        let (mut a, mut b) = states(&model);
        set(&model, &mut a, "soil_carbon", 0.1);
        set(&model, &mut a, "food_security", 0.95);
        set(&model, &mut b, "food_security", 0.30);
        let field = compute(
            &model,
            &[&a, &b],
            &[0.1, 0.9],
            &pair_network(1.0),
            &[true, false],
            &FederationAggregate::default(),
            &FlowParams::default(),
        );
        assert!(field.totals.iter().all(FlowTotals::is_zero));
        assert!(field.synergy.is_empty());
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Scenario Harness

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;

use crate::config::{InitMode, ResolvedScenario, ScenarioConfig};
use crate::error::{ConfigError, Result};
use crate::federation::{FederationAggregate, PopulationStats};
use crate::flows::{self, FlowField};
use crate::health::HealthReport;
use crate::history::{History, HEALTH};
use crate::isolation::{IsolationController, LinkState};
use crate::kernel::{self, Node, StepInputs};
use crate::state::{BoundCorrection, NodeState};
use crate::topology::Network;
use crate::types::{AggregateMetric, FlowKind, Profile, StressKind};

/// Share of nodes that break the profile cycle for a random specialization.
const PROFILE_SHUFFLE: f64 = 0.2;

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Per-step summary returned by [`Simulation::step_core`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub mean_health: f64,
    pub min_health: f64,
    pub max_health: f64,
    pub isolated_count: usize,
    pub newly_isolated: Vec<usize>,
    pub synergy_events: usize,
    pub clamp_corrections: usize,
    pub aggregate: FederationAggregate,
}

/// Read-only view of one node for collaborators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: u32,
    pub profile: Option<Profile>,
    pub health: f64,
    pub limiting: Option<String>,
    pub link: LinkState,
    pub values: BTreeMap<String, f64>,
}

// ─── Simulation struct ───────────────────────────────────────────────────────

/// Explicit run context: every piece of mutable state a run touches.
#[wasm_bindgen]
pub struct Simulation {
    pub(crate) scenario: ResolvedScenario,
    pub(crate) network: Network,
    pub(crate) profiles: Vec<Option<Profile>>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) reports: Vec<HealthReport>,
    pub(crate) isolation: IsolationController,
    pub(crate) aggregate: FederationAggregate,
    pub(crate) history: History,
    pub(crate) last_flows: FlowField,
    pub(crate) step: usize,
}

impl Simulation {
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        Self::from_resolved(config.resolve()?)
    }

    pub fn from_resolved(scenario: ResolvedScenario) -> Result<Self> {
        let cfg = &scenario.config;
        let model = &scenario.model;
        let n = scenario.node_count();
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);

        let profiles: Vec<Option<Profile>> = match cfg.init.mode {
            InitMode::Variance => vec![None; n],
            InitMode::Profiles => (0..n)
                .map(|i| {
                    let cycled = Profile::ALL[i % Profile::ALL.len()];
                    if rng.gen::<f64>() < PROFILE_SHUFFLE {
                        Some(Profile::ALL[rng.gen_range(0..Profile::ALL.len())])
                    } else {
                        Some(cycled)
                    }
                })
                .collect(),
        };
        let assigned: Option<Vec<Profile>> = profiles.iter().copied().collect();
        let network =
            Network::build_with_profiles(n, scenario.policy, cfg.topology_seed, assigned.as_deref())?;

        let aggregate = FederationAggregate::default();
        let nodes: Vec<Node> = (0..n)
            .map(|i| {
                let mut state = model.initial_state(&mut rng, cfg.init.variance, profiles[i]);
                for &(id, value) in &scenario.overrides {
                    state[id] = value;
                }
                let (node, corrections) = Node::spawn(model, i as u32, state, &aggregate);
                log_corrections(model, i, 0, &corrections);
                node
            })
            .collect();
        let reports = nodes.iter().map(|node| model.health(&node.state)).collect();

        info!(
            scenario = %cfg.name,
            model = %model.name,
            nodes = n,
            topology = scenario.policy.as_str(),
            edges = network.edge_count(),
            steps = cfg.steps,
            "scenario initialized"
        );
        for (node, stress) in scenario.stresses.iter().enumerate() {
            for (kind, magnitude) in stress.active() {
                debug!(
                    node,
                    stress = kind.as_str(),
                    magnitude,
                    onset = cfg.stress_onset,
                    "stress scheduled"
                );
            }
        }

        let history = History::new(&cfg.name, &model.name, model.critical_names(), n, cfg.dt);
        Ok(Self {
            isolation: IsolationController::new(n, cfg.isolation),
            last_flows: FlowField::empty(n, model.flows.synergy.len()),
            scenario,
            network,
            profiles,
            nodes,
            reports,
            aggregate,
            history,
            step: 0,
        })
    }

    /// Advance the whole network by one step.
    ///
    /// Flows come from the previous snapshot and previous isolation flags;
    /// nodes are advanced into a fresh vector; only then are health,
    /// isolation and the aggregate updated.
    pub fn step_core(&mut self) -> StepReport {
        let t = self.step;
        let scenario = &self.scenario;
        let model = &scenario.model;
        let cfg = &scenario.config;

        let states: Vec<&NodeState> = self.nodes.iter().map(|n| &n.state).collect();
        let healths: Vec<f64> = self.reports.iter().map(|r| r.health).collect();
        let isolated = self.isolation.flags();
        let field = flows::compute(
            model,
            &states,
            &healths,
            &self.network,
            &isolated,
            &self.aggregate,
            &cfg.flows,
        );

        let mut clamp_corrections = 0;
        let next: Vec<Node> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let stress = scenario.stress_at(i, t);
                let inputs = StepInputs {
                    stress: &stress,
                    flows: &field.totals[i],
                    aggregate: &self.aggregate,
                    isolated_for: self.isolation.isolated_for(i, t),
                };
                let out = kernel::advance(model, node, &inputs, cfg.dt);
                clamp_corrections += out.corrections.len();
                log_corrections(model, i, t, &out.corrections);
                out.node
            })
            .collect();
        self.nodes = next;

        self.reports = self.nodes.iter().map(|n| model.health(&n.state)).collect();
        let healths: Vec<f64> = self.reports.iter().map(|r| r.health).collect();
        let newly_isolated = self
            .isolation
            .evaluate(t, &healths, self.aggregate.containment);

        let states: Vec<&NodeState> = self.nodes.iter().map(|n| &n.state).collect();
        let stats = PopulationStats::collect(model, &states, &healths);
        self.aggregate.update(&stats, &cfg.aggregate, cfg.dt);

        self.last_flows = field;
        self.record(t, &stats, &newly_isolated, clamp_corrections);
        self.step += 1;
        if self.is_finished() {
            self.history.seal();
        }

        StepReport {
            step: t,
            mean_health: stats.mean_health,
            min_health: stats.min_health,
            max_health: stats.max_health,
            isolated_count: self.isolation.isolated_count(),
            newly_isolated,
            synergy_events: self.last_flows.synergy.len(),
            clamp_corrections,
            aggregate: self.aggregate,
        }
    }

    fn record(
        &mut self,
        t: usize,
        stats: &PopulationStats,
        newly_isolated: &[usize],
        clamp_corrections: usize,
    ) {
        let model = &self.scenario.model;
        let h = &mut self.history;

        h.push_global("mean_health", stats.mean_health);
        h.push_global("min_health", stats.min_health);
        h.push_global("max_health", stats.max_health);
        h.push_global("std_health", stats.std_health);
        h.push_global("isolated_count", self.isolation.isolated_count() as f64);
        for metric in AggregateMetric::ALL {
            h.push_global(metric.as_str(), self.aggregate.metric(metric));
        }
        for kind in FlowKind::ALL {
            h.push_global(&format!("flow_{}", kind.as_str()), self.last_flows.total(kind));
        }
        for (pair, total) in model.flows.synergy.iter().zip(&self.last_flows.synergy_totals) {
            h.push_global(&format!("synergy_{}", pair.name), *total);
        }
        h.push_global("synergy_events", self.last_flows.synergy.len() as f64);
        h.push_global("clamp_corrections", clamp_corrections as f64);

        for (i, (node, report)) in self.nodes.iter().zip(&self.reports).enumerate() {
            h.push_node(i, HEALTH, report.health);
            h.push_limiting(i, report.limiting);
            for (id, spec) in model.schema.iter() {
                h.push_node(i, &spec.name, node.state[id]);
            }
            for (spec, value) in model.composites.iter().zip(model.composites_of(&node.state)) {
                h.push_node(i, &spec.name, value);
            }
        }
        for &i in newly_isolated {
            h.mark_isolated(i, t);
        }
        h.end_step();
    }

    /// Run every remaining configured step.
    pub fn run(&mut self) -> &History {
        while !self.is_finished() {
            self.step_core();
        }
        info!(
            scenario = %self.scenario.config.name,
            steps = self.step,
            isolated = self.isolation.isolated_count(),
            "scenario finished"
        );
        &self.history
    }

    /// Run a configuration start to finish.
    pub fn run_config(config: ScenarioConfig) -> Result<History> {
        let mut sim = Self::new(config)?;
        sim.run();
        Ok(sim.into_history())
    }

    /// Change one node's post-onset stress mid-run.
    pub fn set_stress_core(&mut self, node: u32, kind: &str, magnitude: f64) -> Result<()> {
        let count = self.scenario.config.node_count;
        if node >= count {
            return Err(ConfigError::UnknownNode { node, count });
        }
        let kind: StressKind = kind.parse()?;
        if !(0.0..=1.0).contains(&magnitude) {
            return Err(ConfigError::StressOutOfRange {
                node,
                kind: kind.as_str().to_string(),
                value: magnitude,
            });
        }
        self.scenario.stresses[node as usize].set(kind, magnitude);
        self.scenario
            .config
            .stresses
            .entry(node)
            .or_default()
            .insert(kind.as_str().to_string(), magnitude);
        Ok(())
    }

    pub fn reset_core(&mut self) -> Result<()> {
        *self = Self::from_resolved(self.scenario.clone())?;
        Ok(())
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// Recorded series so far. Terminal snapshots are filled once the last
    /// configured step has run.
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_history(mut self) -> History {
        self.history.seal();
        self.history
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.scenario.config.steps
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn scenario(&self) -> &ResolvedScenario {
        &self.scenario
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn aggregate(&self) -> &FederationAggregate {
        &self.aggregate
    }

    pub fn isolation(&self) -> &IsolationController {
        &self.isolation
    }

    /// Flows applied during the most recent step.
    pub fn last_flows(&self) -> &FlowField {
        &self.last_flows
    }

    pub fn profiles(&self) -> &[Option<Profile>] {
        &self.profiles
    }

    pub fn node_views(&self) -> Vec<NodeView> {
        let model = &self.scenario.model;
        let names = &self.history.critical_names;
        self.nodes
            .iter()
            .zip(&self.reports)
            .enumerate()
            .map(|(i, (node, report))| NodeView {
                id: node.id,
                profile: self.profiles[i],
                health: report.health,
                limiting: report.limiting.and_then(|l| names.get(l).cloned()),
                link: self.isolation.state(i),
                values: model
                    .schema
                    .iter()
                    .map(|(id, spec)| (spec.name.clone(), node.state[id]))
                    .collect(),
            })
            .collect()
    }
}

fn log_corrections(
    model: &crate::model::Model,
    node: usize,
    step: usize,
    corrections: &[BoundCorrection],
) {
    for c in corrections {
        let var = model.schema.name(c.var);
        if c.observed.is_nan() {
            warn!(node, step, var, corrected = c.corrected, "NaN state value repaired");
        } else {
            debug!(
                node,
                step,
                var,
                observed = c.observed,
                corrected = c.corrected,
                "clamped out-of-range value"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(steps: usize) -> ScenarioConfig {
        ScenarioConfig {
            name: "small".into(),
            node_count: 12,
            steps,
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn test_every_series_has_one_sample_per_step() {
        let history = Simulation::run_config(small(20)).unwrap();
        assert_eq!(history.step_count, 20);
        assert!(history.is_consistent());
        for name in ["mean_health", "capture_risk", "flow_ecological", "synergy_craft_coordination"] {
            assert_eq!(history.global_signal(name).map(<[f64]>::len), Some(20), "{name}");
        }
        assert!(history.node_signal(3, "ecology").is_some());
        assert!(history.node_signal(3, "soil_carbon").is_some());
        assert_eq!(history.terminal.len(), 12);
    }

    #[test]
    fn test_identical_config_identical_history() {
        let a = Simulation::run_config(small(40)).unwrap();
        let b = Simulation::run_config(small(40)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_initial_state() {
        let a = Simulation::new(small(1)).unwrap();
        let b = Simulation::new(ScenarioConfig { seed: 7, ..small(1) }).unwrap();
        assert_ne!(a.nodes()[0].state, b.nodes()[0].state);
    }

    #[test]
    fn test_profiles_mode_assigns_every_node() {
        let mut cfg = small(5);
        cfg.init.mode = InitMode::Profiles;
        cfg.init.variance = 0.12;
        let sim = Simulation::new(cfg).unwrap();
        assert!(sim.profiles().iter().all(Option::is_some));
        assert_eq!(sim.node_views().len(), 12);
    }

    #[test]
    fn test_overrides_apply_to_every_node() {
        let mut cfg = small(1);
        cfg.overrides.insert("sovereignty_intact".into(), 0.55);
        let sim = Simulation::new(cfg).unwrap();
        let model = &sim.scenario().model;
        let sov = model.var("sovereignty_intact").unwrap();
        assert!(sim.nodes().iter().all(|n| n.state[sov] == 0.55));
    }

    #[test]
    fn test_set_stress_validates() {
        let mut sim = Simulation::new(small(1)).unwrap();
        assert!(sim.set_stress_core(2, "drought", 0.4).is_ok());
        assert_eq!(sim.scenario().stresses[2].get(StressKind::Drought), 0.4);
        assert!(matches!(
            sim.set_stress_core(40, "drought", 0.4),
            Err(ConfigError::UnknownNode { .. })
        ));
        assert!(sim.set_stress_core(2, "flood", 0.4).is_err());
        assert!(sim.set_stress_core(2, "drought", 2.0).is_err());
    }

    #[test]
    fn test_reset_replays_from_the_start() {
        let mut sim = Simulation::new(small(10)).unwrap();
        let first = sim.step_core();
        sim.run();
        sim.reset_core().unwrap();
        assert_eq!(sim.current_step(), 0);
        assert_eq!(sim.step_core(), first);
    }

    #[test]
    fn test_terminal_snapshots_fill_on_the_last_step() {
        let mut sim = Simulation::new(small(3)).unwrap();
        sim.step_core();
        assert!(sim.history().terminal.is_empty());
        sim.step_core();
        sim.step_core();
        let history = sim.history();
        assert_eq!(history.terminal.len(), 12);
        assert_eq!(Some(history.terminal[5].health), history.final_health(5));

        let mut partial = Simulation::new(small(3)).unwrap();
        partial.step_core();
        assert_eq!(partial.into_history().terminal.len(), 12);
    }

    #[test]
    fn test_unbuildable_network_is_an_error() {
        let mut scenario = small(3).resolve().unwrap();
        scenario.config.node_count = 0;
        assert!(matches!(
            Simulation::from_resolved(scenario),
            Err(ConfigError::EmptyNetwork)
        ));
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Scenario Configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, Result};
use crate::federation::AggregateParams;
use crate::flows::FlowParams;
use crate::isolation::IsolationParams;
use crate::model::{presets, Model};
use crate::state::VarId;
use crate::types::{StressKind, StressVector, TopologyPolicy};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitMode {
    /// Every node jitters around the model's base values.
    #[default]
    Variance,
    /// Nodes take a specialization profile first, then jitter.
    Profiles,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct InitConfig {
    pub mode: InitMode,
    /// Full width of the uniform jitter band.
    pub variance: f64,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            mode: InitMode::Variance,
            variance: 0.15,
        }
    }
}

/// A complete, serializable run description.
///
/// Any omitted field takes its default, so `{}` is a valid 24-node baseline.
/// Stresses are keyed by node id then stress name, and are applied at
/// constant magnitude from `stress_onset` onward. Forward-Euler is only
/// well behaved for `dt <= 0.1` with the shipped coefficients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub model: String,
    pub node_count: u32,
    pub topology: String,
    pub topology_seed: u64,
    pub seed: u64,
    pub dt: f64,
    pub steps: usize,
    pub stress_onset: usize,
    pub stresses: BTreeMap<u32, BTreeMap<String, f64>>,
    /// Initial-value overrides applied to every node after jitter.
    pub overrides: BTreeMap<String, f64>,
    pub init: InitConfig,
    pub isolation: IsolationParams,
    pub flows: FlowParams,
    pub aggregate: AggregateParams,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "baseline".to_string(),
            model: presets::FEDERATION.to_string(),
            node_count: 24,
            topology: TopologyPolicy::Clustered.as_str().to_string(),
            topology_seed: 42,
            seed: 42,
            dt: 0.1,
            steps: 300,
            stress_onset: 50,
            stresses: BTreeMap::new(),
            overrides: BTreeMap::new(),
            init: InitConfig::default(),
            isolation: IsolationParams::default(),
            flows: FlowParams::default(),
            aggregate: AggregateParams::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add one stress entry; later entries for the same key win.
    pub fn with_stress(mut self, node: u32, kind: &str, magnitude: f64) -> Self {
        self.stresses
            .entry(node)
            .or_default()
            .insert(kind.to_string(), magnitude);
        self
    }

    /// Apply the same stress set to every listed node.
    pub fn with_stresses(mut self, nodes: &[u32], set: &[(&str, f64)]) -> Self {
        for &node in nodes {
            for &(kind, magnitude) in set {
                self = self.with_stress(node, kind, magnitude);
            }
        }
        self
    }

    /// Validate everything and turn names into typed values.
    ///
    /// This is the only place a scenario can fail; a resolved scenario
    /// always runs to completion.
    pub fn resolve(&self) -> Result<ResolvedScenario> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ConfigError::NonPositiveTimestep(self.dt));
        }
        if self.node_count == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        let policy: TopologyPolicy = self.topology.parse()?;
        let model = presets::by_name(&self.model)?;

        let mut stresses = vec![StressVector::zero(); self.node_count as usize];
        for (&node, set) in &self.stresses {
            if node >= self.node_count {
                return Err(ConfigError::UnknownNode {
                    node,
                    count: self.node_count,
                });
            }
            for (name, &value) in set {
                let kind: StressKind = name.parse()?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::StressOutOfRange {
                        node,
                        kind: kind.as_str().to_string(),
                        value,
                    });
                }
                stresses[node as usize].set(kind, value);
            }
        }

        let overrides = self
            .overrides
            .iter()
            .map(|(name, &value)| {
                let id = model.var(name).ok_or_else(|| {
                    ConfigError::invalid_model(
                        model.name.clone(),
                        format!("no variable `{name}` to override"),
                    )
                })?;
                let bounds = model.schema.spec(id).bounds;
                if !bounds.contains(value) {
                    return Err(ConfigError::invalid_model(
                        model.name.clone(),
                        format!("override {name} = {value} outside [{}, {}]", bounds.lo, bounds.hi),
                    ));
                }
                Ok((id, value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedScenario {
            config: self.clone(),
            model,
            policy,
            stresses,
            overrides,
        })
    }
}

/// A validated scenario with every name resolved.
#[derive(Debug, Clone)]
pub struct ResolvedScenario {
    pub config: ScenarioConfig,
    pub model: Model,
    pub policy: TopologyPolicy,
    /// Post-onset stress per node, indexed by node id.
    pub stresses: Vec<StressVector>,
    pub overrides: Vec<(VarId, f64)>,
}

impl ResolvedScenario {
    pub fn node_count(&self) -> usize {
        self.config.node_count as usize
    }

    /// Stress on `node` at `step`: zero before onset, constant after.
    pub fn stress_at(&self, node: usize, step: usize) -> StressVector {
        if step < self.config.stress_onset {
            StressVector::zero()
        } else {
            self.stresses[node]
        }
    }
}

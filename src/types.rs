// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use crate::error::ConfigError;

// ─── Stress Kinds ────────────────────────────────────────────────────────────

/// Every external pressure a node can be subjected to.
///
/// The set is closed: scenario files naming anything else are rejected when
/// the scenario is resolved, so a typo cannot silently become "no stress".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressKind {
    Pressure = 0,
    Drought = 1,
    EgoCapture = 2,
    EmpirePressure = 3,
    AiCorruption = 4,
    AgeSegregation = 5,
    Mobility = 6,
    Specialization = 7,
    CulturalRigidity = 8,
    InstitutionalReplacement = 9,
    ExternalCrisis = 10,
}

impl StressKind {
    pub const COUNT: usize = 11;

    pub const ALL: [StressKind; Self::COUNT] = [
        Self::Pressure,
        Self::Drought,
        Self::EgoCapture,
        Self::EmpirePressure,
        Self::AiCorruption,
        Self::AgeSegregation,
        Self::Mobility,
        Self::Specialization,
        Self::CulturalRigidity,
        Self::InstitutionalReplacement,
        Self::ExternalCrisis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::Drought => "drought",
            Self::EgoCapture => "ego_capture",
            Self::EmpirePressure => "empire_pressure",
            Self::AiCorruption => "ai_corruption",
            Self::AgeSegregation => "age_segregation",
            Self::Mobility => "mobility",
            Self::Specialization => "specialization",
            Self::CulturalRigidity => "cultural_rigidity",
            Self::InstitutionalReplacement => "institutional_replacement",
            Self::ExternalCrisis => "external_crisis",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for StressKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if key == "industrial_pressure" {
            return Ok(Self::Pressure);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| ConfigError::UnknownStress(s.to_string()))
    }
}

impl fmt::Display for StressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Stress Vector ───────────────────────────────────────────────────────────

/// Fixed-field stress magnitudes, one slot per [`StressKind`]. Unset slots are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StressVector([f64; StressKind::COUNT]);

impl StressVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StressKind) -> f64 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: StressKind, magnitude: f64) {
        self.0[kind.index()] = magnitude;
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, kind: StressKind, magnitude: f64) -> Self {
        self.set(kind, magnitude);
        self
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Non-zero entries, in declaration order.
    pub fn active(&self) -> impl Iterator<Item = (StressKind, f64)> + '_ {
        StressKind::ALL
            .iter()
            .map(move |k| (*k, self.get(*k)))
            .filter(|(_, v)| *v != 0.0)
    }
}

impl Index<StressKind> for StressVector {
    type Output = f64;

    fn index(&self, kind: StressKind) -> &f64 {
        &self.0[kind.index()]
    }
}

// ─── Flow Kinds ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Knowledge,
    Resources,
    Migration,
    Ecological,
}

impl FlowKind {
    pub const ALL: [FlowKind; 4] = [
        Self::Knowledge,
        Self::Resources,
        Self::Migration,
        Self::Ecological,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Resources => "resources",
            Self::Migration => "migration",
            Self::Ecological => "ecological",
        }
    }
}

/// Per-node flow totals for one step. Everything defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub knowledge_in: f64,
    pub resources_in: f64,
    pub resources_out: f64,
    pub migration_in: f64,
    pub migration_out: f64,
    pub ecological_in: f64,
}

impl FlowTotals {
    pub fn inflow(&self, kind: FlowKind) -> f64 {
        match kind {
            FlowKind::Knowledge => self.knowledge_in,
            FlowKind::Resources => self.resources_in,
            FlowKind::Migration => self.migration_in,
            FlowKind::Ecological => self.ecological_in,
        }
    }

    /// Knowledge is shared rather than moved and externality has no sender
    /// side, so only resources and migration debit the source.
    pub fn outflow(&self, kind: FlowKind) -> f64 {
        match kind {
            FlowKind::Resources => self.resources_out,
            FlowKind::Migration => self.migration_out,
            FlowKind::Knowledge | FlowKind::Ecological => 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

// ─── Topology Policy ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyPolicy {
    Clustered,
    Grid,
    Random,
}

impl TopologyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clustered => "clustered",
            Self::Grid => "grid",
            Self::Random => "random",
        }
    }
}

impl FromStr for TopologyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clustered" | "bioregional" => Ok(Self::Clustered),
            "grid" | "lattice" => Ok(Self::Grid),
            "random" => Ok(Self::Random),
            _ => Err(ConfigError::UnknownTopology(s.to_string())),
        }
    }
}

// ─── Aggregate Metrics ───────────────────────────────────────────────────────

/// Network-wide metrics a node update may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMetric {
    Transparency,
    CaptureRisk,
    KnowledgeDiversity,
    Containment,
    MigrationGovernance,
    ResourceRedistribution,
    EcologicalAccounting,
    Externalization,
}

impl AggregateMetric {
    pub const ALL: [AggregateMetric; 8] = [
        Self::Transparency,
        Self::CaptureRisk,
        Self::KnowledgeDiversity,
        Self::Containment,
        Self::MigrationGovernance,
        Self::ResourceRedistribution,
        Self::EcologicalAccounting,
        Self::Externalization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transparency => "transparency",
            Self::CaptureRisk => "capture_risk",
            Self::KnowledgeDiversity => "knowledge_diversity",
            Self::Containment => "containment",
            Self::MigrationGovernance => "migration_governance",
            Self::ResourceRedistribution => "resource_redistribution",
            Self::EcologicalAccounting => "ecological_accounting",
            Self::Externalization => "externalization",
        }
    }
}

// ─── Specialization Profile ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Craft,
    Coordination,
    Ecological,
    Knowledge,
    Generalist,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Self::Craft,
        Self::Coordination,
        Self::Ecological,
        Self::Knowledge,
        Self::Generalist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Craft => "craft",
            Self::Coordination => "coordination",
            Self::Ecological => "ecological",
            Self::Knowledge => "knowledge",
            Self::Generalist => "generalist",
        }
    }
}

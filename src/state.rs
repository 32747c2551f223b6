// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Node State & Schema

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Position of a variable in a [`StateSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

// ─── Bounds ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lo: f64,
    pub hi: f64,
}

impl Bounds {
    pub const UNIT: Bounds = Bounds { lo: 0.0, hi: 1.0 };

    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    /// Nearest in-range value. NaN maps to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.lo
        } else {
            value.clamp(self.lo, self.hi)
        }
    }

    pub fn is_unit(&self) -> bool {
        *self == Self::UNIT
    }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// How a variable is seeded at simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitSpec {
    /// Starting value before jitter.
    pub base: f64,
    /// Multiplier on the scenario's initial variance; 0 keeps `base` exact.
    pub jitter: f64,
}

impl InitSpec {
    pub const fn fixed(base: f64) -> Self {
        Self { base, jitter: 0.0 }
    }

    pub const fn varied(base: f64, jitter: f64) -> Self {
        Self { base, jitter }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: String,
    pub bounds: Bounds,
    pub init: InitSpec,
}

/// A value observed outside its declared range and what it was replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundCorrection {
    pub var: VarId,
    pub observed: f64,
    pub corrected: f64,
}

/// Ordered table of `(name, bounds)` pairs for one entity type.
///
/// Clamping walks this table; nothing is clamped by reflection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSchema {
    vars: Vec<VarSpec>,
}

impl StateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: VarSpec) -> VarId {
        self.vars.push(spec);
        VarId(self.vars.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn spec(&self, id: VarId) -> &VarSpec {
        &self.vars[id.0]
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.vars[id.0].name
    }

    pub fn id_of(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarSpec)> {
        self.vars.iter().enumerate().map(|(i, v)| (VarId(i), v))
    }

    /// A state holding every variable's base value.
    pub fn base_state(&self) -> NodeState {
        NodeState(self.vars.iter().map(|v| v.init.base).collect())
    }

    /// Clamp a single value against its variable's bounds.
    pub fn clamp_value(&self, id: VarId, value: f64) -> (f64, Option<BoundCorrection>) {
        let bounds = self.vars[id.0].bounds;
        if bounds.contains(value) {
            return (value, None);
        }
        let corrected = bounds.clamp(value);
        (
            corrected,
            Some(BoundCorrection {
                var: id,
                observed: value,
                corrected,
            }),
        )
    }

    /// Force every variable into range, reporting what had to move.
    pub fn clamp(&self, state: &mut NodeState) -> Vec<BoundCorrection> {
        let mut corrections = Vec::new();
        for (i, slot) in state.0.iter_mut().enumerate().take(self.vars.len()) {
            let (value, correction) = self.clamp_value(VarId(i), *slot);
            *slot = value;
            corrections.extend(correction);
        }
        corrections
    }

    pub fn in_bounds(&self, state: &NodeState) -> bool {
        self.vars
            .iter()
            .zip(state.0.iter())
            .all(|(spec, v)| spec.bounds.contains(*v))
    }
}

// ─── Node State ──────────────────────────────────────────────────────────────

/// Dense state vector addressed by [`VarId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState(pub Vec<f64>);

impl NodeState {
    pub fn get(&self, id: VarId) -> f64 {
        self.0[id.0]
    }

    pub fn set(&mut self, id: VarId, value: f64) {
        self.0[id.0] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<VarId> for NodeState {
    type Output = f64;

    fn index(&self, id: VarId) -> &f64 {
        &self.0[id.0]
    }
}

impl IndexMut<VarId> for NodeState {
    fn index_mut(&mut self, id: VarId) -> &mut f64 {
        &mut self.0[id.0]
    }
}

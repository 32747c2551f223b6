// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Node Update Kernel

use serde::{Deserialize, Serialize};

use crate::federation::FederationAggregate;
use crate::lag::LagBuffer;
use crate::model::expr::EvalContext;
use crate::model::Model;
use crate::state::{BoundCorrection, NodeState};
use crate::types::{FlowTotals, StressVector};

/// One simulated community: its state vector plus private delay lines.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u32,
    pub state: NodeState,
    pub lags: Vec<LagBuffer>,
}

impl Node {
    /// Create a node from drawn initial values.
    ///
    /// Derived variables are settled and lags seeded before the first step,
    /// so step 0 reads a consistent state.
    pub fn spawn(
        model: &Model,
        id: u32,
        mut state: NodeState,
        aggregate: &FederationAggregate,
    ) -> (Self, Vec<BoundCorrection>) {
        let mut corrections = model.schema.clamp(&mut state);
        let lags = model.seed_lags(&state);
        let composites = model.composites_of(&state);
        let delayed: Vec<f64> = lags.iter().map(LagBuffer::get).collect();
        let inputs = StepInputs {
            stress: &StressVector::zero(),
            flows: &FlowTotals::default(),
            aggregate,
            isolated_for: 0,
        };
        settle_derived(model, &mut state, &composites, &delayed, &inputs, &mut corrections);
        (Self { id, state, lags }, corrections)
    }
}

/// External drivers for one node for one step.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    pub stress: &'a StressVector,
    pub flows: &'a FlowTotals,
    pub aggregate: &'a FederationAggregate,
    /// Steps since the node was isolated; 0 while connected.
    pub isolated_for: usize,
}

/// Result of [`advance`]: the next node plus every value the clamp pass had
/// to pull back into range.
#[derive(Debug, Clone)]
pub struct Advance {
    pub node: Node,
    pub corrections: Vec<BoundCorrection>,
}

/// One forward-Euler step of one node.
///
/// Pure: `node` is untouched and a fresh node is returned. Composites are
/// evaluated on the previous state and pushed through cloned lag buffers
/// before any derivative is taken.
pub fn advance(model: &Model, node: &Node, inputs: &StepInputs<'_>, dt: f64) -> Advance {
    let prev = &node.state;
    let composites = model.composites_of(prev);

    let mut lags = node.lags.clone();
    let delayed: Vec<f64> = model
        .lags
        .iter()
        .zip(lags.iter_mut())
        .map(|(spec, buffer)| {
            buffer.push(composites[spec.source.0]);
            buffer.get()
        })
        .collect();

    let ctx = EvalContext {
        state: prev,
        composites: &composites,
        delayed: &delayed,
        stress: inputs.stress,
        flows: inputs.flows,
        aggregate: inputs.aggregate,
        criticals: &model.criticals,
        isolated_for: inputs.isolated_for as f64,
    };
    let mut next = prev.clone();
    for eq in &model.rates {
        next[eq.var] = prev[eq.var] + dt * eq.expr.eval(&ctx);
    }

    let mut corrections = model.schema.clamp(&mut next);
    settle_derived(model, &mut next, &composites, &delayed, inputs, &mut corrections);

    Advance {
        node: Node {
            id: node.id,
            state: next,
            lags,
        },
        corrections,
    }
}

/// Assign derived variables in declaration order, each seeing the ones
/// before it.
fn settle_derived(
    model: &Model,
    state: &mut NodeState,
    composites: &[f64],
    delayed: &[f64],
    inputs: &StepInputs<'_>,
    corrections: &mut Vec<BoundCorrection>,
) {
    for eq in &model.derived {
        let value = eq.expr.eval(&EvalContext {
            state: &*state,
            composites,
            delayed,
            stress: inputs.stress,
            flows: inputs.flows,
            aggregate: inputs.aggregate,
            criticals: &model.criticals,
            isolated_for: inputs.isolated_for as f64,
        });
        let (value, fix) = model.schema.clamp_value(eq.var, value);
        state[eq.var] = value;
        corrections.extend(fix);
    }
}

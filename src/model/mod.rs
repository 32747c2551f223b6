// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Node models as data.
//!
//! A [`Model`] is everything the update kernel needs to know about one kind
//! of node: the state schema, composite indicators, delay lines, the
//! derivative of every integrated variable, derived (assigned) variables,
//! the critical variables that define health, and how the node plugs into
//! network flows. The kernel itself is model-agnostic; the shipped
//! presets live in [`presets`].

pub mod expr;
pub mod presets;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::federation::FederationAggregate;
use crate::health::{self, Critical, HealthReport};
use crate::lag::LagBuffer;
use crate::state::{Bounds, InitSpec, NodeState, StateSchema, VarId, VarSpec};
use crate::types::{FlowTotals, Profile, StressVector};

use self::expr::{EvalContext, Expr};

/// Unit-range variables are kept off the walls at initialization.
pub const INIT_FLOOR: f64 = 0.1;
pub const INIT_CEILING: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LagId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    pub name: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagSeed {
    /// The source composite evaluated on the node's initial state.
    Initial,
    Value(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagSpec {
    pub name: String,
    pub source: CompositeId,
    pub depth: usize,
    pub seed: LagSeed,
}

/// `var` is integrated (`x += dt * expr`) or assigned (`x = expr`),
/// depending on which list it sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub var: VarId,
    pub expr: Expr,
}

/// Two capabilities that amplify each other when held by different nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyPair {
    pub name: String,
    pub a: VarId,
    pub b: VarId,
}

/// Where the flow computation reads a node's state.
///
/// The expressions are state-only so flows can be computed from a snapshot
/// without running any part of the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowBindings {
    pub capabilities: Vec<VarId>,
    /// Multiplier on each capability's exportable surplus, parallel to
    /// `capabilities`. Empty leaves surplus unweighted.
    #[serde(default)]
    pub surplus_weights: Vec<Expr>,
    pub synergy: Vec<SynergyPair>,
    /// Stock that resource flows redistribute.
    pub reserve: VarId,
    pub assimilation: Expr,
    pub governance: Expr,
    pub ecology: Expr,
}

/// Initial-value overrides for one specialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub profile: Profile,
    pub bases: Vec<(VarId, f64)>,
}

impl ProfileSpec {
    fn base_of(&self, id: VarId) -> Option<f64> {
        self.bases.iter().find(|(v, _)| *v == id).map(|(_, b)| *b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub schema: StateSchema,
    pub composites: Vec<CompositeSpec>,
    pub lags: Vec<LagSpec>,
    pub rates: Vec<Equation>,
    pub derived: Vec<Equation>,
    pub criticals: Vec<Critical>,
    pub flows: FlowBindings,
    pub profiles: Vec<ProfileSpec>,
}

impl Model {
    pub fn var(&self, name: &str) -> Option<VarId> {
        self.schema.id_of(name)
    }

    pub fn critical_names(&self) -> Vec<String> {
        self.criticals
            .iter()
            .map(|c| self.schema.name(c.var).to_string())
            .collect()
    }

    pub fn health(&self, state: &NodeState) -> HealthReport {
        health::evaluate(&self.criticals, state)
    }

    /// Evaluate a state-only expression (composites, flow bindings).
    pub fn eval_on_state(&self, expr: &Expr, state: &NodeState) -> f64 {
        let aggregate = FederationAggregate::default();
        let ctx = EvalContext {
            state,
            composites: &[],
            delayed: &[],
            stress: &StressVector::zero(),
            flows: &FlowTotals::default(),
            aggregate: &aggregate,
            criticals: &self.criticals,
            isolated_for: 0.0,
        };
        expr.eval(&ctx)
    }

    pub fn composites_of(&self, state: &NodeState) -> Vec<f64> {
        self.composites
            .iter()
            .map(|c| self.eval_on_state(&c.expr, state))
            .collect()
    }

    /// Draw one node's starting values.
    ///
    /// Every variable consumes exactly one draw from `rng`, jittered or not,
    /// so adding a profile never shifts the stream seen by later nodes.
    /// Profile-overridden variables are jittered at unit weight.
    pub fn initial_state<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        variance: f64,
        profile: Option<Profile>,
    ) -> NodeState {
        let overrides = profile.and_then(|p| self.profiles.iter().find(|s| s.profile == p));
        let values = self
            .schema
            .iter()
            .map(|(id, spec)| {
                let u: f64 = rng.gen();
                let (base, jitter) = match overrides.and_then(|o| o.base_of(id)) {
                    Some(b) => (b, 1.0),
                    None => (spec.init.base, spec.init.jitter),
                };
                let v = base + variance * jitter * (u - 0.5);
                if spec.bounds.is_unit() {
                    v.clamp(INIT_FLOOR, INIT_CEILING)
                } else {
                    spec.bounds.clamp(v)
                }
            })
            .collect();
        NodeState(values)
    }

    /// Fresh delay lines for a node starting at `state`.
    pub fn seed_lags(&self, state: &NodeState) -> Vec<LagBuffer> {
        let composites = self.composites_of(state);
        self.lags
            .iter()
            .map(|lag| {
                let seed = match lag.seed {
                    LagSeed::Initial => composites[lag.source.0],
                    LagSeed::Value(v) => v,
                };
                LagBuffer::new(lag.depth, seed)
            })
            .collect()
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Incremental model construction with validation at [`build`](Self::build).
pub struct ModelBuilder {
    name: String,
    schema: StateSchema,
    composites: Vec<CompositeSpec>,
    lags: Vec<LagSpec>,
    rates: Vec<Equation>,
    derived: Vec<Equation>,
    criticals: Vec<Critical>,
    flows: Option<FlowBindings>,
    profiles: Vec<ProfileSpec>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: StateSchema::new(),
            composites: Vec::new(),
            lags: Vec::new(),
            rates: Vec::new(),
            derived: Vec::new(),
            criticals: Vec::new(),
            flows: None,
            profiles: Vec::new(),
        }
    }

    pub fn var(&mut self, name: &str, bounds: Bounds, init: InitSpec) -> VarId {
        self.schema.push(VarSpec {
            name: name.to_string(),
            bounds,
            init,
        })
    }

    /// `[0, 1]` variable.
    pub fn unit(&mut self, name: &str, init: InitSpec) -> VarId {
        self.var(name, Bounds::UNIT, init)
    }

    pub fn composite(&mut self, name: &str, expr: Expr) -> CompositeId {
        self.composites.push(CompositeSpec {
            name: name.to_string(),
            expr,
        });
        CompositeId(self.composites.len() - 1)
    }

    pub fn lag(&mut self, name: &str, source: CompositeId, depth: usize, seed: LagSeed) -> LagId {
        self.lags.push(LagSpec {
            name: name.to_string(),
            source,
            depth,
            seed,
        });
        LagId(self.lags.len() - 1)
    }

    pub fn rate(&mut self, var: VarId, expr: Expr) {
        self.rates.push(Equation { var, expr });
    }

    pub fn derive(&mut self, var: VarId, expr: Expr) {
        self.derived.push(Equation { var, expr });
    }

    pub fn critical(&mut self, critical: Critical) {
        self.criticals.push(critical);
    }

    pub fn flows(&mut self, bindings: FlowBindings) {
        self.flows = Some(bindings);
    }

    pub fn profile(&mut self, profile: Profile, bases: Vec<(VarId, f64)>) {
        self.profiles.push(ProfileSpec { profile, bases });
    }

    pub fn build(self) -> Result<Model> {
        let fail = |reason: String| ConfigError::invalid_model(self.name.clone(), reason);
        let n_vars = self.schema.len();
        let n_comp = self.composites.len();
        let n_lags = self.lags.len();

        let check_refs = |expr: &Expr| -> std::result::Result<(), String> {
            let mut err = None;
            expr.visit(&mut |e| match e {
                Expr::Var(id) if id.0 >= n_vars => {
                    err = Some(format!("variable index {} out of range", id.0))
                }
                Expr::Composite(id) if id.0 >= n_comp => {
                    err = Some(format!("composite index {} out of range", id.0))
                }
                Expr::Delayed(id) if id.0 >= n_lags => {
                    err = Some(format!("lag index {} out of range", id.0))
                }
                Expr::GeoMean(fs) | Expr::Min(fs) if fs.is_empty() => {
                    err = Some("empty geometric mean or minimum".to_string())
                }
                _ => {}
            });
            err.map_or(Ok(()), Err)
        };

        for c in &self.composites {
            if !c.expr.is_state_only() {
                return Err(fail(format!("composite `{}` reads more than state", c.name)));
            }
            check_refs(&c.expr).map_err(|r| fail(format!("composite `{}`: {r}", c.name)))?;
        }
        for lag in &self.lags {
            if lag.source.0 >= n_comp {
                return Err(fail(format!("lag `{}` has no source composite", lag.name)));
            }
        }

        let mut owner = vec![false; n_vars];
        for eq in self.rates.iter().chain(&self.derived) {
            if eq.var.0 >= n_vars {
                return Err(fail(format!("equation for unknown variable {}", eq.var.0)));
            }
            let name = self.schema.name(eq.var).to_string();
            if std::mem::replace(&mut owner[eq.var.0], true) {
                return Err(fail(format!("variable `{name}` has more than one equation")));
            }
            check_refs(&eq.expr).map_err(|r| fail(format!("equation for `{name}`: {r}")))?;
        }

        for c in &self.criticals {
            if c.var.0 >= n_vars {
                return Err(fail(format!("critical on unknown variable {}", c.var.0)));
            }
            if !(c.floor > 0.0 && c.floor < 1.0) {
                return Err(fail(format!(
                    "critical `{}` floor {} outside (0, 1)",
                    self.schema.name(c.var),
                    c.floor
                )));
            }
        }

        let flows = match self.flows.clone() {
            Some(f) => f,
            None => return Err(fail("no flow bindings".to_string())),
        };
        let unknown_flow_var = flows
            .capabilities
            .iter()
            .chain(flows.synergy.iter().flat_map(|p| [&p.a, &p.b]))
            .chain(std::iter::once(&flows.reserve))
            .any(|v| v.0 >= n_vars);
        if unknown_flow_var {
            return Err(fail("flow binding names an unknown variable".to_string()));
        }
        if !flows.surplus_weights.is_empty()
            && flows.surplus_weights.len() != flows.capabilities.len()
        {
            return Err(fail(format!(
                "{} surplus weights for {} capabilities",
                flows.surplus_weights.len(),
                flows.capabilities.len()
            )));
        }
        for e in [&flows.assimilation, &flows.governance, &flows.ecology]
            .into_iter()
            .chain(&flows.surplus_weights)
        {
            if !e.is_state_only() {
                return Err(fail("flow binding reads more than state".to_string()));
            }
            check_refs(e).map_err(|r| fail(format!("flow binding: {r}")))?;
        }

        if self
            .profiles
            .iter()
            .flat_map(|p| &p.bases)
            .any(|(v, _)| v.0 >= n_vars)
        {
            return Err(fail("profile overrides an unknown variable".to_string()));
        }

        Ok(Model {
            name: self.name,
            schema: self.schema,
            composites: self.composites,
            lags: self.lags,
            rates: self.rates,
            derived: self.derived,
            criticals: self.criticals,
            flows,
            profiles: self.profiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::expr::{geo, var};
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bindings(x: VarId) -> FlowBindings {
        FlowBindings {
            capabilities: vec![x],
            surplus_weights: vec![],
            synergy: vec![],
            reserve: x,
            assimilation: var(x),
            governance: var(x),
            ecology: var(x),
        }
    }

    fn tiny() -> ModelBuilder {
        let mut b = ModelBuilder::new("tiny");
        let x = b.unit("x", InitSpec::varied(0.5, 1.0));
        let y = b.var("y", Bounds::new(0.0, 2.0), InitSpec::fixed(1.0));
        let c = b.composite("xy", geo(vec![var(x), var(y)]));
        b.lag("xy_lag", c, 3, LagSeed::Initial);
        b.rate(x, 0.1 * (1.0 - var(x)));
        b.critical(Critical::normal(x, 0.3));
        b.flows(bindings(x));
        b.profile(Profile::Craft, vec![(x, 0.9)]);
        let _ = y;
        b
    }

    #[test]
    fn test_builds_and_seeds_lags_from_initial_state() {
        let model = tiny().build().unwrap();
        let state = NodeState(vec![0.25, 1.0]);
        let lags = model.seed_lags(&state);
        assert_eq!(lags.len(), 1);
        assert!((lags[0].get() - 0.5).abs() < 1e-12);
        assert_eq!(model.critical_names(), vec!["x".to_string()]);
    }

    #[test]
    fn test_double_equation_rejected() {
        let mut b = tiny();
        b.derive(VarId(0), var(VarId(0)));
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("more than one equation"));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut b = tiny();
        b.rate(VarId(1), var(VarId(7)));
        assert!(matches!(b.build(), Err(ConfigError::InvalidModel { .. })));
    }

    #[test]
    fn test_composite_must_be_state_only() {
        let mut b = tiny();
        b.composite("bad", super::expr::health());
        assert!(b.build().is_err());
    }

    #[test]
    fn test_missing_flow_bindings_rejected() {
        let mut b = ModelBuilder::new("bare");
        b.unit("x", InitSpec::fixed(0.5));
        assert!(b.build().is_err());
    }

    #[test]
    fn test_unknown_flow_variable_rejected() {
        let mut b = tiny();
        let mut flows = bindings(VarId(0));
        flows.synergy.push(SynergyPair {
            name: "ghost".to_string(),
            a: VarId(0),
            b: VarId(9),
        });
        b.flows(flows);
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("unknown variable"));
    }

    #[test]
    fn test_surplus_weights_must_match_capabilities() {
        let mut b = tiny();
        let mut flows = bindings(VarId(0));
        flows.surplus_weights = vec![var(VarId(0)), var(VarId(1))];
        b.flows(flows);
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("surplus weights"));
    }

    #[test]
    fn test_initial_state_stays_off_the_walls() {
        let model = tiny().build().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            let s = model.initial_state(&mut rng, 2.0, None);
            assert!(s[VarId(0)] >= INIT_FLOOR && s[VarId(0)] <= INIT_CEILING);
            assert_eq!(s[VarId(1)], 1.0);
        }
    }

    #[test]
    fn test_profile_overrides_base() {
        let model = tiny().build().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = model.initial_state(&mut rng, 0.0, Some(Profile::Craft));
        assert_eq!(s[VarId(0)], 0.9);
        let s = model.initial_state(&mut rng, 0.0, Some(Profile::Knowledge));
        assert_eq!(s[VarId(0)], 0.5);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Derivative Expressions

//! Closed expression language for derivatives, composites and derived
//! variables.
//!
//! Operators build the tree, so a preset reads like the equation it encodes:
//!
//! ```
//! use federation_engine::model::expr::{stress, var};
//! use federation_engine::state::VarId;
//! use federation_engine::types::StressKind;
//!
//! let soil = VarId(0);
//! let rate = 0.03 * var(soil) * (1.0 - var(soil)) - 0.05 * stress(StressKind::Pressure);
//! # let _ = rate;
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

use crate::federation::FederationAggregate;
use crate::health::{self, Critical};
use crate::state::{NodeState, VarId};
use crate::types::{AggregateMetric, FlowKind, FlowTotals, StressKind, StressVector};

use super::{CompositeId, LagId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Const(f64),
    Var(VarId),
    Composite(CompositeId),
    Delayed(LagId),
    Stress(StressKind),
    Inflow(FlowKind),
    Outflow(FlowKind),
    Aggregate(AggregateMetric),
    /// Weakest-link health of the state being evaluated.
    Health,
    /// Steps since the node was cut off from the network, 0 while connected.
    IsolatedFor,
    OneMinus(Box<Expr>),
    /// `max(0, x)`
    Pos(Box<Expr>),
    /// 1 when `x` exceeds the threshold, else 0.
    Above(Box<Expr>, f64),
    Scale(f64, Box<Expr>),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    /// Geometric mean with negative factors floored at zero.
    GeoMean(Vec<Expr>),
    Min(Vec<Expr>),
}

/// Everything an expression may read during one evaluation.
pub struct EvalContext<'a> {
    pub state: &'a NodeState,
    pub composites: &'a [f64],
    pub delayed: &'a [f64],
    pub stress: &'a StressVector,
    pub flows: &'a FlowTotals,
    pub aggregate: &'a FederationAggregate,
    pub criticals: &'a [Critical],
    pub isolated_for: f64,
}

impl Expr {
    pub fn eval(&self, ctx: &EvalContext<'_>) -> f64 {
        match self {
            Expr::Const(v) => *v,
            Expr::Var(id) => ctx.state[*id],
            Expr::Composite(id) => ctx.composites.get(id.0).copied().unwrap_or_default(),
            Expr::Delayed(id) => ctx.delayed.get(id.0).copied().unwrap_or_default(),
            Expr::Stress(kind) => ctx.stress.get(*kind),
            Expr::Inflow(kind) => ctx.flows.inflow(*kind),
            Expr::Outflow(kind) => ctx.flows.outflow(*kind),
            Expr::Aggregate(metric) => ctx.aggregate.metric(*metric),
            Expr::Health => health::evaluate(ctx.criticals, ctx.state).health,
            Expr::IsolatedFor => ctx.isolated_for,
            Expr::OneMinus(e) => 1.0 - e.eval(ctx),
            Expr::Pos(e) => e.eval(ctx).max(0.0),
            Expr::Above(e, threshold) => {
                if e.eval(ctx) > *threshold {
                    1.0
                } else {
                    0.0
                }
            }
            Expr::Scale(k, e) => k * e.eval(ctx),
            Expr::Sum(terms) => terms.iter().map(|t| t.eval(ctx)).sum(),
            Expr::Product(factors) => factors.iter().map(|f| f.eval(ctx)).product(),
            Expr::GeoMean(factors) => {
                if factors.is_empty() {
                    return 0.0;
                }
                let p: f64 = factors.iter().map(|f| f.eval(ctx).max(0.0)).product();
                p.powf(1.0 / factors.len() as f64)
            }
            Expr::Min(terms) => terms
                .iter()
                .map(|t| t.eval(ctx))
                .reduce(f64::min)
                .unwrap_or_default(),
        }
    }

    /// Depth-first walk over this node and all children.
    pub fn visit<'e>(&'e self, f: &mut impl FnMut(&'e Expr)) {
        f(self);
        match self {
            Expr::OneMinus(e) | Expr::Pos(e) | Expr::Above(e, _) | Expr::Scale(_, e) => {
                e.visit(f)
            }
            Expr::Sum(es) | Expr::Product(es) | Expr::GeoMean(es) | Expr::Min(es) => {
                for e in es {
                    e.visit(f);
                }
            }
            _ => {}
        }
    }

    /// True when the expression reads nothing but state variables.
    pub fn is_state_only(&self) -> bool {
        let mut ok = true;
        self.visit(&mut |e| {
            if !matches!(
                e,
                Expr::Const(_)
                    | Expr::Var(_)
                    | Expr::OneMinus(_)
                    | Expr::Pos(_)
                    | Expr::Above(..)
                    | Expr::Scale(..)
                    | Expr::Sum(_)
                    | Expr::Product(_)
                    | Expr::GeoMean(_)
                    | Expr::Min(_)
            ) {
                ok = false;
            }
        });
        ok
    }
}

// ─── Constructors ────────────────────────────────────────────────────────────

pub fn constant(v: f64) -> Expr {
    Expr::Const(v)
}

pub fn var(id: VarId) -> Expr {
    Expr::Var(id)
}

pub fn composite(id: CompositeId) -> Expr {
    Expr::Composite(id)
}

pub fn delayed(id: LagId) -> Expr {
    Expr::Delayed(id)
}

pub fn stress(kind: StressKind) -> Expr {
    Expr::Stress(kind)
}

pub fn inflow(kind: FlowKind) -> Expr {
    Expr::Inflow(kind)
}

pub fn outflow(kind: FlowKind) -> Expr {
    Expr::Outflow(kind)
}

pub fn aggregate(metric: AggregateMetric) -> Expr {
    Expr::Aggregate(metric)
}

pub fn health() -> Expr {
    Expr::Health
}

pub fn pos(e: Expr) -> Expr {
    Expr::Pos(Box::new(e))
}

pub fn isolated_for() -> Expr {
    Expr::IsolatedFor
}

pub fn above(e: Expr, threshold: f64) -> Expr {
    Expr::Above(Box::new(e), threshold)
}

pub fn geo(factors: Vec<Expr>) -> Expr {
    Expr::GeoMean(factors)
}

pub fn min_of(terms: Vec<Expr>) -> Expr {
    Expr::Min(terms)
}

/// Logistic growth factor `x (1 - x)`.
pub fn logistic(id: VarId) -> Expr {
    var(id) * (1.0 - var(id))
}

// ─── Operators ───────────────────────────────────────────────────────────────

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match self {
            Expr::Sum(mut terms) => {
                terms.push(rhs);
                Expr::Sum(terms)
            }
            lhs => Expr::Sum(vec![lhs, rhs]),
        }
    }
}

impl Add<f64> for Expr {
    type Output = Expr;

    fn add(self, rhs: f64) -> Expr {
        self + Expr::Const(rhs)
    }
}

impl Add<Expr> for f64 {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Const(self) + rhs
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -1.0 * self
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Sub<f64> for Expr {
    type Output = Expr;

    fn sub(self, rhs: f64) -> Expr {
        self + Expr::Const(-rhs)
    }
}

impl Sub<Expr> for f64 {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        if self == 1.0 {
            Expr::OneMinus(Box::new(rhs))
        } else {
            Expr::Const(self) + (-rhs)
        }
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Scale(k, inner), rhs) => Expr::Scale(k, Box::new(*inner * rhs)),
            (Expr::Product(mut factors), rhs) => {
                factors.push(rhs);
                Expr::Product(factors)
            }
            (lhs, rhs) => Expr::Product(vec![lhs, rhs]),
        }
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match rhs {
            Expr::Scale(k, inner) => Expr::Scale(self * k, inner),
            rhs => Expr::Scale(self, Box::new(rhs)),
        }
    }
}

impl Mul<f64> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        rhs * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_on(expr: &Expr, state: &[f64]) -> f64 {
        let state = NodeState(state.to_vec());
        let aggregate = FederationAggregate::default();
        let stress = StressVector::zero().with(StressKind::Drought, 0.3);
        let flows = FlowTotals { ecological_in: 0.02, ..FlowTotals::default() };
        let criticals = [Critical::normal(VarId(0), 0.5)];
        let ctx = EvalContext {
            state: &state,
            composites: &[0.4],
            delayed: &[0.9],
            stress: &stress,
            flows: &flows,
            aggregate: &aggregate,
            criticals: &criticals,
            isolated_for: 40.0,
        };
        expr.eval(&ctx)
    }

    #[test]
    fn test_operators_build_the_equation() {
        let x = VarId(0);
        let e = 0.04 * var(x) * (1.0 - var(x)) - 0.10 * stress(StressKind::Drought);
        let got = eval_on(&e, &[0.5]);
        assert!((got - (0.04 * 0.25 - 0.03)).abs() < 1e-12);
    }

    #[test]
    fn test_scale_folds() {
        let e = 2.0 * (3.0 * var(VarId(0)));
        assert!(matches!(e, Expr::Scale(k, _) if (k - 6.0).abs() < 1e-12));
        let e = -var(VarId(0)) * var(VarId(1));
        assert!((eval_on(&e, &[0.5, 0.4]) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_constants_on_either_side() {
        let x = VarId(0);
        assert!((eval_on(&(0.5 - var(x)), &[0.2]) - 0.3).abs() < 1e-12);
        assert!((eval_on(&(var(x) - 0.5), &[0.2]) + 0.3).abs() < 1e-12);
        assert!((eval_on(&(0.1 + var(x)), &[0.2]) - 0.3).abs() < 1e-12);
        assert!((eval_on(&(var(x) * 4.0), &[0.2]) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_geo_mean_floors_negatives() {
        let e = geo(vec![var(VarId(0)), var(VarId(1)), var(VarId(2))]);
        assert!((eval_on(&e, &[0.8, 0.8, 0.8]) - 0.8).abs() < 1e-12);
        assert_eq!(eval_on(&e, &[0.8, -0.1, 0.8]), 0.0);
        assert_eq!(eval_on(&geo(vec![]), &[0.5]), 0.0);
    }

    #[test]
    fn test_leaf_reads() {
        assert_eq!(eval_on(&composite(CompositeId(0)), &[0.0]), 0.4);
        assert_eq!(eval_on(&delayed(LagId(0)), &[0.0]), 0.9);
        assert_eq!(eval_on(&inflow(FlowKind::Ecological), &[0.0]), 0.02);
        assert_eq!(eval_on(&outflow(FlowKind::Ecological), &[0.0]), 0.0);
        assert_eq!(eval_on(&stress(StressKind::Pressure), &[0.0]), 0.0);
        let t = FederationAggregate::default().transparency;
        assert_eq!(eval_on(&aggregate(AggregateMetric::Transparency), &[0.0]), t);
        assert!((eval_on(&health(), &[0.75]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_min_and_pos() {
        let e = min_of(vec![constant(1.0), var(VarId(0)) * var(VarId(1))]);
        assert!((eval_on(&e, &[0.9, 0.5]) - 0.45).abs() < 1e-12);
        let e = pos(0.5 - health());
        assert_eq!(eval_on(&e, &[1.0]), 0.0);
        assert!((eval_on(&e, &[0.6]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_isolation_gate() {
        assert_eq!(eval_on(&isolated_for(), &[0.0]), 40.0);
        let bunker = isolated_for() * above(isolated_for(), 30.0);
        assert_eq!(eval_on(&bunker, &[0.0]), 40.0);
        assert_eq!(eval_on(&above(isolated_for(), 40.0), &[0.0]), 0.0);
        assert_eq!(eval_on(&above(var(VarId(0)), 0.5), &[0.6]), 1.0);
    }

    #[test]
    fn test_state_only_detection() {
        let x = VarId(0);
        assert!(geo(vec![var(x), 1.0 - var(x)]).is_state_only());
        assert!(above(var(x), 0.5).is_state_only());
        assert!(!(var(x) * stress(StressKind::Drought)).is_state_only());
        assert!(!health().is_state_only());
        assert!(!isolated_for().is_state_only());
    }
}

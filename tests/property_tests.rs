use federation_engine::federation::FederationAggregate;
use federation_engine::health::{self, Direction};
use federation_engine::kernel::{self, Node, StepInputs};
use federation_engine::lag::LagBuffer;
use federation_engine::presets;
use federation_engine::{FlowTotals, StressKind, StressVector};
use proptest::prelude::*;

fn stress_vector() -> impl Strategy<Value = StressVector> {
    prop::collection::vec(0.0..=1.0f64, StressKind::COUNT).prop_map(|mags| {
        StressKind::ALL
            .iter()
            .zip(mags)
            .fold(StressVector::zero(), |v, (k, m)| v.with(*k, m))
    })
}

fn flow_totals() -> impl Strategy<Value = FlowTotals> {
    (0.0..0.5f64, 0.0..0.5f64, 0.0..0.5f64, 0.0..0.2f64, 0.0..0.2f64, 0.0..0.5f64).prop_map(
        |(k, ri, ro, mi, mo, e)| FlowTotals {
            knowledge_in: k,
            resources_in: ri,
            resources_out: ro,
            migration_in: mi,
            migration_out: mo,
            ecological_in: e,
        },
    )
}

proptest! {
    #[test]
    fn lag_returns_value_from_exactly_depth_pushes_ago(
        depth in 0usize..40,
        seed in 0.0..1.0f64,
        values in prop::collection::vec(-10.0..10.0f64, 1..120),
    ) {
        let mut lag = LagBuffer::new(depth, seed);
        for (i, v) in values.iter().enumerate() {
            lag.push(*v);
            let expected = if i >= depth { values[i - depth] } else { seed };
            prop_assert_eq!(lag.get(), expected);
            prop_assert_eq!(lag.len(), depth + 1);
        }
    }

    #[test]
    fn health_is_the_minimum_score(values in prop::collection::vec(0.0..=1.0f64, 19)) {
        let model = presets::federation().unwrap();
        let mut state = model.schema.base_state();
        for (i, v) in values.iter().enumerate() {
            state.0[i] = *v;
        }
        let report = health::evaluate(&model.criticals, &state);
        let scores = health::scores(&model.criticals, &state);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert_eq!(report.health, min);
        prop_assert!((0.0..=1.0).contains(&report.health));
        let limiting = report.limiting.unwrap();
        prop_assert_eq!(scores[limiting], min);
    }

    #[test]
    fn raising_a_healthy_non_limiting_variable_keeps_health(
        values in prop::collection::vec(0.3..=1.0f64, 19),
        bump in 0.0..0.2f64,
    ) {
        let model = presets::federation().unwrap();
        let mut state = model.schema.base_state();
        for (i, v) in values.iter().enumerate() {
            state.0[i] = *v;
        }
        let before = health::evaluate(&model.criticals, &state);
        let limiting = before.limiting.unwrap();
        // pick a normal critical other than the limiting one and move it up
        let other = model
            .criticals
            .iter()
            .enumerate()
            .find(|(i, c)| *i != limiting && c.direction == Direction::Normal)
            .map(|(_, c)| c.var);
        if let Some(var) = other {
            let mut moved = state.clone();
            moved[var] = (moved[var] + bump).min(1.0);
            let after = health::evaluate(&model.criticals, &moved);
            prop_assert_eq!(after.health, before.health);
        }
    }

    #[test]
    fn kernel_output_is_always_in_bounds(
        preset in 0usize..3,
        seed in any::<u64>(),
        isolated_for in 0usize..120,
        stress in stress_vector(),
        flows in flow_totals(),
        steps in 1usize..25,
    ) {
        use rand::SeedableRng;
        let name = [presets::FEDERATION, presets::INTEGRATED, presets::SEEDED][preset];
        let model = presets::by_name(name).unwrap();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let aggregate = FederationAggregate::default();
        let state = model.initial_state(&mut rng, 0.3, None);
        let (mut node, _) = Node::spawn(&model, 0, state, &aggregate);
        prop_assert!(model.schema.in_bounds(&node.state));
        let inputs = StepInputs {
            stress: &stress,
            flows: &flows,
            aggregate: &aggregate,
            isolated_for,
        };
        for _ in 0..steps {
            node = kernel::advance(&model, &node, &inputs, 0.1).node;
            prop_assert!(model.schema.in_bounds(&node.state));
            prop_assert!(node.state.values().iter().all(|v| v.is_finite()));
        }
    }
}

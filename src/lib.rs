// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite

pub mod error;
pub mod types;
pub mod lag;
pub mod state;
pub mod model;
pub mod health;
pub mod kernel;
pub mod topology;
pub mod flows;
pub mod isolation;
pub mod federation;
pub mod config;
pub mod history;
pub mod simulation;

pub use config::{InitConfig, InitMode, ResolvedScenario, ScenarioConfig};
pub use error::{ConfigError, Result};
pub use federation::{AggregateParams, FederationAggregate, PopulationStats};
pub use history::{History, NodeSummary};
pub use model::{presets, Model, ModelBuilder};
pub use simulation::{NodeView, Simulation, StepReport};
pub use types::*;

use wasm_bindgen::prelude::*;

fn js_error(err: ConfigError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl Simulation {
    /// Build from a JSON scenario; omitted fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn from_json(config: &str) -> std::result::Result<Simulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = ScenarioConfig::from_json(config).map_err(js_error)?;
        Simulation::new(config).map_err(js_error)
    }

    pub fn tick(&mut self) -> JsValue {
        let result = self.step_core();
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    /// Run N steps without returning per-step reports.
    pub fn run_batch(&mut self, steps: u32) {
        for _ in 0..steps {
            self.step_core();
        }
    }

    pub fn get_nodes(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.node_views()).unwrap_or(JsValue::NULL)
    }

    pub fn get_aggregate(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.aggregate).unwrap_or(JsValue::NULL)
    }

    pub fn get_history(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.history).unwrap_or(JsValue::NULL)
    }

    pub fn get_flows(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.last_flows).unwrap_or(JsValue::NULL)
    }

    pub fn set_stress(&mut self, node: u32, kind: &str, magnitude: f64) -> std::result::Result<(), JsValue> {
        self.set_stress_core(node, kind, magnitude).map_err(js_error)
    }

    pub fn step(&self) -> u32 {
        self.step as u32
    }

    /// Reset to the initial state of the same scenario.
    pub fn reset(&mut self) -> std::result::Result<(), JsValue> {
        self.reset_core().map_err(js_error)
    }
}

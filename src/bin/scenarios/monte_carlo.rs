// Multi-Seed Runner - N runs per scenario with statistical aggregation
// Run i uses initial-state seed base + i; the topology seed stays fixed so
// every run shares one network.

use federation_engine::{History, Simulation};
use tracing::{error, info_span};

use crate::catalog::{self, Scenario, BREACH_THRESHOLD, LIMITING_WINDOW};
use crate::report::*;
use crate::time_series::TimeSeriesRecorder;

use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    seed: u64,
    time_series_dir: Option<&std::path::Path>,
) -> federation_engine::Result<RunResult> {
    let _span = info_span!("run", scenario = scenario.name, seed).entered();
    let start = Instant::now();

    let mut config = scenario.config.clone();
    config.seed = seed;
    let dt = config.dt;
    let mut sim = Simulation::new(config)?;

    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new(dt));
    while !sim.is_finished() {
        let report = sim.step_core();
        if let Some(ts) = time_series.as_mut() {
            ts.record(&report);
        }
    }

    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = ts.write_jsonl(&path) {
            error!(path = %path.display(), "failed to write time series: {e}");
        }
    }

    let elapsed = start.elapsed();
    let history = sim.into_history();
    let failures = scenario.criteria.check(&history);
    Ok(summarize(scenario, seed, &history, failures, elapsed))
}

fn summarize(
    scenario: &Scenario,
    seed: u64,
    history: &History,
    failures: Vec<String>,
    elapsed: std::time::Duration,
) -> RunResult {
    let nodes = 0..history.nodes.len();
    let finals: Vec<f64> = nodes.clone().filter_map(|n| history.final_health(n)).collect();
    let global_max = |name: &str| {
        history
            .global_signal(name)
            .map(|s| s.iter().copied().fold(0.0, f64::max))
            .unwrap_or(0.0)
    };
    let global_last = |name: &str| history.global_signal(name).and_then(|s| s.last().copied()).unwrap_or(0.0);

    RunResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass: failures.is_empty(),
        failures,
        steps: history.step_count,
        mean_final_health: finals.iter().sum::<f64>() / finals.len().max(1) as f64,
        min_health: nodes
            .clone()
            .filter_map(|n| history.min_health(n))
            .fold(f64::INFINITY, f64::min),
        breached_nodes: catalog::breached_count(history),
        earliest_breach: nodes
            .clone()
            .filter_map(|n| history.first_breach(n, BREACH_THRESHOLD))
            .min(),
        isolated_nodes: history.terminal.iter().filter(|t| t.isolated).count(),
        peak_capture_risk: global_max("capture_risk"),
        min_transparency: history
            .global_signal("transparency")
            .map(|s| s.iter().copied().fold(1.0, f64::min))
            .unwrap_or(1.0),
        final_knowledge_diversity: global_last("knowledge_diversity"),
        synergy_events: catalog::series_sum(history, "synergy_events"),
        clamp_corrections: catalog::series_sum(history, "clamp_corrections"),
        dominant_limiting: nodes
            .map(|n| history.dominant_limiting(n, LIMITING_WINDOW).map(str::to_string))
            .collect(),
        elapsed_ms: elapsed.as_millis(),
        steps_per_sec: history.step_count as f64 / elapsed.as_secs_f64().max(0.001),
    }
}

/// Run N seeds of a scenario and aggregate.
pub fn run_many(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    time_series_base: Option<&std::path::Path>,
) -> federation_engine::Result<ScenarioReport> {
    let ts_dir = time_series_base.map(|base| base.join(scenario.name));

    let results = (0..n_runs)
        .map(|i| run_single(scenario, base_seed + i as u64, ts_dir.as_deref()))
        .collect::<federation_engine::Result<Vec<_>>>()?;

    Ok(aggregate(scenario, results))
}

fn aggregate(scenario: &Scenario, results: Vec<RunResult>) -> ScenarioReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let stats = |f: fn(&RunResult) -> f64| {
        Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
    };

    ScenarioReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate: passed as f64 / n.max(1) as f64,
        mean_final_health: stats(|r| r.mean_final_health),
        min_health: stats(|r| r.min_health),
        breached_nodes: stats(|r| r.breached_nodes as f64),
        isolated_nodes: stats(|r| r.isolated_nodes as f64),
        peak_capture_risk: stats(|r| r.peak_capture_risk),
        final_knowledge_diversity: stats(|r| r.final_knowledge_diversity),
        synergy_events: stats(|r| r.synergy_events),
        elapsed_ms: stats(|r| r.elapsed_ms as f64),
        individual_runs: results,
    }
}

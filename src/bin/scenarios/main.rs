// Federation Scenario Runner
// Multi-seed runs over the built-in catalog, seedable PRNG, per-step JSONL
//
// Usage:
//   cargo run --release --bin scenarios                      # All scenarios (10 runs each)
//   cargo run --release --bin scenarios -- --runs 3          # Quick mode
//   cargo run --release --bin scenarios -- integrated        # Filter by name or category
//   cargo run --release --bin scenarios -- --time-series     # Enable JSONL output
//   cargo run --release --bin scenarios -- --seed 42         # Custom base seed
//
// Log level follows RUST_LOG (default `info`).

mod catalog;
mod monte_carlo;
mod report;
mod time_series;

use catalog::*;
use report::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

/// Share of seeds a scenario must pass.
const PASS_RATE: f64 = 0.9;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    time_series: bool,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 10,
        seed: 0,
        time_series: false,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(10).max(1);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--time-series" => {
                cli.time_series = true;
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let ts_dir = cli
        .time_series
        .then(|| std::path::Path::new("scenario-results/time-series").to_path_buf());

    println!("\n  Federation Scenario Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<44} {:>5} {:>13} {:>8} {:>8} {:>6} {:>7}",
        "Scenario", "Pass%", "FinalH", "MinH", "Breach", "Iso", "Time");
    println!("  {}", "-".repeat(100));

    let suite_start = Instant::now();
    let mut reports = Vec::new();

    for scenario in &to_run {
        let report = match monte_carlo::run_many(scenario, cli.runs, cli.seed, ts_dir.as_deref()) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("  {}: invalid scenario: {}", scenario.name, e);
                std::process::exit(2);
            }
        };

        let pass_pct = report.pass_rate * 100.0;
        let status = if report.pass_rate >= PASS_RATE { "PASS" } else { "FAIL" };

        println!("  {:<44} {:>4}% {:>6.3}±{:<5.3} {:>8.3} {:>8.1} {:>6.1} {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.mean_final_health.mean, report.mean_final_health.half_width(),
            report.min_health.mean,
            report.breached_nodes.mean,
            report.isolated_nodes.mean,
            report.elapsed_ms.mean,
            status,
        );
        if status == "FAIL" {
            if let Some(run) = report.individual_runs.iter().find(|r| !r.pass) {
                for failure in &run.failures {
                    println!("      seed {}: {}", run.seed, failure);
                }
            }
        }

        reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.pass_rate >= PASS_RATE).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(100));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis();
    let timestamp = format!("{}", ts);

    let report = RunReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        base_seed: cli.seed,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        scenarios: reports,
    };

    let dir = std::path::Path::new("scenario-results");
    std::fs::create_dir_all(dir).expect("Failed to create scenario-results/");
    let path = dir.join(format!("run-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).expect("Failed to serialize");
    std::fs::write(&path, &json).expect("Failed to write report file");
    println!("  Results saved to: {}\n", path.display());

    if failed > 0 {
        std::process::exit(1);
    }
}

// Scenario Run Report Types
// Structured output for offline analysis and plotting

use serde::Serialize;

// ─── Statistics (per-metric multi-seed aggregation) ─────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        // sample variance across seeds
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let half_width = 1.96 * std_dev / (n as f64).sqrt();
        Self {
            mean,
            std_dev,
            ci_lower: mean - half_width,
            ci_upper: mean + half_width,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    pub fn half_width(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub scenario: String,
    pub name: String,
    pub category: String,
    pub seed: u64,
    pub pass: bool,
    pub failures: Vec<String>,
    pub steps: usize,
    pub mean_final_health: f64,
    pub min_health: f64,
    pub breached_nodes: usize,
    pub earliest_breach: Option<usize>,
    pub isolated_nodes: usize,
    pub peak_capture_risk: f64,
    pub min_transparency: f64,
    pub final_knowledge_diversity: f64,
    pub synergy_events: f64,
    pub clamp_corrections: f64,
    pub dominant_limiting: Vec<Option<String>>,
    pub elapsed_ms: u128,
    pub steps_per_sec: f64,
}

// ─── Multi-Seed Report (per-scenario aggregation) ───────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub mean_final_health: Stats,
    pub min_health: Stats,
    pub breached_nodes: Stats,
    pub isolated_nodes: Stats,
    pub peak_capture_risk: Stats,
    pub final_knowledge_diversity: Stats,
    pub synergy_events: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<RunResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub base_seed: u64,
    pub summary: Summary,
    pub scenarios: Vec<ScenarioReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_samples() {
        let s = Stats::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.mean, 2.5);
        assert_eq!((s.min, s.max, s.n), (1.0, 4.0, 4));
        assert!((s.std_dev - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(s.ci_lower < s.mean && s.mean < s.ci_upper);
    }

    #[test]
    fn test_single_sample_has_zero_width() {
        let s = Stats::from_samples(&[0.7]);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.half_width(), 0.0);
        assert_eq!(Stats::from_samples(&[]).n, 0);
    }
}

// Per-Step JSONL Time Series Recorder
// One JSON line per step for plotting outside the runner

use federation_engine::StepReport;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct StepSnapshot {
    pub step: usize,
    pub time: f64,
    pub mean_health: f64,
    pub min_health: f64,
    pub max_health: f64,
    pub isolated_count: usize,
    pub newly_isolated: Vec<usize>,
    pub synergy_events: usize,
    pub clamp_corrections: usize,
    pub transparency: f64,
    pub capture_risk: f64,
    pub knowledge_diversity: f64,
    pub containment: f64,
    pub redistribution: f64,
    pub externalization: f64,
}

impl StepSnapshot {
    pub fn from_report(report: &StepReport, dt: f64) -> Self {
        let agg = &report.aggregate;
        Self {
            step: report.step,
            time: report.step as f64 * dt,
            mean_health: report.mean_health,
            min_health: report.min_health,
            max_health: report.max_health,
            isolated_count: report.isolated_count,
            newly_isolated: report.newly_isolated.clone(),
            synergy_events: report.synergy_events,
            clamp_corrections: report.clamp_corrections,
            transparency: agg.transparency,
            capture_risk: agg.capture_risk,
            knowledge_diversity: agg.knowledge_diversity,
            containment: agg.containment,
            redistribution: agg.resource_redistribution,
            externalization: agg.externalization,
        }
    }
}

/// Accumulates snapshots for one run and writes them as JSONL.
pub struct TimeSeriesRecorder {
    dt: f64,
    snapshots: Vec<StepSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new(dt: f64) -> Self {
        Self { dt, snapshots: Vec::new() }
    }

    pub fn record(&mut self, report: &StepReport) {
        self.snapshots.push(StepSnapshot::from_report(report, self.dt));
    }

    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Run History

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HEALTH: &str = "health";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeSeries {
    pub id: u32,
    /// Health, every state variable and every composite, one sample per step.
    pub signals: BTreeMap<String, Vec<f64>>,
    /// Index into `History::critical_names` per step.
    pub limiting: Vec<Option<usize>>,
    pub isolated_at: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TerminalSnapshot {
    pub id: u32,
    pub health: f64,
    pub limiting: Option<String>,
    pub isolated: bool,
}

/// What a text summary needs for one node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeSummary {
    pub id: u32,
    pub final_health: f64,
    pub min_health: f64,
    pub first_breach: Option<usize>,
    pub dominant_limiting: Option<String>,
}

/// Plain named series; no rendering concerns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct History {
    pub scenario: String,
    pub model: String,
    pub step_count: usize,
    pub dt: f64,
    pub critical_names: Vec<String>,
    pub global: BTreeMap<String, Vec<f64>>,
    pub nodes: Vec<NodeSeries>,
    pub terminal: Vec<TerminalSnapshot>,
}

impl History {
    pub fn new(scenario: &str, model: &str, critical_names: Vec<String>, node_count: usize, dt: f64) -> Self {
        Self {
            scenario: scenario.to_string(),
            model: model.to_string(),
            step_count: 0,
            dt,
            critical_names,
            global: BTreeMap::new(),
            nodes: (0..node_count)
                .map(|i| NodeSeries {
                    id: i as u32,
                    signals: BTreeMap::new(),
                    limiting: Vec::new(),
                    isolated_at: None,
                })
                .collect(),
            terminal: Vec::new(),
        }
    }

    // ─── Recording ───────────────────────────────────────────────────────────

    pub fn push_global(&mut self, name: &str, value: f64) {
        self.global.entry(name.to_string()).or_default().push(value);
    }

    pub fn push_node(&mut self, node: usize, name: &str, value: f64) {
        self.nodes[node]
            .signals
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    pub fn push_limiting(&mut self, node: usize, limiting: Option<usize>) {
        self.nodes[node].limiting.push(limiting);
    }

    pub fn mark_isolated(&mut self, node: usize, step: usize) {
        self.nodes[node].isolated_at.get_or_insert(step);
    }

    /// Close the current step.
    pub fn end_step(&mut self) {
        self.step_count += 1;
    }

    /// Snapshot every node from its last recorded sample.
    pub fn seal(&mut self) {
        self.terminal = self
            .nodes
            .iter()
            .map(|n| TerminalSnapshot {
                id: n.id,
                health: n
                    .signals
                    .get(HEALTH)
                    .and_then(|s| s.last().copied())
                    .unwrap_or(f64::NAN),
                limiting: n
                    .limiting
                    .last()
                    .copied()
                    .flatten()
                    .and_then(|i| self.critical_names.get(i).cloned()),
                isolated: n.isolated_at.is_some(),
            })
            .collect();
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn global_signal(&self, name: &str) -> Option<&[f64]> {
        self.global.get(name).map(Vec::as_slice)
    }

    pub fn node_signal(&self, node: usize, name: &str) -> Option<&[f64]> {
        self.nodes.get(node)?.signals.get(name).map(Vec::as_slice)
    }

    pub fn health(&self, node: usize) -> Option<&[f64]> {
        self.node_signal(node, HEALTH)
    }

    pub fn final_health(&self, node: usize) -> Option<f64> {
        self.health(node)?.last().copied()
    }

    pub fn min_health(&self, node: usize) -> Option<f64> {
        self.health(node)?.iter().copied().reduce(f64::min)
    }

    /// First step whose health is below `threshold`.
    pub fn first_breach(&self, node: usize, threshold: f64) -> Option<usize> {
        self.health(node)?.iter().position(|h| *h < threshold)
    }

    /// Most frequent limiting variable over the last `window` steps.
    /// Ties go to the one seen most recently.
    pub fn dominant_limiting(&self, node: usize, window: usize) -> Option<&str> {
        let limiting = &self.nodes.get(node)?.limiting;
        let start = limiting.len().saturating_sub(window);
        // (critical index, count, last position)
        let mut tally: Vec<(usize, usize, usize)> = Vec::new();
        for (pos, idx) in limiting[start..].iter().enumerate() {
            let Some(idx) = *idx else { continue };
            match tally.iter_mut().find(|(i, _, _)| *i == idx) {
                Some(entry) => {
                    entry.1 += 1;
                    entry.2 = pos;
                }
                None => tally.push((idx, 1, pos)),
            }
        }
        tally
            .into_iter()
            .max_by_key(|&(_, count, last)| (count, last))
            .and_then(|(idx, _, _)| self.critical_names.get(idx))
            .map(String::as_str)
    }

    pub fn summarize(&self, node: usize, threshold: f64, window: usize) -> Option<NodeSummary> {
        Some(NodeSummary {
            id: self.nodes.get(node)?.id,
            final_health: self.final_health(node)?,
            min_health: self.min_health(node)?,
            first_breach: self.first_breach(node, threshold),
            dominant_limiting: self.dominant_limiting(node, window).map(str::to_string),
        })
    }

    /// True when every recorded series has exactly `step_count` samples.
    pub fn is_consistent(&self) -> bool {
        let n = self.step_count;
        self.global.values().all(|s| s.len() == n)
            && self.nodes.iter().all(|node| {
                node.limiting.len() == n && node.signals.values().all(|s| s.len() == n)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(healths: &[f64], limiting: &[Option<usize>]) -> History {
        let names = vec!["soil".to_string(), "water".to_string(), "food".to_string()];
        let mut h = History::new("test", "federation", names, 1, 0.1);
        for (v, l) in healths.iter().zip(limiting) {
            h.push_node(0, HEALTH, *v);
            h.push_limiting(0, *l);
            h.push_global("mean_health", *v);
            h.end_step();
        }
        h.seal();
        h
    }

    #[test]
    fn test_breach_and_final() {
        let h = history(&[0.5, 0.3, 0.19, 0.25], &[Some(0); 4]);
        assert_eq!(h.first_breach(0, 0.2), Some(2));
        assert_eq!(h.first_breach(0, 0.1), None);
        assert_eq!(h.final_health(0), Some(0.25));
        assert_eq!(h.min_health(0), Some(0.19));
        assert!(h.is_consistent());
        assert_eq!(h.global_signal("mean_health").map(<[f64]>::len), Some(4));
    }

    #[test]
    fn test_json_keeps_every_bit() {
        let h = history(&[0.46265064844387677, 0.1 + 0.2, 1.0 / 3.0], &[Some(1); 3]);
        let json = serde_json::to_string(&h).unwrap();
        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_dominant_limiting_over_window() {
        let lim = [Some(2), Some(2), Some(2), Some(0), Some(1), Some(0), None];
        let h = history(&[0.5; 7], &lim);
        assert_eq!(h.dominant_limiting(0, 7), Some("food"));
        assert_eq!(h.dominant_limiting(0, 4), Some("soil"));
    }

    #[test]
    fn test_dominant_ties_go_to_most_recent() {
        let lim = [Some(0), Some(1), Some(1), Some(0)];
        let h = history(&[0.5; 4], &lim);
        assert_eq!(h.dominant_limiting(0, 4), Some("soil"));
        let lim = [Some(0), Some(1), Some(0), Some(1)];
        let h = history(&[0.5; 4], &lim);
        assert_eq!(h.dominant_limiting(0, 4), Some("water"));
        assert_eq!(h.dominant_limiting(0, 0), None);
    }

    #[test]
    fn test_terminal_snapshot() {
        let mut h = history(&[0.4, 0.1], &[Some(0), Some(1)]);
        assert_eq!(h.terminal[0].limiting.as_deref(), Some("water"));
        assert!(!h.terminal[0].isolated);
        h.mark_isolated(0, 1);
        h.mark_isolated(0, 5);
        h.seal();
        assert!(h.terminal[0].isolated);
        assert_eq!(h.nodes[0].isolated_at, Some(1));
    }

    #[test]
    fn test_summary() {
        let h = history(&[0.6, 0.1], &[Some(2), Some(2)]);
        let s = h.summarize(0, 0.2, 50).unwrap();
        assert_eq!(s.first_breach, Some(1));
        assert_eq!(s.dominant_limiting.as_deref(), Some("food"));
        assert!(h.summarize(3, 0.2, 50).is_none());
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Cascade Isolation

use serde::{Deserialize, Serialize};
use tracing::info;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct IsolationParams {
    /// Health below which a node is considered collapsing.
    pub collapse_threshold: f64,
    /// Containment the federation needs before it can cut a node off.
    pub activation_threshold: f64,
}

impl Default for IsolationParams {
    fn default() -> Self {
        Self {
            collapse_threshold: 0.15,
            activation_threshold: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Link state
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum LinkState {
    Connected,
    Isolated { since_step: usize },
}

// ---------------------------------------------------------------------------
// Controller (per-node circuit breaker)
// ---------------------------------------------------------------------------

/// One breaker per node. A tripped breaker stays tripped: there is no
/// reconnection path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IsolationController {
    pub params: IsolationParams,
    links: Vec<LinkState>,
}

impl IsolationController {
    pub fn new(size: usize, params: IsolationParams) -> Self {
        Self {
            params,
            links: vec![LinkState::Connected; size],
        }
    }

    /// Trip every connected node that is collapsing while containment is
    /// active. Returns the nodes isolated by this call.
    ///
    /// Takes effect on the next step's flow computation.
    pub fn evaluate(&mut self, step: usize, healths: &[f64], containment: f64) -> Vec<usize> {
        if containment <= self.params.activation_threshold {
            return Vec::new();
        }
        let mut tripped = Vec::new();
        for (node, (link, &health)) in self.links.iter_mut().zip(healths).enumerate() {
            if *link == LinkState::Connected && health < self.params.collapse_threshold {
                *link = LinkState::Isolated { since_step: step };
                info!(node, step, health, containment, "node isolated");
                tripped.push(node);
            }
        }
        tripped
    }

    pub fn state(&self, node: usize) -> LinkState {
        self.links[node]
    }

    pub fn is_isolated(&self, node: usize) -> bool {
        matches!(self.links[node], LinkState::Isolated { .. })
    }

    /// Steps node has spent cut off as of `step`; 0 while connected.
    pub fn isolated_for(&self, node: usize, step: usize) -> usize {
        match self.links[node] {
            LinkState::Connected => 0,
            LinkState::Isolated { since_step } => step.saturating_sub(since_step),
        }
    }

    pub fn isolated_count(&self) -> usize {
        self.links
            .iter()
            .filter(|l| matches!(l, LinkState::Isolated { .. }))
            .count()
    }

    /// Per-node flags in node order.
    pub fn flags(&self) -> Vec<bool> {
        (0..self.links.len()).map(|i| self.is_isolated(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_connected() {
        let ctl = IsolationController::new(4, IsolationParams::default());
        assert_eq!(ctl.isolated_count(), 0);
        assert_eq!(ctl.state(2), LinkState::Connected);
        assert_eq!(ctl.flags(), vec![false; 4]);
    }

    #[test]
    fn test_trips_only_collapsing_nodes() {
        let mut ctl = IsolationController::new(3, IsolationParams::default());
        let tripped = ctl.evaluate(7, &[0.5, 0.10, 0.15], 0.7);
        assert_eq!(tripped, vec![1]);
        assert_eq!(ctl.state(1), LinkState::Isolated { since_step: 7 });
        assert!(!ctl.is_isolated(2));
    }

    #[test]
    fn test_isolation_age_counts_from_the_trip() {
        let mut ctl = IsolationController::new(2, IsolationParams::default());
        ctl.evaluate(12, &[0.05, 0.6], 0.8);
        assert_eq!(ctl.isolated_for(0, 12), 0);
        assert_eq!(ctl.isolated_for(0, 45), 33);
        assert_eq!(ctl.isolated_for(1, 45), 0);
    }

    #[test]
    fn test_needs_active_containment() {
        let mut ctl = IsolationController::new(2, IsolationParams::default());
        assert!(ctl.evaluate(1, &[0.0, 0.0], 0.5).is_empty());
        assert_eq!(ctl.isolated_count(), 0);
        assert_eq!(ctl.evaluate(2, &[0.0, 0.9], 0.51), vec![0]);
    }

    #[test]
    fn test_isolation_is_one_way() {
        let mut ctl = IsolationController::new(1, IsolationParams::default());
        ctl.evaluate(3, &[0.05], 0.9);
        // recovery does not reconnect, and a later trip does not restamp
        assert!(ctl.evaluate(4, &[0.95], 0.9).is_empty());
        assert!(ctl.evaluate(5, &[0.01], 0.9).is_empty());
        assert_eq!(ctl.state(0), LinkState::Isolated { since_step: 3 });
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Topology Builder

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{ConfigError, Result};
use crate::types::{Profile, TopologyPolicy};

/// Nodes per bioregional cluster.
pub const CLUSTER_SIZE: usize = 6;

/// Weighted undirected graph over node ids `0..size`.
///
/// The matrix is symmetric with a zero diagonal; `w == 0` means no edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    policy: TopologyPolicy,
    size: usize,
    // row-major size x size
    weights: Vec<f64>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl Network {
    pub fn build(size: usize, policy: TopologyPolicy, seed: u64) -> Result<Self> {
        Self::build_with_profiles(size, policy, seed, None)
    }

    /// Build with complementary-profile boosts applied to existing edges.
    ///
    /// Each unordered pair is generated once and mirrored, so the same seed
    /// always yields the same matrix.
    pub fn build_with_profiles(
        size: usize,
        policy: TopologyPolicy,
        seed: u64,
        profiles: Option<&[Profile]>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let side = (size as f64).sqrt().ceil() as usize;
        let p_random = (3.0 / size as f64).min(1.0);

        let mut weights = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let mut w = match policy {
                    TopologyPolicy::Clustered => {
                        let (ci, cj) = (i / CLUSTER_SIZE, j / CLUSTER_SIZE);
                        if ci == cj {
                            0.7 + 0.2 * rng.gen::<f64>()
                        } else if cj - ci == 1 {
                            0.05 + 0.15 * rng.gen::<f64>()
                        } else {
                            0.0
                        }
                    }
                    TopologyPolicy::Grid => {
                        let right = j == i + 1 && i % side != side - 1;
                        let down = j == i + side;
                        if right || down {
                            0.6 + 0.2 * rng.gen::<f64>()
                        } else {
                            0.0
                        }
                    }
                    TopologyPolicy::Random => {
                        if rng.gen::<f64>() < p_random {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                if let Some(p) = profiles {
                    if w > 0.0 {
                        w = (w * affinity(p[i], p[j])).min(1.0);
                    }
                }
                weights[i * size + j] = w;
                weights[j * size + i] = w;
            }
        }
        Ok(Self::from_matrix(policy, size, weights))
    }

    /// Wrap an existing row-major matrix.
    pub fn from_matrix(policy: TopologyPolicy, size: usize, weights: Vec<f64>) -> Self {
        let adjacency = (0..size)
            .map(|i| {
                (0..size)
                    .filter(|&j| j != i && weights[i * size + j] > 0.0)
                    .map(|j| (j, weights[i * size + j]))
                    .collect()
            })
            .collect();
        Self {
            policy,
            size,
            weights,
            adjacency,
        }
    }

    pub fn policy(&self) -> TopologyPolicy {
        self.policy
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[i * self.size + j]
    }

    /// `(neighbor, weight)` for every edge with positive weight.
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.adjacency[i]
    }

    pub fn cluster_of(&self, i: usize) -> Option<usize> {
        match self.policy {
            TopologyPolicy::Clustered => Some(i / CLUSTER_SIZE),
            _ => None,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Hop count from the nearest source, `None` where unreachable.
    pub fn hop_distances(&self, sources: &[usize]) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.size];
        let mut queue = VecDeque::new();
        for &s in sources {
            if s < self.size && dist[s].is_none() {
                dist[s] = Some(0);
                queue.push_back(s);
            }
        }
        while let Some(current) = queue.pop_front() {
            let d = dist[current].unwrap_or_default();
            for &(next, _) in &self.adjacency[current] {
                if dist[next].is_none() {
                    dist[next] = Some(d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }
}

/// Edge multiplier between two specializations.
pub fn affinity(a: Profile, b: Profile) -> f64 {
    use Profile::*;
    match (a, b) {
        (Craft, Coordination) | (Coordination, Craft) => 1.3,
        (Ecological, Knowledge) | (Knowledge, Ecological) => 1.3,
        (Craft, Ecological) | (Ecological, Craft) => 1.1,
        (Coordination, Knowledge) | (Knowledge, Coordination) => 1.1,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(net: &Network) {
        for i in 0..net.size() {
            assert_eq!(net.weight(i, i), 0.0);
            for j in 0..net.size() {
                let w = net.weight(i, j);
                assert_eq!(w, net.weight(j, i));
                assert!((0.0..=1.0).contains(&w));
            }
        }
    }

    #[test]
    fn test_clustered_weights() {
        let net = Network::build(24, TopologyPolicy::Clustered, 7).unwrap();
        assert_well_formed(&net);
        assert!((0.7..=0.9).contains(&net.weight(0, 5)));
        let bridge = net.weight(0, 6);
        assert!((0.05..=0.2).contains(&bridge));
        assert_eq!(net.weight(0, 12), 0.0);
        assert_eq!(net.weight(3, 23), 0.0);
        assert_eq!(net.cluster_of(13), Some(2));
    }

    #[test]
    fn test_grid_is_four_neighbour_without_wrap() {
        let net = Network::build(9, TopologyPolicy::Grid, 1).unwrap();
        assert_well_formed(&net);
        assert!(net.weight(0, 1) >= 0.6);
        assert!(net.weight(0, 3) >= 0.6);
        assert_eq!(net.weight(2, 3), 0.0);
        assert_eq!(net.weight(0, 4), 0.0);
        assert_eq!(net.neighbors(4).len(), 4);
        assert_eq!(net.edge_count(), 12);
        assert_eq!(net.cluster_of(4), None);
    }

    #[test]
    fn test_random_is_seeded() {
        let a = Network::build(30, TopologyPolicy::Random, 11).unwrap();
        let b = Network::build(30, TopologyPolicy::Random, 11).unwrap();
        let c = Network::build(30, TopologyPolicy::Random, 12).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_well_formed(&a);
        assert!(a.neighbors(0).iter().all(|(_, w)| *w == 1.0));
    }

    #[test]
    fn test_profile_affinity_boosts_complements() {
        let profiles = vec![Profile::Craft, Profile::Coordination, Profile::Craft];
        let plain = Network::build(3, TopologyPolicy::Clustered, 5).unwrap();
        let boosted =
            Network::build_with_profiles(3, TopologyPolicy::Clustered, 5, Some(&profiles)).unwrap();
        let expected = (plain.weight(0, 1) * 1.3).min(1.0);
        assert!((boosted.weight(0, 1) - expected).abs() < 1e-12);
        assert_eq!(boosted.weight(0, 2), plain.weight(0, 2));
        assert_eq!(affinity(Profile::Generalist, Profile::Craft), 1.0);
    }

    #[test]
    fn test_hop_distances() {
        let net = Network::build(9, TopologyPolicy::Grid, 3).unwrap();
        let d = net.hop_distances(&[0]);
        assert_eq!(d[0], Some(0));
        assert_eq!(d[4], Some(2));
        assert_eq!(d[8], Some(4));

        let net = Network::build(18, TopologyPolicy::Clustered, 3).unwrap();
        let d = net.hop_distances(&[2]);
        assert_eq!(d[5], Some(1));
        assert_eq!(d[8], Some(1));
        assert_eq!(d[14], Some(2));

        let isolated = Network::from_matrix(TopologyPolicy::Random, 2, vec![0.0; 4]);
        assert_eq!(isolated.hop_distances(&[0]), vec![Some(0), None]);
    }

    #[test]
    fn test_empty_network_rejected() {
        assert!(matches!(
            Network::build(0, TopologyPolicy::Grid, 1),
            Err(ConfigError::EmptyNetwork)
        ));
    }
}

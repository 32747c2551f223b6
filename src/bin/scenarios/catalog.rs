// Scenario Catalog - network scenarios on the federation and seeded presets
// plus the single-node stress set on the integrated preset

use federation_engine::topology::Network;
use federation_engine::{presets, History, InitMode, ScenarioConfig};

/// Health below this counts as a breach.
pub const BREACH_THRESHOLD: f64 = 0.20;

/// Trailing window for the dominant limiting variable.
pub const LIMITING_WINDOW: usize = 50;

// ─── Scenario Definition ────────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    /// Template config; each run overrides `seed`.
    pub config: ScenarioConfig,
    pub criteria: PassCriteria,
}

#[derive(Default)]
pub struct PassCriteria {
    /// Health floor over the whole run.
    pub floor: Option<f64>,
    /// Nodes the floor applies to; `None` means every node.
    pub floor_nodes: Option<Vec<u32>>,
    /// Nodes that must breach before the run ends.
    pub must_breach: Vec<u32>,
    /// Nodes that must never breach.
    pub never_breach: Vec<u32>,
    pub min_breached: Option<usize>,
    /// (node, variable) expected to dominate the trailing window.
    pub dominant_limiting: Option<(u32, &'static str)>,
    pub min_synergy_events: Option<f64>,
}

impl PassCriteria {
    /// Every violated criterion, described. Empty means pass.
    pub fn check(&self, history: &History) -> Vec<String> {
        let mut failures = Vec::new();
        let node_count = history.nodes.len();

        if let Some(floor) = self.floor {
            let nodes: Vec<usize> = match &self.floor_nodes {
                Some(list) => list.iter().map(|&n| n as usize).collect(),
                None => (0..node_count).collect(),
            };
            for node in nodes {
                let min = history.min_health(node).unwrap_or(f64::NAN);
                if min.is_nan() || min < floor {
                    failures.push(format!("node {node} fell to {min:.3} (floor {floor})"));
                }
            }
        }
        for &node in &self.must_breach {
            if history.first_breach(node as usize, BREACH_THRESHOLD).is_none() {
                failures.push(format!("node {node} never breached"));
            }
        }
        for &node in &self.never_breach {
            if let Some(step) = history.first_breach(node as usize, BREACH_THRESHOLD) {
                failures.push(format!("node {node} breached at step {step}"));
            }
        }
        if let Some(min) = self.min_breached {
            let breached = breached_count(history);
            if breached < min {
                failures.push(format!("{breached} nodes breached, expected at least {min}"));
            }
        }
        if let Some((node, expected)) = self.dominant_limiting {
            let got = history.dominant_limiting(node as usize, LIMITING_WINDOW);
            if got != Some(expected) {
                failures.push(format!("node {node} limited by {got:?}, expected {expected}"));
            }
        }
        if let Some(min) = self.min_synergy_events {
            let total = series_sum(history, "synergy_events");
            if total < min {
                failures.push(format!("{total} synergy events, expected at least {min}"));
            }
        }
        failures
    }
}

pub fn breached_count(history: &History) -> usize {
    (0..history.nodes.len())
        .filter(|&n| history.first_breach(n, BREACH_THRESHOLD).is_some())
        .count()
}

pub fn series_sum(history: &History, name: &str) -> f64 {
    history.global_signal(name).map(|s| s.iter().sum()).unwrap_or(0.0)
}

// ─── Config Helpers ─────────────────────────────────────────────────────────

fn network(name: &str) -> ScenarioConfig {
    ScenarioConfig {
        name: name.to_string(),
        ..ScenarioConfig::default()
    }
}

/// Single integrated node started exactly at its base values.
fn integrated(name: &str, stresses: &[(&str, f64)]) -> ScenarioConfig {
    let mut cfg = ScenarioConfig {
        name: name.to_string(),
        model: presets::INTEGRATED.to_string(),
        node_count: 1,
        steps: 500,
        stress_onset: 60,
        ..ScenarioConfig::default()
    };
    cfg.init.variance = 0.0;
    cfg.with_stresses(&[0], stresses)
}

/// Single seeded network node per community.
fn seeded(name: &str) -> ScenarioConfig {
    let mut cfg = ScenarioConfig {
        name: name.to_string(),
        model: presets::SEEDED.to_string(),
        steps: 350,
        ..ScenarioConfig::default()
    };
    cfg.init.mode = InitMode::Profiles;
    cfg
}

/// Nodes exactly `hops` edges from the nearest source on the network the
/// config will build. Empty when the config does not resolve.
fn nodes_at_hops(config: &ScenarioConfig, sources: &[usize], hops: usize) -> Vec<u32> {
    let network = config
        .resolve()
        .and_then(|s| Network::build(s.node_count(), s.policy, s.config.topology_seed));
    match network {
        Ok(net) => net
            .hop_distances(sources)
            .into_iter()
            .enumerate()
            .filter(|(_, d)| *d == Some(hops))
            .map(|(i, _)| i as u32)
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn breaches() -> PassCriteria {
    PassCriteria {
        must_breach: vec![0],
        ..PassCriteria::default()
    }
}

// ─── Catalog ────────────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    let n = ScenarioConfig::default().node_count;
    let everyone: Vec<u32> = (0..n).collect();

    let mut high_diversity = network("high_diversity");
    high_diversity.init.variance = 0.25;

    let cascade = network("cascade")
        .with_stresses(&[2, 3, 4], &[("pressure", 0.50), ("drought", 0.30)]);
    let two_hops = nodes_at_hops(&cascade, &[2, 3, 4], 2);

    let mut synergy = network("synergy");
    synergy.init.mode = InitMode::Profiles;
    synergy.init.variance = 0.12;
    synergy.steps = 400;

    let mut resilient = integrated(
        "integrated_resilient",
        &[
            ("pressure", 0.25),
            ("ego_capture", 0.20),
            ("drought", 0.25),
            ("cultural_rigidity", 0.20),
            ("ai_corruption", 0.15),
        ],
    );
    for (var, value) in presets::RESILIENT_OVERRIDES {
        resilient.overrides.insert(var.to_string(), value);
    }

    vec![
        // ─── Federation network ─────────────────────────────────────────
        Scenario {
            name: "baseline",
            label: "Baseline (no stress)",
            category: "network",
            config: network("baseline"),
            criteria: PassCriteria {
                floor: Some(BREACH_THRESHOLD),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "cascade",
            label: "Cascade (nodes 2-4 stressed)",
            category: "network",
            config: cascade,
            criteria: PassCriteria {
                floor: Some(BREACH_THRESHOLD),
                floor_nodes: Some(two_hops),
                must_breach: vec![2, 3, 4],
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "empire",
            label: "Empire capture (node 0)",
            category: "network",
            config: network("empire").with_stress(0, "ego_capture", 0.60),
            criteria: PassCriteria {
                floor: Some(BREACH_THRESHOLD),
                floor_nodes: Some((1..n).collect()),
                must_breach: vec![0],
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "monoculture",
            label: "Knowledge monoculture",
            category: "network",
            config: network("monoculture").with_stresses(&everyone, &[("pressure", 0.25)]),
            criteria: PassCriteria {
                min_breached: Some(n as usize / 2),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "high_diversity",
            label: "High initial diversity",
            category: "network",
            config: high_diversity,
            criteria: PassCriteria {
                floor: Some(BREACH_THRESHOLD),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "synergy",
            label: "Profiled nodes (synergy)",
            category: "network",
            config: synergy,
            criteria: PassCriteria {
                floor: Some(BREACH_THRESHOLD),
                min_synergy_events: Some(1.0),
                ..PassCriteria::default()
            },
        },
        // ─── Seeded network ─────────────────────────────────────────────
        Scenario {
            name: "seeded",
            label: "Seeded nodes (no stress)",
            category: "seeded",
            config: seeded("seeded"),
            criteria: PassCriteria {
                floor: Some(BREACH_THRESHOLD),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "seeded_cascade",
            label: "Seeded cascade (nodes 2-4 stressed)",
            category: "seeded",
            config: seeded("seeded_cascade")
                .with_stresses(&[2, 3, 4], &[("pressure", 0.50), ("drought", 0.30)]),
            criteria: PassCriteria {
                must_breach: vec![2, 3, 4],
                ..PassCriteria::default()
            },
        },
        // ─── Integrated single node ─────────────────────────────────────
        Scenario {
            name: "integrated_baseline",
            label: "Integrated baseline",
            category: "integrated",
            config: integrated("integrated_baseline", &[]),
            criteria: PassCriteria {
                never_breach: vec![0],
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "integrated_full_industrial",
            label: "Integrated full industrial",
            category: "integrated",
            config: integrated(
                "integrated_full_industrial",
                &[
                    ("pressure", 0.35),
                    ("age_segregation", 0.20),
                    ("specialization", 0.20),
                    ("institutional_replacement", 0.25),
                ],
            ),
            criteria: breaches(),
        },
        Scenario {
            name: "integrated_ego_crisis",
            label: "Integrated ego + crisis",
            category: "integrated",
            config: integrated(
                "integrated_ego_crisis",
                &[("ego_capture", 0.35), ("external_crisis", 0.40)],
            ),
            criteria: breaches(),
        },
        Scenario {
            name: "integrated_cultural",
            label: "Integrated cultural rigidity",
            category: "integrated",
            config: integrated(
                "integrated_cultural",
                &[("cultural_rigidity", 0.50), ("institutional_replacement", 0.30)],
            ),
            criteria: breaches(),
        },
        Scenario {
            name: "integrated_ai_corruption",
            label: "Integrated AI corruption",
            category: "integrated",
            config: integrated("integrated_ai_corruption", &[("ai_corruption", 0.65)]),
            criteria: breaches(),
        },
        Scenario {
            name: "integrated_drought",
            label: "Integrated drought",
            category: "integrated",
            config: integrated("integrated_drought", &[("drought", 0.55)]),
            criteria: PassCriteria {
                must_breach: vec![0],
                dominant_limiting: Some((0, "soil_carbon")),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "integrated_compound",
            label: "Integrated compound stress",
            category: "integrated",
            config: integrated(
                "integrated_compound",
                &[
                    ("pressure", 0.25),
                    ("ego_capture", 0.20),
                    ("drought", 0.25),
                    ("cultural_rigidity", 0.20),
                    ("ai_corruption", 0.15),
                ],
            ),
            criteria: breaches(),
        },
        Scenario {
            name: "integrated_resilient",
            label: "Integrated resilient node, compound stress",
            category: "integrated",
            config: resilient,
            criteria: breaches(),
        },
    ]
}

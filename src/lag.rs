// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Delay Lines

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-depth delay line for one scalar signal.
///
/// `get()` yields the value pushed exactly `depth` pushes ago. The buffer is
/// pre-filled with a seed, so reads before `depth` pushes have happened
/// return the seed rather than an undefined history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LagBuffer {
    depth: usize,
    // newest at the front; holds depth + 1 samples
    samples: VecDeque<f64>,
}

impl LagBuffer {
    pub fn new(depth: usize, seed: f64) -> Self {
        let mut samples = VecDeque::with_capacity(depth + 1);
        samples.extend(std::iter::repeat(seed).take(depth + 1));
        Self { depth, samples }
    }

    /// Insert at the front, evicting the oldest sample.
    pub fn push(&mut self, value: f64) {
        self.samples.push_front(value);
        self.samples.truncate(self.depth + 1);
    }

    /// The oldest retained sample.
    pub fn get(&self) -> f64 {
        self.samples.back().copied().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

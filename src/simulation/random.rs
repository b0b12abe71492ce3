//! Uniform random draws for the spawn policy

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// A source of uniform draws in `[0, 1)`
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

/// Seeded pseudo-random draws for reproducible simulations
#[derive(Debug, Clone)]
pub struct SeededUniform {
    rng: StdRng,
}

impl SeededUniform {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl UniformSource for SeededUniform {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
    draws: Vec<f64>,
    next: usize,
}

impl ScriptedDraws {
    /// An empty list always yields 0.0
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, next: 0 }
    }

    /// Number of draws consumed so far
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl UniformSource for ScriptedDraws {
    fn next_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.next % self.draws.len()];
        self.next += 1;
        value
    }
}

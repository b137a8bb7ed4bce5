//! Uniform random sources
//!
//! Every lottery in the engine consumes exactly one `next_unit()` draw, so a
//! run is reproduced bit-for-bit by replaying the same source.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// A stream of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Seedable ChaCha8 source, the default for every run.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: ChaCha8Rng,
}

impl SeededSource {
    /// Create a source with optional seed; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self { rng }
    }

    /// Deterministic source from a fixed seed
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Same seed, independent stream. Parallel runs sharing a sweep seed
    /// each take their own stream so no two runs consume the same draws.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }
}

impl RandomSource for SeededSource {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Source that always returns the same value. Used to pin lottery outcomes.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSource(pub f64);

impl RandomSource for ConstantSource {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Source that replays a fixed script of draws, then repeats the fallback
/// value once the script is exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    cursor: usize,
    fallback: f64,
}

impl ScriptedSource {
    pub fn new(draws: impl Into<Vec<f64>>, fallback: f64) -> Self {
        Self {
            draws: draws.into(),
            cursor: 0,
            fallback,
        }
    }

    /// Number of draws consumed so far (including fallback draws)
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        let value = self.draws.get(self.cursor).copied().unwrap_or(self.fallback);
        self.cursor += 1;
        value
    }
}

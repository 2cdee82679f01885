use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Injectable randomness for the run: User-Agent pool choice, viewport
/// jitter, per-attempt session tokens. Routed through a trait so the
/// synthesizer and retry tests run deterministically.
pub trait Randomness {
    /// Uniform index in `0..upper`. `upper` must be non-zero.
    fn pick(&mut self, upper: usize) -> usize;
    /// Uniform value in `0..=max`.
    fn jitter(&mut self, max: u32) -> u32;
    /// Fresh opaque token, never reused across attempts.
    fn session_token(&mut self) -> String;
}

const TOKEN_LEN: usize = 20;

pub struct SystemRandomness;

impl Randomness for SystemRandomness {
    fn pick(&mut self, upper: usize) -> usize {
        rand::thread_rng().gen_range(0..upper)
    }

    fn jitter(&mut self, max: u32) -> u32 {
        rand::thread_rng().gen_range(0..=max)
    }

    fn session_token(&mut self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect()
    }
}

/// Deterministic strategy for tests and reproducible runs.
pub struct SeededRandomness {
    rng: StdRng,
}

impl SeededRandomness {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Randomness for SeededRandomness {
    fn pick(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    fn jitter(&mut self, max: u32) -> u32 {
        self.rng.gen_range(0..=max)
    }

    fn session_token(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect()
    }
}

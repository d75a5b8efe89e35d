//! Deterministic simulation-level RNG.
//!
//! Used for exogenous grid events (random obstacle churn).  The same seed
//! always produces the same sequence of toggled cells, so a churned run is
//! reproducible as long as the command stream is.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded RNG for global, single-threaded simulation events.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}

use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::sleep;

/// Randomness source for everything that is meant to look human: jitter,
/// scroll targets and fingerprint choices.
///
/// Seeded instances are fully deterministic.
#[derive(Debug, Clone)]
pub struct Entropy {
    rng: StdRng,
}

impl Entropy {
    /// Seeded when `seed` is `Some`, OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self {
                rng: StdRng::from_rng(OsRng).unwrap_or_else(|_| StdRng::seed_from_u64(0)),
            },
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform delay in `min..=max` milliseconds.
    pub fn delay(&mut self, min_ms: u64, max_ms: u64) -> Duration {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Duration::from_millis(self.rng.gen_range(lo..=hi))
    }

    /// Uniform value in `0.0..=1.0`.
    pub fn fraction(&mut self) -> f64 {
        self.rng.gen_range(0.0..=1.0)
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }
}

#[derive(Debug, Clone, Default)]
/// Produces human-like pauses and page engagement.
pub struct BehavioralEngine {}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, entropy: &mut Entropy, min: u64, max: u64) -> Duration {
        let wait = entropy.delay(min, max);
        sleep(wait).await;
        wait
    }

    /// Script scrolling the window to `arguments[0]` × document height.
    pub fn scroll_script() -> &'static str {
        r#"
            const h = Math.max(
                document.body ? document.body.scrollHeight : 0,
                document.documentElement ? document.documentElement.scrollHeight : 0
            );
            window.scrollTo(0, Math.floor(h * arguments[0]));
            return window.scrollY;
        "#
    }
}

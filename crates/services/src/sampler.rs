use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// The single random source behind session selection and choice shuffling.
///
/// Seedable so tests can inject a deterministic source and assert the exact
/// selection order.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Sampler seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic sampler for tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `count` distinct indices below `len` in randomized order
    /// (no-replacement draw). Capped at `len`.
    pub fn draw(&mut self, len: usize, count: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, count.min(len)).into_vec()
    }

    /// One uniform index below `len`, or `None` for an empty range.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.random_range(0..len))
        }
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_is_without_replacement_and_capped() {
        let mut sampler = Sampler::seeded(7);
        let drawn = sampler.draw(3, 10);
        assert_eq!(drawn.len(), 3);
        let mut sorted = drawn.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 3);
    }

    #[test]
    fn seeded_samplers_repeat_their_sequence() {
        let mut a = Sampler::seeded(42);
        let mut b = Sampler::seeded(42);
        assert_eq!(a.draw(10, 5), b.draw(10, 5));
        assert_eq!(a.pick(10), b.pick(10));
    }

    #[test]
    fn pick_on_empty_range_is_none() {
        assert_eq!(Sampler::seeded(1).pick(0), None);
    }
}

use rand::Rng;

use crate::hasher::KeyHasher;

/// Number of precomputed powers of the conflict decay factor.
pub(crate) const DECAY_TABLE_LEN: usize = 1 << 8;

/// Lookup of `decay^i`, the chance that a colliding increment knocks one
/// unit off a bucket currently holding `i`.
pub(crate) struct DecayTable {
    probabilities: Box<[f64]>,
}

impl DecayTable {
    pub(crate) fn new(decay: f64) -> Self {
        Self::with_len(decay, DECAY_TABLE_LEN)
    }

    pub(crate) fn with_len(decay: f64, len: usize) -> Self {
        assert!(len > 0, "DecayTable: length must be non-zero");
        let probabilities = (0..len).map(|i| decay.powi(i as i32)).collect();
        Self { probabilities }
    }

    /// Probability for `count`, clamped to the last entry for large counts.
    #[inline]
    pub(crate) fn probability(&self, count: u32) -> f64 {
        let last = self.probabilities.len() - 1;
        self.probabilities[(count as usize).min(last)]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Bucket {
    fingerprint: u32,
    count: u32,
}

/// The HeavyKeeper bucket matrix: `depth` rows of `width` fingerprinted
/// counters, stored row-major in one allocation.
pub(crate) struct FrequencySketch<H> {
    width: usize,
    depth: usize,
    buckets: Vec<Bucket>,
    decay: DecayTable,
    hasher: H,
}

impl<H: KeyHasher> FrequencySketch<H> {
    pub(crate) fn new(width: usize, depth: usize, conflict_decay: f64, hasher: H) -> Self {
        Self {
            width,
            depth,
            buckets: vec![Bucket::default(); width * depth],
            decay: DecayTable::new(conflict_decay),
            hasher,
        }
    }

    #[inline]
    fn slot(&self, row: usize, key: &[u8]) -> usize {
        let column = self.hasher.bucket(row as u32, key) as usize % self.width;
        row * self.width + column
    }

    /// Records `weight` occurrences of `key` and returns its new estimate,
    /// the largest count among the buckets it owns after the update.
    ///
    /// Each row resolves collisions on its own, drawing from `rng` once per
    /// unit of weight. A row whose bucket stays with another key adds
    /// nothing to the estimate.
    pub(crate) fn add<R>(&mut self, key: &[u8], weight: u32, rng: &mut R) -> u32
    where
        R: Rng + ?Sized,
    {
        let fingerprint = self.hasher.fingerprint(key);
        let mut estimate = 0;

        for row in 0..self.depth {
            let slot = self.slot(row, key);
            let bucket = &mut self.buckets[slot];

            if bucket.count == 0 {
                bucket.fingerprint = fingerprint;
                bucket.count = weight;
                estimate = estimate.max(weight);
            } else if bucket.fingerprint == fingerprint {
                bucket.count = bucket.count.saturating_add(weight);
                estimate = estimate.max(bucket.count);
            } else {
                for remaining in (1..=weight).rev() {
                    if rng.random::<f64>() < self.decay.probability(bucket.count) {
                        bucket.count -= 1;
                        if bucket.count == 0 {
                            bucket.fingerprint = fingerprint;
                            bucket.count = remaining;
                            estimate = estimate.max(remaining);
                            break;
                        }
                    }
                }
            }
        }

        estimate
    }

    /// Current estimate for `key` without touching any bucket.
    pub(crate) fn estimate(&self, key: &[u8]) -> u32 {
        let fingerprint = self.hasher.fingerprint(key);
        (0..self.depth)
            .map(|row| self.buckets[self.slot(row, key)])
            .filter(|bucket| bucket.count > 0 && bucket.fingerprint == fingerprint)
            .map(|bucket| bucket.count)
            .max()
            .unwrap_or(0)
    }

    /// Divides every bucket count by `factor`. Buckets that reach zero are free again.
    pub(crate) fn fade(&mut self, factor: u32) {
        for bucket in self.buckets.iter_mut() {
            bucket.count /= factor;
        }
    }
}

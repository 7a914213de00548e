use std::hash::BuildHasher;

use ahash::RandomState;

/// The 32-bit hashes the sketch needs for a key.
///
/// Implementations must be deterministic for the lifetime of the engine:
/// the same key always maps to the same fingerprint and, per row seed, to
/// the same bucket.
#[cfg_attr(test, mockall::automock)]
pub trait KeyHasher: Send + Sync {
    /// Digest stored in a bucket to recognise its owner.
    fn fingerprint(&self, key: &[u8]) -> u32;

    /// Hash selecting the bucket in the row identified by `seed`.
    fn bucket(&self, seed: u32, key: &[u8]) -> u32;
}

// `RandomState::with_seeds` XORs its arguments with aHash's built-in keys,
// so neither set may equal those keys or every hash collapses to zero.
const FINGERPRINT_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

const BUCKET_SEEDS: [u64; 4] = [
    0x9e37_79b9_7f4a_7c15,
    0xbf58_476d_1ce4_e5b9,
    0x94d0_49bb_1331_11eb,
    0x2545_f491_4f6c_dd1d,
];

/// Default [`KeyHasher`] backed by aHash with fixed seeds.
#[derive(Clone)]
pub struct AHashKeyHasher {
    fingerprint: RandomState,
    bucket: RandomState,
}

impl AHashKeyHasher {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Hasher whose outputs are perturbed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let [a, b, c, d] = FINGERPRINT_SEEDS;
        let [e, f, g, h] = BUCKET_SEEDS;
        Self {
            fingerprint: RandomState::with_seeds(a ^ seed, b, c, d),
            bucket: RandomState::with_seeds(e ^ seed, f, g, h),
        }
    }
}

impl Default for AHashKeyHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyHasher for AHashKeyHasher {
    #[inline]
    fn fingerprint(&self, key: &[u8]) -> u32 {
        fold(BuildHasher::hash_one(&self.fingerprint, key))
    }

    #[inline]
    fn bucket(&self, seed: u32, key: &[u8]) -> u32 {
        fold(BuildHasher::hash_one(&self.bucket, (seed, key)))
    }
}

#[inline]
fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

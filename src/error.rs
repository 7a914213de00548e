use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors reported when building a [`HeavyKeeper`](crate::HeavyKeeper).
///
/// Everything here is raised once, at construction. Misuse of the heap
/// internals (popping an empty heap, fixing a stale index) is a programming
/// fault and panics instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("k must be greater than zero")]
    ZeroCapacity,

    #[error("sketch width must be greater than zero")]
    ZeroWidth,

    #[error("sketch depth must be greater than zero")]
    ZeroDepth,

    #[error("conflict decay factor must lie strictly between 0 and 1, got {0}")]
    ConflictDecayOutOfRange(f64),

    #[error("fading factor must be greater than 1, got {0}")]
    FadingFactorTooSmall(u32),

    #[error("fading interval must be non-zero, got {0:?}")]
    ZeroFadingInterval(Duration),

    #[error("expelled channel capacity must be greater than zero")]
    ZeroExpelledCapacity,

    #[error("failed to spawn fading thread")]
    SpawnFading(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

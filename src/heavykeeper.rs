use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fading::FadingJob;
use crate::hasher::{AHashKeyHasher, KeyHasher};
use crate::priority_queue::{Node, TopKHeap};
use crate::sketch::FrequencySketch;

/// The operations of a top-k tracker.
pub trait TopK {
    /// Records `weight` occurrences of `key`.
    ///
    /// Returns the key pushed out of the top-k set, if any, and whether
    /// `key` was admitted to (or updated in) the set.
    fn add(&self, key: &str, weight: u32) -> (Option<String>, bool);

    /// The current top-k set, highest count first, ties by key.
    fn list(&self) -> Vec<Node>;

    /// Sum of all weights recorded, scaled down by each fading sweep.
    fn total(&self) -> u64;

    /// Stream of nodes evicted from the top-k set. Best effort: when the
    /// buffer is full, notifications are dropped.
    fn expelled(&self) -> Receiver<Node>;

    /// Turns periodic fading on or off.
    fn set_fading(&self, enabled: bool);
}

/// Everything guarded by the engine lock. The RNG lives here because
/// conflict draws must be serialized with bucket updates.
struct State<H> {
    sketch: FrequencySketch<H>,
    heap: TopKHeap,
    total: u64,
    rng: SmallRng,
}

struct Shared<H> {
    state: RwLock<State<H>>,
    min_count: u32,
    fading_factor: u32,
    fading_enabled: AtomicBool,
    // set before the job is joined, so toggles never wait on the job
    fading_stopped: AtomicBool,
    expelled_tx: Sender<Node>,
    expelled_rx: Receiver<Node>,
}

impl<H: KeyHasher> Shared<H> {
    /// Scales every counter down in one critical section.
    fn fade(&self) {
        let factor = self.fading_factor;
        let mut state = self.state.write();
        let State {
            sketch,
            heap,
            total,
            ..
        } = &mut *state;

        let before = *total;
        sketch.fade(factor);
        *total /= u64::from(factor);
        heap.fade(factor);

        debug!(factor, before, after = *total, "fading sweep");
    }

    fn expel(&self, node: Node) {
        match self.expelled_tx.try_send(node) {
            Ok(()) => {}
            Err(TrySendError::Full(node)) => {
                trace!(key = %node.key, count = node.count, "expelled channel full, dropping");
            }
            // we hold a receiver, so the channel cannot disconnect
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// HeavyKeeper top-k tracker, safe to share between threads.
///
/// Every mutation of the sketch, the heap and the running total happens
/// under one write lock; readers share a read lock. A background job owned
/// by the engine runs fading sweeps while fading is enabled, and is stopped
/// when the engine is dropped.
///
/// ```
/// use heavytop::{Config, HeavyKeeper};
///
/// let topk = HeavyKeeper::new(Config::new(2, 1000, 4, 0.9)).unwrap();
/// topk.add("hello", 3);
/// topk.add("world", 1);
///
/// let top = topk.list();
/// assert_eq!(top[0].key, "hello");
/// assert_eq!(topk.total(), 4);
/// ```
pub struct HeavyKeeper<H = AHashKeyHasher> {
    config: Config,
    shared: Arc<Shared<H>>,
    fading: Mutex<FadingJob>,
}

impl HeavyKeeper<AHashKeyHasher> {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_hasher(config, AHashKeyHasher::new())
    }
}

impl<H: KeyHasher + 'static> HeavyKeeper<H> {
    /// Builds an engine hashing keys with `hasher`.
    pub fn with_hasher(config: Config, hasher: H) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let (expelled_tx, expelled_rx) = bounded(config.expelled_capacity);

        let shared = Arc::new(Shared {
            state: RwLock::new(State {
                sketch: FrequencySketch::new(
                    config.width,
                    config.depth,
                    config.conflict_decay,
                    hasher,
                ),
                heap: TopKHeap::new(config.k),
                total: 0,
                rng,
            }),
            min_count: config.min_count,
            fading_factor: config.fading_factor,
            fading_enabled: AtomicBool::new(config.fading_enabled),
            fading_stopped: AtomicBool::new(false),
            expelled_tx,
            expelled_rx,
        });

        let sweeper = Arc::clone(&shared);
        let fading = FadingJob::spawn(config.fading_interval, move || {
            if sweeper.fading_enabled.load(Ordering::Acquire) {
                sweeper.fade();
            }
        })
        .map_err(Error::SpawnFading)?;

        debug!(
            k = config.k,
            width = config.width,
            depth = config.depth,
            min_count = config.min_count,
            fading_enabled = config.fading_enabled,
            fading_factor = config.fading_factor,
            fading_interval = ?config.fading_interval,
            "heavykeeper created"
        );

        Ok(Self {
            config,
            shared,
            fading: Mutex::new(fading),
        })
    }

    /// Records `weight` occurrences of `key`.
    ///
    /// The sketch is always updated. The key then enters the top-k set only
    /// if its estimate reaches `min_count` and, when the set is full, is
    /// strictly greater than the current minimum. A key already in the set
    /// has its count refreshed. Returns the evicted key, if any, and whether
    /// the key was accepted. A zero weight records nothing.
    pub fn add(&self, key: &str, weight: u32) -> (Option<String>, bool) {
        if weight == 0 {
            return (None, false);
        }

        let mut state = self.shared.state.write();
        let State {
            sketch,
            heap,
            total,
            rng,
        } = &mut *state;

        let estimate = sketch.add(key.as_bytes(), weight, rng);
        *total += u64::from(weight);

        if estimate < self.shared.min_count {
            return (None, false);
        }
        if heap.is_full() && estimate <= heap.min_count() {
            return (None, false);
        }
        if let Some(index) = heap.find(key) {
            heap.fix(index, |node| node.count = estimate);
            return (None, true);
        }

        match heap.add(Node::new(key, estimate)) {
            Some(expelled) => {
                let expelled_key = expelled.key.clone();
                self.shared.expel(expelled);
                (Some(expelled_key), true)
            }
            None => (None, true),
        }
    }

    /// The top-k set ordered by count descending, ties by key ascending.
    pub fn list(&self) -> Vec<Node> {
        self.shared.state.read().heap.sorted()
    }

    pub fn total(&self) -> u64 {
        self.shared.state.read().total
    }

    /// Whether `key` is currently in the top-k set.
    pub fn query(&self, key: &str) -> bool {
        self.shared.state.read().heap.find(key).is_some()
    }

    /// Count recorded for `key` in the top-k set.
    pub fn count(&self, key: &str) -> Option<u32> {
        let state = self.shared.state.read();
        state
            .heap
            .find(key)
            .and_then(|index| state.heap.get(index))
            .map(|node| node.count)
    }

    /// Sketch estimate for `key`, whether or not it is in the top-k set.
    pub fn estimate(&self, key: &str) -> u32 {
        self.shared.state.read().sketch.estimate(key.as_bytes())
    }

    /// Number of keys in the top-k set.
    pub fn len(&self) -> usize {
        self.shared.state.read().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.read().heap.is_empty()
    }

    pub fn expelled(&self) -> Receiver<Node> {
        self.shared.expelled_rx.clone()
    }

    /// Turns periodic fading on or off. Fading can be re-enabled any number
    /// of times until [`stop_fading`](Self::stop_fading) is called.
    ///
    /// Never blocks: it only touches atomic flags.
    pub fn set_fading(&self, enabled: bool) {
        if enabled && self.is_fading_stopped() {
            warn!("fading enabled after the fading job was stopped; no sweeps will run");
        }
        self.shared.fading_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_fading_enabled(&self) -> bool {
        self.shared.fading_enabled.load(Ordering::Acquire)
    }

    /// Runs one fading sweep now, whether or not periodic fading is enabled.
    pub fn fade(&self) {
        self.shared.fade();
    }

    /// Stops the fading job for good and waits for a running sweep to end.
    pub fn stop_fading(&self) {
        self.shared.fading_stopped.store(true, Ordering::Release);
        self.fading.lock().stop();
    }

    pub fn is_fading_stopped(&self) -> bool {
        self.shared.fading_stopped.load(Ordering::Acquire)
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn depth(&self) -> usize {
        self.config.depth
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<H: KeyHasher + 'static> TopK for HeavyKeeper<H> {
    fn add(&self, key: &str, weight: u32) -> (Option<String>, bool) {
        HeavyKeeper::add(self, key, weight)
    }

    fn list(&self) -> Vec<Node> {
        HeavyKeeper::list(self)
    }

    fn total(&self) -> u64 {
        HeavyKeeper::total(self)
    }

    fn expelled(&self) -> Receiver<Node> {
        HeavyKeeper::expelled(self)
    }

    fn set_fading(&self, enabled: bool) {
        HeavyKeeper::set_fading(self, enabled)
    }
}

//! HeavyKeeper is for finding Top-K elephant flows with high precision and low memory footprint
//!
//! This implementation is based on the paper HeavyKeeper: An Accurate Algorithm for Finding Top-k Elephant Flows
//! by Junzhi Gong, Tong Yang, Haowei Zhang, and Hao Li, Peking University; Steve Uhlig, Queen Mary, University of London;
//! Shigang Chen, University of Florida; Lorna Uden, Staffordshire University; Xiaoming Li, Peking University
//!
//! On top of the paper's count-with-exponential-decay sketch, the tracker is safe to share
//! between threads, accepts weighted updates, reports keys evicted from the top-k set, and
//! can periodically fade all counters so the estimates favour recent traffic.

mod config;
mod error;
mod fading;
mod hasher;
mod heavykeeper;
mod priority_queue;
mod sketch;

pub use config::Config;
pub use error::{Error, Result};
pub use hasher::{AHashKeyHasher, KeyHasher};
pub use heavykeeper::{HeavyKeeper, TopK};
pub use priority_queue::Node;

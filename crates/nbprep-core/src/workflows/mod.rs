//! # Workflows Module
//!
//! Batch entry points that run the engine over whole datasets.
//!
//! ## Overview
//!
//! Each workflow takes an in-memory dataset, drives one engine operation over every record
//! (in parallel when the `parallel` feature is enabled) and reports progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter).
//!
//! ## Architecture
//!
//! - **Downsampling Workflow** ([`downsample`]) - Seeded, thread-count independent removal of
//!   side chains across a dataset
//! - **Reconstruction Workflow** ([`reconstruct`]) - Per-record chi-angle reconstruction where
//!   one record's failure never aborts the batch
//! - **Check Workflow** ([`check`]) - Invariant checks, removed-proportion estimate, timing and
//!   optional reconstruction accuracy

pub mod check;
pub mod downsample;
pub mod reconstruct;

use rand::SeedableRng;
use rand::rngs::StdRng;

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// The generator for record `index` of a batch seeded with `seed`.
///
/// Depends only on `(seed, index)`, so results do not change with the number of worker threads
/// or the order in which records are scheduled.
pub fn record_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (index as u64).wrapping_add(1).wrapping_mul(SEED_STRIDE))
}

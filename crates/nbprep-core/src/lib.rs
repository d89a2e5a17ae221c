//! # NBPREP Core Library
//!
//! Preparation of fixed-capacity atomic neighborhoods for statistical and learning pipelines.
//! A neighborhood holds every atom surrounding one central amino-acid residue; this library
//! removes side chains from it stochastically and rebuilds a removed side chain from chi angles.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`NeighborhoodRecord`), pure geometry,
//!   the reconstruction parameter tables and dataset I/O.
//!
//! - **[`engine`]: The Logic Core.** The mask oracle contract and its group-consistent
//!   implementation, the downsampler with its fixed-capacity repacking, and the sequential
//!   chi-angle reconstructor.
//!
//! - **[`workflows`]: The Public API.** Batch drivers that run the engine over whole datasets
//!   in parallel with reproducible randomness, and the sanity checks used to validate a
//!   downsampled dataset.

pub mod core;
pub mod engine;
pub mod workflows;

//! # Engine Module
//!
//! The two core operations on neighborhood records and the contracts they depend on.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Record capacity, site bound and backbone atom names
//! - **Mask Oracle** ([`mask`]) - The keep-mask contract and its group-consistent implementation
//! - **Downsampling** ([`downsample`]) - Gathering kept atoms and repacking to a fixed capacity
//! - **Reconstruction** ([`reconstruct`]) - Sequential placement of CB and chi-dependent atoms
//! - **Chi Measurement** ([`chi`]) - Observed chi angles of a residue present in a record
//! - **Progress Monitoring** ([`progress`]) - Callbacks for batch drivers
//! - **Error Handling** ([`error`]) - The aggregate engine error
//!
//! Both operations are pure functions of their inputs. Downsampling additionally consumes an
//! explicit random number generator, one draw per residue group, so results are reproducible
//! from a seed.

pub mod chi;
pub mod config;
pub mod downsample;
pub mod error;
pub mod mask;
pub mod progress;
pub mod reconstruct;

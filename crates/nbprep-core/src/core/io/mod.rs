//! Dataset and chi-angle table I/O.
//!
//! Neighborhood datasets are JSON arrays of [`NeighborhoodRecord`](crate::core::models::neighborhood::NeighborhoodRecord)
//! objects; chi angles for reconstruction come from CSV tables indexed by record position.

pub mod chi_angles;
pub mod dataset;

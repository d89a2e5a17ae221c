//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Neighborhood Representation** ([`models`]) - Fixed-capacity neighborhood records and residue identifiers
//! - **Geometry** ([`utils`]) - Plane normals, internal-coordinate placement and measurement helpers
//! - **Reconstruction Parameters** ([`params`]) - Bond lengths, angles and chi atom tables per amino acid
//! - **Dataset I/O** ([`io`]) - JSON neighborhood datasets and CSV chi-angle tables

pub mod io;
pub mod models;
pub mod params;
pub mod utils;

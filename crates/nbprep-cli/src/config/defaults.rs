use nbprep::core::models::neighborhood::DEFAULT_CAPACITY;
use nbprep::engine::config::{DEFAULT_BACKBONE_ATOMS, DEFAULT_MAX_SITES};

pub struct DefaultsConfig {
    pub capacity: usize,
    pub max_sites: usize,
    pub backbone_atoms: Vec<String>,
    pub removal_probability: f64,
    pub seed: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_sites: DEFAULT_MAX_SITES,
            backbone_atoms: DEFAULT_BACKBONE_ATOMS.iter().map(|s| s.to_string()).collect(),
            removal_probability: 0.5,
            seed: 0,
        }
    }
}

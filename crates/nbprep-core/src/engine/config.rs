use crate::core::models::neighborhood::DEFAULT_CAPACITY;
use thiserror::Error;

/// Default bound on residue sites per structure.
pub const DEFAULT_MAX_SITES: usize = 10_000;

/// The four canonical backbone atoms, exempt from removal.
pub const DEFAULT_BACKBONE_ATOMS: [&str; 4] = ["N", "CA", "C", "O"];

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownsampleConfig {
    /// Number of atom slots in every produced record.
    pub capacity: usize,
    /// Upper bound on distinct residue sites per structure; sizes the group bookkeeping.
    pub max_sites: usize,
    /// Atom names that are never removed. Compared after trimming fixed-width padding.
    pub backbone_atoms: Vec<String>,
}

impl Default for DownsampleConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_sites: DEFAULT_MAX_SITES,
            backbone_atoms: DEFAULT_BACKBONE_ATOMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DownsampleConfig {
    pub fn is_backbone(&self, atom_name: &str) -> bool {
        let name = atom_name.trim();
        self.backbone_atoms.iter().any(|bb| bb.trim() == name)
    }
}

#[derive(Default)]
pub struct DownsampleConfigBuilder {
    capacity: Option<usize>,
    max_sites: Option<usize>,
    backbone_atoms: Option<Vec<String>>,
}

impl DownsampleConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
    pub fn max_sites(mut self, max_sites: usize) -> Self {
        self.max_sites = Some(max_sites);
        self
    }
    pub fn backbone_atoms(mut self, names: Vec<String>) -> Self {
        self.backbone_atoms = Some(names);
        self
    }

    pub fn build(self) -> Result<DownsampleConfig, ConfigError> {
        let capacity = self
            .capacity
            .ok_or(ConfigError::MissingParameter("capacity"))?;
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "capacity",
                reason: "must be at least 1".to_string(),
            });
        }

        let max_sites = self.max_sites.unwrap_or(DEFAULT_MAX_SITES);
        if max_sites == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_sites",
                reason: "must be at least 1".to_string(),
            });
        }

        let backbone_atoms: Vec<String> = self
            .backbone_atoms
            .unwrap_or_else(|| DEFAULT_BACKBONE_ATOMS.iter().map(|s| s.to_string()).collect())
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect();
        if backbone_atoms.iter().any(|name| name.is_empty()) {
            return Err(ConfigError::InvalidValue {
                parameter: "backbone_atoms",
                reason: "atom names must not be empty".to_string(),
            });
        }

        Ok(DownsampleConfig {
            capacity,
            max_sites,
            backbone_atoms,
        })
    }
}

/// Validates a removal probability.
pub fn check_probability(p: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(ConfigError::InvalidValue {
            parameter: "removal_probability",
            reason: format!("{} is outside [0, 1]", p),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_capacity() {
        let result = DownsampleConfigBuilder::new().build();
        assert_eq!(result, Err(ConfigError::MissingParameter("capacity")));
    }

    #[test]
    fn builder_applies_defaults() {
        let config = DownsampleConfigBuilder::new().capacity(500).build().unwrap();
        assert_eq!(config.capacity, 500);
        assert_eq!(config.max_sites, DEFAULT_MAX_SITES);
        assert_eq!(config.backbone_atoms, vec!["N", "CA", "C", "O"]);
    }

    #[test]
    fn builder_trims_backbone_names() {
        let config = DownsampleConfigBuilder::new()
            .capacity(10)
            .backbone_atoms(vec![" N  ".to_string(), " CA ".to_string()])
            .build()
            .unwrap();
        assert_eq!(config.backbone_atoms, vec!["N", "CA"]);
        assert!(config.is_backbone(" CA "));
        assert!(!config.is_backbone(" C  "));
    }

    #[test]
    fn builder_rejects_zero_capacity_and_blank_names() {
        assert!(matches!(
            DownsampleConfigBuilder::new().capacity(0).build(),
            Err(ConfigError::InvalidValue {
                parameter: "capacity",
                ..
            })
        ));
        assert!(matches!(
            DownsampleConfigBuilder::new()
                .capacity(10)
                .backbone_atoms(vec!["  ".to_string()])
                .build(),
            Err(ConfigError::InvalidValue {
                parameter: "backbone_atoms",
                ..
            })
        ));
    }

    #[test]
    fn default_matches_builder_defaults() {
        let built = DownsampleConfigBuilder::new()
            .capacity(DEFAULT_CAPACITY)
            .build()
            .unwrap();
        assert_eq!(built, DownsampleConfig::default());
    }

    #[test]
    fn probability_bounds_are_inclusive() {
        assert_eq!(check_probability(0.0), Ok(0.0));
        assert_eq!(check_probability(1.0), Ok(1.0));
        assert!(check_probability(1.01).is_err());
        assert!(check_probability(-0.1).is_err());
        assert!(check_probability(f64::NAN).is_err());
    }
}

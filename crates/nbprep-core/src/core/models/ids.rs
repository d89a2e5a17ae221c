use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Residue site '{0}' is not an integer")]
    InvalidSite(String),
}

/// Identifies which residue an atom belongs to, as stored in a neighborhood record.
///
/// The six fields mirror the fixed-width residue tuple of the neighborhood datasets:
/// one-letter residue code, source structure, chain, sequence site, insertion code and
/// secondary-structure code. An id with every field empty marks an unused slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidueId {
    pub residue_name: String,
    pub structure: String,
    pub chain: String,
    pub site: String,
    pub insertion_code: String,
    pub secondary_structure: String,
}

impl ResidueId {
    pub fn new(residue_name: &str, structure: &str, chain: &str, site: &str) -> Self {
        Self {
            residue_name: residue_name.to_string(),
            structure: structure.to_string(),
            chain: chain.to_string(),
            site: site.to_string(),
            insertion_code: String::new(),
            secondary_structure: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.residue_name.is_empty()
            && self.structure.is_empty()
            && self.chain.is_empty()
            && self.site.is_empty()
            && self.insertion_code.is_empty()
            && self.secondary_structure.is_empty()
    }

    /// Derives the `(chain, site)` grouping key. The site is parsed as a signed integer.
    pub fn key(&self) -> Result<ResidueKey, KeyError> {
        let site = self
            .site
            .trim()
            .parse::<i64>()
            .map_err(|_| KeyError::InvalidSite(self.site.clone()))?;
        Ok(ResidueKey {
            chain: self.chain.trim().to_string(),
            site,
        })
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{}{}",
            self.chain.trim(),
            self.residue_name.trim(),
            self.site.trim(),
            self.insertion_code.trim()
        )
    }
}

/// The `(chain, site)` pair that groups atoms into one residue's side chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub chain: String,
    pub site: i64,
}

impl ResidueKey {
    /// Chain identifiers are stored without fixed-width padding, as in [`ResidueId::key`].
    pub fn new(chain: &str, site: i64) -> Self {
        Self {
            chain: chain.trim().to_string(),
            site,
        }
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.chain, self.site)
    }
}

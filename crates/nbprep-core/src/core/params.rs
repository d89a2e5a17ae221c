use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Residues whose side chains have no chi degrees of freedom.
pub const RIGID_RESIDUES: [&str; 2] = ["ALA", "GLY"];

/// Highest chi index any standard residue carries.
pub const MAX_CHI: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaCarbonParams {
    /// CA-CB bond length in Angstroms.
    pub bond_length: f64,
    /// Bond angle at CA used to place CB, in degrees.
    pub bond_angle: f64,
    /// N-C-CA-CB dihedral in degrees.
    pub dihedral: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiGeometry {
    pub bond_length: f64,
    pub bond_angle: f64,
}

/// Ideal geometry used to rebuild a side chain from its chi angles.
///
/// The field layout follows the reconstruction parameter document: per-residue beta-carbon
/// geometry, per-(residue, chi) ideal bond lengths and angles keyed `"{AA}{chi - 1}"`, the
/// one-letter to three-letter code table, and for every chi the four atom names that define
/// it keyed `"chi{n}" -> AA`. Loaded once and only read afterwards.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReconstructionParams {
    #[serde(rename = "CA_CB_dict")]
    pub ca_cb_lengths: HashMap<String, f64>,
    #[serde(rename = "N_C_CA_dict")]
    pub n_c_ca_angles: HashMap<String, f64>,
    #[serde(rename = "N_C_CA_CB_dict")]
    pub n_c_ca_cb_dihedrals: HashMap<String, f64>,
    pub ideal_bond_lengths: HashMap<String, f64>,
    pub ideal_bond_angles: HashMap<String, f64>,
    pub aa_symbols: HashMap<String, String>,
    pub chi_atoms: HashMap<String, HashMap<String, [String; 4]>>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: Box<toml::de::Error>,
    },
    #[error("Residue '{residue}' has chi atoms but no entry in table '{table}'")]
    Incomplete { residue: String, table: String },
}

impl ReconstructionParams {
    /// Loads a parameter document. Files ending in `.toml` are parsed as TOML, anything else
    /// as JSON.
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let params: Self = if is_toml {
            toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: Box::new(e),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ParamLoadError::Json {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?
        };

        params.validate()?;
        Ok(params)
    }

    /// Checks that every residue with chi atoms also has the geometry needed to place them.
    pub fn validate(&self) -> Result<(), ParamLoadError> {
        for chi in 1..=MAX_CHI {
            let Some(by_residue) = self.chi_atoms.get(&chi_key(chi)) else {
                continue;
            };
            for residue in by_residue.keys() {
                if self.beta_carbon(residue).is_none() {
                    return Err(ParamLoadError::Incomplete {
                        residue: residue.clone(),
                        table: "CA_CB_dict/N_C_CA_dict/N_C_CA_CB_dict".to_string(),
                    });
                }
                if self.chi_geometry(residue, chi).is_none() {
                    return Err(ParamLoadError::Incomplete {
                        residue: residue.clone(),
                        table: format!(
                            "ideal_bond_lengths/ideal_bond_angles[{}]",
                            geometry_key(residue, chi)
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Three-letter residue name for a one-letter code.
    pub fn residue_name(&self, code: &str) -> Option<&str> {
        self.aa_symbols.get(code.trim()).map(String::as_str)
    }

    pub fn has_side_chain_freedom(&self, residue: &str) -> bool {
        !RIGID_RESIDUES.contains(&residue)
    }

    pub fn beta_carbon(&self, residue: &str) -> Option<BetaCarbonParams> {
        Some(BetaCarbonParams {
            bond_length: *self.ca_cb_lengths.get(residue)?,
            bond_angle: *self.n_c_ca_angles.get(residue)?,
            dihedral: *self.n_c_ca_cb_dihedrals.get(residue)?,
        })
    }

    /// The `(a1, a2, a3, a4)` atom names defining chi `chi` (1-based) of `residue`.
    pub fn chi_atoms(&self, residue: &str, chi: usize) -> Option<&[String; 4]> {
        self.chi_atoms.get(&chi_key(chi))?.get(residue)
    }

    pub fn chi_geometry(&self, residue: &str, chi: usize) -> Option<ChiGeometry> {
        let key = geometry_key(residue, chi);
        Some(ChiGeometry {
            bond_length: *self.ideal_bond_lengths.get(&key)?,
            bond_angle: *self.ideal_bond_angles.get(&key)?,
        })
    }
}

fn chi_key(chi: usize) -> String {
    format!("chi{}", chi)
}

fn geometry_key(residue: &str, chi: usize) -> String {
    format!("{}{}", residue, chi.saturating_sub(1))
}

use crate::core::models::ids::ResidueId;
use crate::core::models::neighborhood::NeighborhoodRecord;
use crate::core::params::{MAX_CHI, ReconstructionParams};
use crate::core::utils::geometry::{GeometryError, place_atom, plane_normal};
use nalgebra::Point3;
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Expected upper bound on atoms per residue, hydrogens included.
pub const WORKING_SET_CAPACITY: usize = 32;

/// Where in the placement sequence a reconstruction currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    BackboneCheck,
    BetaCarbonPlaced,
    Chi(usize),
    Done,
}

/// Which atoms must already be known before a chi-dependent atom is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChiPrecondition {
    /// `a1`, `a2` and `a3` must be known; `a4` is built. A missing anchor ends the sequence,
    /// because every later chi hangs off the atom this one would have produced.
    #[default]
    AnchorsPresent,
    /// Additionally `a4` must have been observed in the neighborhood; chis whose atoms were not
    /// observed are skipped and the sequence continues. Rebuilds only atoms that have a ground
    /// truth, which is what evaluation against observed side chains needs.
    TargetObserved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    UnknownResidue { code: String },
    NoSideChainFreedom { residue: String },
    MissingBackbone { atom: &'static str },
}

#[derive(Debug, Error)]
pub enum ReconstructionError {
    #[error("Degenerate geometry at stage {stage:?}: {source}")]
    Geometry {
        stage: Stage,
        source: GeometryError,
    },
    #[error("No '{table}' parameters for residue {residue}")]
    MissingParameter {
        residue: String,
        table: &'static str,
    },
}

/// Small ordered name -> position table for the atoms of one residue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedPositions {
    entries: Vec<(String, Point3<f64>)>,
}

impl NamedPositions {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(WORKING_SET_CAPACITY),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Point3<f64>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, position)| position)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Inserts or replaces the position stored under `name`.
    pub fn insert(&mut self, name: &str, position: Point3<f64>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = position,
            None => self.entries.push((name.to_string(), position)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Point3<f64>)> + Clone + '_ {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }
}

/// Outcome of one reconstruction call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction {
    /// Newly placed atoms in placement order, CB first.
    Placed(NamedPositions),
    /// Not enough data to place anything. Expected for some residues, not an error.
    Aborted(AbortReason),
}

impl Reconstruction {
    pub fn placed(&self) -> Option<&NamedPositions> {
        match self {
            Reconstruction::Placed(atoms) => Some(atoms),
            Reconstruction::Aborted(_) => None,
        }
    }

    pub fn into_placed(self) -> Option<NamedPositions> {
        match self {
            Reconstruction::Placed(atoms) => Some(atoms),
            Reconstruction::Aborted(_) => None,
        }
    }
}

/// Collects the trimmed names and positions of every atom belonging to `res_id`.
pub fn residue_atoms(record: &NeighborhoodRecord, res_id: &ResidueId) -> NamedPositions {
    let mut atoms = NamedPositions::new();
    for atom in record.atoms().filter(|a| a.res_id == res_id) {
        atoms.insert(atom.name.trim(), atom.position());
    }
    atoms
}

/// Rebuilds the central residue's side chain of a neighborhood from chi angles.
///
/// Placement runs strictly in order: the beta carbon from the backbone, then the atom closing
/// each chi from 1 to 4, every step anchored on atoms known or placed before it.
pub struct ChiReconstructor<'a> {
    params: &'a ReconstructionParams,
    precondition: ChiPrecondition,
}

impl<'a> ChiReconstructor<'a> {
    pub fn new(params: &'a ReconstructionParams) -> Self {
        Self {
            params,
            precondition: ChiPrecondition::default(),
        }
    }

    pub fn with_precondition(mut self, precondition: ChiPrecondition) -> Self {
        self.precondition = precondition;
        self
    }

    /// Places CB and the chi-dependent atoms of the record's central residue.
    ///
    /// `chi_angles[i]` is chi `i + 1` in degrees; placement stops after the last supplied
    /// angle.
    ///
    /// # Return
    ///
    /// [`Reconstruction::Aborted`] when the residue has no chi freedom, its code is unknown, or
    /// any of N, C, CA is absent. Otherwise [`Reconstruction::Placed`], which may hold fewer
    /// atoms than the full side chain.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructionError::Geometry`] for degenerate anchor geometry and
    /// [`ReconstructionError::MissingParameter`] when the parameter table lacks an entry the
    /// residue needs.
    #[instrument(level = "trace", skip_all, fields(residue = %record.res_id))]
    pub fn reconstruct(
        &self,
        record: &NeighborhoodRecord,
        chi_angles: &[f64],
    ) -> Result<Reconstruction, ReconstructionError> {
        // --- Start ---
        let code = record.res_id.residue_name.trim();
        let Some(residue) = self.params.residue_name(code) else {
            debug!("Unknown residue code '{}' for {}", code, record.res_id);
            return Ok(Reconstruction::Aborted(AbortReason::UnknownResidue {
                code: code.to_string(),
            }));
        };
        if !self.params.has_side_chain_freedom(residue) {
            return Ok(Reconstruction::Aborted(AbortReason::NoSideChainFreedom {
                residue: residue.to_string(),
            }));
        }

        // --- BackboneCheck ---
        let mut atoms = residue_atoms(record, &record.res_id);
        let mut backbone = [Point3::origin(); 3];
        for (slot, name) in backbone.iter_mut().zip(["N", "C", "CA"]) {
            match atoms.get(name) {
                Some(position) => *slot = *position,
                None => {
                    debug!("{} lacks backbone atom {}", record.res_id, name);
                    return Ok(Reconstruction::Aborted(AbortReason::MissingBackbone {
                        atom: name,
                    }));
                }
            }
        }
        let [n, c, ca] = backbone;

        // --- BetaCarbonPlaced ---
        let beta = self
            .params
            .beta_carbon(residue)
            .ok_or_else(|| ReconstructionError::MissingParameter {
                residue: residue.to_string(),
                table: "beta carbon",
            })?;
        let stage = Stage::BetaCarbonPlaced;
        let normal = plane_normal(&n, &c, &ca).map_err(|source| geometry(stage, source))?;
        let cb = place_atom(
            &normal,
            beta.dihedral,
            &c,
            &ca,
            beta.bond_length,
            beta.bond_angle,
        )
        .map_err(|source| geometry(stage, source))?;

        let mut placed = NamedPositions::new();
        atoms.insert("CB", cb);
        placed.insert("CB", cb);

        // --- Chi1..Chi4 ---
        for chi in 1..=MAX_CHI {
            let stage = Stage::Chi(chi);
            let Some([a1, a2, a3, a4]) = self.params.chi_atoms(residue, chi) else {
                break;
            };
            let Some(&angle) = chi_angles.get(chi - 1) else {
                trace!("No angle supplied for chi{}", chi);
                break;
            };

            let anchors = (atoms.get(a1), atoms.get(a2), atoms.get(a3));
            let (Some(&p1), Some(&p2), Some(&p3)) = anchors else {
                debug!("{} lacks anchors for chi{}", record.res_id, chi);
                match self.precondition {
                    ChiPrecondition::AnchorsPresent => break,
                    ChiPrecondition::TargetObserved => continue,
                }
            };
            if self.precondition == ChiPrecondition::TargetObserved && !atoms.contains(a4) {
                trace!("{} was not observed; skipping chi{}", a4, chi);
                continue;
            }

            let geometry_params = self.params.chi_geometry(residue, chi).ok_or_else(|| {
                ReconstructionError::MissingParameter {
                    residue: residue.to_string(),
                    table: "chi bond geometry",
                }
            })?;
            let normal = plane_normal(&p1, &p2, &p3).map_err(|source| geometry(stage, source))?;
            let position = place_atom(
                &normal,
                angle,
                &p2,
                &p3,
                geometry_params.bond_length,
                geometry_params.bond_angle,
            )
            .map_err(|source| geometry(stage, source))?;

            atoms.insert(a4, position);
            placed.insert(a4, position);
        }

        trace!("Reached {:?} with {} placed atom(s)", Stage::Done, placed.len());
        Ok(Reconstruction::Placed(placed))
    }
}

fn geometry(stage: Stage, source: GeometryError) -> ReconstructionError {
    ReconstructionError::Geometry { stage, source }
}

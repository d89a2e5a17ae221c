use super::reconstruct::residue_atoms;
use crate::core::models::neighborhood::NeighborhoodRecord;
use crate::core::params::{MAX_CHI, ReconstructionParams};
use crate::core::utils::geometry::dihedral_angle;

/// Observed chi angles (degrees) of the record's central residue.
///
/// Measures chi 1, 2, ... in order and stops at the first chi that has no atom quadruple in
/// `params` or whose four atoms are not all present. Unknown residue codes yield no angles.
pub fn measure_chi_angles(record: &NeighborhoodRecord, params: &ReconstructionParams) -> Vec<f64> {
    let Some(residue) = params.residue_name(&record.res_id.residue_name) else {
        return Vec::new();
    };
    let atoms = residue_atoms(record, &record.res_id);

    let mut angles = Vec::with_capacity(MAX_CHI);
    for chi in 1..=MAX_CHI {
        let Some(quad) = params.chi_atoms(residue, chi) else {
            break;
        };
        let positions = (
            atoms.get(&quad[0]),
            atoms.get(&quad[1]),
            atoms.get(&quad[2]),
            atoms.get(&quad[3]),
        );
        let (Some(a), Some(b), Some(c), Some(d)) = positions else {
            break;
        };
        angles.push(dihedral_angle(a, b, c, d));
    }
    angles
}

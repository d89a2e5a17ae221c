use nalgebra::{Point3, Rotation3, Unit, Vector3};
use thiserror::Error;

/// Below this norm a direction vector is treated as zero.
const DEGENERACY_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Reference points are collinear or coincident; no plane normal exists")]
    Degenerate,
}

pub fn rotation_from_axis_angle(axis: &Unit<Vector3<f64>>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(axis, angle_degrees.to_radians())
}

fn unit_direction(v: Vector3<f64>) -> Result<Unit<Vector3<f64>>, GeometryError> {
    Unit::try_new(v, DEGENERACY_EPSILON).ok_or(GeometryError::Degenerate)
}

/// Unit normal of the plane through `p1`, `p2`, `p3`, oriented as `(p2 - p1) x (p3 - p2)`.
///
/// This is the reference direction for placing a fourth atom at a given dihedral to
/// `p1-p2-p3`.
pub fn plane_normal(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> Result<Unit<Vector3<f64>>, GeometryError> {
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    unit_direction(b1.cross(&b2))
}

/// Places atom D from internal coordinates relative to the chain A-B-C.
///
/// A enters only through `reference_normal` (see [`plane_normal`]). The result satisfies
/// `|CD| = bond_length`, `angle(B, C, D) = bond_angle_degrees` and
/// `dihedral(A, B, C, D) = dihedral_degrees`.
///
/// The unit vector C->B is first rotated by the bond angle about the reference normal, which
/// keeps it in the A-B-C plane on A's side (dihedral zero), and then rotated by the dihedral
/// about the B->C axis.
pub fn place_atom(
    reference_normal: &Unit<Vector3<f64>>,
    dihedral_degrees: f64,
    anchor_b: &Point3<f64>,
    anchor_c: &Point3<f64>,
    bond_length: f64,
    bond_angle_degrees: f64,
) -> Result<Point3<f64>, GeometryError> {
    let c_to_b = unit_direction(anchor_b - anchor_c)?;
    let b_to_c = Unit::new_unchecked(-c_to_b.into_inner());

    let in_plane =
        rotation_from_axis_angle(reference_normal, -bond_angle_degrees) * c_to_b.into_inner();
    let direction = rotation_from_axis_angle(&b_to_c, dihedral_degrees) * in_plane;

    Ok(anchor_c + direction.normalize() * bond_length)
}

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (b - a).norm()
}

/// Angle A-B-C at vertex B, in degrees.
pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (a - b).angle(&(c - b)).to_degrees()
}

/// IUPAC dihedral A-B-C-D in degrees, in `(-180, 180]`.
pub fn dihedral_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let y = b2.norm() * b1.dot(&n2);
    let x = n1.dot(&n2);
    y.atan2(x).to_degrees()
}

/// RMSD over the atom names present in both sets; `None` when nothing overlaps.
pub fn calculate_named_rmsd<'a, I, J>(coords1: I, coords2: J) -> Option<f64>
where
    I: IntoIterator<Item = (&'a str, &'a Point3<f64>)>,
    J: IntoIterator<Item = (&'a str, &'a Point3<f64>)> + Clone,
{
    let mut squared_dist_sum = 0.0;
    let mut count = 0;

    for (name, p1) in coords1 {
        if let Some((_, p2)) = coords2.clone().into_iter().find(|(other, _)| *other == name) {
            squared_dist_sum += (p1 - p2).norm_squared();
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some((squared_dist_sum / count as f64).sqrt())
    }
}

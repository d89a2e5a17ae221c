use super::ids::ResidueId;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of atom slots in a neighborhood record.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Cannot fit {required} atoms into a record with capacity {capacity}")]
pub struct CapacityExceeded {
    pub required: usize,
    pub capacity: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Field '{field}' has {len} slots but the record capacity is {capacity}")]
    FieldLength {
        field: &'static str,
        len: usize,
        capacity: usize,
    },
    #[error("Atom slot {slot} is populated after the first empty slot {first_empty}")]
    NonContiguous { slot: usize, first_empty: usize },
}

/// One atom's worth of per-slot data, owned.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomEntry {
    pub name: String,
    pub element: String,
    pub res_id: ResidueId,
    pub coord: [f64; 3],
    pub sasa: f64,
    pub charge: f64,
}

impl AtomEntry {
    pub fn new(name: &str, element: &str, res_id: ResidueId, coord: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            element: element.to_string(),
            res_id,
            coord,
            sasa: 0.0,
            charge: 0.0,
        }
    }
}

/// A borrowed view of one populated slot.
#[derive(Debug, Clone, Copy)]
pub struct AtomView<'a> {
    pub index: usize,
    pub name: &'a str,
    pub element: &'a str,
    pub res_id: &'a ResidueId,
    pub coord: &'a [f64; 3],
    pub sasa: f64,
    pub charge: f64,
}

impl AtomView<'_> {
    pub fn position(&self) -> Point3<f64> {
        Point3::from(*self.coord)
    }
}

/// The environment of one central residue, stored as parallel fixed-capacity slot arrays.
///
/// Every per-atom vector has the same length, the record capacity. Populated atoms occupy a
/// contiguous prefix; the remaining slots hold the empty sentinel (empty strings, the empty
/// [`ResidueId`] and zeros). Records are treated as immutable values: operations that change
/// the atom set return a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodRecord {
    pub res_id: ResidueId,
    pub atom_names: Vec<String>,
    pub elements: Vec<String>,
    pub res_ids: Vec<ResidueId>,
    pub coords: Vec<[f64; 3]>,
    pub sasas: Vec<f64>,
    pub charges: Vec<f64>,
}

impl NeighborhoodRecord {
    /// Creates a record with `capacity` empty slots.
    pub fn empty(res_id: ResidueId, capacity: usize) -> Self {
        Self {
            res_id,
            atom_names: vec![String::new(); capacity],
            elements: vec![String::new(); capacity],
            res_ids: vec![ResidueId::default(); capacity],
            coords: vec![[0.0; 3]; capacity],
            sasas: vec![0.0; capacity],
            charges: vec![0.0; capacity],
        }
    }

    /// Packs `atoms` into the leading slots of a new record of the given capacity.
    pub fn from_atoms(
        res_id: ResidueId,
        atoms: Vec<AtomEntry>,
        capacity: usize,
    ) -> Result<Self, CapacityExceeded> {
        let mut atom_names = Vec::with_capacity(atoms.len());
        let mut elements = Vec::with_capacity(atoms.len());
        let mut res_ids = Vec::with_capacity(atoms.len());
        let mut coords = Vec::with_capacity(atoms.len());
        let mut sasas = Vec::with_capacity(atoms.len());
        let mut charges = Vec::with_capacity(atoms.len());

        for atom in atoms {
            atom_names.push(atom.name);
            elements.push(atom.element);
            res_ids.push(atom.res_id);
            coords.push(atom.coord);
            sasas.push(atom.sasa);
            charges.push(atom.charge);
        }

        Ok(Self {
            res_id,
            atom_names: pad_to_capacity(atom_names, capacity)?,
            elements: pad_to_capacity(elements, capacity)?,
            res_ids: pad_to_capacity(res_ids, capacity)?,
            coords: pad_to_capacity(coords, capacity)?,
            sasas: pad_to_capacity(sasas, capacity)?,
            charges: pad_to_capacity(charges, capacity)?,
        })
    }

    pub fn capacity(&self) -> usize {
        self.atom_names.len()
    }

    /// Number of populated slots, i.e. the length of the non-empty name prefix.
    pub fn atom_count(&self) -> usize {
        self.atom_names
            .iter()
            .position(|name| name.is_empty())
            .unwrap_or(self.atom_names.len())
    }

    pub fn atom(&self, index: usize) -> Option<AtomView<'_>> {
        if index >= self.atom_count() {
            return None;
        }
        Some(AtomView {
            index,
            name: &self.atom_names[index],
            element: &self.elements[index],
            res_id: &self.res_ids[index],
            coord: &self.coords[index],
            sasa: self.sasas[index],
            charge: self.charges[index],
        })
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomView<'_>> + '_ {
        (0..self.atom_count()).filter_map(move |i| self.atom(i))
    }

    /// Checks that all slot arrays share one capacity and that populated slots are contiguous.
    pub fn validate(&self) -> Result<(), RecordError> {
        let capacity = self.capacity();
        let lengths = [
            ("elements", self.elements.len()),
            ("res_ids", self.res_ids.len()),
            ("coords", self.coords.len()),
            ("sasas", self.sasas.len()),
            ("charges", self.charges.len()),
        ];
        for (field, len) in lengths {
            if len != capacity {
                return Err(RecordError::FieldLength {
                    field,
                    len,
                    capacity,
                });
            }
        }

        let first_empty = self.atom_count();
        if let Some(offset) = self.atom_names[first_empty..]
            .iter()
            .position(|name| !name.is_empty())
        {
            return Err(RecordError::NonContiguous {
                slot: first_empty + offset,
                first_empty,
            });
        }
        Ok(())
    }
}

/// Extends `values` with default sentinels up to `capacity`.
///
/// The first `values.len()` entries are preserved unchanged. A longer input is never truncated.
pub fn pad_to_capacity<T: Clone + Default>(
    mut values: Vec<T>,
    capacity: usize,
) -> Result<Vec<T>, CapacityExceeded> {
    if values.len() > capacity {
        return Err(CapacityExceeded {
            required: values.len(),
            capacity,
        });
    }
    values.resize(capacity, T::default());
    Ok(values)
}

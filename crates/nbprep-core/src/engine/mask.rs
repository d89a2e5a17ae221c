use crate::core::models::ids::ResidueKey;
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MaskError {
    #[error("Per-atom field '{field}' has {found} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Atom count {atom_count} exceeds the slot capacity {capacity}")]
    AtomCountExceedsCapacity { atom_count: usize, capacity: usize },
    #[error("Removal probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
}

/// Everything a mask oracle needs to decide which atom slots survive.
///
/// `chains` and `sites` describe the `atom_count` populated atoms; `atom_names` is the full
/// padded name buffer, so its length is the slot capacity and the length of the returned mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskRequest<'a> {
    pub atom_count: usize,
    pub max_sites: usize,
    pub chains: &'a [String],
    pub sites: &'a [i64],
    pub atom_names: &'a [String],
    pub backbone_atoms: &'a [String],
    pub removal_probability: f64,
    pub central: &'a ResidueKey,
}

impl MaskRequest<'_> {
    pub fn capacity(&self) -> usize {
        self.atom_names.len()
    }

    pub fn validate(&self) -> Result<(), MaskError> {
        if self.atom_count > self.capacity() {
            return Err(MaskError::AtomCountExceedsCapacity {
                atom_count: self.atom_count,
                capacity: self.capacity(),
            });
        }
        for (field, found) in [("chains", self.chains.len()), ("sites", self.sites.len())] {
            if found != self.atom_count {
                return Err(MaskError::LengthMismatch {
                    field,
                    expected: self.atom_count,
                    found,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.removal_probability) {
            return Err(MaskError::InvalidProbability(self.removal_probability));
        }
        Ok(())
    }

    pub fn is_backbone(&self, atom_name: &str) -> bool {
        let name = atom_name.trim();
        self.backbone_atoms.iter().any(|bb| bb.trim() == name)
    }
}

/// Decides which atom slots of a neighborhood are kept.
///
/// Every implementation must honour the same contract:
///
/// 1. Atoms named like a backbone atom are always kept.
/// 2. Atoms are grouped by `(chain, site)`. Each group gets exactly one Bernoulli draw, made
///    when the group is first met in atom order: the group is removed when a uniform draw on
///    `[0, 1)` falls below the removal probability. Every non-backbone atom of the group follows
///    that one decision. Group bookkeeping never outlives a call.
/// 3. The central residue's group is always removed.
/// 4. Slots at or beyond `atom_count` are never kept.
///
/// The randomness source is explicit so that decisions are reproducible from a seed.
pub trait MaskOracle {
    fn compute_mask<R: Rng + ?Sized>(
        &self,
        request: &MaskRequest<'_>,
        rng: &mut R,
    ) -> Result<Vec<bool>, MaskError>;
}

/// In-process mask oracle keeping one decision per `(chain, site)` group.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupMaskOracle;

impl MaskOracle for GroupMaskOracle {
    #[instrument(level = "trace", skip_all, fields(atoms = request.atom_count, p = request.removal_probability))]
    fn compute_mask<R: Rng + ?Sized>(
        &self,
        request: &MaskRequest<'_>,
        rng: &mut R,
    ) -> Result<Vec<bool>, MaskError> {
        request.validate()?;

        let central = (request.central.chain.trim(), request.central.site);
        let mut removed_groups: HashMap<(&str, i64), bool> =
            HashMap::with_capacity(request.atom_count.min(request.max_sites));
        let mut mask = vec![false; request.capacity()];

        let atoms = request.chains.iter().zip(request.sites).zip(request.atom_names);
        for (keep, ((chain, &site), name)) in mask.iter_mut().zip(atoms) {
            let group = (chain.trim(), site);
            let removed = *removed_groups.entry(group).or_insert_with(|| {
                let drawn = rng.r#gen::<f64>() < request.removal_probability;
                drawn || group == central
            });
            *keep = request.is_backbone(name) || !removed;
        }

        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::collections::HashSet;

    struct Neighborhood {
        chains: Vec<String>,
        sites: Vec<i64>,
        names: Vec<String>,
        atom_count: usize,
    }

    /// `residues` groups of (N, CA, C, O, CB, CG) on chain A plus a few padding slots.
    fn neighborhood(residues: i64, padding: usize) -> Neighborhood {
        let mut chains = Vec::new();
        let mut sites = Vec::new();
        let mut names = Vec::new();
        for site in 1..=residues {
            for name in [" N  ", " CA ", " C  ", " O  ", " CB ", " CG "] {
                chains.push("A".to_string());
                sites.push(site);
                names.push(name.to_string());
            }
        }
        let atom_count = names.len();
        names.extend(std::iter::repeat_n(String::new(), padding));
        Neighborhood {
            chains,
            sites,
            names,
            atom_count,
        }
    }

    fn backbone() -> Vec<String> {
        ["N", "CA", "C", "O"].iter().map(|s| s.to_string()).collect()
    }

    fn request<'a>(
        n: &'a Neighborhood,
        backbone: &'a [String],
        p: f64,
        central: &'a ResidueKey,
    ) -> MaskRequest<'a> {
        MaskRequest {
            atom_count: n.atom_count,
            max_sites: 10_000,
            chains: &n.chains,
            sites: &n.sites,
            atom_names: &n.names,
            backbone_atoms: backbone,
            removal_probability: p,
            central,
        }
    }

    struct CountingRng {
        inner: StdRng,
        draws: usize,
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }
        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dest)
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.draws += 1;
            self.inner.try_fill_bytes(dest)
        }
    }

    #[test]
    fn backbone_atoms_survive_full_removal() {
        let n = neighborhood(10, 4);
        let bb = backbone();
        let central = ResidueKey::new("A", 3);
        let mask = GroupMaskOracle
            .compute_mask(&request(&n, &bb, 1.0, &central), &mut StdRng::seed_from_u64(1))
            .unwrap();

        for i in 0..n.atom_count {
            let is_bb = bb.iter().any(|b| b == n.names[i].trim());
            assert_eq!(mask[i], is_bb, "slot {} ({})", i, n.names[i]);
        }
    }

    #[test]
    fn zero_probability_removes_only_the_central_side_chain() {
        let n = neighborhood(5, 0);
        let bb = backbone();
        let central = ResidueKey::new("A", 2);
        let mask = GroupMaskOracle
            .compute_mask(&request(&n, &bb, 0.0, &central), &mut StdRng::seed_from_u64(7))
            .unwrap();

        for i in 0..n.atom_count {
            let side_chain = !bb.iter().any(|b| b == n.names[i].trim());
            let expected = !(side_chain && n.sites[i] == 2);
            assert_eq!(mask[i], expected, "slot {}", i);
        }
    }

    #[test]
    fn padding_slots_are_never_kept() {
        let n = neighborhood(3, 25);
        let bb = backbone();
        let central = ResidueKey::new("B", 99);
        let mask = GroupMaskOracle
            .compute_mask(&request(&n, &bb, 0.0, &central), &mut StdRng::seed_from_u64(3))
            .unwrap();

        assert_eq!(mask.len(), n.names.len());
        assert!(mask[..n.atom_count].iter().all(|&keep| keep));
        assert!(mask[n.atom_count..].iter().all(|&keep| !keep));
    }

    #[test]
    fn groups_are_kept_or_removed_atomically() {
        let n = neighborhood(40, 0);
        let bb = backbone();
        let central = ResidueKey::new("A", 17);
        for seed in 0..20 {
            let mask = GroupMaskOracle
                .compute_mask(&request(&n, &bb, 0.5, &central), &mut StdRng::seed_from_u64(seed))
                .unwrap();
            let mut decisions: HashMap<i64, bool> = HashMap::new();
            for i in 0..n.atom_count {
                if bb.iter().any(|b| b == n.names[i].trim()) {
                    continue;
                }
                let previous = decisions.entry(n.sites[i]).or_insert(mask[i]);
                assert_eq!(*previous, mask[i], "seed {} site {}", seed, n.sites[i]);
            }
            assert_eq!(decisions.get(&17), Some(&false));
        }
    }

    #[test]
    fn groups_are_split_by_chain() {
        let chains: Vec<String> = ["A", "A", "B", "B"].iter().map(|s| s.to_string()).collect();
        let sites = vec![5, 5, 5, 5];
        let names: Vec<String> = ["CB", "CG", "CB", "CG"].iter().map(|s| s.to_string()).collect();
        let bb = backbone();
        let central = ResidueKey::new("A", 5);
        let req = MaskRequest {
            atom_count: 4,
            max_sites: 10,
            chains: &chains,
            sites: &sites,
            atom_names: &names,
            backbone_atoms: &bb,
            removal_probability: 0.0,
            central: &central,
        };
        let mask = GroupMaskOracle
            .compute_mask(&req, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(mask, vec![false, false, true, true]);
    }

    fn single_residue(chain: &str, site: i64) -> (Vec<String>, Vec<i64>, Vec<String>) {
        let names = [" N  ", " CA ", " CB "];
        (
            names.iter().map(|_| chain.to_string()).collect(),
            vec![site; names.len()],
            names.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn central_group_matches_blank_and_padded_chains() {
        let bb = backbone();
        let cases = [("   ", " ", 1), ("A", "A ", 5), (" B", "B", 2), ("", " ", 9)];
        for (atom_chain, central_chain, site) in cases {
            let (chains, sites, names) = single_residue(atom_chain, site);
            // Built directly so the central chain keeps its padding.
            let central = ResidueKey {
                chain: central_chain.to_string(),
                site,
            };
            let req = MaskRequest {
                atom_count: 3,
                max_sites: 10,
                chains: &chains,
                sites: &sites,
                atom_names: &names,
                backbone_atoms: &bb,
                removal_probability: 0.0,
                central: &central,
            };
            let mask = GroupMaskOracle
                .compute_mask(&req, &mut StdRng::seed_from_u64(0))
                .unwrap();
            assert_eq!(
                mask,
                vec![true, true, false],
                "atom chain {:?}, central chain {:?}",
                atom_chain,
                central_chain
            );
        }
    }

    #[test]
    fn one_draw_per_group() {
        let n = neighborhood(12, 0);
        let bb = backbone();
        let central = ResidueKey::new("A", 1);
        let mut rng = CountingRng {
            inner: StdRng::seed_from_u64(11),
            draws: 0,
        };
        GroupMaskOracle
            .compute_mask(&request(&n, &bb, 0.5, &central), &mut rng)
            .unwrap();
        assert_eq!(rng.draws, 12);
    }

    #[test]
    fn no_decision_leaks_between_calls() {
        let n = neighborhood(8, 2);
        let bb = backbone();
        let central = ResidueKey::new("Z", 0);
        let oracle = GroupMaskOracle;
        let mut rng = StdRng::seed_from_u64(5);

        let removed_all = oracle
            .compute_mask(&request(&n, &bb, 1.0, &central), &mut rng)
            .unwrap();
        let kept_all = oracle
            .compute_mask(&request(&n, &bb, 0.0, &central), &mut rng)
            .unwrap();

        assert!(removed_all[..n.atom_count].iter().any(|&keep| !keep));
        assert!(kept_all[..n.atom_count].iter().all(|&keep| keep));
    }

    #[test]
    fn same_seed_gives_same_mask() {
        let n = neighborhood(30, 10);
        let bb = backbone();
        let central = ResidueKey::new("A", 4);
        let req = request(&n, &bb, 0.5, &central);
        let a = GroupMaskOracle
            .compute_mask(&req, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = GroupMaskOracle
            .compute_mask(&req, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn removal_rate_tracks_probability() {
        let n = neighborhood(2000, 0);
        let bb = backbone();
        let central = ResidueKey::new("X", -1);
        let mask = GroupMaskOracle
            .compute_mask(&request(&n, &bb, 0.3, &central), &mut StdRng::seed_from_u64(2024))
            .unwrap();

        let removed: HashSet<i64> = (0..n.atom_count)
            .filter(|&i| !mask[i])
            .map(|i| n.sites[i])
            .collect();
        let rate = removed.len() as f64 / 2000.0;
        assert!((0.25..0.35).contains(&rate), "rate {}", rate);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let mut n = neighborhood(2, 0);
        n.sites.pop();
        let bb = backbone();
        let central = ResidueKey::new("A", 1);
        let result =
            GroupMaskOracle.compute_mask(&request(&n, &bb, 0.5, &central), &mut StdRng::seed_from_u64(0));
        assert_eq!(
            result,
            Err(MaskError::LengthMismatch {
                field: "sites",
                expected: 12,
                found: 11
            })
        );
    }

    #[test]
    fn rejects_invalid_probability() {
        let n = neighborhood(2, 0);
        let bb = backbone();
        let central = ResidueKey::new("A", 1);
        let result =
            GroupMaskOracle.compute_mask(&request(&n, &bb, 1.5, &central), &mut StdRng::seed_from_u64(0));
        assert_eq!(result, Err(MaskError::InvalidProbability(1.5)));
    }

    #[test]
    fn rejects_atom_count_beyond_capacity() {
        let mut n = neighborhood(1, 0);
        n.atom_count += 1;
        n.chains.push("A".to_string());
        n.sites.push(1);
        let bb = backbone();
        let central = ResidueKey::new("A", 1);
        let result =
            GroupMaskOracle.compute_mask(&request(&n, &bb, 0.5, &central), &mut StdRng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(MaskError::AtomCountExceedsCapacity { .. })
        ));
    }
}

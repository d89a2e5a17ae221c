//! C ABI for the neighborhood keep-mask.
//!
//! Exposes the group-consistent mask oracle to callers that hold neighborhoods in flat,
//! fixed-width buffers. Names are passed as packed byte arrays of `name_width` bytes per entry,
//! padded with spaces or NULs.

use nbprep::core::models::ids::ResidueKey;
use nbprep::engine::mask::{GroupMaskOracle, MaskOracle, MaskRequest};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::ffi::{CStr, c_char};

pub const NBPREP_OK: i32 = 0;
pub const NBPREP_ERR_NULL_POINTER: i32 = -1;
pub const NBPREP_ERR_INVALID_INPUT: i32 = -2;
pub const NBPREP_ERR_INVALID_UTF8: i32 = -3;

/// Computes the keep-mask of one neighborhood and writes it to `out_mask`.
///
/// `chains` and `sites` hold one entry per populated atom (`atom_count`). `atom_names` holds
/// `capacity` packed names and `out_mask` must have room for `capacity` flags. Randomness comes
/// from a generator seeded with `seed`, so equal inputs give equal masks.
///
/// Returns [`NBPREP_OK`] or a negative status; `out_mask` is only written on success.
///
/// # Safety
///
/// Every non-null pointer must be valid for the number of elements described above, and
/// `backbone_names` for `backbone_count * name_width` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nbprep_get_mask(
    atom_count: usize,
    capacity: usize,
    max_sites: usize,
    chains: *const u8,
    sites: *const i64,
    atom_names: *const u8,
    name_width: usize,
    backbone_names: *const u8,
    backbone_count: usize,
    removal_probability: f64,
    central_chain: u8,
    central_site: i64,
    seed: u64,
    out_mask: *mut bool,
) -> i32 {
    if out_mask.is_null()
        || atom_names.is_null()
        || (atom_count > 0 && (chains.is_null() || sites.is_null()))
        || (backbone_count > 0 && backbone_names.is_null())
    {
        return NBPREP_ERR_NULL_POINTER;
    }
    if name_width == 0 || atom_count > capacity {
        return NBPREP_ERR_INVALID_INPUT;
    }

    let (Some(name_bytes), Some(backbone_bytes)) = (
        capacity.checked_mul(name_width),
        backbone_count.checked_mul(name_width),
    ) else {
        return NBPREP_ERR_INVALID_INPUT;
    };

    // SAFETY: lengths and non-null checks above; the caller guarantees the extents.
    let (chain_bytes, sites, atom_names, backbone_names) = unsafe {
        (
            slice_or_empty(chains, atom_count),
            slice_or_empty(sites, atom_count),
            slice_or_empty(atom_names, name_bytes),
            slice_or_empty(backbone_names, backbone_bytes),
        )
    };

    let Some(atom_names) = unpack_names(atom_names, name_width) else {
        return NBPREP_ERR_INVALID_UTF8;
    };
    let Some(backbone_atoms) = unpack_names(backbone_names, name_width) else {
        return NBPREP_ERR_INVALID_UTF8;
    };
    let chains: Vec<String> = chain_bytes.iter().map(|&c| chain_id(c)).collect();
    let central = ResidueKey::new(&chain_id(central_chain), central_site);

    let request = MaskRequest {
        atom_count,
        max_sites,
        chains: &chains,
        sites,
        atom_names: &atom_names,
        backbone_atoms: &backbone_atoms,
        removal_probability,
        central: &central,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mask = match GroupMaskOracle.compute_mask(&request, &mut rng) {
        Ok(mask) => mask,
        Err(_) => return NBPREP_ERR_INVALID_INPUT,
    };

    // SAFETY: out_mask is non-null and the caller guarantees room for `capacity` flags.
    let out = unsafe { std::slice::from_raw_parts_mut(out_mask, capacity) };
    out.copy_from_slice(&mask);
    NBPREP_OK
}

/// Static description of a status code. Never freed by the caller.
#[unsafe(no_mangle)]
pub extern "C" fn nbprep_status_message(status: i32) -> *const c_char {
    let message: &'static CStr = match status {
        NBPREP_OK => c"ok",
        NBPREP_ERR_NULL_POINTER => c"a required pointer argument is null",
        NBPREP_ERR_INVALID_INPUT => c"invalid sizes, lengths or probability",
        NBPREP_ERR_INVALID_UTF8 => c"an atom name is not valid UTF-8",
        _ => c"unknown status",
    };
    message.as_ptr()
}

unsafe fn slice_or_empty<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if len == 0 {
        &[]
    } else {
        // SAFETY: forwarded from the caller.
        unsafe { std::slice::from_raw_parts(ptr, len) }
    }
}

/// Blank and NUL chain bytes both mean "no chain".
fn chain_id(byte: u8) -> String {
    match byte {
        0 | b' ' => String::new(),
        c => char::from(c).to_string(),
    }
}

fn unpack_names(bytes: &[u8], width: usize) -> Option<Vec<String>> {
    bytes
        .chunks_exact(width)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            std::str::from_utf8(&chunk[..end]).ok().map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    const WIDTH: usize = 4;

    fn pack(names: &[&str], slots: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; slots * WIDTH];
        for (i, name) in names.iter().enumerate() {
            bytes[i * WIDTH..i * WIDTH + name.len()].copy_from_slice(name.as_bytes());
        }
        bytes
    }

    struct Input {
        chains: Vec<u8>,
        sites: Vec<i64>,
        names: Vec<u8>,
        backbone: Vec<u8>,
        atom_count: usize,
        capacity: usize,
    }

    fn input() -> Input {
        let names = [" N  ", " CA ", " CB ", " N  ", " CA ", " CB ", " N  ", " CB "];
        Input {
            chains: b"AAABBBAA".to_vec(),
            sites: vec![1, 1, 1, 1, 1, 1, 2, 2],
            names: pack(&names, 10),
            backbone: pack(&["N", "CA", "C", "O"], 4),
            atom_count: 8,
            capacity: 10,
        }
    }

    fn call(input: &Input, p: f64, seed: u64, out: &mut [bool]) -> i32 {
        unsafe {
            nbprep_get_mask(
                input.atom_count,
                input.capacity,
                100,
                input.chains.as_ptr(),
                input.sites.as_ptr(),
                input.names.as_ptr(),
                WIDTH,
                input.backbone.as_ptr(),
                4,
                p,
                b'A',
                1,
                seed,
                out.as_mut_ptr(),
            )
        }
    }

    #[test]
    fn central_side_chain_removed_and_backbone_kept() {
        let input = input();
        let mut out = [true; 10];
        assert_eq!(call(&input, 0.0, 1, &mut out), NBPREP_OK);
        assert_eq!(
            out,
            [true, true, false, true, true, true, true, true, false, false]
        );
    }

    #[test]
    fn chain_distinguishes_groups_with_equal_sites() {
        let input = input();
        let mut out = [false; 10];
        assert_eq!(call(&input, 1.0, 1, &mut out), NBPREP_OK);
        assert_eq!(
            out,
            [true, true, false, true, true, false, true, false, false, false]
        );
    }

    #[test]
    fn blank_central_chain_still_removes_central_side_chain() {
        let names = pack(&[" N  ", " CA ", " CB "], 3);
        let backbone = pack(&["N", "CA", "C", "O"], 4);
        for chains in [b"   ", b"\0\0\0"] {
            let mut out = [true; 3];
            let status = unsafe {
                nbprep_get_mask(
                    3,
                    3,
                    10,
                    chains.as_ptr(),
                    [1i64, 1, 1].as_ptr(),
                    names.as_ptr(),
                    WIDTH,
                    backbone.as_ptr(),
                    4,
                    0.0,
                    b' ',
                    1,
                    0,
                    out.as_mut_ptr(),
                )
            };
            assert_eq!(status, NBPREP_OK);
            assert_eq!(out, [true, true, false], "chains {:?}", chains);
        }
    }

    #[test]
    fn same_seed_gives_same_mask() {
        let input = input();
        let mut a = [false; 10];
        let mut b = [false; 10];
        call(&input, 0.5, 99, &mut a);
        call(&input, 0.5, 99, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_null_and_invalid_arguments() {
        let input = input();
        let status = unsafe {
            nbprep_get_mask(
                8,
                10,
                100,
                input.chains.as_ptr(),
                input.sites.as_ptr(),
                input.names.as_ptr(),
                WIDTH,
                input.backbone.as_ptr(),
                4,
                0.5,
                b'A',
                1,
                0,
                ptr::null_mut(),
            )
        };
        assert_eq!(status, NBPREP_ERR_NULL_POINTER);

        let mut out = [false; 10];
        assert_eq!(call(&input, 1.5, 0, &mut out), NBPREP_ERR_INVALID_INPUT);

        let mut bad = input;
        bad.names[0] = 0xFF;
        assert_eq!(call(&bad, 0.5, 0, &mut out), NBPREP_ERR_INVALID_UTF8);
    }

    #[test]
    fn status_messages_are_static_c_strings() {
        let message = unsafe { CStr::from_ptr(nbprep_status_message(NBPREP_ERR_NULL_POINTER)) };
        assert_eq!(message.to_str().unwrap(), "a required pointer argument is null");
        let unknown = unsafe { CStr::from_ptr(nbprep_status_message(42)) };
        assert_eq!(unknown.to_str().unwrap(), "unknown status");
    }
}

//! Deterministic digest of lineage-case assignments.
//!
//! FNV-1a over each node's kind, address and flag bits, in arena order.
//! Two reads of the same inputs with the same partitioning produce the
//! same digest; not suitable for anything beyond equality checks.

use halotree_core::{HaloKey, HaloKind, TreeCase};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_u32(mut hash: u64, v: u32) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// One node's classified state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaseAssignment {
    /// Halo population.
    pub kind: HaloKind,
    /// Snapshot address.
    pub key: HaloKey,
    /// Final lineage flags.
    pub case: TreeCase,
}

/// Digest a sequence of case assignments. Order matters.
pub fn case_digest<'a>(assignments: impl IntoIterator<Item = &'a CaseAssignment>) -> u64 {
    let mut hash = FNV_OFFSET;
    for a in assignments {
        hash = fnv1a_u32(hash, a.kind.slot() as u32);
        hash = fnv1a_u32(hash, a.key.file as u32);
        hash = fnv1a_u32(hash, a.key.index as u32);
        hash = fnv1a_u32(hash, a.case.bits());
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(index: i32, case: TreeCase) -> CaseAssignment {
        CaseAssignment {
            kind: HaloKind::Group,
            key: HaloKey::new(0, index),
            case,
        }
    }

    #[test]
    fn empty_digest_is_offset_basis() {
        assert_eq!(case_digest(std::iter::empty()), FNV_OFFSET);
    }

    #[test]
    fn digest_sees_flags_and_order() {
        let a = assignment(0, TreeCase::MERGER);
        let b = assignment(1, TreeCase::MAIN_PROGENITOR);
        let base = case_digest(&[a, b]);
        assert_eq!(base, case_digest(&[a, b]));
        assert_ne!(base, case_digest(&[b, a]));
        let flipped = assignment(1, TreeCase::MERGER);
        assert_ne!(base, case_digest(&[a, flipped]));
    }
}

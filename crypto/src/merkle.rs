//! Merkle helpers for per-transaction entry trees.
//!
//! Each ledger transaction commits a small Merkle tree over its entries'
//! leaf digests; the root becomes the transaction's `entries_digest`.
//! Interior nodes are hashed with a `0x02` domain separator so a leaf can
//! never be reinterpreted as a node. Odd nodes are promoted unchanged
//! (no duplication), so the path length is at most `ceil(log2(width))`.

use crate::hash::blake2b_256_multi;
use verivote_types::RootDigest;

const NODE: &[u8] = &[0x02];

fn node_digest(left: &RootDigest, right: &RootDigest) -> RootDigest {
    RootDigest::new(blake2b_256_multi(&[
        NODE,
        left.as_bytes(),
        right.as_bytes(),
    ]))
}

/// Compute the Merkle root of a non-empty leaf list.
///
/// Returns `RootDigest::ZERO` for an empty list (a transaction with no
/// entries cannot be committed, so this only appears in degenerate tests).
pub fn merkle_root(leaves: &[RootDigest]) -> RootDigest {
    if leaves.is_empty() {
        return RootDigest::ZERO;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len() / 2 + 1);
        for pair in level.chunks(2) {
            match pair {
                [l, r] => next.push(node_digest(l, r)),
                [single] => next.push(*single),
                _ => unreachable!("chunks(2) yields 1 or 2 items"),
            }
        }
        level = next;
    }
    level[0]
}

/// Compute the audit path for `index` within `leaves`: the sibling digests
/// needed to recompute the root, bottom-up.
pub fn audit_path(leaves: &[RootDigest], index: usize) -> Vec<RootDigest> {
    let mut path = Vec::new();
    if leaves.is_empty() || index >= leaves.len() {
        return path;
    }
    let mut level = leaves.to_vec();
    let mut idx = index;
    while level.len() > 1 {
        let sibling = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
        if sibling < level.len() {
            path.push(level[sibling]);
        }
        let mut next = Vec::with_capacity(level.len() / 2 + 1);
        for pair in level.chunks(2) {
            match pair {
                [l, r] => next.push(node_digest(l, r)),
                [single] => next.push(*single),
                _ => unreachable!("chunks(2) yields 1 or 2 items"),
            }
        }
        level = next;
        idx /= 2;
    }
    path
}

/// Recompute a root from `leaf` at `index` in a tree of `width` leaves,
/// consuming the audit path bottom-up, and compare against `root`.
pub fn verify_audit_path(
    leaf: &RootDigest,
    index: usize,
    width: usize,
    path: &[RootDigest],
    root: &RootDigest,
) -> bool {
    if width == 0 || index >= width {
        return false;
    }
    let mut digest = *leaf;
    let mut idx = index;
    let mut level_width = width;
    let mut path_iter = path.iter();
    while level_width > 1 {
        let has_sibling = if idx % 2 == 0 {
            idx + 1 < level_width
        } else {
            true
        };
        if has_sibling {
            let sibling = match path_iter.next() {
                Some(s) => s,
                None => return false,
            };
            digest = if idx % 2 == 0 {
                node_digest(&digest, sibling)
            } else {
                node_digest(sibling, &digest)
            };
        }
        idx /= 2;
        level_width = level_width / 2 + level_width % 2;
    }
    path_iter.next().is_none() && digest == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaves(n: usize) -> Vec<RootDigest> {
        (0..n).map(|i| RootDigest::new([i as u8; 32])).collect()
    }

    #[test]
    fn single_leaf_root_is_leaf() {
        let l = leaves(1);
        assert_eq!(merkle_root(&l), l[0]);
        assert!(verify_audit_path(&l[0], 0, 1, &[], &l[0]));
    }

    #[test]
    fn audit_paths_verify_for_every_index() {
        for n in 1..=9 {
            let l = leaves(n);
            let root = merkle_root(&l);
            for i in 0..n {
                let path = audit_path(&l, i);
                assert!(
                    verify_audit_path(&l[i], i, n, &path, &root),
                    "n={n} i={i}"
                );
            }
        }
    }

    #[test]
    fn wrong_leaf_fails() {
        let l = leaves(4);
        let root = merkle_root(&l);
        let path = audit_path(&l, 2);
        let wrong = RootDigest::new([0xFF; 32]);
        assert!(!verify_audit_path(&wrong, 2, 4, &path, &root));
    }

    #[test]
    fn wrong_index_fails() {
        let l = leaves(4);
        let root = merkle_root(&l);
        let path = audit_path(&l, 2);
        assert!(!verify_audit_path(&l[2], 3, 4, &path, &root));
        assert!(!verify_audit_path(&l[2], 5, 4, &path, &root));
    }

    #[test]
    fn truncated_path_fails() {
        let l = leaves(8);
        let root = merkle_root(&l);
        let mut path = audit_path(&l, 5);
        path.pop();
        assert!(!verify_audit_path(&l[5], 5, 8, &path, &root));
    }

    proptest! {
        #[test]
        fn prop_random_trees_verify(n in 1usize..32, seed in any::<u8>()) {
            let l: Vec<RootDigest> = (0..n)
                .map(|i| RootDigest::new([seed.wrapping_add(i as u8); 32]))
                .collect();
            let root = merkle_root(&l);
            for i in 0..n {
                let path = audit_path(&l, i);
                prop_assert!(verify_audit_path(&l[i], i, n, &path, &root));
            }
        }

        #[test]
        fn prop_flipped_leaf_byte_fails(n in 2usize..16, i in 0usize..16) {
            let i = i % n;
            let l: Vec<RootDigest> = (0..n)
                .map(|k| RootDigest::new([k as u8 + 1; 32]))
                .collect();
            let root = merkle_root(&l);
            let path = audit_path(&l, i);
            let mut bytes = *l[i].as_bytes();
            bytes[0] ^= 0x01;
            let tampered = RootDigest::new(bytes);
            prop_assert!(!verify_audit_path(&tampered, i, n, &path, &root));
        }
    }
}

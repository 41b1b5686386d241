//! Merkle tree over transaction hashes
//!
//! Leaves are transaction hashes in display order. Each interior node is the
//! double SHA-256 of its two children taken in wire (reversed) order, and the
//! digest is flipped back so every level shares the display order. An odd
//! node at the end of a level is paired with itself.
//!
//! A tree with 5 transactions looks like this:
//!
//! ```text
//!         root
//!        /     \
//!       1        5
//!     /   \     / \
//!    2     3    4  4
//!  / \   / \   / \
//! t1 t2 t3 t4 t5 t5
//! ```

use super::hash::{double_sha256_pair, Sha256Hash};

/// Hash two sibling nodes into their parent
fn combine(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    let mut digest = double_sha256_pair(&left.reversed_bytes(), &right.reversed_bytes());
    digest.reverse();
    Sha256Hash::new(digest)
}

/// Build the whole tree as a flat list: leaves first, then each level up to
/// the root, which is the last entry. Empty input gives an empty tree.
pub fn build_merkle_tree(leaves: &[Sha256Hash]) -> Vec<Sha256Hash> {
    let mut tree: Vec<Sha256Hash> = leaves.to_vec();
    let mut level_offset = 0;
    let mut level_size = leaves.len();

    while level_size > 1 {
        for left in (0..level_size).step_by(2) {
            let right = (left + 1).min(level_size - 1);
            let node = combine(&tree[level_offset + left], &tree[level_offset + right]);
            tree.push(node);
        }
        level_offset += level_size;
        level_size = (level_size + 1) / 2;
    }

    tree
}

/// Calculate the merkle root, or `None` when there are no leaves
pub fn calculate_merkle_root(leaves: &[Sha256Hash]) -> Option<Sha256Hash> {
    if leaves.is_empty() {
        return None;
    }

    let mut level: Vec<Sha256Hash> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| combine(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
    }

    level.pop()
}

/// Merkle branch proving a leaf is part of a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling hashes from leaf to root, with whether the sibling sits on the left
    pub siblings: Vec<(Sha256Hash, bool)>,
}

impl MerkleProof {
    /// Build the branch for the leaf at `index`
    pub fn for_leaf(leaves: &[Sha256Hash], index: usize) -> Option<Self> {
        if index >= leaves.len() {
            return None;
        }

        let tree = build_merkle_tree(leaves);
        let mut siblings = Vec::new();
        let mut level_offset = 0;
        let mut level_size = leaves.len();
        let mut position = index;

        while level_size > 1 {
            let sibling = if position % 2 == 0 {
                (position + 1).min(level_size - 1)
            } else {
                position - 1
            };
            siblings.push((tree[level_offset + sibling], position % 2 == 1));
            level_offset += level_size;
            level_size = (level_size + 1) / 2;
            position /= 2;
        }

        Some(Self { siblings })
    }

    /// Verify the proof against a root hash
    pub fn verify(&self, leaf: &Sha256Hash, root: &Sha256Hash) -> bool {
        let computed = self.siblings.iter().fold(*leaf, |current, (sibling, is_left)| {
            if *is_left {
                combine(sibling, &current)
            } else {
                combine(&current, sibling)
            }
        });
        computed == *root
    }
}

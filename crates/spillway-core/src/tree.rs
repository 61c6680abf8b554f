//! Merkle trees over allocation tables.
//!
//! Trees are built from pre-hashed leaves with sorted-pair internal nodes.
//! Odd-length layers are padded by duplicating the last element. Proofs are
//! bottom-up sibling digests with no direction bits; the sorted-pair rule
//! re-derives the pairing order during verification.

use std::collections::HashMap;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::commitment::{hash_pair, leaf_hash, DropHasher, Sha256Hasher};
use crate::error::TreeError;
use crate::types::{Address, Hash256};

/// Full Merkle tree supporting root computation and proof extraction.
///
/// Stores all intermediate layers so that inclusion proofs can be
/// extracted for any leaf.
#[derive(Clone, Debug)]
pub struct MerkleTree<H: DropHasher = Sha256Hasher> {
    /// `layers[0]` = leaves, `layers[last]` = `[root]`.
    layers: Vec<Vec<Hash256>>,
    _hasher: PhantomData<H>,
}

impl<H: DropHasher> MerkleTree<H> {
    /// Build a tree from pre-hashed leaves.
    ///
    /// Fails with [`TreeError::Empty`] for an empty leaf set: a committed
    /// distribution always has at least one allocation.
    pub fn from_leaves(leaves: Vec<Hash256>) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut layers = Vec::new();
        let mut current = leaves;
        while current.len() > 1 {
            let next = next_layer::<H>(&current);
            layers.push(current);
            current = next;
        }
        layers.push(current);

        Ok(Self {
            layers,
            _hasher: PhantomData,
        })
    }

    /// The Merkle root.
    pub fn root(&self) -> Hash256 {
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// The proof lists sibling digests from the leaf layer up to just below
    /// the root; a single-leaf tree yields an empty proof. Returns `None`
    /// when the index is out of bounds.
    pub fn proof(&self, index: usize) -> Option<Vec<Hash256>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut path = Vec::new();
        let mut pos = index;

        // Walk from leaf layer to just below the root.
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_pos = pos ^ 1;
            let sibling = if sibling_pos < layer.len() {
                layer[sibling_pos]
            } else {
                // Odd layer: last element's sibling is itself (duplication).
                layer[pos]
            };
            path.push(sibling);
            pos /= 2;
        }

        Some(path)
    }
}

/// Compute the next layer of the tree from the current one.
///
/// Pairs adjacent digests with [`hash_pair`]. Duplicates the last element
/// when the layer has an odd number of entries.
fn next_layer<H: DropHasher>(layer: &[Hash256]) -> Vec<Hash256> {
    let mut next = Vec::with_capacity(layer.len().div_ceil(2));
    let mut i = 0;
    while i < layer.len() {
        let left = &layer[i];
        let right = if i + 1 < layer.len() {
            &layer[i + 1]
        } else {
            left
        };
        next.push(hash_pair::<H>(left, right));
        i += 2;
    }
    next
}

/// One row of an allocation table: a recipient and their cumulative amount.
///
/// The amount is the recipient's all-time entitlement in base units, not a
/// per-round increment.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Recipient address.
    pub recipient: Address,
    /// Cumulative entitlement in base units.
    pub amount: u64,
}

/// Merkle tree over an allocation table with per-recipient lookups.
///
/// Rows keep their input order. Each recipient may appear at most once: a
/// cumulative table carries one all-time total per recipient, and a
/// duplicate row would commit two conflicting figures under one root.
#[derive(Clone, Debug)]
pub struct AllocationTree<H: DropHasher = Sha256Hasher> {
    allocations: Vec<Allocation>,
    index: HashMap<Address, usize>,
    tree: MerkleTree<H>,
}

impl<H: DropHasher> AllocationTree<H> {
    /// Build the committed tree for an allocation table.
    pub fn from_allocations(allocations: Vec<Allocation>) -> Result<Self, TreeError> {
        let mut index = HashMap::with_capacity(allocations.len());
        for (i, allocation) in allocations.iter().enumerate() {
            if index.insert(allocation.recipient, i).is_some() {
                return Err(TreeError::DuplicateRecipient(allocation.recipient));
            }
        }

        let leaves = allocations
            .iter()
            .map(|a| leaf_hash::<H>(&a.recipient, a.amount))
            .collect();
        let tree = MerkleTree::from_leaves(leaves)?;

        Ok(Self {
            allocations,
            index,
            tree,
        })
    }

    /// The committed root.
    pub fn root(&self) -> Hash256 {
        self.tree.root()
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// The allocation rows in input order.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Cumulative amount for a recipient, if present.
    pub fn amount_of(&self, recipient: &Address) -> Option<u64> {
        self.index.get(recipient).map(|&i| self.allocations[i].amount)
    }

    /// Inclusion proof for a recipient's row, if present.
    pub fn proof_of(&self, recipient: &Address) -> Option<Vec<Hash256>> {
        self.index.get(recipient).and_then(|&i| self.tree.proof(i))
    }
}

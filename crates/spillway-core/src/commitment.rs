//! Commitment scheme for allocation tables.
//!
//! A leaf binds one recipient to a cumulative amount:
//! `SHA-256(address || amount)` with the amount widened to a 32-byte
//! big-endian word. Internal nodes hash their children in bytewise
//! lexicographic order, which makes the combiner commutative, so inclusion
//! proofs carry sibling digests only and no left/right direction bits.
//!
//! Sorted-pair hashing has a degenerate consequence for single-leaf
//! tables: the empty proof is valid exactly when the leaf equals the root.
//!
//! The digest algorithm sits behind [`DropHasher`] so trees, proofs, and
//! claim accounting stay independent of the concrete hash function.

use sha2::{Digest, Sha256};

use crate::error::ProofError;
use crate::types::{Address, Hash256};

/// Byte length of the encoded amount word.
pub const AMOUNT_WORD_LEN: usize = 32;

/// Byte length of a leaf preimage: address followed by the amount word.
pub const LEAF_PREIMAGE_LEN: usize = Address::LEN + AMOUNT_WORD_LEN;

/// Hash function used for leaves and internal nodes.
pub trait DropHasher {
    /// Hash arbitrary bytes to a 32-byte digest.
    fn hash(data: &[u8]) -> Hash256;
}

/// Default hasher: SHA-256.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl DropHasher for Sha256Hasher {
    fn hash(data: &[u8]) -> Hash256 {
        Hash256(Sha256::digest(data).into())
    }
}

/// Encode an amount as a fixed-width 32-byte big-endian word.
///
/// The high 24 bytes are zero; the value occupies the low 8.
pub fn encode_amount(amount: u64) -> [u8; AMOUNT_WORD_LEN] {
    let mut word = [0u8; AMOUNT_WORD_LEN];
    word[AMOUNT_WORD_LEN - 8..].copy_from_slice(&amount.to_be_bytes());
    word
}

/// Compute the leaf digest binding a recipient to a cumulative amount.
///
/// No domain-separation prefix: the leaf is the plain digest of the
/// 52-byte `address || amount` preimage.
pub fn leaf_hash<H: DropHasher>(recipient: &Address, amount: u64) -> Hash256 {
    let mut preimage = [0u8; LEAF_PREIMAGE_LEN];
    preimage[..Address::LEN].copy_from_slice(recipient.as_bytes());
    preimage[Address::LEN..].copy_from_slice(&encode_amount(amount));
    H::hash(&preimage)
}

/// Hash two sibling digests, ordering the pair bytewise first.
///
/// Equal operands concatenate in either order and produce the same digest.
pub fn hash_pair<H: DropHasher>(a: &Hash256, b: &Hash256) -> Hash256 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut preimage = [0u8; 2 * Hash256::LEN];
    preimage[..Hash256::LEN].copy_from_slice(first.as_bytes());
    preimage[Hash256::LEN..].copy_from_slice(second.as_bytes());
    H::hash(&preimage)
}

/// Verify an inclusion proof against an expected root.
///
/// Folds [`hash_pair`] over the sibling digests starting from `leaf` and
/// compares the result to `root`. Stateless; usable for off-line checks
/// before submitting a claim.
///
/// An empty proof is valid exactly when `leaf == root` (single-leaf table).
pub fn verify_proof<H: DropHasher>(leaf: &Hash256, proof: &[Hash256], root: &Hash256) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |node, sibling| hash_pair::<H>(&node, sibling));
    computed == *root
}

/// Split a concatenated byte proof into 32-byte sibling digests.
///
/// A length that is not a multiple of 32 is a format error, distinct from
/// verification failure.
pub fn decode_proof(bytes: &[u8]) -> Result<Vec<Hash256>, ProofError> {
    if bytes.len() % Hash256::LEN != 0 {
        return Err(ProofError::InvalidLength { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(Hash256::LEN)
        .map(|chunk| {
            let mut node = [0u8; Hash256::LEN];
            node.copy_from_slice(chunk);
            Hash256(node)
        })
        .collect())
}

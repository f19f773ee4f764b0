//! KYC Membership Registry
//!
//! Holds the whitelist-derived Poseidon Merkle tree and answers membership
//! proof queries. The tree is built once at `init()` and read concurrently
//! afterwards; whitelist changes mean constructing a fresh registry (the tree
//! is rebuilt wholesale, never mutated in place).
//!
//! # Duplicate-last pairing
//!
//! An odd-sized level pairs its last node with itself rather than padding
//! with a zero hash. The root is structure-sensitive, so any reimplementation
//! that pads differently produces an incompatible root; the rule is a
//! documented, tested policy here, not an incidental detail.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};
use std::sync::RwLock;

use shieldlend_circuits::poseidon;

use crate::error::ProverError;

/// A Merkle membership proof: sibling per level, leaf to root.
#[derive(Debug, Clone)]
pub struct MerkleProof {
    pub root: Fr,
    pub leaf: Fr,
    pub leaf_index: usize,
    pub path_elements: Vec<Fr>,
    /// true when the node at that level is the right child
    pub path_indices: Vec<bool>,
}

/// Map an address string into the proof field: Keccak256, truncated to
/// 31 bytes so the value fits under the 254-bit modulus, then Poseidon.
pub fn address_leaf(config: &PoseidonConfig<Fr>, address: &str) -> Fr {
    let digest = Keccak256::digest(address.as_bytes());
    let truncated = Fr::from_le_bytes_mod_order(&digest[..31]);
    poseidon::hash(config, &[truncated])
}

/// Fold a leaf with a proof path under the duplicate-last rule. Used by the
/// registry's own sanity checks and by tests; must reproduce the root.
pub fn fold_path(
    config: &PoseidonConfig<Fr>,
    leaf: Fr,
    path_elements: &[Fr],
    path_indices: &[bool],
) -> Fr {
    let mut current = leaf;
    for (sibling, is_right) in path_elements.iter().zip(path_indices.iter()) {
        current = if *is_right {
            poseidon::hash(config, &[*sibling, current])
        } else {
            poseidon::hash(config, &[current, *sibling])
        };
    }
    current
}

/// Poseidon Merkle tree, all levels retained for proof extraction.
struct PoseidonMerkleTree {
    levels: Vec<Vec<Fr>>,
}

impl PoseidonMerkleTree {
    fn build(config: &PoseidonConfig<Fr>, leaves: Vec<Fr>) -> Self {
        assert!(!leaves.is_empty(), "tree needs at least one leaf");

        let mut levels = vec![leaves];
        while levels.last().unwrap().len() > 1 {
            let prev = levels.last().unwrap();
            let next: Vec<Fr> = prev
                .chunks(2)
                .map(|pair| {
                    let left = pair[0];
                    // Duplicate if odd
                    let right = *pair.get(1).unwrap_or(&pair[0]);
                    poseidon::hash(config, &[left, right])
                })
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    fn root(&self) -> Fr {
        self.levels.last().unwrap()[0]
    }

    fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    fn proof(&self, leaf_index: usize) -> (Vec<Fr>, Vec<bool>) {
        let mut elements = Vec::with_capacity(self.depth());
        let mut indices = Vec::with_capacity(self.depth());
        let mut index = leaf_index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = index % 2 == 1;
            let sibling_index = if is_right { index - 1 } else { index + 1 };
            // Out-of-range sibling means this node was duplicated
            let sibling = *level.get(sibling_index).unwrap_or(level.last().unwrap());

            elements.push(sibling);
            indices.push(is_right);
            index /= 2;
        }

        (elements, indices)
    }
}

/// KYC 멤버십 레지스트리
pub struct KycRegistry {
    whitelist: Vec<String>,
    poseidon: PoseidonConfig<Fr>,
    tree: RwLock<Option<PoseidonMerkleTree>>,
}

impl KycRegistry {
    pub fn new(whitelist: Vec<String>, poseidon: PoseidonConfig<Fr>) -> Self {
        Self {
            whitelist,
            poseidon,
            tree: RwLock::new(None),
        }
    }

    /// Build the membership tree. Idempotent: a second call is a no-op.
    pub fn init(&self) {
        let mut guard = self.tree.write().unwrap();
        if guard.is_some() {
            return;
        }

        let leaves: Vec<Fr> = self
            .whitelist
            .iter()
            .map(|addr| address_leaf(&self.poseidon, addr))
            .collect();
        let tree = PoseidonMerkleTree::build(&self.poseidon, leaves);

        tracing::info!(
            leaves = self.whitelist.len(),
            depth = tree.depth(),
            "KYC Merkle tree initialized"
        );
        *guard = Some(tree);
    }

    /// Plain set lookup, independent of the tree.
    pub fn is_member(&self, address: &str) -> bool {
        self.whitelist.iter().any(|a| a == address)
    }

    pub fn root(&self) -> Result<Fr, ProverError> {
        let guard = self.tree.read().unwrap();
        guard
            .as_ref()
            .map(|t| t.root())
            .ok_or(ProverError::NotInitialized)
    }

    pub fn depth(&self) -> Result<usize, ProverError> {
        let guard = self.tree.read().unwrap();
        guard
            .as_ref()
            .map(|t| t.depth())
            .ok_or(ProverError::NotInitialized)
    }

    /// Membership proof for an approved address.
    ///
    /// Unapproved addresses get `NotApproved` and no proof material at all;
    /// calls before `init()` fail fast with `NotInitialized`.
    pub fn get_proof(&self, address: &str) -> Result<MerkleProof, ProverError> {
        let guard = self.tree.read().unwrap();
        let tree = guard.as_ref().ok_or(ProverError::NotInitialized)?;

        let leaf_index = self
            .whitelist
            .iter()
            .position(|a| a == address)
            .ok_or(ProverError::NotApproved)?;

        let leaf = address_leaf(&self.poseidon, address);
        let (path_elements, path_indices) = tree.proof(leaf_index);

        Ok(MerkleProof {
            root: tree.root(),
            leaf,
            leaf_index,
            path_elements,
            path_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shieldlend_circuits::poseidon::poseidon_config;

    fn registry(addresses: &[&str]) -> KycRegistry {
        let reg = KycRegistry::new(
            addresses.iter().map(|s| s.to_string()).collect(),
            poseidon_config(),
        );
        reg.init();
        reg
    }

    fn assert_roundtrip(addresses: &[&str]) {
        let config = poseidon_config();
        let reg = registry(addresses);
        let root = reg.root().unwrap();

        for addr in addresses {
            let proof = reg.get_proof(addr).unwrap();
            let folded = fold_path(&config, proof.leaf, &proof.path_elements, &proof.path_indices);
            assert_eq!(folded, root, "path for {} must fold back to the root", addr);
            assert_eq!(proof.root, root);
        }
    }

    #[test]
    fn test_roundtrip_three_leaves() {
        // Odd count: the duplicate-last rule fires at the first level
        assert_roundtrip(&["A", "B", "C"]);
    }

    #[test]
    fn test_roundtrip_five_leaves() {
        assert_roundtrip(&["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_roundtrip_single_leaf() {
        // Depth-zero tree: the leaf is the root
        let reg = registry(&["only"]);
        let proof = reg.get_proof("only").unwrap();
        assert!(proof.path_elements.is_empty());
        assert_eq!(proof.leaf, reg.root().unwrap());
    }

    #[test]
    fn test_non_member_gets_nothing() {
        let reg = registry(&["A", "B", "C"]);
        assert!(!reg.is_member("MALLORY"));
        let err = reg.get_proof("MALLORY").unwrap_err();
        assert!(matches!(err, ProverError::NotApproved));
    }

    #[test]
    fn test_uninitialized_fails_fast() {
        let reg = KycRegistry::new(vec!["A".to_string()], poseidon_config());
        assert!(matches!(
            reg.get_proof("A").unwrap_err(),
            ProverError::NotInitialized
        ));
        assert!(matches!(reg.root().unwrap_err(), ProverError::NotInitialized));
        // is_member works without the tree
        assert!(reg.is_member("A"));
    }

    #[test]
    fn test_init_is_idempotent() {
        let reg = registry(&["A", "B"]);
        let root_before = reg.root().unwrap();
        reg.init();
        assert_eq!(reg.root().unwrap(), root_before);
    }

    #[test]
    fn test_duplicate_last_differs_from_zero_padding() {
        let config = poseidon_config();
        let reg = registry(&["A", "B", "C"]);

        // Recompute the first level by hand with zero padding instead of
        // duplicate-last; the roots must diverge.
        let leaves: Vec<Fr> = ["A", "B", "C"]
            .iter()
            .map(|a| address_leaf(&config, a))
            .collect();
        let l0 = poseidon::hash(&config, &[leaves[0], leaves[1]]);
        let l1_padded = poseidon::hash(&config, &[leaves[2], Fr::from(0u64)]);
        let zero_padded_root = poseidon::hash(&config, &[l0, l1_padded]);

        assert_ne!(reg.root().unwrap(), zero_padded_root);
    }
}

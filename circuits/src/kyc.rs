//! KycProof Circuit
//!
//! Proves that a leaf belongs to the KYC whitelist Merkle tree without
//! revealing which leaf, by folding the private leaf with a private sibling
//! path up to the public root.
//!
//! The registry builds its tree with the duplicate-last rule for odd-sized
//! levels, so path depth is `ceil(log2(n))` for an n-leaf whitelist. Depth is
//! fixed per proving key; the proof generator re-keys when the registry's
//! depth changes.
//!
//! # Circuit Constraints
//! For each level i: `cur = Poseidon(left, right)` where the index bit swaps
//! `(cur, sibling)` into `(left, right)`; final `cur == merkle_root`.
//!
//! # Public signals (allocation order)
//! `[merkle_root]`

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::poseidon;

/// KycProof circuit for a fixed tree depth
#[derive(Clone)]
pub struct KycCircuit {
    pub config: PoseidonConfig<Fr>,
    /// Private: hashed identity leaf
    pub leaf: Option<Fr>,
    /// Private: sibling hash per level, leaf to root
    pub path_elements: Vec<Option<Fr>>,
    /// Private: true when the current node is the right child
    pub path_indices: Vec<Option<bool>>,
    /// Public: whitelist Merkle root
    pub root: Option<Fr>,
}

impl KycCircuit {
    pub fn new(
        config: PoseidonConfig<Fr>,
        leaf: Fr,
        path_elements: Vec<Fr>,
        path_indices: Vec<bool>,
        root: Fr,
    ) -> Self {
        debug_assert_eq!(path_elements.len(), path_indices.len());
        Self {
            config,
            leaf: Some(leaf),
            path_elements: path_elements.into_iter().map(Some).collect(),
            path_indices: path_indices.into_iter().map(Some).collect(),
            root: Some(root),
        }
    }

    /// Create an unassigned circuit of the given depth for key generation
    pub fn blank(config: PoseidonConfig<Fr>, depth: usize) -> Self {
        Self {
            config,
            leaf: None,
            path_elements: vec![None; depth],
            path_indices: vec![None; depth],
            root: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.path_elements.len()
    }
}

impl ConstraintSynthesizer<Fr> for KycCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ======== Allocate Public Inputs ========

        let root_var = FpVar::new_input(cs.clone(), || {
            self.root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Private Inputs ========

        let mut current = FpVar::new_witness(cs.clone(), || {
            self.leaf.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Fold the path ========

        for (element, index) in self.path_elements.iter().zip(self.path_indices.iter()) {
            let sibling = FpVar::new_witness(cs.clone(), || {
                element.ok_or(SynthesisError::AssignmentMissing)
            })?;
            let is_right = Boolean::new_witness(cs.clone(), || {
                index.ok_or(SynthesisError::AssignmentMissing)
            })?;

            // is_right selects whether the current node sits on the right
            let left = FpVar::conditionally_select(&is_right, &sibling, &current)?;
            let right = FpVar::conditionally_select(&is_right, &current, &sibling)?;

            current = poseidon::hash_var(cs.clone(), &self.config, &[left, right])?;
        }

        current.enforce_equal(&root_var)?;

        Ok(())
    }
}

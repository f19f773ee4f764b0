//! DepositProof Circuit
//!
//! Proves knowledge of `(collateral_amount, asset_id, user_secret)` behind a
//! published Poseidon commitment, without revealing any of the three.
//!
//! # Circuit Constraints
//! 1. Range check: collateral_amount in [0, 2^BITS)
//! 2. Commitment: commitment == Poseidon(collateral_amount, asset_id, user_secret)
//!
//! # Public signals (allocation order)
//! `[commitment]`

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::poseidon;

/// Number of bits for range checking amounts
pub const RANGE_BITS: usize = 64;

/// Enforce that `var` fits in `bits` bits via bit decomposition.
pub(crate) fn enforce_bit_width(var: &FpVar<Fr>, bits: usize) -> Result<(), SynthesisError> {
    let decomposed = var.to_bits_le()?;
    for bit in decomposed.iter().skip(bits) {
        bit.enforce_equal(&Boolean::constant(false))?;
    }
    Ok(())
}

/// DepositProof circuit
#[derive(Clone)]
pub struct DepositCircuit {
    pub config: PoseidonConfig<Fr>,
    /// Private: collateral amount in token units
    pub collateral_amount: Option<Fr>,
    /// Private: asset class identifier
    pub asset_id: Option<Fr>,
    /// Private: user secret (blinding)
    pub user_secret: Option<Fr>,
    /// Public: Poseidon commitment
    pub commitment: Option<Fr>,
}

impl DepositCircuit {
    pub fn new(
        config: PoseidonConfig<Fr>,
        collateral_amount: Fr,
        asset_id: Fr,
        user_secret: Fr,
        commitment: Fr,
    ) -> Self {
        Self {
            config,
            collateral_amount: Some(collateral_amount),
            asset_id: Some(asset_id),
            user_secret: Some(user_secret),
            commitment: Some(commitment),
        }
    }

    /// Create an unassigned circuit for key generation
    pub fn blank(config: PoseidonConfig<Fr>) -> Self {
        Self {
            config,
            collateral_amount: None,
            asset_id: None,
            user_secret: None,
            commitment: None,
        }
    }

    /// Compute the deposit commitment the way the circuit does.
    pub fn compute_commitment(
        config: &PoseidonConfig<Fr>,
        collateral_amount: Fr,
        asset_id: Fr,
        user_secret: Fr,
    ) -> Fr {
        poseidon::hash(config, &[collateral_amount, asset_id, user_secret])
    }
}

impl ConstraintSynthesizer<Fr> for DepositCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ======== Allocate Private Inputs ========

        let amount_var = FpVar::new_witness(cs.clone(), || {
            self.collateral_amount.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let asset_var = FpVar::new_witness(cs.clone(), || {
            self.asset_id.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.user_secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs ========

        let commitment_var = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Constraint 1: Range Check ========

        enforce_bit_width(&amount_var, RANGE_BITS)?;

        // ======== Constraint 2: Commitment Verification ========

        let computed = poseidon::hash_var(
            cs,
            &self.config,
            &[amount_var, asset_var, secret_var],
        )?;
        computed.enforce_equal(&commitment_var)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poseidon::poseidon_config;
    use ark_relations::r1cs::ConstraintSystem;

    fn test_circuit(amount: u64, asset_id: u64, secret: u64, commitment: Fr) -> bool {
        let config = poseidon_config();
        let circuit = DepositCircuit::new(
            config,
            Fr::from(amount),
            Fr::from(asset_id),
            Fr::from(secret),
            commitment,
        );

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_valid_deposit() {
        let config = poseidon_config();
        let commitment = DepositCircuit::compute_commitment(
            &config,
            Fr::from(1_000_000u64),
            Fr::from(1u64),
            Fr::from(987654321u64),
        );
        assert!(test_circuit(1_000_000, 1, 987654321, commitment));
    }

    #[test]
    fn test_wrong_commitment() {
        assert!(!test_circuit(1_000_000, 1, 987654321, Fr::from(1u64)));
    }

    #[test]
    fn test_wrong_secret() {
        let config = poseidon_config();
        let commitment = DepositCircuit::compute_commitment(
            &config,
            Fr::from(1_000_000u64),
            Fr::from(1u64),
            Fr::from(987654321u64),
        );
        // Different secret must not open the same commitment
        assert!(!test_circuit(1_000_000, 1, 11111, commitment));
    }

    #[test]
    fn test_groth16_proof() {
        use ark_bn254::Bn254;
        use ark_groth16::Groth16;
        use ark_snark::SNARK;
        use rand::thread_rng;

        let mut rng = thread_rng();
        let config = poseidon_config();

        let amount = Fr::from(500_000u64);
        let asset_id = Fr::from(3u64);
        let secret = Fr::from(424242u64);
        let commitment = DepositCircuit::compute_commitment(&config, amount, asset_id, secret);

        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(
            DepositCircuit::blank(config.clone()),
            &mut rng,
        )
        .unwrap();

        let circuit = DepositCircuit::new(config, amount, asset_id, secret, commitment);
        let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

        let valid = Groth16::<Bn254>::verify(&vk, &[commitment], &proof).unwrap();
        assert!(valid, "Groth16 deposit proof should be valid");
    }
}

//! Circuit-native Poseidon hash over the BN254 scalar field.
//!
//! Every commitment, Merkle node and signature challenge in the protocol is
//! a Poseidon digest, so the native hash here and the in-circuit gadget must
//! agree bit for bit. Both sides share one [`PoseidonConfig`] and absorb
//! inputs in identical order.
//!
//! # Design Decision
//!
//! Poseidon instead of SHA256/Keccak inside the circuit:
//! - SHA256: ~25,000 constraints per invocation
//! - Poseidon: a few hundred constraints
//! Rate 2 / capacity 1 sponge, alpha = 5, 8 full + 57 partial rounds.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

const RATE: usize = 2;
const CAPACITY: usize = 1;
const FULL_ROUNDS: usize = 8;
const PARTIAL_ROUNDS: usize = 57;
const ALPHA: u64 = 5;

/// Build the shared Poseidon configuration.
///
/// Deriving the round constants is not free, so callers construct the config
/// once and pass it by reference (circuits carry a clone).
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        Fr::MODULUS_BIT_SIZE as u64,
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );
    PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
}

/// Native Poseidon hash of an arbitrary-arity input list.
pub fn hash(config: &PoseidonConfig<Fr>, inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(config);
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_native_field_elements(1)[0]
}

/// In-circuit Poseidon hash. Must absorb in the same order as [`hash`].
pub fn hash_var(
    cs: ConstraintSystemRef<Fr>,
    config: &PoseidonConfig<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, config);
    for input in inputs {
        sponge.absorb(input)?;
    }
    let mut out = sponge.squeeze_field_elements(1)?;
    Ok(out.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_hash_deterministic() {
        let config = poseidon_config();
        let a = hash(&config, &[Fr::from(1u64), Fr::from(2u64)]);
        let b = hash(&config, &[Fr::from(1u64), Fr::from(2u64)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_input_sensitive() {
        let config = poseidon_config();
        let a = hash(&config, &[Fr::from(1u64), Fr::from(2u64)]);
        let b = hash(&config, &[Fr::from(2u64), Fr::from(1u64)]);
        assert_ne!(a, b, "Poseidon must be order-sensitive");
    }

    #[test]
    fn test_gadget_matches_native() {
        let config = poseidon_config();
        let inputs = [Fr::from(42u64), Fr::from(7u64), Fr::from(100u64)];
        let expected = hash(&config, &inputs);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<FpVar<Fr>> = inputs
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let out = hash_var(cs.clone(), &config, &vars).unwrap();

        assert_eq!(out.value().unwrap(), expected);
        assert!(cs.is_satisfied().unwrap());
    }
}

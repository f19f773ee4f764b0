//! EdDSA over Baby Jubjub with Poseidon as the challenge hash.
//!
//! The oracle signs price digests natively with this scheme and the Loan
//! circuit re-verifies the same signature inside R1CS, so both sides must
//! implement the identical equation:
//!
//! ```text
//! S·B == R8 + Poseidon(R8.x, R8.y, A.x, A.y, M)·A
//! ```
//!
//! Baby Jubjub is the twisted Edwards curve embedded in the BN254 scalar
//! field, which is exactly what lets curve arithmetic be expressed as circuit
//! constraints over the proof field.
//!
//! Signing is deterministic: the nonce is Keccak256(secret || message) reduced
//! into the Baby Jubjub scalar field. The same (message, key) pair always
//! yields the same signature and there is no randomness-reuse hazard.

use ark_bn254::Fr as BnFr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ec::twisted_edwards::TECurveConfig;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsConfig, EdwardsProjective, Fr as JubFr};
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::groups::CurveVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use sha3::{Digest, Keccak256};

use crate::poseidon;

/// EdDSA signature: a curve point R8 and a scalar S.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub r8: EdwardsAffine,
    pub s: JubFr,
}

impl Signature {
    /// S embedded into the BN254 scalar field.
    ///
    /// The Baby Jubjub scalar field is strictly smaller than BN254's, so the
    /// embedding is injective and the circuit can treat S as a field element.
    pub fn s_as_base_field(&self) -> BnFr {
        BnFr::from_le_bytes_mod_order(&self.s.into_bigint().to_bytes_le())
    }
}

/// Oracle signing key. Explicitly constructed and owned by its holder; there
/// is no module-level key state.
#[derive(Clone)]
pub struct SigningKey {
    secret: JubFr,
    public: EdwardsAffine,
}

impl SigningKey {
    /// Derive a keypair from a seed. The seed is hashed so any byte string
    /// of sufficient entropy works; a fixed seed gives a fixed key.
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = Keccak256::digest(seed);
        let secret = JubFr::from_le_bytes_mod_order(&digest);
        let public = (EdwardsAffine::generator() * secret).into_affine();
        Self { secret, public }
    }

    pub fn public_key(&self) -> EdwardsAffine {
        self.public
    }

    /// Sign a message that is already a BN254 field element (a Poseidon
    /// digest in this protocol).
    pub fn sign(&self, config: &PoseidonConfig<BnFr>, message: BnFr) -> Signature {
        // Deterministic nonce: r = Keccak256(secret || message) mod subgroup order
        let mut hasher = Keccak256::new();
        hasher.update(self.secret.into_bigint().to_bytes_le());
        hasher.update(message.into_bigint().to_bytes_be());
        let r = JubFr::from_le_bytes_mod_order(&hasher.finalize());

        let r8 = (EdwardsAffine::generator() * r).into_affine();
        let h = challenge(config, &r8, &self.public, message);
        let s = r + h * self.secret;

        Signature { r8, s }
    }
}

/// Native signature verification: S·B == R8 + h·A.
pub fn verify(
    config: &PoseidonConfig<BnFr>,
    public_key: &EdwardsAffine,
    message: BnFr,
    signature: &Signature,
) -> bool {
    if signature.r8.is_zero() || public_key.is_zero() {
        return false;
    }
    let h = challenge(config, &signature.r8, public_key, message);
    let lhs = EdwardsAffine::generator() * signature.s;
    let rhs = EdwardsProjective::from(signature.r8) + *public_key * h;
    lhs.into_affine() == rhs.into_affine()
}

/// Challenge scalar h = Poseidon(R8.x, R8.y, A.x, A.y, M), reduced into the
/// Baby Jubjub scalar field.
///
/// The circuit multiplies by the unreduced 254-bit digest; since A and R8 lie
/// in the prime-order subgroup the two multiplications agree.
fn challenge(
    config: &PoseidonConfig<BnFr>,
    r8: &EdwardsAffine,
    public_key: &EdwardsAffine,
    message: BnFr,
) -> JubFr {
    let digest = poseidon::hash(
        config,
        &[r8.x, r8.y, public_key.x, public_key.y, message],
    );
    JubFr::from_le_bytes_mod_order(&digest.into_bigint().to_bytes_le())
}

/// Enforce that (x, y) is a point on Baby Jubjub: a·x² + y² = 1 + d·x²·y².
///
/// `AffineVar::new` does not add the curve equation, and the signature
/// components arrive as raw public field elements, so the check is explicit.
fn enforce_on_curve(x: &FpVar<BnFr>, y: &FpVar<BnFr>) -> Result<(), SynthesisError> {
    let a = FpVar::constant(<EdwardsConfig as TECurveConfig>::COEFF_A);
    let d = FpVar::constant(<EdwardsConfig as TECurveConfig>::COEFF_D);
    let x2 = x * x;
    let y2 = y * y;
    let lhs = &a * &x2 + &y2;
    let rhs = FpVar::one() + &d * &x2 * &y2;
    lhs.enforce_equal(&rhs)
}

/// In-circuit EdDSA verification over already-allocated field variables.
///
/// The caller decides which of the inputs are public; the Loan circuit
/// exposes all five signature/key components as public signals.
pub fn enforce_signature(
    cs: ConstraintSystemRef<BnFr>,
    config: &PoseidonConfig<BnFr>,
    message: &FpVar<BnFr>,
    r8x: &FpVar<BnFr>,
    r8y: &FpVar<BnFr>,
    s: &FpVar<BnFr>,
    pubkey_x: &FpVar<BnFr>,
    pubkey_y: &FpVar<BnFr>,
) -> Result<(), SynthesisError> {
    enforce_on_curve(r8x, r8y)?;
    enforce_on_curve(pubkey_x, pubkey_y)?;

    let r8 = EdwardsVar::new(r8x.clone(), r8y.clone());
    let pubkey = EdwardsVar::new(pubkey_x.clone(), pubkey_y.clone());

    let h = poseidon::hash_var(
        cs,
        config,
        &[
            r8x.clone(),
            r8y.clone(),
            pubkey_x.clone(),
            pubkey_y.clone(),
            message.clone(),
        ],
    )?;
    let h_bits = h.to_bits_le()?;
    let s_bits = s.to_bits_le()?;

    let base = EdwardsVar::constant(EdwardsProjective::from(EdwardsAffine::generator()));
    let lhs = base.scalar_mul_le(s_bits.iter())?;
    let rhs = r8 + pubkey.scalar_mul_le(h_bits.iter())?;

    lhs.enforce_equal(&rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poseidon::poseidon_config;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    fn test_key() -> SigningKey {
        SigningKey::from_seed(&[7u8; 32])
    }

    #[test]
    fn test_sign_verify() {
        let config = poseidon_config();
        let key = test_key();
        let msg = poseidon::hash(&config, &[BnFr::from(9850u64)]);

        let sig = key.sign(&config, msg);
        assert!(verify(&config, &key.public_key(), msg, &sig));
    }

    #[test]
    fn test_deterministic_signature() {
        let config = poseidon_config();
        let key = test_key();
        let msg = BnFr::from(100u64);

        let s1 = key.sign(&config, msg);
        let s2 = key.sign(&config, msg);
        assert_eq!(s1, s2, "same message and key must sign identically");
        assert!(verify(&config, &key.public_key(), msg, &s1));
        assert!(verify(&config, &key.public_key(), msg, &s2));
    }

    #[test]
    fn test_wrong_message_rejected() {
        let config = poseidon_config();
        let key = test_key();

        let sig = key.sign(&config, BnFr::from(100u64));
        assert!(!verify(&config, &key.public_key(), BnFr::from(101u64), &sig));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let config = poseidon_config();
        let key = test_key();
        let other = SigningKey::from_seed(&[8u8; 32]);
        let msg = BnFr::from(100u64);

        let sig = key.sign(&config, msg);
        assert!(!verify(&config, &other.public_key(), msg, &sig));
    }

    fn gadget_accepts(msg: BnFr, sig: &Signature, pk: &EdwardsAffine) -> bool {
        let config = poseidon_config();
        let cs = ConstraintSystem::<BnFr>::new_ref();

        let msg_var = FpVar::new_witness(cs.clone(), || Ok(msg)).unwrap();
        let r8x = FpVar::new_witness(cs.clone(), || Ok(sig.r8.x)).unwrap();
        let r8y = FpVar::new_witness(cs.clone(), || Ok(sig.r8.y)).unwrap();
        let s = FpVar::new_witness(cs.clone(), || Ok(sig.s_as_base_field())).unwrap();
        let px = FpVar::new_witness(cs.clone(), || Ok(pk.x)).unwrap();
        let py = FpVar::new_witness(cs.clone(), || Ok(pk.y)).unwrap();

        enforce_signature(cs.clone(), &config, &msg_var, &r8x, &r8y, &s, &px, &py).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_gadget_accepts_valid_signature() {
        let config = poseidon_config();
        let key = test_key();
        let msg = poseidon::hash(&config, &[BnFr::from(102u64)]);
        let sig = key.sign(&config, msg);

        assert!(gadget_accepts(msg, &sig, &key.public_key()));
    }

    #[test]
    fn test_gadget_rejects_tampered_signature() {
        let config = poseidon_config();
        let key = test_key();
        let msg = poseidon::hash(&config, &[BnFr::from(102u64)]);
        let mut sig = key.sign(&config, msg);
        sig.s += JubFr::from(1u64);

        assert!(!gadget_accepts(msg, &sig, &key.public_key()));
    }
}

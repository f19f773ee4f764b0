//! Proof Wire Codec
//!
//! Fixed-width byte encoding for proofs and public signals, shaped for
//! on-chain verifier calldata:
//!
//! - Proof: 256 bytes, eight 32-byte big-endian words in the order
//!   `A.x, A.y, B.x.c1, B.x.c0, B.y.c1, B.y.c0, C.x, C.y`. The G2 limbs go
//!   imaginary-before-real, matching the EVM pairing precompile.
//! - Public signals: one 32-byte big-endian word per signal, left-padded.
//!
//! Decoding is strict: wrong length, an out-of-range field element, a point
//! off the curve, or a point outside the prime-order subgroup all fail with
//! [`ProverError::InvalidEncoding`]. The point at infinity has no encoding
//! here and is rejected in both directions.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::Proof;

use crate::error::ProverError;

/// Encoded proof size in bytes.
pub const PROOF_LEN: usize = 256;
/// One encoded field element.
pub const WORD_LEN: usize = 32;

/// Serialize a proof into the 256-byte calldata layout.
pub fn encode_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ProverError> {
    if proof.a.is_zero() || proof.b.is_zero() || proof.c.is_zero() {
        return Err(ProverError::InvalidEncoding(
            "proof contains a point at infinity".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(PROOF_LEN);
    push_fq(&mut out, &proof.a.x);
    push_fq(&mut out, &proof.a.y);
    // G2 coordinates: imaginary limb first
    push_fq(&mut out, &proof.b.x.c1);
    push_fq(&mut out, &proof.b.x.c0);
    push_fq(&mut out, &proof.b.y.c1);
    push_fq(&mut out, &proof.b.y.c0);
    push_fq(&mut out, &proof.c.x);
    push_fq(&mut out, &proof.c.y);
    debug_assert_eq!(out.len(), PROOF_LEN);
    Ok(out)
}

/// Parse and fully validate a 256-byte proof encoding.
pub fn decode_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProverError> {
    if bytes.len() != PROOF_LEN {
        return Err(ProverError::InvalidEncoding(format!(
            "proof must be {PROOF_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let word = |i: usize| &bytes[i * WORD_LEN..(i + 1) * WORD_LEN];

    let a = decode_g1(read_fq(word(0))?, read_fq(word(1))?)?;
    let b = decode_g2(
        Fq2::new(read_fq(word(3))?, read_fq(word(2))?),
        Fq2::new(read_fq(word(5))?, read_fq(word(4))?),
    )?;
    let c = decode_g1(read_fq(word(6))?, read_fq(word(7))?)?;

    Ok(Proof { a, b, c })
}

/// Serialize public signals as consecutive 32-byte big-endian words.
pub fn encode_signals(signals: &[Fr]) -> Vec<u8> {
    let mut out = Vec::with_capacity(signals.len() * WORD_LEN);
    for s in signals {
        out.extend_from_slice(&s.into_bigint().to_bytes_be());
    }
    out
}

/// Parse a signal blob; every word must be a canonical scalar.
pub fn decode_signals(bytes: &[u8]) -> Result<Vec<Fr>, ProverError> {
    if bytes.len() % WORD_LEN != 0 {
        return Err(ProverError::InvalidEncoding(format!(
            "signal blob length {} is not a multiple of {WORD_LEN}",
            bytes.len()
        )));
    }
    bytes.chunks_exact(WORD_LEN).map(read_fr).collect()
}

fn push_fq(out: &mut Vec<u8>, x: &Fq) {
    out.extend_from_slice(&x.into_bigint().to_bytes_be());
}

fn read_fq(word: &[u8]) -> Result<Fq, ProverError> {
    if word >= Fq::MODULUS.to_bytes_be().as_slice() {
        return Err(ProverError::InvalidEncoding(
            "coordinate exceeds the base field modulus".to_string(),
        ));
    }
    Ok(Fq::from_be_bytes_mod_order(word))
}

fn read_fr(word: &[u8]) -> Result<Fr, ProverError> {
    if word >= Fr::MODULUS.to_bytes_be().as_slice() {
        return Err(ProverError::InvalidEncoding(
            "public signal exceeds the scalar field modulus".to_string(),
        ));
    }
    Ok(Fr::from_be_bytes_mod_order(word))
}

fn decode_g1(x: Fq, y: Fq) -> Result<G1Affine, ProverError> {
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProverError::InvalidEncoding(
            "G1 point is not on the curve".to_string(),
        ));
    }
    Ok(p)
}

fn decode_g2(x: Fq2, y: Fq2) -> Result<G2Affine, ProverError> {
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProverError::InvalidEncoding(
            "G2 point is not on the curve or not in the prime-order subgroup".to_string(),
        ));
    }
    Ok(p)
}

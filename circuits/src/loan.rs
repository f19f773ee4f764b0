//! LoanProof Circuit
//!
//! Proves, against a previously published deposit commitment and a signed
//! oracle price, that a requested loan is sufficiently collateralized:
//!
//! ```text
//! collateral_amount * collateral_price >= loan_amount * min_ratio / 100
//! ```
//!
//! The oracle price arrives pre-scaled by 100 (cents), which cancels the
//! division: with `price_scaled = price * 100` the relation becomes
//! `collateral_amount * price_scaled >= loan_amount * min_ratio` and no
//! division appears in the field.
//!
//! There is no boolean validity output. A witness that violates any
//! constraint simply cannot produce a proof; non-generation is the protocol's
//! rejection signal.
//!
//! # Circuit Constraints
//! 1. Range checks: amount, loan, price, ratio in [0, 2^RANGE_BITS)
//! 2. Collateralization: collateral_amount * price_scaled >= loan_amount * min_ratio
//! 3. Commitment: commitment == Poseidon(collateral_amount, asset_id, deposit_secret)
//! 4. Oracle signature: EdDSA-Poseidon over M = Poseidon(price_scaled) verifies
//!    against the embedded public key
//!
//! # Public signals (allocation order is a fixed contract with the wire codec)
//! `[loan_amount_usd, min_collateral_ratio, price_scaled, sig_r8x, sig_r8y,
//!   sig_s, pubkey_x, pubkey_y, commitment]`

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::deposit::{enforce_bit_width, RANGE_BITS};
use crate::{eddsa, poseidon};

/// LoanProof circuit
#[derive(Clone)]
pub struct LoanCircuit {
    pub config: PoseidonConfig<Fr>,
    /// Private: collateral amount in token units
    pub collateral_amount: Option<Fr>,
    /// Private: asset class identifier (bound into the commitment)
    pub asset_id: Option<Fr>,
    /// Private: deposit secret
    pub deposit_secret: Option<Fr>,
    /// Public: requested loan in USD
    pub loan_amount_usd: Option<Fr>,
    /// Public: minimum collateral ratio in percent (policy constant, e.g. 150)
    pub min_collateral_ratio: Option<Fr>,
    /// Public: oracle price, fixed-point cents
    pub price_scaled: Option<Fr>,
    /// Public: oracle signature R8 point
    pub sig_r8x: Option<Fr>,
    pub sig_r8y: Option<Fr>,
    /// Public: oracle signature scalar S (embedded in the proof field)
    pub sig_s: Option<Fr>,
    /// Public: oracle public key
    pub pubkey_x: Option<Fr>,
    pub pubkey_y: Option<Fr>,
    /// Public: deposit commitment the witness must open
    pub commitment: Option<Fr>,
}

impl LoanCircuit {
    /// Create an unassigned circuit for key generation
    pub fn blank(config: PoseidonConfig<Fr>) -> Self {
        Self {
            config,
            collateral_amount: None,
            asset_id: None,
            deposit_secret: None,
            loan_amount_usd: None,
            min_collateral_ratio: None,
            price_scaled: None,
            sig_r8x: None,
            sig_r8y: None,
            sig_s: None,
            pubkey_x: None,
            pubkey_y: None,
            commitment: None,
        }
    }

    /// Public signals in allocation order. Panics if the circuit is blank,
    /// so only call on fully assigned instances.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            self.loan_amount_usd.expect("assigned circuit"),
            self.min_collateral_ratio.expect("assigned circuit"),
            self.price_scaled.expect("assigned circuit"),
            self.sig_r8x.expect("assigned circuit"),
            self.sig_r8y.expect("assigned circuit"),
            self.sig_s.expect("assigned circuit"),
            self.pubkey_x.expect("assigned circuit"),
            self.pubkey_y.expect("assigned circuit"),
            self.commitment.expect("assigned circuit"),
        ]
    }
}

impl ConstraintSynthesizer<Fr> for LoanCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ======== Allocate Private Inputs ========

        let collateral_var = FpVar::new_witness(cs.clone(), || {
            self.collateral_amount.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let asset_var = FpVar::new_witness(cs.clone(), || {
            self.asset_id.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.deposit_secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs (order is the signal contract) ========

        let loan_var = FpVar::new_input(cs.clone(), || {
            self.loan_amount_usd.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let ratio_var = FpVar::new_input(cs.clone(), || {
            self.min_collateral_ratio.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let price_var = FpVar::new_input(cs.clone(), || {
            self.price_scaled.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let r8x_var = FpVar::new_input(cs.clone(), || {
            self.sig_r8x.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let r8y_var = FpVar::new_input(cs.clone(), || {
            self.sig_r8y.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let s_var = FpVar::new_input(cs.clone(), || {
            self.sig_s.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let pubkey_x_var = FpVar::new_input(cs.clone(), || {
            self.pubkey_x.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let pubkey_y_var = FpVar::new_input(cs.clone(), || {
            self.pubkey_y.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let commitment_var = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Constraint 1: Range Checks ========
        // Bounding every factor to 64 bits keeps both products under 2^128,
        // far from the field modulus, so the comparison below is sound.

        enforce_bit_width(&collateral_var, RANGE_BITS)?;
        enforce_bit_width(&loan_var, RANGE_BITS)?;
        enforce_bit_width(&price_var, RANGE_BITS)?;
        enforce_bit_width(&ratio_var, RANGE_BITS)?;

        // ======== Constraint 2: Collateralization ========
        // collateral * price_scaled - loan * min_ratio >= 0
        //
        // Both products are under 2^128, so a non-negative difference fits in
        // 2 * RANGE_BITS bits. A negative difference wraps around the ~254-bit
        // field and fails the width check.

        let lhs = &collateral_var * &price_var;
        let rhs = &loan_var * &ratio_var;
        let diff = &lhs - &rhs;

        enforce_bit_width(&diff, 2 * RANGE_BITS)?;

        // ======== Constraint 3: Commitment Verification ========

        let computed_commitment = poseidon::hash_var(
            cs.clone(),
            &self.config,
            &[collateral_var, asset_var, secret_var],
        )?;
        computed_commitment.enforce_equal(&commitment_var)?;

        // ======== Constraint 4: Oracle Signature ========
        // The signed message is the Poseidon digest of the scaled price.

        let message_var = poseidon::hash_var(cs.clone(), &self.config, &[price_var])?;
        eddsa::enforce_signature(
            cs,
            &self.config,
            &message_var,
            &r8x_var,
            &r8y_var,
            &s_var,
            &pubkey_x_var,
            &pubkey_y_var,
        )?;

        Ok(())
    }
}

//! ShieldLend R1CS circuits
//!
//! Groth16 constraint systems for the privacy-preserving lending protocol,
//! over BN254 with Baby Jubjub as the embedded signature curve.
//!
//! # Available Circuits
//!
//! | Circuit | Proves | Public signals |
//! |---------|--------|----------------|
//! | DepositCircuit | knowledge of a commitment opening | `[commitment]` |
//! | LoanCircuit | collateralization + oracle signature + commitment | 9 signals, see module docs |
//! | KycCircuit | Merkle membership of a whitelist leaf | `[merkle_root]` |
//!
//! The shared primitives live alongside the circuits because they must match
//! their in-circuit counterparts exactly: [`poseidon`] is the commitment and
//! Merkle hash, [`eddsa`] the oracle signature scheme.

pub mod deposit;
pub mod eddsa;
pub mod kyc;
pub mod loan;
pub mod poseidon;

pub use deposit::DepositCircuit;
pub use kyc::KycCircuit;
pub use loan::LoanCircuit;

//! Error Handling Module
//!
//! Typed domain errors with thiserror, integrated with tracing.
//!
//! # Design Decision
//!
//! The taxonomy separates three classes with different disclosure rules:
//! - Input validation errors carry descriptive messages; they are rejected
//!   before any witness exists.
//! - Infrastructure errors (missing proving key, setup failures) are verbose
//!   because they carry no private information.
//! - Constraint violations collapse into the single payload-free
//!   [`ProverError::ProofGenerationFailed`]. Which constraint failed is
//!   deliberately not reported: any hint about why a loan proof did not
//!   generate could leak collateral-ratio information.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProverError {
    // ============ Input validation ============
    #[error("Unknown asset id: {0}")]
    AssetNotFound(u32),

    #[error("Address is not KYC approved")]
    NotApproved,

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    // ============ Readiness / policy ============
    #[error("KYC registry not initialized")]
    NotInitialized,

    #[error("Oracle attestation is older than the configured freshness window")]
    StaleAttestation,

    // ============ Infrastructure ============
    #[error("Missing proving artifact: {0}")]
    MissingArtifact(String),

    #[error("Malformed proof encoding: {0}")]
    InvalidEncoding(String),

    // ============ Constraint violations (opaque by design) ============
    /// Carries no witness-derived detail. Callers must not attempt to infer
    /// the cause; the absence of a proof is the whole signal.
    #[error("Proof generation failed")]
    ProofGenerationFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failure_is_opaque() {
        let msg = ProverError::ProofGenerationFailed.to_string();
        assert_eq!(msg, "Proof generation failed");
    }

    #[test]
    fn test_validation_errors_are_descriptive() {
        let msg = ProverError::AssetNotFound(42).to_string();
        assert!(msg.contains("42"));
    }
}

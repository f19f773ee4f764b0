//! Common Types Module
//!
//! 외부 소비자(클라이언트, 체인 릴레이어)와 주고받는 직렬화 타입 정의

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::services::{MerkleProof, PriceAttestation, ProofBundle};

/// `0x`-prefixed, 64-digit big-endian hex for a field element.
pub fn fr_to_hex(value: &Fr) -> String {
    format!("0x{}", hex::encode(value.into_bigint().to_bytes_be()))
}

/// EdDSA 서명 (필드 원소 hex 표현)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureDto {
    pub r8x: String,
    pub r8y: String,
    pub s: String,
}

/// Oracle 공개키
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubkeyDto {
    pub x: String,
    pub y: String,
}

/// 서명된 가격 attestation 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationResponse {
    pub asset_id: u32,
    pub price: f64,
    pub price_scaled: u64,
    pub timestamp_ms: u64,
    pub signature: SignatureDto,
    pub pubkey: PubkeyDto,
}

impl AttestationResponse {
    pub fn from_attestation(attestation: &PriceAttestation) -> Self {
        let (r8x, r8y, s) = attestation.signature_fields();
        let (ax, ay) = attestation.pubkey_fields();
        Self {
            asset_id: attestation.asset_id,
            price: attestation.price,
            price_scaled: attestation.price_scaled,
            timestamp_ms: attestation.timestamp_ms,
            signature: SignatureDto {
                r8x: fr_to_hex(&r8x),
                r8y: fr_to_hex(&r8y),
                s: fr_to_hex(&s),
            },
            pubkey: PubkeyDto {
                x: fr_to_hex(&ax),
                y: fr_to_hex(&ay),
            },
        }
    }
}

/// KYC 멤버십 체크 응답
///
/// A negative answer carries only the boolean: it must not reveal the
/// registry contents or why the address is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycCheckResponse {
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_elements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_indices: Option<Vec<bool>>,
}

impl KycCheckResponse {
    pub fn approved(proof: &MerkleProof) -> Self {
        Self {
            approved: true,
            root: Some(fr_to_hex(&proof.root)),
            path_elements: Some(proof.path_elements.iter().map(fr_to_hex).collect()),
            path_indices: Some(proof.path_indices.clone()),
        }
    }

    pub fn denied() -> Self {
        Self {
            approved: false,
            root: None,
            path_elements: None,
            path_indices: None,
        }
    }
}

/// 증명 응답: 고정폭 인코딩의 hex 표현
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofResponse {
    /// 256-byte proof blob, hex encoded
    pub proof: String,
    pub public_signals: Vec<String>,
}

impl ProofResponse {
    pub fn from_bundle(bundle: &ProofBundle) -> Result<Self, crate::error::ProverError> {
        let proof = hex::encode(codec::encode_proof(&bundle.proof)?);
        let public_signals = bundle.public_signals.iter().map(|s| fr_to_hex(s)).collect();
        Ok(Self {
            proof: format!("0x{proof}"),
            public_signals,
        })
    }
}

/// 포지션 수명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    Deposited,
    CollateralVerified,
    Borrowed,
    Repaid,
    Liquidated,
}

impl PositionState {
    /// Legal lifecycle moves. Everything else is rejected by the caller.
    pub fn can_transition_to(self, next: PositionState) -> bool {
        use PositionState::*;
        matches!(
            (self, next),
            (Deposited, CollateralVerified)
                | (CollateralVerified, Borrowed)
                | (Borrowed, Repaid)
                | (Borrowed, Liquidated)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, PositionState::Repaid | PositionState::Liquidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fr_to_hex_left_padded() {
        assert_eq!(
            fr_to_hex(&Fr::from(255u64)),
            format!("0x{}ff", "0".repeat(62))
        );
    }

    #[test]
    fn test_position_lifecycle() {
        use PositionState::*;
        assert!(Deposited.can_transition_to(CollateralVerified));
        assert!(CollateralVerified.can_transition_to(Borrowed));
        assert!(Borrowed.can_transition_to(Repaid));
        assert!(Borrowed.can_transition_to(Liquidated));

        // no shortcuts, no resurrection
        assert!(!Deposited.can_transition_to(Borrowed));
        assert!(!Repaid.can_transition_to(Borrowed));
        assert!(!Liquidated.can_transition_to(Deposited));
        assert!(Repaid.is_terminal());
        assert!(Liquidated.is_terminal());
    }

    #[test]
    fn test_denied_kyc_response_leaks_nothing() {
        let json = serde_json::to_string(&KycCheckResponse::denied()).unwrap();
        assert_eq!(json, "{\"approved\":false}");
    }

    #[test]
    fn test_position_state_serde() {
        let json = serde_json::to_string(&PositionState::CollateralVerified).unwrap();
        assert_eq!(json, "\"collateral_verified\"");
    }
}

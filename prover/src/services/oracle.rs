//! Oracle Signer Service
//!
//! Produces timestamped, EdDSA-signed price attestations usable as public
//! circuit inputs. The signer is an explicitly constructed value owning its
//! keypair and its feed registry; nothing here is module-level state.
//!
//! The signed message is `Poseidon(price_scaled)`, exactly the digest the
//! Loan circuit recomputes and verifies in-constraints, so an attestation is
//! consumable as witness material without reshaping.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ed_on_bn254::EdwardsAffine;
use chrono::Utc;

use shieldlend_circuits::eddsa::{self, Signature, SigningKey};
use shieldlend_circuits::poseidon;

use crate::error::ProverError;
use crate::services::feeds::FeedRegistry;

/// Fixed-point scale applied to raw prices: two decimal places (cents).
/// Field elements are integers, so $98.50 enters the circuit as 9850.
pub const PRICE_SCALE: f64 = 100.0;

/// A signed price attestation.
///
/// Not persisted; generated on demand per request. Freshness is a policy
/// decision enforced by the proof generator, not by the circuit.
#[derive(Debug, Clone)]
pub struct PriceAttestation {
    pub asset_id: u32,
    /// Raw price in USD
    pub price: f64,
    /// Fixed-point price (cents), the value actually signed and proven
    pub price_scaled: u64,
    /// Wall-clock marker, informational only
    pub timestamp_ms: u64,
    pub signature: Signature,
    pub pubkey: EdwardsAffine,
}

impl PriceAttestation {
    /// Signature components as proof-field elements: (R8x, R8y, S).
    pub fn signature_fields(&self) -> (Fr, Fr, Fr) {
        (
            self.signature.r8.x,
            self.signature.r8.y,
            self.signature.s_as_base_field(),
        )
    }

    /// Oracle public key as proof-field elements: (Ax, Ay).
    pub fn pubkey_fields(&self) -> (Fr, Fr) {
        (self.pubkey.x, self.pubkey.y)
    }

    /// The signed message digest: Poseidon(price_scaled).
    pub fn message(&self, config: &PoseidonConfig<Fr>) -> Fr {
        poseidon::hash(config, &[Fr::from(self.price_scaled)])
    }
}

/// 가격 오라클 서명 서비스
pub struct OracleSigner {
    key: SigningKey,
    poseidon: PoseidonConfig<Fr>,
    feeds: FeedRegistry,
}

impl OracleSigner {
    pub fn new(seed: &[u8], poseidon: PoseidonConfig<Fr>, feeds: FeedRegistry) -> Self {
        Self {
            key: SigningKey::from_seed(seed),
            poseidon,
            feeds,
        }
    }

    pub fn public_key(&self) -> EdwardsAffine {
        self.key.public_key()
    }

    /// Produce a signed attestation for the asset.
    ///
    /// Unknown asset ids fail with `AssetNotFound`; feed failures degrade to
    /// the configured fallback inside the registry and never surface here.
    pub async fn get_price(&self, asset_id: u32) -> Result<PriceAttestation, ProverError> {
        let price = self.feeds.resolve_price(asset_id).await?;
        let price_scaled = (price * PRICE_SCALE).round() as u64;

        let message = poseidon::hash(&self.poseidon, &[Fr::from(price_scaled)]);
        let signature = self.key.sign(&self.poseidon, message);

        tracing::info!(asset_id, price, price_scaled, "price attestation signed");

        Ok(PriceAttestation {
            asset_id,
            price,
            price_scaled,
            timestamp_ms: Utc::now().timestamp_millis() as u64,
            signature,
            pubkey: self.key.public_key(),
        })
    }

    /// Check an attestation against this signer's key. Attestation contents
    /// are public, so a failure here is safe to report verbosely.
    pub fn verify_attestation(&self, attestation: &PriceAttestation) -> bool {
        let message = attestation.message(&self.poseidon);
        eddsa::verify(
            &self.poseidon,
            &attestation.pubkey,
            message,
            &attestation.signature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::feeds::StaticFeed;
    use shieldlend_circuits::poseidon::poseidon_config;

    fn test_signer() -> OracleSigner {
        let seed = hex::decode("0001020304050607080900010203040506070809000102030405060708090001")
            .unwrap();
        OracleSigner::new(
            &seed,
            poseidon_config(),
            FeedRegistry::new(Box::new(StaticFeed)),
        )
    }

    #[tokio::test]
    async fn test_attestation_verifies() {
        let signer = test_signer();
        let attestation = signer.get_price(3).await.unwrap();

        assert_eq!(attestation.price, 100.00);
        assert_eq!(attestation.price_scaled, 10_000);
        assert!(signer.verify_attestation(&attestation));
    }

    #[tokio::test]
    async fn test_signing_is_deterministic() {
        let signer = test_signer();
        let a1 = signer.get_price(3).await.unwrap();
        let a2 = signer.get_price(3).await.unwrap();

        // Static feed price is constant, so both attestations sign the same
        // message and must carry identical signatures, each verifying alone.
        assert_eq!(a1.price_scaled, a2.price_scaled);
        assert_eq!(a1.signature, a2.signature);
        assert!(signer.verify_attestation(&a1));
        assert!(signer.verify_attestation(&a2));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_fatal() {
        let signer = test_signer();
        let err = signer.get_price(404).await.unwrap_err();
        assert!(matches!(err, ProverError::AssetNotFound(404)));
    }

    #[tokio::test]
    async fn test_tampered_attestation_rejected() {
        let signer = test_signer();
        let mut attestation = signer.get_price(3).await.unwrap();
        attestation.price_scaled += 1;
        assert!(!signer.verify_attestation(&attestation));
    }
}

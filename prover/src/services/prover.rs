//! Groth16 Proof Generation Service
//!
//! Given a circuit, a private witness, and public inputs, produces a succinct
//! proof plus the ordered public signals. Proving keys are generated lazily
//! per circuit and cached behind a read/write lock; the keys are read-only
//! after construction, so concurrent proof requests share them freely.
//!
//! # Rejection is non-generation
//!
//! A witness that violates any circuit constraint cannot yield a proof. The
//! generator checks witness satisfiability before proving and surfaces every
//! constraint-level failure as the single opaque
//! [`ProverError::ProofGenerationFailed`], deliberately undifferentiated so
//! failure paths never leak which private value was at fault.
//!
//! # Performance
//!
//! Key generation runs once per circuit (seconds, held under the write
//! lock). Proving is CPU-bound and runs on the blocking pool so it never
//! stalls the async runtime.

use std::sync::Arc;
use std::time::Duration;

use ark_bn254::{Bn254, Fr};
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_snark::SNARK;
use chrono::Utc;
use tokio::sync::RwLock;

use shieldlend_circuits::{eddsa, DepositCircuit, KycCircuit, LoanCircuit};

use crate::error::ProverError;
use crate::services::kyc::MerkleProof;
use crate::services::oracle::PriceAttestation;

/// A generated proof and its ordered public signals.
#[derive(Debug, Clone)]
pub struct ProofBundle {
    pub proof: Proof<Bn254>,
    pub public_signals: Vec<Fr>,
}

/// Loan request witness material supplied by the borrower.
#[derive(Debug, Clone)]
pub struct LoanRequest {
    pub collateral_amount: u64,
    pub asset_id: u32,
    pub deposit_secret: Fr,
    pub loan_amount_usd: u64,
    /// Must match the previously published deposit commitment
    pub collateral_commitment: Fr,
}

/// Cached proving material. Keys are expensive to generate (~seconds) and
/// reusable across requests, so each circuit keys exactly once, except the
/// KYC circuit, which re-keys when the registry's tree depth changes.
struct ProvingContext {
    deposit: Option<(Arc<ProvingKey<Bn254>>, VerifyingKey<Bn254>)>,
    loan: Option<(Arc<ProvingKey<Bn254>>, VerifyingKey<Bn254>)>,
    kyc: Option<(usize, Arc<ProvingKey<Bn254>>, VerifyingKey<Bn254>)>,
}

/// ZK 증명 생성 서비스
pub struct ProofGenerator {
    context: Arc<RwLock<ProvingContext>>,
    poseidon: PoseidonConfig<Fr>,
    max_attestation_age: Duration,
}

impl ProofGenerator {
    pub fn new(poseidon: PoseidonConfig<Fr>, max_attestation_age: Duration) -> Self {
        Self {
            context: Arc::new(RwLock::new(ProvingContext {
                deposit: None,
                loan: None,
                kyc: None,
            })),
            poseidon,
            max_attestation_age,
        }
    }

    async fn ensure_deposit_keys(&self) -> Result<(), ProverError> {
        if self.context.read().await.deposit.is_some() {
            return Ok(());
        }

        let mut guard = self.context.write().await;
        // Double-check after acquiring the write lock
        if guard.deposit.is_some() {
            return Ok(());
        }

        tracing::info!("generating DepositCircuit keys");
        let (pk, vk) = keygen(DepositCircuit::blank(self.poseidon.clone()))?;
        guard.deposit = Some((Arc::new(pk), vk));
        Ok(())
    }

    async fn ensure_loan_keys(&self) -> Result<(), ProverError> {
        if self.context.read().await.loan.is_some() {
            return Ok(());
        }

        let mut guard = self.context.write().await;
        if guard.loan.is_some() {
            return Ok(());
        }

        tracing::info!("generating LoanCircuit keys");
        let (pk, vk) = keygen(LoanCircuit::blank(self.poseidon.clone()))?;
        guard.loan = Some((Arc::new(pk), vk));
        Ok(())
    }

    async fn ensure_kyc_keys(&self, depth: usize) -> Result<(), ProverError> {
        if matches!(&self.context.read().await.kyc, Some((d, _, _)) if *d == depth) {
            return Ok(());
        }

        let mut guard = self.context.write().await;
        if matches!(&guard.kyc, Some((d, _, _)) if *d == depth) {
            return Ok(());
        }

        tracing::info!(depth, "generating KycCircuit keys");
        let (pk, vk) = keygen(KycCircuit::blank(self.poseidon.clone(), depth))?;
        guard.kyc = Some((depth, Arc::new(pk), vk));
        Ok(())
    }

    /// Deposit proof: publishes only the commitment.
    ///
    /// Public signals: `[commitment]`.
    pub async fn generate_deposit_proof(
        &self,
        collateral_amount: u64,
        asset_id: u32,
        user_secret: Fr,
    ) -> Result<ProofBundle, ProverError> {
        self.ensure_deposit_keys().await?;

        let amount = Fr::from(collateral_amount);
        let asset = Fr::from(asset_id as u64);
        let commitment =
            DepositCircuit::compute_commitment(&self.poseidon, amount, asset, user_secret);

        let circuit = DepositCircuit::new(
            self.poseidon.clone(),
            amount,
            asset,
            user_secret,
            commitment,
        );

        let (pk, vk) = {
            let guard = self.context.read().await;
            let (pk, vk) = guard
                .deposit
                .as_ref()
                .ok_or_else(|| ProverError::MissingArtifact("deposit proving key".to_string()))?;
            (Arc::clone(pk), vk.clone())
        };

        self.prove_checked(pk, vk, circuit, vec![commitment]).await
    }

    /// Loan proof against a signed oracle attestation.
    ///
    /// Public signals: `[loan_amount_usd, min_ratio, price_scaled, R8x, R8y,
    /// S, Ax, Ay, commitment]`, matching the allocation order of [`LoanCircuit`].
    ///
    /// The attestation itself is public material, so it is validated up front
    /// with descriptive errors (staleness, bad signature). Everything after
    /// synthesis begins fails opaquely.
    pub async fn generate_loan_proof(
        &self,
        request: &LoanRequest,
        attestation: &PriceAttestation,
        min_collateral_ratio: u64,
    ) -> Result<ProofBundle, ProverError> {
        // Freshness is a policy window enforced here, not in-circuit.
        let now_ms = Utc::now().timestamp_millis() as u64;
        let age_ms = now_ms.saturating_sub(attestation.timestamp_ms);
        if age_ms > self.max_attestation_age.as_millis() as u64 {
            return Err(ProverError::StaleAttestation);
        }

        let message = attestation.message(&self.poseidon);
        if !eddsa::verify(
            &self.poseidon,
            &attestation.pubkey,
            message,
            &attestation.signature,
        ) {
            return Err(ProverError::InvalidInput(
                "oracle attestation signature does not verify".to_string(),
            ));
        }

        self.ensure_loan_keys().await?;

        let (r8x, r8y, s) = attestation.signature_fields();
        let (ax, ay) = attestation.pubkey_fields();

        let circuit = LoanCircuit {
            config: self.poseidon.clone(),
            collateral_amount: Some(Fr::from(request.collateral_amount)),
            asset_id: Some(Fr::from(request.asset_id as u64)),
            deposit_secret: Some(request.deposit_secret),
            loan_amount_usd: Some(Fr::from(request.loan_amount_usd)),
            min_collateral_ratio: Some(Fr::from(min_collateral_ratio)),
            price_scaled: Some(Fr::from(attestation.price_scaled)),
            sig_r8x: Some(r8x),
            sig_r8y: Some(r8y),
            sig_s: Some(s),
            pubkey_x: Some(ax),
            pubkey_y: Some(ay),
            commitment: Some(request.collateral_commitment),
        };
        let public_signals = circuit.public_inputs();

        let (pk, vk) = {
            let guard = self.context.read().await;
            let (pk, vk) = guard
                .loan
                .as_ref()
                .ok_or_else(|| ProverError::MissingArtifact("loan proving key".to_string()))?;
            (Arc::clone(pk), vk.clone())
        };

        self.prove_checked(pk, vk, circuit, public_signals).await
    }

    /// KYC membership proof.
    ///
    /// Public signals: `[merkle_root]`.
    pub async fn generate_kyc_proof(
        &self,
        membership: &MerkleProof,
    ) -> Result<ProofBundle, ProverError> {
        let depth = membership.path_elements.len();

        let circuit = KycCircuit::new(
            self.poseidon.clone(),
            membership.leaf,
            membership.path_elements.clone(),
            membership.path_indices.clone(),
            membership.root,
        );

        // A concurrent request for a different tree depth can replace the
        // cached key between ensure and read, so the depth is re-checked at
        // the point of use and the keygen retried until a matching key is
        // held.
        let (pk, vk) = loop {
            self.ensure_kyc_keys(depth).await?;
            let guard = self.context.read().await;
            match guard.kyc.as_ref() {
                Some((d, pk, vk)) if *d == depth => break (Arc::clone(pk), vk.clone()),
                _ => continue,
            }
        };

        self.prove_checked(pk, vk, circuit, vec![membership.root]).await
    }

    /// Shared generation path: satisfiability precheck, blocking-pool
    /// proving, then a local verification self-check before the proof is
    /// handed to the caller.
    async fn prove_checked<C>(
        &self,
        pk: Arc<ProvingKey<Bn254>>,
        vk: VerifyingKey<Bn254>,
        circuit: C,
        public_signals: Vec<Fr>,
    ) -> Result<ProofBundle, ProverError>
    where
        C: ConstraintSynthesizer<Fr> + Clone + Send + 'static,
    {
        // Witness satisfiability gate: an unsatisfied witness must never
        // reach the prover, and the reason stays private.
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit
            .clone()
            .generate_constraints(cs.clone())
            .map_err(|_| ProverError::ProofGenerationFailed)?;
        if !cs
            .is_satisfied()
            .map_err(|_| ProverError::ProofGenerationFailed)?
        {
            tracing::debug!("witness rejected before proving");
            return Err(ProverError::ProofGenerationFailed);
        }

        let start = std::time::Instant::now();
        let proof = tokio::task::spawn_blocking(move || {
            let mut rng = rand::thread_rng();
            Groth16::<Bn254>::prove(&pk, circuit, &mut rng)
        })
        .await
        .map_err(|_| ProverError::ProofGenerationFailed)?
        .map_err(|_| ProverError::ProofGenerationFailed)?;

        // Self-check: never hand out a proof that would fail on-chain.
        let valid = Groth16::<Bn254>::verify(&vk, &public_signals, &proof)
            .map_err(|_| ProverError::ProofGenerationFailed)?;
        if !valid {
            return Err(ProverError::ProofGenerationFailed);
        }

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            signals = public_signals.len(),
            "proof generated and self-checked"
        );

        Ok(ProofBundle {
            proof,
            public_signals,
        })
    }
}

fn keygen<C>(blank: C) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ProverError>
where
    C: ConstraintSynthesizer<Fr>,
{
    let mut rng = rand::thread_rng();
    Groth16::<Bn254>::circuit_specific_setup(blank, &mut rng)
        .map_err(|e| ProverError::MissingArtifact(format!("circuit key generation failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::kyc::KycRegistry;
    use shieldlend_circuits::eddsa::SigningKey;
    use shieldlend_circuits::poseidon::{self, poseidon_config};

    fn generator() -> ProofGenerator {
        ProofGenerator::new(poseidon_config(), Duration::from_secs(300))
    }

    fn attestation(price_scaled: u64) -> PriceAttestation {
        let config = poseidon_config();
        let key = SigningKey::from_seed(&[5u8; 32]);
        let message = poseidon::hash(&config, &[Fr::from(price_scaled)]);
        let signature = key.sign(&config, message);
        PriceAttestation {
            asset_id: 1,
            price: price_scaled as f64 / 100.0,
            price_scaled,
            timestamp_ms: Utc::now().timestamp_millis() as u64,
            signature,
            pubkey: key.public_key(),
        }
    }

    fn loan_request(collateral_amount: u64, loan_amount_usd: u64) -> LoanRequest {
        let config = poseidon_config();
        let secret = Fr::from(31337u64);
        let commitment = DepositCircuit::compute_commitment(
            &config,
            Fr::from(collateral_amount),
            Fr::from(1u64),
            secret,
        );
        LoanRequest {
            collateral_amount,
            asset_id: 1,
            deposit_secret: secret,
            loan_amount_usd,
            collateral_commitment: commitment,
        }
    }

    #[tokio::test]
    async fn test_deposit_proof() {
        let gen = generator();
        let bundle = gen
            .generate_deposit_proof(1_000_000, 1, Fr::from(42u64))
            .await
            .unwrap();
        assert_eq!(bundle.public_signals.len(), 1);
    }

    #[tokio::test]
    async fn test_loan_proof_sufficient_collateral() {
        // 1,000,000 * 100 >= 600,000 * 150
        let gen = generator();
        let bundle = gen
            .generate_loan_proof(&loan_request(1_000_000, 600_000), &attestation(100), 150)
            .await
            .unwrap();
        assert_eq!(bundle.public_signals.len(), 9);
        assert_eq!(bundle.public_signals[0], Fr::from(600_000u64));
        assert_eq!(bundle.public_signals[2], Fr::from(100u64));
    }

    #[tokio::test]
    async fn test_loan_proof_insufficient_collateral() {
        // 500,000 * 100 < 600,000 * 150: rejection is opaque non-generation
        let gen = generator();
        let err = gen
            .generate_loan_proof(&loan_request(500_000, 600_000), &attestation(100), 150)
            .await
            .unwrap_err();
        assert!(matches!(err, ProverError::ProofGenerationFailed));
    }

    #[tokio::test]
    async fn test_stale_attestation_rejected() {
        let gen = generator();
        let mut att = attestation(100);
        att.timestamp_ms -= 10 * 60 * 1000; // 10 minutes old, window is 5
        let err = gen
            .generate_loan_proof(&loan_request(1_000_000, 600_000), &att, 150)
            .await
            .unwrap_err();
        assert!(matches!(err, ProverError::StaleAttestation));
    }

    #[tokio::test]
    async fn test_forged_attestation_rejected_up_front() {
        let gen = generator();
        let mut att = attestation(100);
        att.price_scaled = 200; // signature no longer covers the price
        let err = gen
            .generate_loan_proof(&loan_request(1_000_000, 600_000), &att, 150)
            .await
            .unwrap_err();
        assert!(matches!(err, ProverError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_kyc_proof() {
        let gen = generator();
        let registry = KycRegistry::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            poseidon_config(),
        );
        registry.init();

        let membership = registry.get_proof("B").unwrap();
        let bundle = gen.generate_kyc_proof(&membership).await.unwrap();
        assert_eq!(bundle.public_signals, vec![membership.root]);
    }

    #[tokio::test]
    async fn test_kyc_rekeys_across_tree_depths() {
        // Alternating depths force the single cached key to be replaced and
        // regenerated; every request must still get a key matching its own
        // tree depth.
        let gen = generator();
        let shallow = KycRegistry::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            poseidon_config(),
        );
        shallow.init();
        let deep = KycRegistry::new(
            (0..5).map(|i| format!("H{i}")).collect(),
            poseidon_config(),
        );
        deep.init();

        let m_shallow = shallow.get_proof("A").unwrap();
        let m_deep = deep.get_proof("H3").unwrap();
        assert_ne!(m_shallow.path_elements.len(), m_deep.path_elements.len());

        let b1 = gen.generate_kyc_proof(&m_shallow).await.unwrap();
        let b2 = gen.generate_kyc_proof(&m_deep).await.unwrap();
        let b3 = gen.generate_kyc_proof(&m_shallow).await.unwrap();
        assert_eq!(b1.public_signals, vec![m_shallow.root]);
        assert_eq!(b2.public_signals, vec![m_deep.root]);
        assert_eq!(b3.public_signals, vec![m_shallow.root]);
    }
}

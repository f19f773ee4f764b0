//! ShieldLend Proving Service
//!
//! 기동 시 KYC 레지스트리를 빌드하고, 오라클 attestation을 받아 데모
//! 파이프라인(예치 → 대출 적격성 → KYC 멤버십)을 끝까지 증명한 뒤 온체인
//! 인코딩으로 출력합니다.

use std::time::Duration;

use ark_bn254::Fr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shieldlend_circuits::poseidon::poseidon_config;
use shieldlend_prover::types::{AttestationResponse, ProofResponse};
use shieldlend_prover::{
    Config, FeedRegistry, HttpJsonFeed, KycRegistry, LoanRequest, OracleSigner, ProofGenerator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,reqwest=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shieldlend_prover=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting ShieldLend Proving Service");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!(environment = ?config.environment, "📋 Configuration loaded");

    let poseidon = poseidon_config();

    // 서비스 초기화
    let feeds = FeedRegistry::new(Box::new(HttpJsonFeed::new(Duration::from_secs(
        config.feed_timeout_secs,
    ))?));
    let oracle = OracleSigner::new(&config.oracle_seed, poseidon.clone(), feeds);
    tracing::info!("💰 Oracle signer ready");

    let registry = KycRegistry::new(config.kyc_whitelist.clone(), poseidon.clone());
    registry.init();
    let tree_depth = registry.depth()?;
    tracing::info!(depth = tree_depth, "🌳 KYC registry built");

    let generator = ProofGenerator::new(
        poseidon.clone(),
        Duration::from_secs(config.max_attestation_age_secs),
    );
    tracing::info!("🔐 Proof generator ready");

    // 데모 파이프라인: BENJI 담보 1,000,000 → 600,000 USD 대출
    let collateral_amount: u64 = 1_000_000;
    let loan_amount_usd: u64 = 600_000;
    let asset_id: u32 = 1;
    let user_secret = Fr::from(0x5eedu64);

    let deposit = generator
        .generate_deposit_proof(collateral_amount, asset_id, user_secret)
        .await?;
    let commitment = deposit.public_signals[0];
    let deposit_wire = ProofResponse::from_bundle(&deposit)?;
    tracing::info!(proof = %deposit_wire.proof, "✅ Deposit proof");

    let attestation = oracle.get_price(asset_id).await?;
    let payload = serde_json::to_string(&AttestationResponse::from_attestation(&attestation))?;
    tracing::info!(%payload, "📈 Price attestation");

    let loan = generator
        .generate_loan_proof(
            &LoanRequest {
                collateral_amount,
                asset_id,
                deposit_secret: user_secret,
                loan_amount_usd,
                collateral_commitment: commitment,
            },
            &attestation,
            config.min_collateral_ratio,
        )
        .await?;
    let loan_wire = ProofResponse::from_bundle(&loan)?;
    tracing::info!(
        proof = %loan_wire.proof,
        signals = loan.public_signals.len(),
        "✅ Loan eligibility proof"
    );

    let member = config
        .kyc_whitelist
        .first()
        .ok_or_else(|| anyhow::anyhow!("KYC whitelist is empty"))?;
    let membership = registry.get_proof(member)?;
    let kyc = generator.generate_kyc_proof(&membership).await?;
    let kyc_wire = ProofResponse::from_bundle(&kyc)?;
    tracing::info!(proof = %kyc_wire.proof, "✅ KYC membership proof");

    tracing::info!("🏁 Demo pipeline complete");
    Ok(())
}

//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `OracleSigner`: 자산 가격 조회 및 EdDSA 서명 attestation 발행
//! - `KycRegistry`: Poseidon Merkle 화이트리스트 및 멤버십 증명
//! - `ProofGenerator`: Groth16 증명 생성 서비스
//! - `FeedRegistry`: 외부 가격 피드 조회 (fallback 포함)

mod feeds;
mod kyc;
mod oracle;
mod prover;

pub use feeds::{
    AssetFeedConfig, FeedError, FeedRegistry, HttpJsonFeed, PriceFeed, StaticFeed, ASSET_FEEDS,
};
pub use kyc::{address_leaf, fold_path, KycRegistry, MerkleProof};
pub use oracle::{OracleSigner, PriceAttestation, PRICE_SCALE};
pub use prover::{LoanRequest, ProofBundle, ProofGenerator};

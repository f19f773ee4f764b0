//! ShieldLend Proving Service Library
//!
//! # Overview
//!
//! ShieldLend 프로토콜의 증명 서브시스템: 담보 예치·대출 적격성·KYC 멤버십에
//! 대한 Groth16 증명을 생성하고, 온체인 검증기가 소비하는 고정폭 바이트
//! 인코딩으로 직렬화합니다.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Proving Service                        │
//! │                                                           │
//! │  ┌───────────┐  ┌───────────┐  ┌────────────────┐        │
//! │  │  Oracle   │  │    KYC    │  │ ProofGenerator │        │
//! │  │  Signer   │  │ Registry  │  │   (Groth16)    │        │
//! │  └─────┬─────┘  └─────┬─────┘  └───────┬────────┘        │
//! │        │              │                │                  │
//! │  price feeds    Poseidon Merkle   shieldlend-circuits     │
//! │        │              │                │                  │
//! │        └──────────────┴────────┬───────┘                  │
//! │                                ▼                          │
//! │                         wire codec                        │
//! └──────────────────────────────┬───────────────────────────┘
//!                                ▼
//!                      on-chain verifier calldata
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `codec`: 증명/공개 신호 고정폭 인코딩
//! - `services`: 비즈니스 로직 (OracleSigner, KycRegistry, ProofGenerator)
//! - `types`: 직렬화 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shieldlend_prover::{Config, FeedRegistry, OracleSigner, StaticFeed};
//! use shieldlend_circuits::poseidon::poseidon_config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let feeds = FeedRegistry::new(Box::new(StaticFeed));
//!     let oracle = OracleSigner::new(&config.oracle_seed, poseidon_config(), feeds);
//!     let attestation = oracle.get_price(1).await?;
//!
//!     // ... 증명 생성
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ProverError;
pub use services::{
    FeedRegistry, HttpJsonFeed, KycRegistry, LoanRequest, OracleSigner, PriceAttestation,
    ProofBundle, ProofGenerator, StaticFeed,
};

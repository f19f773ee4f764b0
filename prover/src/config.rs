//! Configuration Module
//!
//! Environment-variable driven configuration, validated fail-fast at startup.
//! Every value has a development default so the service runs out of the box;
//! production deployments override through the environment.

use anyhow::{Context, Result};
use std::env;

/// Deterministic development signing seed. Never use in production.
const DEV_ORACLE_SEED: &str = "0001020304050607080900010203040506070809000102030405060708090001";

/// Default whitelist of KYC-approved addresses (demo fixtures).
const DEV_WHITELIST: [&str; 4] = [
    "GABC123XAMPLEHOLDERADDRESSONE",
    "GDEF456XAMPLEHOLDERADDRESSTWO",
    "GXYZ789XAMPLEHOLDERADDRESSTHREE",
    "CDQHNAXSI55GX2GN5D67GK7BHKF22HAL",
];

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// Oracle signing key seed (hex-encoded bytes)
    pub oracle_seed: Vec<u8>,

    /// Price feed request timeout in seconds
    pub feed_timeout_secs: u64,

    /// Maximum accepted age of an oracle attestation embedded in a loan proof
    pub max_attestation_age_secs: u64,

    /// Policy minimum collateral ratio in percent (e.g. 150)
    pub min_collateral_ratio: u64,

    /// KYC-approved addresses, built into the membership tree at init
    pub kyc_whitelist: Vec<String>,

    /// 환경 (development, staging, production)
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Optional Environment Variables
    ///
    /// - `ORACLE_SIGNING_SEED`: hex seed for the oracle keypair
    /// - `FEED_TIMEOUT_SECS`: price feed timeout (default: 5)
    /// - `MAX_ATTESTATION_AGE_SECS`: attestation freshness window (default: 300)
    /// - `MIN_COLLATERAL_RATIO`: policy ratio in percent (default: 150)
    /// - `KYC_WHITELIST`: comma-separated approved addresses
    /// - `ENVIRONMENT`: development | staging | production
    pub fn from_env() -> Result<Self> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let oracle_seed = hex::decode(
            env::var("ORACLE_SIGNING_SEED").unwrap_or_else(|_| DEV_ORACLE_SEED.to_string()),
        )
        .context("ORACLE_SIGNING_SEED must be valid hex")?;

        if oracle_seed.len() < 16 {
            anyhow::bail!("ORACLE_SIGNING_SEED must be at least 16 bytes");
        }

        let kyc_whitelist: Vec<String> = match env::var("KYC_WHITELIST") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEV_WHITELIST.iter().map(|s| s.to_string()).collect(),
        };

        if kyc_whitelist.is_empty() {
            anyhow::bail!("KYC_WHITELIST must contain at least one address");
        }

        Ok(Config {
            oracle_seed,
            feed_timeout_secs: env::var("FEED_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("FEED_TIMEOUT_SECS must be a valid number")?,

            max_attestation_age_secs: env::var("MAX_ATTESTATION_AGE_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("MAX_ATTESTATION_AGE_SECS must be a valid number")?,

            min_collateral_ratio: env::var("MIN_COLLATERAL_RATIO")
                .unwrap_or_else(|_| "150".to_string())
                .parse()
                .context("MIN_COLLATERAL_RATIO must be a valid number")?,

            kyc_whitelist,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

//! Price Feed Abstraction
//!
//! Different RWA price sources return differently shaped payloads, so each
//! concrete feed adapts its own response internally behind the single
//! [`PriceFeed::fetch`] operation. Shape ambiguity never leaks past this
//! module: the registry sees `Result<f64, FeedError>` and nothing else.
//!
//! A feed failure is never fatal to an attestation. The registry degrades to
//! the per-asset fallback constant and logs the failure at WARN.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::error::ProverError;

/// Static per-asset feed configuration.
pub struct AssetFeedConfig {
    pub asset_id: u32,
    pub name: &'static str,
    /// None for assets priced by a static constant only
    pub endpoint: Option<&'static str>,
    /// Used when the endpoint is missing, unreachable, or returns junk
    pub fallback: f64,
    /// Adapts the feed's own JSON shape to a raw price
    pub extract: Option<fn(&Value) -> Option<f64>>,
}

/// Registered asset feeds.
///
/// Asset 1: Franklin Templeton BENJI. Asset 2: Ondo USDY. Asset 3: a mock
/// RWA token priced by its fallback constant.
pub static ASSET_FEEDS: &[AssetFeedConfig] = &[
    AssetFeedConfig {
        asset_id: 1,
        name: "Franklin Templeton BENJI",
        endpoint: Some("https://api.franklintempleton.com/v1/nav/benji"),
        fallback: 98.50,
        extract: Some(|data| {
            data.get("nav_per_share")
                .or_else(|| data.get("price"))
                .and_then(Value::as_f64)
        }),
    },
    AssetFeedConfig {
        asset_id: 2,
        name: "Ondo USDY",
        endpoint: Some("https://api.ondo.finance/usdy/nav"),
        fallback: 1.02,
        extract: Some(|data| {
            data.get("price")
                .or_else(|| data.get("nav"))
                .and_then(Value::as_f64)
        }),
    },
    AssetFeedConfig {
        asset_id: 3,
        name: "Mock RWA Token",
        endpoint: None,
        fallback: 100.00,
        extract: None,
    },
];

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed returned an unusable payload")]
    BadPayload,
}

/// A single-price capability. Concrete feeds own their response shape.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch(&self, asset: &AssetFeedConfig) -> Result<f64, FeedError>;
}

/// Live feed over HTTP+JSON with a fixed request timeout.
pub struct HttpJsonFeed {
    client: reqwest::Client,
}

impl HttpJsonFeed {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("ShieldLend/1.0")
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PriceFeed for HttpJsonFeed {
    async fn fetch(&self, asset: &AssetFeedConfig) -> Result<f64, FeedError> {
        let endpoint = asset.endpoint.ok_or(FeedError::BadPayload)?;
        let extract = asset.extract.ok_or(FeedError::BadPayload)?;

        tracing::debug!(asset = asset.name, endpoint, "fetching live price");
        let body: Value = self.client.get(endpoint).send().await?.json().await?;

        match extract(&body) {
            Some(price) if price.is_finite() && price > 0.0 => Ok(price),
            _ => Err(FeedError::BadPayload),
        }
    }
}

/// Feed that always answers with the configured fallback constant.
/// Useful for mock assets and deterministic tests.
pub struct StaticFeed;

#[async_trait]
impl PriceFeed for StaticFeed {
    async fn fetch(&self, asset: &AssetFeedConfig) -> Result<f64, FeedError> {
        Ok(asset.fallback)
    }
}

/// Maps asset ids to feed configs and implements fallback-on-error.
pub struct FeedRegistry {
    live: Box<dyn PriceFeed>,
    assets: &'static [AssetFeedConfig],
}

impl FeedRegistry {
    pub fn new(live: Box<dyn PriceFeed>) -> Self {
        Self {
            live,
            assets: ASSET_FEEDS,
        }
    }

    pub fn lookup(&self, asset_id: u32) -> Option<&AssetFeedConfig> {
        self.assets.iter().find(|a| a.asset_id == asset_id)
    }

    /// Resolve a raw price for the asset. Unknown ids are the only error;
    /// every feed failure degrades to the fallback.
    pub async fn resolve_price(&self, asset_id: u32) -> Result<f64, ProverError> {
        let asset = self
            .lookup(asset_id)
            .ok_or(ProverError::AssetNotFound(asset_id))?;

        if asset.endpoint.is_none() {
            tracing::debug!(asset = asset.name, price = asset.fallback, "using fallback price");
            return Ok(asset.fallback);
        }

        match self.live.fetch(asset).await {
            Ok(price) => {
                tracing::info!(asset = asset.name, price, "live price resolved");
                Ok(price)
            }
            Err(err) => {
                tracing::warn!(
                    asset = asset.name,
                    fallback = asset.fallback,
                    error = %err,
                    "price feed failed, using fallback"
                );
                Ok(asset.fallback)
            }
        }
    }
}

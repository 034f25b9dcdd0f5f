pub mod rest;

use crate::errors::EngineResult;
use crate::types::MarketSnapshot;
use async_trait::async_trait;

/// Market data source seam. The scanner owns a provider by dependency
/// injection; rate-limit state lives inside the implementation, never in
/// globals.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_snapshot(&self, symbol: &str) -> EngineResult<MarketSnapshot>;
}

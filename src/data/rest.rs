use super::MarketDataProvider;
use crate::errors::{EngineError, EngineResult};
use crate::models::volatility::realized_volatility;
use crate::types::MarketSnapshot;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Volatility substitute when the close history is too thin to estimate one.
/// The provider is best-effort; the estimator's validation policy still has
/// the final say downstream.
const DEFAULT_VOLATILITY: f64 = 0.25;

/// REST market-data client: one quote call + one history call per snapshot.
/// Enforces a minimum spacing between requests internally.
pub struct RestDataProvider {
    client: Client,
    base_url: String,
    api_key: String,
    history_days: u32,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

// Expected quote response:
// { "symbol": "SPY", "price": 636.94, "timestamp": "2025-08-07T14:30:00Z" }

#[derive(serde::Deserialize)]
struct QuoteResponse {
    #[allow(dead_code)]
    symbol: Option<String>,
    price: Option<f64>,
}

// Expected history response (closes oldest first):
// { "symbol": "SPY", "closes": [630.1, 631.4, ...] }

#[derive(serde::Deserialize)]
struct HistoryResponse {
    closes: Option<Vec<f64>>,
}

impl RestDataProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        history_days: u32,
        min_interval: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            history_days,
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Sleep until the provider's minimum request spacing has elapsed.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> EngineResult<T> {
        self.throttle().await;

        let resp = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| EngineError::DataFeed(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::DataFeed(format!("HTTP {status}: {body}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| EngineError::DataFeed(format!("parse: {e}")))
    }

    async fn fetch_quote(&self, symbol: &str) -> EngineResult<f64> {
        let url = format!("{}/quote?symbol={symbol}", self.base_url);
        let quote: QuoteResponse = self.get_json(&url).await?;

        let price = quote
            .price
            .ok_or_else(|| EngineError::DataFeed(format!("{symbol}: no price in quote")))?;

        if !(price.is_finite() && price > 0.0) {
            return Err(EngineError::DataFeed(format!(
                "{symbol}: invalid quote price {price}"
            )));
        }
        Ok(price)
    }

    async fn fetch_closes(&self, symbol: &str) -> EngineResult<Vec<f64>> {
        let url = format!(
            "{}/history?symbol={symbol}&days={}",
            self.base_url, self.history_days
        );
        let history: HistoryResponse = self.get_json(&url).await?;

        let closes = history
            .closes
            .ok_or_else(|| EngineError::DataFeed(format!("{symbol}: no closes in history")))?;

        if closes.iter().any(|c| !(c.is_finite() && *c > 0.0)) {
            return Err(EngineError::DataFeed(format!(
                "{symbol}: history contains non-positive closes"
            )));
        }
        Ok(closes)
    }
}

#[async_trait]
impl MarketDataProvider for RestDataProvider {
    async fn fetch_snapshot(&self, symbol: &str) -> EngineResult<MarketSnapshot> {
        let price = self.fetch_quote(symbol).await?;
        let closes = self.fetch_closes(symbol).await?;

        let vol = match realized_volatility(&closes) {
            Ok(v) if v > 0.0 => v,
            _ => {
                tracing::warn!(
                    symbol,
                    closes = closes.len(),
                    "history too thin for realized vol, using default"
                );
                DEFAULT_VOLATILITY
            }
        };

        tracing::debug!(symbol, price, vol, closes = closes.len(), "snapshot fetched");

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            current_price: price,
            realized_volatility: vol,
            historical_closes: closes,
            as_of: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_response_parses() {
        let quote: QuoteResponse =
            serde_json::from_str(r#"{"symbol":"SPY","price":636.94,"timestamp":"t"}"#).unwrap();
        assert_eq!(quote.price, Some(636.94));
    }

    #[test]
    fn test_history_response_parses() {
        let history: HistoryResponse =
            serde_json::from_str(r#"{"symbol":"SPY","closes":[630.1,631.4,629.9]}"#).unwrap();
        assert_eq!(history.closes.unwrap().len(), 3);
    }

    #[test]
    fn test_missing_fields_tolerated_by_parser() {
        // Absent fields surface as None and become DataFeed errors upstream,
        // not parse panics.
        let quote: QuoteResponse = serde_json::from_str("{}").unwrap();
        assert!(quote.price.is_none());
    }
}

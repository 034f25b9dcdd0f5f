use crate::analysis::TradeSignal;
use crate::errors::{EngineError, EngineResult};
use reqwest::Client;
use std::time::Duration;

const SEND_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_SECS: u64 = 2;

/// Delivers rendered signals to a Telegram chat via the Bot API.
/// The message layout is a display concern with no compatibility guarantee.
pub struct TelegramDispatcher {
    http: Client,
    bot_token: String,
    chat_id: String,
}

#[derive(serde::Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
}

#[derive(serde::Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramDispatcher {
    pub fn new(bot_token: &str, chat_id: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    /// Send one alert, retrying transient failures with linear backoff.
    pub async fn send(&self, signal: &TradeSignal) -> EngineResult<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let body = SendMessageRequest {
            chat_id: self.chat_id.clone(),
            text: format_alert(signal),
        };

        let mut last_error = String::new();
        for attempt in 1..=SEND_ATTEMPTS {
            match self.try_send(&url, &body).await {
                Ok(()) => {
                    tracing::info!(symbol = %signal.symbol, attempt, "alert delivered");
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(symbol = %signal.symbol, attempt, error = %last_error, "telegram send failed");
                    if attempt < SEND_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(
                            RETRY_BACKOFF_SECS * u64::from(attempt),
                        ))
                        .await;
                    }
                }
            }
        }

        Err(EngineError::Telegram(format!(
            "{} attempts exhausted: {last_error}",
            SEND_ATTEMPTS
        )))
    }

    async fn try_send(&self, url: &str, body: &SendMessageRequest) -> EngineResult<()> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| EngineError::Telegram(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::Telegram(format!("HTTP {status}: {text}")));
        }

        let parsed: SendMessageResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Telegram(format!("parse: {e}")))?;

        if !parsed.ok {
            return Err(EngineError::Telegram(
                parsed.description.unwrap_or_else(|| "ok=false".into()),
            ));
        }
        Ok(())
    }
}

/// Render a signal as plain text, one fact per line.
pub fn format_alert(signal: &TradeSignal) -> String {
    let rec = &signal.recommendation;
    let greeks = &signal.estimate.greeks;

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("ALPHA SCOUT | {}", signal.symbol));
    lines.push(format!(
        "Price ${:.2} | realized vol {:.1}%",
        signal.spot,
        signal.realized_volatility * 100.0
    ));
    lines.push(format!(
        "Signal: {} (bull {:.0}% / bear {:.0}% / flat {:.0}%)",
        rec.state,
        signal.direction.bullish_pct,
        signal.direction.bearish_pct,
        signal.direction.sideways_pct
    ));
    lines.push(format!(
        "Probability {:.1}% | confidence {}",
        signal.score.final_probability, signal.score.confidence
    ));
    lines.push(format!(
        "  monte carlo {:.1}% (95% CI {:.1}-{:.1}) | backtest {:.1}% ({}/{} wins) | technical {:.1}%",
        signal.score.breakdown.monte_carlo,
        signal.estimate.confidence_interval_95.0,
        signal.estimate.confidence_interval_95.1,
        signal.score.breakdown.historical,
        signal.backtest.wins,
        signal.backtest.total_trades,
        signal.score.breakdown.technical
    ));
    lines.push(format!(
        "  basis: {} strike ${:.2} holds for {} trading days (E[S_T] ${:.2} ± {:.2})",
        signal.contract.option_kind,
        signal.contract.strike,
        signal.contract.days_to_expiry,
        signal.estimate.mean_terminal_price,
        signal.estimate.std_terminal_price
    ));
    lines.push(format!(
        "{} | strike ${:.2}, expires {}",
        rec.strategy, rec.strike, rec.expiry_date
    ));
    lines.push(format!(
        "Target ${:.2} | Stop ${:.2} | expected return {:.1}% | risk {}",
        rec.target, rec.stop_loss, rec.expected_return_pct, rec.risk_level
    ));
    lines.push(format!("Why: {}", rec.reasoning));
    lines.push(format!(
        "Greeks: delta {:.3}, gamma {:.4}, theta {:.3}/day, vega {:.3}",
        greeks.delta, greeks.gamma, greeks.theta, greeks.vega
    ));
    lines.push(format!(
        "Size: ${:.0} ({:.0}% of capital), ~{} contracts, max risk ${:.0}",
        signal.sizing.recommended_capital,
        signal.sizing.position_fraction * 100.0,
        signal.sizing.contracts_estimate,
        signal.sizing.max_risk
    ));
    lines.push(format!(
        "  kelly {:.2} | r/r {:.2} | breakeven {:.0}%",
        signal.sizing.kelly_fraction,
        signal.sizing.risk_reward_ratio,
        signal.sizing.breakeven_probability_pct
    ));
    lines.push(format!("Verdict: {}", signal.verdict));
    lines.push(signal.as_of.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    lines.join("\n")
}

pub mod backtest;
pub mod blend;
pub mod sizing;
pub mod strategy;
pub mod technical;

use crate::config::{AppConfig, MAX_EXPIRY_DAYS, MIN_EXPIRY_DAYS};
use crate::errors::EngineResult;
use crate::models::monte_carlo::MonteCarloEngine;
use crate::models::regime::{neutral_direction, MarkovChain};
use crate::models::volatility::realized_volatility;
use crate::types::{
    BacktestResult, BlendWeights, Direction, DirectionEstimate, MarketSnapshot,
    OptionContractSpec, OptionKind, ProbabilityEstimate, StrategyRecommendation, UnifiedScore,
    ValidationPolicy, Verdict,
};
use chrono::{DateTime, Utc};

/// Everything one analysis run produced for one symbol. Value object:
/// created, rendered into an alert, and discarded.
#[derive(Debug, Clone)]
pub struct TradeSignal {
    pub symbol: String,
    pub as_of: DateTime<Utc>,
    pub spot: f64,
    pub realized_volatility: f64,
    pub direction: DirectionEstimate,
    pub contract: OptionContractSpec,
    pub estimate: ProbabilityEstimate,
    pub backtest: BacktestResult,
    pub score: UnifiedScore,
    pub recommendation: StrategyRecommendation,
    pub sizing: sizing::PositionSizing,
    pub verdict: Verdict,
}

/// The full analysis pipeline for one snapshot:
/// regime -> contract derivation -> Monte Carlo -> backtest -> technical ->
/// blend -> strategy -> sizing -> verdict.
///
/// Stateless across calls; every stage is pure given the snapshot and the
/// estimator's RNG stream. No I/O happens here.
pub struct SignalPipeline {
    estimator: MonteCarloEngine,
    risk_free_rate: f64,
    weights: BlendWeights,
    strike_offset_pct: f64,
    days_to_expiry: u32,
    capital: f64,
}

impl SignalPipeline {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            estimator: MonteCarloEngine::new(
                config.num_paths,
                config.risk_free_rate,
                config.mc_seed,
                config.validation,
            ),
            risk_free_rate: config.risk_free_rate,
            weights: config.weights,
            strike_offset_pct: config.strike_offset_pct,
            days_to_expiry: config.days_to_expiry,
            capital: config.capital_allocated,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_paths: u32,
        risk_free_rate: f64,
        seed: Option<u64>,
        policy: ValidationPolicy,
        weights: BlendWeights,
        strike_offset_pct: f64,
        days_to_expiry: u32,
        capital: f64,
    ) -> Self {
        Self {
            estimator: MonteCarloEngine::new(num_paths, risk_free_rate, seed, policy),
            risk_free_rate,
            weights,
            strike_offset_pct,
            days_to_expiry,
            capital,
        }
    }

    pub fn analyze(&self, snapshot: &MarketSnapshot) -> EngineResult<TradeSignal> {
        snapshot.validate()?;

        let closes = &snapshot.historical_closes;
        let spot = snapshot.current_price;

        let direction = MarkovChain::from_closes(closes)
            .map(|chain| chain.direction_estimate())
            .unwrap_or_else(neutral_direction);

        // A bullish thesis is measured at the support strike below spot (the
        // put side); bearish at the resistance strike above. The tradeable
        // recommendation is a separate concern of the selector.
        let kind = match direction.direction {
            Direction::Bullish => OptionKind::Put,
            Direction::Bearish => OptionKind::Call,
            Direction::Sideways => {
                if direction.bullish_pct > direction.bearish_pct {
                    OptionKind::Put
                } else {
                    OptionKind::Call
                }
            }
        };
        let strike = match kind {
            OptionKind::Put => spot * (1.0 - self.strike_offset_pct / 100.0),
            OptionKind::Call => spot * (1.0 + self.strike_offset_pct / 100.0),
        };
        let contract = OptionContractSpec {
            strike,
            days_to_expiry: self.days_to_expiry,
            option_kind: kind,
        };
        contract.validate(MIN_EXPIRY_DAYS, MAX_EXPIRY_DAYS)?;

        // Prefer the snapshot's volatility; recompute from closes when the
        // provider left it unset. The estimator's policy owns the final say
        // on a still-degenerate value.
        let vol = if snapshot.realized_volatility > 0.0 {
            snapshot.realized_volatility
        } else {
            realized_volatility(closes).unwrap_or(0.0)
        };

        let estimate = self
            .estimator
            .estimate(spot, vol, contract.days_to_expiry, contract.strike, kind)?;
        tracing::trace!(
            symbol = %snapshot.symbol,
            monte_carlo = estimate.monte_carlo_probability,
            closed_form = crate::models::greeks::analytic_hold_probability(
                spot,
                contract.strike,
                contract.days_to_expiry,
                vol,
                self.risk_free_rate,
                kind
            ),
            "estimator cross-check"
        );

        let backtest_result =
            backtest::backtest(closes, self.strike_offset_pct, contract.days_to_expiry, kind);
        if backtest_result.insufficient_data {
            tracing::debug!(symbol = %snapshot.symbol, "not enough history to backtest");
        }

        let technical = technical::technical_probability(closes, spot, contract.strike);

        let score = blend::blend(
            estimate.monte_carlo_probability,
            backtest_result.win_rate,
            technical,
            self.weights,
        );

        let recommendation = strategy::select_strategy(
            &direction,
            &score,
            spot,
            contract.days_to_expiry,
            snapshot.as_of.date_naive(),
        );

        let position = sizing::compute_sizing(&sizing::SizingParams {
            win_probability: score.final_probability / 100.0,
            capital: self.capital,
        });

        let verdict = strategy::verdict(
            score.final_probability,
            position.expected_return_pct,
            position.sharpe_estimate,
        );

        Ok(TradeSignal {
            symbol: snapshot.symbol.clone(),
            as_of: snapshot.as_of,
            spot,
            realized_volatility: vol,
            direction,
            contract,
            estimate,
            backtest: backtest_result,
            score,
            recommendation,
            sizing: position,
            verdict,
        })
    }
}

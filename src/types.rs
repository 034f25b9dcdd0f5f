use crate::errors::{EngineError, EngineResult};
use chrono::{DateTime, NaiveDate, Utc};

// ── Contract primitives ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Call,
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bullish,
    Bearish,
    Sideways,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

/// How the estimator treats degenerate inputs (non-positive price, strike,
/// volatility or time). Strict rejects them; Permissive substitutes the
/// historical defaults ($100 spot, strike = spot, 1 day, 20% vol) and warns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    Strict,
    Permissive,
}

// ── Market data ──

/// A point-in-time view of one underlying. All analysis is pure given this.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    /// Annualized close-to-close volatility (0.25 = 25%).
    pub realized_volatility: f64,
    /// Daily closes, oldest first. The current price succeeds the last close.
    pub historical_closes: Vec<f64>,
    pub as_of: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.current_price.is_finite() && self.current_price > 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "{}: current_price must be finite and positive, got {}",
                self.symbol, self.current_price
            )));
        }
        if !(self.realized_volatility.is_finite() && self.realized_volatility >= 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "{}: realized_volatility must be finite and non-negative, got {}",
                self.symbol, self.realized_volatility
            )));
        }
        if let Some(bad) = self
            .historical_closes
            .iter()
            .find(|c| !(c.is_finite() && **c > 0.0))
        {
            return Err(EngineError::InvalidInput(format!(
                "{}: historical close {} is not a positive finite price",
                self.symbol, bad
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionContractSpec {
    pub strike: f64,
    pub days_to_expiry: u32,
    pub option_kind: OptionKind,
}

impl OptionContractSpec {
    /// Horizon bounds come from config (7-45 days in this system).
    pub fn validate(&self, min_days: u32, max_days: u32) -> EngineResult<()> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "strike must be finite and positive, got {}",
                self.strike
            )));
        }
        if self.days_to_expiry < min_days || self.days_to_expiry > max_days {
            return Err(EngineError::InvalidInput(format!(
                "days_to_expiry {} outside horizon {min_days}-{max_days}",
                self.days_to_expiry
            )));
        }
        Ok(())
    }
}

// ── Estimator output ──

/// Black-Scholes sensitivities. Theta is per calendar day, vega per 1% vol.
#[derive(Debug, Clone, Copy)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Fresh per estimation call; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct ProbabilityEstimate {
    /// Strike-hold probability in [0, 100]: for a put, P(S_T > strike);
    /// for a call, P(S_T < strike).
    pub monte_carlo_probability: f64,
    pub greeks: Greeks,
    /// 95% binomial confidence interval on the probability itself, in
    /// percentage points. Tightens as the path count grows.
    pub confidence_interval_95: (f64, f64),
    pub mean_terminal_price: f64,
    pub std_terminal_price: f64,
}

// ── Backtest output ──

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestResult {
    /// Empirical win rate in [0, 100]. Zero when no trades fit the window.
    pub win_rate: f64,
    pub total_trades: u32,
    pub wins: u32,
    /// Not enough history to place a single trade. A business outcome,
    /// not an error.
    pub insufficient_data: bool,
}

impl BacktestResult {
    pub fn no_trades() -> Self {
        Self {
            win_rate: 0.0,
            total_trades: 0,
            wins: 0,
            insufficient_data: true,
        }
    }
}

// ── Blend output ──

#[derive(Debug, Clone, Copy)]
pub struct BlendWeights {
    pub monte_carlo: f64,
    pub historical: f64,
    pub technical: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            monte_carlo: 0.4,
            historical: 0.3,
            technical: 0.3,
        }
    }
}

impl BlendWeights {
    #[inline]
    pub fn sum(&self) -> f64 {
        self.monte_carlo + self.historical + self.technical
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ComponentBreakdown {
    pub monte_carlo: f64,
    pub historical: f64,
    pub technical: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLabel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnifiedScore {
    /// Weighted blend of the three components, clamped to [0, 100].
    pub final_probability: f64,
    pub breakdown: ComponentBreakdown,
    pub confidence: ConfidenceLabel,
}

// ── Direction estimate (regime classifier output) ──

#[derive(Debug, Clone, Copy)]
pub struct DirectionEstimate {
    pub direction: Direction,
    /// Percentages in [0, 100]; the three sum to ~100.
    pub bullish_pct: f64,
    pub bearish_pct: f64,
    pub sideways_pct: f64,
}

// ── Strategy output ──

/// Only single-leg long options are permitted in this engine. No spreads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyName {
    LongCall,
    LongPut,
}

impl std::fmt::Display for StrategyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LongCall => write!(f, "LONG CALL"),
            Self::LongPut => write!(f, "LONG PUT"),
        }
    }
}

impl StrategyName {
    #[inline]
    pub fn option_kind(&self) -> OptionKind {
        match self {
            Self::LongCall => OptionKind::Call,
            Self::LongPut => OptionKind::Put,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// The selector's state machine. Classified from the dominant direction and
/// the blended probability; every state maps to exactly one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    BullishStrong,
    BullishModerate,
    BullishWeak,
    BearishStrong,
    BearishModerate,
    BearishWeak,
    Sideways,
}

impl std::fmt::Display for SignalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BullishStrong => write!(f, "BULLISH STRONG"),
            Self::BullishModerate => write!(f, "BULLISH MODERATE"),
            Self::BullishWeak => write!(f, "BULLISH WEAK"),
            Self::BearishStrong => write!(f, "BEARISH STRONG"),
            Self::BearishModerate => write!(f, "BEARISH MODERATE"),
            Self::BearishWeak => write!(f, "BEARISH WEAK"),
            Self::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategyRecommendation {
    pub strategy: StrategyName,
    pub state: SignalState,
    pub reasoning: String,
    /// Heuristic scalar in [5, 35], not a pricing-accurate expectation.
    pub expected_return_pct: f64,
    pub risk_level: RiskLevel,
    pub strike: f64,
    pub target: f64,
    pub stop_loss: f64,
    pub expiry_date: NaiveDate,
}

// ── Recommendation gate ──

/// Ordered so the alert floor can be expressed as `verdict >= floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Skip,
    Watch,
    WeakBuy,
    Buy,
    StrongBuy,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "SKIP"),
            Self::Watch => write!(f, "WATCH"),
            Self::WeakBuy => write!(f, "WEAK BUY"),
            Self::Buy => write!(f, "BUY"),
            Self::StrongBuy => write!(f, "STRONG BUY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(price: f64, closes: Vec<f64>) -> MarketSnapshot {
        MarketSnapshot {
            symbol: "TEST".into(),
            current_price: price,
            realized_volatility: 0.25,
            historical_closes: closes,
            as_of: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_rejects_bad_price() {
        assert!(snapshot(0.0, vec![]).validate().is_err());
        assert!(snapshot(f64::NAN, vec![]).validate().is_err());
        assert!(snapshot(100.0, vec![]).validate().is_ok());
    }

    #[test]
    fn test_snapshot_rejects_bad_close() {
        assert!(snapshot(100.0, vec![99.0, -1.0]).validate().is_err());
        assert!(snapshot(100.0, vec![99.0, 101.0]).validate().is_ok());
    }

    #[test]
    fn test_contract_horizon_enforced() {
        let spec = OptionContractSpec {
            strike: 100.0,
            days_to_expiry: 5,
            option_kind: OptionKind::Put,
        };
        assert!(spec.validate(7, 45).is_err());
        let spec = OptionContractSpec {
            days_to_expiry: 14,
            ..spec
        };
        assert!(spec.validate(7, 45).is_ok());
    }

    #[test]
    fn test_verdict_ordering() {
        assert!(Verdict::StrongBuy > Verdict::Buy);
        assert!(Verdict::Buy > Verdict::WeakBuy);
        assert!(Verdict::WeakBuy > Verdict::Watch);
        assert!(Verdict::Watch > Verdict::Skip);
    }
}

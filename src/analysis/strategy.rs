use crate::types::{
    Direction, DirectionEstimate, OptionKind, RiskLevel, SignalState, StrategyName,
    StrategyRecommendation, UnifiedScore, Verdict,
};
use chrono::{Duration, NaiveDate};

/// Strength buckets over the blended probability.
const STRONG_PROBABILITY: f64 = 70.0;
const MODERATE_PROBABILITY: f64 = 60.0;

/// Heuristic expected-return anchors. Not pricing-accurate expectations.
const BASE_RETURN_PCT: f64 = 25.0;
const MIN_RETURN_PCT: f64 = 5.0;
const MAX_RETURN_PCT: f64 = 35.0;

/// Weak and sideways signals buy slightly in-the-money for consistency.
const ITM_OFFSET: f64 = 0.02;

/// Underlying price levels attached to the alert.
const CALL_TARGET: f64 = 1.03;
const CALL_STOP: f64 = 0.975;
const PUT_TARGET: f64 = 0.97;
const PUT_STOP: f64 = 1.025;

/// Bucket a direction call and its probability into a signal state.
/// Total over the whole input domain.
pub fn classify(direction: Direction, dominant_probability: f64) -> SignalState {
    match direction {
        Direction::Sideways => SignalState::Sideways,
        Direction::Bullish => {
            if dominant_probability > STRONG_PROBABILITY {
                SignalState::BullishStrong
            } else if dominant_probability > MODERATE_PROBABILITY {
                SignalState::BullishModerate
            } else {
                SignalState::BullishWeak
            }
        }
        Direction::Bearish => {
            if dominant_probability > STRONG_PROBABILITY {
                SignalState::BearishStrong
            } else if dominant_probability > MODERATE_PROBABILITY {
                SignalState::BearishModerate
            } else {
                SignalState::BearishWeak
            }
        }
    }
}

#[inline]
fn strength_multiplier(state: SignalState) -> f64 {
    match state {
        SignalState::BullishStrong | SignalState::BearishStrong => 1.2,
        SignalState::BullishModerate | SignalState::BearishModerate => 1.0,
        SignalState::BullishWeak | SignalState::BearishWeak => 0.8,
        SignalState::Sideways => 0.9,
    }
}

/// expected = base * strength * probability/60, clamped to [5, 35].
pub fn expected_return_pct(state: SignalState, dominant_probability: f64) -> f64 {
    (BASE_RETURN_PCT * strength_multiplier(state) * (dominant_probability / 60.0))
        .clamp(MIN_RETURN_PCT, MAX_RETURN_PCT)
}

/// Map a direction estimate and blended score to the one permitted strategy.
///
/// Only long calls and long puts exist in this engine: single-leg contracts
/// keep the output executable at the lowest broker option level. Strikes sit
/// at the money for strong/moderate states and 2% in the money otherwise;
/// sideways picks the side whose sub-probability is larger.
pub fn select_strategy(
    direction: &DirectionEstimate,
    score: &UnifiedScore,
    spot: f64,
    days_to_expiry: u32,
    as_of: NaiveDate,
) -> StrategyRecommendation {
    let state = classify(direction.direction, score.final_probability);

    let (strategy, reasoning) = match state {
        SignalState::BullishStrong => (
            StrategyName::LongCall,
            "Strong bullish signal - ATM call".to_string(),
        ),
        SignalState::BullishModerate => (
            StrategyName::LongCall,
            "Moderate bullish - directional call".to_string(),
        ),
        SignalState::BullishWeak => (
            StrategyName::LongCall,
            "Weak bullish - ITM call for consistency".to_string(),
        ),
        SignalState::BearishStrong => (
            StrategyName::LongPut,
            "Strong bearish signal - ATM put".to_string(),
        ),
        SignalState::BearishModerate => (
            StrategyName::LongPut,
            "Moderate bearish - directional put".to_string(),
        ),
        SignalState::BearishWeak => (
            StrategyName::LongPut,
            "Weak bearish - ITM put for consistency".to_string(),
        ),
        SignalState::Sideways => {
            if direction.bullish_pct > direction.bearish_pct {
                (
                    StrategyName::LongCall,
                    format!(
                        "Sideways with bullish bias ({:.0}% vs {:.0}%) - ITM call",
                        direction.bullish_pct, direction.bearish_pct
                    ),
                )
            } else {
                (
                    StrategyName::LongPut,
                    format!(
                        "Sideways with bearish bias ({:.0}% vs {:.0}%) - ITM put",
                        direction.bearish_pct, direction.bullish_pct
                    ),
                )
            }
        }
    };

    let atm = matches!(
        state,
        SignalState::BullishStrong
            | SignalState::BullishModerate
            | SignalState::BearishStrong
            | SignalState::BearishModerate
    );
    let strike = match (strategy.option_kind(), atm) {
        (_, true) => spot,
        (OptionKind::Call, false) => spot * (1.0 - ITM_OFFSET),
        (OptionKind::Put, false) => spot * (1.0 + ITM_OFFSET),
    };

    let (target, stop_loss) = match strategy.option_kind() {
        OptionKind::Call => (spot * CALL_TARGET, spot * CALL_STOP),
        OptionKind::Put => (spot * PUT_TARGET, spot * PUT_STOP),
    };

    let risk_level = match state {
        SignalState::BullishStrong | SignalState::BearishStrong => RiskLevel::High,
        SignalState::BullishModerate | SignalState::BearishModerate => RiskLevel::Medium,
        _ => RiskLevel::Low,
    };

    StrategyRecommendation {
        strategy,
        state,
        reasoning,
        expected_return_pct: expected_return_pct(state, score.final_probability),
        risk_level,
        strike,
        target,
        stop_loss,
        expiry_date: as_of + Duration::days(i64::from(days_to_expiry)),
    }
}

/// Trading verdict from the blended probability and the sizing metrics.
/// Alerts are gated on this downstream.
pub fn verdict(final_probability: f64, expected_return_pct: f64, sharpe_estimate: f64) -> Verdict {
    if final_probability >= 70.0 && expected_return_pct >= 8.0 && sharpe_estimate > 0.2 {
        Verdict::StrongBuy
    } else if final_probability >= 65.0 && expected_return_pct >= 5.0 && sharpe_estimate > 0.1 {
        Verdict::Buy
    } else if final_probability >= 60.0 && expected_return_pct >= 3.0 && sharpe_estimate > 0.05 {
        Verdict::WeakBuy
    } else if final_probability >= 55.0 && expected_return_pct >= 1.0 {
        Verdict::Watch
    } else {
        Verdict::Skip
    }
}

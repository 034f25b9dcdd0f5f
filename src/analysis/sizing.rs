/// Kelly-style position sizing under a fixed 40/60 payoff assumption
/// (win captures 40% of premium, loss surrenders 60%). The payoff numbers
/// are a fixed heuristic; the outputs are sizing guidance, not a pricing
/// model.
///
/// Pure function: deterministic from inputs.
const WIN_AMOUNT: f64 = 0.4;
const LOSS_AMOUNT: f64 = 0.6;

/// Hard bounds on the capital fraction, regardless of how strong the edge
/// looks.
const MIN_POSITION_FRACTION: f64 = 0.05;
const MAX_POSITION_FRACTION: f64 = 0.25;

/// Rough contract sizing: one contract per $100 of deployed capital.
const DOLLARS_PER_CONTRACT: f64 = 100.0;

/// Sizing inputs. Stack-allocated.
#[derive(Debug, Clone, Copy)]
pub struct SizingParams {
    /// Win probability in [0, 1] (the blended probability / 100).
    pub win_probability: f64,
    /// Capital available to this signal, in dollars.
    pub capital: f64,
}

/// Sizing result. Stack-allocated.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizing {
    /// Raw Kelly fraction before bounds; may be negative with no edge.
    pub kelly_fraction: f64,
    /// Bounded capital fraction actually recommended.
    pub position_fraction: f64,
    pub recommended_capital: f64,
    /// Worst-case dollar loss on the recommended position.
    pub max_risk: f64,
    pub contracts_estimate: u32,
    pub expected_return_pct: f64,
    pub sharpe_estimate: f64,
    pub risk_reward_ratio: f64,
    pub breakeven_probability_pct: f64,
}

pub fn compute_sizing(params: &SizingParams) -> PositionSizing {
    let p = params.win_probability.clamp(0.0, 1.0);
    let q = 1.0 - p;

    let kelly_fraction = (p * WIN_AMOUNT - q * LOSS_AMOUNT) / WIN_AMOUNT;
    let position_fraction = kelly_fraction.clamp(MIN_POSITION_FRACTION, MAX_POSITION_FRACTION);

    let expected_return = p * WIN_AMOUNT - q * LOSS_AMOUNT;
    let return_volatility = (p * (WIN_AMOUNT - expected_return).powi(2)
        + q * (-LOSS_AMOUNT - expected_return).powi(2))
    .sqrt();
    let sharpe_estimate = if return_volatility > 0.0 {
        expected_return / return_volatility
    } else {
        0.0
    };

    let recommended_capital = params.capital.max(0.0) * position_fraction;

    PositionSizing {
        kelly_fraction,
        position_fraction,
        recommended_capital,
        max_risk: recommended_capital * LOSS_AMOUNT,
        contracts_estimate: ((recommended_capital / DOLLARS_PER_CONTRACT) as u32).max(1),
        expected_return_pct: expected_return * 100.0,
        sharpe_estimate,
        risk_reward_ratio: WIN_AMOUNT / LOSS_AMOUNT,
        breakeven_probability_pct: LOSS_AMOUNT / (WIN_AMOUNT + LOSS_AMOUNT) * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edge_floors_at_min_fraction() {
        let s = compute_sizing(&SizingParams {
            win_probability: 0.5,
            capital: 1000.0,
        });
        // p=0.5: kelly = (0.2 - 0.3)/0.4 = -0.25, floored to 5%
        assert!((s.kelly_fraction + 0.25).abs() < 1e-9, "kelly: {}", s.kelly_fraction);
        assert_eq!(s.position_fraction, MIN_POSITION_FRACTION);
        assert!((s.recommended_capital - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_strong_edge_caps_at_max_fraction() {
        let s = compute_sizing(&SizingParams {
            win_probability: 0.95,
            capital: 1000.0,
        });
        assert_eq!(s.position_fraction, MAX_POSITION_FRACTION);
        assert!((s.recommended_capital - 250.0).abs() < 1e-9);
        assert!(s.max_risk <= s.recommended_capital);
    }

    #[test]
    fn test_hand_computed_metrics_at_70pct() {
        let s = compute_sizing(&SizingParams {
            win_probability: 0.7,
            capital: 1000.0,
        });
        // expected = 0.7*0.4 - 0.3*0.6 = 0.10
        assert!((s.expected_return_pct - 10.0).abs() < 1e-9);
        // breakeven = 0.6 / 1.0
        assert!((s.breakeven_probability_pct - 60.0).abs() < 1e-9);
        assert!(s.sharpe_estimate > 0.2, "sharpe at 70%: {}", s.sharpe_estimate);
    }

    #[test]
    fn test_contracts_at_least_one() {
        let s = compute_sizing(&SizingParams {
            win_probability: 0.5,
            capital: 100.0,
        });
        assert_eq!(s.contracts_estimate, 1);
    }

    #[test]
    fn test_out_of_range_probability_clamped() {
        let s = compute_sizing(&SizingParams {
            win_probability: 1.7,
            capital: 1000.0,
        });
        assert!(s.expected_return_pct <= WIN_AMOUNT * 100.0);
        let s = compute_sizing(&SizingParams {
            win_probability: -0.3,
            capital: 1000.0,
        });
        assert_eq!(s.position_fraction, MIN_POSITION_FRACTION);
    }
}

use crate::models::volatility::TRADING_DAYS_PER_YEAR;
use crate::types::{Greeks, OptionKind};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Greeks run on a calendar-day year; the Monte Carlo horizon runs on
/// trading days. Do not unify the two clocks.
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Analytic Black-Scholes Greeks from the standard d1/d2 formulas.
///
/// Theta is expressed per calendar day, vega per 1% of volatility.
/// Inputs are assumed validated (positive, finite) by the estimator.
pub fn black_scholes_greeks(
    spot: f64,
    strike: f64,
    days_to_expiry: u32,
    sigma: f64,
    risk_free_rate: f64,
    kind: OptionKind,
) -> Greeks {
    let normal = Normal::standard();
    let t = f64::from(days_to_expiry) / CALENDAR_DAYS_PER_YEAR;
    let sqrt_t = t.sqrt();
    let sigma_sqrt_t = sigma * sqrt_t;

    let d1 = ((spot / strike).ln() + (risk_free_rate + 0.5 * sigma * sigma) * t) / sigma_sqrt_t;
    let d2 = d1 - sigma_sqrt_t;

    let pdf_d1 = normal.pdf(d1);
    let discount = (-risk_free_rate * t).exp();
    let time_decay = -(spot * pdf_d1 * sigma) / (2.0 * sqrt_t);

    let carry = risk_free_rate * strike * discount;
    let (delta, theta_annual) = match kind {
        OptionKind::Call => (normal.cdf(d1), time_decay - carry * normal.cdf(d2)),
        OptionKind::Put => (-normal.cdf(-d1), time_decay + carry * normal.cdf(-d2)),
    };
    let theta = theta_annual / CALENDAR_DAYS_PER_YEAR;

    Greeks {
        delta,
        gamma: pdf_d1 / (spot * sigma_sqrt_t),
        theta,
        vega: spot * pdf_d1 * sqrt_t / 100.0,
    }
}

/// Closed-form strike-hold probability under risk-neutral GBM, on the same
/// trading-day clock as the Monte Carlo estimator. Used as a convergence
/// cross-check: P(S_T > K) = Phi(d2).
///
/// Returns a percentage in [0, 100].
pub fn analytic_hold_probability(
    spot: f64,
    strike: f64,
    days_to_expiry: u32,
    sigma: f64,
    risk_free_rate: f64,
    kind: OptionKind,
) -> f64 {
    let t = f64::from(days_to_expiry) / TRADING_DAYS_PER_YEAR;
    let sigma_sqrt_t = sigma * t.sqrt();

    if sigma_sqrt_t < 1e-12 {
        // Deterministic terminal price
        let above = spot * (risk_free_rate * t).exp() > strike;
        let holds = match kind {
            OptionKind::Put => above,
            OptionKind::Call => !above,
        };
        return if holds { 100.0 } else { 0.0 };
    }

    let d2 = ((spot / strike).ln() + (risk_free_rate - 0.5 * sigma * sigma) * t) / sigma_sqrt_t;
    let normal = Normal::standard();
    let p_above = normal.cdf(d2);

    let p = match kind {
        OptionKind::Put => p_above,
        OptionKind::Call => 1.0 - p_above,
    };
    p * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_delta_bounds() {
        let g = black_scholes_greeks(100.0, 96.0, 30, 0.25, 0.045, OptionKind::Call);
        assert!(
            (0.0..=1.0).contains(&g.delta),
            "call delta must be in [0,1]: {}",
            g.delta
        );
    }

    #[test]
    fn test_put_delta_bounds() {
        let g = black_scholes_greeks(100.0, 96.0, 30, 0.25, 0.045, OptionKind::Put);
        assert!(
            (-1.0..=0.0).contains(&g.delta),
            "put delta must be in [-1,0]: {}",
            g.delta
        );
    }

    #[test]
    fn test_put_call_delta_parity() {
        let call = black_scholes_greeks(100.0, 100.0, 30, 0.25, 0.045, OptionKind::Call);
        let put = black_scholes_greeks(100.0, 100.0, 30, 0.25, 0.045, OptionKind::Put);
        assert!(
            (call.delta - put.delta - 1.0).abs() < 1e-10,
            "delta_call - delta_put must equal 1: {} vs {}",
            call.delta,
            put.delta
        );
        // Gamma and vega are identical for calls and puts
        assert!((call.gamma - put.gamma).abs() < 1e-12);
        assert!((call.vega - put.vega).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_and_vega_non_negative() {
        for (spot, strike) in [(100.0, 90.0), (100.0, 100.0), (100.0, 110.0)] {
            let g = black_scholes_greeks(spot, strike, 21, 0.3, 0.045, OptionKind::Call);
            assert!(g.gamma >= 0.0, "gamma must be >= 0: {}", g.gamma);
            assert!(g.vega >= 0.0, "vega must be >= 0: {}", g.vega);
        }
    }

    #[test]
    fn test_long_option_theta_negative() {
        let call = black_scholes_greeks(100.0, 100.0, 30, 0.25, 0.045, OptionKind::Call);
        let put = black_scholes_greeks(100.0, 100.0, 30, 0.25, 0.045, OptionKind::Put);
        assert!(call.theta < 0.0, "ATM call theta should decay: {}", call.theta);
        assert!(put.theta < 0.0, "ATM put theta should decay: {}", put.theta);
    }

    #[test]
    fn test_hold_probabilities_complement() {
        let put = analytic_hold_probability(100.0, 96.0, 30, 0.25, 0.045, OptionKind::Put);
        let call = analytic_hold_probability(100.0, 96.0, 30, 0.25, 0.045, OptionKind::Call);
        assert!(
            (put + call - 100.0).abs() < 1e-9,
            "put-hold and call-hold must sum to 100: {put} + {call}"
        );
        // Strike 4% below spot: support should hold more often than not
        assert!(put > 60.0, "4% OTM support hold should exceed 60%: {put}");
    }

    #[test]
    fn test_zero_vol_is_deterministic() {
        let p = analytic_hold_probability(100.0, 96.0, 30, 0.0, 0.045, OptionKind::Put);
        assert_eq!(p, 100.0);
        let p = analytic_hold_probability(100.0, 104.0, 30, 0.0, 0.045, OptionKind::Put);
        assert_eq!(p, 0.0);
    }
}

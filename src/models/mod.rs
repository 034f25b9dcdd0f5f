pub mod greeks;
pub mod monte_carlo;
pub mod regime;
pub mod volatility;

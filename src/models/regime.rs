use crate::models::volatility::daily_returns;
use crate::types::{Direction, DirectionEstimate};

/// Five-state Markov chain over daily returns. The transition matrix is
/// estimated from the close series; the next-state distribution from the
/// latest observed state is the scanner's direction signal.
///
/// All storage is fixed-size; no heap after construction.
const NUM_STATES: usize = 5;

/// Daily move above which a day counts as a strong trend day.
const STRONG_MOVE: f64 = 0.015;
/// Band around zero treated as flat.
const FLAT_BAND: f64 = 0.002;

/// Sideways call: dominant direction needs this many percentage points of
/// separation between the bullish and bearish masses.
const SIDEWAYS_BAND_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnState {
    StrongDown,
    ModerateDown,
    Flat,
    ModerateUp,
    StrongUp,
}

impl ReturnState {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::StrongDown => 0,
            Self::ModerateDown => 1,
            Self::Flat => 2,
            Self::ModerateUp => 3,
            Self::StrongUp => 4,
        }
    }
}

/// Bucket a daily return. Bands are half-open on the upper side.
#[inline]
pub fn classify_return(r: f64) -> ReturnState {
    if r >= STRONG_MOVE {
        ReturnState::StrongUp
    } else if r >= FLAT_BAND {
        ReturnState::ModerateUp
    } else if r >= -FLAT_BAND {
        ReturnState::Flat
    } else if r >= -STRONG_MOVE {
        ReturnState::ModerateDown
    } else {
        ReturnState::StrongDown
    }
}

#[derive(Debug, Clone)]
pub struct MarkovChain {
    /// Row-stochastic: transition[from][to]. Rows with no observations fall
    /// back to the uniform distribution.
    transition: [[f64; NUM_STATES]; NUM_STATES],
    last_state: ReturnState,
}

impl MarkovChain {
    /// Estimate from a close series, oldest first. Needs at least two daily
    /// returns (one transition); returns None otherwise so the caller can
    /// fall back to a neutral direction.
    pub fn from_closes(closes: &[f64]) -> Option<Self> {
        let returns = daily_returns(closes);
        if returns.len() < 2 {
            return None;
        }

        let states: Vec<ReturnState> = returns.iter().copied().map(classify_return).collect();
        let Some(&last_state) = states.last() else {
            return None;
        };

        let mut counts = [[0.0_f64; NUM_STATES]; NUM_STATES];
        for w in states.windows(2) {
            counts[w[0].index()][w[1].index()] += 1.0;
        }

        let mut transition = [[0.0_f64; NUM_STATES]; NUM_STATES];
        for (row, count_row) in transition.iter_mut().zip(counts.iter()) {
            let total: f64 = count_row.iter().sum();
            if total > 0.0 {
                for (cell, c) in row.iter_mut().zip(count_row.iter()) {
                    *cell = c / total;
                }
            } else {
                row.fill(1.0 / NUM_STATES as f64);
            }
        }

        Some(Self {
            transition,
            last_state,
        })
    }

    /// Next-state distribution from the latest observed state.
    #[inline]
    pub fn next_state_probabilities(&self) -> [f64; NUM_STATES] {
        self.transition[self.last_state.index()]
    }

    /// Aggregate the next-state distribution into a direction call.
    pub fn direction_estimate(&self) -> DirectionEstimate {
        let row = self.next_state_probabilities();
        let bullish_pct = (row[ReturnState::ModerateUp.index()]
            + row[ReturnState::StrongUp.index()])
            * 100.0;
        let bearish_pct = (row[ReturnState::StrongDown.index()]
            + row[ReturnState::ModerateDown.index()])
            * 100.0;
        let sideways_pct = row[ReturnState::Flat.index()] * 100.0;

        let direction = if (bullish_pct - bearish_pct).abs() < SIDEWAYS_BAND_PCT {
            Direction::Sideways
        } else if bullish_pct > bearish_pct {
            Direction::Bullish
        } else {
            Direction::Bearish
        };

        DirectionEstimate {
            direction,
            bullish_pct,
            bearish_pct,
            sideways_pct,
        }
    }
}

/// Fallback when the history is too short to estimate transitions.
pub fn neutral_direction() -> DirectionEstimate {
    DirectionEstimate {
        direction: Direction::Sideways,
        bullish_pct: 40.0,
        bearish_pct: 40.0,
        sideways_pct: 20.0,
    }
}

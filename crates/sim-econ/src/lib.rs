#![deny(warnings)]

//! Impact engine: per-round deltas, clamping and bankruptcy detection.
//!
//! A decision is scored in three steps:
//! - [`RawDraw::sample`] draws the unscaled random magnitudes,
//! - [`ImpactDelta::from_draw`] signs them by correctness and scales them by
//!   the difficulty multiplier,
//! - [`apply_delta`] adds the delta, clamps the company back into bounds and
//!   evaluates the bankruptcy condition.
//!
//! [`apply`] runs all three for the chosen option.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_core::{Challenge, CompanyState, Difficulty, OptionLabel};
use tracing::debug;

/// Capital at or below this counts toward bankruptcy (only together with low morale).
pub const BANKRUPT_CAPITAL: i64 = 10_000;
/// Employee satisfaction at or below this counts toward bankruptcy (only with low capital).
pub const BANKRUPT_SATISFACTION: f64 = 20.0;
/// Customer satisfaction at or below this ends the game on its own.
pub const BANKRUPT_CUSTOMER_SATISFACTION: f64 = 10.0;
/// Market share at or below this ends the game on its own.
pub const BANKRUPT_MARKET_SHARE: f64 = 5.0;

/// Unscaled, unsigned random magnitudes for one decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDraw {
    /// Fraction of current capital, in [0.01, 0.05].
    pub capital_frac: f64,
    /// Head count change magnitude, 0 or 1.
    pub employees: u32,
    /// In [3,8] when correct, [5,10] otherwise.
    pub satisfaction: u32,
    /// Same shape as `satisfaction`, drawn independently.
    pub customer_satisfaction: u32,
    /// In [0.5, 2.0].
    pub market_share: f64,
}

impl RawDraw {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, correct: bool) -> Self {
        let morale_range = if correct { 3..=8 } else { 5..=10 };
        Self {
            capital_frac: rng.gen_range(0.01..=0.05),
            employees: rng.gen_range(0..=1),
            satisfaction: rng.gen_range(morale_range.clone()),
            customer_satisfaction: rng.gen_range(morale_range),
            market_share: rng.gen_range(0.5..=2.0),
        }
    }
}

/// Signed, scaled change applied to a company.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactDelta {
    pub capital: i64,
    pub employees: i64,
    pub satisfaction: f64,
    pub customer_satisfaction: f64,
    pub market_share: f64,
}

impl ImpactDelta {
    pub const ZERO: ImpactDelta = ImpactDelta {
        capital: 0,
        employees: 0,
        satisfaction: 0.0,
        customer_satisfaction: 0.0,
        market_share: 0.0,
    };

    /// Sign `draw` by correctness and scale it for `difficulty`.
    ///
    /// The capital delta is a fraction of `capital` (the value before the
    /// decision), truncated toward zero. Employees are never scaled.
    pub fn from_draw(draw: RawDraw, capital: i64, correct: bool, difficulty: Difficulty) -> Self {
        let m = difficulty.multiplier();
        let sign: i64 = if correct { 1 } else { -1 };
        let fsign = sign as f64;
        let capital_mag = (capital as f64 * draw.capital_frac * m).trunc() as i64;
        Self {
            capital: sign * capital_mag,
            employees: sign * i64::from(draw.employees),
            satisfaction: fsign * f64::from(draw.satisfaction) * m,
            customer_satisfaction: fsign * f64::from(draw.customer_satisfaction) * m,
            market_share: fsign * draw.market_share * m,
        }
    }
}

/// Result of applying one decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub chosen: OptionLabel,
    pub correct: bool,
    pub delta: ImpactDelta,
    /// The company met the bankruptcy condition after clamping.
    pub terminal: bool,
}

impl Impact {
    /// Effect attributed to `label`; only the chosen label ever has one.
    pub fn delta_for(&self, label: OptionLabel) -> ImpactDelta {
        if label == self.chosen {
            self.delta
        } else {
            ImpactDelta::ZERO
        }
    }
}

/// Bankruptcy condition, meant to be evaluated on a clamped company.
pub fn is_bankrupt(c: &CompanyState) -> bool {
    (c.capital <= BANKRUPT_CAPITAL && c.satisfaction <= BANKRUPT_SATISFACTION)
        || c.customer_satisfaction <= BANKRUPT_CUSTOMER_SATISFACTION
        || c.market_share <= BANKRUPT_MARKET_SHARE
}

/// Add `delta`, clamp into bounds and report whether the company went bankrupt.
pub fn apply_delta(company: &mut CompanyState, delta: &ImpactDelta) -> bool {
    company.capital = company.capital.saturating_add(delta.capital);
    let employees = i64::from(company.employees).saturating_add(delta.employees);
    company.employees = u32::try_from(employees.max(0)).unwrap_or(u32::MAX);
    company.satisfaction += delta.satisfaction;
    company.customer_satisfaction += delta.customer_satisfaction;
    company.market_share += delta.market_share;
    company.clamp_to_bounds();
    is_bankrupt(company)
}

/// Score `chosen` against `challenge` and mutate `company` accordingly.
pub fn apply<R: Rng + ?Sized>(
    company: &mut CompanyState,
    chosen: OptionLabel,
    challenge: &Challenge,
    difficulty: Difficulty,
    rng: &mut R,
) -> Impact {
    let correct = challenge.is_correct(chosen);
    let draw = RawDraw::sample(rng, correct);
    let delta = ImpactDelta::from_draw(draw, company.capital, correct, difficulty);
    let terminal = apply_delta(company, &delta);
    debug!(%chosen, correct, %difficulty, ?delta, terminal, "applied impact");
    Impact {
        chosen,
        correct,
        delta,
        terminal,
    }
}

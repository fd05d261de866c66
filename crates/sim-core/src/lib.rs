#![deny(warnings)]

//! Core domain models and invariants for CEO Sim.
//!
//! This crate defines serializable types shared by the impact engine, the
//! content adapter and the round orchestrator, with validation helpers that
//! guard the invariants generated or loaded data must satisfy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of rounds in a full game.
pub const MAX_ROUNDS: u32 = 20;
/// Capital never drops below this value after an impact.
pub const CAPITAL_FLOOR: i64 = 1_000;
/// A company always keeps at least one employee.
pub const MIN_EMPLOYEES: u32 = 1;
/// Upper bound for every percentage metric.
pub const PERCENT_MAX: f64 = 100.0;

/// Employee satisfaction at game start.
pub const INITIAL_SATISFACTION: f64 = 70.0;
/// Customer satisfaction at game start.
pub const INITIAL_CUSTOMER_SATISFACTION: f64 = 70.0;
/// Market share at game start.
pub const INITIAL_MARKET_SHARE: f64 = 20.0;

/// Difficulty tier selected when a game starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Scalar applied to every non-employee impact magnitude.
    pub const fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// One of the four answer labels of a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub const fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            _ => Err(ValidationError::UnknownLabel(s.to_string())),
        }
    }
}

/// A value for each of the four labels; all four are always present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerOption<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
    #[serde(rename = "C")]
    pub c: T,
    #[serde(rename = "D")]
    pub d: T,
}

impl<T> PerOption<T> {
    pub fn new(a: T, b: T, c: T, d: T) -> Self {
        Self { a, b, c, d }
    }

    pub fn get(&self, label: OptionLabel) -> &T {
        match label {
            OptionLabel::A => &self.a,
            OptionLabel::B => &self.b,
            OptionLabel::C => &self.c,
            OptionLabel::D => &self.d,
        }
    }

    pub fn get_mut(&mut self, label: OptionLabel) -> &mut T {
        match label {
            OptionLabel::A => &mut self.a,
            OptionLabel::B => &mut self.b,
            OptionLabel::C => &mut self.c,
            OptionLabel::D => &mut self.d,
        }
    }

    /// Labels paired with their values, in A..D order.
    pub fn iter(&self) -> impl Iterator<Item = (OptionLabel, &T)> {
        OptionLabel::ALL.into_iter().map(move |l| (l, self.get(l)))
    }

    pub fn map<U>(self, mut f: impl FnMut(OptionLabel, T) -> U) -> PerOption<U> {
        PerOption {
            a: f(OptionLabel::A, self.a),
            b: f(OptionLabel::B, self.b),
            c: f(OptionLabel::C, self.c),
            d: f(OptionLabel::D, self.d),
        }
    }
}

/// A key person in the company. Names need not be unique.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub role: String,
}

/// Company profile as produced by the content generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Products or services offered.
    pub products: String,
    /// General description of the inventory.
    pub inventory: String,
    /// Starting capital in USD (> 0).
    pub capital: i64,
    /// Head count (>= 1).
    pub employees: u32,
    /// Key personnel in display order.
    pub personnel: Vec<Person>,
}

/// The mutable state of the simulated company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyState {
    pub products: String,
    pub inventory: String,
    pub personnel: Vec<Person>,
    /// Cash in USD, floored at [`CAPITAL_FLOOR`].
    pub capital: i64,
    /// Head count, at least [`MIN_EMPLOYEES`].
    pub employees: u32,
    /// Employee satisfaction in [0,100].
    pub satisfaction: f64,
    /// Customer satisfaction in [0,100].
    pub customer_satisfaction: f64,
    /// Market share in [0,100].
    pub market_share: f64,
}

impl CompanyState {
    /// Builds the starting state from a generated profile.
    pub fn from_profile(profile: CompanyProfile) -> Self {
        Self {
            products: profile.products,
            inventory: profile.inventory,
            personnel: profile.personnel,
            capital: profile.capital,
            employees: profile.employees,
            satisfaction: INITIAL_SATISFACTION,
            customer_satisfaction: INITIAL_CUSTOMER_SATISFACTION,
            market_share: INITIAL_MARKET_SHARE,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            capital: self.capital,
            employees: self.employees,
            satisfaction: self.satisfaction,
            customer_satisfaction: self.customer_satisfaction,
            market_share: self.market_share,
        }
    }

    /// Raises capital and head count to their floors and clamps percentages.
    pub fn clamp_to_bounds(&mut self) {
        self.capital = self.capital.max(CAPITAL_FLOOR);
        self.employees = self.employees.max(MIN_EMPLOYEES);
        self.satisfaction = clamp_percent(self.satisfaction);
        self.customer_satisfaction = clamp_percent(self.customer_satisfaction);
        self.market_share = clamp_percent(self.market_share);
    }
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, PERCENT_MAX)
}

/// The five tracked metrics at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub capital: i64,
    pub employees: u32,
    pub satisfaction: f64,
    pub customer_satisfaction: f64,
    pub market_share: f64,
}

/// A single decision point with four labeled options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub description: String,
    pub options: PerOption<String>,
    pub correct_option: OptionLabel,
    /// Outcome narrative shown after choosing each option.
    pub consequences: PerOption<String>,
}

impl Challenge {
    pub fn option(&self, label: OptionLabel) -> &str {
        self.options.get(label)
    }

    pub fn consequence(&self, label: OptionLabel) -> &str {
        self.consequences.get(label)
    }

    pub fn is_correct(&self, label: OptionLabel) -> bool {
        self.correct_option == label
    }
}

/// History entry written once per confirmed decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// 1-based round number.
    pub round: u32,
    /// Challenge description.
    pub challenge: String,
    pub choice: OptionLabel,
    pub consequence: String,
    /// Metrics right after the decision was applied.
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Outcome of the latest decision, shown until the player moves on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// 1-based round the decision belongs to.
    pub round: u32,
    pub choice: OptionLabel,
    pub consequence: String,
    /// The decision bankrupted the company.
    pub terminal: bool,
}

/// Game settings chosen before a session starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    /// Seed for deterministic RNG; drawn from entropy when absent.
    pub rng_seed: Option<u64>,
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Difficulty string is not one of Easy, Medium, Hard.
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
    /// Option label is not one of A..D.
    #[error("unknown option label: {0}")]
    UnknownLabel(String),
    /// A required text field is blank.
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    /// Capital must be strictly positive.
    #[error("capital must be > 0, got {0}")]
    NonPositiveCapital(i64),
    /// Capital is below the floor the impact engine maintains.
    #[error("capital {0} is below the floor")]
    CapitalBelowFloor(i64),
    /// Head count must be at least one.
    #[error("employees must be >= 1")]
    NoEmployees,
    /// Percentage outside [0,100] or not finite.
    #[error("`{0}` must be within [0,100]")]
    PercentOutOfRange(&'static str),
    /// Round counter beyond the round cap.
    #[error("round {0} exceeds the round cap")]
    RoundOutOfRange(u32),
}

fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn require_percent(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=PERCENT_MAX).contains(&value) {
        return Err(ValidationError::PercentOutOfRange(field));
    }
    Ok(())
}

/// Validate a freshly generated company profile.
pub fn validate_profile(p: &CompanyProfile) -> Result<(), ValidationError> {
    require_text(&p.products, "products")?;
    require_text(&p.inventory, "inventory")?;
    if p.capital <= 0 {
        return Err(ValidationError::NonPositiveCapital(p.capital));
    }
    if p.employees < MIN_EMPLOYEES {
        return Err(ValidationError::NoEmployees);
    }
    for person in &p.personnel {
        require_text(&person.name, "personnel.name")?;
        require_text(&person.role, "personnel.role")?;
    }
    Ok(())
}

/// Validate a challenge: every text present and non-blank.
pub fn validate_challenge(c: &Challenge) -> Result<(), ValidationError> {
    require_text(&c.description, "description")?;
    for (_, text) in c.options.iter() {
        require_text(text, "options")?;
    }
    for (_, text) in c.consequences.iter() {
        require_text(text, "consequences")?;
    }
    Ok(())
}

/// Validate a company state restored from outside the impact engine.
///
/// The initial snapshot may legitimately hold capital below the floor (it
/// comes straight from the profile), so only positivity is required there;
/// pass `enforce_floor` for states that went through at least one impact.
pub fn validate_company_state(
    c: &CompanyState,
    enforce_floor: bool,
) -> Result<(), ValidationError> {
    if c.capital <= 0 {
        return Err(ValidationError::NonPositiveCapital(c.capital));
    }
    if enforce_floor && c.capital < CAPITAL_FLOOR {
        return Err(ValidationError::CapitalBelowFloor(c.capital));
    }
    if c.employees < MIN_EMPLOYEES {
        return Err(ValidationError::NoEmployees);
    }
    require_percent(c.satisfaction, "satisfaction")?;
    require_percent(c.customer_satisfaction, "customer_satisfaction")?;
    require_percent(c.market_share, "market_share")?;
    Ok(())
}

/// Validate a round counter.
pub fn validate_round(round: u32) -> Result<(), ValidationError> {
    if round > MAX_ROUNDS {
        return Err(ValidationError::RoundOutOfRange(round));
    }
    Ok(())
}

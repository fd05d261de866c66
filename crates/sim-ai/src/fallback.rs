//! Built-in content used when the generator cannot deliver.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use sim_core::{Challenge, CompanyProfile, CompanyState, Difficulty, OptionLabel, PerOption, Person};

/// Shown instead of a narrated evaluation when the generator is unavailable.
pub const APOLOGY_TEXT: &str = "Sorry, the final analysis could not be generated right now. \
Compare the initial and final figures to judge how the company fared.";

/// Market share below this favours the competitor scenario.
pub const MARKET_SHARE_DANGER: f64 = 15.0;
/// Customer satisfaction below this favours the PR crisis scenario.
pub const CUSTOMER_SATISFACTION_DANGER: f64 = 50.0;
/// Capital below this favours the cost pressure scenario.
pub const CAPITAL_DANGER: i64 = 100_000;
/// Employee satisfaction below this favours the morale scenario.
pub const SATISFACTION_DANGER: f64 = 50.0;

/// The profile used when no generated profile could be obtained.
pub fn default_profile() -> CompanyProfile {
    let person = |name: &str, role: &str| Person {
        name: name.to_string(),
        role: role.to_string(),
    };
    CompanyProfile {
        products: "Business management software and IT consulting".to_string(),
        inventory: "Software licenses, servers and office equipment".to_string(),
        capital: 500_000,
        employees: 50,
        personnel: vec![
            person("Ana López", "Sales Manager"),
            person("Carlos Pérez", "Finance Manager"),
            person("María Gómez", "Human Resources Manager"),
        ],
    }
}

/// The canned scenarios of the fallback pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackScenario {
    Competitor,
    PrCrisis,
    CostPressure,
    Morale,
}

impl FallbackScenario {
    pub const ALL: [FallbackScenario; 4] = [
        FallbackScenario::Competitor,
        FallbackScenario::PrCrisis,
        FallbackScenario::CostPressure,
        FallbackScenario::Morale,
    ];

    /// Whether the metric this scenario is about is in its danger zone.
    pub fn in_danger(self, company: &CompanyState) -> bool {
        match self {
            FallbackScenario::Competitor => company.market_share < MARKET_SHARE_DANGER,
            FallbackScenario::PrCrisis => company.customer_satisfaction < CUSTOMER_SATISFACTION_DANGER,
            FallbackScenario::CostPressure => company.capital < CAPITAL_DANGER,
            FallbackScenario::Morale => company.satisfaction < SATISFACTION_DANGER,
        }
    }
}

/// Relative weight of each scenario, in [`FallbackScenario::ALL`] order.
///
/// Every scenario starts at 1 and doubles when its metric is in danger.
pub fn scenario_weights(company: &CompanyState) -> [f64; 4] {
    FallbackScenario::ALL.map(|s| if s.in_danger(company) { 2.0 } else { 1.0 })
}

/// Weighted draw over the pool; weights are normalized by their sum.
pub fn pick_scenario<R: Rng + ?Sized>(company: &CompanyState, rng: &mut R) -> FallbackScenario {
    let weights = scenario_weights(company);
    let idx = WeightedIndex::new(weights)
        .map(|dist| dist.sample(rng))
        .unwrap_or(0);
    FallbackScenario::ALL[idx]
}

/// Sentence appended to every consequence of a fallback challenge.
pub fn difficulty_qualifier(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "The market is forgiving right now, so the effects are softened.",
        Difficulty::Medium => "The effects play out at their usual strength.",
        Difficulty::Hard => "In this unforgiving market the effects are amplified.",
    }
}

struct Script {
    description: &'static str,
    options: [&'static str; 4],
    correct: OptionLabel,
    consequences: [&'static str; 4],
}

fn script(scenario: FallbackScenario) -> Script {
    match scenario {
        FallbackScenario::Competitor => Script {
            description: "A well-funded competitor has launched a cheaper alternative to your main \
                          product and is winning over your customers.",
            options: [
                "Differentiate with better features and a targeted marketing campaign.",
                "Cut prices across the board to match the competitor.",
                "Ignore the competitor and keep the current plan.",
                "Run an aggressive campaign attacking the competitor's reputation.",
            ],
            correct: OptionLabel::A,
            consequences: [
                "Customers notice the improvements and most of them stay loyal.",
                "Sales recover slightly but margins shrink considerably.",
                "The competitor keeps gaining ground and your share erodes.",
                "The campaign backfires and customers see your brand as petty.",
            ],
        },
        FallbackScenario::PrCrisis => Script {
            description: "A wave of customer complaints about a faulty delivery has gone viral on \
                          social media.",
            options: [
                "Delete the negative comments and stay silent.",
                "Publicly apologize, explain the fix and compensate affected customers.",
                "Blame the logistics provider in a press release.",
                "Offer a generic discount code to everyone.",
            ],
            correct: OptionLabel::B,
            consequences: [
                "Screenshots of the deleted comments spread and the outrage grows.",
                "Customers appreciate the transparency and trust slowly returns.",
                "The public sees the company dodging responsibility.",
                "Some customers are placated, but the underlying anger remains.",
            ],
        },
        FallbackScenario::CostPressure => Script {
            description: "Supplier prices have risen sharply and cash reserves are shrinking faster \
                          than planned.",
            options: [
                "Lay off a large part of the staff immediately.",
                "Take a high-interest short-term loan to cover the gap.",
                "Renegotiate supplier contracts and trim non-essential spending.",
                "Pass the full cost increase on to customers at once.",
            ],
            correct: OptionLabel::C,
            consequences: [
                "Costs fall, but morale collapses and key people start leaving.",
                "The gap closes for now, but interest payments weigh on every month.",
                "Savings add up without hurting operations and the cash position stabilizes.",
                "Customers balk at the new prices and some switch to alternatives.",
            ],
        },
        FallbackScenario::Morale => Script {
            description: "Employee turnover is rising and exit interviews point to burnout and \
                          lack of recognition.",
            options: [
                "Announce mandatory overtime to make up for the departures.",
                "Ignore it; turnover is normal in this industry.",
                "Hold a one-off party to lift spirits.",
                "Run listening sessions and introduce flexible hours with targeted raises.",
            ],
            correct: OptionLabel::D,
            consequences: [
                "Burnout spreads and even more people hand in their notice.",
                "Open positions pile up and service quality starts to slip.",
                "People enjoy the evening, but nothing really changes.",
                "Staff feel heard, resignations drop and productivity picks up.",
            ],
        },
    }
}

/// Build the challenge for `scenario`, qualifying each consequence for `difficulty`.
pub fn fallback_challenge(scenario: FallbackScenario, difficulty: Difficulty) -> Challenge {
    let s = script(scenario);
    let [oa, ob, oc, od] = s.options.map(str::to_string);
    let [ca, cb, cc, cd] = s.consequences;
    let qualifier = difficulty_qualifier(difficulty);
    Challenge {
        description: s.description.to_string(),
        options: PerOption::new(oa, ob, oc, od),
        correct_option: s.correct,
        consequences: PerOption::new(ca, cb, cc, cd).map(|_, text| format!("{text} {qualifier}")),
    }
}

/// Pick a scenario weighted by the company's weak spots and build it.
pub fn pick_fallback_challenge<R: Rng + ?Sized>(
    company: &CompanyState,
    difficulty: Difficulty,
    rng: &mut R,
) -> (FallbackScenario, Challenge) {
    let scenario = pick_scenario(company, rng);
    (scenario, fallback_challenge(scenario, difficulty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sim_core::{validate_challenge, validate_profile};

    fn healthy() -> CompanyState {
        CompanyState::from_profile(default_profile())
    }

    #[test]
    fn default_profile_matches_contract() {
        let p = default_profile();
        validate_profile(&p).unwrap();
        assert_eq!(p.capital, 500_000);
        assert_eq!(p.employees, 50);
        assert_eq!(p.personnel.len(), 3);
    }

    #[test]
    fn every_fallback_is_valid_and_qualified() {
        for scenario in FallbackScenario::ALL {
            for difficulty in Difficulty::ALL {
                let c = fallback_challenge(scenario, difficulty);
                validate_challenge(&c).unwrap();
                for (_, text) in c.consequences.iter() {
                    assert!(text.ends_with(difficulty_qualifier(difficulty)));
                }
            }
        }
    }

    #[test]
    fn weights_double_only_in_danger() {
        assert_eq!(scenario_weights(&healthy()), [1.0; 4]);
        let mut c = healthy();
        c.market_share = 10.0;
        c.capital = 99_999;
        assert_eq!(scenario_weights(&c), [2.0, 1.0, 2.0, 1.0]);
        c.customer_satisfaction = 49.0;
        c.satisfaction = 49.9;
        assert_eq!(scenario_weights(&c), [2.0; 4]);
        // thresholds are strict
        let mut c = healthy();
        c.market_share = 15.0;
        c.customer_satisfaction = 50.0;
        c.capital = 100_000;
        c.satisfaction = 50.0;
        assert_eq!(scenario_weights(&c), [1.0; 4]);
    }

    #[test]
    fn low_market_share_doubles_competitor_frequency() {
        let mut c = healthy();
        c.market_share = 10.0;
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let trials = 20_000;
        let mut counts = [0usize; 4];
        for _ in 0..trials {
            let s = pick_scenario(&c, &mut rng);
            let idx = FallbackScenario::ALL.iter().position(|x| *x == s).unwrap();
            counts[idx] += 1;
        }
        // expected shares 2/5, 1/5, 1/5, 1/5
        let expected = [0.4, 0.2, 0.2, 0.2].map(|p| p * trials as f64);
        let chi2: f64 = counts
            .iter()
            .zip(expected)
            .map(|(&o, e)| (o as f64 - e).powi(2) / e)
            .sum();
        // df = 3, p = 0.001
        assert!(chi2 < 16.27, "chi2 {chi2} counts {counts:?}");
        let competitor_share = counts[0] as f64 / trials as f64;
        assert!((0.37..0.43).contains(&competitor_share), "{competitor_share}");
    }

    #[test]
    fn uniform_pool_when_healthy() {
        let c = healthy();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_scenario(&c, &mut rng));
        }
        assert_eq!(seen.len(), 4);
    }
}

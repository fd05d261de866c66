#![deny(warnings)]

//! Content generator adapter.
//!
//! Wraps a [`TextGenerator`] behind three calls that never fail: every
//! generator error is retried under a [`RetryPolicy`] and, once attempts run
//! out, answered with built-in content from [`fallback`]. The returned
//! [`Generated`] says which of the two paths produced the value.

pub mod fallback;
pub mod gemini;
pub mod generator;
pub mod parse;
pub mod prompts;
pub mod retry;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{Challenge, CompanyProfile, CompanyState, Difficulty};
use tracing::{info, warn};

pub use fallback::{default_profile, FallbackScenario, APOLOGY_TEXT};
pub use gemini::{GeminiClient, GeminiConfig};
pub use generator::{GeneratorError, OfflineGenerator, TextGenerator};
#[cfg(any(test, feature = "testing"))]
pub use generator::ScriptedGenerator;
pub use retry::RetryPolicy;

/// Where a piece of content came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentSource {
    Generator,
    Fallback,
}

/// A value together with its [`ContentSource`].
#[derive(Clone, Debug, PartialEq)]
pub struct Generated<T> {
    pub value: T,
    pub source: ContentSource,
}

impl<T> Generated<T> {
    fn generated(value: T) -> Self {
        Self {
            value,
            source: ContentSource::Generator,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            source: ContentSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ContentSource::Fallback
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Total adapter over a text generator.
pub struct ContentGenerator<G> {
    generator: G,
    retry: RetryPolicy,
    rng: ChaCha8Rng,
}

impl<G: TextGenerator> ContentGenerator<G> {
    /// `seed` drives the weighted choice of fallback challenges.
    pub fn new(generator: G, retry: RetryPolicy, seed: u64) -> Self {
        Self {
            generator,
            retry,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    fn request<T>(
        &mut self,
        what: &str,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, GeneratorError>,
    ) -> Result<T, GeneratorError> {
        let retry = self.retry;
        let generator = &mut self.generator;
        retry.run(what, |_| {
            let reply = generator.generate(prompt)?;
            parse(&reply)
        })
    }

    /// Generate the starting company, or [`default_profile`] on failure.
    pub fn generate_profile(&mut self) -> Generated<CompanyProfile> {
        match self.request("profile", prompts::PROFILE_PROMPT, parse::parse_profile) {
            Ok(profile) => {
                info!(generator = self.generator.name(), "generated company profile");
                Generated::generated(profile)
            }
            Err(e) => {
                warn!(error = %e, "profile generation failed, using default profile");
                Generated::fallback(default_profile())
            }
        }
    }

    /// Generate a challenge for the current company, or a weighted fallback.
    pub fn generate_challenge(
        &mut self,
        company: &CompanyState,
        difficulty: Difficulty,
    ) -> Generated<Challenge> {
        let prompt = prompts::challenge_prompt(company, difficulty);
        match self.request("challenge", &prompt, parse::parse_challenge) {
            Ok(challenge) => Generated::generated(challenge),
            Err(e) => {
                let (scenario, challenge) =
                    fallback::pick_fallback_challenge(company, difficulty, &mut self.rng);
                warn!(error = %e, ?scenario, "challenge generation failed, using fallback");
                Generated::fallback(challenge)
            }
        }
    }

    /// Narrate the comparison between the first and last company state.
    pub fn evaluate_outcome(
        &mut self,
        initial: &CompanyState,
        final_state: &CompanyState,
    ) -> Generated<String> {
        let prompt = prompts::evaluation_prompt(initial, final_state);
        match self.request("evaluation", &prompt, parse::parse_evaluation) {
            Ok(text) => Generated::generated(text),
            Err(e) => {
                warn!(error = %e, "evaluation failed, using apology text");
                Generated::fallback(APOLOGY_TEXT.to_string())
            }
        }
    }
}

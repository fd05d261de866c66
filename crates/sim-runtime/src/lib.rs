#![deny(warnings)]

//! Round orchestrator for a 20-round game.
//!
//! [`Simulation`] owns the content adapter, the impact RNG and at most one
//! [`GameSession`]. Progress goes through [`Simulation::turn`], which hands
//! out a handle for the single action the current phase allows; each action
//! consumes its handle, so a challenge cannot be decided twice and a round
//! cannot be advanced before its decision.

pub mod history;
pub mod session;

pub use history::{HistoryLog, Metric};
pub use session::{GameSession, Outcome, Phase};

use persistence::{PersistenceError, SaveFile};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_ai::{ContentGenerator, ContentSource, Generated, RetryPolicy, TextGenerator};
use sim_core::{Challenge, CompanyState, Difficulty, MetricsSnapshot, OptionLabel, RoundResult};
use sim_econ::Impact;
use std::path::Path;
use tracing::info;

use session::{DecisionSlot, Slot};

/// Keeps the fallback picks and the impact draws on separate streams.
const CONTENT_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Coarse lifecycle of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    NotStarted,
    /// `round` decisions have been completed and advanced past.
    InProgress { round: u32 },
    Finished(Outcome),
}

pub struct Simulation<G> {
    content: ContentGenerator<G>,
    rng: ChaCha8Rng,
    session: Option<GameSession>,
}

impl<G: TextGenerator> Simulation<G> {
    /// All randomness derives from `seed`.
    pub fn new(generator: G, retry: RetryPolicy, seed: u64) -> Self {
        Self {
            content: ContentGenerator::new(generator, retry, seed ^ CONTENT_STREAM),
            rng: ChaCha8Rng::seed_from_u64(seed),
            session: None,
        }
    }

    pub fn content(&self) -> &ContentGenerator<G> {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ContentGenerator<G> {
        &mut self.content
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut GameSession> {
        self.session.as_mut()
    }

    pub fn state(&self) -> GameState {
        match self.session.as_ref().map(GameSession::phase) {
            None => GameState::NotStarted,
            Some(Phase::Finished(outcome)) => GameState::Finished(outcome),
            Some(_) => GameState::InProgress {
                round: self.session.as_ref().map_or(0, GameSession::round),
            },
        }
    }

    /// Generate a company and begin a new game, replacing any current one.
    pub fn start(&mut self, difficulty: Difficulty) -> ContentSource {
        let profile = self.content.generate_profile();
        let source = profile.source;
        let session = GameSession::new(difficulty, profile.into_value());
        info!(
            %difficulty,
            capital = session.company().capital,
            employees = session.company().employees,
            ?source,
            "game started"
        );
        self.session = Some(session);
        source
    }

    /// Drop the current game.
    pub fn reset(&mut self) {
        if self.session.take().is_some() {
            info!("game reset");
        }
    }

    /// The action available right now.
    pub fn turn(&mut self) -> Turn<'_, G> {
        let Self {
            content,
            rng,
            session,
        } = self;
        let Some(session) = session.as_mut() else {
            return Turn::NotStarted;
        };
        match session.slot() {
            Slot::Open(session) => Turn::NeedsChallenge(ChallengeRequest { session, content }),
            Slot::Deciding(slot) => Turn::AwaitingDecision(PendingDecision { slot, rng }),
            Slot::Resolved(result, session) => Turn::Resolved(ResolvedRound { result, session }),
            Slot::Finished(session, outcome) => Turn::Finished(FinishedGame {
                session,
                outcome,
                content,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let session = self.session.as_ref().ok_or(PersistenceError::NothingToSave)?;
        persistence::write_save(path, &session.to_save())
    }

    /// Replace the current game with the one saved at `path`.
    ///
    /// On error the current game is left as it was.
    pub fn load(&mut self, path: &Path) -> Result<(), PersistenceError> {
        let save = persistence::read_save(path)?;
        self.install(save)
    }

    /// Like [`Simulation::load`], from a JSON document.
    pub fn load_str(&mut self, json: &str) -> Result<(), PersistenceError> {
        let save = persistence::from_json(json)?;
        self.install(save)
    }

    fn install(&mut self, save: SaveFile) -> Result<(), PersistenceError> {
        let session = GameSession::from_save(save)?;
        info!(
            round = session.round(),
            difficulty = %session.difficulty(),
            phase = ?session.phase(),
            "game restored"
        );
        self.session = Some(session);
        Ok(())
    }
}

/// Handle for the one legal action of the current phase.
pub enum Turn<'a, G> {
    NotStarted,
    NeedsChallenge(ChallengeRequest<'a, G>),
    AwaitingDecision(PendingDecision<'a>),
    Resolved(ResolvedRound<'a>),
    Finished(FinishedGame<'a, G>),
}

/// No challenge is held for the next round yet.
pub struct ChallengeRequest<'a, G> {
    session: &'a mut GameSession,
    content: &'a mut ContentGenerator<G>,
}

impl<'a, G: TextGenerator> ChallengeRequest<'a, G> {
    /// 1-based round the challenge will belong to.
    pub fn round(&self) -> u32 {
        self.session.round() + 1
    }

    pub fn company(&self) -> &CompanyState {
        self.session.company()
    }

    /// Fetch a challenge and hold it until it is decided.
    pub fn ensure_challenge(self) -> Generated<&'a Challenge> {
        let round = self.round();
        let generated = self
            .content
            .generate_challenge(self.session.company(), self.session.difficulty());
        let source = generated.source;
        info!(round, ?source, "challenge ready");
        Generated {
            value: self.session.hold_challenge(generated.value),
            source,
        }
    }
}

/// A challenge is waiting for the player's choice.
pub struct PendingDecision<'a> {
    slot: DecisionSlot<'a>,
    rng: &'a mut ChaCha8Rng,
}

impl<'a> PendingDecision<'a> {
    pub fn round(&self) -> u32 {
        self.slot.round()
    }

    pub fn challenge(&self) -> &'a Challenge {
        self.slot.challenge()
    }

    pub fn company(&self) -> &CompanyState {
        self.slot.company()
    }

    /// Apply `choice` to the company and record it.
    pub fn decide(self, choice: OptionLabel) -> Impact {
        self.slot.resolve(choice, self.rng)
    }
}

/// The round's decision was applied and the game goes on.
pub struct ResolvedRound<'a> {
    result: RoundResult,
    session: &'a mut GameSession,
}

impl ResolvedRound<'_> {
    pub fn result(&self) -> &RoundResult {
        &self.result
    }

    pub fn company(&self) -> &CompanyState {
        self.session.company()
    }

    pub fn history(&self) -> &HistoryLog {
        self.session.history()
    }

    /// Move on to the next round, or to the end of the game after round 20.
    pub fn advance(self) -> Phase {
        self.session.advance()
    }
}

/// The game is over.
pub struct FinishedGame<'a, G> {
    session: &'a GameSession,
    outcome: Outcome,
    content: &'a mut ContentGenerator<G>,
}

impl<'a, G: TextGenerator> FinishedGame<'a, G> {
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn session(&self) -> &'a GameSession {
        self.session
    }

    pub fn initial_metrics(&self) -> MetricsSnapshot {
        self.session.initial_company().metrics()
    }

    pub fn final_metrics(&self) -> MetricsSnapshot {
        self.session.company().metrics()
    }

    /// The bankrupting decision, when that is how the game ended.
    pub fn last_result(&self) -> Option<&'a RoundResult> {
        self.session.pending_result()
    }

    pub fn history(&self) -> &'a HistoryLog {
        self.session.history()
    }

    /// Ask for a narrated verdict comparing the first and last company state.
    pub fn evaluate(self) -> Generated<String> {
        self.content
            .evaluate_outcome(self.session.initial_company(), self.session.company())
    }
}

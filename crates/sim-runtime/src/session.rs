//! The state of one game and its round lifecycle.

use persistence::{PersistenceError, SaveFile};
use rand::Rng;
use sim_core::{
    Challenge, CompanyProfile, CompanyState, DecisionRecord, Difficulty, OptionLabel, RoundResult,
    MAX_ROUNDS,
};
use sim_econ::Impact;
use tracing::info;

use crate::history::HistoryLog;

/// How a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// All rounds were played.
    Normal,
    /// A decision met the bankruptcy condition.
    Bankrupt,
}

/// Where a session stands within the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingChallenge,
    AwaitingDecision,
    /// A decision was applied; the player has not moved on yet.
    Resolved,
    Finished(Outcome),
}

/// Mutable access to a session, narrowed to what its phase permits.
pub(crate) enum Slot<'a> {
    Open(&'a mut GameSession),
    Deciding(DecisionSlot<'a>),
    Resolved(RoundResult, &'a mut GameSession),
    Finished(&'a GameSession, Outcome),
}

/// The pending challenge plus the fields a decision writes.
pub(crate) struct DecisionSlot<'a> {
    challenge: &'a Challenge,
    /// 1-based round this decision belongs to.
    round: u32,
    difficulty: Difficulty,
    company: &'a mut CompanyState,
    history: &'a mut HistoryLog,
    game_over: &'a mut bool,
    pending_result: &'a mut Option<RoundResult>,
}

impl<'a> DecisionSlot<'a> {
    pub(crate) fn challenge(&self) -> &'a Challenge {
        self.challenge
    }

    pub(crate) fn company(&self) -> &CompanyState {
        self.company
    }

    pub(crate) fn round(&self) -> u32 {
        self.round
    }

    /// Apply `choice`, log it and hold the result until the player advances.
    pub(crate) fn resolve<R: Rng + ?Sized>(self, choice: OptionLabel, rng: &mut R) -> Impact {
        let impact = sim_econ::apply(self.company, choice, self.challenge, self.difficulty, rng);
        let consequence = self.challenge.consequence(choice).to_string();
        self.history.append(DecisionRecord {
            round: self.round,
            challenge: self.challenge.description.clone(),
            choice,
            consequence: consequence.clone(),
            metrics: self.company.metrics(),
        });
        *self.pending_result = Some(RoundResult {
            round: self.round,
            choice,
            consequence,
            terminal: impact.terminal,
        });
        if impact.terminal {
            *self.game_over = true;
        }
        info!(
            round = self.round,
            %choice,
            correct = impact.correct,
            capital = self.company.capital,
            terminal = impact.terminal,
            "decision applied"
        );
        impact
    }
}

/// One game in progress or finished.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    difficulty: Difficulty,
    round: u32,
    company: CompanyState,
    initial_company: CompanyState,
    history: HistoryLog,
    game_over: bool,
    pending_challenge: Option<Challenge>,
    pending_result: Option<RoundResult>,
    page: Option<String>,
}

impl GameSession {
    /// Seed the company metrics and take the initial snapshot.
    pub fn new(difficulty: Difficulty, profile: CompanyProfile) -> Self {
        let company = CompanyState::from_profile(profile);
        Self {
            difficulty,
            round: 0,
            initial_company: company.clone(),
            company,
            history: HistoryLog::new(),
            game_over: false,
            pending_challenge: None,
            pending_result: None,
            page: None,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Completed rounds, 0..=20.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn company(&self) -> &CompanyState {
        &self.company
    }

    pub fn initial_company(&self) -> &CompanyState {
        &self.initial_company
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn pending_challenge(&self) -> Option<&Challenge> {
        self.pending_challenge.as_ref()
    }

    pub fn pending_result(&self) -> Option<&RoundResult> {
        self.pending_result.as_ref()
    }

    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn set_page(&mut self, page: impl Into<String>) {
        self.page = Some(page.into());
    }

    pub fn phase(&self) -> Phase {
        if self.game_over {
            Phase::Finished(Outcome::Bankrupt)
        } else if self.round >= MAX_ROUNDS {
            Phase::Finished(Outcome::Normal)
        } else if self.pending_result.is_some() {
            Phase::Resolved
        } else if self.pending_challenge.is_some() {
            Phase::AwaitingDecision
        } else {
            Phase::AwaitingChallenge
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase() {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub(crate) fn hold_challenge(&mut self, challenge: Challenge) -> &Challenge {
        debug_assert_eq!(self.phase(), Phase::AwaitingChallenge);
        self.pending_challenge.insert(challenge)
    }

    /// Split the session into the handle the current phase allows.
    pub(crate) fn slot(&mut self) -> Slot<'_> {
        if let Some(outcome) = self.outcome() {
            return Slot::Finished(self, outcome);
        }
        if let Some(ref result) = self.pending_result {
            return Slot::Resolved(result.clone(), self);
        }
        match self.pending_challenge {
            Some(ref challenge) => Slot::Deciding(DecisionSlot {
                challenge,
                round: self.round + 1,
                difficulty: self.difficulty,
                company: &mut self.company,
                history: &mut self.history,
                game_over: &mut self.game_over,
                pending_result: &mut self.pending_result,
            }),
            None => Slot::Open(self),
        }
    }

    /// Clear the round's challenge and result and move to the next round.
    ///
    /// Only reachable in [`Phase::Resolved`].
    pub(crate) fn advance(&mut self) -> Phase {
        debug_assert_eq!(self.phase(), Phase::Resolved);
        self.pending_challenge = None;
        self.pending_result = None;
        self.round += 1;
        let phase = self.phase();
        if let Phase::Finished(outcome) = phase {
            info!(round = self.round, ?outcome, "game finished");
        }
        phase
    }

    /// Snapshot for persistence.
    pub fn to_save(&self) -> SaveFile {
        SaveFile {
            company: self.company.clone(),
            round: self.round,
            history: self.history.records().to_vec(),
            game_over: self.game_over,
            initial_company: self.initial_company.clone(),
            difficulty: self.difficulty,
            page: self.page.clone(),
            pending_challenge: self.pending_challenge.clone(),
            pending_result: self.pending_result.clone(),
            saved_at: None,
        }
    }

    /// Rebuild a session from a save; the save is validated first.
    pub fn from_save(save: SaveFile) -> Result<Self, PersistenceError> {
        save.validate()?;
        if save.game_over != sim_econ::is_bankrupt(&save.company) {
            return Err(PersistenceError::MalformedSaveFile(format!(
                "game_over is {} but the company metrics say otherwise",
                save.game_over
            )));
        }
        Ok(Self {
            difficulty: save.difficulty,
            round: save.round,
            company: save.company,
            initial_company: save.initial_company,
            history: HistoryLog::from_records(save.history),
            game_over: save.game_over,
            pending_challenge: save.pending_challenge,
            pending_result: save.pending_result,
            page: save.page,
        })
    }
}

#![deny(warnings)]

//! Persistence layer: JSON save files for a game session.
//!
//! A save is a single JSON document. Reading one either yields a fully
//! validated [`SaveFile`] or a [`PersistenceError`]; callers swap their
//! in-memory session only after a successful read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sim_core::{
    validate_challenge, validate_company_state, validate_round, Challenge, CompanyState,
    DecisionRecord, Difficulty, RoundResult, MAX_ROUNDS,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Returns the default path used for local saves.
pub fn default_save_path() -> PathBuf {
    PathBuf::from("./saves/session.json")
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The document is not JSON, lacks a required key or breaks an invariant.
    #[error("malformed save file: {0}")]
    MalformedSaveFile(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize session: {0}")]
    Serialize(String),
    /// There is no started game to write.
    #[error("no game in progress")]
    NothingToSave,
}

fn malformed(msg: impl Into<String>) -> PersistenceError {
    PersistenceError::MalformedSaveFile(msg.into())
}

/// Serialized snapshot of a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub company: CompanyState,
    pub round: u32,
    pub history: Vec<DecisionRecord>,
    pub game_over: bool,
    pub initial_company: CompanyState,
    /// Saves written before difficulty existed load as Medium.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Front-end page the player was on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_challenge: Option<Challenge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_result: Option<RoundResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SaveFile {
    /// Check the cross-field invariants a live session relies on.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        validate_round(self.round).map_err(|e| malformed(e.to_string()))?;
        validate_company_state(&self.initial_company, false)
            .map_err(|e| malformed(format!("initial_company: {e}")))?;
        validate_company_state(&self.company, !self.history.is_empty())
            .map_err(|e| malformed(format!("company: {e}")))?;

        for (i, rec) in self.history.iter().enumerate() {
            let expected = i as u32 + 1;
            if rec.round != expected {
                return Err(malformed(format!(
                    "history entry {i} has round {} (expected {expected})",
                    rec.round
                )));
            }
        }

        let decided = self.history.len() as u32;
        if decided != self.round && decided != self.round + 1 {
            return Err(malformed(format!(
                "history has {decided} entries at round {}",
                self.round
            )));
        }
        let unresolved = decided == self.round + 1;
        if unresolved && self.pending_result.is_none() && !self.game_over {
            return Err(malformed("decision recorded but round neither advanced nor ended"));
        }

        if let Some(challenge) = &self.pending_challenge {
            if self.round >= MAX_ROUNDS {
                return Err(malformed("pending challenge after the last round"));
            }
            validate_challenge(challenge).map_err(|e| malformed(format!("pending_challenge: {e}")))?;
        }

        if let Some(result) = &self.pending_result {
            if self.pending_challenge.is_none() {
                return Err(malformed("pending_result without pending_challenge"));
            }
            if !unresolved || result.round != self.round + 1 {
                return Err(malformed("pending_result does not match the history"));
            }
            if result.terminal != self.game_over {
                return Err(malformed("pending_result.terminal disagrees with game_over"));
            }
        }
        Ok(())
    }
}

/// Parse and validate a save document.
pub fn from_json(json: &str) -> Result<SaveFile, PersistenceError> {
    let save: SaveFile = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
    save.validate()?;
    Ok(save)
}

/// Serialize a save document, stamping it with the current time.
pub fn to_json(save: &SaveFile) -> Result<String, PersistenceError> {
    let mut stamped = save.clone();
    stamped.saved_at = Some(Utc::now());
    serde_json::to_string_pretty(&stamped).map_err(|e| PersistenceError::Serialize(e.to_string()))
}

/// Read and validate a save from disk.
pub fn read_save(path: &Path) -> Result<SaveFile, PersistenceError> {
    let text = fs::read_to_string(path)?;
    let save = from_json(&text)?;
    info!(path = %path.display(), round = save.round, "loaded save");
    Ok(save)
}

/// Write a save next to its destination and rename it into place.
pub fn write_save(path: &Path, save: &SaveFile) -> Result<(), PersistenceError> {
    let json = to_json(save)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), round = save.round, "wrote save");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use sim_core::{CompanyProfile, OptionLabel, PerOption, Person};

    fn company() -> CompanyState {
        CompanyState::from_profile(CompanyProfile {
            products: "Furniture".into(),
            inventory: "Wood".into(),
            capital: 200_000,
            employees: 20,
            personnel: vec![Person {
                name: "Ana".into(),
                role: "CEO".into(),
            }],
        })
    }

    fn challenge() -> Challenge {
        Challenge {
            description: "d".into(),
            options: PerOption::new("a", "b", "c", "d").map(|_, s| s.to_string()),
            correct_option: OptionLabel::A,
            consequences: PerOption::new("a", "b", "c", "d").map(|_, s| s.to_string()),
        }
    }

    fn record(round: u32) -> DecisionRecord {
        DecisionRecord {
            round,
            challenge: "d".into(),
            choice: OptionLabel::A,
            consequence: "a".into(),
            metrics: company().metrics(),
        }
    }

    fn save(round: u32) -> SaveFile {
        SaveFile {
            company: company(),
            round,
            history: (1..=round).map(record).collect(),
            game_over: false,
            initial_company: company(),
            difficulty: Difficulty::Hard,
            page: Some("simulation".into()),
            pending_challenge: None,
            pending_result: None,
            saved_at: None,
        }
    }

    #[test]
    fn default_path_is_json() {
        assert!(default_save_path().to_string_lossy().ends_with(".json"));
    }

    #[test]
    fn file_roundtrip_is_atomic_and_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/save.json");
        let s = save(3);
        write_save(&path, &s).unwrap();
        assert!(!dir.path().join("nested/save.json.tmp").exists());
        let back = read_save(&path).unwrap();
        assert!(back.saved_at.is_some());
        assert_eq!(back.history, s.history);
        assert_eq!(back.difficulty, Difficulty::Hard);
    }

    #[test]
    fn missing_company_is_malformed() {
        let mut v = serde_json::to_value(save(0)).unwrap();
        v.as_object_mut().unwrap().remove("company");
        let err = from_json(&v.to_string()).unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedSaveFile(ref m) if m.contains("company")));
    }

    #[test]
    fn legacy_save_defaults_to_medium() {
        let mut v = serde_json::to_value(save(1)).unwrap();
        let obj = v.as_object_mut().unwrap();
        obj.remove("difficulty");
        obj.remove("page");
        let s = from_json(&v.to_string()).unwrap();
        assert_eq!(s.difficulty, Difficulty::Medium);
        assert_eq!(s.page, None);
    }

    #[test]
    fn not_json_is_malformed() {
        assert!(matches!(
            from_json("{ this is not json"),
            Err(PersistenceError::MalformedSaveFile(_))
        ));
        assert!(matches!(
            from_json(&json!({"round": 0}).to_string()),
            Err(PersistenceError::MalformedSaveFile(_))
        ));
    }

    #[test]
    fn inconsistent_history_is_rejected() {
        let mut s = save(2);
        s.history[1].round = 5;
        assert!(s.validate().is_err());

        let mut s = save(2);
        s.history.push(record(3));
        assert!(s.validate().is_err(), "decided but no pending result");
        s.pending_challenge = Some(challenge());
        s.pending_result = Some(RoundResult {
            round: 3,
            choice: OptionLabel::A,
            consequence: "a".into(),
            terminal: false,
        });
        s.validate().unwrap();
        s.game_over = true;
        assert!(s.validate().is_err(), "terminal flag mismatch");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut s = save(0);
        s.round = 21;
        assert!(s.validate().is_err());
        let mut s = save(0);
        s.company.market_share = 140.0;
        assert!(s.validate().is_err());
        let mut s = save(20);
        s.pending_challenge = Some(challenge());
        assert!(s.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_save(&dir.path().join("nope.json")),
            Err(PersistenceError::Io(_))
        ));
    }

    proptest! {
        #[test]
        fn valid_saves_survive_json(round in 0u32..=20, share in 0.0f64..=100.0) {
            let mut s = save(round);
            s.company.market_share = share;
            let back = from_json(&to_json(&s).unwrap()).unwrap();
            prop_assert_eq!(back.round, round);
            prop_assert_eq!(back.history.len() as u32, round);
        }
    }
}

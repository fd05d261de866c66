//! Extraction and validation of JSON payloads from generator replies.

use std::collections::BTreeMap;

use serde::Deserialize;
use sim_core::{
    validate_challenge, validate_profile, Challenge, CompanyProfile, OptionLabel, PerOption,
    Person,
};

use crate::generator::GeneratorError;

/// Remove Markdown code fences and any prose around the outermost JSON object.
pub fn strip_code_fences(reply: &str) -> &str {
    let mut s = reply.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // drop the info string, e.g. ```json
        s = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    let s = s.trim();
    match (s.find('{'), s.rfind('}')) {
        (Some(start), Some(end)) if start < end => &s[start..=end],
        _ => s,
    }
}

#[derive(Deserialize)]
struct WireProfile {
    products: String,
    inventory: String,
    capital: serde_json::Number,
    employees: serde_json::Number,
    #[serde(default)]
    personnel: Vec<Person>,
}

#[derive(Deserialize)]
struct WireChallenge {
    description: String,
    options: BTreeMap<String, String>,
    correct_option: String,
    #[serde(default)]
    consequences: Option<BTreeMap<String, String>>,
    #[serde(default)]
    explanation: Option<String>,
}

fn number_to_i64(n: &serde_json::Number, field: &str) -> Result<i64, GeneratorError> {
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        .ok_or_else(|| GeneratorError::Parse(format!("`{field}` is not a usable number")))
}

/// Parse and validate a company profile reply.
pub fn parse_profile(reply: &str) -> Result<CompanyProfile, GeneratorError> {
    let wire: WireProfile = serde_json::from_str(strip_code_fences(reply))?;
    let employees = number_to_i64(&wire.employees, "employees")?;
    let profile = CompanyProfile {
        products: wire.products.trim().to_string(),
        inventory: wire.inventory.trim().to_string(),
        capital: number_to_i64(&wire.capital, "capital")?,
        employees: u32::try_from(employees.max(0)).unwrap_or(u32::MAX),
        personnel: wire.personnel,
    };
    validate_profile(&profile)?;
    Ok(profile)
}

/// Accepts `"B"`, `"b"`, `" B) Raise prices"` and similar.
/// Accepts `C`, and also `C) text`, `C. text`, `C: text` or `C text`.
fn parse_label(raw: &str) -> Result<OptionLabel, GeneratorError> {
    if let Ok(label) = raw.parse() {
        return Ok(label);
    }
    let unknown = || GeneratorError::Parse(format!("unknown correct_option `{raw}`"));
    let mut chars = raw.trim().chars();
    let first = chars.next().ok_or_else(unknown)?;
    match chars.next() {
        Some(')' | '.' | ':' | ' ') => first.to_string().parse().map_err(|_| unknown()),
        _ => Err(unknown()),
    }
}

fn per_option(
    map: BTreeMap<String, String>,
    field: &str,
) -> Result<PerOption<String>, GeneratorError> {
    let normalized: BTreeMap<String, String> = map
        .into_iter()
        .map(|(k, v)| (k.trim().to_ascii_uppercase(), v))
        .collect();
    let take = |label: OptionLabel| {
        normalized
            .get(label.as_str())
            .cloned()
            .ok_or_else(|| GeneratorError::Parse(format!("`{field}` is missing label {label}")))
    };
    Ok(PerOption::new(
        take(OptionLabel::A)?,
        take(OptionLabel::B)?,
        take(OptionLabel::C)?,
        take(OptionLabel::D)?,
    ))
}

/// Parse and validate a challenge reply.
///
/// Replies that carry a single `explanation` instead of per-option
/// `consequences` get that explanation as the consequence of every option.
pub fn parse_challenge(reply: &str) -> Result<Challenge, GeneratorError> {
    let wire: WireChallenge = serde_json::from_str(strip_code_fences(reply))?;
    let consequences = match (wire.consequences, wire.explanation) {
        (Some(map), _) => per_option(map, "consequences")?,
        (None, Some(text)) => PerOption::new(text.clone(), text.clone(), text.clone(), text),
        (None, None) => {
            return Err(GeneratorError::Parse(
                "reply has neither `consequences` nor `explanation`".to_string(),
            ))
        }
    };
    let challenge = Challenge {
        description: wire.description.trim().to_string(),
        options: per_option(wire.options, "options")?,
        correct_option: parse_label(&wire.correct_option)?,
        consequences,
    };
    validate_challenge(&challenge)?;
    Ok(challenge)
}

/// A narrated evaluation only needs to be non-blank.
pub fn parse_evaluation(reply: &str) -> Result<String, GeneratorError> {
    let text = reply.trim();
    if text.is_empty() {
        return Err(GeneratorError::EmptyReply);
    }
    Ok(text.to_string())
}

//! Prompt builders. Each prompt spells out the JSON shape the parser expects.

use sim_core::{CompanyState, Difficulty};

pub const PROFILE_PROMPT: &str = r#"Generate a detailed profile of a stable, mid-sized company.
Return exactly these fields as JSON:
- "products": description of the products or services offered (text)
- "inventory": general description of the inventory (text)
- "capital": starting capital in USD (integer)
- "employees": number of employees (integer)
- "personnel": list of objects with "name" (full name) and "role". Include at least a sales
  manager, finance manager, HR manager, public relations manager, marketing manager and
  operations manager.
Example:
{
  "products": "Business management software",
  "inventory": "Software licenses and servers",
  "capital": 500000,
  "employees": 50,
  "personnel": [
    {"name": "Ana López", "role": "Sales Manager"},
    {"name": "Carlos Pérez", "role": "Finance Manager"}
  ]
}
Return only the JSON, with no additional text."#;

fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "The situation should be manageable and the best option fairly clear.",
        Difficulty::Medium => "The situation should be realistic with moderate trade-offs.",
        Difficulty::Hard => {
            "The situation should be severe, with subtle differences between the options."
        }
    }
}

/// Prompt for one round's challenge, embedding the current company metrics.
pub fn challenge_prompt(company: &CompanyState, difficulty: Difficulty) -> String {
    format!(
        r#"You are a business simulator. Based on the following company:
- Products: {products}
- Inventory: {inventory}
- Capital: ${capital}
- Employees: {employees}
- Employee satisfaction: {satisfaction:.1}%
- Customer satisfaction: {customer:.1}%
- Market share: {share:.1}%
- Difficulty: {difficulty}. {hint}
Generate a realistic challenge the CEO must face, with 4 answer options labeled A, B, C and D
(one clearly best, one neutral, two harmful). For every option describe the consequence the
company experiences, without saying which option was best.
Return only JSON in this shape:
{{
  "description": "An important client is unhappy...",
  "options": {{"A": "...", "B": "...", "C": "...", "D": "..."}},
  "correct_option": "A",
  "consequences": {{"A": "...", "B": "...", "C": "...", "D": "..."}}
}}"#,
        products = company.products,
        inventory = company.inventory,
        capital = company.capital,
        employees = company.employees,
        satisfaction = company.satisfaction,
        customer = company.customer_satisfaction,
        share = company.market_share,
        difficulty = difficulty,
        hint = difficulty_hint(difficulty),
    )
}

fn metrics_line(c: &CompanyState) -> String {
    format!(
        "capital ${}, {} employees, employee satisfaction {:.1}%, customer satisfaction {:.1}%, market share {:.1}%",
        c.capital, c.employees, c.satisfaction, c.customer_satisfaction, c.market_share
    )
}

/// Prompt asking for a narrated comparison of the start and end of a game.
pub fn evaluation_prompt(initial: &CompanyState, final_state: &CompanyState) -> String {
    format!(
        "Compare the initial and final state of a company:\n\
         Initial: {}\n\
         Final: {}\n\
         Decide whether the company improved, worsened or went bankrupt, and explain why in a \
         few short paragraphs.",
        metrics_line(initial),
        metrics_line(final_state)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::CompanyProfile;

    fn company() -> CompanyState {
        CompanyState::from_profile(CompanyProfile {
            products: "Solar panels".into(),
            inventory: "Panels and inverters".into(),
            capital: 320_000,
            employees: 41,
            personnel: vec![],
        })
    }

    #[test]
    fn challenge_prompt_embeds_state() {
        let p = challenge_prompt(&company(), Difficulty::Hard);
        assert!(p.contains("Solar panels"));
        assert!(p.contains("$320000"));
        assert!(p.contains("Market share: 20.0%"));
        assert!(p.contains("Difficulty: Hard"));
        assert!(p.contains("\"consequences\""));
    }

    #[test]
    fn evaluation_prompt_has_both_states() {
        let initial = company();
        let mut last = company();
        last.capital = 1_000;
        let p = evaluation_prompt(&initial, &last);
        assert!(p.contains("Initial: capital $320000"));
        assert!(p.contains("Final: capital $1000"));
    }
}

//! Plain-text rendering and input parsing for the terminal loop.

use std::fmt::Write as _;

use sim_core::{Challenge, MetricsSnapshot, OptionLabel, MAX_ROUNDS};
use sim_runtime::{HistoryLog, Metric};

/// What the player typed at a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Choose(OptionLabel),
    /// Empty line.
    Continue,
    Save,
    History,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Some(Command::Continue);
    }
    match line.to_ascii_lowercase().as_str() {
        "s" | "save" => Some(Command::Save),
        "h" | "history" => Some(Command::History),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => line.parse().ok().map(Command::Choose),
    }
}

pub fn metrics(m: &MetricsSnapshot) -> String {
    format!(
        "Capital ${} | Employees {} | Employee satisfaction {:.1}% | Customer satisfaction {:.1}% | Market share {:.1}%",
        m.capital, m.employees, m.satisfaction, m.customer_satisfaction, m.market_share
    )
}

pub fn challenge(round: u32, c: &Challenge) -> String {
    let mut out = format!("\n=== Round {round}/{MAX_ROUNDS} ===\n{}\n", c.description);
    for (label, text) in c.options.iter() {
        let _ = writeln!(out, "  {label}) {text}");
    }
    out
}

/// Side-by-side view of the first and last snapshot.
pub fn comparison(initial: &MetricsSnapshot, last: &MetricsSnapshot) -> String {
    let mut out = format!("{:<24}{:>14}{:>14}\n", "", "Start", "End");
    for metric in Metric::ALL {
        let _ = writeln!(
            out,
            "{:<24}{:>14}{:>14}",
            metric.label(),
            value(metric, metric.read(initial)),
            value(metric, metric.read(last)),
        );
    }
    out
}

/// One line per metric with its value after every round.
pub fn trends(history: &HistoryLog, start: &MetricsSnapshot) -> String {
    let mut out = String::new();
    for metric in Metric::ALL {
        let series: Vec<String> = history
            .trend(start, metric)
            .into_iter()
            .map(|(_, v)| value(metric, v))
            .collect();
        let _ = writeln!(out, "{:<24}{}", metric.label(), series.join(" > "));
    }
    out
}

pub fn history(log: &HistoryLog) -> String {
    if log.is_empty() {
        return "No decisions yet.\n".to_string();
    }
    let mut out = String::new();
    for rec in log {
        let _ = writeln!(
            out,
            "Round {:>2}: chose {} | {}\n          {}",
            rec.round,
            rec.choice,
            rec.consequence,
            metrics(&rec.metrics)
        );
    }
    out
}

fn value(metric: Metric, v: f64) -> String {
    match metric {
        Metric::Capital => format!("${v:.0}"),
        Metric::Employees => format!("{v:.0}"),
        _ => format!("{v:.1}%"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ai::fallback::{fallback_challenge, FallbackScenario};
    use sim_core::Difficulty;

    fn snapshot(capital: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            capital,
            employees: 12,
            satisfaction: 70.0,
            customer_satisfaction: 65.5,
            market_share: 20.0,
        }
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command(" b \n"), Some(Command::Choose(OptionLabel::B)));
        assert_eq!(parse_command("\n"), Some(Command::Continue));
        assert_eq!(parse_command("S"), Some(Command::Save));
        assert_eq!(parse_command("history"), Some(Command::History));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("E"), None);
    }

    #[test]
    fn challenge_lists_every_option() {
        let c = fallback_challenge(FallbackScenario::Morale, Difficulty::Easy);
        let text = challenge(3, &c);
        assert!(text.contains("Round 3/20"));
        for label in OptionLabel::ALL {
            assert!(text.contains(&format!("  {label}) ")));
        }
    }

    #[test]
    fn comparison_shows_both_columns() {
        let text = comparison(&snapshot(500_000), &snapshot(612_000));
        assert!(text.contains("$500000"));
        assert!(text.contains("$612000"));
        assert!(text.contains("65.5%"));
    }

    #[test]
    fn empty_history_says_so() {
        assert_eq!(history(&HistoryLog::new()), "No decisions yet.\n");
        let t = trends(&HistoryLog::new(), &snapshot(1_000));
        assert!(t.lines().count() == Metric::ALL.len());
    }
}

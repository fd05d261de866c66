#![deny(warnings)]

use anyhow::Context;
use persistence::{default_save_path, read_save};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_save_path);
    let save = read_save(&path).with_context(|| format!("checking {}", path.display()))?;
    let status = match (save.game_over, save.round) {
        (true, _) => "bankrupt",
        (false, r) if r >= sim_core::MAX_ROUNDS => "finished",
        _ => "in progress",
    };
    println!(
        "Save OK | {} | difficulty: {} | round: {}/{} | decisions: {} | status: {}",
        path.display(),
        save.difficulty,
        save.round,
        sim_core::MAX_ROUNDS,
        save.history.len(),
        status
    );
    println!(
        "Capital ${} -> ${} | employees {} -> {}",
        save.initial_company.capital, save.company.capital, save.initial_company.employees, save.company.employees
    );
    Ok(())
}

#![deny(warnings)]

//! Terminal front-end: plays one 20-round game against the content generator.

mod config;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sim_ai::{ContentSource, GeminiClient, OfflineGenerator, TextGenerator};
use sim_core::Difficulty;
use sim_runtime::{Outcome, Simulation, Turn};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use ui::Command;

const USAGE: &str = "usage: ceo-sim [--config FILE] [--difficulty easy|medium|hard] [--seed N] \
[--offline] [--load FILE] [--save FILE] [--version]";

const FALLBACK_NOTICE: &str =
    "(The content service is unavailable; this content comes from the built-in set.)";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    difficulty: Option<Difficulty>,
    seed: Option<u64>,
    offline: bool,
    load: Option<PathBuf>,
    save: Option<PathBuf>,
    version: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().with_context(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--config" => parsed.config = Some(value("--config")?.into()),
            "--difficulty" => parsed.difficulty = Some(value("--difficulty")?.parse()?),
            "--seed" => {
                let raw = value("--seed")?;
                parsed.seed = Some(raw.parse().with_context(|| format!("bad seed: {raw}"))?);
            }
            "--load" => parsed.load = Some(value("--load")?.into()),
            "--save" => parsed.save = Some(value("--save")?.into()),
            "--offline" => parsed.offline = true,
            "--version" | "-V" => parsed.version = true,
            other => bail!("unknown argument: {other}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_generator(config: &AppConfig, offline: bool) -> Box<dyn TextGenerator> {
    if offline {
        info!("offline mode, using built-in content");
        return Box::new(OfflineGenerator);
    }
    match GeminiClient::new(config.generator.clone(), config.generator.api_key_from_env()) {
        Ok(client) => Box::new(client),
        Err(e) => {
            warn!(error = %e, "content service not configured, using built-in content");
            Box::new(OfflineGenerator)
        }
    }
}

/// Line-oriented stdin; `None` once input is exhausted.
struct Input<R> {
    reader: R,
}

impl<R: BufRead> Input<R> {
    fn prompt(&mut self, text: &str) -> Result<Option<Command>> {
        loop {
            print!("{text} ");
            io::stdout().flush()?;
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match ui::parse_command(&line) {
                Some(command) => return Ok(Some(command)),
                None => println!("Unrecognised input: {}", line.trim()),
            }
        }
    }
}

fn notice(source: ContentSource) {
    if source == ContentSource::Fallback {
        println!("{FALLBACK_NOTICE}");
    }
}

fn save(sim: &Simulation<Box<dyn TextGenerator>>, path: &Path) {
    match sim.save(path) {
        Ok(()) => println!("Game saved to {}.", path.display()),
        Err(e) => println!("Could not save the game: {e}"),
    }
}

fn play<R: BufRead>(
    sim: &mut Simulation<Box<dyn TextGenerator>>,
    input: &mut Input<R>,
    save_path: &Path,
) -> Result<()> {
    // Round whose challenge is already on screen.
    let mut shown = 0;
    loop {
        match sim.turn() {
            Turn::NotStarted => bail!("no game in progress"),
            Turn::NeedsChallenge(request) => {
                let generated = request.ensure_challenge();
                notice(generated.source);
            }
            Turn::AwaitingDecision(pending) => {
                if shown != pending.round() {
                    shown = pending.round();
                    println!("{}", ui::metrics(&pending.company().metrics()));
                    print!("{}", ui::challenge(pending.round(), pending.challenge()));
                }
                match input.prompt("Your decision [A-D, h=history, s=save, q=quit]:")? {
                    Some(Command::Choose(label)) => {
                        pending.decide(label);
                    }
                    Some(Command::History) => {
                        if let Some(session) = sim.session() {
                            print!("{}", ui::history(session.history()));
                        }
                    }
                    Some(Command::Save) => save(sim, save_path),
                    Some(Command::Continue) => println!("Pick one of A, B, C or D."),
                    Some(Command::Quit) | None => return Ok(()),
                }
            }
            Turn::Resolved(resolved) => {
                println!("\n{}", resolved.result().consequence);
                println!("{}", ui::metrics(&resolved.company().metrics()));
                match input.prompt("[Enter=next round, h=history, s=save, q=quit]:")? {
                    Some(Command::Continue) => {
                        resolved.advance();
                    }
                    Some(Command::History) => print!("{}", ui::history(resolved.history())),
                    Some(Command::Save) => save(sim, save_path),
                    Some(Command::Choose(_)) => println!("This round is already decided."),
                    Some(Command::Quit) | None => return Ok(()),
                }
            }
            Turn::Finished(finished) => {
                match finished.outcome() {
                    Outcome::Bankrupt => {
                        if let Some(last) = finished.last_result() {
                            println!("\n{}", last.consequence);
                        }
                        println!(
                            "\nBANKRUPT. The company collapsed after {} rounds.",
                            finished.history().len()
                        );
                    }
                    Outcome::Normal => {
                        println!("\nThe simulation is complete. You led the company through all 20 rounds.");
                    }
                }
                let initial = finished.initial_metrics();
                print!("\n{}", ui::comparison(&initial, &finished.final_metrics()));
                print!("\n{}", ui::trends(finished.history(), &initial));
                let verdict = finished.evaluate();
                println!("\n{}", verdict.value);
                notice(verdict.source);
                return Ok(());
            }
        }
    }
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!("ceo-sim {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_SHA"));
        return Ok(());
    }
    init_logging();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(difficulty) = args.difficulty {
        config.game.difficulty = difficulty;
    }
    if let Some(seed) = args.seed {
        config.game.rng_seed = Some(seed);
    }
    let seed = config.game.rng_seed.unwrap_or_else(rand::random);
    info!(seed, difficulty = %config.game.difficulty, "starting ceo-sim");

    let generator = build_generator(&config, args.offline);
    let mut sim = Simulation::new(generator, config.retry, seed);
    match &args.load {
        Some(path) => {
            sim.load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            println!("Resumed saved game from {}.", path.display());
        }
        None => {
            println!("Generating your company ({} difficulty)...", config.game.difficulty);
            let source = sim.start(config.game.difficulty);
            notice(source);
            if let Some(session) = sim.session() {
                let company = session.company();
                println!("\nProducts: {}\nInventory: {}", company.products, company.inventory);
                for person in &company.personnel {
                    println!("  {} ({})", person.name, person.role);
                }
            }
        }
    }

    let save_path = args.save.unwrap_or_else(persistence::default_save_path);
    let stdin = io::stdin();
    let mut input = Input {
        reader: stdin.lock(),
    };
    play(&mut sim, &mut input, &save_path)
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sim_ai::{OfflineGenerator, RetryPolicy};
use sim_core::Difficulty;
use sim_runtime::{Simulation, Turn};

/// Play one offline game to the end, always picking the best option.
fn full_session(seed: u64) -> u32 {
    let mut sim = Simulation::new(OfflineGenerator, RetryPolicy::immediate(1), seed);
    sim.start(Difficulty::Medium);
    loop {
        match sim.turn() {
            Turn::NeedsChallenge(req) => {
                req.ensure_challenge();
            }
            Turn::AwaitingDecision(pending) => {
                let choice = pending.challenge().correct_option;
                pending.decide(choice);
            }
            Turn::Resolved(resolved) => {
                resolved.advance();
            }
            Turn::NotStarted | Turn::Finished(_) => break,
        }
    }
    sim.session().map_or(0, |s| s.round())
}

fn bench_session(c: &mut Criterion) {
    let mut seed = 0u64;
    c.bench_function("offline 20-round session", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(full_session(seed))
        })
    });
}

criterion_group!(benches, bench_session);
criterion_main!(benches);

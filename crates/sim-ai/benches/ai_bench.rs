use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_ai::{fallback, parse};
use sim_core::{CompanyState, Difficulty};

const REPLY: &str = r#"Here is your challenge:
```json
{"description": "A key supplier doubles its prices overnight.",
 "options": {"A": "Negotiate a long contract", "B": "Switch supplier", "C": "Pass costs on", "D": "Stop production"},
 "correct_option": "A",
 "consequences": {"A": "Costs stabilise.", "B": "Quality dips.", "C": "Customers leave.", "D": "Revenue collapses."}}
```"#;

fn struggling_company() -> CompanyState {
    let mut company = CompanyState::from_profile(fallback::default_profile());
    company.market_share = 10.0;
    company.capital = 80_000;
    company
}

fn bench_content(c: &mut Criterion) {
    c.bench_function("parse challenge reply", |b| {
        b.iter(|| parse::parse_challenge(black_box(REPLY)))
    });

    let company = struggling_company();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    c.bench_function("pick fallback challenge", |b| {
        b.iter(|| fallback::pick_fallback_challenge(black_box(&company), Difficulty::Hard, &mut rng))
    });
}

criterion_group!(benches, bench_content);
criterion_main!(benches);

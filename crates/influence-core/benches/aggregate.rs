use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use influence_core::{Approach, Event, JourneyRules, RegistrationPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Tier {
    name: &'static str,
    users: usize,
    events: usize,
}

const TIERS: [Tier; 3] = [
    Tier {
        name: "small",
        users: 100,
        events: 1_000,
    },
    Tier {
        name: "medium",
        users: 2_000,
        events: 50_000,
    },
    Tier {
        name: "large",
        users: 20_000,
        events: 500_000,
    },
];

const ARTICLES: usize = 400;

fn synthetic_log(tier: &Tier, seed: u64) -> Vec<Event> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = Utc.timestamp_opt(1_761_552_000, 0).unwrap();

    (0..tier.events)
        .map(|_| {
            let user = format!("u{:06}", rng.gen_range(0..tier.users));
            let at = base + chrono::Duration::seconds(rng.gen_range(0..86_400));
            if rng.gen_bool(0.1) {
                Event::new("Register", "/register", user, at)
            } else {
                let n = rng.gen_range(0..ARTICLES);
                Event::new(format!("Article {n}"), format!("/articles/{n}"), user, at)
            }
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate.tiered");

    for tier in &TIERS {
        let events = synthetic_log(tier, 0x1F_u64 + tier.events as u64);
        group.throughput(Throughput::Elements(events.len() as u64));

        for policy in [RegistrationPolicy::FirstOnly, RegistrationPolicy::EveryCycle] {
            let rules = JourneyRules::with_policy(policy);
            for approach in Approach::ALL {
                group.bench_with_input(
                    BenchmarkId::new(format!("{approach}/{policy}"), tier.name),
                    &events,
                    |b, events| b.iter(|| black_box(approach.aggregate(events, &rules))),
                );
            }
        }
    }

    group.finish();
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);

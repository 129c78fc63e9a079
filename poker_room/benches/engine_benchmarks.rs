use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use poker_room::game::{Action, NewPlayer, Player, RoomState, engine};

/// Helper to create a room with `n_players` seated and a round open
fn setup_round(n_players: u8) -> (RoomState, Vec<Player>) {
    let mut room = RoomState::new("BENCH1".to_string(), "host".to_string());
    room.dealer_seat = Some(0);
    let mut players: Vec<Player> = (0..n_players)
        .map(|seat| {
            NewPlayer {
                name: format!("player{seat}"),
                avatar: "*".to_string(),
                seat,
                buy_in: 10_000,
                color: None,
            }
            .into_player("BENCH1", &format!("p{seat}"))
        })
        .collect();
    engine::start_round(&mut room, &mut players);
    (room, players)
}

/// Benchmark opening a round at various table sizes
fn bench_start_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("start_round");
    for n in [2u8, 6, 9] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || setup_round(n),
                |(mut room, mut players)| {
                    engine::start_round(&mut room, &mut players);
                    (room, players)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark a raise that reopens action for a full table
fn bench_raise(c: &mut Criterion) {
    c.bench_function("apply_raise_9_players", |b| {
        b.iter_batched(
            || setup_round(9),
            |(mut room, mut players)| {
                let _ = engine::apply_action(&mut room, &mut players, "p1", Action::BetRaise(200));
                (room, players)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// Benchmark a whole orbit: raise, everyone calls, turn advanced each time
fn bench_full_orbit(c: &mut Criterion) {
    c.bench_function("orbit_9_players", |b| {
        b.iter_batched(
            || setup_round(9),
            |(mut room, mut players)| {
                let mut action = Action::BetRaise(100);
                while let Some(turn) = room.current_turn_seat {
                    let actor = format!("p{turn}");
                    let _ = engine::apply_action(&mut room, &mut players, &actor, action);
                    engine::advance_turn(&mut room, &players);
                    action = Action::Call;
                }
                (room, players)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(engine_operations, bench_start_round, bench_raise, bench_full_orbit);

criterion_main!(engine_operations);

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pinwheel::{perft, GameState, MoveGenerator, Search, SearchConfig};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("legal moves start", |b| {
        let state = GameState::new();
        let generator = MoveGenerator::new();
        b.iter(|| generator.legal_moves(black_box(&state)))
    });

    c.bench_function("legal moves kiwipete", |b| {
        let state = GameState::from_fen(KIWIPETE).unwrap();
        let generator = MoveGenerator::new();
        b.iter(|| generator.legal_moves(black_box(&state)))
    });

    c.bench_function("perft 3 start", |b| {
        let mut state = GameState::new();
        b.iter(|| perft(black_box(&mut state), 3))
    });

    c.bench_function("search depth 3 kiwipete", |b| {
        let mut state = GameState::from_fen(KIWIPETE).unwrap();
        let mut search = Search::with_config(SearchConfig {
            max_depth: 3,
            shuffle: false,
            seed: Some(1),
        });
        b.iter(|| {
            let moves = state.valid_moves();
            search.search(black_box(&mut state), moves)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

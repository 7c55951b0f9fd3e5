use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tetrecs::core::{Engine, Grid, Piece, PieceQueue, RandomPieces};
use tetrecs::types::PIECE_COUNT;

fn bench_can_place(c: &mut Criterion) {
    let grid = Grid::default();
    let pieces: Vec<Piece> = (0..PIECE_COUNT).filter_map(Piece::from_id).collect();

    c.bench_function("can_place_all_pieces", |b| {
        b.iter(|| {
            for piece in &pieces {
                black_box(grid.can_place(piece, black_box(2), black_box(2)));
            }
        })
    });
}

fn bench_place_and_resolve(c: &mut Criterion) {
    c.bench_function("fill_and_clear_row", |b| {
        b.iter(|| {
            let mut engine = Engine::new(5, 5, PieceQueue::from_ids([3u8; 7]));
            engine.start();
            for x in 0..5 {
                black_box(engine.place_piece(x, 2));
            }
        })
    });
}

fn bench_resolve_crossed_lines(c: &mut Criterion) {
    c.bench_function("resolve_row_and_column", |b| {
        b.iter(|| {
            let mut engine = Engine::new(5, 5, PieceQueue::from_ids([3u8; 11]));
            engine.start();
            for (x, y) in [(0, 2), (1, 2), (2, 2), (4, 2), (3, 0), (3, 1), (3, 3), (3, 4), (3, 2)] {
                black_box(engine.place_piece(x, y));
            }
        })
    });
}

fn bench_random_draw(c: &mut Criterion) {
    let mut source = RandomPieces::new(12345);

    c.bench_function("random_piece_id", |b| {
        b.iter(|| black_box(source.next_id()))
    });
}

fn bench_rotate(c: &mut Criterion) {
    let mut piece = Piece::from_id(5).unwrap_or_else(|| unreachable!());

    c.bench_function("rotate_cw", |b| {
        b.iter(|| piece.rotate(black_box(1)))
    });
}

criterion_group!(
    benches,
    bench_can_place,
    bench_place_and_resolve,
    bench_resolve_crossed_lines,
    bench_random_draw,
    bench_rotate
);
criterion_main!(benches);

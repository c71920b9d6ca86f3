use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cinema_booking::models::{SeatLabel, SeatPool};
use cinema_booking::services::seat_inventory::SeatInventory;

fn reserve_and_release(c: &mut Criterion) {
    let seats: Vec<SeatLabel> = ["A1", "E5", "J10"].iter().map(|s| s.parse().unwrap()).collect();

    c.bench_function("reserve_release_three", |b| {
        b.iter(|| {
            let mut pool = SeatPool::full();
            pool.reserve(black_box(&seats)).unwrap();
            pool.release(black_box(&seats));
            pool
        })
    });
}

fn stored_round_trip(c: &mut Criterion) {
    let stored = SeatPool::full().labels();

    c.bench_function("from_stored_full_grid", |b| {
        b.iter(|| SeatPool::from_stored(black_box(&stored)).labels())
    });
}

fn parse_request(c: &mut Criterion) {
    let request = ["A1", "A2", "B7", "C3", "J10"];

    c.bench_function("parse_seat_request", |b| {
        b.iter(|| SeatInventory::parse_request(black_box(&request)))
    });
}

criterion_group!(benches, reserve_and_release, stored_round_trip, parse_request);
criterion_main!(benches);

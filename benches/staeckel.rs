use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use staeckel_grid::potential::{AxisymmetricPotential, Isochrone, MiyamotoNagai};
use staeckel_grid::{ActionSolver, GridConfig, PhasePoint, StaeckelGrid};

fn isochrone_grid(n: usize) -> StaeckelGrid<Isochrone> {
    let iso = Isochrone::new(1.0, 1.0);
    StaeckelGrid::builder()
        .potential(iso)
        .config(GridConfig::default().with_delta(0.05).with_resolution(n, n, n))
        .build(&iso)
        .unwrap()
}

/// Grid construction
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);
    let iso = Isochrone::new(1.0, 1.0);
    for n in [10, 25] {
        group.bench_with_input(BenchmarkId::new("Isochrone", n), &n, |b, &n| {
            b.iter(|| {
                StaeckelGrid::builder()
                    .potential(iso)
                    .config(GridConfig::default().with_delta(0.05).with_resolution(n, n, n))
                    .build(&iso)
                    .unwrap()
            })
        });
    }
    group.finish();
}

/// Single-orbit queries, interpolated and exact
fn bench_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("single");
    let grid = isochrone_grid(25);
    let iso = *grid.potential();
    let point = PhasePoint::new(1.0, 0.35, 0.3, 0.2, 0.3);

    group.bench_function("grid", |b| {
        b.iter(|| grid.actions(black_box(&point)).unwrap())
    });
    group.bench_function("exact_isochrone", |b| {
        b.iter(|| {
            let p = black_box(&point);
            (iso.radial_action(p).unwrap(), iso.vertical_action(p).unwrap())
        })
    });

    let disk = MiyamotoNagai::new(1.0, 3.0, 0.28);
    group.bench_function("MiyamotoNagai_potential", |b| {
        b.iter(|| disk.potential(black_box(1.2), black_box(0.1)))
    });
    group.finish();
}

/// Generate phase-space points for batch benchmarks
fn generate_orbits(n: usize) -> Vec<PhasePoint> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            PhasePoint::new(0.6 + t, 0.3 - 0.2 * t, 0.3 + 0.1 * t, 0.1, 0.2)
        })
        .collect()
}

/// Batch queries
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let grid = isochrone_grid(25);
    let n_orbits = 1000;
    let orbits = generate_orbits(n_orbits);
    let column = |f: fn(&PhasePoint) -> f64| orbits.iter().map(f).collect::<Vec<f64>>();
    let (r, vr, vt, z, vz) = (
        column(|p| p.r),
        column(|p| p.vr),
        column(|p| p.vt),
        column(|p| p.z),
        column(|p| p.vz),
    );

    group.bench_with_input(
        BenchmarkId::new("actions_many", n_orbits),
        &orbits,
        |b, orbits| b.iter(|| grid.actions_many(orbits).unwrap()),
    );
    group.bench_function(BenchmarkId::new("actions_batch", n_orbits), |b| {
        b.iter(|| grid.actions_batch(&r, &vr, &vt, &z, &vz).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_single, bench_batch);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshcut::{BooleanOp, CutDriver, Primitive, Surface, Transform};
use nalgebra::Point3;

fn cuboid(min: [f64; 3], max: [f64; 3]) -> Surface {
    let mesh = Primitive::cuboid(Point3::from(min), Point3::from(max)).to_mesh();
    Surface::import(&mesh, Transform::identity()).unwrap()
}

fn sphere(segments: u32) -> Surface {
    Surface::import(&Primitive::sphere(1.0, segments).to_mesh(), Transform::identity()).unwrap()
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");

    for segments in [16, 32, 64] {
        let mesh = Primitive::sphere(1.0, segments).to_mesh();
        group.bench_with_input(BenchmarkId::new("sphere", segments), &mesh, |b, mesh| {
            b.iter(|| Surface::import(black_box(mesh), Transform::identity()).unwrap());
        });
    }

    group.finish();
}

fn bench_intersect(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect");
    let block = cuboid([0.13, 0.21, 0.17], [1.6, 1.5, 1.4]);

    for segments in [16, 32, 64] {
        let ball = sphere(segments);
        group.bench_with_input(BenchmarkId::new("sphere_box", segments), &ball, |b, ball| {
            b.iter(|| ball.intersect_with(black_box(&block)));
        });
    }

    group.finish();
}

fn bench_containment(c: &mut Criterion) {
    let ball = sphere(32);
    let probe = Point3::new(0.1, 0.2, 0.3);

    c.bench_function("contains_sphere_32", |b| {
        b.iter(|| ball.contains(black_box(&probe), 1e-4));
    });
}

fn bench_boolean(c: &mut Criterion) {
    let mut group = c.benchmark_group("boolean");

    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    let b = cuboid([0.53, 0.37, 0.29], [1.53, 1.37, 1.29]);
    for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference] {
        group.bench_with_input(BenchmarkId::new("cubes", format!("{:?}", op)), &op, |bench, op| {
            bench.iter(|| a.boolean(black_box(&b), *op).unwrap());
        });
    }

    let ball = sphere(12);
    let block = cuboid([0.13, 0.21, 0.17], [1.6, 1.5, 1.4]);
    group.bench_function("sphere_box_union", |bench| {
        bench.iter(|| ball.boolean(black_box(&block), BooleanOp::Union).unwrap());
    });
    group.bench_function("sphere_box_loops", |bench| {
        bench.iter(|| CutDriver::new(&ball, black_box(&block)).unwrap().loops().len());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_import,
    bench_intersect,
    bench_containment,
    bench_boolean
);
criterion_main!(benches);

// Copyright 2025 The paraseq Authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use paraseq::SliceCursor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::mem::size_of;

const LENGTHS: &[usize] = &[10_000, 100_000, 1_000_000, 10_000_000];

fn sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum");
    for &len in LENGTHS {
        let input: Vec<u64> = (0..len as u64).collect();
        group.throughput(Throughput::Bytes((len * size_of::<u64>()) as u64));
        group.bench_with_input(BenchmarkId::new("serial", len), &input, |bencher, input| {
            bencher.iter(|| input.iter().sum::<u64>())
        });
        group.bench_with_input(
            BenchmarkId::new("paraseq", len),
            &input,
            |bencher, input| {
                bencher.iter(|| {
                    let (first, last) = SliceCursor::pair(input);
                    paraseq::reduce(first, last, 0u64, |a, b| a + b)
                })
            },
        );
    }
    group.finish();
}

fn find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    for &len in LENGTHS {
        // The needle sits at the midpoint of an otherwise zeroed range.
        let mut input = vec![0u64; len];
        input[len / 2] = 42;
        group.throughput(Throughput::Bytes((len / 2 * size_of::<u64>()) as u64));
        group.bench_with_input(BenchmarkId::new("serial", len), &input, |bencher, input| {
            bencher.iter(|| input.iter().position(|x| *x == 42))
        });
        group.bench_with_input(
            BenchmarkId::new("paraseq", len),
            &input,
            |bencher, input| {
                bencher.iter(|| {
                    let (first, last) = SliceCursor::pair(input);
                    paraseq::find(first, last, &42).index()
                })
            },
        );
    }
    group.finish();
}

fn sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    group.sample_size(10);
    for &len in LENGTHS {
        let mut rng = StdRng::seed_from_u64(42);
        let input: Vec<f64> = (0..len).map(|_| rng.gen()).collect();
        group.throughput(Throughput::Bytes((len * size_of::<f64>()) as u64));
        group.bench_with_input(BenchmarkId::new("serial", len), &input, |bencher, input| {
            bencher.iter(|| {
                let mut values = input.clone();
                values.sort_unstable_by(|a, b| a.total_cmp(b));
                values
            })
        });
        group.bench_with_input(
            BenchmarkId::new("paraseq", len),
            &input,
            |bencher, input| {
                bencher.iter(|| {
                    let mut values = input.clone();
                    paraseq::sort_by(&mut values, |a, b| a.total_cmp(b));
                    values
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, sum, find, sort);
criterion_main!(benches);

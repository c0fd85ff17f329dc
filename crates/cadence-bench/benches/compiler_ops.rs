//! Criterion benchmarks for the statement compiler and evaluator.

use std::hint::black_box;

use cadence_bench::{chain_table, neuron_table, NEURON_MODEL};
use cadence_codegen::{execute, get_identifiers_recursively, make_statements, Namespace};
use cadence_core::Dtype;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_make_statements(c: &mut Criterion) {
    let table = neuron_table().unwrap();
    c.bench_function("make_statements_neuron", |b| {
        b.iter(|| {
            let compiled = make_statements(black_box(NEURON_MODEL), &table, Dtype::Float64).unwrap();
            black_box(&compiled);
        });
    });

    let (chain, code) = chain_table(200).unwrap();
    c.bench_function("make_statements_chain_200", |b| {
        b.iter(|| {
            let compiled = make_statements(black_box(&code), &chain, Dtype::Float64).unwrap();
            black_box(&compiled);
        });
    });
}

fn bench_identifier_closure(c: &mut Criterion) {
    let (chain, code) = chain_table(200).unwrap();
    c.bench_function("identifiers_recursively_chain_200", |b| {
        b.iter(|| {
            let names = get_identifiers_recursively(&[code.as_str()], &chain).unwrap();
            black_box(&names);
        });
    });
}

fn bench_execute_neuron(c: &mut Criterion) {
    let table = neuron_table().unwrap();
    let (scalar, vector) = make_statements(NEURON_MODEL, &table, Dtype::Float64).unwrap();
    let mut ns = Namespace::new(1000);
    for name in ["v", "g_e", "g_i", "spiked"] {
        ns.fill_vector(name, 0.0);
    }
    for (name, value) in [
        ("dt", 1e-4),
        ("C", 200e-12),
        ("E_e", 0.0),
        ("E_i", -80e-3),
        ("E_l", -60e-3),
        ("g_l", 10e-9),
        ("tau_e", 5e-3),
        ("tau_i", 10e-3),
        ("v_th", -50e-3),
        ("v_reset", -60e-3),
    ] {
        ns.set_scalar(name, value);
    }
    c.bench_function("execute_neuron_1000", |b| {
        b.iter(|| {
            execute(&scalar, &vector, &mut ns).unwrap();
            black_box(ns.vector("v"));
        });
    });
}

criterion_group!(
    benches,
    bench_make_statements,
    bench_identifier_closure,
    bench_execute_neuron
);
criterion_main!(benches);

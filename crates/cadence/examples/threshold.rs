//! Leaky integrate-and-fire population driven by seeded noise.
//!
//! Demonstrates: compile a statement block → wrap it in a `CodeUnit` →
//! feed inputs from a start-phase network operation → count spikes from an
//! end-phase monitor → run twice through the implicit registry.
//!
//! Set `RUST_LOG=cadence_engine=debug` to see run summaries.

use std::cell::Cell;
use std::rc::Rc;

use cadence::prelude::*;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const N: usize = 100;

const MODEL: &str = "
    v += leak + bias
    spiked = v > threshold
    v = v * (1 - spiked)
";

fn uniform(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Cadence Threshold Example ===\n");

    let table = SymbolTable::new()
        .with_variable(Variable::vector("v", Dtype::Float64))
        .with_variable(Variable::vector("input", Dtype::Float64).read_only())
        .with_variable(Variable::vector("spiked", Dtype::Bool))
        .with_variable(Variable::scalar("tau", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("threshold", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("dt", Dtype::Float64).read_only())
        .with_subexpression("leak", "dt * (input - v) / tau", Dtype::Float64)?
        .with_subexpression("bias", "0.02 * sqrt(dt / tau)", Dtype::Float64)?;

    let mut ns = Namespace::new(N);
    ns.fill_vector("v", 0.0);
    ns.fill_vector("spiked", 0.0);
    ns.set_scalar("tau", 10e-3);
    ns.set_scalar("threshold", 1.0);

    let body = CodeUnit::compile(MODEL, &table, Dtype::Float64, ns)?;
    for stmt in body.scalar_statements().iter().chain(body.vector_statements()) {
        println!("  {stmt}");
    }
    let neurons = Unit::new(body, Schedule::default().named("neurons"));

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let drive = neurons.clone();
    let _input = network_operation(
        Schedule::default().when(When::Start).named("input"),
        move |_| {
            let values: Vec<f64> = (0..N).map(|_| 0.9 + 0.3 * uniform(&mut rng)).collect();
            drive.borrow_mut().namespace_mut().set_vector("input", values)
        },
    );

    let spikes = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&spikes);
    let watched = neurons.clone();
    let _monitor = Unit::new(
        NetworkOperation::infallible(move || {
            let unit = watched.borrow();
            let fired = unit
                .namespace()
                .vector("spiked")
                .map_or(0, |s| s.iter().filter(|&&x| x != 0.0).count());
            counter.set(counter.get() + fired as u64);
        }),
        Schedule::default().when(When::End).named("monitor"),
    );

    for _ in 0..2 {
        let report = magic::run(100e-3)?;
        println!(
            "\nt = {:.1} ms: {} sub-steps, {} updates, {} spikes so far",
            report.end_t * 1e3,
            report.substeps,
            report.updates,
            spikes.get()
        );
    }

    let unit = neurons.borrow();
    let v = unit.namespace().vector("v").unwrap_or_default();
    let mean = v.iter().sum::<f64>() / v.len().max(1) as f64;
    println!("\nblock executed {} times; mean v = {mean:.3}", unit.executions());
    Ok(())
}

//! Benchmark workloads for the Cadence scheduler and statement compiler.
//!
//! - [`mixed_clock_network`]: many counting units spread over several clocks
//! - [`neuron_table`] and [`NEURON_MODEL`]: a conductance-based block with
//!   nested subexpressions
//! - [`chain_table`]: a deep linear chain of subexpressions

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cadence_codegen::{CompileError, SymbolTable, Variable};
use cadence_core::{Dtype, UpdateError, When};
use cadence_engine::{Clock, ClockError, Network, Registry, Schedulable, Schedule, SharedClock, Unit, UpdateContext};

/// A unit that only counts its updates.
#[derive(Debug, Default)]
pub struct Tally(pub u64);

impl Schedulable for Tally {
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), UpdateError> {
        self.0 += 1;
        Ok(())
    }
}

/// A network of `units` counters spread round-robin over `clocks` clocks
/// with steps `0.1 ms, 0.2 ms, ...` and cycling phases.
///
/// Units are registered with `registry`; the returned handles keep them
/// alive.
pub fn mixed_clock_network(
    registry: &mut Registry,
    units: usize,
    clocks: usize,
) -> Result<(Network, Vec<Unit<Tally>>), ClockError> {
    let clocks: Vec<SharedClock> = (0..clocks.max(1))
        .map(|i| Clock::shared(1e-4 * (i + 1) as f64, i as i32))
        .collect::<Result<_, _>>()?;
    let handles: Vec<Unit<Tally>> = (0..units)
        .map(|i| {
            let schedule = Schedule::default()
                .on(&clocks[i % clocks.len()])
                .when(When::ALL[i % When::ALL.len()])
                .order((i % 7) as i32);
            Unit::new_in(Tally::default(), schedule, registry)
        })
        .collect();
    let net = Network::from_members(&handles);
    Ok((net, handles))
}

/// Statement block over [`neuron_table`].
pub const NEURON_MODEL: &str = "
    v += dt * (I_syn + I_leak) / C
    g_e = g_e * decay_e
    g_i = g_i * decay_i
    spiked = v > v_th
    v = v * (1 - spiked) + v_reset * spiked
";

/// Symbol table for a conductance-based neuron with nested currents.
pub fn neuron_table() -> Result<SymbolTable, CompileError> {
    SymbolTable::new()
        .with_variable(Variable::vector("v", Dtype::Float64))
        .with_variable(Variable::vector("g_e", Dtype::Float64))
        .with_variable(Variable::vector("g_i", Dtype::Float64))
        .with_variable(Variable::vector("spiked", Dtype::Bool))
        .with_variable(Variable::scalar("dt", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("C", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("E_e", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("E_i", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("E_l", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("g_l", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("tau_e", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("tau_i", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("v_th", Dtype::Float64).read_only())
        .with_variable(Variable::scalar("v_reset", Dtype::Float64).read_only())
        .with_subexpression("I_syn", "I_e + I_i", Dtype::Float64)?
        .with_subexpression("I_e", "g_e * (E_e - v)", Dtype::Float64)?
        .with_subexpression("I_i", "g_i * (E_i - v)", Dtype::Float64)?
        .with_subexpression("I_leak", "g_l * (E_l - v)", Dtype::Float64)?
        .with_subexpression("decay_e", "exp(-dt / tau_e)", Dtype::Float64)?
        .with_subexpression("decay_i", "exp(-dt / tau_i)", Dtype::Float64)
}

/// A chain `s0 = x + 1`, `s{k} = s{k-1} * 2` of `depth` subexpressions and
/// a block reading the last one.
pub fn chain_table(depth: usize) -> Result<(SymbolTable, String), CompileError> {
    let mut table = SymbolTable::new().with_variable(Variable::vector("x", Dtype::Float64));
    table.insert_subexpression("s0", "x + 1", Dtype::Float64)?;
    for k in 1..depth.max(1) {
        table.insert_subexpression(format!("s{k}"), format!("s{} * 2", k - 1), Dtype::Float64)?;
    }
    let code = format!("x = s{}", depth.max(1) - 1);
    Ok((table, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_codegen::make_statements;

    #[test]
    fn mixed_clock_network_runs() {
        let mut reg = Registry::new();
        let (mut net, handles) = mixed_clock_network(&mut reg, 12, 3).unwrap();
        assert_eq!(net.len(), 12);
        net.run(6e-4).unwrap();
        // Clock k (step (k + 1) * 0.1 ms) ticks 6 / (k + 1) times.
        assert_eq!(handles[0].borrow().0, 6);
        assert_eq!(handles[1].borrow().0, 3);
        assert_eq!(handles[2].borrow().0, 2);
    }

    #[test]
    fn neuron_model_compiles() {
        let table = neuron_table().unwrap();
        let (scalar, vector) = make_statements(NEURON_MODEL, &table, Dtype::Float64).unwrap();
        let hoisted: Vec<_> = scalar.iter().map(|s| s.var.as_str()).collect();
        assert_eq!(hoisted, ["decay_e", "decay_i"]);
        assert!(vector.iter().any(|s| s.var == "I_syn"));
    }

    #[test]
    fn chain_materialises_every_link() {
        let (table, code) = chain_table(16).unwrap();
        let (_, vector) = make_statements(&code, &table, Dtype::Float64).unwrap();
        assert_eq!(vector.len(), 17);
        assert_eq!(vector[0].var, "s0");
        assert_eq!(vector[16].var, "x");
    }
}

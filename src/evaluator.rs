//! Feeder description, assembly and the sweep driver
//!
//! ## Overview
//! The evaluator collects a linear feeder description — per-phase feeder
//! segment impedances, per-phase load powers in connection order, and one
//! return-line impedance per tap — then assembles the element graph and
//! drives the propagation:
//!
//! 1. **Validation.** Every phase must carry as many feeder segments as
//!    loads as taps, and the return line must have one segment per tap.
//! 2. **Assembly.** The return line is built first and grounded at its far
//!    end; each tap then tees a load between the feeder and the return
//!    line. The first feeder segment of every phase is pinned to the
//!    phase-rotated source and, together with the grounded return segment,
//!    seeds the entry list.
//! 3. **Sweeps.** `3 · N_return` passes (one per series element of a tap,
//!    tripled to cover feeder, load and return), each a LIFO walk from the
//!    entry elements until the work buffer drains. There is no convergence
//!    test; the fixed budget is part of the reproducibility contract, though
//!    [`Evaluator::set_sweep_budget`] can override it for experiments.
//!
//! Phases are numbered from 1 in the public interface. The number of phases
//! is fixed at construction and anything at least 1 is accepted; the
//! three-phase cap of typical distribution feeders is the caller's business.

#![allow(missing_docs)]

use crate::circuit::{Circuit, SweepError};
use crate::consumer::{complex_power, PowerError};
use crate::element::ElementKind;
use crate::state::{ElementId, Param, Side};
use crate::C;
use std::f64::consts::PI;

/// Errors raised while describing or solving a feeder.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// A feeder needs at least one phase.
    #[error("at least one phase is required")]
    NoPhases,
    /// A phase index outside `[1, phases]` was used.
    #[error("phase <{phase}> not supported, use <{phases}> or lower")]
    PhaseOutOfRange { phase: usize, phases: usize },
    /// Power factor out of range (wrapped from the load conversion).
    #[error(transparent)]
    Power(#[from] PowerError),
    /// Feeder segments, loads and taps disagree on one phase.
    #[error(
        "feeder segments ({feeders}), loads ({loads}) and connections ({taps}) \
         do not match on phase <{phase}>"
    )]
    PhaseMismatch {
        phase: usize,
        feeders: usize,
        loads: usize,
        taps: usize,
    },
    /// The return line does not offer one segment per tap.
    #[error("return segments ({returns}) do not match the {taps} feeder taps")]
    ReturnMismatch { returns: usize, taps: usize },
    /// Nothing to seed the propagation with.
    #[error("no boundary-fixed entry element to seed the solve")]
    MissingBoundary,
    /// The propagation met itself mid-sweep.
    #[error(transparent)]
    Sweep(#[from] SweepError),
}

#[derive(Clone, Copy, Debug)]
struct Load {
    power: C,
    storage: bool,
}

/// Steady-state feeder evaluator.
///
/// Build one with [`Evaluator::new`], describe the feeder with the `add_*`
/// calls (the order of load additions defines the global connection order,
/// which must match the return-segment order one to one), then [`start`]
/// and read the solved circuit back through [`circuit`].
///
/// [`start`]: Evaluator::start
/// [`circuit`]: Evaluator::circuit
#[derive(Clone, Debug)]
pub struct Evaluator {
    phases: usize,
    vcc: C,
    vss: C,
    feeder_impedances: Vec<Vec<C>>,
    loads: Vec<Vec<Load>>,
    return_impedances: Vec<C>,
    /// 1-based phase of each tap, in global connection order.
    connection_order: Vec<usize>,
    sweep_budget: Option<usize>,
    circuit: Circuit,
}

impl Evaluator {
    /// Create an evaluator for `phases` phases with the given source and
    /// sink voltages.
    pub fn new(phases: usize, vcc: C, vss: C) -> Result<Self, SolveError> {
        if phases == 0 {
            return Err(SolveError::NoPhases);
        }
        Ok(Self {
            phases,
            vcc,
            vss,
            feeder_impedances: vec![Vec::new(); phases],
            loads: vec![Vec::new(); phases],
            return_impedances: Vec::new(),
            connection_order: Vec::new(),
            sweep_budget: None,
            circuit: Circuit::new(),
        })
    }

    /// Number of phases.
    pub fn phases(&self) -> usize {
        self.phases
    }

    /// Append a feeder-segment impedance to `phase` (1-based).
    pub fn add_feeder_impedance(&mut self, impedance: C, phase: usize) -> Result<(), SolveError> {
        self.check_phase(phase)?;
        self.feeder_impedances[phase - 1].push(impedance);
        Ok(())
    }

    /// Append a return-line segment impedance, in global connection order.
    pub fn add_return_impedance(&mut self, impedance: C) {
        self.return_impedances.push(impedance);
    }

    /// Append a consumer load to `phase` (1-based). Load order defines the
    /// global connection order along the feeder.
    pub fn add_power(&mut self, power: C, phase: usize) -> Result<(), SolveError> {
        self.push_load(power, phase, false)
    }

    /// Append a storage load to `phase`; solves exactly like a consumer but
    /// is tagged for separate reporting.
    pub fn add_storage_power(&mut self, power: C, phase: usize) -> Result<(), SolveError> {
        self.push_load(power, phase, true)
    }

    /// Append a consumer load given real watts, a power factor in `[0, 1]`
    /// and the inductive/capacitive choice.
    pub fn add_power_factored(
        &mut self,
        power: f64,
        power_factor: f64,
        inductive: bool,
        phase: usize,
    ) -> Result<(), SolveError> {
        let s = complex_power(power, power_factor, inductive)?;
        self.push_load(s, phase, false)
    }

    /// Override the sweep budget. The default, `3 · N_return`, is the
    /// reproducible choice; overrides are for experimentation.
    pub fn set_sweep_budget(&mut self, sweeps: usize) {
        self.sweep_budget = Some(sweeps);
    }

    /// The most recently solved circuit (empty before the first
    /// [`Evaluator::start`]).
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Assemble the circuit and run the sweep loop.
    ///
    /// On a sweep failure the error is terminal and the circuit is left in
    /// an undefined partial state.
    pub fn start(&mut self) -> Result<(), SolveError> {
        self.validate()?;
        self.circuit = self.assemble();
        if self.circuit.is_empty() || self.circuit.entries().is_empty() {
            return Err(SolveError::MissingBoundary);
        }

        let sweeps = self
            .sweep_budget
            .unwrap_or(3 * self.return_impedances.len());
        for sweep in 0..sweeps {
            let mut buffer: Vec<ElementId> = self.circuit.entries().to_vec();
            while let Some(id) = buffer.pop() {
                let next = self.circuit.update_one_sweep(id)?;
                buffer.extend(next);
            }
            tracing::debug!(sweep = sweep + 1, total = sweeps, "sweep complete");
        }

        // A load that kept zero current despite a commanded power did not
        // converge; that is reported, not failed (the fixed budget admits
        // it on pathological inputs).
        for el in self.circuit.elements() {
            if el.kind().is_load() {
                let s = el.power();
                let i = el.port_parameter(Side::Left, Param::Current);
                if (s.re != 0.0 || s.im != 0.0) && i.norm() == 0.0 {
                    tracing::warn!(
                        element = %el.name(),
                        "commanded power did not converge to a current"
                    );
                }
            }
        }
        Ok(())
    }

    fn check_phase(&self, phase: usize) -> Result<(), SolveError> {
        if phase < 1 || phase > self.phases {
            return Err(SolveError::PhaseOutOfRange {
                phase,
                phases: self.phases,
            });
        }
        Ok(())
    }

    fn push_load(&mut self, power: C, phase: usize, storage: bool) -> Result<(), SolveError> {
        self.check_phase(phase)?;
        self.loads[phase - 1].push(Load { power, storage });
        self.connection_order.push(phase);
        Ok(())
    }

    fn validate(&self) -> Result<(), SolveError> {
        for phase in 0..self.phases {
            let feeders = self.feeder_impedances[phase].len();
            let loads = self.loads[phase].len();
            let taps = self
                .connection_order
                .iter()
                .filter(|&&p| p == phase + 1)
                .count();
            if feeders != loads || taps != loads {
                return Err(SolveError::PhaseMismatch {
                    phase: phase + 1,
                    feeders,
                    loads,
                    taps,
                });
            }
        }
        if self.return_impedances.len() != self.connection_order.len() {
            return Err(SolveError::ReturnMismatch {
                returns: self.return_impedances.len(),
                taps: self.connection_order.len(),
            });
        }
        Ok(())
    }

    /// Source phasor for a 0-based phase index: the source magnitude rotated
    /// by `2π·p/P`, offset by the source's own argument (plus π when the
    /// source points down the negative real axis).
    fn phase_source(&self, phase_index: usize) -> C {
        let angle = 2.0 * PI / self.phases as f64;
        let mut offset = (self.vcc.im / self.vcc.re).atan();
        if offset == 0.0 && self.vcc.re < 0.0 {
            offset = PI;
        }
        let theta = angle * phase_index as f64 + offset;
        C::new(self.vcc.norm() * theta.cos(), self.vcc.norm() * theta.sin())
    }

    /// Build the element graph for the current description.
    ///
    /// The return line comes first: segment `i` hangs its right port onto
    /// segment `i-1`'s left port, and segment 0 is pinned to `vss`. Each tap
    /// then adds a load whose right port tees into the return node (the
    /// downstream segment's left port and the upstream segment's right
    /// port), and a feeder segment feeding the load from the left, chained
    /// to the previous feeder segment of the same phase. Every element
    /// carries the rotated source of its tap's phase.
    fn assemble(&self) -> Circuit {
        let mut circuit = Circuit::new();

        let mut returns: Vec<ElementId> = Vec::with_capacity(self.return_impedances.len());
        for (tap, &impedance) in self.return_impedances.iter().enumerate() {
            let source = self.phase_source(self.connection_order[tap] - 1);
            let id = circuit.add(ElementKind::Resistor, source, self.vss);
            circuit.element_mut(id).set_impedance(impedance);
            if let Some(&previous) = returns.last() {
                circuit.connect(id, Side::Right, previous, Side::Left);
            } else {
                circuit.set_port_parameter(id, Side::Right, Param::Voltage, self.vss);
                circuit.fix_port_parameter(id, Side::Right, Param::Voltage, true);
                circuit.mark_entry(id);
            }
            returns.push(id);
        }

        for phase in 0..self.phases {
            let source = self.phase_source(phase);
            let mut previous_feeder: Option<ElementId> = None;
            let mut taps_on_phase = 0usize;
            for (tap, &tap_phase) in self.connection_order.iter().enumerate() {
                if tap_phase != phase + 1 {
                    continue;
                }
                let load = self.loads[phase][taps_on_phase];
                let kind = if load.storage {
                    ElementKind::Storage
                } else {
                    ElementKind::Consumer
                };
                let consumer = circuit.add(kind, source, self.vss);
                circuit.element_mut(consumer).set_power(load.power);
                circuit.connect(consumer, Side::Right, returns[tap], Side::Left);
                if tap + 1 < returns.len() {
                    circuit.connect(consumer, Side::Right, returns[tap + 1], Side::Right);
                }

                let feeder = circuit.add(ElementKind::Resistor, source, self.vss);
                circuit
                    .element_mut(feeder)
                    .set_impedance(self.feeder_impedances[phase][taps_on_phase]);
                circuit.connect(feeder, Side::Right, consumer, Side::Left);
                if let Some(previous) = previous_feeder {
                    circuit.connect(feeder, Side::Left, previous, Side::Right);
                } else {
                    circuit.set_port_parameter(feeder, Side::Left, Param::Voltage, source);
                    circuit.fix_port_parameter(feeder, Side::Left, Param::Voltage, true);
                    circuit.mark_entry(feeder);
                }
                previous_feeder = Some(feeder);
                taps_on_phase += 1;
            }
        }

        circuit
    }
}

// ============================================================================
// Tests
// ============================================================================

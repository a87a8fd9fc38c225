//! Crate root: public surface, core aliases, and solver-wide invariants
//!
//! This crate is a steady-state solver for low-voltage electrical
//! distribution feeders in the complex-phasor domain. A feeder is described
//! as a multi-phase source, a common return (neutral) line, a sequence of
//! series line segments, and a set of constant-apparent-power loads tapped
//! onto each phase. For one time sample the solver computes the complex
//! voltage at every port of every element and the complex current through
//! each element, by pushing voltages out from the boundary-fixed ports
//! through an iterative, flag-driven propagation.
//!
//! ## Invariants
//!
//! - **Open-circuit sentinel.** An impedance whose real part is `+∞` denotes
//!   an open circuit. The sentinel is compared exactly and is carried through
//!   every aggregation step; see [`phasor::Impedance`].
//! - **One voltage per node.** Ports that are connected to each other always
//!   hold the same voltage: every voltage write is propagated to the
//!   neighbouring ports in the same call.
//! - **Boundary conditions are immutable.** A slot flagged as given is never
//!   overwritten, by direct writes or by propagation.
//! - **Determinism.** Neighbour lists preserve insertion order, the sweep
//!   buffer is a plain LIFO, and the iteration budget is fixed, so identical
//!   inputs produce bit-identical outputs.
//!
//! The aggregation recursion is exact only on the nearly-linear graphs the
//! assembly recipe produces; see [`circuit::Circuit::impedance_looking_out`].

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Complex-phasor primitives: the open-circuit tag and reduction rules.
pub mod phasor;
/// Typed state slots, ports, sides and parameter names.
pub mod state;
/// The element kernel: identity, kind tag, ports and owned parameters.
pub mod element;
/// Element arena, connectivity and parameter writes with propagation.
pub mod circuit;
/// Passive series element: directional impedance aggregation and updates.
pub mod resistor;
/// Constant-apparent-power loads (consumers and storage).
pub mod consumer;
/// Feeder description, assembly and the sweep driver.
pub mod evaluator;
/// Row output model for downstream writers.
pub mod report;
/// Household power-profile collaborator interface.
pub mod profile;

/// Complex phasor used across the crate.
pub type C = num_complex::Complex64;

pub use crate::circuit::{Circuit, SweepError};
pub use crate::consumer::{complex_power, PowerError};
pub use crate::element::{Element, ElementKind};
pub use crate::evaluator::{Evaluator, SolveError};
pub use crate::phasor::{div_or_open, is_open, Impedance, OPEN};
pub use crate::profile::{PowerProfiles, ProfileError};
pub use crate::report::{feeder_rows, storage_rows, substation_rows, ElementRow, MagnitudeRow};
pub use crate::state::{ElementId, Param, PortRef, Side};

//! Row output model
//!
//! Downstream writers (CSV, JSON, plots) consume per-element rows rather
//! than the circuit itself. Two flavours exist: [`ElementRow`] carries the
//! complex values, [`MagnitudeRow`] the scalar magnitudes with Z and S
//! recomputed from the magnitudes. In both, zero current degrades the
//! derived impedance to the open-circuit sentinel and the derived power to
//! zero.

#![allow(missing_docs)]

use crate::circuit::Circuit;
use crate::element::{Element, ElementKind};
use crate::phasor::OPEN;
use crate::state::{Param, Side};
use crate::C;
use num_traits::Zero;
use serde::Serialize;

/// Complex-valued row for one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementRow {
    pub name: String,
    pub v_left: C,
    pub v_right: C,
    pub current: C,
    /// `(V_l - V_r) / I`, or the open sentinel when no current flows.
    pub impedance: C,
    /// `(V_l - V_r) · I`, or zero when no current flows.
    pub power: C,
}

impl ElementRow {
    /// Build the row for one element from its solved port values.
    pub fn from_element(element: &Element) -> Self {
        let v_left = element.port_parameter(Side::Left, Param::Voltage);
        let v_right = element.port_parameter(Side::Right, Param::Voltage);
        let current = element.port_parameter(Side::Left, Param::Current);
        let (impedance, power) = if current.norm() == 0.0 {
            (OPEN, C::zero())
        } else {
            ((v_left - v_right) / current, (v_left - v_right) * current)
        };
        Self {
            name: element.name(),
            v_left,
            v_right,
            current,
            impedance,
            power,
        }
    }

    /// The scalar flavour of this row. Z and S are recomputed from the
    /// magnitudes, not taken from the complex quotients.
    pub fn magnitudes(&self) -> MagnitudeRow {
        let v_left = self.v_left.norm();
        let v_right = self.v_right.norm();
        let current = self.current.norm();
        let (impedance, power) = if current == 0.0 {
            (f64::INFINITY, 0.0)
        } else {
            ((v_left - v_right) / current, (v_left - v_right) * current)
        };
        MagnitudeRow {
            name: self.name.clone(),
            v_left,
            v_right,
            current,
            impedance,
            power,
        }
    }
}

/// Magnitude-valued row for one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MagnitudeRow {
    pub name: String,
    pub v_left: f64,
    pub v_right: f64,
    pub current: f64,
    pub impedance: f64,
    pub power: f64,
}

/// Rows for every consumer along the feeder, in circuit order. Storage
/// elements are excluded; they are reported separately downstream.
pub fn feeder_rows(circuit: &Circuit) -> Vec<ElementRow> {
    circuit
        .elements()
        .filter(|e| e.kind() == ElementKind::Consumer)
        .map(ElementRow::from_element)
        .collect()
}

/// Rows for every storage element, in circuit order.
pub fn storage_rows(circuit: &Circuit) -> Vec<ElementRow> {
    circuit
        .elements()
        .filter(|e| e.kind() == ElementKind::Storage)
        .map(ElementRow::from_element)
        .collect()
}

/// Rows for every element with a boundary-fixed port voltage: the
/// source-side feeder segments and the grounded return segment.
pub fn substation_rows(circuit: &Circuit) -> Vec<ElementRow> {
    circuit
        .elements()
        .filter(|e| {
            e.is_port_parameter_fixed(Side::Left, Param::Voltage)
                || e.is_port_parameter_fixed(Side::Right, Param::Voltage)
        })
        .map(ElementRow::from_element)
        .collect()
}

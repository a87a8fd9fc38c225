//! The element kernel
//!
//! An element is the unit of the circuit graph: it has an identity, a kind
//! tag, a reference source (`vcc`) and sink (`vss`) voltage, exactly two
//! ports, and its own electrical parameters (an impedance for every kind, a
//! commanded complex power for loads). Kind-specific behaviour lives in
//! [`crate::resistor`] and [`crate::consumer`]; the kernel only carries the
//! shared record and its accessors.

use crate::consumer::{complex_power, PowerError};
use crate::phasor::Impedance;
use crate::state::{ElementId, Param, Port, Side};
use crate::C;
use num_traits::Zero;

/// The element kind tag.
///
/// Storage is a consumer for every numeric purpose; the tag only matters to
/// external reporting, which lists storage rows separately.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Passive series impedance (line segment).
    Resistor,
    /// Constant-apparent-power load.
    Consumer,
    /// Storage load; numerically identical to [`ElementKind::Consumer`].
    Storage,
}

impl ElementKind {
    /// Stable label used for element names and row output.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Resistor => "resistor",
            ElementKind::Consumer => "consumer",
            ElementKind::Storage => "storage",
        }
    }

    /// Whether this kind is a constant-power load.
    #[inline]
    pub fn is_load(self) -> bool {
        !matches!(self, ElementKind::Resistor)
    }
}

/// One circuit element.
#[derive(Clone, Debug)]
pub struct Element {
    id: ElementId,
    kind: ElementKind,
    vcc: C,
    vss: C,
    ports: [Port; 2],
    impedance: Impedance,
    power: C,
    /// One-slot buffer for the aggregate impedance looking out of the most
    /// recently interrogated side, excluding this element's own impedance.
    /// `(0, 0)` means empty.
    z_beyond: C,
}

impl Element {
    pub(crate) fn new(id: ElementId, kind: ElementKind, vcc: C, vss: C) -> Self {
        Self {
            id,
            kind,
            vcc,
            vss,
            ports: [Port::new(Side::Left), Port::new(Side::Right)],
            impedance: Impedance::Open,
            power: C::zero(),
            z_beyond: C::zero(),
        }
    }

    /// The element's arena index.
    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The element's kind tag.
    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The element name, `{kind}_{index}`, unique within its circuit.
    pub fn name(&self) -> String {
        format!("{}_{}", self.kind.as_str(), self.id.as_usize())
    }

    /// Reference source voltage this element was created against.
    #[inline]
    pub fn vcc(&self) -> C {
        self.vcc
    }

    /// Reference ground voltage this element was created against.
    #[inline]
    pub fn vss(&self) -> C {
        self.vss
    }

    /// The element's own impedance.
    #[inline]
    pub fn impedance(&self) -> Impedance {
        self.impedance
    }

    /// Set the element's own impedance. Accepts either an [`Impedance`] or a
    /// raw phasor, in which case the `(+∞, 0)` sentinel maps to open.
    pub fn set_impedance(&mut self, impedance: impl Into<Impedance>) {
        self.impedance = impedance.into();
    }

    /// The commanded complex power (loads only; zero otherwise).
    #[inline]
    pub fn power(&self) -> C {
        self.power
    }

    /// Set the commanded complex power directly.
    pub fn set_power(&mut self, power: C) {
        self.power = power;
    }

    /// Set the commanded power from real watts, a power factor in `[0, 1]`
    /// and the inductive/capacitive choice.
    pub fn set_power_factored(
        &mut self,
        power: f64,
        power_factor: f64,
        inductive: bool,
    ) -> Result<(), PowerError> {
        self.power = complex_power(power, power_factor, inductive)?;
        Ok(())
    }

    /// The port on `side`.
    #[inline]
    pub fn port(&self, side: Side) -> &Port {
        &self.ports[side.index()]
    }

    #[inline]
    pub(crate) fn port_mut(&mut self, side: Side) -> &mut Port {
        &mut self.ports[side.index()]
    }

    /// Read a port parameter; missing slots read as zero.
    pub fn port_parameter(&self, side: Side, name: Param) -> C {
        self.port(side)
            .slot(name)
            .map(|s| s.value)
            .unwrap_or_else(C::zero)
    }

    /// Whether the slot was updated during the current sweep.
    pub fn is_port_parameter_set(&self, side: Side, name: Param) -> bool {
        self.port(side).slot(name).map(|s| s.is_set).unwrap_or(false)
    }

    /// Whether the slot is a fixed boundary condition.
    pub fn is_port_parameter_fixed(&self, side: Side, name: Param) -> bool {
        self.port(side)
            .slot(name)
            .map(|s| s.is_given)
            .unwrap_or(false)
    }

    #[inline]
    pub(crate) fn beyond_cache(&self) -> C {
        self.z_beyond
    }

    #[inline]
    pub(crate) fn set_beyond_cache(&mut self, z: C) {
        self.z_beyond = z;
    }

    #[inline]
    pub(crate) fn clear_beyond_cache(&mut self) {
        self.z_beyond = C::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phasor::OPEN;

    fn element(kind: ElementKind, index: usize) -> Element {
        Element::new(
            ElementId(index),
            kind,
            C::new(240.0, 0.0),
            C::new(0.0, 0.0),
        )
    }

    #[test]
    fn names_follow_kind_and_index() {
        assert_eq!(element(ElementKind::Resistor, 0).name(), "resistor_0");
        assert_eq!(element(ElementKind::Consumer, 7).name(), "consumer_7");
        assert_eq!(element(ElementKind::Storage, 12).name(), "storage_12");
    }

    #[test]
    fn new_elements_start_open_and_idle() {
        let el = element(ElementKind::Consumer, 0);
        assert!(el.impedance().is_open());
        assert_eq!(el.power(), C::new(0.0, 0.0));
        assert_eq!(el.port_parameter(Side::Left, Param::Voltage), C::new(0.0, 0.0));
        // A parameter the port does not carry reads as zero.
        assert_eq!(el.port_parameter(Side::Left, Param::Power), C::new(0.0, 0.0));
        assert!(!el.is_port_parameter_set(Side::Left, Param::Voltage));
        assert!(!el.is_port_parameter_fixed(Side::Right, Param::Voltage));
    }

    #[test]
    fn impedance_setter_understands_the_sentinel() {
        let mut el = element(ElementKind::Resistor, 0);
        el.set_impedance(C::new(0.25, 0.5));
        assert_eq!(el.impedance(), Impedance::Finite(C::new(0.25, 0.5)));
        el.set_impedance(OPEN);
        assert!(el.impedance().is_open());
        el.set_impedance(Impedance::Finite(C::new(1.0, 0.0)));
        assert!(!el.impedance().is_open());
    }

    #[test]
    fn factored_power_rejects_bad_power_factor() {
        let mut el = element(ElementKind::Consumer, 0);
        assert!(el.set_power_factored(900.0, 1.4, true).is_err());
        assert_eq!(el.power(), C::new(0.0, 0.0));
        el.set_power_factored(900.0, 1.0, true).unwrap();
        assert_eq!(el.power(), C::new(900.0, 0.0));
    }
}

//! Port and state model
//!
//! Elements expose their electrical interface through two ports, `left` and
//! `right`. Each port owns a small set of named state slots (voltage and
//! current) whose `is_set` / `is_given` flags drive the fixed-point
//! iteration: `is_given` marks an immutable boundary condition, `is_set`
//! records which slot received the most recent authoritative update within
//! the current sweep.
//!
//! Ports reference their neighbours as `(element, side)` pairs into the
//! owning circuit's arena, which keeps the neighbour relation symmetric
//! without ownership cycles.

#![allow(missing_docs)]

use crate::C;
use num_traits::Zero;

/// Index of an element in its circuit's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub usize);

impl ElementId {
    /// Access the underlying index.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// A port side. Every element has exactly one port per side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Stable label used in diagnostics and row output.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// The other side of the same element.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Names of the numeric parameters carried by ports and elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Voltage,
    Current,
    Impedance,
    Power,
}

impl Param {
    /// Stable label. Power keeps the historical `watt` spelling.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Param::Voltage => "voltage",
            Param::Current => "current",
            Param::Impedance => "impedance",
            Param::Power => "watt",
        }
    }
}

/// A named numeric slot with the two iteration flags.
#[derive(Copy, Clone, Debug)]
pub struct Slot {
    pub name: Param,
    pub value: C,
    /// Updated during the current sweep.
    pub is_set: bool,
    /// Fixed boundary condition; writes are no-ops while this holds.
    pub is_given: bool,
}

impl Slot {
    pub(crate) fn new(name: Param) -> Self {
        Self {
            name,
            value: C::zero(),
            is_set: false,
            is_given: false,
        }
    }
}

/// A non-owning reference to a port: the owning element plus the side.
///
/// Two ports are equal iff they agree on both coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub element: ElementId,
    pub side: Side,
}

/// One element port: its slots and its neighbour links.
///
/// `is_connected` holds exactly when the neighbour list is non-empty, and the
/// neighbour relation is kept symmetric by [`crate::Circuit::connect`].
#[derive(Clone, Debug)]
pub struct Port {
    pub side: Side,
    pub params: Vec<Slot>,
    pub neighbours: Vec<PortRef>,
    pub is_connected: bool,
}

impl Port {
    pub(crate) fn new(side: Side) -> Self {
        Self {
            side,
            params: vec![Slot::new(Param::Current), Slot::new(Param::Voltage)],
            neighbours: Vec::new(),
            is_connected: false,
        }
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: Param) -> Option<&Slot> {
        self.params.iter().find(|s| s.name == name)
    }

    pub(crate) fn slot_mut(&mut self, name: Param) -> Option<&mut Slot> {
        self.params.iter_mut().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(Side::Left.as_str(), "left");
        assert_eq!(Side::Right.as_str(), "right");
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Param::Voltage.as_str(), "voltage");
        assert_eq!(Param::Current.as_str(), "current");
        assert_eq!(Param::Impedance.as_str(), "impedance");
        assert_eq!(Param::Power.as_str(), "watt");
    }

    #[test]
    fn new_port_has_cold_slots() {
        let port = Port::new(Side::Left);
        assert!(!port.is_connected);
        assert!(port.neighbours.is_empty());
        let v = port.slot(Param::Voltage).unwrap();
        assert_eq!(v.value, C::zero());
        assert!(!v.is_set && !v.is_given);
        assert!(port.slot(Param::Impedance).is_none());
    }

    #[test]
    fn port_refs_compare_by_element_and_side() {
        let a = PortRef { element: ElementId(1), side: Side::Left };
        let b = PortRef { element: ElementId(1), side: Side::Left };
        let c = PortRef { element: ElementId(1), side: Side::Right };
        let d = PortRef { element: ElementId(2), side: Side::Left };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}

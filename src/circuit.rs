//! Element arena and connectivity
//!
//! The circuit owns every element; ports reference each other with
//! `(element, side)` pairs, so the graph carries no ownership cycles. All
//! parameter writes go through the circuit because a voltage write must reach
//! the neighbouring ports in the same call (one node, one voltage).
//!
//! ## Flag discipline
//!
//! Writing a slot marks it `is_set`. Writing a **voltage** additionally
//! overwrites the voltage of every neighbour port (marking theirs `is_set`)
//! and then clears the `is_set` flag of the *current* slot on the same side;
//! writing a **current** clears the voltage flag on the same side. The flags
//! therefore record the most recent authoritative update and keep one sweep
//! from flapping between voltage-driven and current-driven readings of the
//! same port. Slots flagged `is_given` are never written, including through
//! propagation.

use crate::element::{Element, ElementKind};
use crate::phasor::Impedance;
use crate::state::{ElementId, Param, PortRef, Side};
use crate::C;

/// Errors raised while interrogating elements during a sweep.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Both port voltages of an element became set with neither side given;
    /// the propagation has met itself and the sweep cannot continue.
    #[error("element <{name}>: both port voltages have been set")]
    VoltageConflict {
        /// Name of the offending element.
        name: String,
    },
}

/// The element arena plus the boundary-seeded entry list.
#[derive(Clone, Debug, Default)]
pub struct Circuit {
    elements: Vec<Element>,
    entries: Vec<ElementId>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element and return its id. Ids (and hence names) count up
    /// from zero within this circuit.
    pub fn add(&mut self, kind: ElementKind, vcc: C, vss: C) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(id, kind, vcc, vss));
        id
    }

    /// Borrow an element.
    #[inline]
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.as_usize()]
    }

    /// Borrow an element mutably.
    #[inline]
    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.as_usize()]
    }

    /// Iterate over all elements in creation order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the circuit holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Record an element as a propagation entry point.
    pub fn mark_entry(&mut self, id: ElementId) {
        self.entries.push(id);
    }

    /// The entry elements, in the order they were marked.
    pub fn entries(&self) -> &[ElementId] {
        &self.entries
    }

    /// Connect `a`'s port on `a_side` with `b`'s port on `b_side`.
    ///
    /// The link is symmetric and idempotent: reconnecting an existing pair
    /// changes nothing, and a port may accumulate several neighbours (a tap
    /// node). Insertion order of neighbours is preserved; it defines the
    /// interrogation order during sweeps.
    pub fn connect(&mut self, a: ElementId, a_side: Side, b: ElementId, b_side: Side) {
        let a_ref = PortRef { element: a, side: a_side };
        let b_ref = PortRef { element: b, side: b_side };
        {
            let port = self.elements[a.as_usize()].port_mut(a_side);
            if !port.neighbours.contains(&b_ref) {
                port.neighbours.push(b_ref);
                port.is_connected = true;
            }
        }
        {
            let port = self.elements[b.as_usize()].port_mut(b_side);
            if !port.neighbours.contains(&a_ref) {
                port.neighbours.push(a_ref);
                port.is_connected = true;
            }
        }
    }

    /// Owning elements of every neighbour of `id`'s port on `side`, in
    /// neighbour insertion order.
    pub fn connected_elements(&self, id: ElementId, side: Side) -> Vec<ElementId> {
        self.element(id)
            .port(side)
            .neighbours
            .iter()
            .map(|n| n.element)
            .collect()
    }

    /// Write a port parameter, honouring the flag discipline described in
    /// the module docs. Writes to missing or given slots are no-ops.
    pub fn set_port_parameter(&mut self, id: ElementId, side: Side, name: Param, value: C) {
        let neighbours: Vec<PortRef>;
        {
            let el = &mut self.elements[id.as_usize()];
            match el.port_mut(side).slot_mut(name) {
                Some(slot) if !slot.is_given => {
                    slot.value = value;
                    slot.is_set = true;
                }
                _ => return,
            }
            neighbours = if name == Param::Voltage {
                el.port(side).neighbours.clone()
            } else {
                Vec::new()
            };
        }

        match name {
            Param::Voltage => {
                // Every connected port holds the same node voltage.
                for n in &neighbours {
                    let port = self.elements[n.element.as_usize()].port_mut(n.side);
                    if let Some(slot) = port.slot_mut(Param::Voltage) {
                        if !slot.is_given {
                            slot.value = value;
                            slot.is_set = true;
                        }
                    }
                }
                let port = self.elements[id.as_usize()].port_mut(side);
                if let Some(slot) = port.slot_mut(Param::Current) {
                    if !slot.is_given {
                        slot.is_set = false;
                    }
                }
            }
            Param::Current => {
                let port = self.elements[id.as_usize()].port_mut(side);
                if let Some(slot) = port.slot_mut(Param::Voltage) {
                    if !slot.is_given {
                        slot.is_set = false;
                    }
                }
            }
            _ => {}
        }
    }

    /// Flag a port parameter as a fixed boundary condition (or release it).
    pub fn fix_port_parameter(&mut self, id: ElementId, side: Side, name: Param, given: bool) {
        if let Some(slot) = self.elements[id.as_usize()].port_mut(side).slot_mut(name) {
            slot.is_given = given;
        }
    }

    /// Thevenin-equivalent impedance seen looking out of `side` of `id`,
    /// including the element's own impedance.
    ///
    /// The recursion hands the caller's side label through unchanged, which
    /// is exact only on the nearly-linear graphs the feeder assembly
    /// produces; general meshes are outside this solver's contract.
    pub fn impedance_looking_out(&mut self, id: ElementId, side: Side) -> Impedance {
        match self.element(id).kind() {
            ElementKind::Resistor => self.resistor_impedance_looking_out(id, side),
            ElementKind::Consumer | ElementKind::Storage => {
                self.consumer_impedance_looking_out(id, side)
            }
        }
    }

    /// Interrogate one element: recompute its current (and the voltage on
    /// its unknown side, if any) from whichever side is known, and return
    /// the elements to interrogate next.
    pub fn update_one_sweep(&mut self, id: ElementId) -> Result<Vec<ElementId>, SweepError> {
        match self.element(id).kind() {
            ElementKind::Resistor => self.resistor_update(id),
            ElementKind::Consumer | ElementKind::Storage => Ok(self.consumer_update(id)),
        }
    }
}

//! Passive series element behaviour
//!
//! A resistor owns a fixed impedance and reduces the rest of the graph to a
//! Thevenin equivalent when asked for the impedance looking out of one of
//! its sides: neighbours whose own impedance is open are discarded, a single
//! survivor is a series case, several survivors combine in parallel, and the
//! element's own impedance is added on top. The pre-own aggregate is kept in
//! a one-slot buffer so the next same-sweep update can reuse it instead of
//! recursing again.
//!
//! The per-sweep update reads the voltage flags on both ports and picks one
//! of seven actions; see [`Circuit::update_one_sweep`].

use crate::circuit::{Circuit, SweepError};
use crate::phasor::Impedance;
use crate::state::{ElementId, Param, Side};
use crate::C;
use num_traits::Zero;

impl Circuit {
    pub(crate) fn resistor_impedance_looking_out(
        &mut self,
        id: ElementId,
        side: Side,
    ) -> Impedance {
        let own = self.element(id).impedance();
        if own.is_open() {
            return Impedance::Open;
        }

        // Open branches do not carry current; drop them before reducing.
        let live: Vec<ElementId> = self
            .connected_elements(id, side)
            .into_iter()
            .filter(|&n| !self.element(n).impedance().is_open())
            .collect();
        if live.is_empty() {
            return Impedance::Open;
        }

        let beyond = if live.len() > 1 {
            let branches: Vec<Impedance> = live
                .iter()
                .map(|&n| self.impedance_looking_out(n, side))
                .collect();
            Impedance::parallel(&branches)
        } else {
            self.impedance_looking_out(live[0], side)
        };

        self.element_mut(id).set_beyond_cache(beyond.into_phasor());
        beyond.series(own)
    }

    /// One-sweep update for a resistor. Returns the neighbours on the side
    /// the update drove towards, or an empty list when both sides were
    /// already fixed.
    pub(crate) fn resistor_update(&mut self, id: ElementId) -> Result<Vec<ElementId>, SweepError> {
        let (left_fixed, right_fixed, left_set, right_set) = {
            let el = self.element(id);
            (
                el.is_port_parameter_fixed(Side::Left, Param::Voltage),
                el.is_port_parameter_fixed(Side::Right, Param::Voltage),
                el.is_port_parameter_set(Side::Left, Param::Voltage),
                el.is_port_parameter_set(Side::Right, Param::Voltage),
            )
        };

        let (current, next) = if left_fixed && right_fixed {
            // Both boundaries known: plain Ohm's law, nothing to drive.
            let el = self.element(id);
            let current = match el.impedance() {
                Impedance::Finite(z) => {
                    (el.port_parameter(Side::Left, Param::Voltage)
                        - el.port_parameter(Side::Right, Param::Voltage))
                        / z
                }
                Impedance::Open => C::zero(),
            };
            (current, Vec::new())
        } else if left_fixed {
            self.resistor_drive(id, Side::Right, false)
        } else if right_fixed {
            self.resistor_drive(id, Side::Left, false)
        } else {
            match (left_set, right_set) {
                (true, true) => {
                    return Err(SweepError::VoltageConflict {
                        name: self.element(id).name(),
                    })
                }
                (true, false) => self.resistor_drive(id, Side::Right, true),
                (false, true) => self.resistor_drive(id, Side::Left, true),
                (false, false) => {
                    tracing::warn!(
                        element = %self.element(id).name(),
                        "interrogated with no known port voltage"
                    );
                    (C::zero(), Vec::new())
                }
            }
        };

        self.set_port_parameter(id, Side::Left, Param::Current, current);
        self.set_port_parameter(id, Side::Right, Param::Current, -current);
        Ok(next)
    }

    /// Push the known voltage across the element towards `toward`.
    ///
    /// The total impedance is the element's own plus everything beyond the
    /// driven side; the current is the potential difference between the
    /// known side and the opposite reference rail over that total. The
    /// buffered beyond-impedance is only trusted when both of its axes are
    /// non-zero, and is consumed by the use.
    fn resistor_drive(
        &mut self,
        id: ElementId,
        toward: Side,
        use_cache: bool,
    ) -> (C, Vec<ElementId>) {
        let own = self.element(id).impedance();
        let total = if use_cache {
            let cached = self.element(id).beyond_cache();
            if cached.re != 0.0 && cached.im != 0.0 {
                self.element_mut(id).clear_beyond_cache();
                own.series(Impedance::from_phasor(cached))
            } else {
                self.impedance_looking_out(id, toward)
            }
        } else {
            self.impedance_looking_out(id, toward)
        };

        let (current, new_voltage) = {
            let el = self.element(id);
            let current = match total {
                Impedance::Finite(z_total) => match toward {
                    Side::Right => {
                        (el.port_parameter(Side::Left, Param::Voltage) - el.vss()) / z_total
                    }
                    Side::Left => {
                        (el.vcc() - el.port_parameter(Side::Right, Param::Voltage)) / z_total
                    }
                },
                Impedance::Open => C::zero(),
            };
            // The opposite-side voltage follows from the drop across the
            // element itself; with an open element there is no defined drop.
            let new_voltage = match own {
                Impedance::Finite(z) => Some(match toward {
                    Side::Right => {
                        el.port_parameter(Side::Left, Param::Voltage) - current * z
                    }
                    Side::Left => {
                        el.port_parameter(Side::Right, Param::Voltage) + current * z
                    }
                }),
                Impedance::Open => None,
            };
            (current, new_voltage)
        };

        if let Some(v) = new_voltage {
            self.set_port_parameter(id, toward, Param::Voltage, v);
        }
        (current, self.connected_elements(id, toward))
    }
}

//! Constant-apparent-power load behaviour
//!
//! A consumer converts its commanded complex power into an effective
//! impedance once both of its port voltages are known, then draws the
//! matching current. Until then it reads as an open circuit. Seen from a
//! neighbouring line segment the load splits into two half-impedances hinged
//! at the reference rails: looking from the right it spans `V_left` down to
//! `vss`, looking from the left it spans `vcc` down to `V_right`.

use crate::circuit::Circuit;
use crate::phasor::Impedance;
use crate::state::{ElementId, Param, Side};
use crate::C;
use num_traits::Zero;

/// Errors raised when deriving a complex power from scalar inputs.
#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    /// The power factor must lie in the closed unit interval.
    #[error("invalid power factor <{0}>, must lie in [0, 1]")]
    PowerFactor(f64),
}

/// Complex power from apparent watts, a power factor and the reactive sign:
/// `S = P·pf + j·sign·sqrt(P² − (P·pf)²)`, positive imaginary when
/// inductive.
pub fn complex_power(power: f64, power_factor: f64, inductive: bool) -> Result<C, PowerError> {
    if !(0.0..=1.0).contains(&power_factor) {
        return Err(PowerError::PowerFactor(power_factor));
    }
    let true_power = power * power_factor;
    let reactive = (power * power - true_power * true_power).sqrt();
    Ok(C::new(true_power, if inductive { reactive } else { -reactive }))
}

/// Effective load impedance for a voltage difference `dv` and a commanded
/// power `s`: the real-valued magnitude `|dv²/s|`.
///
/// The rotation that would tilt this onto the power-factor angle is left
/// unapplied on purpose (the solve keeps load currents collinear with the
/// voltage drop); replace this function to change that.
#[inline]
pub fn effective_impedance(dv: C, s: C) -> f64 {
    ((dv * dv) / s).norm()
}

impl Circuit {
    /// The load's split impedance seen from `side`. Zero commanded power or
    /// zero left-port current read as an open circuit.
    pub(crate) fn consumer_impedance_looking_out(&self, id: ElementId, side: Side) -> Impedance {
        let el = self.element(id);
        let s = el.power();
        if s.re == 0.0 && s.im == 0.0 {
            return Impedance::Open;
        }
        let i_left = el.port_parameter(Side::Left, Param::Current);
        if i_left.re == 0.0 && i_left.im == 0.0 {
            return Impedance::Open;
        }
        match side {
            Side::Right => Impedance::Finite(
                (el.port_parameter(Side::Left, Param::Voltage) - el.vss()) / i_left,
            ),
            Side::Left => Impedance::Finite(
                (el.vcc() - el.port_parameter(Side::Right, Param::Voltage)) / i_left,
            ),
        }
    }

    /// One-sweep update for a load. Only acts once both port voltages are
    /// known (given or set this sweep), so the two sides correlate; loads
    /// terminate the propagation and never emit follow-up elements.
    pub(crate) fn consumer_update(&mut self, id: ElementId) -> Vec<ElementId> {
        let (both_known, s, dv) = {
            let el = self.element(id);
            let left_known = el.is_port_parameter_fixed(Side::Left, Param::Voltage)
                || el.is_port_parameter_set(Side::Left, Param::Voltage);
            let right_known = el.is_port_parameter_fixed(Side::Right, Param::Voltage)
                || el.is_port_parameter_set(Side::Right, Param::Voltage);
            (
                left_known && right_known,
                el.power(),
                el.port_parameter(Side::Left, Param::Voltage)
                    - el.port_parameter(Side::Right, Param::Voltage),
            )
        };
        if !both_known {
            return Vec::new();
        }

        let mut impedance = Impedance::Open;
        let mut current = C::zero();
        if s.re != 0.0 || s.im != 0.0 {
            let z = effective_impedance(dv, s);
            if z != 0.0 {
                current = dv / z;
            }
            impedance = Impedance::Finite(C::new(z, 0.0));
        }

        self.element_mut(id).set_impedance(impedance);
        self.set_port_parameter(id, Side::Left, Param::Current, current);
        self.set_port_parameter(id, Side::Right, Param::Current, -current);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    const VCC: C = C::new(240.0, 0.0);
    const VSS: C = C::new(0.0, 0.0);

    #[test]
    fn complex_power_matches_the_power_triangle() {
        let s = complex_power(1000.0, 0.8, true).unwrap();
        assert!((s.re - 800.0).abs() < 1e-9);
        assert!((s.im - 600.0).abs() < 1e-9);

        let s = complex_power(1000.0, 0.8, false).unwrap();
        assert!((s.im + 600.0).abs() < 1e-9);

        // Unity power factor carries no reactive part.
        let s = complex_power(900.0, 1.0, true).unwrap();
        assert_eq!(s, C::new(900.0, 0.0));
    }

    #[test]
    fn complex_power_rejects_out_of_range_factors() {
        assert!(matches!(
            complex_power(100.0, -0.1, true),
            Err(PowerError::PowerFactor(_))
        ));
        assert!(complex_power(100.0, 1.01, false).is_err());
    }

    #[test]
    fn effective_impedance_is_a_real_magnitude() {
        let z = effective_impedance(C::new(240.0, 0.0), C::new(240.0, 0.0));
        assert!((z - 240.0).abs() < 1e-9);
        // Reactive power lowers the magnitude but the result stays real.
        let z = effective_impedance(C::new(240.0, 0.0), C::new(800.0, 600.0));
        assert!((z - 240.0 * 240.0 / 1000.0).abs() < 1e-9);
    }

    fn fixed_voltage_consumer(power: C, v_left: C, v_right: C) -> (Circuit, ElementId) {
        let mut circuit = Circuit::new();
        let id = circuit.add(ElementKind::Consumer, VCC, VSS);
        circuit.element_mut(id).set_power(power);
        circuit.set_port_parameter(id, Side::Left, Param::Voltage, v_left);
        circuit.fix_port_parameter(id, Side::Left, Param::Voltage, true);
        circuit.set_port_parameter(id, Side::Right, Param::Voltage, v_right);
        circuit.fix_port_parameter(id, Side::Right, Param::Voltage, true);
        (circuit, id)
    }

    #[test]
    fn update_derives_impedance_and_current_from_the_drop() {
        let (mut circuit, id) = fixed_voltage_consumer(C::new(240.0, 0.0), VCC, VSS);
        let next = circuit.update_one_sweep(id).unwrap();
        assert!(next.is_empty());

        let el = circuit.element(id);
        assert_eq!(el.impedance(), Impedance::Finite(C::new(240.0, 0.0)));
        let i = el.port_parameter(Side::Left, Param::Current);
        assert!((i.re - 1.0).abs() < 1e-12 && i.im == 0.0);
        assert_eq!(el.port_parameter(Side::Right, Param::Current), -i);
    }

    #[test]
    fn zero_power_reads_open_and_draws_nothing() {
        let (mut circuit, id) = fixed_voltage_consumer(C::new(0.0, 0.0), VCC, VSS);
        circuit.update_one_sweep(id).unwrap();
        let el = circuit.element(id);
        assert!(el.impedance().is_open());
        assert_eq!(el.port_parameter(Side::Left, Param::Current), C::zero());
    }

    #[test]
    fn update_waits_until_both_sides_are_known() {
        let mut circuit = Circuit::new();
        let id = circuit.add(ElementKind::Consumer, VCC, VSS);
        circuit.element_mut(id).set_power(C::new(500.0, 0.0));
        circuit.set_port_parameter(id, Side::Left, Param::Voltage, VCC);

        circuit.update_one_sweep(id).unwrap();
        // Right side unknown: the load stays open.
        assert!(circuit.element(id).impedance().is_open());
        assert_eq!(
            circuit.element(id).port_parameter(Side::Left, Param::Current),
            C::zero()
        );
    }

    #[test]
    fn equal_port_voltages_draw_zero_current() {
        let v = C::new(120.0, 0.0);
        let (mut circuit, id) = fixed_voltage_consumer(C::new(500.0, 0.0), v, v);
        circuit.update_one_sweep(id).unwrap();
        let el = circuit.element(id);
        assert_eq!(el.port_parameter(Side::Left, Param::Current), C::zero());
        assert_eq!(el.impedance(), Impedance::Finite(C::zero()));
    }

    #[test]
    fn split_impedance_hinges_at_the_rails() {
        let mut circuit = Circuit::new();
        let id = circuit.add(ElementKind::Consumer, VCC, VSS);
        circuit.element_mut(id).set_power(C::new(480.0, 0.0));
        circuit.set_port_parameter(id, Side::Left, Param::Voltage, C::new(238.0, 0.0));
        circuit.set_port_parameter(id, Side::Right, Param::Voltage, C::new(2.0, 0.0));
        circuit.set_port_parameter(id, Side::Left, Param::Current, C::new(2.0, 0.0));

        // (V_left - vss) / I_left and (vcc - V_right) / I_left.
        assert_eq!(
            circuit.consumer_impedance_looking_out(id, Side::Right),
            Impedance::Finite(C::new(119.0, 0.0))
        );
        assert_eq!(
            circuit.consumer_impedance_looking_out(id, Side::Left),
            Impedance::Finite(C::new(119.0, 0.0))
        );
    }

    #[test]
    fn split_impedance_is_open_without_power_or_current() {
        let mut circuit = Circuit::new();
        let id = circuit.add(ElementKind::Consumer, VCC, VSS);
        // No power commanded.
        assert!(circuit.consumer_impedance_looking_out(id, Side::Right).is_open());
        // Power but no current yet.
        circuit.element_mut(id).set_power(C::new(500.0, 0.0));
        assert!(circuit.consumer_impedance_looking_out(id, Side::Right).is_open());
    }
}

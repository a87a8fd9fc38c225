//! Complex-phasor primitives
//!
//! Everything numeric in the solver is a [`C`] (`Complex64`). A phasor whose
//! real part is `+∞` stands for an open circuit; the comparison against that
//! sentinel is exact, never tolerance-based. [`Impedance`] lifts the sentinel
//! into an explicit tag so that series and parallel reduction cannot leak
//! NaN through sentinel arithmetic.

use crate::C;
use num_traits::{One, Zero};
use std::cmp::Ordering;

/// The open-circuit sentinel, `(+∞, 0)`.
pub const OPEN: C = C::new(f64::INFINITY, 0.0);

/// Whether `z` is the open-circuit sentinel (exact real-part comparison).
#[inline]
pub fn is_open(z: C) -> bool {
    z.re == f64::INFINITY
}

/// Complex division with the solver's open-circuit convention: dividing by an
/// exact zero yields [`OPEN`] instead of NaN components.
#[inline]
pub fn div_or_open(numerator: C, denominator: C) -> C {
    if denominator.re == 0.0 && denominator.im == 0.0 {
        OPEN
    } else {
        numerator / denominator
    }
}

/// An impedance: either a finite phasor or an open circuit.
///
/// The tag is the internal representation; at the slot boundary it converts
/// to and from the `(+∞, 0)` sentinel without loss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Impedance {
    /// A finite complex impedance.
    Finite(C),
    /// An open circuit (infinite impedance).
    Open,
}

impl Impedance {
    /// Classify a phasor, mapping the `+∞` sentinel to [`Impedance::Open`].
    #[inline]
    pub fn from_phasor(z: C) -> Self {
        if is_open(z) {
            Impedance::Open
        } else {
            Impedance::Finite(z)
        }
    }

    /// Lower back to a phasor; `Open` becomes the `(+∞, 0)` sentinel.
    #[inline]
    pub fn into_phasor(self) -> C {
        match self {
            Impedance::Finite(z) => z,
            Impedance::Open => OPEN,
        }
    }

    /// Whether this impedance is an open circuit.
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, Impedance::Open)
    }

    /// Series combination. An open circuit absorbs the sum.
    pub fn series(self, other: Impedance) -> Impedance {
        match (self, other) {
            (Impedance::Finite(a), Impedance::Finite(b)) => Impedance::Finite(a + b),
            _ => Impedance::Open,
        }
    }

    /// Parallel combination `Π Zᵢ / Σ Zᵢ` over all branches.
    ///
    /// Any open branch makes the product infinite and the result open; a
    /// denominator that is exactly zero on both axes is also reported open,
    /// since the complex division would not produce the sentinel on its own.
    pub fn parallel(branches: &[Impedance]) -> Impedance {
        let mut numerator = C::one();
        let mut denominator = C::zero();
        for z in branches {
            match *z {
                Impedance::Open => return Impedance::Open,
                Impedance::Finite(z) => {
                    numerator *= z;
                    denominator += z;
                }
            }
        }
        if numerator.re == f64::INFINITY {
            return Impedance::Open;
        }
        if denominator.re == 0.0 && denominator.im == 0.0 {
            return Impedance::Open;
        }
        Impedance::Finite(numerator / denominator)
    }
}

impl From<C> for Impedance {
    fn from(z: C) -> Self {
        Impedance::from_phasor(z)
    }
}

impl From<Impedance> for C {
    fn from(z: Impedance) -> Self {
        z.into_phasor()
    }
}

// ============================================================================
// Sorting comparators (external reporting only)
// ============================================================================

/// Total order on phasors by magnitude.
#[inline]
pub fn cmp_by_magnitude(a: &C, b: &C) -> Ordering {
    a.norm().total_cmp(&b.norm())
}

/// Total order on phasors by real part.
#[inline]
pub fn cmp_by_real(a: &C, b: &C) -> Ordering {
    a.re.total_cmp(&b.re)
}

/// Total order on phasors by imaginary part.
#[inline]
pub fn cmp_by_imag(a: &C, b: &C) -> Ordering {
    a.im.total_cmp(&b.im)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_sentinel_is_exact() {
        assert!(is_open(OPEN));
        assert!(is_open(C::new(f64::INFINITY, 3.5)));
        assert!(!is_open(C::new(f64::MAX, 0.0)));
        assert!(!is_open(C::new(f64::NEG_INFINITY, 0.0)));
        assert_eq!(OPEN.norm(), f64::INFINITY);
    }

    #[test]
    fn impedance_round_trips_through_phasors() {
        assert_eq!(Impedance::from_phasor(OPEN), Impedance::Open);
        let z = C::new(0.25, -1.0);
        assert_eq!(Impedance::from_phasor(z), Impedance::Finite(z));
        assert_eq!(Impedance::Open.into_phasor(), OPEN);
        assert_eq!(Impedance::Finite(z).into_phasor(), z);
    }

    #[test]
    fn series_absorbs_open() {
        let a = Impedance::Finite(C::new(1.0, 2.0));
        let b = Impedance::Finite(C::new(3.0, -1.0));
        assert_eq!(a.series(b), Impedance::Finite(C::new(4.0, 1.0)));
        assert!(a.series(Impedance::Open).is_open());
        assert!(Impedance::Open.series(b).is_open());
    }

    #[test]
    fn parallel_of_equal_resistances_halves() {
        let z = Impedance::Finite(C::new(10.0, 0.0));
        let combined = Impedance::parallel(&[z, z]);
        assert_eq!(combined, Impedance::Finite(C::new(5.0, 0.0)));
    }

    #[test]
    fn parallel_special_cases_yield_open() {
        let z = Impedance::Finite(C::new(10.0, 0.0));
        assert!(Impedance::parallel(&[z, Impedance::Open]).is_open());
        // Σ = 0 exactly: +10 and -10 in parallel.
        let neg = Impedance::Finite(C::new(-10.0, 0.0));
        assert!(Impedance::parallel(&[z, neg]).is_open());
        // No branches at all behaves as a dead end.
        assert!(Impedance::parallel(&[]).is_open());
    }

    #[test]
    fn div_or_open_guards_zero_denominator() {
        let v = C::new(230.0, 0.0);
        assert_eq!(div_or_open(v, C::new(0.0, 0.0)), OPEN);
        assert_eq!(div_or_open(v, C::new(2.0, 0.0)), C::new(115.0, 0.0));
    }

    #[test]
    fn comparators_sort_as_documented() {
        let mut v = vec![C::new(3.0, 4.0), C::new(1.0, 0.0), C::new(0.0, -2.0)];
        v.sort_by(cmp_by_magnitude);
        assert_eq!(v[0], C::new(1.0, 0.0));
        assert_eq!(v[2], C::new(3.0, 4.0));

        v.sort_by(cmp_by_real);
        assert_eq!(v[0], C::new(0.0, -2.0));

        v.sort_by(cmp_by_imag);
        assert_eq!(v[0], C::new(0.0, -2.0));
        assert_eq!(v[2], C::new(3.0, 4.0));
    }
}

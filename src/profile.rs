//! Household power-profile collaborator interface
//!
//! Time-series ingestion lives outside this crate; what the solver needs is
//! only the shape of the data: a houses × samples matrix of real-valued
//! watts with checked access, and a way to place a window of it onto an
//! evaluator. The 22-week Irish CER set stores kWh per half-hour sample, so
//! [`PowerProfiles::from_metered`] takes the multiplier that turns the raw
//! readings into watts (2000 for that set).

use crate::evaluator::{Evaluator, SolveError};

/// Errors raised by profile access.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// A house or sample index fell outside the matrix.
    #[error("house <{house}> / sample <{sample}> outside the {houses}x{samples} profile matrix")]
    OutOfBounds {
        /// Requested house row.
        house: usize,
        /// Requested time sample.
        sample: usize,
        /// Houses available.
        houses: usize,
        /// Samples available per house.
        samples: usize,
    },
    /// Applying a sample to the evaluator failed.
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// An in-memory houses × samples matrix of household powers, in watts.
#[derive(Clone, Debug, Default)]
pub struct PowerProfiles {
    rows: Vec<Vec<f64>>,
}

impl PowerProfiles {
    /// Wrap a house-major matrix of watt values.
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Wrap a house-major matrix of metered readings, scaling each into
    /// watts (e.g. 2000 for kWh per half-hour samples).
    pub fn from_metered(rows: Vec<Vec<f64>>, scale: f64) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|raw| raw * scale).collect())
                .collect(),
        }
    }

    /// Number of houses (matrix rows).
    pub fn houses(&self) -> usize {
        self.rows.len()
    }

    /// Number of samples per house (length of the first row).
    pub fn samples(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// The power of `house` at time `sample`, bounds-checked.
    pub fn sample(&self, house: usize, sample: usize) -> Result<f64, ProfileError> {
        let houses = self.houses();
        let samples = self.samples();
        if house >= houses || sample >= samples {
            return Err(ProfileError::OutOfBounds {
                house,
                sample,
                houses,
                samples,
            });
        }
        Ok(self.rows[house][sample])
    }

    /// Apply one time sample of `house_count` consecutive houses, starting
    /// at `start_house`, as inductive loads round-robin across the
    /// evaluator's phases with a common power factor. The bounds are
    /// checked up front so a failing window leaves the evaluator untouched.
    pub fn apply(
        &self,
        evaluator: &mut Evaluator,
        start_house: usize,
        house_count: usize,
        sample: usize,
        power_factor: f64,
    ) -> Result<(), ProfileError> {
        if sample >= self.samples() || start_house + house_count > self.houses() {
            return Err(ProfileError::OutOfBounds {
                house: start_house + house_count.saturating_sub(1),
                sample,
                houses: self.houses(),
                samples: self.samples(),
            });
        }
        let phases = evaluator.phases();
        for i in 0..house_count {
            let watts = self.sample(start_house + i, sample)?;
            evaluator.add_power_factored(watts, power_factor, true, i % phases + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::feeder_rows;
    use crate::C;
    use anyhow::Result;

    fn profiles() -> PowerProfiles {
        PowerProfiles::new(vec![
            vec![300.0, 450.0, 600.0],
            vec![150.0, 900.0, 750.0],
            vec![500.0, 200.0, 100.0],
        ])
    }

    #[test]
    fn dimensions_and_samples() {
        let p = profiles();
        assert_eq!(p.houses(), 3);
        assert_eq!(p.samples(), 3);
        assert_eq!(p.sample(1, 2).unwrap(), 750.0);
        assert_eq!(PowerProfiles::default().samples(), 0);
    }

    #[test]
    fn metered_readings_scale_into_watts() {
        let p = PowerProfiles::from_metered(vec![vec![0.25, 0.5]], 2000.0);
        assert_eq!(p.sample(0, 0).unwrap(), 500.0);
        assert_eq!(p.sample(0, 1).unwrap(), 1000.0);
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let p = profiles();
        assert!(matches!(
            p.sample(3, 0),
            Err(ProfileError::OutOfBounds { house: 3, .. })
        ));
        assert!(matches!(
            p.sample(0, 3),
            Err(ProfileError::OutOfBounds { sample: 3, .. })
        ));
    }

    #[test]
    fn apply_places_houses_round_robin() -> Result<()> {
        let mut ev = Evaluator::new(2, C::new(240.0, 0.0), C::new(0.0, 0.0))?;
        profiles().apply(&mut ev, 0, 3, 1, 1.0)?;
        // Houses 0..3 at sample 1, phases 1, 2, 1.
        ev.add_feeder_impedance(C::new(0.01, 0.0), 1)?;
        ev.add_feeder_impedance(C::new(0.01, 0.0), 1)?;
        ev.add_feeder_impedance(C::new(0.01, 0.0), 2)?;
        for _ in 0..3 {
            ev.add_return_impedance(C::new(0.01, 0.0));
        }
        ev.start()?;

        let powers: Vec<(String, C)> = ev
            .circuit()
            .elements()
            .filter(|e| e.kind().is_load())
            .map(|e| (e.name(), e.power()))
            .collect();
        // Phase 1 holds houses 0 and 2, phase 2 holds house 1.
        assert_eq!(powers.len(), 3);
        assert_eq!(powers[0].1, C::new(450.0, 0.0));
        assert_eq!(powers[1].1, C::new(200.0, 0.0));
        assert_eq!(powers[2].1, C::new(900.0, 0.0));
        assert_eq!(feeder_rows(ev.circuit()).len(), 3);
        Ok(())
    }

    #[test]
    fn apply_rejects_windows_off_the_matrix() -> Result<()> {
        let mut ev = Evaluator::new(1, C::new(240.0, 0.0), C::new(0.0, 0.0))?;
        let p = profiles();
        assert!(p.apply(&mut ev, 2, 2, 0, 1.0).is_err());
        assert!(p.apply(&mut ev, 0, 2, 5, 1.0).is_err());
        // The failed windows queued nothing.
        assert!(matches!(ev.start(), Err(SolveError::MissingBoundary)));
        Ok(())
    }
}

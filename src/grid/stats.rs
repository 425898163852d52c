// Copyright 2023-2024 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Grid statistics and self-validation against an exact solver.

use super::StaeckelGrid;
use crate::actions::{ActionSolver, PhasePoint};
use crate::potential::AxisymmetricPotential;
use crate::staeckel::{
    energy_remap, inverse_energy_remap, turning_point, velocity_at_turning_point,
};
use crate::{Error, Result};
use std::f64::consts::FRAC_PI_2;

/// Statistics about an action grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStats {
    pub n_lz: usize,
    pub n_e: usize,
    pub n_psi: usize,
    pub lz_min: f64,
    pub lz_max: f64,
    /// Focal distance
    pub delta: f64,
    pub r_max: f64,
    /// Size of the tabulated and prefiltered arrays
    pub memory_bytes: usize,
}

/// Results from validating a grid against an exact solver.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub max_radial_error: f64,
    pub max_vertical_error: f64,
    pub worst_point_radial: PhasePoint,
    pub worst_point_vertical: PhasePoint,
    /// Number of points compared
    pub n_tested: usize,
}

/// Relative error when the exact value is significant, absolute error near zero
fn error(approx: f64, exact: f64) -> f64 {
    if exact.abs() > 0.01 {
        ((approx - exact) / exact).abs()
    } else {
        (approx - exact).abs()
    }
}

impl<P: AxisymmetricPotential> StaeckelGrid<P> {
    /// Get grid statistics for debugging.
    pub fn stats(&self) -> GridStats {
        let f64_size = std::mem::size_of::<f64>();
        let volume = 4 * self.jr.len();
        let planes = 2 * self.turning_points.len();
        let lines = 5 * self.lz.len() + self.energy_fractions.len();
        GridStats {
            n_lz: self.config.n_lz,
            n_e: self.config.n_e,
            n_psi: self.config.n_psi,
            lz_min: self.lz_min,
            lz_max: self.lz_max,
            delta: self.delta,
            r_max: self.config.r_max,
            memory_bytes: (volume + planes + lines) * f64_size,
        }
    }

    /// Validate the interpolated actions against `solver`.
    ///
    /// Launches `n_test` orbits from turning points that lie between the
    /// grid nodes in all three dimensions and compares interpolated to exact
    /// actions. Launches with no kinetic energy are skipped.
    pub fn validate<S: ActionSolver + ?Sized>(
        &self,
        solver: &S,
        n_test: usize,
    ) -> Result<ValidationResult> {
        let mut result = ValidationResult {
            max_radial_error: 0.0,
            max_vertical_error: 0.0,
            worst_point_radial: PhasePoint::default(),
            worst_point_vertical: PhasePoint::default(),
            n_tested: 0,
        };

        for i in 0..n_test {
            // offsets avoid grid alignment
            let t = (i as f64 + 0.37) / n_test as f64;
            let y = (0.618_033_988_749_895 * (i as f64 + 1.0)).fract();
            let psi = FRAC_PI_2 * (0.414_213_562_373_095 * (i as f64 + 1.0)).fract();

            let lz = self.lz_min + t * (self.lz_max - self.lz_min);
            let f_low = energy_remap(self.reference_energy(lz));
            let f_high = energy_remap(self.circular_energy(lz));
            let energy = inverse_energy_remap(f_low + y * (f_high - f_low));
            let u0 = turning_point(&self.potential, self.delta, energy, lz)?;
            let r = self.delta * u0.sinh();
            let v = velocity_at_turning_point(&self.potential, self.delta, energy, lz, u0);
            if !(v > 0.0) {
                continue;
            }
            let point = PhasePoint::new(r, v * psi.cos(), lz / r, 0.0, v * psi.sin());

            let actions = self.actions(&point)?;
            let jr = solver.radial_action(&point).map_err(Error::from_solver)?;
            let jz = solver.vertical_action(&point).map_err(Error::from_solver)?;
            result.n_tested += 1;

            let jr_error = error(actions.jr, jr);
            if jr_error > result.max_radial_error {
                result.max_radial_error = jr_error;
                result.worst_point_radial = point;
            }
            let jz_error = error(actions.jz, jz);
            if jz_error > result.max_vertical_error {
                result.max_vertical_error = jz_error;
                result.worst_point_vertical = point;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::isochrone_grid;

    #[test]
    fn test_stats() {
        let grid = isochrone_grid(6);
        let stats = grid.stats();
        assert_eq!((stats.n_lz, stats.n_e, stats.n_psi), (6, 6, 6));
        assert_eq!(stats.lz_min, 0.01);
        assert_eq!(stats.lz_max, grid.lz_range().1);
        assert_eq!(stats.delta, 0.05);
        assert_eq!(stats.r_max, 5.0);
        assert_eq!(stats.memory_bytes, (4 * 216 + 2 * 36 + 5 * 6 + 6) * 8);
    }

    #[test]
    fn test_validate() {
        let grid = isochrone_grid(25);
        let iso = *grid.potential();
        let result = grid.validate(&iso, 50).unwrap();
        assert!(result.n_tested > 40);
        // the steep rows next to E_a dominate the error, ~20 % for J_R
        assert!(
            result.max_radial_error < 0.5,
            "radial error {} at {:?}",
            result.max_radial_error,
            result.worst_point_radial
        );
        assert!(
            result.max_vertical_error < 0.5,
            "vertical error {} at {:?}",
            result.max_vertical_error,
            result.worst_point_vertical
        );
    }
}

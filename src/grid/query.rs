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

//! Interpolated actions for arbitrary phase-space points.

use super::{StaeckelGrid, ACTION_FLOOR};
use crate::actions::{Actions, OrbitState, PhasePoint};
use crate::potential::AxisymmetricPotential;
use crate::staeckel::{energy_remap, radial_energy, velocity_squared_at_turning_point};
use crate::{Error, Result};
use itertools::izip;
use std::f64::consts::FRAC_PI_2;

/// Energy fractions this far outside [0, 1] are snapped onto the grid edge
const ENERGY_TOLERANCE: f64 = 1e-2;
/// cos²ψ this far above one is a rounding error
const ANGLE_TOLERANCE: f64 = 1e-5;

impl<P: AxisymmetricPotential> StaeckelGrid<P> {
    /// Actions $(J_R, L_z, J_z)$ of a single orbit.
    ///
    /// Accepts anything implementing [`OrbitState`], including [`PhasePoint`]
    /// which converts from `[R, vR, vT, z, vz]` and `[R, vR, vT, z, vz, phi]`.
    /// Points outside the tabulated range of $L_z$ or energy fail with
    /// [`Error::OutsideGrid`].
    pub fn actions(&self, orbit: &impl OrbitState) -> Result<Actions> {
        let (r, z) = (orbit.r(), orbit.z());
        let lz = orbit.angular_momentum();
        let mut energy = self.potential.potential(r, z)
            + 0.5 * (orbit.vr().powi(2) + orbit.vt().powi(2) + orbit.vz().powi(2));

        let e_circular = self.circular_energy(lz);
        let e_reference = self.reference_energy(lz);
        let fraction = (energy - e_reference) / (e_circular - e_reference);

        let outside = lz < self.lz_min
            || lz > self.lz_max
            || !(-ENERGY_TOLERANCE..=1.0 + ENERGY_TOLERANCE).contains(&fraction);
        if outside {
            if self.config.report_outside_grid {
                log::warn!(
                    "outside of grid: Lz = {}, energy fraction = {} (R = {}, z = {})",
                    lz,
                    fraction,
                    r,
                    z
                );
            }
            return Err(Error::OutsideGrid {
                lz,
                energy_fraction: fraction,
            });
        }
        if fraction > 1.0 {
            energy = e_circular;
        } else if fraction < 0.0 {
            energy = e_reference;
        }

        let f_reference = energy_remap(e_reference);
        let y = (energy_remap(energy) - f_reference) / (energy_remap(e_circular) - f_reference);
        let u0 = self.log_turning_point_spline.eval(lz, y)?.exp();
        let er = radial_energy(&self.potential, self.delta, orbit, energy, lz, u0);
        let v2 = velocity_squared_at_turning_point(&self.potential, self.delta, energy, lz, u0);
        let psi = launch_angle(2.0 * er / (v2 * (1.0 + u0.sinh().powi(2))));

        let coords = [
            self.lz_coordinate(lz),
            y * (self.config.n_e - 1) as f64,
            psi / FRAC_PI_2 * (self.config.n_psi - 1) as f64,
        ];
        let jr = self.jr_coefficients.eval(coords)
            * (self.jr_max_spline.eval(lz).exp() - ACTION_FLOOR);
        let jz = self.jz_coefficients.eval(coords)
            * (self.jz_max_spline.eval(lz).exp() - ACTION_FLOOR);
        Ok(Actions { jr, lz, jz })
    }

    /// Actions for equal-length sequences of R, v_R, v_T, z, v_z.
    ///
    /// Identical to calling [`StaeckelGrid::actions`] point by point; the
    /// first point outside the grid fails the whole batch.
    pub fn actions_batch(
        &self,
        r: &[f64],
        vr: &[f64],
        vt: &[f64],
        z: &[f64],
        vz: &[f64],
    ) -> Result<Vec<Actions>> {
        let expected = r.len();
        if let Some(found) = [vr.len(), vt.len(), z.len(), vz.len()]
            .into_iter()
            .find(|&n| n != expected)
        {
            return Err(Error::LengthMismatch { expected, found });
        }
        izip!(r, vr, vt, z, vz)
            .map(|(&r, &vr, &vt, &z, &vz)| self.actions(&PhasePoint::new(r, vr, vt, z, vz)))
            .collect()
    }

    /// Actions for a slice of orbits
    pub fn actions_many<O: OrbitState>(&self, orbits: &[O]) -> Result<Vec<Actions>> {
        orbits.iter().map(|orbit| self.actions(orbit)).collect()
    }

    /// Vertical action alone, interpolated on a (R, E_z) grid.
    ///
    /// This grid is never tabulated, so the call always fails with
    /// [`Error::NotImplemented`]. Use [`StaeckelGrid::actions`] instead.
    pub fn vertical_action(&self, _orbit: &impl OrbitState) -> Result<f64> {
        Err(Error::NotImplemented("vertical action from an (R, Ez) grid"))
    }

    /// Fractional grid index of `lz`
    fn lz_coordinate(&self, lz: f64) -> f64 {
        if self.config.n_lz == 1 {
            return 0.0;
        }
        (lz - self.lz_min) / (self.lz_max - self.lz_min) * (self.config.n_lz - 1) as f64
    }
}

/// Launch angle ψ = arccos(√cos²ψ), with cos²ψ forced into [0, 1]
fn launch_angle(cos2psi: f64) -> f64 {
    let cos2psi = if !cos2psi.is_finite() {
        // v² = 0 at the turning point, so there is no angle to resolve
        log::debug!("non-finite cos²ψ = {}; using ψ = 0", cos2psi);
        1.0
    } else if cos2psi > 1.0 {
        if cos2psi > 1.0 + ANGLE_TOLERANCE {
            log::debug!("cos²ψ = {} exceeds one", cos2psi);
        }
        1.0
    } else if cos2psi < 0.0 {
        log::debug!("cos²ψ = {} is negative", cos2psi);
        0.0
    } else {
        cos2psi
    };
    cos2psi.sqrt().acos()
}

#[cfg(test)]
mod tests {
    use super::super::tests::isochrone_grid;
    use super::*;
    use crate::potential::Isochrone;
    use crate::ActionSolver;
    use approx::assert_relative_eq;

    #[test]
    fn test_launch_angle() {
        assert_eq!(launch_angle(1.0), 0.0);
        assert_eq!(launch_angle(1.0 + 1e-6), 0.0);
        assert_eq!(launch_angle(1.2), 0.0);
        assert_eq!(launch_angle(f64::INFINITY), 0.0);
        assert_eq!(launch_angle(f64::NAN), 0.0);
        assert_relative_eq!(launch_angle(0.0), FRAC_PI_2);
        assert_relative_eq!(launch_angle(-0.1), FRAC_PI_2);
        assert_relative_eq!(launch_angle(0.5), FRAC_PI_2 / 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_circular_orbit() {
        let grid = isochrone_grid(25);
        let iso = *grid.potential();
        for &r in &[0.5, 1.0, 2.0] {
            let vc = iso.circular_velocity(r);
            let actions = grid.actions(&PhasePoint::new(r, 0.0, vc, 0.0, 0.0)).unwrap();
            assert_eq!(actions.lz, r * vc);
            assert!(actions.jr.abs() < 1e-2, "jr = {}", actions.jr);
            assert!(actions.jz.abs() < 1e-2, "jz = {}", actions.jz);
        }
    }

    #[test]
    fn test_matches_exact_actions() {
        let grid = isochrone_grid(25);
        let iso = *grid.potential();
        for point in [
            PhasePoint::new(1.0, 0.35, 0.3, 0.2, 0.3),
            PhasePoint::new(2.0, -0.2, 0.5, -0.3, 0.25),
            PhasePoint::new(0.6, 0.35, 0.25, 0.1, -0.2),
        ] {
            let actions = grid.actions(&point).unwrap();
            assert_relative_eq!(
                actions.jr,
                iso.radial_action(&point).unwrap(),
                max_relative = 0.05
            );
            assert_relative_eq!(
                actions.jz,
                iso.vertical_action(&point).unwrap(),
                max_relative = 0.05
            );
        }
    }

    #[test]
    fn test_input_forms_agree() {
        let grid = isochrone_grid(10);
        let five = grid.actions(&PhasePoint::from([1.0, 0.1, 0.3, 0.1, 0.15])).unwrap();
        let six = grid
            .actions(&PhasePoint::from([1.0, 0.1, 0.3, 0.1, 0.15, 2.3]))
            .unwrap();
        let tuple = grid.actions(&PhasePoint::from((1.0, 0.1, 0.3, 0.1, 0.15))).unwrap();
        assert_eq!(five, six);
        assert_eq!(five, tuple);
    }

    #[test]
    fn test_batch_equals_scalar() {
        let grid = isochrone_grid(10);
        let r = [0.5, 1.0, 1.5, 2.0];
        let vr = [0.15, 0.1, -0.2, 0.15];
        let vt = [0.2, 0.3, 0.35, 0.4];
        let z = [0.0, 0.1, -0.2, 0.3];
        let vz = [0.1, 0.15, 0.0, -0.05];
        let batch = grid.actions_batch(&r, &vr, &vt, &z, &vz).unwrap();
        assert_eq!(batch.len(), 4);
        let points: Vec<PhasePoint> = izip!(r, vr, vt, z, vz).map(PhasePoint::from).collect();
        for (point, actions) in points.iter().zip(&batch) {
            assert_eq!(grid.actions(point).unwrap(), *actions);
        }
        assert_eq!(grid.actions_many(&points).unwrap(), batch);
    }

    #[test]
    fn test_batch_length_mismatch() {
        let grid = isochrone_grid(5);
        let err = grid
            .actions_batch(&[1.0, 2.0], &[0.0, 0.0], &[0.3], &[0.0, 0.0], &[0.0, 0.0])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_outside_grid() {
        let grid = isochrone_grid(10);
        // Lz below the grid
        let err = grid
            .actions(&PhasePoint::new(1.0, 0.1, 0.001, 0.0, 0.1))
            .unwrap_err();
        assert!(matches!(err, Error::OutsideGrid { .. }));
        // Lz above the grid
        let err = grid
            .actions(&PhasePoint::new(1.0, 0.0, 3.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::OutsideGrid { .. }));
        // energy above the reference energy
        let err = grid
            .actions(&PhasePoint::new(1.0, 1.0, 0.3, 0.0, 0.0))
            .unwrap_err();
        match err {
            Error::OutsideGrid {
                lz,
                energy_fraction,
            } => {
                assert_relative_eq!(lz, 0.3);
                assert!(energy_fraction < -ENERGY_TOLERANCE);
            }
            _ => panic!("expected OutsideGrid, got {err:?}"),
        }
        // a failing point fails the whole batch
        assert!(grid
            .actions_batch(&[1.0, 1.0], &[0.1, 0.1], &[0.3, 0.001], &[0.0, 0.0], &[0.1, 0.1])
            .is_err());
    }

    #[test]
    fn test_energy_band_clamps_to_reference_energy() {
        use crate::staeckel::velocity_at_turning_point;
        let grid = isochrone_grid(10);
        let iso = *grid.potential();
        let i = 4;
        let lz = grid.lz_axis()[i];
        let (e_c, e_a) = (grid.circular_energies()[i], grid.reference_energies()[i]);

        // radial launch from the turning point of the E_a orbit
        let u0 = grid.turning_points()[[i, 0]];
        let r = grid.delta() * u0.sinh();
        let vt = lz / r;
        let v = velocity_at_turning_point(&iso, grid.delta(), e_a, lz, u0);
        let at_edge = grid.actions(&PhasePoint::new(r, v, vt, 0.0, 0.0)).unwrap();

        // same launch with a little more radial energy, t < 0
        let launch = |t: f64| {
            let energy = e_a + t * (e_c - e_a);
            let vr = (2.0 * (energy - iso.potential(r, 0.0)) - vt * vt).sqrt();
            PhasePoint::new(r, vr, vt, 0.0, 0.0)
        };
        let inside = grid.actions(&launch(-0.005)).unwrap();
        assert_relative_eq!(inside.jr, at_edge.jr, max_relative = 1e-6);
        assert_relative_eq!(inside.jz, at_edge.jz, epsilon = 1e-9, max_relative = 1e-6);

        match grid.actions(&launch(-0.02)) {
            Err(Error::OutsideGrid {
                energy_fraction, ..
            }) => assert_relative_eq!(energy_fraction, -0.02, max_relative = 1e-6),
            other => panic!("expected OutsideGrid, got {other:?}"),
        }
    }

    #[test]
    fn test_report_outside_grid_flag() {
        let iso = Isochrone::new(1.0, 1.0);
        let grid = StaeckelGrid::builder()
            .potential(iso)
            .config(
                crate::GridConfig::default()
                    .with_delta(0.05)
                    .with_resolution(5, 5, 5)
                    .with_report_outside_grid(true),
            )
            .build(&iso)
            .unwrap();
        assert!(grid.config().report_outside_grid);
        assert!(grid
            .actions(&PhasePoint::new(1.0, 0.0, 3.0, 0.0, 0.0))
            .is_err());
    }

    #[test]
    fn test_vertical_action_not_implemented() {
        let grid = isochrone_grid(5);
        let err = grid
            .vertical_action(&PhasePoint::new(1.0, 0.1, 0.3, 0.1, 0.1))
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }
}

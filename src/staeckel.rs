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

//! # Staeckel approximation
//!
//! Quantities of an orbit in the [Binney (2012)](https://doi.org/10.1111/j.1365-2966.2012.21757.x)
//! Staeckel approximation, all evaluated on the midplane slice $v = π/2$ of the
//! prolate spheroidal coordinates with focus Δ:
//!
//! - the turning point $u_0$ where the effective potential in $u$ is minimal,
//! - the speed $v$ an orbit of energy $E$ has at $u_0$ in the midplane,
//! - the "radial energy" $E_r$ carried by the motion in $u$.
//!
//! Here $Φ_\mathrm{eff}(u) = Φ(Δ \sinh u, 0)$ is given by
//! [`AxisymmetricPotential::staeckel_potential`].

use crate::coords::rz_to_uv;
use crate::optimize::{minimize, BrentConfig};
use crate::{AxisymmetricPotential, OrbitState, Result};
use num::Float;
use std::f64::consts::FRAC_PI_2;

/// Squared velocities this far below zero are rounding errors
const ROUNDING_TOLERANCE: f64 = 1e-7;

/// Monotonically decreasing map used to space energies on the grid, f(E) = exp(-E)
#[inline]
pub fn energy_remap<T: Float>(energy: T) -> T {
    (-energy).exp()
}

/// Exact inverse of [`energy_remap`], f⁻¹(x) = -ln(x)
#[inline]
pub fn inverse_energy_remap<T: Float>(remapped: T) -> T {
    -remapped.ln()
}

#[inline]
fn effective_potential<P>(potential: &P, u: f64, delta: f64) -> f64
where
    P: AxisymmetricPotential + ?Sized,
{
    potential.staeckel_potential(u, FRAC_PI_2, delta)
}

/// Turning point u₀ of an orbit with energy `energy` and angular momentum `lz`.
///
/// Minimizes
/// $$ g(u) = -\left(E \sinh^2 u - \cosh^2 u\, Φ_\mathrm{eff}(u) - \frac{L_z^2}{2Δ^2 \sinh^2 u}\right) $$
/// over $\ln u$ with Brent's method.
pub fn turning_point<P>(potential: &P, delta: f64, energy: f64, lz: f64) -> Result<f64>
where
    P: AxisymmetricPotential + ?Sized,
{
    let half_lz2 = 0.5 * lz * lz;
    let delta2 = delta * delta;
    let objective = |log_u: f64| {
        let u = log_u.exp();
        let sinh2 = u.sinh().powi(2);
        let cosh2 = u.cosh().powi(2);
        let du = cosh2 * effective_potential(potential, u, delta);
        -(energy * sinh2 - du - half_lz2 / delta2 / sinh2)
    };
    let log_u0 = minimize(objective, &BrentConfig::default())?;
    Ok(log_u0.exp())
}

/// Squared speed in the midplane at the turning point,
/// $v^2 = 2(E - Φ_\mathrm{eff}(u_0)) - L_z^2/R^2$ with $R = Δ \sinh u_0$.
pub fn velocity_squared_at_turning_point<P>(
    potential: &P,
    delta: f64,
    energy: f64,
    lz: f64,
    u0: f64,
) -> f64
where
    P: AxisymmetricPotential + ?Sized,
{
    let r = delta * u0.sinh();
    2.0 * (energy - effective_potential(potential, u0, delta)) - lz * lz / (r * r)
}

/// Speed in the midplane at the turning point.
///
/// Slightly negative squares (above -1e-7) are rounded to zero. Anything more
/// negative means `(energy, lz)` is not an admissible orbit and yields NaN.
pub fn velocity_at_turning_point<P>(
    potential: &P,
    delta: f64,
    energy: f64,
    lz: f64,
    u0: f64,
) -> f64
where
    P: AxisymmetricPotential + ?Sized,
{
    speed(velocity_squared_at_turning_point(
        potential, delta, energy, lz, u0,
    ))
}

#[inline]
pub(crate) fn speed(v2: f64) -> f64 {
    if v2 < 0.0 && v2 > -ROUNDING_TOLERANCE {
        0.0
    } else {
        v2.sqrt()
    }
}

/// Energy in the $u$ degree of freedom, measured from the turning point u₀.
///
/// $$
/// E_r = \frac{p_u^2}{2} + \frac{L_z^2}{2Δ^2}\left(\frac{1}{\sinh^2 u} - \frac{1}{\sinh^2 u_0}\right)
///   - E(\sinh^2 u - \sinh^2 u_0) + (\sinh^2 u + 1)Φ_\mathrm{eff}(u) - (\sinh^2 u_0 + 1)Φ_\mathrm{eff}(u_0)
/// $$
///
/// where $p_u = v_R \cosh u \sin v + v_z \sinh u \cos v$ is the momentum
/// conjugate to $u$ divided by Δ.
pub fn radial_energy<P>(
    potential: &P,
    delta: f64,
    point: &impl OrbitState,
    energy: f64,
    lz: f64,
    u0: f64,
) -> f64
where
    P: AxisymmetricPotential + ?Sized,
{
    let sinh2_u0 = u0.sinh().powi(2);
    let (u, v) = rz_to_uv(point.r(), point.z(), delta);
    let pu = point.vr() * u.cosh() * v.sin() + point.vz() * u.sinh() * v.cos();
    let sinh2_u = u.sinh().powi(2);
    0.5 * pu * pu + 0.5 * lz * lz / (delta * delta) * (1.0 / sinh2_u - 1.0 / sinh2_u0)
        - energy * (sinh2_u - sinh2_u0)
        + (sinh2_u + 1.0) * effective_potential(potential, u, delta)
        - (sinh2_u0 + 1.0) * effective_potential(potential, u0, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potential::{Isochrone, MiyamotoNagai};
    use crate::PhasePoint;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_remap_inverse() {
        for &e in &[-3.0, -1.2, -0.5, -0.01, 0.0, 0.3, 2.0] {
            assert_relative_eq!(
                inverse_energy_remap(energy_remap(e)),
                e,
                epsilon = 1e-15,
                max_relative = 1e-12
            );
        }
        assert_relative_eq!(inverse_energy_remap(energy_remap(-0.25f32)), -0.25f32);
        // decreasing
        assert!(energy_remap(-1.0) > energy_remap(-0.5));
    }

    #[test]
    fn test_speed_rounding() {
        assert_eq!(speed(4.0), 2.0);
        assert_eq!(speed(0.0), 0.0);
        assert_eq!(speed(-1e-9), 0.0);
        assert!(speed(-1e-3).is_nan());
    }

    #[test]
    fn test_turning_point_of_circular_orbit_in_spherical_limit() {
        // for a small focus the prolate coordinates become spherical and the
        // turning point of a circular orbit is its guiding radius
        let iso = Isochrone::new(1.0, 1.0);
        let delta = 1e-3;
        for &rl in &[0.5, 1.0, 2.5] {
            let lz = rl * iso.circular_velocity(rl);
            let energy = iso.potential(rl, 0.0) + 0.5 * lz * lz / (rl * rl);
            let u0 = turning_point(&iso, delta, energy, lz).unwrap();
            assert_relative_eq!(delta * u0.sinh(), rl, max_relative = 1e-4);
            let v2 = velocity_squared_at_turning_point(&iso, delta, energy, lz, u0);
            assert!(v2.abs() < 1e-6);
        }
    }

    #[test]
    fn test_turning_point_is_minimum() {
        let disk = MiyamotoNagai::new(1.0, 1.0, 0.2);
        let (delta, lz) = (0.4, 0.3);
        let energy = -0.4;
        let u0 = turning_point(&disk, delta, energy, lz).unwrap();
        assert!(u0 > 0.0);
        let g = |u: f64| {
            let sinh2 = u.sinh().powi(2);
            -(energy * sinh2
                - u.cosh().powi(2) * disk.staeckel_potential(u, FRAC_PI_2, delta)
                - 0.5 * lz * lz / (delta * delta) / sinh2)
        };
        assert!(g(u0) <= g(u0 * 1.01));
        assert!(g(u0) <= g(u0 * 0.99));
    }

    #[test]
    fn test_radial_energy_recovers_launch_angle() {
        // a point launched from the turning point at angle psi carries
        // E_r = v² cos²psi cosh²u₀ / 2
        let iso = Isochrone::new(1.0, 1.0);
        let (delta, lz) = (0.5, 0.2);
        let rl = iso.guiding_radius(lz).unwrap();
        let energy = iso.potential(rl, 0.0) + 0.5 * lz * lz / (rl * rl) + 0.1;
        let u0 = turning_point(&iso, delta, energy, lz).unwrap();
        let r = delta * u0.sinh();
        let v2 = velocity_squared_at_turning_point(&iso, delta, energy, lz, u0);
        assert!(v2 > 0.0);
        let v = velocity_at_turning_point(&iso, delta, energy, lz, u0);
        for &psi in &[0.0, 0.4, 1.0, FRAC_PI_2] {
            let point = PhasePoint::new(r, v * f64::cos(psi), lz / r, 0.0, v * f64::sin(psi));
            let er = radial_energy(&iso, delta, &point, energy, lz, u0);
            let cos2psi = 2.0 * er / (v2 * (1.0 + u0.sinh().powi(2)));
            assert_relative_eq!(cos2psi, psi.cos().powi(2), epsilon = 1e-8);
        }
    }
}

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

//! ## Axisymmetric potentials
//!
//! Gravitational potentials $Φ(R, z)$ that are symmetric about the $z$ axis,
//! together with the derived quantities needed to tabulate actions.

use crate::coords::uv_to_rz;
use crate::optimize::bisect;
use crate::Result;
use dyn_clone::DynClone;
use std::fmt::Debug;

mod isochrone;
mod miyamoto_nagai;
pub use self::isochrone::Isochrone;
pub use self::miyamoto_nagai::MiyamotoNagai;

/// Search interval for the guiding radius root, [R_min, R_max]
const GUIDING_RADIUS_BRACKET: (f64, f64) = (1e-7, 1000.0);

/// Gravitational potential of an axisymmetric mass distribution
pub trait AxisymmetricPotential: Debug + DynClone + Send + Sync {
    /// Potential at cylindrical radius `r` and height `z`, Φ(R, z)
    fn potential(&self, r: f64, z: f64) -> f64;

    /// Radial force per unit mass, F_R = -∂Φ/∂R
    ///
    /// The default implementation uses a central difference and should be
    /// overridden with the exact analytical expression for better speed
    /// and accuracy.
    fn radial_force(&self, r: f64, z: f64) -> f64 {
        const EPS: f64 = 1e-6;
        let h = EPS * r.abs().max(1.0);
        -(self.potential(r + h, z) - self.potential(r - h, z)) / (2.0 * h)
    }

    /// Circular velocity in the midplane, v_c(R) = √(R ∂Φ/∂R)
    fn circular_velocity(&self, r: f64) -> f64 {
        (-r * self.radial_force(r, 0.0)).max(0.0).sqrt()
    }

    /// Radius of the circular orbit with angular momentum `lz`, i.e. R v_c(R) = L_z
    fn guiding_radius(&self, lz: f64) -> Result<f64> {
        let (lower, upper) = GUIDING_RADIUS_BRACKET;
        bisect(
            |r| r * self.circular_velocity(r) - lz,
            lower,
            upper,
            1e-14,
            200,
        )
    }

    /// Potential expressed in prolate spheroidal coordinates with focus `delta`
    fn staeckel_potential(&self, u: f64, v: f64, delta: f64) -> f64 {
        let (r, z) = uv_to_rz(u, v, delta);
        self.potential(r, z)
    }
}

dyn_clone::clone_trait_object!(AxisymmetricPotential);

/// Sum of two potentials
#[derive(Clone, Debug, PartialEq)]
pub struct Combined<T, U>(T, U);

impl<T: AxisymmetricPotential + Clone, U: AxisymmetricPotential + Clone> Combined<T, U> {
    pub fn new(t: T, u: U) -> Self {
        Self(t, u)
    }
}

impl<T, U> AxisymmetricPotential for Combined<T, U>
where
    T: AxisymmetricPotential + Clone,
    U: AxisymmetricPotential + Clone,
{
    #[inline]
    fn potential(&self, r: f64, z: f64) -> f64 {
        self.0.potential(r, z) + self.1.potential(r, z)
    }
    #[inline]
    fn radial_force(&self, r: f64, z: f64) -> f64 {
        self.0.radial_force(r, z) + self.1.radial_force(r, z)
    }
    fn circular_velocity(&self, r: f64) -> f64 {
        self.0
            .circular_velocity(r)
            .hypot(self.1.circular_velocity(r))
    }
}

/// Any number of potentials, summed.
///
/// # Examples
/// ~~~
/// use staeckel_grid::potential::{AxisymmetricPotential, Isochrone, MiyamotoNagai, PotentialList};
/// let galaxy = PotentialList::new(vec![
///     Box::new(Isochrone::new(0.2, 0.3)),
///     Box::new(MiyamotoNagai::new(0.8, 3.0, 0.28)),
/// ]);
/// let phi = galaxy.potential(1.0, 0.1);
/// assert!(phi < 0.0);
/// ~~~
#[derive(Clone, Debug, Default)]
pub struct PotentialList(Vec<Box<dyn AxisymmetricPotential>>);

impl PotentialList {
    pub fn new(potentials: Vec<Box<dyn AxisymmetricPotential>>) -> Self {
        Self(potentials)
    }
    /// Append a potential
    pub fn push(&mut self, potential: Box<dyn AxisymmetricPotential>) {
        self.0.push(potential);
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AxisymmetricPotential for PotentialList {
    fn potential(&self, r: f64, z: f64) -> f64 {
        self.0.iter().map(|p| p.potential(r, z)).sum()
    }
    fn radial_force(&self, r: f64, z: f64) -> f64 {
        self.0.iter().map(|p| p.radial_force(r, z)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_combined() {
        let (r, z) = (1.3, 0.2);
        let iso = Isochrone::new(1.0, 0.5);
        let disk = MiyamotoNagai::new(0.5, 1.0, 0.1);
        let combined = Combined::new(iso, disk);
        assert_relative_eq!(
            combined.potential(r, z),
            iso.potential(r, z) + disk.potential(r, z)
        );
        let vc2 = iso.circular_velocity(r).powi(2) + disk.circular_velocity(r).powi(2);
        assert_relative_eq!(combined.circular_velocity(r).powi(2), vc2, epsilon = 1e-12);
    }

    #[test]
    fn test_list_matches_combined() {
        let iso = Isochrone::new(1.0, 0.5);
        let disk = MiyamotoNagai::new(0.5, 1.0, 0.1);
        let combined = Combined::new(iso, disk);
        let list = PotentialList::new(vec![Box::new(iso), Box::new(disk)]);
        assert_eq!(list.len(), 2);
        for &r in &[0.1, 0.7, 2.0, 8.0] {
            assert_relative_eq!(list.potential(r, 0.3), combined.potential(r, 0.3));
            assert_relative_eq!(
                list.circular_velocity(r),
                combined.circular_velocity(r),
                epsilon = 1e-12
            );
        }
        let cloned = list.clone();
        assert_relative_eq!(cloned.potential(1.0, 0.0), list.potential(1.0, 0.0));
    }

    #[test]
    fn test_default_force_matches_analytical() {
        // a wrapper that only provides the potential falls back to finite differences
        #[derive(Clone, Debug)]
        struct Bare(Isochrone);
        impl AxisymmetricPotential for Bare {
            fn potential(&self, r: f64, z: f64) -> f64 {
                self.0.potential(r, z)
            }
        }
        let iso = Isochrone::new(1.0, 1.0);
        let bare = Bare(iso);
        for &r in &[0.2, 1.0, 4.0] {
            assert_relative_eq!(
                bare.radial_force(r, 0.1),
                iso.radial_force(r, 0.1),
                max_relative = 1e-6
            );
            assert_relative_eq!(
                bare.circular_velocity(r),
                iso.circular_velocity(r),
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn test_guiding_radius() {
        let iso = Isochrone::new(1.0, 1.0);
        for &r in &[0.05, 0.5, 1.0, 3.0, 20.0] {
            let lz = r * iso.circular_velocity(r);
            assert_relative_eq!(iso.guiding_radius(lz).unwrap(), r, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_staeckel_potential_in_midplane() {
        let iso = Isochrone::new(1.0, 1.0);
        let (delta, u) = (0.6, 1.1);
        let r = delta * f64::sinh(u);
        assert_relative_eq!(
            iso.staeckel_potential(u, std::f64::consts::FRAC_PI_2, delta),
            iso.potential(r, 0.0),
            epsilon = 1e-14
        );
    }
}

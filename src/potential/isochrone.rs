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

use super::AxisymmetricPotential;
use crate::actions::{ActionSolver, OrbitState, PhasePoint};
use crate::UnboundOrbit;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Isochrone potential
///
/// $$ Φ(r) = -\frac{GM}{b + \sqrt{b^2 + r^2}} $$
///
/// due to M. Hénon, interpolating between a point mass ($b \rightarrow 0$)
/// and a homogeneous sphere. It is the most general spherical potential with
/// actions in closed form (Binney & Tremaine, _Galactic Dynamics_, §3.5.2),
/// which makes it double as an exact [`ActionSolver`]:
/// $$ J_R = \frac{GM}{\sqrt{-2E}} - \frac{1}{2}\left(L + \sqrt{L^2 + 4GMb}\right), \quad J_z = L - |L_z| $$
///
/// # Examples:
/// ~~~
/// use staeckel_grid::potential::{AxisymmetricPotential, Isochrone};
/// let iso = Isochrone::new(1.0, 1.0);
/// assert_eq!(iso.potential(0.0, 0.0), -0.5);
/// ~~~
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct Isochrone {
    /// Gravitational constant times mass, GM
    #[cfg_attr(feature = "serde", serde(rename = "gm"))]
    gm: f64,
    /// Scale radius, b
    #[cfg_attr(feature = "serde", serde(rename = "b"))]
    scale_radius: f64,
}

impl Isochrone {
    pub fn new(gm: f64, scale_radius: f64) -> Self {
        assert!(gm > 0.0 && scale_radius > 0.0);
        Self { gm, scale_radius }
    }

    /// Specific energy of a phase-space point, E = Φ + v²/2
    pub fn energy(&self, point: &impl OrbitState) -> f64 {
        self.potential(point.r(), point.z())
            + 0.5 * (point.vr().powi(2) + point.vt().powi(2) + point.vz().powi(2))
    }

    /// Magnitude of the total angular momentum, |r × v|
    pub fn total_angular_momentum(point: &impl OrbitState) -> f64 {
        let (r, z) = (point.r(), point.z());
        let lx = -z * point.vt();
        let ly = z * point.vr() - r * point.vz();
        let lz = r * point.vt();
        (lx * lx + ly * ly + lz * lz).sqrt()
    }

    #[inline]
    fn spherical_radius_term(&self, r_squared: f64) -> f64 {
        (self.scale_radius * self.scale_radius + r_squared).sqrt()
    }
}

impl AxisymmetricPotential for Isochrone {
    #[inline]
    fn potential(&self, r: f64, z: f64) -> f64 {
        let a = self.spherical_radius_term(r * r + z * z);
        -self.gm / (self.scale_radius + a)
    }

    #[inline]
    fn radial_force(&self, r: f64, z: f64) -> f64 {
        let a = self.spherical_radius_term(r * r + z * z);
        -self.gm * r / (a * (self.scale_radius + a).powi(2))
    }
}

impl ActionSolver for Isochrone {
    fn radial_action(&self, point: &PhasePoint) -> anyhow::Result<f64> {
        let energy = self.energy(point);
        if energy >= 0.0 {
            return Err(UnboundOrbit.into());
        }
        let l = Self::total_angular_momentum(point);
        let four_gmb = 4.0 * self.gm * self.scale_radius;
        Ok(self.gm / (-2.0 * energy).sqrt() - 0.5 * (l + (l * l + four_gmb).sqrt()))
    }

    fn vertical_action(&self, point: &PhasePoint) -> anyhow::Result<f64> {
        if self.energy(point) >= 0.0 {
            return Err(UnboundOrbit.into());
        }
        Ok(Self::total_angular_momentum(point) - point.angular_momentum().abs())
    }
}

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

//! Phase-space points, action triples, and the exact single-orbit solver interface.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anything exposing a cylindrical phase-space position $(R, v_R, v_T, z, v_z)$
pub trait OrbitState {
    /// Galactocentric cylindrical radius, R
    fn r(&self) -> f64;
    /// Radial velocity, v_R
    fn vr(&self) -> f64;
    /// Tangential velocity, v_T
    fn vt(&self) -> f64;
    /// Height above the midplane, z
    fn z(&self) -> f64;
    /// Vertical velocity, v_z
    fn vz(&self) -> f64;
    /// Azimuth, if known. Axisymmetric actions never depend on it.
    fn phi(&self) -> Option<f64> {
        None
    }
    /// Angular momentum about the symmetry axis, L_z = R v_T
    fn angular_momentum(&self) -> f64 {
        self.r() * self.vt()
    }
}

/// A point in cylindrical phase space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct PhasePoint {
    pub r: f64,
    pub vr: f64,
    pub vt: f64,
    pub z: f64,
    pub vz: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub phi: Option<f64>,
}

impl PhasePoint {
    pub const fn new(r: f64, vr: f64, vt: f64, z: f64, vz: f64) -> Self {
        Self {
            r,
            vr,
            vt,
            z,
            vz,
            phi: None,
        }
    }
    /// Attach an azimuth
    pub fn with_phi(mut self, phi: f64) -> Self {
        self.phi = Some(phi);
        self
    }
}

impl OrbitState for PhasePoint {
    #[inline]
    fn r(&self) -> f64 {
        self.r
    }
    #[inline]
    fn vr(&self) -> f64 {
        self.vr
    }
    #[inline]
    fn vt(&self) -> f64 {
        self.vt
    }
    #[inline]
    fn z(&self) -> f64 {
        self.z
    }
    #[inline]
    fn vz(&self) -> f64 {
        self.vz
    }
    #[inline]
    fn phi(&self) -> Option<f64> {
        self.phi
    }
}

/// `[R, vR, vT, z, vz]`
impl From<[f64; 5]> for PhasePoint {
    fn from(v: [f64; 5]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4])
    }
}

/// `[R, vR, vT, z, vz, phi]`
impl From<[f64; 6]> for PhasePoint {
    fn from(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4]).with_phi(v[5])
    }
}

impl From<(f64, f64, f64, f64, f64)> for PhasePoint {
    fn from((r, vr, vt, z, vz): (f64, f64, f64, f64, f64)) -> Self {
        Self::new(r, vr, vt, z, vz)
    }
}

/// Radial action, angular momentum, and vertical action of an orbit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Actions {
    /// Radial action, J_R
    pub jr: f64,
    /// Angular momentum, L_z = J_φ
    pub lz: f64,
    /// Vertical action, J_z
    pub jz: f64,
}

impl From<Actions> for (f64, f64, f64) {
    fn from(a: Actions) -> Self {
        (a.jr, a.lz, a.jz)
    }
}

/// Exact actions for a single orbit, e.g. by quadrature.
///
/// Used while tabulating the grid. Orbits that are not bound must fail with
/// [`crate::UnboundOrbit`]; other failures may use any error type.
pub trait ActionSolver {
    /// Radial action, J_R
    fn radial_action(&self, point: &PhasePoint) -> anyhow::Result<f64>;
    /// Vertical action, J_z
    fn vertical_action(&self, point: &PhasePoint) -> anyhow::Result<f64>;
}

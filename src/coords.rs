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

//! Prolate spheroidal (confocal) coordinates.
//!
//! With focal distance Δ, cylindrical $(R, z)$ relate to $(u, v)$ through
//! $$ R = Δ \sinh u \sin v, \quad z = Δ \cosh u \cos v $$
//! so that $v = π/2$ is the galactic midplane.

/// Convert cylindrical $(R, z)$ to prolate spheroidal $(u, v)$ with focus `delta`.
///
/// # Examples
/// ~~~
/// use staeckel_grid::coords::{rz_to_uv, uv_to_rz};
/// let (u, v) = rz_to_uv(1.2, 0.3, 0.5);
/// let (r, z) = uv_to_rz(u, v, 0.5);
/// assert!((r - 1.2).abs() < 1e-12 && (z - 0.3).abs() < 1e-12);
/// ~~~
pub fn rz_to_uv(r: f64, z: f64, delta: f64) -> (f64, f64) {
    let d1 = ((z + delta).powi(2) + r * r).sqrt();
    let d2 = ((z - delta).powi(2) + r * r).sqrt();
    let cosh_u = 0.5 / delta * (d1 + d2);
    let cos_v = 0.5 / delta * (d1 - d2);
    // rounding can push these just outside the domains of acosh/acos
    (cosh_u.max(1.0).acosh(), cos_v.clamp(-1.0, 1.0).acos())
}

/// Convert prolate spheroidal $(u, v)$ to cylindrical $(R, z)$ with focus `delta`.
pub fn uv_to_rz(u: f64, v: f64, delta: f64) -> (f64, f64) {
    (delta * u.sinh() * v.sin(), delta * u.cosh() * v.cos())
}

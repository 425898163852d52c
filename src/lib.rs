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

//! # Staeckel grid
//!
//! Fast approximate actions $(J_R, L_z, J_z)$ for orbits in axisymmetric
//! gravitational potentials.
//!
//! Actions are first computed on a three dimensional grid in angular momentum,
//! energy, and a turning-point angle using an exact single-orbit solver, and
//! subsequently obtained for arbitrary phase-space points through
//! prefiltered cubic B-spline interpolation.
//!
//! ## Examples
//! ~~~
//! use staeckel_grid::potential::Isochrone;
//! use staeckel_grid::{GridConfig, PhasePoint, StaeckelGrid};
//!
//! let isochrone = Isochrone::new(1.0, 1.0);
//! let config = GridConfig::default()
//!     .with_delta(0.5)
//!     .with_resolution(10, 10, 10);
//! let grid = StaeckelGrid::builder()
//!     .potential(isochrone)
//!     .config(config)
//!     .build(&isochrone)
//!     .unwrap();
//! let actions = grid.actions(&PhasePoint::new(1.0, 0.1, 0.3, 0.0, 0.05)).unwrap();
//! assert_eq!(actions.lz, 1.0 * 0.3);
//! assert!(actions.jr.is_finite() && actions.jz.is_finite());
//! ~~~

#[cfg(test)]
extern crate approx;

pub mod actions;
pub mod coords;
mod error;
pub mod grid;
pub mod optimize;
pub mod potential;
pub mod spline;
pub mod staeckel;

pub use actions::{ActionSolver, Actions, OrbitState, PhasePoint};
pub use error::{Error, Result, UnboundOrbit};
pub use grid::{GridBuilder, GridConfig, GridStats, StaeckelGrid, ValidationResult};
pub use potential::AxisymmetricPotential;

/// Evenly spaced samples over the closed interval `[start, stop]`.
///
/// A single sample returns `start`.
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

#[test]
fn test_linspace() {
    use approx::assert_relative_eq;
    let x = linspace(0.0, 1.0, 5);
    assert_eq!(x.len(), 5);
    assert_relative_eq!(x[1], 0.25);
    assert_eq!(x[4], 1.0);
    assert_eq!(linspace(0.01, 3.0, 1), vec![0.01]);
    assert!(linspace(0.0, 1.0, 0).is_empty());
}

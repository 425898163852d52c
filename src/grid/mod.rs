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

//! # Action grid
//!
//! Tabulates exact actions on a regular grid in
//!
//! 1. angular momentum $L_z$, linear in $[0.01, R_\mathrm{max} v_c(R_\mathrm{max})]$,
//! 2. energy, spaced through the remap $f(E) = e^{-E}$ between the energy
//!    $E_a$ of an orbit turning at $R = 99$ and the circular energy $E_c$,
//! 3. the launch angle $ψ ∈ [0, π/2]$ at the turning point, splitting the
//!    available speed between $v_R$ ($ψ = 0$) and $v_z$ ($ψ = π/2$).
//!
//! Rows of constant $L_z$ are normalized by their largest action and the
//! normalized grids are prefiltered for cubic B-spline interpolation, see
//! [`crate::spline::bspline`].
//!
//! # Example
//!
//! ```
//! use staeckel_grid::potential::{Isochrone, AxisymmetricPotential};
//! use staeckel_grid::{GridConfig, PhasePoint, StaeckelGrid};
//!
//! let iso = Isochrone::new(1.0, 1.0);
//! let grid = StaeckelGrid::builder()
//!     .potential(iso)
//!     .config(GridConfig::default().with_delta(0.1).with_resolution(8, 8, 8))
//!     .build(&iso)
//!     .unwrap();
//!
//! let (lz_min, lz_max) = grid.lz_range();
//! assert_eq!(lz_min, 0.01);
//! assert!((lz_max - 5.0 * iso.circular_velocity(5.0)).abs() < 1e-14);
//! ```

use crate::actions::{ActionSolver, PhasePoint};
use crate::potential::AxisymmetricPotential;
use crate::spline::{bspline::PrefilteredGrid, BivariateSpline, CubicSpline};
use crate::staeckel::{
    energy_remap, inverse_energy_remap, turning_point, velocity_at_turning_point,
};
use crate::{linspace, Error, Result};
use itertools::iproduct;
use ndarray::{Array2, Array3, ArrayViewMut2, Axis};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

mod query;
mod stats;
pub use self::stats::{GridStats, ValidationResult};

/// Smallest angular momentum on the grid
pub const LZ_MIN: f64 = 0.01;
/// Radius defining the high-energy edge of the grid, E_a(L_z) = Φ(99, 0) + L_z²/2·99²
pub const REFERENCE_RADIUS: f64 = 99.0;
/// Offset keeping the logarithm of vanishing action maxima finite
pub(crate) const ACTION_FLOOR: f64 = 1e-5;

/// Configuration for action grid construction
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize), serde(default))]
pub struct GridConfig {
    /// Focal distance Δ of the prolate spheroidal coordinates (required)
    pub delta: Option<f64>,
    /// Radius whose circular orbit sets the largest L_z (default: 5.0)
    pub r_max: f64,
    /// Number of energy samples per L_z (default: 25)
    pub n_e: usize,
    /// Number of launch angles (default: 25)
    pub n_psi: usize,
    /// Number of angular momentum samples (default: 25)
    pub n_lz: usize,
    /// Worker threads used for tabulation; only 1 is supported (default: 1)
    pub workers: usize,
    /// Log every query point outside the grid (default: false)
    pub report_outside_grid: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            delta: None,
            r_max: 5.0,
            n_e: 25,
            n_psi: 25,
            n_lz: 25,
            workers: 1,
            report_outside_grid: false,
        }
    }
}

impl GridConfig {
    /// Set the focal distance
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Set the radial extent
    pub fn with_r_max(mut self, r_max: f64) -> Self {
        self.r_max = r_max;
        self
    }

    /// Set the number of samples along L_z, energy, and launch angle
    pub fn with_resolution(mut self, n_lz: usize, n_e: usize, n_psi: usize) -> Self {
        self.n_lz = n_lz;
        self.n_e = n_e;
        self.n_psi = n_psi;
        self
    }

    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Log query points that fall outside the grid
    pub fn with_report_outside_grid(mut self, report: bool) -> Self {
        self.report_outside_grid = report;
        self
    }

    /// Check the configuration, returning the focal distance
    fn validate(&self) -> Result<f64> {
        let delta = self.delta.ok_or(Error::MissingConfiguration("delta"))?;
        if self.workers != 1 {
            return Err(Error::Unsupported(format!(
                "'workers = {}'; tabulation runs on a single worker",
                self.workers
            )));
        }
        if !(delta.is_finite() && delta > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "delta must be positive and finite, got {delta}"
            )));
        }
        if !(self.r_max.is_finite() && self.r_max > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "r_max must be positive and finite, got {}",
                self.r_max
            )));
        }
        if self.n_lz == 0 || self.n_e == 0 || self.n_psi == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "resolution must be non-zero, got (n_lz, n_e, n_psi) = ({}, {}, {})",
                self.n_lz, self.n_e, self.n_psi
            )));
        }
        Ok(delta)
    }
}

/// Collects the potential and configuration for a [`StaeckelGrid`]
#[derive(Clone, Debug)]
pub struct GridBuilder<P> {
    potential: Option<P>,
    config: GridConfig,
}

impl<P> Default for GridBuilder<P> {
    fn default() -> Self {
        Self {
            potential: None,
            config: GridConfig::default(),
        }
    }
}

impl<P: AxisymmetricPotential> GridBuilder<P> {
    /// Potential in which orbits move (required)
    pub fn potential(mut self, potential: P) -> Self {
        self.potential = Some(potential);
        self
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    /// Focal distance, shorthand for setting it on the configuration
    pub fn delta(mut self, delta: f64) -> Self {
        self.config.delta = Some(delta);
        self
    }

    /// Validate the configuration and tabulate actions with `solver`.
    ///
    /// Fails without doing any work if the potential or focal distance is
    /// missing, or if more than one worker is requested. An unbound orbit
    /// met by `solver` aborts the build with [`Error::UnboundOrbit`].
    pub fn build<S: ActionSolver + ?Sized>(self, solver: &S) -> Result<StaeckelGrid<P>> {
        let potential = self
            .potential
            .ok_or(Error::MissingConfiguration("potential"))?;
        let delta = self.config.validate()?;
        StaeckelGrid::tabulate(potential, delta, self.config, solver)
    }
}

/// Interpolation grid of actions in an axisymmetric potential.
///
/// Immutable once built; queries only read from it.
#[derive(Clone, Debug)]
pub struct StaeckelGrid<P> {
    potential: P,
    delta: f64,
    config: GridConfig,
    /// Angular momentum samples, strictly increasing
    lz: Vec<f64>,
    lz_min: f64,
    lz_max: f64,
    /// Normalized energy coordinate of each energy sample, linear in [0, 1]
    energy_fractions: Vec<f64>,
    guiding_radii: Vec<f64>,
    /// E_c(L_z), energy of the circular orbit
    circular_energies: Vec<f64>,
    /// E_a(L_z), energy of an orbit at rest radially at the reference radius
    reference_energies: Vec<f64>,
    circular_energy_ceiling: f64,
    reference_energy_ceiling: f64,
    guiding_radius_spline: CubicSpline,
    /// ln(ceiling - E_c) over L_z
    circular_energy_spline: CubicSpline,
    /// ln(ceiling - E_a) over L_z
    reference_energy_spline: CubicSpline,
    /// Row-normalized J_R and J_z in [0, 1]
    jr: Array3<f64>,
    jz: Array3<f64>,
    jr_max: Vec<f64>,
    jz_max: Vec<f64>,
    /// ln(max + floor) over L_z
    jr_max_spline: CubicSpline,
    jz_max_spline: CubicSpline,
    turning_points: Array2<f64>,
    /// ln(u₀) over (L_z, energy fraction)
    log_turning_point_spline: BivariateSpline,
    jr_coefficients: PrefilteredGrid,
    jz_coefficients: PrefilteredGrid,
}

impl StaeckelGrid<()> {
    /// Start building a grid
    pub fn builder<P: AxisymmetricPotential>() -> GridBuilder<P> {
        GridBuilder::default()
    }
}

impl<P: AxisymmetricPotential> StaeckelGrid<P> {
    fn tabulate<S: ActionSolver + ?Sized>(
        potential: P,
        delta: f64,
        config: GridConfig,
        solver: &S,
    ) -> Result<Self> {
        let (n_lz, n_e, n_psi) = (config.n_lz, config.n_e, config.n_psi);

        let lz_max = config.r_max * potential.circular_velocity(config.r_max);
        if n_lz > 1 && !(lz_max > LZ_MIN) {
            return Err(Error::InvalidConfiguration(format!(
                "largest angular momentum {lz_max} at r_max = {} does not exceed {LZ_MIN}",
                config.r_max
            )));
        }
        let lz = linspace(LZ_MIN, lz_max, n_lz);
        let (lz_min, lz_max) = (lz[0], lz[n_lz - 1]);
        log::info!(
            "tabulating {}x{}x{} action grid for Lz in [{}, {}] with delta = {}",
            n_lz,
            n_e,
            n_psi,
            lz_min,
            lz_max,
            delta
        );

        // boundary curves
        let guiding_radii = lz
            .iter()
            .map(|&l| potential.guiding_radius(l))
            .collect::<Result<Vec<f64>>>()?;
        let circular_energies: Vec<f64> = lz
            .iter()
            .zip(&guiding_radii)
            .map(|(&l, &r)| potential.potential(r, 0.0) + 0.5 * l * l / (r * r))
            .collect();
        let reference_potential = potential.potential(REFERENCE_RADIUS, 0.0);
        let reference_energies: Vec<f64> = lz
            .iter()
            .map(|&l| reference_potential + 0.5 * l * l / REFERENCE_RADIUS.powi(2))
            .collect();

        let guiding_radius_spline = CubicSpline::new(&lz, &guiding_radii)?;
        let (circular_energy_ceiling, circular_energy_spline) =
            log_ceiling_spline(&lz, &circular_energies)?;
        let (reference_energy_ceiling, reference_energy_spline) =
            log_ceiling_spline(&lz, &reference_energies)?;

        // actions
        let energy_fractions = linspace(0.0, 1.0, n_e);
        let psi = linspace(0.0, FRAC_PI_2, n_psi);
        let mut jr = Array3::<f64>::zeros((n_lz, n_e, n_psi));
        let mut jz = Array3::<f64>::zeros((n_lz, n_e, n_psi));
        let mut turning_points = Array2::<f64>::zeros((n_lz, n_e));
        let mut jr_max = vec![0.0; n_lz];
        let mut jz_max = vec![0.0; n_lz];

        for (i, &l) in lz.iter().enumerate() {
            let f_low = energy_remap(reference_energies[i]);
            let f_high = energy_remap(circular_energies[i]);
            // (radius, speed) at the turning point of each energy
            let mut launch = Vec::with_capacity(n_e);
            for (j, &y) in energy_fractions.iter().enumerate() {
                let energy = inverse_energy_remap(f_low + y * (f_high - f_low));
                let u0 = turning_point(&potential, delta, energy, l)?;
                turning_points[[i, j]] = u0;
                launch.push((
                    delta * u0.sinh(),
                    velocity_at_turning_point(&potential, delta, energy, l, u0),
                ));
            }
            for (j, k) in iproduct!(0..n_e, 0..n_psi) {
                let (r, v) = launch[j];
                let (sin_psi, cos_psi) = psi[k].sin_cos();
                let point = PhasePoint::new(r, v * cos_psi, l / r, 0.0, v * sin_psi);
                jr[[i, j, k]] = solver
                    .radial_action(&point)
                    .map_err(Error::from_solver)?;
                jz[[i, j, k]] = solver
                    .vertical_action(&point)
                    .map_err(Error::from_solver)?;
            }

            let zeroed = zero_degenerate(jr.index_axis_mut(Axis(0), i))
                + zero_degenerate(jz.index_axis_mut(Axis(0), i));
            if zeroed > 0 {
                log::warn!(
                    "zeroed {} degenerate action samples at Lz = {}",
                    zeroed,
                    l
                );
            }
            jr_max[i] = normalize_row(jr.index_axis_mut(Axis(0), i));
            jz_max[i] = normalize_row(jz.index_axis_mut(Axis(0), i));
            log::debug!("tabulated Lz row {}/{} (Lz = {:.5})", i + 1, n_lz, l);
        }

        let log_max = |max: &[f64]| -> Vec<f64> {
            max.iter().map(|m| (m + ACTION_FLOOR).ln()).collect()
        };
        let jr_max_spline = CubicSpline::new(&lz, &log_max(&jr_max))?;
        let jz_max_spline = CubicSpline::new(&lz, &log_max(&jz_max))?;
        let log_turning_point_spline =
            BivariateSpline::new(&lz, &energy_fractions, turning_points.mapv(f64::ln))?;
        let jr_coefficients = PrefilteredGrid::new(&jr);
        let jz_coefficients = PrefilteredGrid::new(&jz);
        log::info!("action grid complete");

        Ok(Self {
            potential,
            delta,
            config,
            lz,
            lz_min,
            lz_max,
            energy_fractions,
            guiding_radii,
            circular_energies,
            reference_energies,
            circular_energy_ceiling,
            reference_energy_ceiling,
            guiding_radius_spline,
            circular_energy_spline,
            reference_energy_spline,
            jr,
            jz,
            jr_max,
            jz_max,
            jr_max_spline,
            jz_max_spline,
            turning_points,
            log_turning_point_spline,
            jr_coefficients,
            jz_coefficients,
        })
    }

    pub fn potential(&self) -> &P {
        &self.potential
    }

    /// Focal distance Δ
    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Angular momentum samples
    pub fn lz_axis(&self) -> &[f64] {
        &self.lz
    }

    /// Smallest and largest tabulated angular momentum
    pub fn lz_range(&self) -> (f64, f64) {
        (self.lz_min, self.lz_max)
    }

    /// Energy coordinate of each energy sample, from E_a (0) to E_c (1)
    pub fn energy_fractions(&self) -> &[f64] {
        &self.energy_fractions
    }

    /// Guiding radius at each L_z sample
    pub fn guiding_radii(&self) -> &[f64] {
        &self.guiding_radii
    }

    /// Circular orbit energy at each L_z sample
    pub fn circular_energies(&self) -> &[f64] {
        &self.circular_energies
    }

    /// Reference energy at each L_z sample
    pub fn reference_energies(&self) -> &[f64] {
        &self.reference_energies
    }

    /// Row-normalized radial actions, indexed by (L_z, energy, ψ)
    pub fn radial_actions(&self) -> &Array3<f64> {
        &self.jr
    }

    /// Row-normalized vertical actions, indexed by (L_z, energy, ψ)
    pub fn vertical_actions(&self) -> &Array3<f64> {
        &self.jz
    }

    /// Largest radial action in each L_z row
    pub fn radial_action_maxima(&self) -> &[f64] {
        &self.jr_max
    }

    /// Largest vertical action in each L_z row
    pub fn vertical_action_maxima(&self) -> &[f64] {
        &self.jz_max
    }

    /// Turning points u₀, indexed by (L_z, energy)
    pub fn turning_points(&self) -> &Array2<f64> {
        &self.turning_points
    }

    /// Interpolated guiding radius R_L(L_z)
    pub fn guiding_radius(&self, lz: f64) -> f64 {
        self.guiding_radius_spline.eval(lz)
    }

    /// Interpolated circular orbit energy E_c(L_z)
    pub fn circular_energy(&self, lz: f64) -> f64 {
        self.circular_energy_ceiling - self.circular_energy_spline.eval(lz).exp()
    }

    /// Interpolated reference energy E_a(L_z)
    pub fn reference_energy(&self, lz: f64) -> f64 {
        self.reference_energy_ceiling - self.reference_energy_spline.eval(lz).exp()
    }
}

/// Fit ln(ceiling - value) with ceiling one above the largest value
fn log_ceiling_spline(knots: &[f64], values: &[f64]) -> Result<(f64, CubicSpline)> {
    let ceiling = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 1.0;
    let transformed: Vec<f64> = values.iter().map(|v| (ceiling - v).ln()).collect();
    Ok((ceiling, CubicSpline::new(knots, &transformed)?))
}

/// Replace non-finite and negative actions by zero, returning how many were replaced
fn zero_degenerate(mut row: ArrayViewMut2<f64>) -> usize {
    let mut count = 0;
    row.iter_mut()
        .filter(|x| !x.is_finite() || **x < 0.0)
        .for_each(|x| {
            *x = 0.0;
            count += 1;
        });
    count
}

/// Divide by the largest value unless it is zero, returning that value
fn normalize_row(mut row: ArrayViewMut2<f64>) -> f64 {
    let max = row.fold(0.0, |max: f64, &x| max.max(x));
    if max > 0.0 {
        row.mapv_inplace(|x| x / max);
    }
    max
}

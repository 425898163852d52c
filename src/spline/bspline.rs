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

//! Cubic B-spline interpolation on regular three dimensional grids
//!
//! Interpolation is split in two phases:
//!
//! 1. **Prefilter** (once): the grid samples are converted to B-spline
//!    coefficients with a separable recursive filter along each axis.
//! 2. **Evaluate** (many times): at a fractional grid coordinate the
//!    interpolant is a weighted sum over the 4×4×4 neighbouring coefficients.
//!
//! Boundaries use mirror-symmetric extension, $c_{-k} = c_k$ and
//! $c_{n-1+k} = c_{n-1-k}$, the default of most image processing libraries.
//!
//! # References
//!
//! - Unser, IEEE Signal Process. Mag. 16, 22 (1999)
//!   <https://doi.org/10.1109/79.799930>
//! - Thévenaz, Blu & Unser, IEEE Trans. Med. Imaging 19, 739 (2000)
//!   <https://doi.org/10.1109/42.875199>

use ndarray::{Array3, Axis};

/// Pole of the cubic B-spline prefilter, √3 - 2
const POLE: f64 = -0.267_949_192_431_122_7;
/// Overall gain of the cubic prefilter, (1 - z)(1 - 1/z)
const GAIN: f64 = 6.0;

/// Cubic B-spline coefficients of a regular three dimensional grid.
///
/// # Examples
/// ~~~
/// use ndarray::Array3;
/// use staeckel_grid::spline::bspline::PrefilteredGrid;
/// let samples = Array3::from_shape_fn((5, 6, 7), |(i, j, k)| (i + 2 * j + k * k) as f64);
/// let grid = PrefilteredGrid::new(&samples);
/// // exact at the samples
/// assert!((grid.eval([2.0, 3.0, 4.0]) - samples[[2, 3, 4]]).abs() < 1e-10);
/// ~~~
#[derive(Clone, Debug)]
pub struct PrefilteredGrid {
    coefficients: Array3<f64>,
}

impl PrefilteredGrid {
    /// Prefilter `samples` along all three axes
    pub fn new(samples: &Array3<f64>) -> Self {
        let mut coefficients = samples.clone();
        for axis in 0..3 {
            prefilter_axis(&mut coefficients, Axis(axis));
        }
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &Array3<f64> {
        &self.coefficients
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.coefficients.dim()
    }

    /// Interpolated value at fractional grid coordinates (index units, no refiltering)
    pub fn eval(&self, coords: [f64; 3]) -> f64 {
        let (n0, n1, n2) = self.coefficients.dim();
        let (i0, w0) = stencil(coords[0], n0);
        let (i1, w1) = stencil(coords[1], n1);
        let (i2, w2) = stencil(coords[2], n2);
        let mut sum = 0.0;
        for (a, wa) in i0.iter().zip(&w0) {
            for (b, wb) in i1.iter().zip(&w1) {
                let wab = wa * wb;
                for (c, wc) in i2.iter().zip(&w2) {
                    sum += wab * wc * self.coefficients[[*a, *b, *c]];
                }
            }
        }
        sum
    }
}

/// Apply the recursive prefilter to every lane along `axis`
fn prefilter_axis(data: &mut Array3<f64>, axis: Axis) {
    let mut line = Vec::with_capacity(data.len_of(axis));
    for mut lane in data.lanes_mut(axis) {
        line.clear();
        line.extend(lane.iter().copied());
        prefilter_line(&mut line);
        lane.iter_mut().zip(&line).for_each(|(dst, c)| *dst = *c);
    }
}

/// Convert samples to cubic B-spline coefficients in place
pub fn prefilter_line(c: &mut [f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }
    c.iter_mut().for_each(|x| *x *= GAIN);
    // causal pass
    c[0] = initial_causal_coefficient(c);
    for k in 1..n {
        c[k] += POLE * c[k - 1];
    }
    // anticausal pass
    c[n - 1] = POLE / (POLE * POLE - 1.0) * (POLE * c[n - 2] + c[n - 1]);
    for k in (0..n - 1).rev() {
        c[k] = POLE * (c[k + 1] - c[k]);
    }
}

/// Exact mirror-boundary initialization of the causal filter
fn initial_causal_coefficient(c: &[f64]) -> f64 {
    let n = c.len();
    let inverse_pole = 1.0 / POLE;
    let mut zn = POLE;
    let mut z2n = POLE.powi(n as i32 - 1);
    let mut sum = c[0] + z2n * c[n - 1];
    z2n *= z2n * inverse_pole;
    for ck in c.iter().take(n - 1).skip(1) {
        sum += (zn + z2n) * ck;
        zn *= POLE;
        z2n *= inverse_pole;
    }
    sum / (1.0 - zn * zn)
}

/// Mirror an arbitrary index into `[0, n)`
#[inline]
fn mirror(index: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let i = index.rem_euclid(period);
    if i >= n as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// Indices and cubic B-spline weights of the four coefficients around `x`
#[inline]
fn stencil(x: f64, n: usize) -> ([usize; 4], [f64; 4]) {
    let floor = x.floor();
    let t = x - floor;
    let start = floor as isize - 1;
    let indices = [
        mirror(start, n),
        mirror(start + 1, n),
        mirror(start + 2, n),
        mirror(start + 3, n),
    ];
    let t2 = t * t;
    let t3 = t2 * t;
    let weights = [
        (1.0 - t).powi(3) / 6.0,
        (4.0 - 6.0 * t2 + 3.0 * t3) / 6.0,
        (1.0 + 3.0 * t + 3.0 * t2 - 3.0 * t3) / 6.0,
        t3 / 6.0,
    ];
    (indices, weights)
}

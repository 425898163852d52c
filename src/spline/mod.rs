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

//! Interpolating cubic splines
//!
//! - [`CubicSpline`]: one dimensional, not-a-knot end conditions, arbitrary knots
//! - [`BivariateSpline`]: tensor product of two [`CubicSpline`] bases on a rectangular grid
//! - [`bspline`]: prefiltered cubic B-splines on regular three dimensional grids
//!
//! The splines pass exactly through the data. Outside the knot range the
//! end polynomials are extrapolated.
//!
//! # Design
//!
//! The spline is stored by its second derivatives $M_i$ at the knots. For knot
//! spacing $h_i = x_{i+1} - x_i$, continuity of the first derivative gives
//! $$ h_{i-1} M_{i-1} + 2(h_{i-1} + h_i) M_i + h_i M_{i+1} = 6\left(\frac{y_{i+1} - y_i}{h_i} - \frac{y_i - y_{i-1}}{h_{i-1}}\right) $$
//! and continuity of the third derivative across the second and penultimate
//! knots closes the system. The LU decomposition only depends on the knots
//! and is shared between all value sets fitted on the same axis.

pub mod bspline;

use crate::{Error, Result};
use nalgebra::{DMatrix, DVector, Dyn, LU};
use ndarray::Array2;
use std::fmt::{self, Debug};

/// Knots and the factorized spline system for one axis.
#[derive(Clone)]
pub struct SplineBasis {
    knots: Vec<f64>,
    lu: LU<f64, Dyn, Dyn>,
}

impl SplineBasis {
    /// Factorize the spline system for strictly increasing `knots`
    pub fn new(knots: &[f64]) -> Result<Self> {
        if knots.is_empty() {
            return Err(Error::InvalidSpline("no knots".to_string()));
        }
        if knots.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidSpline("knots must be finite".to_string()));
        }
        if knots.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidSpline(
                "knots must be strictly increasing".to_string(),
            ));
        }
        let n = knots.len();
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let mut a = DMatrix::<f64>::zeros(n, n);
        match n {
            // constant and straight line: no curvature
            1 | 2 => a.fill_with_identity(),
            // parabola: constant curvature
            3 => {
                a[(0, 0)] = 1.0;
                a[(0, 1)] = -1.0;
                a[(2, 1)] = 1.0;
                a[(2, 2)] = -1.0;
            }
            _ => {
                a[(0, 0)] = h[1];
                a[(0, 1)] = -(h[0] + h[1]);
                a[(0, 2)] = h[0];
                a[(n - 1, n - 3)] = h[n - 2];
                a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
                a[(n - 1, n - 1)] = h[n - 3];
            }
        }
        if n >= 3 {
            for i in 1..n - 1 {
                a[(i, i - 1)] = h[i - 1];
                a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
                a[(i, i + 1)] = h[i];
            }
        }
        Ok(Self {
            knots: knots.to_vec(),
            lu: a.lu(),
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Second derivatives at the knots of the spline through `values`
    pub fn second_derivatives(&self, values: &[f64]) -> Result<Vec<f64>> {
        let n = self.knots.len();
        if values.len() != n {
            return Err(Error::InvalidSpline(format!(
                "expected {} values, found {}",
                n,
                values.len()
            )));
        }
        if n < 3 {
            return Ok(vec![0.0; n]);
        }
        let x = &self.knots;
        let mut rhs = DVector::<f64>::zeros(n);
        for i in 1..n - 1 {
            rhs[i] = 6.0
                * ((values[i + 1] - values[i]) / (x[i + 1] - x[i])
                    - (values[i] - values[i - 1]) / (x[i] - x[i - 1]));
        }
        self.lu
            .solve(&rhs)
            .map(|m| m.iter().copied().collect())
            .ok_or_else(|| Error::InvalidSpline("singular spline system".to_string()))
    }

    /// Evaluate the spline given by `values` and their `second` derivatives at `x`
    #[inline]
    pub fn evaluate(&self, values: &[f64], second: &[f64], x: f64) -> f64 {
        let knots = &self.knots;
        let n = knots.len();
        if n == 1 {
            return values[0];
        }
        // interval index, clamped so that the end polynomials extrapolate
        let i = knots.partition_point(|&k| k <= x).clamp(1, n - 1) - 1;
        let h = knots[i + 1] - knots[i];
        let a = knots[i + 1] - x;
        let b = x - knots[i];
        (second[i] * a.powi(3) + second[i + 1] * b.powi(3)) / (6.0 * h)
            + (values[i] / h - second[i] * h / 6.0) * a
            + (values[i + 1] / h - second[i + 1] * h / 6.0) * b
    }
}

impl Debug for SplineBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplineBasis")
            .field("n_knots", &self.knots.len())
            .field("range", &(self.knots.first(), self.knots.last()))
            .finish()
    }
}

/// One dimensional interpolating cubic spline with not-a-knot end conditions.
///
/// # Examples
/// ~~~
/// use staeckel_grid::spline::CubicSpline;
/// let x: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
/// let y: Vec<f64> = x.iter().map(|x| x * x * x - x).collect();
/// let spline = CubicSpline::new(&x, &y).unwrap();
/// // cubics are reproduced exactly
/// assert!((spline.eval(1.3) - (1.3f64.powi(3) - 1.3)).abs() < 1e-12);
/// ~~~
#[derive(Clone, Debug)]
pub struct CubicSpline {
    basis: SplineBasis,
    values: Vec<f64>,
    second: Vec<f64>,
}

impl CubicSpline {
    pub fn new(knots: &[f64], values: &[f64]) -> Result<Self> {
        let basis = SplineBasis::new(knots)?;
        Self::with_basis(basis, values)
    }

    /// Fit `values` on an already factorized basis
    pub fn with_basis(basis: SplineBasis, values: &[f64]) -> Result<Self> {
        let second = basis.second_derivatives(values)?;
        Ok(Self {
            basis,
            values: values.to_vec(),
            second,
        })
    }

    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.basis.evaluate(&self.values, &self.second, x)
    }

    pub fn knots(&self) -> &[f64] {
        self.basis.knots()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Interpolating bicubic spline on a rectangular grid, `values[[i, j]]` at `(x[i], y[j])`.
///
/// Evaluation interpolates each `x` row along `y`, then fits and evaluates a
/// spline through these along `x`, which equals the tensor-product spline.
#[derive(Clone, Debug)]
pub struct BivariateSpline {
    x_basis: SplineBasis,
    y_basis: SplineBasis,
    values: Array2<f64>,
    /// Second derivatives along y for each x row
    row_second: Array2<f64>,
}

impl BivariateSpline {
    pub fn new(x: &[f64], y: &[f64], values: Array2<f64>) -> Result<Self> {
        if values.dim() != (x.len(), y.len()) {
            return Err(Error::InvalidSpline(format!(
                "value grid {:?} does not match axes ({}, {})",
                values.dim(),
                x.len(),
                y.len()
            )));
        }
        let x_basis = SplineBasis::new(x)?;
        let y_basis = SplineBasis::new(y)?;
        let mut row_second = Array2::<f64>::zeros(values.dim());
        for (row, mut second) in values.outer_iter().zip(row_second.outer_iter_mut()) {
            let fitted = y_basis.second_derivatives(&row.to_vec())?;
            second.iter_mut().zip(fitted).for_each(|(s, m)| *s = m);
        }
        Ok(Self {
            x_basis,
            y_basis,
            values,
            row_second,
        })
    }

    /// Evaluate at `(x, y)`
    pub fn eval(&self, x: f64, y: f64) -> Result<f64> {
        let column: Vec<f64> = self
            .values
            .outer_iter()
            .zip(self.row_second.outer_iter())
            .map(|(row, second)| {
                self.y_basis
                    .evaluate(&row.to_vec(), &second.to_vec(), y)
            })
            .collect();
        let second = self.x_basis.second_derivatives(&column)?;
        Ok(self.x_basis.evaluate(&column, &second, x))
    }
}

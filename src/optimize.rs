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

//! Derivative-free one dimensional minimization and root finding.
//!
//! The minimizer first expands a downhill bracket from two starting abscissae
//! and then refines the minimum with Brent's method (parabolic interpolation
//! safeguarded by golden-section steps), see Press et al., _Numerical Recipes_, §10.1–10.2.

use crate::{Error, Result};

/// Golden ratio used to magnify bracket steps
const GOLDEN: f64 = 1.618034;
/// Golden-section fraction, (3 - √5) / 2
const GOLDEN_SECTION: f64 = 0.381_966_0;
/// Guards against division by a vanishing parabola
const TINY: f64 = 1e-21;
/// Absolute floor added to the relative tolerance in Brent's method
const MIN_TOLERANCE: f64 = 1e-11;

/// Three abscissae with `f(b) < f(a)` and `f(b) < f(c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub fa: f64,
    pub fb: f64,
    pub fc: f64,
}

/// Settings for [`minimize`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrentConfig {
    /// First starting point of the bracket search (default: 0)
    pub start: f64,
    /// Second starting point of the bracket search (default: 1)
    pub second: f64,
    /// Relative tolerance on the abscissa (default: 1.48e-8)
    pub tolerance: f64,
    /// Maximum Brent iterations (default: 500)
    pub max_iterations: usize,
    /// Maximum bracket expansions (default: 1000)
    pub max_bracket_iterations: usize,
    /// Largest parabolic step allowed during bracketing, in units of the current step (default: 110)
    pub grow_limit: f64,
}

impl Default for BrentConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            second: 1.0,
            tolerance: 1.48e-8,
            max_iterations: 500,
            max_bracket_iterations: 1000,
            grow_limit: 110.0,
        }
    }
}

/// Search downhill from `(start, second)` until a minimum is enclosed.
pub fn bracket<F>(f: &mut F, start: f64, second: f64, config: &BrentConfig) -> Result<Bracket>
where
    F: FnMut(f64) -> f64,
{
    let (mut xa, mut xb) = (start, second);
    let (mut fa, mut fb) = (f(xa), f(xb));
    if fa < fb {
        std::mem::swap(&mut xa, &mut xb);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut xc = xb + GOLDEN * (xb - xa);
    let mut fc = f(xc);
    let mut iterations = 0;

    while fc < fb {
        let tmp1 = (xb - xa) * (fb - fc);
        let tmp2 = (xb - xc) * (fb - fa);
        let val = tmp2 - tmp1;
        let denom = if val.abs() < TINY { 2.0 * TINY } else { 2.0 * val };
        let mut w = xb - ((xb - xc) * tmp2 - (xb - xa) * tmp1) / denom;
        let wlim = xb + config.grow_limit * (xc - xb);
        if iterations > config.max_bracket_iterations {
            return Err(Error::NoConvergence(format!(
                "no bracket found after {} iterations",
                config.max_bracket_iterations
            )));
        }
        iterations += 1;

        let mut fw;
        if (w - xc) * (xb - w) > 0.0 {
            // parabolic minimum between b and c
            fw = f(w);
            if fw < fc {
                return Ok(ordered(xb, w, xc, fb, fw, fc));
            } else if fw > fb {
                return Ok(ordered(xa, xb, w, fa, fb, fw));
            }
            w = xc + GOLDEN * (xc - xb);
            fw = f(w);
        } else if (w - wlim) * (wlim - xc) >= 0.0 {
            w = wlim;
            fw = f(w);
        } else if (w - wlim) * (xc - w) > 0.0 {
            fw = f(w);
            if fw < fc {
                xb = xc;
                xc = w;
                w = xc + GOLDEN * (xc - xb);
                fb = fc;
                fc = fw;
                fw = f(w);
            }
        } else {
            w = xc + GOLDEN * (xc - xb);
            fw = f(w);
        }
        xa = xb;
        xb = xc;
        xc = w;
        fa = fb;
        fb = fc;
        fc = fw;
    }
    if !(fa.is_finite() && fb.is_finite() && fc.is_finite()) {
        return Err(Error::NoConvergence(
            "non-finite function value while bracketing".to_string(),
        ));
    }
    Ok(ordered(xa, xb, xc, fa, fb, fc))
}

fn ordered(a: f64, b: f64, c: f64, fa: f64, fb: f64, fc: f64) -> Bracket {
    Bracket { a, b, c, fa, fb, fc }
}

/// Minimize `f` with Brent's method, returning the abscissa of the minimum.
///
/// # Examples
/// ~~~
/// use staeckel_grid::optimize::{minimize, BrentConfig};
/// let x = minimize(|x: f64| (x - 2.5).powi(2) + 1.0, &BrentConfig::default()).unwrap();
/// assert!((x - 2.5).abs() < 1e-6);
/// ~~~
pub fn minimize<F>(mut f: F, config: &BrentConfig) -> Result<f64>
where
    F: FnMut(f64) -> f64,
{
    let brack = bracket(&mut f, config.start, config.second, config)?;
    brent(&mut f, &brack, config)
}

/// Refine a bracketed minimum with Brent's method.
pub fn brent<F>(f: &mut F, brack: &Bracket, config: &BrentConfig) -> Result<f64>
where
    F: FnMut(f64) -> f64,
{
    let (mut a, mut b) = if brack.a < brack.c {
        (brack.a, brack.c)
    } else {
        (brack.c, brack.a)
    };
    let (mut x, mut w, mut v) = (brack.b, brack.b, brack.b);
    let mut fx = brack.fb;
    let (mut fw, mut fv) = (fx, fx);
    let mut deltax: f64 = 0.0;
    let mut rat: f64 = 0.0;

    for _ in 0..config.max_iterations {
        let tol1 = config.tolerance * x.abs() + MIN_TOLERANCE;
        let tol2 = 2.0 * tol1;
        let xmid = 0.5 * (a + b);
        if (x - xmid).abs() < (tol2 - 0.5 * (b - a)) {
            return Ok(x);
        }
        if deltax.abs() <= tol1 {
            deltax = if x >= xmid { a - x } else { b - x };
            rat = GOLDEN_SECTION * deltax;
        } else {
            // parabolic fit through x, w, v
            let tmp1 = (x - w) * (fx - fv);
            let mut tmp2 = (x - v) * (fx - fw);
            let mut p = (x - v) * tmp2 - (x - w) * tmp1;
            tmp2 = 2.0 * (tmp2 - tmp1);
            if tmp2 > 0.0 {
                p = -p;
            }
            tmp2 = tmp2.abs();
            let dx_previous = deltax;
            deltax = rat;
            if p > tmp2 * (a - x) && p < tmp2 * (b - x) && p.abs() < (0.5 * tmp2 * dx_previous).abs()
            {
                rat = p / tmp2;
                let u = x + rat;
                if (u - a) < tol2 || (b - u) < tol2 {
                    rat = if xmid - x >= 0.0 { tol1 } else { -tol1 };
                }
            } else {
                deltax = if x >= xmid { a - x } else { b - x };
                rat = GOLDEN_SECTION * deltax;
            }
        }

        let u = if rat.abs() < tol1 {
            if rat >= 0.0 {
                x + tol1
            } else {
                x - tol1
            }
        } else {
            x + rat
        };
        let fu = f(u);

        if fu > fx {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                w = u;
                fv = fw;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        } else {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            w = x;
            x = u;
            fv = fw;
            fw = fx;
            fx = fu;
        }
    }
    Err(Error::NoConvergence(format!(
        "Brent minimizer exceeded {} iterations",
        config.max_iterations
    )))
}

/// Find a root of `f` in `[lower, upper]` by bisection.
///
/// The interval must bracket a sign change.
pub fn bisect<F>(f: F, lower: f64, upper: f64, tolerance: f64, max_iterations: usize) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = (lower, upper);
    let (mut f_lo, f_hi) = (f(lo), f(hi));
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() || f_lo.is_nan() || f_hi.is_nan() {
        return Err(Error::NoConvergence(format!(
            "root not bracketed in [{lower}, {upper}]"
        )));
    }
    for _ in 0..max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || 0.5 * (hi - lo) < tolerance * mid.abs().max(1.0) {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Err(Error::NoConvergence(format!(
        "bisection exceeded {max_iterations} iterations"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bracket_encloses_minimum() {
        let mut f = |x: f64| (x - 7.0).powi(2);
        let b = bracket(&mut f, 0.0, 1.0, &BrentConfig::default()).unwrap();
        let (lo, hi) = (b.a.min(b.c), b.a.max(b.c));
        assert!(lo < 7.0 && 7.0 < hi);
        assert!(b.fb <= b.fa && b.fb <= b.fc);
    }

    #[test]
    fn test_brent_quadratic() {
        let x = minimize(|x: f64| (x + 3.2).powi(2) - 4.0, &BrentConfig::default()).unwrap();
        assert_relative_eq!(x, -3.2, epsilon = 1e-6);
    }

    #[test]
    fn test_brent_nonpolynomial() {
        // minimum of exp(x) - x at x = 0
        let x = minimize(|x: f64| x.exp() - x, &BrentConfig::default()).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        let x = minimize(|x: f64| x.cosh() + 0.5 * x, &BrentConfig::default()).unwrap();
        assert_relative_eq!(x, (-0.5f64).asinh(), epsilon = 1e-6);
    }

    #[test]
    fn test_unbounded_fails() {
        let result = minimize(|x: f64| -x, &BrentConfig::default());
        assert!(matches!(result, Err(Error::NoConvergence(_))));
    }

    #[test]
    fn test_bisect() {
        let root = bisect(|x| x * x - 2.0, 0.0, 10.0, 1e-14, 200).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-12);
        assert!(bisect(|x| x * x + 1.0, -1.0, 1.0, 1e-12, 100).is_err());
    }
}

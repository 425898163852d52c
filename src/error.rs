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

//! Error types for grid construction and queries.

/// Errors raised while building or querying an action grid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required construction parameter was not given
    #[error("must specify {0} to build an action grid")]
    MissingConfiguration(&'static str),
    /// A construction parameter is out of range
    #[error("invalid grid configuration: {0}")]
    InvalidConfiguration(String),
    /// Requested behavior that is not supported
    #[error("not supported: {0}")]
    Unsupported(String),
    /// The exact solver met an orbit that is not bound
    #[error("orbit is unbound")]
    UnboundOrbit,
    /// A minimizer or root finder did not converge
    #[error("no convergence: {0}")]
    NoConvergence(String),
    /// Query point lies outside the interpolation grid
    #[error("not supported: point outside the grid (Lz = {lz}, energy fraction = {energy_fraction})")]
    OutsideGrid { lz: f64, energy_fraction: f64 },
    /// Query path that has never been implemented
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    /// Batch input sequences differ in length
    #[error("batch input length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    /// Spline knots or values are malformed
    #[error("invalid spline input: {0}")]
    InvalidSpline(String),
    /// Any other failure reported by an exact action solver
    #[error(transparent)]
    Solver(#[from] anyhow::Error),
}

/// Result type with [`Error`] as the error variant
pub type Result<T> = std::result::Result<T, Error>;

/// Signal returned by an [`crate::ActionSolver`] for orbits that are not bound.
///
/// Solvers report failures through `anyhow::Result`; the grid builder
/// recognizes this marker and aborts with [`Error::UnboundOrbit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("orbit is unbound")]
pub struct UnboundOrbit;

impl Error {
    /// Classify a solver failure, lifting the unbound signal to its own variant
    pub(crate) fn from_solver(err: anyhow::Error) -> Self {
        if err.downcast_ref::<UnboundOrbit>().is_some() {
            Self::UnboundOrbit
        } else {
            Self::Solver(err)
        }
    }
}

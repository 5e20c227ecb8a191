//! # Frontier Math
//!
//! Numerical kernels for the Frontier portfolio optimization library.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Dense vector helpers and KKT system solves
//! - **Solvers**: Bracketing root finding (Brent)
//! - **Optimization**: Bound- and equality-constrained quadratic programming
//!   (active-set and projected-gradient strategies behind one trait)
//!
//! ## Design Philosophy
//!
//! - **Small dense problems**: Tuned for universes of a few dozen assets
//! - **Numerical Stability**: Explicit tolerances, clamping of round-off
//! - **Honest failure**: Non-convergence is reported, not hidden

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{dot, mat_vec, quadratic_form};
    pub use crate::optimization::{
        ActiveSetSolver, ProjectedGradientSolver, QpConfig, QpSolution, QuadraticProblem,
        QuadraticSolver, SolverKind,
    };
    pub use crate::solvers::{brent, SolverConfig, SolverResult};
}

pub use error::{MathError, MathResult};

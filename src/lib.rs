//! A symbolic Gaussian elimination engine.
//!
//! An [`AugmentedMatrix`] is built from raw text cells, each parsed into an
//! exact symbolic [`Expression`] (arbitrary-precision rationals, no floating
//! point). [`eliminate`] reduces it to row echelon form and back substitutes,
//! narrating every pivot choice, row swap and row operation in a [`Trace`],
//! including the `≠0` conditions any parametric pivot imposes on the answer.
//!
//! ```rust
//! use elimination::solve_report;
//!
//! // x + y = 3, x - y = 1
//! let cells = [["1", "1", "3"], ["1", "-1", "1"]];
//! let report = solve_report(2, 2, |row, column| cells[row][column])?;
//!
//! assert!(report.ends_with("General solution: X = (2, 1)"));
//! # Ok::<(), elimination::ReportError>(())
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
mod eliminate;
mod format;
mod matrix;

pub use crate::{
    algebra::{
        equals, normalize, normalize_within, parse, Expression, Limits,
        NormalizeError, ParseError, Symbol,
    },
    eliminate::{
        eliminate, eliminate_with, solve_report, Elimination,
        EliminationError, ReportError, Trace,
    },
    format::{format_expression, format_matrix, format_system},
    matrix::{
        AugmentedMatrix, BuildError, CellError, DimensionError, UNKNOWNS,
    },
};

//! The augmented-matrix model: an r x (c+1) table of parsed expressions plus
//! the fixed pool of unknown names.

use crate::algebra::{parse, Expression, ParseError};
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    ops::{Index, IndexMut},
};

/// The pool of unknown names, in column order. Systems can never have more
/// unknowns than this pool has names.
pub const UNKNOWNS: [&str; 8] = ["x", "y", "z", "w", "v", "u", "p", "q"];

/// An augmented matrix of symbolic expressions, rows * (unknowns + 1) cells
/// laid out row-major. The final column is the right-hand side.
#[derive(Clone, PartialEq)]
pub struct AugmentedMatrix {
    cells: Box<[Expression]>,
    rows: usize,
    unknowns: usize,
}

impl AugmentedMatrix {
    /// Parse a table of raw text cells into a matrix.
    ///
    /// The unknown count is validated against the [`UNKNOWNS`] pool before
    /// any cell is looked at; a cell that fails to parse aborts construction
    /// with its 1-indexed coordinates.
    pub fn from_cells<F, S>(
        rows: usize,
        unknowns: usize,
        mut get_cell: F,
    ) -> Result<Self, BuildError>
    where
        F: FnMut(usize, usize) -> S,
        S: AsRef<str>,
    {
        if unknowns == 0 || unknowns > UNKNOWNS.len() {
            return Err(BuildError::Dimension(DimensionError { unknowns }));
        }

        let columns = unknowns + 1;
        let mut cells = Vec::with_capacity(rows * columns);

        for row in 0..rows {
            for column in 0..columns {
                let text = get_cell(row, column);
                let expr = parse(text.as_ref()).map_err(|source| {
                    BuildError::Cell(CellError {
                        row: row + 1,
                        column: column + 1,
                        source,
                    })
                })?;
                cells.push(expr);
            }
        }

        Ok(AugmentedMatrix {
            cells: cells.into_boxed_slice(),
            rows,
            unknowns,
        })
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn unknowns(&self) -> usize { self.unknowns }

    pub fn columns(&self) -> usize { self.unknowns + 1 }

    /// The names of this system's unknowns, one per coefficient column.
    pub fn unknown_names(&self) -> &'static [&'static str] {
        &UNKNOWNS[..self.unknowns]
    }

    /// Can this system be eliminated? The engine only handles one equation
    /// per unknown.
    pub fn is_square(&self) -> bool { self.rows == self.unknowns }

    fn index(&self, row: usize, column: usize) -> usize {
        row * self.columns() + column
    }

    /// Iterate over the rows as slices of cells.
    pub fn row_slices(&self) -> impl Iterator<Item = &[Expression]> + '_ {
        self.cells.chunks_exact(self.columns())
    }

    pub(crate) fn swap_rows(&mut self, a: usize, b: usize) {
        assert!(a < self.rows, "Row index out of bounds");
        assert!(b < self.rows, "Row index out of bounds");

        if a == b {
            return;
        }

        for column in 0..self.columns() {
            let a = self.index(a, column);
            let b = self.index(b, column);
            self.cells.swap(a, b);
        }
    }
}

impl Debug for AugmentedMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.row_slices()).finish()
    }
}

impl Index<(usize, usize)> for AugmentedMatrix {
    type Output = Expression;

    fn index(&self, (row, column): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows, "Row index out of bounds");
        assert!(column < self.columns(), "Column index out of bounds");

        &self.cells[row * self.columns() + column]
    }
}

impl IndexMut<(usize, usize)> for AugmentedMatrix {
    fn index_mut(
        &mut self,
        (row, column): (usize, usize),
    ) -> &mut Self::Output {
        assert!(row < self.rows, "Row index out of bounds");
        assert!(column < self.columns(), "Column index out of bounds");

        let index = self.index(row, column);
        &mut self.cells[index]
    }
}

/// Why a matrix couldn't be built from its raw text cells.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    Dimension(DimensionError),
    Cell(CellError),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Dimension(inner) => Display::fmt(inner, f),
            BuildError::Cell(inner) => Display::fmt(inner, f),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BuildError::Dimension(inner) => Some(inner),
            BuildError::Cell(inner) => Some(inner),
        }
    }
}

/// The requested unknown count doesn't fit the [`UNKNOWNS`] name pool.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionError {
    pub unknowns: usize,
}

impl Display for DimensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a system must have between 1 and {} unknowns, got {}",
            UNKNOWNS.len(),
            self.unknowns
        )
    }
}

impl Error for DimensionError {}

/// A cell whose text is not a well-formed expression. Coordinates are
/// 1-indexed, the way they are reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    pub row: usize,
    pub column: usize,
    pub source: ParseError,
}

impl Display for CellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error in cell ({}, {}): {}",
            self.row, self.column, self.source
        )
    }
}

impl Error for CellError {
    fn source(&self) -> Option<&(dyn Error + 'static)> { Some(&self.source) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_cells(row: usize, column: usize) -> String {
        format!("{}", row * 10 + column)
    }

    #[test]
    fn build_a_matrix_from_text() {
        let matrix = AugmentedMatrix::from_cells(2, 2, |row, column| {
            [["1", "1", "3"], ["1", "-1", "1"]][row][column]
        })
        .unwrap();

        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.unknowns(), 2);
        assert_eq!(matrix.columns(), 3);
        assert_eq!(matrix.unknown_names(), &["x", "y"]);
        assert_eq!(matrix[(0, 2)], Expression::integer(3));
        assert_eq!(matrix[(1, 1)], -Expression::integer(1));
    }

    #[test]
    fn empty_cells_parse_to_zero() {
        let matrix =
            AugmentedMatrix::from_cells(1, 1, |_, _| "").unwrap();

        assert_eq!(matrix[(0, 0)], Expression::integer(0));
        assert_eq!(matrix[(0, 1)], Expression::integer(0));
    }

    #[test]
    fn a_bad_cell_is_reported_with_its_coordinates() {
        let err = AugmentedMatrix::from_cells(2, 2, |row, column| {
            if (row, column) == (1, 2) {
                "1 +"
            } else {
                "1"
            }
        })
        .unwrap_err();

        match err {
            BuildError::Cell(CellError { row, column, .. }) => {
                // 1-indexed
                assert_eq!((row, column), (2, 3));
            },
            other => panic!("Expected a cell error, got {:?}", other),
        }
    }

    #[test]
    fn the_dimension_guard_fires_before_any_parsing() {
        // every cell is invalid, so getting a DimensionError (not a
        // CellError) proves no cell was parsed
        let err = AugmentedMatrix::from_cells(3, 9, |_, _| "((")
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::Dimension(DimensionError { unknowns: 9 })
        );

        let err = AugmentedMatrix::from_cells(3, 0, |_, _| "((")
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::Dimension(DimensionError { unknowns: 0 })
        );
    }

    #[test]
    fn swapping_rows() {
        let mut matrix =
            AugmentedMatrix::from_cells(2, 2, numbered_cells).unwrap();
        let original = matrix.clone();

        matrix.swap_rows(0, 1);

        assert_eq!(matrix[(0, 0)], original[(1, 0)]);
        assert_eq!(matrix[(1, 2)], original[(0, 2)]);

        // swapping back restores the original
        matrix.swap_rows(1, 0);
        assert_eq!(matrix, original);
    }
}

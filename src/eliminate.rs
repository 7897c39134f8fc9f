//! The elimination engine: pivot selection, forward elimination and back
//! substitution over symbolic entries, narrating every step it takes.

use crate::{
    algebra::{
        normalize_within, Expression, Limits, NormalizeError, Symbol,
    },
    format::{format_matrix_within, format_system_within},
    matrix::{AugmentedMatrix, BuildError},
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// An append-only log of narration lines. The joined log is the artifact the
/// caller displays; nothing is ever reordered or removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trace {
    lines: Vec<String>,
}

impl Trace {
    fn new() -> Self { Trace::default() }

    fn push<S: Into<String>>(&mut self, line: S) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) { self.lines.push(String::new()); }

    pub fn lines(&self) -> &[String] { &self.lines }

    /// The final report: every line joined with line breaks.
    pub fn join(&self) -> String { self.lines.join("\n") }
}

/// The outcome of a successful elimination run.
#[derive(Debug, Clone, PartialEq)]
pub struct Elimination {
    pub trace: Trace,
    /// One expression per unknown, in [`UNKNOWNS`][crate::UNKNOWNS] order.
    /// An entry that is the bare unknown symbol marks a free variable.
    pub solution: Vec<Expression>,
}

/// Fatal failures. Singular pivots and indeterminate solutions are *not*
/// errors - they are narrated in the trace and the run carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum EliminationError {
    /// The engine only eliminates square systems, one equation per unknown.
    NotSquare { rows: usize, unknowns: usize },
    Normalize(NormalizeError),
}

impl From<NormalizeError> for EliminationError {
    fn from(e: NormalizeError) -> Self { EliminationError::Normalize(e) }
}

impl Display for EliminationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EliminationError::NotSquare { rows, unknowns } => write!(
                f,
                "expected one equation per unknown, got {} equations for {} \
                 unknowns",
                rows, unknowns
            ),
            EliminationError::Normalize(inner) => Display::fmt(inner, f),
        }
    }
}

impl Error for EliminationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EliminationError::Normalize(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Run Gaussian elimination with the default [`Limits`].
///
/// The input matrix is cloned up front; the caller's copy is never mutated.
pub fn eliminate(
    matrix: &AugmentedMatrix,
) -> Result<Elimination, EliminationError> {
    eliminate_with(matrix, &Limits::default())
}

/// Run Gaussian elimination, bounding how large any normalized entry may
/// grow.
pub fn eliminate_with(
    matrix: &AugmentedMatrix,
    limits: &Limits,
) -> Result<Elimination, EliminationError> {
    if !matrix.is_square() {
        return Err(EliminationError::NotSquare {
            rows: matrix.rows(),
            unknowns: matrix.unknowns(),
        });
    }

    let engine = Eliminator {
        matrix: matrix.clone(),
        trace: Trace::new(),
        conditions: Vec::new(),
        limits,
    };

    engine.run()
}

struct Eliminator<'a> {
    matrix: AugmentedMatrix,
    trace: Trace,
    /// Every `"<pivot>≠0"` assertion collected so far, re-narrated in full
    /// after each row operation.
    conditions: Vec<String>,
    limits: &'a Limits,
}

impl<'a> Eliminator<'a> {
    fn run(mut self) -> Result<Elimination, EliminationError> {
        self.trace.push("System of equations:");
        self.trace
            .push(format_system_within(&self.matrix, self.limits)?);
        self.trace.blank();
        self.trace.push("Solution by Gaussian elimination:");
        self.trace.blank();
        self.trace
            .push("Reducing the augmented matrix to row echelon form:");
        self.narrate_matrix()?;
        self.trace.blank();

        for column in 0..self.matrix.rows() {
            let pivot = match self.select_pivot(column)? {
                Some(pivot) => pivot,
                None => continue,
            };

            self.conditions.push(format!("{}≠0", pivot));
            self.eliminate_below(column, &pivot)?;
        }

        self.trace.push("Row echelon form:");
        self.narrate_matrix()?;
        self.trace.blank();

        let solution = self.back_substitute()?;

        self.trace.push("Final answer:");
        let names = self.matrix.unknown_names();
        for (name, value) in names.iter().zip(&solution) {
            self.trace.push(format!("  {} = {}", name, value));
        }
        let tuple: Vec<_> =
            solution.iter().map(ToString::to_string).collect();
        self.trace
            .push(format!("General solution: X = ({})", tuple.join(", ")));

        Ok(Elimination {
            trace: self.trace,
            solution,
        })
    }

    /// Choose a pivot for `column` and swap it into place.
    ///
    /// A row whose entry is the literal 1 is preferred over everything else;
    /// failing that, any row with a nonzero entry will do. Returns `None`
    /// (after narrating a warning) when the column has no usable pivot at
    /// all, in which case it is left un-eliminated.
    fn select_pivot(
        &mut self,
        column: usize,
    ) -> Result<Option<Expression>, EliminationError> {
        let n = self.matrix.rows();

        let mut best = column;
        for row in column..n {
            if self.normalized(row, column)?.is_one() {
                best = row;
                break;
            }
        }
        if best != column {
            self.matrix.swap_rows(column, best);
            self.trace.push(format!(
                "Swap R{} and R{}:",
                column + 1,
                best + 1
            ));
            self.narrate_matrix()?;
            self.trace.blank();
        }

        let mut pivot = self.normalized(column, column)?;

        if pivot.is_zero() {
            let mut best = column;
            for row in column + 1..n {
                if !self.normalized(row, column)?.is_zero() {
                    best = row;
                    break;
                }
            }

            if best != column {
                self.matrix.swap_rows(column, best);
                self.trace.push(format!(
                    "Swap R{} and R{} (zero pivot):",
                    column + 1,
                    best + 1
                ));
                self.narrate_matrix()?;
                self.trace.blank();
                pivot = self.normalized(column, column)?;
            } else {
                self.trace.push(format!(
                    "Warning: no nonzero pivot found in column {}.",
                    column + 1
                ));
                return Ok(None);
            }
        }

        Ok(Some(pivot))
    }

    /// Annihilate every entry below the pivot, narrating each row operation
    /// together with the matrix and the conditions collected so far.
    fn eliminate_below(
        &mut self,
        column: usize,
        pivot: &Expression,
    ) -> Result<(), EliminationError> {
        let n = self.matrix.rows();

        for row in column + 1..n {
            if pivot.is_zero() {
                // never divide blindly
                continue;
            }

            let current = self.normalized(row, column)?;
            let factor =
                self.normalize(&(current / pivot.clone()))?;

            self.trace.push(format!(
                "Subtract ({})*R{} from R{}:",
                factor,
                column + 1,
                row + 1
            ));

            for c in column..=n {
                let updated = self.matrix[(row, c)].clone()
                    - factor.clone() * self.matrix[(column, c)].clone();
                let updated = self.normalize(&updated)?;
                self.matrix[(row, c)] = updated;
            }

            self.narrate_matrix()?;
            self.trace.push(format!(
                "Accumulated conditions: {}",
                self.conditions.join(", ")
            ));
            self.trace.blank();
        }

        Ok(())
    }

    /// Solve for the unknowns from the last row upward. A zero diagonal
    /// entry leaves that unknown free: it is bound to its own symbol and
    /// narrated as indeterminate rather than treated as an error.
    fn back_substitute(
        &mut self,
    ) -> Result<Vec<Expression>, EliminationError> {
        let n = self.matrix.rows();
        let names = self.matrix.unknown_names();

        self.trace
            .push("Solving the system by back substitution:");

        let mut solution = vec![Expression::integer(0); n];

        for row in (0..n).rev() {
            let mut residual = self.normalized(row, n)?;
            for j in row + 1..n {
                let subtracted = residual
                    - self.matrix[(row, j)].clone() * solution[j].clone();
                residual = self.normalize(&subtracted)?;
            }

            let diagonal = self.normalized(row, row)?;

            self.trace.push(format!("From equation {}:", row + 1));
            self.trace.push(format!(
                "{}*{} = {}",
                diagonal, names[row], residual
            ));

            if diagonal.is_zero() {
                self.trace.push(
                    "  (division by zero → the solution is indeterminate \
                     or infinite)",
                );
                solution[row] = Expression::Symbol(Symbol::named(names[row]));
            } else {
                solution[row] = self.normalize(&(residual / diagonal))?;
            }

            self.trace.push(format!(
                "Solution: {} = {}",
                names[row], solution[row]
            ));
            self.trace.blank();
        }

        Ok(solution)
    }

    fn normalize(
        &self,
        expr: &Expression,
    ) -> Result<Expression, EliminationError> {
        Ok(normalize_within(expr, self.limits)?)
    }

    fn normalized(
        &self,
        row: usize,
        column: usize,
    ) -> Result<Expression, EliminationError> {
        self.normalize(&self.matrix[(row, column)])
    }

    fn narrate_matrix(&mut self) -> Result<(), EliminationError> {
        let rendered = format_matrix_within(&self.matrix, self.limits)?;
        self.trace.push(rendered);
        Ok(())
    }
}

/// The single-string interface for front ends: a table of raw text cells in,
/// the full narrated report out.
///
/// Every failure comes back as a [`ReportError`] whose `Display` form is the
/// message to show; no partial trace survives a fatal error.
pub fn solve_report<F, S>(
    rows: usize,
    unknowns: usize,
    get_cell: F,
) -> Result<String, ReportError>
where
    F: FnMut(usize, usize) -> S,
    S: AsRef<str>,
{
    let matrix = AugmentedMatrix::from_cells(rows, unknowns, get_cell)?;
    let elimination = eliminate(&matrix)?;
    Ok(elimination.trace.join())
}

/// Everything that can abort a [`solve_report`] run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    Build(BuildError),
    Elimination(EliminationError),
}

impl From<BuildError> for ReportError {
    fn from(e: BuildError) -> Self { ReportError::Build(e) }
}

impl From<EliminationError> for ReportError {
    fn from(e: EliminationError) -> Self { ReportError::Elimination(e) }
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Build(inner) => Display::fmt(inner, f),
            ReportError::Elimination(inner) => {
                write!(f, "error while solving the system: {}", inner)
            },
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReportError::Build(inner) => Some(inner),
            ReportError::Elimination(inner) => Some(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(cells: &[&[&str]]) -> AugmentedMatrix {
        AugmentedMatrix::from_cells(
            cells.len(),
            cells[0].len() - 1,
            |row, column| cells[row][column],
        )
        .unwrap()
    }

    fn rendered_solution(elimination: &Elimination) -> Vec<String> {
        elimination
            .solution
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn solve_a_concrete_2x2_system() {
        // x + y = 3, x - y = 1  =>  x = 2, y = 1
        let matrix = matrix(&[&["1", "1", "3"], &["1", "-1", "1"]]);

        let got = eliminate(&matrix).unwrap();

        assert_eq!(rendered_solution(&got), vec!["2", "1"]);

        let report = got.trace.join();
        assert!(report.ends_with("General solution: X = (2, 1)"));
    }

    #[test]
    fn the_callers_matrix_is_never_mutated() {
        let original = matrix(&[&["2", "1", "4"], &["1", "1", "3"]]);
        let before = original.clone();

        eliminate(&original).unwrap();

        assert_eq!(original, before);
    }

    #[test]
    fn a_literal_one_is_preferred_as_pivot() {
        // row 2 has the literal 1 in column 1, so it gets swapped up even
        // though row 1's entry is a perfectly good nonzero pivot
        let matrix = matrix(&[&["2", "1", "4"], &["1", "1", "3"]]);

        let got = eliminate(&matrix).unwrap();

        assert!(got
            .trace
            .lines()
            .iter()
            .any(|line| line == "Swap R1 and R2:"));
        assert_eq!(rendered_solution(&got), vec!["1", "2"]);
    }

    #[test]
    fn a_dead_column_is_narrated_and_skipped() {
        let matrix = matrix(&[&["0", "1", "2"], &["0", "1", "3"]]);

        let got = eliminate(&matrix).unwrap();

        assert!(got.trace.lines().iter().any(|line| {
            line == "Warning: no nonzero pivot found in column 1."
        }));
    }

    #[test]
    fn a_zero_diagonal_leaves_the_unknown_free() {
        let matrix = matrix(&[&["0", "1", "2"], &["0", "1", "3"]]);

        let got = eliminate(&matrix).unwrap();

        // x is indeterminate, so it stays bound to its own symbol
        assert_eq!(got.solution[0], Expression::symbol("x"));
        let report = got.trace.join();
        assert!(report.contains("indeterminate"));
        assert!(report.ends_with("General solution: X = (x, 3)"));
    }

    #[test]
    fn a_zero_pivot_is_swapped_away() {
        let matrix = matrix(&[&["0", "2", "2"], &["3", "0", "6"]]);

        let got = eliminate(&matrix).unwrap();

        assert!(got
            .trace
            .lines()
            .iter()
            .any(|line| line == "Swap R1 and R2 (zero pivot):"));
        assert_eq!(rendered_solution(&got), vec!["2", "1"]);
    }

    #[test]
    fn parametric_pivots_accumulate_conditions() {
        let matrix = matrix(&[&["a", "1", "1"], &["2", "1", "3"]]);

        let got = eliminate(&matrix).unwrap();

        let conditions: Vec<_> = got
            .trace
            .lines()
            .iter()
            .filter(|line| line.starts_with("Accumulated conditions:"))
            .collect();
        assert!(!conditions.is_empty());
        assert!(conditions.iter().all(|line| line.contains("a≠0")));
    }

    #[test]
    fn parametric_solutions_come_back_reduced() {
        // a symmetric system whose solution collapses to 1/(a + 2) once
        // the common factors are cancelled
        let matrix = matrix(&[
            &["a", "1", "1", "1"],
            &["1", "a", "1", "1"],
            &["1", "1", "a", "1"],
        ]);

        let got = eliminate(&matrix).unwrap();

        assert_eq!(
            rendered_solution(&got),
            vec!["1/(a + 2)", "1/(a + 2)", "1/(a + 2)"]
        );
    }

    #[test]
    fn the_narration_follows_the_algorithm() {
        let matrix = matrix(&[&["1", "1", "3"], &["1", "-1", "1"]]);

        let got = eliminate(&matrix).unwrap();
        let lines = got.trace.lines();

        let expected_events = vec![
            "System of equations:",
            "1*x + 1*y = 3",
            "Solution by Gaussian elimination:",
            "Reducing the augmented matrix to row echelon form:",
            "[ 1   1   3 ]",
            "Subtract (1)*R1 from R2:",
            "Accumulated conditions: 1≠0",
            "Row echelon form:",
            "[ 1   1   3 ]\n[ 0   -2   -2 ]",
            "Solving the system by back substitution:",
            "From equation 2:",
            "-2*y = -2",
            "Solution: y = 1",
            "From equation 1:",
            "1*x = 2",
            "Solution: x = 2",
            "Final answer:",
            "  x = 2",
            "  y = 1",
            "General solution: X = (2, 1)",
        ];

        // every expected event appears, in order
        let mut cursor = 0;
        for event in expected_events {
            let position = lines[cursor..].iter().position(|line| {
                line == event || line.contains(event)
            });
            match position {
                Some(offset) => cursor += offset + 1,
                None => panic!(
                    "expected {:?} after line {} in:\n{}",
                    event,
                    cursor,
                    got.trace.join()
                ),
            }
        }
    }

    #[test]
    fn non_square_systems_are_refused() {
        let matrix = matrix(&[&["1", "1", "3"]]);

        let got = eliminate(&matrix);

        assert_eq!(
            got,
            Err(EliminationError::NotSquare {
                rows: 1,
                unknowns: 2,
            })
        );
    }

    #[test]
    fn a_division_by_zero_in_a_cell_is_fatal() {
        let matrix = matrix(&[&["1/0", "1", "1"], &["1", "1", "2"]]);

        let got = eliminate(&matrix);

        assert_eq!(
            got,
            Err(EliminationError::Normalize(
                NormalizeError::DivisionByZero
            ))
        );
    }

    #[test]
    fn the_term_limit_aborts_with_an_error() {
        let matrix =
            matrix(&[&["(x1 + 1)^9", "1", "1"], &["1", "1", "2"]]);
        let limits = Limits { max_terms: 4 };

        let got = eliminate_with(&matrix, &limits);

        assert_eq!(
            got,
            Err(EliminationError::Normalize(
                NormalizeError::TermLimitExceeded { limit: 4 }
            ))
        );
    }

    #[test]
    fn solve_report_round_trip() {
        let cells = [["1", "1", "3"], ["1", "-1", "1"]];

        let report =
            solve_report(2, 2, |row, column| cells[row][column]).unwrap();

        assert!(report.starts_with("System of equations:"));
        assert!(report.ends_with("General solution: X = (2, 1)"));
    }

    #[test]
    fn solve_report_surfaces_cell_errors() {
        let cells = [["1", "1 +", "3"], ["1", "-1", "1"]];

        let err = solve_report(2, 2, |row, column| cells[row][column])
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("cell (1, 2)"), "{}", message);
    }

    #[test]
    fn solve_report_surfaces_the_dimension_guard() {
        let err = solve_report(9, 9, |_, _| "1").unwrap_err();

        let message = err.to_string();
        assert!(message.contains("between 1 and 8"), "{}", message);
    }
}

//! Single-line renderings of expressions, matrices and whole systems, used
//! for every line of the narration.

use crate::{
    algebra::{normalize_within, Expression, Limits, NormalizeError},
    matrix::AugmentedMatrix,
};

/// Render one expression: simplify, combine over a common denominator, then
/// print in canonical term order.
pub fn format_expression(
    expr: &Expression,
) -> Result<String, NormalizeError> {
    format_expression_within(expr, &Limits::default())
}

pub(crate) fn format_expression_within(
    expr: &Expression,
    limits: &Limits,
) -> Result<String, NormalizeError> {
    Ok(normalize_within(expr, limits)?.to_string())
}

/// Render a matrix one row per line, e.g. `[ a   1   1 ]`.
pub fn format_matrix(
    matrix: &AugmentedMatrix,
) -> Result<String, NormalizeError> {
    format_matrix_within(matrix, &Limits::default())
}

pub(crate) fn format_matrix_within(
    matrix: &AugmentedMatrix,
    limits: &Limits,
) -> Result<String, NormalizeError> {
    let mut lines = Vec::with_capacity(matrix.rows());

    for row in matrix.row_slices() {
        let cells = row
            .iter()
            .map(|cell| format_expression_within(cell, limits))
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(format!("[ {} ]", cells.join("   ")));
    }

    Ok(lines.join("\n"))
}

/// Render the system of equations a matrix stands for, one equation per
/// line, e.g. `a*x + 1*y = 1`.
pub fn format_system(
    matrix: &AugmentedMatrix,
) -> Result<String, NormalizeError> {
    format_system_within(matrix, &Limits::default())
}

pub(crate) fn format_system_within(
    matrix: &AugmentedMatrix,
    limits: &Limits,
) -> Result<String, NormalizeError> {
    let names = matrix.unknown_names();
    let mut lines = Vec::with_capacity(matrix.rows());

    for row in 0..matrix.rows() {
        let mut terms = Vec::with_capacity(matrix.unknowns());

        for (column, name) in names.iter().enumerate() {
            let coefficient = format_expression_within(
                &matrix[(row, column)],
                limits,
            )?;
            terms.push(format!("{}*{}", coefficient, name));
        }

        let rhs = format_expression_within(
            &matrix[(row, matrix.unknowns())],
            limits,
        )?;
        lines.push(format!("{} = {}", terms.join(" + "), rhs));
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::parse;
    use crate::matrix::AugmentedMatrix;

    #[test]
    fn expressions_are_normalized_before_rendering() {
        let expr = parse("x + x + 1").unwrap();
        assert_eq!(format_expression(&expr).unwrap(), "2*x + 1");
    }

    #[test]
    fn matrix_layout() {
        let matrix = AugmentedMatrix::from_cells(2, 2, |row, column| {
            [["a", "1", "1"], ["1", "-1", "2 + 3"]][row][column]
        })
        .unwrap();

        let got = format_matrix(&matrix).unwrap();

        assert_eq!(got, "[ a   1   1 ]\n[ 1   -1   5 ]");
    }

    #[test]
    fn system_layout() {
        let matrix = AugmentedMatrix::from_cells(2, 2, |row, column| {
            [["a", "1", "1"], ["1", "-1", "2"]][row][column]
        })
        .unwrap();

        let got = format_system(&matrix).unwrap();

        assert_eq!(got, "a*x + 1*y = 1\n1*x + -1*y = 2");
    }
}

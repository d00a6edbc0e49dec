use crate::error::GraphGradError;
use crate::matrix::Matrix;

// Pivots smaller than this are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Solves the square system `a @ x = b` by Gaussian elimination with
/// partial pivoting.
///
/// # Errors
/// `ShapeMismatch` when `a` is not square or `b` has the wrong length;
/// `RankDeficiency` when no usable pivot exists in some column.
pub fn solve_linear_system(a: &Matrix, b: &[f64]) -> Result<Vec<f64>, GraphGradError> {
    let n = a.rows();
    if a.cols() != n || b.len() != n {
        return Err(GraphGradError::ShapeMismatch {
            left: a.shape(),
            right: (b.len(), 1),
            operation: "solve_linear_system".to_string(),
        });
    }

    // augmented working copy
    let mut work = vec![vec![0.0; n + 1]; n];
    for i in 0..n {
        for j in 0..n {
            work[i][j] = a[(i, j)];
        }
        work[i][n] = b[i];
    }

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if work[row][col].abs() > work[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if work[pivot_row][col].abs() < PIVOT_TOLERANCE {
            return Err(GraphGradError::RankDeficiency { column: col });
        }
        work.swap(col, pivot_row);
        for row in col + 1..n {
            let factor = work[row][col] / work[col][col];
            for j in col..=n {
                work[row][j] -= factor * work[col][j];
            }
        }
    }

    // back substitution
    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        let mut acc = work[col][n];
        for j in col + 1..n {
            acc -= work[col][j] * x[j];
        }
        x[col] = acc / work[col][col];
    }
    Ok(x)
}

/// Ordinary least squares through the normal equations.
///
/// Each row of `xs` is one sample's features; `ys` holds the matching
/// responses. Returns the per-feature weights and the intercept.
pub fn linear_regression(
    xs: &[Vec<f64>],
    ys: &[f64],
) -> Result<(Vec<f64>, f64), GraphGradError> {
    let samples = xs.len();
    if samples == 0 || samples != ys.len() {
        return Err(GraphGradError::ShapeMismatch {
            left: (samples, xs.first().map_or(0, |row| row.len())),
            right: (ys.len(), 1),
            operation: "linear_regression".to_string(),
        });
    }
    let features = xs[0].len();

    // normal equations over the design matrix with a trailing ones column
    let n = features + 1;
    let mut xtx = Matrix::new(n, n);
    let mut xty = vec![0.0; n];
    for (row, &y) in xs.iter().zip(ys) {
        if row.len() != features {
            return Err(GraphGradError::CreationError {
                expected: features,
                actual: row.len(),
            });
        }
        for i in 0..n {
            let xi = if i < features { row[i] } else { 1.0 };
            xty[i] += xi * y;
            for j in 0..n {
                let xj = if j < features { row[j] } else { 1.0 };
                xtx[(i, j)] += xi * xj;
            }
        }
    }

    let mut solution = solve_linear_system(&xtx, &xty)?;
    let intercept = solution.pop().unwrap_or(0.0);
    Ok((solution, intercept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solves_a_well_conditioned_system() {
        let a = Matrix::from_rows(vec![vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let x = solve_linear_system(&a, &[5.0, 10.0]).unwrap();
        assert_relative_eq!(x[0], 1.0, max_relative = 1e-12);
        assert_relative_eq!(x[1], 3.0, max_relative = 1e-12);
    }

    #[test]
    fn pivoting_handles_a_zero_leading_entry() {
        let a = Matrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let x = solve_linear_system(&a, &[2.0, 3.0]).unwrap();
        assert_relative_eq!(x[0], 3.0);
        assert_relative_eq!(x[1], 2.0);
    }

    #[test]
    fn singular_systems_report_rank_deficiency() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(matches!(
            solve_linear_system(&a, &[1.0, 2.0]),
            Err(GraphGradError::RankDeficiency { column: 1 })
        ));
    }

    #[test]
    fn non_square_systems_are_rejected() {
        let a = Matrix::new(2, 3);
        assert!(matches!(
            solve_linear_system(&a, &[0.0, 0.0]),
            Err(GraphGradError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn regression_recovers_an_exact_line() {
        let xs: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let ys: Vec<f64> = xs.iter().map(|row| 2.0 * row[0] + 1.0).collect();
        let (weights, intercept) = linear_regression(&xs, &ys).unwrap();
        assert_relative_eq!(weights[0], 2.0, max_relative = 1e-9);
        assert_relative_eq!(intercept, 1.0, max_relative = 1e-9);
    }

    #[test]
    fn regression_recovers_two_features() {
        let xs = vec![
            vec![1.0, 2.0],
            vec![2.0, 1.0],
            vec![3.0, 5.0],
            vec![4.0, 2.0],
            vec![0.5, -1.0],
        ];
        let ys: Vec<f64> = xs.iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 0.5).collect();
        let (weights, intercept) = linear_regression(&xs, &ys).unwrap();
        assert_relative_eq!(weights[0], 3.0, max_relative = 1e-9);
        assert_relative_eq!(weights[1], -2.0, max_relative = 1e-9);
        assert_relative_eq!(intercept, 0.5, epsilon = 1e-9);
    }
}

use approx::assert_abs_diff_eq;
use graphgrad_core::{Matrix, Var};

const EPSILON: f64 = 1e-6;
const TOLERANCE: f64 = 1e-6;

// Central finite difference of `loss` as a function of one entry of `leaf`.
fn numerical_slope(loss: &Var, leaf: &Var, entry: (usize, usize)) -> f64 {
    let original = leaf.value();

    let mut plus = original.clone();
    plus[entry] += EPSILON;
    leaf.set_value(plus);
    loss.evaluate().unwrap();
    let loss_plus = loss.value()[(0, 0)];

    let mut minus = original.clone();
    minus[entry] -= EPSILON;
    leaf.set_value(minus);
    loss.evaluate().unwrap();
    let loss_minus = loss.value()[(0, 0)];

    leaf.set_value(original);
    (loss_plus - loss_minus) / (2.0 * EPSILON)
}

#[test]
fn matmul_gradients_match_finite_differences() {
    let x = Var::new(
        Matrix::from_rows(vec![
            vec![0.5, -1.0],
            vec![2.0, 0.25],
            vec![-0.75, 1.5],
        ])
        .unwrap(),
    );
    let w = Var::new(Matrix::from_rows(vec![vec![1.25, -0.5], vec![0.75, 2.0]]).unwrap());

    let loss = x.matmul(&w).mean();
    loss.evaluate().unwrap();
    loss.zero_grad();
    loss.backward().unwrap();
    let x_grad = x.grad().unwrap();
    let w_grad = w.grad().unwrap();

    for row in 0..3 {
        for col in 0..2 {
            let slope = numerical_slope(&loss, &x, (row, col));
            assert_abs_diff_eq!(x_grad[(row, col)], slope, epsilon = TOLERANCE);
        }
    }
    for row in 0..2 {
        for col in 0..2 {
            let slope = numerical_slope(&loss, &w, (row, col));
            assert_abs_diff_eq!(w_grad[(row, col)], slope, epsilon = TOLERANCE);
        }
    }
}

#[test]
fn elementwise_chain_gradients_match_finite_differences() {
    let x = Var::new(Matrix::from_rows(vec![vec![0.4, -0.8], vec![1.2, -0.3]]).unwrap());
    let y = Var::new(Matrix::from_rows(vec![vec![2.0, 1.5], vec![-0.5, 3.0]]).unwrap());

    // mix of elementwise ops and a unary nonlinearity
    let loss = (&(&x * &y) + &x.tanh()).mean();
    loss.evaluate().unwrap();
    loss.zero_grad();
    loss.backward().unwrap();
    let x_grad = x.grad().unwrap();
    let y_grad = y.grad().unwrap();

    for row in 0..2 {
        for col in 0..2 {
            let slope_x = numerical_slope(&loss, &x, (row, col));
            assert_abs_diff_eq!(x_grad[(row, col)], slope_x, epsilon = TOLERANCE);
            let slope_y = numerical_slope(&loss, &y, (row, col));
            assert_abs_diff_eq!(y_grad[(row, col)], slope_y, epsilon = TOLERANCE);
        }
    }
}

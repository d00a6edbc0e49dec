use super::{Op, Var};
use crate::matrix::Matrix;

/// Leaf filled with zeros.
pub fn zeros(rows: usize, cols: usize) -> Var {
    Var::new(Matrix::new(rows, cols))
}

/// Leaf filled with ones.
pub fn ones(rows: usize, cols: usize) -> Var {
    Var::new(Matrix::full(rows, cols, 1.0))
}

/// Leaf filled with `value`.
pub fn full(rows: usize, cols: usize, value: f64) -> Var {
    Var::new(Matrix::full(rows, cols, value))
}

/// Non-trainable leaf filled with `value`.
pub fn constant(rows: usize, cols: usize, value: f64) -> Var {
    let var = full(rows, cols, value);
    var.set_requires_grad(false);
    var
}

/// Graph node that evaluates to a ones matrix shaped like `source`.
pub fn ones_like(source: &Var) -> Var {
    Var::from_op(Op::OnesLike, Some(source.operand()), None)
}

/// Graph node that evaluates to a ones column with `source`'s row count.
///
/// Multiplying it by a `1 x n` bias row broadcasts the bias across a batch.
pub fn ones_column(source: &Var) -> Var {
    Var::from_op(Op::OnesColumn, Some(source.operand()), None)
}

/// Graph node that evaluates to `source`'s shape filled with `value`.
pub fn full_like(source: &Var, value: f64) -> Var {
    let var = Var::from_op(Op::Fill, None, Some(source.operand()));
    var.node.borrow_mut().scalar = value;
    var
}

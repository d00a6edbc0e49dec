use super::{Op, Var};
use std::ops::{Add, Div, Mul, Sub};

// Operator application is pure graph construction: each call canonicalizes
// its inputs and allocates a fresh tagged node above them. Shapes are only
// checked when the graph is evaluated.

impl Var {
    fn binary(&self, rhs: &Var, op: Op) -> Var {
        Var::from_op(op, Some(self.operand()), Some(rhs.operand()))
    }

    fn unary(&self, op: Op) -> Var {
        Var::from_op(op, Some(self.operand()), None)
    }

    /// Records a matrix product of `self` and `rhs`.
    pub fn matmul(&self, rhs: &Var) -> Var {
        self.binary(rhs, Op::MatMul)
    }

    /// Records an elementwise `max(x, 0)`.
    pub fn relu(&self) -> Var {
        self.unary(Op::Relu)
    }

    /// Records an elementwise hyperbolic tangent.
    pub fn tanh(&self) -> Var {
        self.unary(Op::Tanh)
    }

    /// Records an elementwise absolute value.
    pub fn abs(&self) -> Var {
        self.unary(Op::Abs)
    }

    /// Records a reduction to the `1 x 1` mean of all entries.
    pub fn mean(&self) -> Var {
        self.unary(Op::Mean)
    }

    /// Rebinds this handle to `rhs` without disturbing graphs that already
    /// reference the handle's previous canonical node.
    ///
    /// The rebinding is itself a graph node (the alias operation) whose
    /// single operand is `rhs`'s canonical node; the handle's alias slot is
    /// repointed at it. This is how recurrent state is carried across time
    /// steps.
    pub fn rebind(&self, rhs: &Var) {
        let assigned = Var::from_op(Op::Assign, Some(rhs.operand()), None);
        self.node.borrow_mut().alias = Some(assigned);
    }
}

impl Add<&Var> for &Var {
    type Output = Var;

    fn add(self, rhs: &Var) -> Var {
        self.binary(rhs, Op::Add)
    }
}

impl Sub<&Var> for &Var {
    type Output = Var;

    fn sub(self, rhs: &Var) -> Var {
        self.binary(rhs, Op::Sub)
    }
}

/// Elementwise (Hadamard) product.
impl Mul<&Var> for &Var {
    type Output = Var;

    fn mul(self, rhs: &Var) -> Var {
        self.binary(rhs, Op::Mul)
    }
}

/// Elementwise quotient.
impl Div<&Var> for &Var {
    type Output = Var;

    fn div(self, rhs: &Var) -> Var {
        self.binary(rhs, Op::Div)
    }
}

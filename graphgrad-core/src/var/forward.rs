use super::{Op, Var, VarData};
use crate::error::GraphGradError;
use crate::matrix::Matrix;
use log::trace;
use std::cell::RefCell;
use std::collections::HashSet;

impl Var {
    /// Recomputes every value reachable from this node.
    ///
    /// The walk is depth-first and post-order, memoized per call so a node
    /// shared by several paths is computed once. Nothing is cached across
    /// calls: evaluating again after changing a leaf or stepping the
    /// optimizer reflects the new state.
    pub fn evaluate(&self) -> Result<(), GraphGradError> {
        let root = self.resolve();
        trace!("evaluate: fresh traversal from {:?}", root.id());
        let mut visited = HashSet::new();
        root.eval_node(&mut visited)
    }

    fn eval_node(
        &self,
        visited: &mut HashSet<*const RefCell<VarData>>,
    ) -> Result<(), GraphGradError> {
        if !visited.insert(self.id()) {
            return Ok(());
        }
        let (op, scalar, lhs, rhs) = {
            let data = self.node.borrow();
            (data.op, data.scalar, data.lhs.clone(), data.rhs.clone())
        };
        if let Some(ref a) = lhs {
            a.eval_node(visited)?;
        }
        if let Some(ref b) = rhs {
            b.eval_node(visited)?;
        }

        let computed = if op == Op::Leaf {
            None
        } else {
            let a = lhs.as_ref().map(|v| v.node.borrow().value.clone());
            let b = rhs.as_ref().map(|v| v.node.borrow().value.clone());
            Some(compute(op, scalar, a, b)?)
        };

        let mut data = self.node.borrow_mut();
        if let Some(value) = computed {
            data.value = value;
        }
        if data.requires_grad && data.grad.is_none() {
            let (rows, cols) = data.value.shape();
            data.grad = Some(Matrix::new(rows, cols));
        }
        Ok(())
    }
}

fn compute(
    op: Op,
    scalar: f64,
    a: Option<Matrix>,
    b: Option<Matrix>,
) -> Result<Matrix, GraphGradError> {
    match (op, a, b) {
        (Op::Assign, Some(a), _) => Ok(a),
        (Op::Add, Some(a), Some(b)) => a.add(&b),
        (Op::Sub, Some(a), Some(b)) => a.sub(&b),
        (Op::Mul, Some(a), Some(b)) => a.mul(&b),
        (Op::Div, Some(a), Some(b)) => a.div(&b),
        (Op::MatMul, Some(a), Some(b)) => a.matmul(&b),
        (Op::Relu, Some(a), _) => Ok(a.relu()),
        (Op::Tanh, Some(a), _) => Ok(a.map(f64::tanh)),
        (Op::Abs, Some(a), _) => Ok(a.map(f64::abs)),
        (Op::Fill, _, Some(b)) => {
            let (rows, cols) = b.shape();
            Ok(Matrix::full(rows, cols, scalar))
        }
        (Op::OnesLike, Some(a), _) => {
            let (rows, cols) = a.shape();
            Ok(Matrix::full(rows, cols, 1.0))
        }
        (Op::OnesColumn, Some(a), _) => Ok(Matrix::full(a.rows(), 1, 1.0)),
        (Op::Mean, Some(a), _) => Ok(Matrix::full(1, 1, a.mean())),
        _ => unreachable!("operator recorded without its operands"),
    }
}

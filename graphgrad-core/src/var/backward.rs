use super::{Op, Var};
use crate::error::GraphGradError;
use crate::matrix::Matrix;
use log::trace;

impl Var {
    /// Clears every allocated gradient reachable through `requires_grad`
    /// nodes, preparing for the next backward pass. Gradients that were
    /// never allocated stay unallocated.
    pub fn zero_grad(&self) {
        self.resolve().clear_grad();
    }

    fn clear_grad(&self) {
        let (lhs, rhs) = {
            let mut data = self.node.borrow_mut();
            if let Some(grad) = data.grad.as_mut() {
                grad.clear();
            }
            (data.lhs.clone(), data.rhs.clone())
        };
        if let Some(a) = lhs {
            if a.node.borrow().requires_grad {
                a.clear_grad();
            }
        }
        if let Some(b) = rhs {
            if b.node.borrow().requires_grad {
                b.clear_grad();
            }
        }
    }

    /// Seeds a ones gradient at this node and distributes it to ancestors
    /// through the per-operation derivative rules.
    ///
    /// The walk deliberately carries no visited set: a node reachable along
    /// two paths receives one contribution per path, each computed from the
    /// parent's gradient at the time of the call. Deduplicating here would
    /// under-count genuinely shared subexpressions.
    pub fn backward(&self) -> Result<(), GraphGradError> {
        let root = self.resolve();
        trace!("backward: seeding ones at {:?}", root.id());
        {
            let mut data = root.node.borrow_mut();
            let (rows, cols) = data.value.shape();
            data.grad = Some(Matrix::full(rows, cols, 1.0));
        }
        root.propagate()
    }

    fn propagate(&self) -> Result<(), GraphGradError> {
        let (op, lhs, rhs, grad) = {
            let data = self.node.borrow();
            let grad = data.grad.clone().unwrap_or_else(|| {
                let (rows, cols) = data.value.shape();
                Matrix::new(rows, cols)
            });
            (data.op, data.lhs.clone(), data.rhs.clone(), grad)
        };
        let value_of = |v: &Var| v.node.borrow().value.clone();

        if let Some(ref a) = lhs {
            if a.node.borrow().requires_grad {
                match op {
                    Op::Add | Op::Sub => accumulate(a, grad.clone())?,
                    Op::Mul => {
                        if let Some(ref b) = rhs {
                            accumulate(a, value_of(b).mul(&grad)?)?;
                        }
                    }
                    Op::Div => {
                        if let Some(ref b) = rhs {
                            accumulate(a, grad.div(&value_of(b))?)?;
                        }
                    }
                    Op::MatMul => {
                        if let Some(ref b) = rhs {
                            accumulate(a, grad.matmul(&value_of(b).transpose())?)?;
                        }
                    }
                    Op::Relu => {
                        let mask = value_of(a).map(|x| if x > 0.0 { 1.0 } else { 0.0 });
                        accumulate(a, mask.mul(&grad)?)?;
                    }
                    Op::Tanh => {
                        let derivative = value_of(a).map(|x| 1.0 - x.tanh() * x.tanh());
                        accumulate(a, derivative.mul(&grad)?)?;
                    }
                    Op::Abs => {
                        let sign = value_of(a).map(|x| {
                            if x > 0.0 {
                                1.0
                            } else if x < 0.0 {
                                -1.0
                            } else {
                                0.0
                            }
                        });
                        accumulate(a, sign.mul(&grad)?)?;
                    }
                    // The mean rule replaces rather than accumulates: the
                    // source receives a uniform 1/(rows*cols) matrix.
                    Op::Mean => {
                        let (rows, cols) = value_of(a).shape();
                        overwrite(a, Matrix::full(rows, cols, 1.0 / (rows * cols) as f64));
                    }
                    // Rebinding also replaces: the gradient passes through
                    // the alias node verbatim.
                    Op::Assign => overwrite(a, grad.clone()),
                    Op::Leaf | Op::Fill | Op::OnesLike | Op::OnesColumn => {}
                }
                a.propagate()?;
            }
        }

        if let Some(ref b) = rhs {
            if b.node.borrow().requires_grad {
                match op {
                    Op::Add => accumulate(b, grad.clone())?,
                    Op::Sub => accumulate(b, grad.map(|x| -x))?,
                    Op::Mul => {
                        if let Some(ref a) = lhs {
                            accumulate(b, value_of(a).mul(&grad)?)?;
                        }
                    }
                    Op::Div => {
                        if let Some(ref a) = lhs {
                            let b_val = value_of(b);
                            let delta = value_of(a).div(&b_val.mul(&b_val)?)?.mul(&grad)?;
                            accumulate(b, delta.map(|x| -x))?;
                        }
                    }
                    Op::MatMul => {
                        if let Some(ref a) = lhs {
                            accumulate(b, value_of(a).transpose().matmul(&grad)?)?;
                        }
                    }
                    // Unary and shape-source operands collect nothing here;
                    // the recursion below still descends through them.
                    _ => {}
                }
                b.propagate()?;
            }
        }
        Ok(())
    }
}

fn accumulate(target: &Var, delta: Matrix) -> Result<(), GraphGradError> {
    let mut data = target.node.borrow_mut();
    match data.grad.take() {
        Some(existing) => data.grad = Some(existing.add(&delta)?),
        None => data.grad = Some(delta),
    }
    Ok(())
}

fn overwrite(target: &Var, grad: Matrix) {
    target.node.borrow_mut().grad = Some(grad);
}

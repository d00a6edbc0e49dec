use super::{Var, VarData};
use crate::error::GraphGradError;
use crate::matrix::Matrix;
use log::debug;
use std::cell::RefCell;
use std::collections::HashSet;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// First-order update rule applied by the optimizer walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimizer {
    Sgd,
    Adam,
}

impl Var {
    /// Updates every parameter node reachable from this one.
    ///
    /// Unlike `backward`, distinct nodes are visited once per call, so a
    /// parameter shared by several paths receives exactly one update. Nodes
    /// without an allocated gradient are left untouched.
    pub fn optimize(&self, kind: Optimizer, learning_rate: f64) -> Result<(), GraphGradError> {
        let root = self.resolve();
        debug!("optimize: {:?} step, lr {}", kind, learning_rate);
        let mut visited = HashSet::new();
        root.step(kind, learning_rate, &mut visited)
    }

    fn step(
        &self,
        kind: Optimizer,
        lr: f64,
        visited: &mut HashSet<*const RefCell<VarData>>,
    ) -> Result<(), GraphGradError> {
        if !visited.insert(self.id()) {
            return Ok(());
        }
        let (lhs, rhs) = {
            let mut data = self.node.borrow_mut();
            if data.is_parameter {
                match kind {
                    Optimizer::Sgd => sgd_update(&mut data, lr),
                    Optimizer::Adam => adam_update(&mut data, lr),
                }
            }
            (data.lhs.clone(), data.rhs.clone())
        };
        if let Some(a) = lhs {
            if a.node.borrow().requires_grad {
                a.step(kind, lr, visited)?;
            }
        }
        if let Some(b) = rhs {
            if b.node.borrow().requires_grad {
                b.step(kind, lr, visited)?;
            }
        }
        Ok(())
    }
}

fn sgd_update(data: &mut VarData, lr: f64) {
    let grad = match data.grad.as_ref() {
        Some(g) => g,
        None => return,
    };
    assert_eq!(data.value.shape(), grad.shape());
    for (value, g) in data.value.as_mut_slice().iter_mut().zip(grad.as_slice()) {
        *value -= lr * g;
    }
}

fn adam_update(data: &mut VarData, lr: f64) {
    let grad = match data.grad.clone() {
        Some(g) => g,
        None => return,
    };
    assert_eq!(data.value.shape(), grad.shape());
    data.adam_steps += 1;
    let (rows, cols) = data.value.shape();
    if data.first_moment.is_empty() {
        data.first_moment = Matrix::new(rows, cols);
    }
    if data.second_moment.is_empty() {
        data.second_moment = Matrix::new(rows, cols);
    }

    let bias1 = 1.0 - ADAM_BETA1.powi(data.adam_steps as i32);
    let bias2 = 1.0 - ADAM_BETA2.powi(data.adam_steps as i32);

    let g = grad.as_slice();
    let m = data.first_moment.as_mut_slice();
    let v = data.second_moment.as_mut_slice();
    let value = data.value.as_mut_slice();
    for i in 0..value.len() {
        m[i] = ADAM_BETA1 * m[i] + (1.0 - ADAM_BETA1) * g[i];
        v[i] = ADAM_BETA2 * v[i] + (1.0 - ADAM_BETA2) * g[i] * g[i];
        let m_hat = m[i] / bias1;
        let v_hat = v[i] / bias2;
        value[i] -= lr * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var::create;
    use approx::assert_abs_diff_eq;

    // Builds `w * 2` so one backward pass leaves grad = 2 on the parameter.
    fn doubled_parameter() -> (Var, Var) {
        let w = Var::new(Matrix::full(1, 1, 10.0));
        w.set_parameter(true);
        let c = create::constant(1, 1, 2.0);
        let z = &w * &c;
        z.evaluate().unwrap();
        z.zero_grad();
        z.backward().unwrap();
        (w, z)
    }

    #[test]
    fn sgd_update_exact_arithmetic() {
        let (w, z) = doubled_parameter();
        assert_eq!(w.grad().unwrap()[(0, 0)], 2.0);
        z.optimize(Optimizer::Sgd, 0.1).unwrap();
        assert_abs_diff_eq!(w.value()[(0, 0)], 9.8, epsilon = 1e-12);
    }

    #[test]
    fn sgd_skips_nodes_without_a_gradient() {
        let w = Var::new(Matrix::full(1, 1, 10.0));
        w.set_parameter(true);
        let z = &w + &w;
        // no evaluate/backward: nothing to apply
        z.optimize(Optimizer::Sgd, 0.1).unwrap();
        assert_eq!(w.value()[(0, 0)], 10.0);
    }

    #[test]
    fn a_shared_parameter_is_updated_once() {
        let w = Var::new(Matrix::full(1, 1, 10.0));
        w.set_parameter(true);
        let z = &w + &w;
        z.evaluate().unwrap();
        z.zero_grad();
        z.backward().unwrap();
        assert_eq!(w.grad().unwrap()[(0, 0)], 2.0);
        z.optimize(Optimizer::Sgd, 0.1).unwrap();
        // visited set: one update with grad 2, not two
        assert_abs_diff_eq!(w.value()[(0, 0)], 9.8, epsilon = 1e-12);
    }

    #[test]
    fn adam_first_step_matches_the_closed_form() {
        let w = Var::new(Matrix::full(1, 1, 10.0));
        w.set_parameter(true);
        // mean over a 1x1 value leaves grad = 1 on the parameter
        let z = w.mean();
        z.evaluate().unwrap();
        z.zero_grad();
        z.backward().unwrap();
        assert_eq!(w.grad().unwrap()[(0, 0)], 1.0);

        z.optimize(Optimizer::Adam, 0.001).unwrap();

        let canonical = w.resolve();
        let data = canonical.node.borrow();
        assert_abs_diff_eq!(data.first_moment[(0, 0)], 0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(data.second_moment[(0, 0)], 0.001, epsilon = 1e-15);
        assert_eq!(data.adam_steps, 1);

        // m_hat = 0.1/(1-0.9) = 1, v_hat = 0.001/(1-0.999) = 1
        let expected = 10.0 - 0.001 * 1.0 / (1.0f64.sqrt() + 1e-8);
        assert_abs_diff_eq!(data.value[(0, 0)], expected, epsilon = 1e-12);
    }

    #[test]
    fn adam_state_persists_across_steps() {
        let w = Var::new(Matrix::full(1, 1, 10.0));
        w.set_parameter(true);
        let z = w.mean();
        for _ in 0..3 {
            z.evaluate().unwrap();
            z.zero_grad();
            z.backward().unwrap();
            z.optimize(Optimizer::Adam, 0.001).unwrap();
        }
        let canonical = w.resolve();
        assert_eq!(canonical.node.borrow().adam_steps, 3);
    }

    #[test]
    fn non_parameters_are_never_touched() {
        let x = Var::new(Matrix::full(1, 1, 5.0));
        let z = x.mean();
        z.evaluate().unwrap();
        z.zero_grad();
        z.backward().unwrap();
        z.optimize(Optimizer::Sgd, 0.5).unwrap();
        assert_eq!(x.value()[(0, 0)], 5.0);
    }
}

use crate::nn::module::Module;
use crate::var::Var;

/// Rectified linear unit as a stateless module.
#[derive(Default)]
pub struct ReLU;

impl ReLU {
    pub fn new() -> Self {
        ReLU
    }
}

impl Module for ReLU {
    fn forward(&self, input: &Var) -> Var {
        input.relu()
    }

    fn parameters(&self) -> Vec<Var> {
        Vec::new()
    }
}

/// Hyperbolic tangent as a stateless module.
#[derive(Default)]
pub struct Tanh;

impl Tanh {
    pub fn new() -> Self {
        Tanh
    }
}

impl Module for Tanh {
    fn forward(&self, input: &Var) -> Var {
        input.tanh()
    }

    fn parameters(&self) -> Vec<Var> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn relu_module_matches_the_graph_op() {
        let x = Var::new(Matrix::from_rows(vec![vec![-2.0, 3.0]]).unwrap());
        let out = ReLU::new().forward(&x);
        out.evaluate().unwrap();
        assert_eq!(out.value().as_slice(), &[0.0, 3.0]);
    }

    #[test]
    fn tanh_module_matches_the_graph_op() {
        let x = Var::new(Matrix::from_rows(vec![vec![0.0, 1.0]]).unwrap());
        let out = Tanh::new().forward(&x);
        out.evaluate().unwrap();
        assert_eq!(out.value()[(0, 0)], 0.0);
        assert_eq!(out.value()[(0, 1)], 1.0f64.tanh());
    }
}

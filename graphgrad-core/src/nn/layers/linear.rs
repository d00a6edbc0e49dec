use crate::nn::module::Module;
use crate::var::{create, Var};
use rand::Rng;

/// Fully connected layer: `y = x @ w`, plus a bias row broadcast across the
/// batch through a ones column when enabled.
pub struct Linear {
    weight: Var,
    bias: Option<Var>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Creates a layer with normally distributed weights drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        bias: bool,
        rng: &mut R,
    ) -> Self {
        let weight = Var::randn(in_features, out_features, 0.0, 1.0, rng);
        weight.set_parameter(true);
        let bias = bias.then(|| {
            let row = Var::randn(1, out_features, 0.0, 1.0, rng);
            row.set_parameter(true);
            row
        });
        Linear {
            weight,
            bias,
            in_features,
            out_features,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// The `in_features x out_features` weight handle.
    pub fn weight(&self) -> &Var {
        &self.weight
    }

    /// The `1 x out_features` bias row handle, when biased.
    pub fn bias(&self) -> Option<&Var> {
        self.bias.as_ref()
    }
}

impl Module for Linear {
    fn forward(&self, input: &Var) -> Var {
        let output = input.matmul(&self.weight);
        match self.bias {
            Some(ref bias_row) => {
                let batch_ones = create::ones_column(input);
                &output + &batch_ones.matmul(bias_row)
            }
            None => output,
        }
    }

    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.weight.clone()];
        if let Some(ref bias_row) = self.bias {
            params.push(bias_row.clone());
        }
        params
    }
}

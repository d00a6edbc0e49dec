use crate::nn::module::Module;
use crate::var::{create, Var};
use rand::Rng;

/// Single-layer recurrent cell carrying its hidden state as a rebindable
/// handle.
///
/// `forward` records `x @ w_ih + h @ w_hh (+ bias)` against the hidden state
/// the handle currently resolves to, and parks the result in a pending
/// handle. `cycle` then rebinds the state to the pending value, so graphs
/// recorded in earlier steps keep referencing the hidden state they saw
/// while the next step builds on the new one.
pub struct Rnn {
    weight_ih: Var,
    weight_hh: Var,
    bias: Option<Var>,
    nonlinearity: bool,
    hidden_size: usize,
    state: Var,
    pending: Var,
}

impl Rnn {
    pub fn new<R: Rng + ?Sized>(
        in_features: usize,
        hidden_size: usize,
        bias: bool,
        nonlinearity: bool,
        rng: &mut R,
    ) -> Self {
        let weight_ih = Var::randn(in_features, hidden_size, 0.0, 1.0, rng);
        weight_ih.set_parameter(true);
        let weight_hh = Var::randn(hidden_size, hidden_size, 0.0, 1.0, rng);
        weight_hh.set_parameter(true);
        let bias = bias.then(|| {
            let row = Var::randn(1, hidden_size, 0.0, 1.0, rng);
            row.set_parameter(true);
            row
        });
        Rnn {
            weight_ih,
            weight_hh,
            bias,
            nonlinearity,
            hidden_size,
            state: create::zeros(1, hidden_size),
            pending: create::zeros(1, hidden_size),
        }
    }

    /// Rebinds the hidden state to zeros for a new sequence of `batch` rows.
    pub fn reset(&self, batch: usize) {
        let cleared = create::zeros(batch, self.hidden_size);
        self.state.rebind(&cleared);
        self.pending.rebind(&cleared);
    }

    /// The current hidden-state handle.
    pub fn state(&self) -> &Var {
        &self.state
    }

    /// Promotes the last forward's hidden state for the next time step.
    pub fn cycle(&self) {
        self.state.rebind(&self.pending);
    }

    pub fn weight_ih(&self) -> &Var {
        &self.weight_ih
    }

    pub fn weight_hh(&self) -> &Var {
        &self.weight_hh
    }
}

impl Module for Rnn {
    fn forward(&self, input: &Var) -> Var {
        let mut pre = &input.matmul(&self.weight_ih) + &self.state.matmul(&self.weight_hh);
        if let Some(ref bias_row) = self.bias {
            pre = &pre + &create::ones_column(input).matmul(bias_row);
        }
        let next = if self.nonlinearity { pre.tanh() } else { pre };
        self.pending.rebind(&next);
        next
    }

    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.weight_ih.clone(), self.weight_hh.clone()];
        if let Some(ref bias_row) = self.bias {
            params.push(bias_row.clone());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scalar_rnn() -> Rnn {
        let mut rng = StdRng::seed_from_u64(1);
        let rnn = Rnn::new(1, 1, false, false, &mut rng);
        rnn.weight_ih().set_value(Matrix::full(1, 1, 2.0));
        rnn.weight_hh().set_value(Matrix::full(1, 1, 3.0));
        rnn
    }

    #[test]
    fn hidden_state_threads_through_time_steps() {
        let rnn = scalar_rnn();
        rnn.reset(1);

        let x1 = Var::new(Matrix::full(1, 1, 1.0));
        let h1 = rnn.forward(&x1);
        rnn.cycle();
        let x2 = Var::new(Matrix::full(1, 1, 1.0));
        let h2 = rnn.forward(&x2);

        // h1 = 1*2 + 0*3 = 2, h2 = 1*2 + h1*3 = 8
        h2.evaluate().unwrap();
        assert_eq!(h2.value()[(0, 0)], 8.0);
        assert_eq!(h1.value()[(0, 0)], 2.0);
    }

    #[test]
    fn backpropagation_reaches_both_time_steps() {
        let rnn = scalar_rnn();
        rnn.reset(1);

        let x1 = Var::new(Matrix::full(1, 1, 1.0));
        rnn.forward(&x1);
        rnn.cycle();
        let x2 = Var::new(Matrix::full(1, 1, 1.0));
        let h2 = rnn.forward(&x2);

        let loss = h2.mean();
        loss.evaluate().unwrap();
        loss.zero_grad();
        loss.backward().unwrap();

        // dh2/dw_ih = x2 + w_hh * x1 = 1 + 3
        assert_eq!(rnn.weight_ih().grad().unwrap()[(0, 0)], 4.0);
        // dh2/dw_hh = h1 + w_hh * h0 = 2 + 0
        assert_eq!(rnn.weight_hh().grad().unwrap()[(0, 0)], 2.0);
    }

    #[test]
    fn reset_starts_a_fresh_sequence() {
        let rnn = scalar_rnn();
        rnn.reset(1);
        let x = Var::new(Matrix::full(1, 1, 1.0));
        let h1 = rnn.forward(&x);
        rnn.cycle();

        rnn.reset(1);
        let h_fresh = rnn.forward(&x);
        h_fresh.evaluate().unwrap();
        assert_eq!(h_fresh.value()[(0, 0)], 2.0);
        // the first sequence's graph still evaluates against its own state
        h1.evaluate().unwrap();
        assert_eq!(h1.value()[(0, 0)], 2.0);
    }
}

use crate::nn::module::Module;
use crate::var::{create, Var};
use rand::Rng;

/// One gate's affine map: `x @ w_ih + h @ w_hh + bias row`.
struct Gate {
    weight_ih: Var,
    weight_hh: Var,
    bias: Var,
}

impl Gate {
    fn new<R: Rng + ?Sized>(in_features: usize, hidden_size: usize, rng: &mut R) -> Self {
        let weight_ih = Var::randn(in_features, hidden_size, 0.0, 1.0, rng);
        weight_ih.set_parameter(true);
        let weight_hh = Var::randn(hidden_size, hidden_size, 0.0, 1.0, rng);
        weight_hh.set_parameter(true);
        let bias = Var::randn(1, hidden_size, 0.0, 1.0, rng);
        bias.set_parameter(true);
        Gate {
            weight_ih,
            weight_hh,
            bias,
        }
    }

    fn pre_activation(&self, input: &Var, state: &Var) -> Var {
        let affine = &input.matmul(&self.weight_ih) + &state.matmul(&self.weight_hh);
        &affine + &create::ones_column(input).matmul(&self.bias)
    }

    fn parameters(&self) -> Vec<Var> {
        vec![
            self.weight_ih.clone(),
            self.weight_hh.clone(),
            self.bias.clone(),
        ]
    }
}

/// Logistic sigmoid composed from the recorded op set:
/// `sigmoid(z) = 0.5 * (1 + tanh(0.5 * z))`.
fn sigmoid(z: &Var) -> Var {
    let half = create::full_like(z, 0.5);
    let one = create::ones_like(z);
    &(&one + &(z * &half).tanh()) * &half
}

/// LSTM cell with per-gate weight matrices and rebindable state handles.
///
/// Gate equations follow the usual formulation:
/// - `i = sigmoid(x @ w_xi + h @ w_hi + b_i)` (input gate)
/// - `f = sigmoid(x @ w_xf + h @ w_hf + b_f)` (forget gate)
/// - `g = tanh(x @ w_xg + h @ w_hg + b_g)` (cell gate)
/// - `o = sigmoid(x @ w_xo + h @ w_ho + b_o)` (output gate)
/// - `c' = f * c + i * g`
/// - `h' = o * tanh(c')`
///
/// Hidden and cell state are carried across steps with the same
/// `reset`/`cycle` rebinding protocol as [`super::rnn::Rnn`].
pub struct Lstm {
    input_gate: Gate,
    forget_gate: Gate,
    cell_gate: Gate,
    output_gate: Gate,
    hidden_size: usize,
    hidden: Var,
    cell: Var,
    pending_hidden: Var,
    pending_cell: Var,
}

impl Lstm {
    pub fn new<R: Rng + ?Sized>(in_features: usize, hidden_size: usize, rng: &mut R) -> Self {
        Lstm {
            input_gate: Gate::new(in_features, hidden_size, rng),
            forget_gate: Gate::new(in_features, hidden_size, rng),
            cell_gate: Gate::new(in_features, hidden_size, rng),
            output_gate: Gate::new(in_features, hidden_size, rng),
            hidden_size,
            hidden: create::zeros(1, hidden_size),
            cell: create::zeros(1, hidden_size),
            pending_hidden: create::zeros(1, hidden_size),
            pending_cell: create::zeros(1, hidden_size),
        }
    }

    /// Rebinds both states to zeros for a new sequence of `batch` rows.
    pub fn reset(&self, batch: usize) {
        let hidden_start = create::zeros(batch, self.hidden_size);
        let cell_start = create::zeros(batch, self.hidden_size);
        self.hidden.rebind(&hidden_start);
        self.pending_hidden.rebind(&hidden_start);
        self.cell.rebind(&cell_start);
        self.pending_cell.rebind(&cell_start);
    }

    /// Promotes the last forward's states for the next time step.
    pub fn cycle(&self) {
        self.hidden.rebind(&self.pending_hidden);
        self.cell.rebind(&self.pending_cell);
    }

    pub fn hidden(&self) -> &Var {
        &self.hidden
    }

    pub fn cell(&self) -> &Var {
        &self.cell
    }

    fn gates(&self) -> [&Gate; 4] {
        [
            &self.input_gate,
            &self.forget_gate,
            &self.cell_gate,
            &self.output_gate,
        ]
    }
}

impl Module for Lstm {
    fn forward(&self, input: &Var) -> Var {
        let i = sigmoid(&self.input_gate.pre_activation(input, &self.hidden));
        let f = sigmoid(&self.forget_gate.pre_activation(input, &self.hidden));
        let g = self.cell_gate.pre_activation(input, &self.hidden).tanh();
        let o = sigmoid(&self.output_gate.pre_activation(input, &self.hidden));

        let next_cell = &(&f * &self.cell) + &(&i * &g);
        let next_hidden = &o * &next_cell.tanh();
        self.pending_cell.rebind(&next_cell);
        self.pending_hidden.rebind(&next_hidden);
        next_hidden
    }

    fn parameters(&self) -> Vec<Var> {
        self.gates().iter().flat_map(|g| g.parameters()).collect()
    }
}

use crate::var::Var;

/// The base trait for network layers and containers.
pub trait Module {
    /// Records the module's computation on `input` and returns the output
    /// handle. This is pure graph construction; shapes are checked when the
    /// resulting graph is evaluated.
    fn forward(&self, input: &Var) -> Var;

    /// All trainable parameter handles of this module, in declaration order.
    fn parameters(&self) -> Vec<Var>;
}

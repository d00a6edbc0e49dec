pub mod activation;
pub mod linear;
pub mod lstm;
pub mod rnn;

pub use activation::{ReLU, Tanh};

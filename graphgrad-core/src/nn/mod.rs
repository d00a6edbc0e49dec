// Neural-network layers, containers and losses built on the Var graph.

pub mod layers;
pub mod losses;
pub mod module;
pub mod sequential;

pub use layers::linear::Linear;
pub use layers::lstm::Lstm;
pub use layers::rnn::Rnn;
pub use layers::{ReLU, Tanh};
pub use losses::mse_loss;
pub use module::Module;
pub use sequential::Sequential;

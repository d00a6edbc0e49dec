//! GraphGrad: a define-by-run automatic-differentiation engine over dense
//! `f64` matrices.
//!
//! Client code chains operators on [`Var`] handles to record a computation
//! graph, then drives one training step with the four walks: `evaluate`
//! materializes values, `zero_grad` clears gradients, `backward` distributes
//! a seeded gradient through per-operation derivative rules, and `optimize`
//! updates parameter nodes in place (SGD or Adam). A small layer stack
//! ([`nn`]) and linear-solve utilities ([`solve`]) sit on top of the core.

pub mod error;
pub mod matrix;
pub mod nn;
pub mod solve;
pub mod var;

pub use error::GraphGradError;
pub use matrix::Matrix;
pub use var::{Optimizer, Var};

use crate::var::Var;

/// Records the mean-squared-error of `prediction` against `target`.
///
/// The target is frozen (`requires_grad = false`) so the backward and
/// optimizer walks stop at it.
pub fn mse_loss(prediction: &Var, target: &Var) -> Var {
    prediction.set_requires_grad(true);
    target.set_requires_grad(false);

    // Two separate difference nodes over the shared operands: the backward
    // walk then delivers exactly one contribution per factor.
    let diff_a = prediction - target;
    let diff_b = prediction - target;
    (&diff_a * &diff_b).mean()
}

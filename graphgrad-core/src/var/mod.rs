use crate::error::GraphGradError;
use crate::matrix::Matrix;
use rand::Rng;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

mod backward;
pub mod create;
mod forward;
mod ops;
mod optim;

pub use optim::Optimizer;

/// Operation recorded on a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Leaf,
    /// Rebinding marker: the node's value is a verbatim copy of its operand.
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    MatMul,
    Relu,
    Tanh,
    Abs,
    /// Operand-shaped matrix filled with a scalar literal. The shape source
    /// lives in the `rhs` slot.
    Fill,
    OnesLike,
    OnesColumn,
    Mean,
}

/// State shared by every handle onto one graph node.
#[derive(Clone)]
pub(crate) struct VarData {
    pub(crate) value: Matrix,
    pub(crate) grad: Option<Matrix>,
    pub(crate) op: Op,
    pub(crate) lhs: Option<Var>,
    pub(crate) rhs: Option<Var>,
    /// Canonical identity of the logical variable this handle stands for.
    pub(crate) alias: Option<Var>,
    pub(crate) requires_grad: bool,
    pub(crate) is_parameter: bool,
    /// Fill literal for `Op::Fill`.
    pub(crate) scalar: f64,
    // Adam moment estimates, allocated lazily on the first Adam step.
    pub(crate) first_moment: Matrix,
    pub(crate) second_moment: Matrix,
    pub(crate) adam_steps: u64,
}

impl VarData {
    fn with_op(op: Op, lhs: Option<Var>, rhs: Option<Var>) -> Self {
        VarData {
            value: Matrix::default(),
            grad: None,
            op,
            lhs,
            rhs,
            alias: None,
            requires_grad: true,
            is_parameter: false,
            scalar: 0.0,
            first_moment: Matrix::default(),
            second_moment: Matrix::default(),
            adam_steps: 0,
        }
    }
}

/// A handle onto one node of the dynamically recorded computation graph.
///
/// Cloning a `Var` is cheap and yields another handle onto the same node.
/// Operators record fresh nodes instead of computing anything; `evaluate`,
/// `zero_grad`, `backward` and `optimize` are the four walks of one training
/// step.
///
/// Each logical variable is represented in the graph by exactly one
/// *canonical* node. The first time a handle appears as an operand, a
/// canonical node is minted from its state and remembered in the handle's
/// alias slot; later uses share it, so an expression that touches the same
/// variable twice records one subgraph, not two. [`Var::rebind`] points the
/// handle at a new canonical node without disturbing graphs that still
/// reference the previous one.
#[derive(Clone)]
pub struct Var {
    pub(crate) node: Rc<RefCell<VarData>>,
}

impl Var {
    /// Creates a leaf node holding `value`.
    pub fn new(value: Matrix) -> Self {
        let mut data = VarData::with_op(Op::Leaf, None, None);
        data.value = value;
        Var::from_data(data)
    }

    /// Creates a leaf node from nested rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, GraphGradError> {
        Ok(Var::new(Matrix::from_rows(rows)?))
    }

    /// Creates a leaf with normally distributed entries drawn from `rng`.
    pub fn randn<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mean: f64,
        std: f64,
        rng: &mut R,
    ) -> Self {
        Var::new(Matrix::random_normal(rows, cols, mean, std, rng))
    }

    pub(crate) fn from_data(data: VarData) -> Self {
        Var {
            node: Rc::new(RefCell::new(data)),
        }
    }

    pub(crate) fn from_op(op: Op, lhs: Option<Var>, rhs: Option<Var>) -> Self {
        Var::from_data(VarData::with_op(op, lhs, rhs))
    }

    /// Stable address identity of the underlying node.
    pub(crate) fn id(&self) -> *const RefCell<VarData> {
        Rc::as_ptr(&self.node)
    }

    /// Resolves this handle to its canonical graph node.
    ///
    /// A handle with no alias is its own canonical node.
    pub(crate) fn resolve(&self) -> Var {
        let mut current = self.clone();
        loop {
            let next = current.node.borrow().alias.clone();
            match next {
                Some(alias) => current = alias,
                None => return current,
            }
        }
    }

    /// Canonicalizes this handle for use as an operand: reuse the existing
    /// canonical node, or mint one wrapping the handle's current state.
    pub(crate) fn operand(&self) -> Var {
        if self.node.borrow().alias.is_some() {
            return self.resolve();
        }
        let minted = Var::from_data(self.node.borrow().clone());
        self.node.borrow_mut().alias = Some(minted.clone());
        minted
    }

    /// Materialized value of the resolved node (empty until evaluated).
    pub fn value(&self) -> Matrix {
        let node = self.resolve();
        let data = node.node.borrow();
        data.value.clone()
    }

    /// Gradient of the resolved node, if one has been allocated.
    pub fn grad(&self) -> Option<Matrix> {
        let node = self.resolve();
        let data = node.node.borrow();
        data.grad.clone()
    }

    /// Shape of the resolved value; `(0, 0)` before evaluation.
    pub fn shape(&self) -> (usize, usize) {
        let node = self.resolve();
        let data = node.node.borrow();
        data.value.shape()
    }

    pub fn requires_grad(&self) -> bool {
        self.resolve().node.borrow().requires_grad
    }

    /// Controls whether the gradient, zero-grad and optimizer walks descend
    /// into this node.
    pub fn set_requires_grad(&self, requires_grad: bool) {
        self.resolve().node.borrow_mut().requires_grad = requires_grad;
    }

    pub fn is_parameter(&self) -> bool {
        self.resolve().node.borrow().is_parameter
    }

    /// Marks the resolved node as a target of the optimizer walk.
    pub fn set_parameter(&self, is_parameter: bool) {
        self.resolve().node.borrow_mut().is_parameter = is_parameter;
    }

    /// Replaces the resolved node's value in place, e.g. to load a new
    /// batch into an input leaf between evaluations.
    pub fn set_value(&self, value: Matrix) {
        self.resolve().node.borrow_mut().value = value;
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.resolve();
        let data = node.node.borrow();
        f.debug_struct("Var")
            .field("op", &data.op)
            .field("shape", &data.value.shape())
            .field("requires_grad", &data.requires_grad)
            .field("is_parameter", &data.is_parameter)
            .finish()
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.resolve();
        let data = node.node.borrow();
        let (rows, cols) = data.value.shape();
        writeln!(f, "Var({},{})", rows, cols)?;
        write!(f, "{}", data.value)
    }
}

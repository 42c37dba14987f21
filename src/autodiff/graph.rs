//! Computation graph for reverse-mode automatic differentiation.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::var::Var;
use crate::algebra::Scalar;
use crate::backend::Backend;
use crate::error::{EinsumError, EinsumResult};
use crate::tensor::Tensor;

/// Identifier of a node on a [`Tape`].
///
/// Ids are handed out in creation order, so every node's inputs have smaller
/// ids than the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Backward rule of one recorded operation.
///
/// Gradients are built from [`Var`] operations on the same tape, so they are
/// recorded too and can be differentiated again.
pub trait GradFn<T: Scalar, B: Backend>: Debug {
    /// Given the gradient of the output, return gradients for each input
    /// that requires one.
    fn backward(
        &self,
        tape: &Tape<T, B>,
        grad_output: &Var<T, B>,
    ) -> EinsumResult<Vec<(NodeId, Var<T, B>)>>;

    /// Input node ids.
    fn inputs(&self) -> Vec<NodeId>;

    /// Operation name, for logging.
    fn name(&self) -> &'static str;
}

/// A node in the computation graph.
struct Node<T: Scalar, B: Backend> {
    /// Backward function (None for leaves and constants).
    grad_fn: Option<Rc<dyn GradFn<T, B>>>,
    requires_grad: bool,
}

struct Graph<T: Scalar, B: Backend> {
    nodes: Vec<Node<T, B>>,
}

/// Records tracked operations for one differentiation session.
///
/// A tape is a cheap handle; clones share the same graph. Nothing is global:
/// separate tapes are fully independent.
///
/// # Example
///
/// ```rust
/// use einsum2::{autodiff::{grad, Tape}, Cpu, Tensor};
///
/// let tape = Tape::<f64, Cpu>::new();
/// let x = tape.var(Tensor::from_data(&[1.0, 2.0], &[2]));
/// let y = x.mul(&x);
///
/// let dx = grad(&y, &[&x]).unwrap();
/// assert_eq!(dx[0].value().to_vec(), vec![2.0, 4.0]);
/// ```
pub struct Tape<T: Scalar, B: Backend> {
    graph: Rc<RefCell<Graph<T, B>>>,
}

impl<T: Scalar, B: Backend> Clone for Tape<T, B> {
    fn clone(&self) -> Self {
        Self {
            graph: Rc::clone(&self.graph),
        }
    }
}

impl<T: Scalar, B: Backend> Default for Tape<T, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, B: Backend> Tape<T, B> {
    /// Create a new empty tape.
    pub fn new() -> Self {
        Self {
            graph: Rc::new(RefCell::new(Graph { nodes: Vec::new() })),
        }
    }

    /// Track `value` as an input to differentiate with respect to.
    pub fn var(&self, value: Tensor<T, B>) -> Var<T, B> {
        let id = self.push(None, true);
        Var::from_parts(self.clone(), id, value, true)
    }

    /// Track `value` as a constant: no gradient flows into it.
    pub fn constant(&self, value: Tensor<T, B>) -> Var<T, B> {
        let id = self.push(None, false);
        Var::from_parts(self.clone(), id, value, false)
    }

    /// Number of nodes recorded so far.
    pub fn len(&self) -> usize {
        self.graph.borrow().nodes.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if both handles share one graph.
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    pub(crate) fn check_same(&self, other: &Self) -> EinsumResult<()> {
        if self.same_as(other) {
            Ok(())
        } else {
            Err(EinsumError::autodiff("variables belong to different tapes"))
        }
    }

    /// Record the result of an operation.
    ///
    /// When no input requires a gradient the backward rule is dropped and
    /// the result is recorded as a constant.
    pub(crate) fn record(
        &self,
        value: Tensor<T, B>,
        grad_fn: impl GradFn<T, B> + 'static,
        requires_grad: bool,
    ) -> Var<T, B> {
        let grad_fn: Option<Rc<dyn GradFn<T, B>>> = if requires_grad {
            Some(Rc::new(grad_fn))
        } else {
            None
        };
        let id = self.push(grad_fn, requires_grad);
        Var::from_parts(self.clone(), id, value, requires_grad)
    }

    /// Handle to an existing node, carrying a saved copy of its value.
    pub(crate) fn rebind(&self, id: NodeId, value: &Tensor<T, B>) -> Var<T, B> {
        let requires_grad = self.requires_grad(id);
        Var::from_parts(self.clone(), id, value.clone(), requires_grad)
    }

    pub(crate) fn grad_fn(&self, id: NodeId) -> Option<Rc<dyn GradFn<T, B>>> {
        self.graph
            .borrow()
            .nodes
            .get(id.index())
            .and_then(|node| node.grad_fn.clone())
    }

    pub(crate) fn requires_grad(&self, id: NodeId) -> bool {
        self.graph
            .borrow()
            .nodes
            .get(id.index())
            .is_some_and(|node| node.requires_grad)
    }

    fn push(&self, grad_fn: Option<Rc<dyn GradFn<T, B>>>, requires_grad: bool) -> NodeId {
        let mut graph = self.graph.borrow_mut();
        let id = NodeId(graph.nodes.len());
        graph.nodes.push(Node {
            grad_fn,
            requires_grad,
        });
        id
    }
}

impl<T: Scalar, B: Backend> Debug for Tape<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tape")
            .field("num_nodes", &self.len())
            .finish()
    }
}

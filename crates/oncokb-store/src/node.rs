//! Typed node handles, lifecycle status and producer inputs.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreError;

/// Type-erased node value. Producers and defaults for a `Node<T>` always store a `T`.
pub(crate) type Value = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Handle to a node producing a `T`. Carries no data.
pub struct Node<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Node<T> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self { id, _marker: PhantomData }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Node<T> {}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.id.0)
    }
}

impl<T> From<Node<T>> for NodeId {
    fn from(node: Node<T>) -> Self {
        node.id
    }
}

/// Handle to an input node. Only inputs can be set from outside.
pub struct Input<T>(Node<T>);

impl<T> Input<T> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self(Node::new(id))
    }

    pub fn node(&self) -> Node<T> {
        self.0
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }
}

impl<T> Clone for Input<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Input<T> {}

impl<T> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input({})", self.0.id.0)
    }
}

impl<T> From<Input<T>> for NodeId {
    fn from(input: Input<T>) -> Self {
        input.0.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Complete,
    Error,
}

impl NodeStatus {
    /// Complete or failed; either way downstream nodes may run.
    pub fn is_settled(&self) -> bool {
        !matches!(self, NodeStatus::Pending)
    }

    /// Status of a value computed from several nodes: pending wins over
    /// error, error wins over complete.
    pub fn combine<I>(statuses: I) -> NodeStatus
    where
        I: IntoIterator<Item = NodeStatus>,
    {
        let mut combined = NodeStatus::Complete;
        for status in statuses {
            match status {
                NodeStatus::Pending => return NodeStatus::Pending,
                NodeStatus::Error => combined = NodeStatus::Error,
                NodeStatus::Complete => {}
            }
        }
        combined
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Complete => "complete",
            NodeStatus::Error => "error",
        })
    }
}

/// A value read from the store together with its lifecycle status.
#[derive(Debug)]
pub struct Resolved<T> {
    pub value: Arc<T>,
    pub status: NodeStatus,
}

impl<T> Resolved<T> {
    pub fn new(value: Arc<T>, status: NodeStatus) -> Self {
        Self { value, status }
    }

    pub fn is_pending(&self) -> bool {
        self.status == NodeStatus::Pending
    }

    pub fn is_complete(&self) -> bool {
        self.status == NodeStatus::Complete
    }

    pub fn is_error(&self) -> bool {
        self.status == NodeStatus::Error
    }
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self { value: Arc::clone(&self.value), status: self.status }
    }
}

/// Snapshot of upstream values handed to a producer when it starts.
pub struct Inputs {
    values: HashMap<NodeId, (&'static str, Value)>,
}

impl Inputs {
    pub(crate) fn new(values: HashMap<NodeId, (&'static str, Value)>) -> Self {
        Self { values }
    }

    pub fn get<T>(&self, node: Node<T>) -> Result<Arc<T>, StoreError>
    where
        T: Any + Send + Sync,
    {
        let (name, value) = self
            .values
            .get(&node.id())
            .ok_or_else(|| StoreError::UndeclaredUpstream(format!("#{}", node.id().0)))?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| StoreError::TypeMismatch((*name).to_string()))
    }
}

impl fmt::Debug for Inputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Inputs").field("upstream", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_status() {
        use NodeStatus::*;
        assert_eq!(NodeStatus::combine([Complete, Complete]), Complete);
        assert_eq!(NodeStatus::combine([Complete, Error]), Error);
        assert_eq!(NodeStatus::combine([Error, Pending]), Pending);
        assert_eq!(NodeStatus::combine(std::iter::empty()), Complete);
    }

    #[test]
    fn test_inputs_get_checks_declaration_and_type() {
        let mut values = HashMap::new();
        values.insert(NodeId(0), ("symbol", Arc::new("BRAF".to_string()) as Value));
        let inputs = Inputs::new(values);

        let symbol: Node<String> = Node::new(NodeId(0));
        assert_eq!(inputs.get(symbol).unwrap().as_str(), "BRAF");

        let wrong_type: Node<u32> = Node::new(NodeId(0));
        assert_eq!(inputs.get(wrong_type), Err(StoreError::TypeMismatch("symbol".to_string())));

        let missing: Node<String> = Node::new(NodeId(3));
        assert!(matches!(inputs.get(missing), Err(StoreError::UndeclaredUpstream(_))));
    }
}

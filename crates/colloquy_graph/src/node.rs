//! Node types for dialogue graphs.
//!
//! Nodes are the vertices of a dialogue graph. Every node carries the same
//! structural data (adjacency, decorators, connection rules) and a
//! [`NodeKind`] describing what happens when the dialogue reaches it.
//!
//! Node classes form a small hierarchy used by the connection rule: a node
//! accepts an input from `other` only when `other`'s class [`is_a`] one of
//! its allowed input classes.
//!
//! [`is_a`]: NodeClass::is_a

use core::fmt;
use core::time::Duration;

use hashbrown::HashMap;

use crate::decorator::DecoratorHandle;
use crate::edge::EdgeId;
use crate::id::Guid;
use crate::row::RowHandle;

/// Unique identifier for a node in the graph.
///
/// Node IDs are arena indices and stay stable for the lifetime of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a new node ID.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node classes
// ─────────────────────────────────────────────────────────────────────────────

/// The class of a node, used for connection whitelists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// Root of the hierarchy. Every class is a `Base`.
    Base,
    /// Entry node of a graph.
    Start,
    /// Common parent of nodes that display a dialogue row.
    DialogueBase,
    /// A line spoken by a non-player participant.
    Lead,
    /// A player response.
    Answer,
    /// Ends the dialogue.
    Complete,
    /// Ends the dialogue without player input.
    AutoComplete,
    /// Waits before continuing.
    Delay,
    /// Jumps back to a previously visited node.
    ReturnToNode,
}

impl NodeClass {
    /// Returns the direct parent class, or `None` for [`NodeClass::Base`].
    #[must_use]
    pub fn parent(self) -> Option<NodeClass> {
        match self {
            NodeClass::Base => None,
            NodeClass::Lead | NodeClass::Answer => Some(NodeClass::DialogueBase),
            NodeClass::AutoComplete => Some(NodeClass::Complete),
            NodeClass::Start
            | NodeClass::DialogueBase
            | NodeClass::Complete
            | NodeClass::Delay
            | NodeClass::ReturnToNode => Some(NodeClass::Base),
        }
    }

    /// Returns `true` if `self` is `other` or derives from it.
    #[must_use]
    pub fn is_a(self, other: NodeClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Returns the display name of the class.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NodeClass::Base => "Base",
            NodeClass::Start => "Start",
            NodeClass::DialogueBase => "Dialogue",
            NodeClass::Lead => "Lead",
            NodeClass::Answer => "Answer",
            NodeClass::Complete => "Complete",
            NodeClass::AutoComplete => "Auto Complete",
            NodeClass::Delay => "Delay",
            NodeClass::ReturnToNode => "Return To Node",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a connection attempt, seen from the node being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    /// The other node would become a child of this node.
    Input,
    /// The other node would become a parent of this node.
    Output,
}

// ─────────────────────────────────────────────────────────────────────────────
// Node kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Default wait of a [`NodeKind::Delay`] node.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Default wait of a [`NodeKind::ReturnToNode`] node before jumping.
pub const DEFAULT_RETURN_DELAY: Duration = Duration::from_millis(100);

/// Row reference of a dialogue node.
#[derive(Debug, Clone, Default)]
pub struct DialogueNodeData {
    /// The row shown when the node is processed.
    pub row: Option<RowHandle>,
}

impl DialogueNodeData {
    /// Creates data pointing at `row`.
    #[must_use]
    pub fn new(row: RowHandle) -> Self {
        Self { row: Some(row) }
    }
}

/// Settings of a return-to-node jump.
#[derive(Debug, Clone)]
pub struct ReturnToNodeData {
    /// Wait before jumping.
    pub delay: Duration,
    /// The node to jump to.
    pub target: Option<NodeId>,
}

impl Default for ReturnToNodeData {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETURN_DELAY,
            target: None,
        }
    }
}

/// What a node does when the dialogue reaches it.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Entry node; resolves to its first child.
    Start,
    /// Dialogue row spoken by a non-player participant.
    Lead(DialogueNodeData),
    /// Dialogue row offered to the player as an option.
    Answer(DialogueNodeData),
    /// Closes the dialogue.
    Complete,
    /// Closes the dialogue as soon as it is reached.
    AutoComplete,
    /// Waits for `duration`, then continues.
    Delay {
        /// How long to wait.
        duration: Duration,
    },
    /// Waits, then jumps to the target node.
    ReturnToNode(ReturnToNodeData),
}

impl NodeKind {
    /// A lead node showing `row`.
    #[must_use]
    pub fn lead(row: RowHandle) -> Self {
        NodeKind::Lead(DialogueNodeData::new(row))
    }

    /// An answer node showing `row`.
    #[must_use]
    pub fn answer(row: RowHandle) -> Self {
        NodeKind::Answer(DialogueNodeData::new(row))
    }

    /// A delay node with the default wait.
    #[must_use]
    pub fn delay() -> Self {
        NodeKind::Delay {
            duration: DEFAULT_DELAY,
        }
    }

    /// A return node jumping to `target`.
    #[must_use]
    pub fn return_to(target: NodeId) -> Self {
        NodeKind::ReturnToNode(ReturnToNodeData {
            target: Some(target),
            ..ReturnToNodeData::default()
        })
    }

    /// Returns the class of this kind.
    #[must_use]
    pub fn class(&self) -> NodeClass {
        match self {
            NodeKind::Start => NodeClass::Start,
            NodeKind::Lead(_) => NodeClass::Lead,
            NodeKind::Answer(_) => NodeClass::Answer,
            NodeKind::Complete => NodeClass::Complete,
            NodeKind::AutoComplete => NodeClass::AutoComplete,
            NodeKind::Delay { .. } => NodeClass::Delay,
            NodeKind::ReturnToNode(_) => NodeClass::ReturnToNode,
        }
    }

    /// Returns the row data of dialogue nodes.
    #[must_use]
    pub fn dialogue_data(&self) -> Option<&DialogueNodeData> {
        match self {
            NodeKind::Lead(data) | NodeKind::Answer(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the timer length of waiting nodes.
    #[must_use]
    pub fn delay_duration(&self) -> Option<Duration> {
        match self {
            NodeKind::Delay { duration } => Some(*duration),
            NodeKind::ReturnToNode(data) => Some(data.delay),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// A node in the dialogue graph.
#[derive(Debug)]
pub struct Node {
    /// Arena index inside the owning graph.
    pub id: NodeId,
    /// Persistent identity. Changes only on duplication.
    pub guid: Guid,
    /// Display name.
    pub name: String,
    pub(crate) kind: NodeKind,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) edges: HashMap<NodeId, EdgeId>,
    pub(crate) decorators: Vec<DecoratorHandle>,
    pub(crate) inherit_graph_decorators: bool,
    pub(crate) node_index: Option<usize>,
    pub(crate) execution_order: i32,
    pub(crate) max_children: i32,
    pub(crate) allow_input_nodes: bool,
    pub(crate) allow_output_nodes: bool,
    pub(crate) auto_starts: bool,
    pub(crate) allowed_input_classes: Vec<NodeClass>,
}

impl Node {
    /// Creates a node of `kind` with the class defaults applied.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        let class = kind.class();
        let allowed_input_classes = match class {
            NodeClass::Lead => vec![NodeClass::Start, NodeClass::Answer, NodeClass::Lead],
            NodeClass::Answer => vec![NodeClass::Lead],
            NodeClass::ReturnToNode => vec![NodeClass::Base],
            _ => Vec::new(),
        };

        Self {
            id,
            guid: Guid::new(),
            name: class.name().to_string(),
            kind,
            parents: Vec::new(),
            children: Vec::new(),
            edges: HashMap::new(),
            decorators: Vec::new(),
            inherit_graph_decorators: class != NodeClass::ReturnToNode,
            node_index: None,
            execution_order: 0,
            max_children: -1,
            allow_input_nodes: class != NodeClass::Start,
            allow_output_nodes: !matches!(
                class,
                NodeClass::Complete | NodeClass::AutoComplete | NodeClass::ReturnToNode
            ),
            auto_starts: matches!(
                class,
                NodeClass::Lead
                    | NodeClass::Delay
                    | NodeClass::ReturnToNode
                    | NodeClass::AutoComplete
            ),
            allowed_input_classes,
        }
    }

    /// Returns the node's kind.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the node's kind for editing.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Returns the node's class.
    #[must_use]
    pub fn class(&self) -> NodeClass {
        self.kind.class()
    }

    /// Returns `true` for nodes that display a dialogue row.
    #[must_use]
    pub fn is_dialogue(&self) -> bool {
        self.class().is_a(NodeClass::DialogueBase)
    }

    /// Parent nodes in connection order.
    #[must_use]
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Child nodes in connection order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the edge leading to `child`, if connected.
    #[must_use]
    pub fn edge_to(&self, child: NodeId) -> Option<&EdgeId> {
        self.edges.get(&child)
    }

    /// Decorator slots attached to this node.
    #[must_use]
    pub fn decorators(&self) -> &[DecoratorHandle] {
        &self.decorators
    }

    /// Whether graph-level decorators apply to this node.
    #[must_use]
    pub fn inherits_graph_decorators(&self) -> bool {
        self.inherit_graph_decorators
    }

    /// Position in the graph's node list, assigned by
    /// [`Graph::initialize_nodes`](crate::Graph::initialize_nodes).
    #[must_use]
    pub fn node_index(&self) -> Option<usize> {
        self.node_index
    }

    /// Ordering hint among siblings.
    #[must_use]
    pub fn execution_order(&self) -> i32 {
        self.execution_order
    }

    /// Maximum number of children, `-1` for unbounded.
    #[must_use]
    pub fn max_children(&self) -> i32 {
        self.max_children
    }

    /// Whether this node accepts parents.
    #[must_use]
    pub fn allows_inputs(&self) -> bool {
        self.allow_input_nodes
    }

    /// Whether this node accepts children.
    #[must_use]
    pub fn allows_outputs(&self) -> bool {
        self.allow_output_nodes
    }

    /// Whether the dialogue continues into this node without player input.
    #[must_use]
    pub fn auto_starts(&self) -> bool {
        self.auto_starts
    }

    /// Classes accepted as parents. Empty accepts every class.
    #[must_use]
    pub fn allowed_input_classes(&self) -> &[NodeClass] {
        &self.allowed_input_classes
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets the maximum number of children (`-1` for unbounded).
    pub fn set_max_children(&mut self, max: i32) -> &mut Self {
        self.max_children = max;
        self
    }

    /// Sets the ordering hint among siblings.
    pub fn set_execution_order(&mut self, order: i32) -> &mut Self {
        self.execution_order = order;
        self
    }

    /// Sets whether graph-level decorators apply to this node.
    pub fn set_inherit_graph_decorators(&mut self, inherit: bool) -> &mut Self {
        self.inherit_graph_decorators = inherit;
        self
    }

    /// Replaces the parent class whitelist.
    pub fn set_allowed_input_classes(&mut self, classes: Vec<NodeClass>) -> &mut Self {
        self.allowed_input_classes = classes;
        self
    }

    /// Sets whether the dialogue continues into this node automatically.
    pub fn set_auto_starts(&mut self, auto_starts: bool) -> &mut Self {
        self.auto_starts = auto_starts;
        self
    }

    /// Appends a decorator slot.
    pub fn add_decorator(&mut self, decorator: DecoratorHandle) -> &mut Self {
        self.decorators.push(decorator);
        self
    }

    /// Assigns a fresh identity, as done for pasted or duplicated nodes.
    pub fn regenerate_guid(&mut self) {
        self.guid = Guid::new();
    }

    /// Returns an error when this node cannot take another child.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::ChildLimitReached`] when `max_children` is
    /// non-negative and already reached.
    pub fn check_child_capacity(&self) -> Result<(), ConnectionError> {
        let max = self.max_children;
        if max >= 0 && self.children.len() >= max as usize {
            return Err(ConnectionError::ChildLimitReached { node: self.id, max });
        }
        Ok(())
    }

    /// Checks whether a connection between `self` and `other` is allowed.
    ///
    /// For [`PinDirection::Input`], `other` would become a child of `self`
    /// and only `self`'s capacity is checked. For [`PinDirection::Output`],
    /// `other` would become a parent of `self`: its capacity, both nodes'
    /// input/output permissions and `self`'s class whitelist are checked.
    ///
    /// # Errors
    ///
    /// Returns the first rule the connection violates.
    pub fn can_create_connection(
        &self,
        other: &Node,
        direction: PinDirection,
    ) -> Result<(), ConnectionError> {
        match direction {
            PinDirection::Input => self.check_child_capacity(),
            PinDirection::Output => {
                other.check_child_capacity()?;

                if !other.allow_output_nodes {
                    return Err(ConnectionError::OutputsNotAllowed { node: other.id });
                }
                if !self.allow_input_nodes {
                    return Err(ConnectionError::InputsNotAllowed { node: self.id });
                }

                let other_class = other.class();
                let accepted = self.allowed_input_classes.is_empty()
                    || self
                        .allowed_input_classes
                        .iter()
                        .any(|class| other_class.is_a(*class));

                if accepted {
                    Ok(())
                } else {
                    Err(ConnectionError::InvalidNodeConnection {
                        parent: other.id,
                        parent_class: other_class,
                        child: self.id,
                        child_class: self.class(),
                    })
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection errors
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons a connection between two nodes is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A node ID does not exist in the graph.
    NodeNotFound(NodeId),
    /// A node cannot be connected to itself.
    SelfConnection(NodeId),
    /// The edge already exists.
    AlreadyConnected {
        /// The parent node.
        parent: NodeId,
        /// The child node.
        child: NodeId,
    },
    /// The parent already has its maximum number of children.
    ChildLimitReached {
        /// The full node.
        node: NodeId,
        /// Its child limit.
        max: i32,
    },
    /// The would-be parent does not accept children.
    OutputsNotAllowed {
        /// The refusing node.
        node: NodeId,
    },
    /// The would-be child does not accept parents.
    InputsNotAllowed {
        /// The refusing node.
        node: NodeId,
    },
    /// The child's whitelist does not accept the parent's class.
    InvalidNodeConnection {
        /// The would-be parent.
        parent: NodeId,
        /// Its class.
        parent_class: NodeClass,
        /// The would-be child.
        child: NodeId,
        /// Its class.
        child_class: NodeClass,
    },
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::NodeNotFound(id) => write!(f, "node {id} does not exist"),
            ConnectionError::SelfConnection(id) => {
                write!(f, "node {id} cannot be connected to itself")
            }
            ConnectionError::AlreadyConnected { parent, child } => {
                write!(f, "{parent} is already connected to {child}")
            }
            ConnectionError::ChildLimitReached { node, max } => {
                write!(f, "node {node} already has its maximum of {max} children")
            }
            ConnectionError::OutputsNotAllowed { node } => {
                write!(f, "node {node} does not allow output connections")
            }
            ConnectionError::InputsNotAllowed { node } => {
                write!(f, "node {node} does not allow input connections")
            }
            ConnectionError::InvalidNodeConnection {
                parent,
                parent_class,
                child,
                child_class,
            } => write!(
                f,
                "Invalid Node Connection! {parent_class} ({parent}) cannot be a parent of {child_class} ({child})"
            ),
        }
    }
}

impl core::error::Error for ConnectionError {}

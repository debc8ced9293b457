//! Graph structure, traversal and validation.
//!
//! The [`Graph`] owns every node of one dialogue in an arena. Nodes refer to
//! each other by [`NodeId`] only, so parent and child lists never form
//! ownership cycles.
//!
//! # Example
//!
//! ```ignore
//! let mut graph = Graph::new("village");
//! let start = graph.start_node().expect("new graphs have a start node");
//!
//! let greeting = graph.add_node(NodeKind::lead(RowHandle::new(table.clone(), "greeting")));
//! let farewell = graph.add_node(NodeKind::answer(RowHandle::new(table, "farewell")));
//! let done = graph.add_node(NodeKind::Complete);
//!
//! graph.connect(start, greeting)?;
//! graph.connect(greeting, farewell)?;
//! graph.connect(farewell, done)?;
//!
//! if let Err(errors) = graph.validate() {
//!     for error in errors {
//!         tracing::warn!("{error}");
//!     }
//! }
//! ```

use core::fmt;
use core::fmt::Write as _;

use hashbrown::{HashMap, HashSet};

use crate::decorator::{
    Attachment, DecoratorBinding, DecoratorError, DecoratorHandle, DecoratorScope,
    DialogueSession, ValidationMode,
};
use crate::edge::{Edge, EdgeId};
use crate::id::Guid;
use crate::node::{ConnectionError, Node, NodeId, NodeKind, PinDirection};

/// A dialogue graph: an arena of nodes plus the graph-level decorators.
#[derive(Debug)]
pub struct Graph {
    /// Persistent identity of the graph.
    pub guid: Guid,
    /// Display name, used as the owner in graph-level messages.
    pub name: String,
    nodes: Vec<Node>,
    edges: HashMap<EdgeId, Edge>,
    root_nodes: Vec<NodeId>,
    start_node: Option<NodeId>,
    decorators: Vec<DecoratorHandle>,
    edges_enabled: bool,
    tags: HashSet<String>,
}

impl Graph {
    /// Creates a graph with a synthesized start node.
    ///
    /// The start node is registered as the start node and as the first root.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut graph = Self::empty(name);
        let start = graph.add_node(NodeKind::Start);
        graph.start_node = Some(start);
        graph.root_nodes.push(start);
        graph
    }

    /// Creates a graph with no nodes.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            guid: Guid::new(),
            name: name.into(),
            nodes: Vec::new(),
            edges: HashMap::new(),
            root_nodes: Vec::new(),
            start_node: None,
            decorators: Vec::new(),
            edges_enabled: true,
            tags: HashSet::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a node of `kind` and returns its ID.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(id, kind));
        id
    }

    /// Returns a node by ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Returns a node by ID for editing.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Returns all nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the root nodes traversal starts from.
    #[must_use]
    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Registers `id` as a root. Returns `false` for unknown or already
    /// registered nodes.
    pub fn add_root(&mut self, id: NodeId) -> bool {
        if self.node(id).is_none() || self.root_nodes.contains(&id) {
            return false;
        }
        self.root_nodes.push(id);
        true
    }

    /// Returns the start node.
    #[must_use]
    pub fn start_node(&self) -> Option<NodeId> {
        self.start_node
    }

    /// Designates `id` as the start node. Returns `false` for unknown nodes.
    pub fn set_start_node(&mut self, id: NodeId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        self.start_node = Some(id);
        true
    }

    /// Finds a node by its persistent identity.
    #[must_use]
    pub fn find_node_by_guid(&self, guid: &Guid) -> Option<NodeId> {
        self.nodes.iter().find(|node| &node.guid == guid).map(|node| node.id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Edges
    // ─────────────────────────────────────────────────────────────────────

    /// Connects `parent` to `child`.
    ///
    /// The parent is asked with [`PinDirection::Input`] and the child with
    /// [`PinDirection::Output`]; both must accept.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] for unknown nodes, self connections,
    /// duplicate edges and any connection rule violation.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<EdgeId, ConnectionError> {
        if parent == child {
            return Err(ConnectionError::SelfConnection(parent));
        }
        let parent_node = self.node(parent).ok_or(ConnectionError::NodeNotFound(parent))?;
        let child_node = self.node(child).ok_or(ConnectionError::NodeNotFound(child))?;

        if parent_node.children.contains(&child) {
            return Err(ConnectionError::AlreadyConnected { parent, child });
        }

        parent_node.can_create_connection(child_node, PinDirection::Input)?;
        child_node.can_create_connection(parent_node, PinDirection::Output)?;

        let edge = Edge::new(parent, child);
        let edge_id = edge.id.clone();
        self.edges.insert(edge_id.clone(), edge);

        let parent_node = &mut self.nodes[parent.index()];
        parent_node.children.push(child);
        parent_node.edges.insert(child, edge_id.clone());
        self.nodes[child.index()].parents.push(parent);

        tracing::trace!(%parent, %child, "connected nodes");
        Ok(edge_id)
    }

    /// Removes the edge from `parent` to `child`. Returns `false` if there
    /// was none.
    pub fn disconnect(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(parent_node) = self.nodes.get_mut(parent.index()) else {
            return false;
        };
        let Some(position) = parent_node.children.iter().position(|id| *id == child) else {
            return false;
        };
        parent_node.children.remove(position);
        if let Some(edge_id) = parent_node.edges.remove(&child) {
            self.edges.remove(&edge_id);
        }
        if let Some(child_node) = self.nodes.get_mut(child.index()) {
            child_node.parents.retain(|id| *id != parent);
        }
        true
    }

    /// Returns an edge by ID.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether edges are treated as first-class objects by tooling.
    #[must_use]
    pub fn edges_enabled(&self) -> bool {
        self.edges_enabled
    }

    /// Enables or disables first-class edges.
    pub fn set_edges_enabled(&mut self, enabled: bool) {
        self.edges_enabled = enabled;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a tag. Returns `false` if it was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Returns `true` if the graph carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns all tags in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Assigns each node its position in the node list.
    ///
    /// Called once when the graph is handed to a participant.
    pub fn initialize_nodes(&mut self) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.node_index = Some(index);
        }
    }

    /// Removes all nodes, edges, roots and the start node.
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.parents.clear();
            node.children.clear();
            node.edges.clear();
        }
        self.nodes.clear();
        self.edges.clear();
        self.root_nodes.clear();
        self.start_node = None;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Decorators
    // ─────────────────────────────────────────────────────────────────────

    /// Appends a graph-level decorator slot.
    pub fn add_graph_decorator(&mut self, decorator: DecoratorHandle) -> &mut Self {
        self.decorators.push(decorator);
        self
    }

    /// Returns the graph-level decorators, skipping empty slots.
    pub fn graph_decorators(&self) -> impl Iterator<Item = &DecoratorHandle> {
        self.decorators.iter().filter(|handle| handle.is_valid())
    }

    /// Returns every decorator slot of the graph and its nodes with its
    /// attachment point, graph decorators first.
    #[must_use]
    pub fn all_decorators(&self) -> Vec<(Attachment, &DecoratorHandle)> {
        let graph = self.decorators.iter().map(|handle| (Attachment::Graph, handle));
        let nodes = self.nodes.iter().flat_map(|node| {
            node.decorators
                .iter()
                .map(move |handle| (Attachment::Node(node.id), handle))
        });
        graph.chain(nodes).collect()
    }

    /// Binds every decorator of the graph and its nodes.
    pub fn initialize_decorators(&self, binding: &DecoratorBinding) {
        for (_, handle) in self.all_decorators() {
            handle.initialize(binding);
        }
    }

    /// Resets every decorator of the graph and its nodes.
    pub fn cleanup_decorators(&self) {
        for (_, handle) in self.all_decorators() {
            handle.cleanup();
        }
    }

    /// Decorators that apply to `id`: inherited graph decorators followed by
    /// the node's own non-empty slots.
    fn applicable_decorators(&self, id: NodeId) -> Vec<(Attachment, &DecoratorHandle)> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };

        let mut applicable = Vec::new();
        if node.inherit_graph_decorators {
            applicable.extend(self.graph_decorators().map(|handle| (Attachment::Graph, handle)));
        }
        applicable.extend(
            node.decorators
                .iter()
                .filter(|handle| handle.is_valid())
                .map(|handle| (Attachment::Node(id), handle)),
        );
        applicable
    }

    /// Evaluates all decorators that apply to `id`.
    ///
    /// Every decorator is evaluated, even after one has failed. A node with
    /// no decorators passes. Unknown nodes fail.
    #[must_use]
    pub fn evaluate_decorators(&self, id: NodeId, session: Option<&dyn DialogueSession>) -> bool {
        if self.node(id).is_none() {
            return false;
        }

        let mut satisfied = true;
        for (attachment, handle) in self.applicable_decorators(id) {
            let scope = DecoratorScope::new(self, attachment);
            satisfied &= handle.evaluate(&scope, session);
        }
        satisfied
    }

    /// Returns whether the dialogue may enter `id`.
    #[must_use]
    pub fn can_start_node(&self, id: NodeId, session: Option<&dyn DialogueSession>) -> bool {
        self.evaluate_decorators(id, session)
    }

    /// Executes all decorators that apply to `id`, in evaluation order.
    ///
    /// # Errors
    ///
    /// Stops at the first slot that fails with a [`DecoratorError`].
    pub fn execute_decorators(
        &self,
        id: NodeId,
        session: &mut dyn DialogueSession,
    ) -> Result<(), DecoratorError> {
        for (attachment, handle) in self.applicable_decorators(id) {
            let scope = DecoratorScope::new(self, attachment);
            handle.execute(&scope, session)?;
        }
        Ok(())
    }

    /// Children of `id` whose decorators currently pass, in connection order.
    #[must_use]
    pub fn allowed_children(&self, id: NodeId, session: Option<&dyn DialogueSession>) -> Vec<NodeId> {
        self.node(id)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|child| self.can_start_node(*child, session))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────

    /// Breadth-first levels starting from the root nodes.
    ///
    /// Each node appears once, at the shallowest level it is reached from,
    /// so shared descendants and cycles never repeat.
    #[must_use]
    pub fn levels(&self) -> Vec<Vec<NodeId>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut frontier = Vec::new();
        for root in &self.root_nodes {
            if let Some(seen) = visited.get_mut(root.index())
                && !*seen
            {
                *seen = true;
                frontier.push(*root);
            }
        }

        let mut levels = Vec::new();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in &frontier {
                for child in &self.nodes[id.index()].children {
                    if let Some(seen) = visited.get_mut(child.index())
                        && !*seen
                    {
                        *seen = true;
                        next.push(*child);
                    }
                }
            }
            levels.push(frontier);
            frontier = next;
        }
        levels
    }

    /// Number of breadth-first levels. Zero for an empty graph.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels().len()
    }

    /// Nodes at breadth-first depth `level`. Empty past the last level.
    #[must_use]
    pub fn nodes_by_level(&self, level: usize) -> Vec<NodeId> {
        self.levels().into_iter().nth(level).unwrap_or_default()
    }

    /// Returns a level-annotated dump of every reachable node and logs each
    /// line at debug level.
    #[must_use]
    pub fn print(&self) -> String {
        let mut out = String::new();
        for (level, ids) in self.levels().iter().enumerate() {
            for id in ids {
                let name = self.node(*id).map_or("?", |node| node.name.as_str());
                let line = format!("Level {level}: {name} ({id})");
                tracing::debug!(graph = %self.name, "{line}");
                let _ = writeln!(out, "{line}");
            }
        }
        out
    }

    /// Returns whether a dialogue can start on this graph: it has nodes, a
    /// start node with at least one child, and passes runtime validation.
    #[must_use]
    pub fn can_start(&self) -> bool {
        let has_children = self
            .start_node
            .and_then(|id| self.node(id))
            .is_some_and(|start| !start.children.is_empty());

        !self.nodes.is_empty() && has_children && self.validate_runtime().is_ok()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────

    /// Lints the graph as an author would see it.
    ///
    /// Every violation is collected; validation never stops at the first.
    ///
    /// # Errors
    ///
    /// Returns all violations found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        self.validate_with(ValidationMode::Editor)
    }

    /// Validates the graph right before a dialogue starts.
    ///
    /// In addition to [`validate`](Self::validate), decorators must be
    /// bound to a world and initialized.
    ///
    /// # Errors
    ///
    /// Returns all violations found.
    pub fn validate_runtime(&self) -> Result<(), Vec<ValidationError>> {
        self.validate_with(ValidationMode::Runtime)
    }

    /// Validates a single node.
    ///
    /// # Errors
    ///
    /// Returns all violations found on the node.
    pub fn validate_node(&self, id: NodeId) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Some(node) = self.node(id) {
            self.collect_node_errors(node, ValidationMode::Editor, &mut errors);
        }
        into_result(errors)
    }

    fn validate_with(&self, mode: ValidationMode) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.start_node.and_then(|id| self.node(id)).is_none() {
            errors.push(ValidationError::NoStartNode {
                graph: self.name.clone(),
            });
        }

        for node in self.find_cycles() {
            errors.push(ValidationError::CyclicGraph {
                node,
                name: self.node_name(node),
            });
        }

        let mut reachable = vec![false; self.nodes.len()];
        for id in self.levels().into_iter().flatten() {
            reachable[id.index()] = true;
        }
        for node in &self.nodes {
            let isolated = node.parents.is_empty() && node.children.is_empty();
            if !reachable[node.id.index()] && !isolated {
                errors.push(ValidationError::UnreachableNode {
                    node: node.id,
                    name: node.name.clone(),
                });
            }
        }

        self.collect_decorator_errors(Attachment::Graph, &self.name, &self.decorators, mode, &mut errors);

        for node in &self.nodes {
            self.collect_node_errors(node, mode, &mut errors);
        }

        into_result(errors)
    }

    fn collect_node_errors(&self, node: &Node, mode: ValidationMode, errors: &mut Vec<ValidationError>) {
        let id = node.id;
        let name = || node.name.clone();

        if node.parents.is_empty() && node.children.is_empty() {
            errors.push(ValidationError::IsolatedNode { node: id, name: name() });
        }

        if node.allow_input_nodes && node.parents.is_empty() {
            errors.push(ValidationError::MissingInputs { node: id, name: name() });
        }

        self.collect_decorator_errors(Attachment::Node(id), &node.name, &node.decorators, mode, errors);

        if node.max_children >= 0 && node.children.len() > node.max_children as usize {
            errors.push(ValidationError::TooManyChildren {
                node: id,
                name: name(),
                count: node.children.len(),
                max: node.max_children,
            });
        }

        if !node.allow_output_nodes && !node.children.is_empty() {
            errors.push(ValidationError::OutputsNotAllowed { node: id, name: name() });
        }

        match &node.kind {
            NodeKind::Delay { duration } if duration.is_zero() => {
                errors.push(ValidationError::InvalidDelay { node: id, name: name() });
            }
            NodeKind::ReturnToNode(data) => {
                for parent in &node.parents {
                    let branches = self.node(*parent).is_some_and(|p| p.children.len() > 1);
                    if branches {
                        errors.push(ValidationError::ReturnParentBranches {
                            node: id,
                            name: name(),
                            parent: *parent,
                        });
                    }
                }
                if data.target.and_then(|target| self.node(target)).is_none() {
                    errors.push(ValidationError::MissingReturnTarget { node: id, name: name() });
                }
            }
            _ => {}
        }
    }

    fn collect_decorator_errors(
        &self,
        attachment: Attachment,
        owner: &str,
        slots: &[DecoratorHandle],
        mode: ValidationMode,
        errors: &mut Vec<ValidationError>,
    ) {
        // (class, first name seen, count) in first-appearance order
        let mut classes: Vec<(core::any::TypeId, String, usize)> = Vec::new();

        for (index, handle) in slots.iter().enumerate() {
            let Some(decorator) = handle.decorator() else {
                errors.push(ValidationError::InvalidDecorator {
                    attachment,
                    owner: owner.to_string(),
                    index,
                });
                continue;
            };

            if !decorator.is_stackable() {
                let class = decorator.class_id();
                match classes.iter_mut().find(|(seen, _, _)| *seen == class) {
                    Some(entry) => entry.2 += 1,
                    None => classes.push((class, decorator.name().to_string(), 1)),
                }
            }

            let scope = DecoratorScope::new(self, attachment);
            if let Err(messages) = handle.validate(&scope, mode) {
                errors.extend(messages.into_iter().map(|message| ValidationError::Decorator {
                    attachment,
                    owner: owner.to_string(),
                    message,
                }));
            }
        }

        for (_, decorator, count) in classes {
            if count > 1 {
                errors.push(ValidationError::DuplicateDecorator {
                    attachment,
                    owner: owner.to_string(),
                    decorator,
                    count,
                });
            }
        }
    }

    /// Nodes closing a cycle reachable from the roots, each reported once.
    fn find_cycles(&self) -> Vec<NodeId> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Visit {
            New,
            Active,
            Done,
        }

        let mut state = vec![Visit::New; self.nodes.len()];
        let mut found = Vec::new();

        for root in &self.root_nodes {
            if state.get(root.index()) != Some(&Visit::New) {
                continue;
            }
            state[root.index()] = Visit::Active;
            let mut stack = vec![(*root, 0usize)];

            while let Some(top) = stack.last_mut() {
                let (id, next) = *top;
                let children = &self.nodes[id.index()].children;
                if let Some(child) = children.get(next).copied() {
                    top.1 += 1;
                    match state[child.index()] {
                        Visit::New => {
                            state[child.index()] = Visit::Active;
                            stack.push((child, 0));
                        }
                        Visit::Active => {
                            if !found.contains(&child) {
                                found.push(child);
                            }
                        }
                        Visit::Done => {}
                    }
                } else {
                    state[id.index()] = Visit::Done;
                    stack.pop();
                }
            }
        }
        found
    }

    fn node_name(&self, id: NodeId) -> String {
        self.node(id).map(|node| node.name.clone()).unwrap_or_default()
    }
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation errors
// ─────────────────────────────────────────────────────────────────────────────

/// A violation found while validating a graph.
///
/// Validation errors are collected, never raised: every check runs and all
/// violations are reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The graph has no start node.
    NoStartNode {
        /// The graph name.
        graph: String,
    },
    /// A cycle reachable from the roots passes through this node.
    CyclicGraph {
        /// The node closing the cycle.
        node: NodeId,
        /// Its name.
        name: String,
    },
    /// A connected node that no root reaches.
    UnreachableNode {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
    /// A node with neither parents nor children.
    IsolatedNode {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
    /// A node that accepts inputs but has no parent.
    MissingInputs {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
    /// An empty decorator slot.
    InvalidDecorator {
        /// Where the slot is attached.
        attachment: Attachment,
        /// The owning graph or node name.
        owner: String,
        /// Position of the slot.
        index: usize,
    },
    /// The same non-stackable decorator appears more than once.
    DuplicateDecorator {
        /// Where the decorators are attached.
        attachment: Attachment,
        /// The owning graph or node name.
        owner: String,
        /// The decorator name.
        decorator: String,
        /// How many times it appears.
        count: usize,
    },
    /// A message produced by a decorator's own validation.
    Decorator {
        /// Where the decorator is attached.
        attachment: Attachment,
        /// The owning graph or node name.
        owner: String,
        /// The decorator's message.
        message: String,
    },
    /// A node has more children than it allows.
    TooManyChildren {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
        /// Its number of children.
        count: usize,
        /// Its child limit.
        max: i32,
    },
    /// A node that forbids outputs has children.
    OutputsNotAllowed {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
    /// A delay node with a zero duration.
    InvalidDelay {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
    /// A return node whose parent branches.
    ReturnParentBranches {
        /// The return node.
        node: NodeId,
        /// Its name.
        name: String,
        /// The branching parent.
        parent: NodeId,
    },
    /// A return node without a valid target.
    MissingReturnTarget {
        /// The node ID.
        node: NodeId,
        /// The node name.
        name: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoStartNode { graph } => write!(f, "{graph}: Has no Start Node!"),
            ValidationError::CyclicGraph { node, name } => {
                write!(f, "{name} ({node}): This Node is part of a cycle!")
            }
            ValidationError::UnreachableNode { node, name } => {
                write!(f, "{name} ({node}): This Node cannot be reached from any root!")
            }
            ValidationError::IsolatedNode { node, name } => {
                write!(f, "{name} ({node}): This Node has no Connections!")
            }
            ValidationError::MissingInputs { node, name } => write!(
                f,
                "{name} ({node}): This Node requires Inputs, however, none are found!"
            ),
            ValidationError::InvalidDecorator { owner, index, .. } => {
                write!(f, "{owner}: has INVALID Decorator at Index: {index}.")
            }
            ValidationError::DuplicateDecorator {
                owner,
                decorator,
                count,
                ..
            } => write!(
                f,
                "{owner}: has Decorator {decorator} {count}x times! Please, avoid duplicates!"
            ),
            ValidationError::Decorator { owner, message, .. } => write!(f, "{owner}: {message}"),
            ValidationError::TooManyChildren {
                node,
                name,
                count,
                max,
            } => write!(
                f,
                "{name} ({node}): has {count} children, but allows at most {max}!"
            ),
            ValidationError::OutputsNotAllowed { node, name } => {
                write!(f, "{name} ({node}): This Node does not allow Outputs!")
            }
            ValidationError::InvalidDelay { node, name } => {
                write!(f, "{name} ({node}): Delay Duration must be greater than zero!")
            }
            ValidationError::ReturnParentBranches { node, name, parent } => write!(
                f,
                "{name} ({node}): This node expects to be only output from its Parent Node(s)! ({parent} branches)"
            ),
            ValidationError::MissingReturnTarget { node, name } => {
                write!(f, "{name} ({node}): Selected Node is not Valid!")
            }
        }
    }
}

impl core::error::Error for ValidationError {}

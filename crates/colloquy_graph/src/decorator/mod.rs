//! Decorators: pluggable conditions and side effects on graphs and nodes.
//!
//! A [`Decorator`] is attached either to the whole graph or to a single node
//! and takes part in three phases:
//!
//! - **validate**: collects human-readable messages while linting a graph
//! - **evaluate**: a predicate deciding whether a node may be entered
//! - **execute**: a side effect run when a node is entered
//!
//! Decorators are stored in a [`DecoratorHandle`], a slot that may be empty
//! and that records the runtime binding (world, participant, manager) the
//! decorator was initialized with. Graphs are shared between sessions, so
//! the binding lives behind a lock and is reset by
//! [`cleanup`](DecoratorHandle::cleanup).
//!
//! # Example
//!
//! ```ignore
//! struct HasGold(u32);
//!
//! impl Decorator for HasGold {
//!     fn evaluate(&self, _scope: &DecoratorScope<'_>, session: Option<&dyn DialogueSession>) -> bool {
//!         self.0 > 10
//!     }
//! }
//!
//! graph.node_mut(answer)?.add_decorator(DecoratorHandle::new(HasGold(12)));
//! ```

pub mod builtin;

use core::any::TypeId;
use core::fmt;

use parking_lot::RwLock;

use crate::graph::Graph;
use crate::id::{Guid, ManagerId, ParticipantId, WorldId};
use crate::node::{Node, NodeId};
use crate::row::RowHandle;

// ─────────────────────────────────────────────────────────────────────────────
// Scope and session
// ─────────────────────────────────────────────────────────────────────────────

/// Where a decorator is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Attached to the graph; applies to every inheriting node.
    Graph,
    /// Attached to a single node.
    Node(NodeId),
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Graph => f.write_str("graph"),
            Attachment::Node(id) => write!(f, "{id}"),
        }
    }
}

/// The graph a decorator belongs to and its attachment point.
#[derive(Debug, Clone, Copy)]
pub struct DecoratorScope<'a> {
    /// The owning graph.
    pub graph: &'a Graph,
    /// Where the decorator is attached.
    pub attachment: Attachment,
}

impl<'a> DecoratorScope<'a> {
    /// Creates a scope for a decorator attached to `attachment` in `graph`.
    #[must_use]
    pub fn new(graph: &'a Graph, attachment: Attachment) -> Self {
        Self { graph, attachment }
    }

    /// Returns the owning node, or `None` for graph decorators and missing
    /// nodes.
    #[must_use]
    pub fn owning_node(&self) -> Option<&'a Node> {
        match self.attachment {
            Attachment::Graph => None,
            Attachment::Node(id) => self.graph.node(id),
        }
    }
}

/// Whether validation runs in the editor or right before a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Authoring-time lint. Runtime bindings are not required.
    Editor,
    /// Pre-flight check. Decorators must be bound to a world.
    Runtime,
}

/// The running dialogue as seen by decorators.
///
/// Implemented by the runtime's dialogue context. Evaluation receives a
/// shared view, execution a mutable one.
pub trait DialogueSession {
    /// How many times the node with `guid` has been traversed, counting
    /// both this session and the dialogue participant's history.
    fn traversal_count(&self, guid: &Guid) -> u32;

    /// Saves `node` as the dialogue participant's starting node.
    ///
    /// Returns `false` when the node does not belong to the participant's
    /// graph.
    fn save_starting_node(&mut self, node: NodeId) -> bool;

    /// Sends a command to the participant owning the decorator.
    fn process_command(&mut self, command: &str, payload: Option<&str>);

    /// Makes the other side of the conversation the active participant.
    fn swap_active_participant(&mut self);

    /// Number of lines in the active row, or `None` without an active row.
    fn active_row_data_len(&self) -> Option<usize>;

    /// Selects the line of the active row shown next.
    fn set_active_row_data_index(&mut self, index: usize);

    /// Replaces the active row. Returns `false` when `row` does not resolve.
    fn override_active_row(&mut self, row: &RowHandle) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Decorator trait
// ─────────────────────────────────────────────────────────────────────────────

/// Behaviour attached to a graph or node.
///
/// All methods have defaults: a decorator that overrides nothing always
/// passes and does nothing.
pub trait Decorator: Send + Sync + 'static {
    /// Display name used in validation messages and logs.
    ///
    /// Defaults to the type name without its module path.
    fn name(&self) -> &str {
        short_type_name(core::any::type_name::<Self>())
    }

    /// Identity of the concrete decorator type.
    ///
    /// Two slots with the same class are duplicates unless the decorator is
    /// stackable.
    fn class_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Whether several instances may be attached to the same owner.
    fn is_stackable(&self) -> bool {
        false
    }

    /// Whether the decorator may be attached to the graph itself.
    fn is_graph_allowed(&self) -> bool {
        true
    }

    /// Appends validation messages for this decorator.
    fn validate(&self, scope: &DecoratorScope<'_>, messages: &mut Vec<String>) {
        let _ = (scope, messages);
    }

    /// Returns whether the owning node may be entered.
    ///
    /// `session` is `None` when evaluated outside a running dialogue.
    fn evaluate(&self, scope: &DecoratorScope<'_>, session: Option<&dyn DialogueSession>) -> bool {
        let _ = (scope, session);
        true
    }

    /// Runs the decorator's side effect when the owning node is entered.
    fn execute(&self, scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        let _ = (scope, session);
    }
}

/// Type-erased decorator.
pub type BoxedDecorator = Box<dyn Decorator>;

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a decorator slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecoratorState {
    /// Not bound to a world.
    #[default]
    Uninitialized,
    /// Bound and ready to evaluate and execute.
    Initialized,
}

/// Runtime collaborators a decorator is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoratorBinding {
    /// The world the dialogue runs in.
    pub world: Option<WorldId>,
    /// The participant owning the graph.
    pub participant: Option<ParticipantId>,
    /// The manager running the dialogue.
    pub manager: Option<ManagerId>,
}

impl DecoratorBinding {
    /// Creates an empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the world.
    #[must_use]
    pub fn with_world(mut self, world: WorldId) -> Self {
        self.world = Some(world);
        self
    }

    /// Sets the owning participant.
    #[must_use]
    pub fn with_participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Sets the manager.
    #[must_use]
    pub fn with_manager(mut self, manager: ManagerId) -> Self {
        self.manager = Some(manager);
        self
    }
}

#[derive(Debug, Default)]
struct BindingState {
    state: DecoratorState,
    binding: DecoratorBinding,
}

// ─────────────────────────────────────────────────────────────────────────────
// DecoratorHandle
// ─────────────────────────────────────────────────────────────────────────────

/// A decorator slot: an optional behaviour plus its runtime binding.
pub struct DecoratorHandle {
    behavior: Option<BoxedDecorator>,
    binding: RwLock<BindingState>,
}

impl DecoratorHandle {
    /// Creates a slot holding `decorator`.
    #[must_use]
    pub fn new<D: Decorator>(decorator: D) -> Self {
        Self::from_boxed(Box::new(decorator))
    }

    /// Creates a slot from an already boxed decorator.
    #[must_use]
    pub fn from_boxed(decorator: BoxedDecorator) -> Self {
        Self {
            behavior: Some(decorator),
            binding: RwLock::new(BindingState::default()),
        }
    }

    /// Creates an empty slot. Empty slots fail validation.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            behavior: None,
            binding: RwLock::new(BindingState::default()),
        }
    }

    /// Returns `true` if the slot holds a decorator.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.behavior.is_some()
    }

    /// Returns the held decorator.
    #[must_use]
    pub fn decorator(&self) -> Option<&dyn Decorator> {
        self.behavior.as_deref()
    }

    /// Returns the decorator's name, or `"Empty"` for an empty slot.
    #[must_use]
    pub fn name(&self) -> &str {
        self.behavior.as_ref().map_or("Empty", |d| d.name())
    }

    /// Returns `true` if the held decorator is stackable.
    #[must_use]
    pub fn is_stackable(&self) -> bool {
        self.behavior.as_ref().is_some_and(|d| d.is_stackable())
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DecoratorState {
        self.binding.read().state
    }

    /// Returns a copy of the current binding.
    #[must_use]
    pub fn binding(&self) -> DecoratorBinding {
        self.binding.read().binding.clone()
    }

    /// Binds the decorator to its runtime collaborators.
    ///
    /// Fields that are `None` in `binding` keep their previous value. The
    /// slot becomes [`DecoratorState::Initialized`] once a world is bound.
    pub fn initialize(&self, binding: &DecoratorBinding) {
        let mut guard = self.binding.write();
        if let Some(world) = &binding.world {
            guard.binding.world = Some(world.clone());
        }
        if let Some(participant) = &binding.participant {
            guard.binding.participant = Some(participant.clone());
        }
        if let Some(manager) = &binding.manager {
            guard.binding.manager = Some(manager.clone());
        }
        if guard.binding.world.is_some() {
            guard.state = DecoratorState::Initialized;
        }
    }

    /// Drops the binding and returns to [`DecoratorState::Uninitialized`].
    pub fn cleanup(&self) {
        *self.binding.write() = BindingState::default();
    }

    /// Validates the slot and the held decorator.
    ///
    /// # Errors
    ///
    /// Returns every collected message when any check fails.
    pub fn validate(&self, scope: &DecoratorScope<'_>, mode: ValidationMode) -> Result<(), Vec<String>> {
        let Some(behavior) = &self.behavior else {
            return Err(vec!["Decorator slot is empty!".to_string()]);
        };

        let name = behavior.name();
        let mut messages = Vec::new();

        if mode == ValidationMode::Runtime {
            let guard = self.binding.read();
            if guard.binding.world.is_none() {
                messages.push(format!("[{name}]: No valid World!"));
            } else if guard.state == DecoratorState::Uninitialized {
                messages.push(format!("[{name}]: Decorator is not initialized!"));
            }
        }

        if let Attachment::Node(id) = scope.attachment
            && scope.graph.node(id).is_none()
        {
            messages.push(format!("[{name}]: No valid Owner!"));
        }

        if scope.attachment == Attachment::Graph && !behavior.is_graph_allowed() {
            messages.push(format!(
                "Decorator {name}: is not allowed in Graph Decorators!\nAttach this Decorator to Node instead."
            ));
        }

        behavior.validate(scope, &mut messages);

        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages)
        }
    }

    /// Evaluates the held decorator.
    ///
    /// Empty and uninitialized slots evaluate to `false`.
    #[must_use]
    pub fn evaluate(&self, scope: &DecoratorScope<'_>, session: Option<&dyn DialogueSession>) -> bool {
        let Some(behavior) = &self.behavior else {
            tracing::warn!(attachment = %scope.attachment, "evaluated an empty decorator slot");
            return false;
        };

        if self.state() == DecoratorState::Uninitialized {
            tracing::warn!(decorator = behavior.name(), "evaluated an uninitialized decorator");
            return false;
        }

        behavior.evaluate(scope, session)
    }

    /// Executes the held decorator.
    ///
    /// A decorator without a bound manager is skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`DecoratorError::Empty`] for an empty slot and
    /// [`DecoratorError::Uninitialized`] for a slot that was never bound.
    pub fn execute(
        &self,
        scope: &DecoratorScope<'_>,
        session: &mut dyn DialogueSession,
    ) -> Result<(), DecoratorError> {
        let Some(behavior) = &self.behavior else {
            return Err(DecoratorError::Empty {
                attachment: scope.attachment,
            });
        };

        let has_manager = {
            let guard = self.binding.read();
            if guard.state == DecoratorState::Uninitialized {
                return Err(DecoratorError::Uninitialized {
                    decorator: behavior.name().to_string(),
                });
            }
            guard.binding.manager.is_some()
        };

        if !has_manager {
            tracing::warn!(
                decorator = behavior.name(),
                "decorator has no manager bound, execution skipped"
            );
            return Ok(());
        }

        tracing::debug!(decorator = behavior.name(), attachment = %scope.attachment, "executing decorator");
        behavior.execute(scope, session);
        Ok(())
    }
}

impl fmt::Debug for DecoratorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorHandle")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// Errors raised when executing a decorator slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorError {
    /// The slot holds no decorator.
    Empty {
        /// Where the slot is attached.
        attachment: Attachment,
    },
    /// The decorator was executed before being initialized.
    Uninitialized {
        /// The decorator's name.
        decorator: String,
    },
}

impl fmt::Display for DecoratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorError::Empty { attachment } => {
                write!(f, "empty decorator slot on {attachment}")
            }
            DecoratorError::Uninitialized { decorator } => {
                write!(f, "decorator {decorator} executed before initialization")
            }
        }
    }
}

impl core::error::Error for DecoratorError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    struct Marker;
    impl Decorator for Marker {}

    struct NodeOnly;
    impl Decorator for NodeOnly {
        fn is_graph_allowed(&self) -> bool {
            false
        }
    }

    #[test]
    fn default_name_strips_module_path() {
        assert_eq!(Marker.name(), "Marker");
        assert_eq!(short_type_name("a::b::Thing<c::D>"), "Thing");
    }

    #[test]
    fn initialize_keeps_previous_fields() {
        let handle = DecoratorHandle::new(Marker);
        assert_eq!(handle.state(), DecoratorState::Uninitialized);

        handle.initialize(&DecoratorBinding::new().with_participant(ParticipantId::new("npc")));
        assert_eq!(handle.state(), DecoratorState::Uninitialized);

        handle.initialize(&DecoratorBinding::new().with_world(WorldId::new("main")));
        assert_eq!(handle.state(), DecoratorState::Initialized);
        assert_eq!(handle.binding().participant, Some(ParticipantId::new("npc")));

        handle.cleanup();
        assert_eq!(handle.state(), DecoratorState::Uninitialized);
        assert_eq!(handle.binding(), DecoratorBinding::default());
    }

    #[test]
    fn runtime_validation_requires_world() {
        let graph = Graph::new("test");
        let handle = DecoratorHandle::new(Marker);
        let scope = DecoratorScope::new(&graph, Attachment::Graph);

        assert!(handle.validate(&scope, ValidationMode::Editor).is_ok());
        let messages = handle
            .validate(&scope, ValidationMode::Runtime)
            .expect_err("runtime validation should fail");
        assert_eq!(messages, vec!["[Marker]: No valid World!".to_string()]);
    }

    #[test]
    fn node_only_decorator_rejected_on_graph() {
        let mut graph = Graph::new("test");
        let lead = graph.add_node(NodeKind::Complete);
        let handle = DecoratorHandle::new(NodeOnly);

        let on_graph = DecoratorScope::new(&graph, Attachment::Graph);
        assert!(handle.validate(&on_graph, ValidationMode::Editor).is_err());

        let on_node = DecoratorScope::new(&graph, Attachment::Node(lead));
        assert!(handle.validate(&on_node, ValidationMode::Editor).is_ok());

        let missing = DecoratorScope::new(&graph, Attachment::Node(NodeId::new(99)));
        let messages = handle
            .validate(&missing, ValidationMode::Editor)
            .expect_err("missing owner should fail");
        assert_eq!(messages, vec!["[NodeOnly]: No valid Owner!".to_string()]);
    }

    #[test]
    fn empty_slot_never_passes() {
        let graph = Graph::new("test");
        let handle = DecoratorHandle::empty();
        let scope = DecoratorScope::new(&graph, Attachment::Graph);

        assert!(!handle.is_valid());
        assert_eq!(handle.name(), "Empty");
        assert!(!handle.evaluate(&scope, None));
    }

    #[test]
    fn uninitialized_decorator_evaluates_false() {
        let graph = Graph::new("test");
        let handle = DecoratorHandle::new(Marker);
        let scope = DecoratorScope::new(&graph, Attachment::Graph);

        assert!(!handle.evaluate(&scope, None));
        handle.initialize(&DecoratorBinding::new().with_world(WorldId::new("main")));
        assert!(handle.evaluate(&scope, None));
    }
}

//! Dialogue participants.
//!
//! A [`Participant`] is anything that can take part in a conversation: it
//! owns the dialogue graph it offers, remembers where its next conversation
//! should start and keeps the history of nodes it has already been through.
//! Participants are shared between the host and the running manager as
//! [`SharedParticipant`].

use std::sync::Arc;

use colloquy_graph::Graph;
use colloquy_graph::id::{Guid, ParticipantId};
use colloquy_graph::node::NodeId;
use parking_lot::RwLock;

use crate::manager::DialogueError;

/// Participant shared between the host and the dialogue manager.
pub type SharedParticipant = Arc<RwLock<Participant>>;

/// Whether a participant can currently take part in a dialogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParticipantState {
    /// The participant ignores dialogue requests.
    Disabled,
    /// The participant is idle and available.
    #[default]
    Enabled,
    /// The participant is in a running dialogue.
    Active,
}

/// How often a node of a graph has been traversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversedNode {
    /// Guid of the traversed node.
    pub node: Guid,
    /// Guid of the graph the node belongs to.
    pub graph: Guid,
    /// Number of traversals.
    pub count: u32,
}

impl TraversedNode {
    /// Creates an entry with the given count.
    #[must_use]
    pub fn new(node: Guid, graph: Guid, count: u32) -> Self {
        Self { node, graph, count }
    }
}

/// A command received from a decorator during a dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedCommand {
    /// Command string.
    pub command: String,
    /// Optional payload.
    pub payload: Option<String>,
}

/// An entity that can take part in dialogues.
#[derive(Debug)]
pub struct Participant {
    id: ParticipantId,
    role_tag: Option<String>,
    graph: Option<Arc<Graph>>,
    starting_node: Option<NodeId>,
    traversed_path: Vec<TraversedNode>,
    state: ParticipantState,
    default_state: ParticipantState,
    commands: Vec<ReceivedCommand>,
}

impl Participant {
    /// Creates an enabled participant without a graph.
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            role_tag: None,
            graph: None,
            starting_node: None,
            traversed_path: Vec::new(),
            state: ParticipantState::Enabled,
            default_state: ParticipantState::Enabled,
            commands: Vec::new(),
        }
    }

    /// Sets the participant's role tag.
    #[must_use]
    pub fn with_role_tag(mut self, tag: impl Into<String>) -> Self {
        self.role_tag = Some(tag.into());
        self
    }

    /// Assigns a dialogue graph while building the participant.
    #[must_use]
    pub fn with_graph(mut self, graph: Graph) -> Self {
        graph_assigned(&mut self, graph);
        self
    }

    /// Wraps the participant for sharing.
    #[must_use]
    pub fn shared(self) -> SharedParticipant {
        Arc::new(RwLock::new(self))
    }

    /// Returns the participant identifier.
    #[must_use]
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Returns the role tag, if any.
    #[must_use]
    pub fn role_tag(&self) -> Option<&str> {
        self.role_tag.as_deref()
    }

    /// Returns the participant's dialogue graph.
    #[must_use]
    pub fn graph(&self) -> Option<&Arc<Graph>> {
        self.graph.as_ref()
    }

    /// Returns the saved starting node.
    #[must_use]
    pub fn starting_node(&self) -> Option<NodeId> {
        self.starting_node
    }

    /// Returns the merged traversal history.
    #[must_use]
    pub fn traversed_path(&self) -> &[TraversedNode] {
        &self.traversed_path
    }

    /// Returns the commands received so far.
    #[must_use]
    pub fn commands(&self) -> &[ReceivedCommand] {
        &self.commands
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ParticipantState {
        self.state
    }

    /// Returns the state restored when a dialogue ends.
    #[must_use]
    pub fn default_state(&self) -> ParticipantState {
        self.default_state
    }

    /// Sets the current state.
    pub fn set_state(&mut self, state: ParticipantState) {
        if self.state != state {
            tracing::debug!(participant = %self.id, from = ?self.state, to = ?state, "participant state changed");
            self.state = state;
        }
    }

    /// Sets the state restored when a dialogue ends.
    pub fn set_default_state(&mut self, state: ParticipantState) {
        self.default_state = state;
    }

    /// Returns `true` if this participant can open a dialogue with its own
    /// graph: it is enabled and its graph has a start node with children.
    #[must_use]
    pub fn can_start_dialogue(&self) -> bool {
        let graph_ready = self.graph.as_ref().is_some_and(|graph| {
            graph
                .start_node()
                .and_then(|start| graph.node(start))
                .is_some_and(|start| !start.children().is_empty())
        });
        self.state == ParticipantState::Enabled && graph_ready
    }

    /// Returns `true` if this participant can join a dialogue.
    #[must_use]
    pub fn can_participate(&self) -> bool {
        self.state == ParticipantState::Enabled
    }

    /// Replaces the dialogue graph.
    ///
    /// Node indices are assigned before the graph is stored and any saved
    /// starting node is forgotten.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueError::ParticipantActive`] while the participant is
    /// in a dialogue.
    pub fn set_dialogue_graph(&mut self, graph: Graph) -> Result<(), DialogueError> {
        if self.state == ParticipantState::Active {
            return Err(DialogueError::ParticipantActive(self.id.clone()));
        }
        graph_assigned(self, graph);
        Ok(())
    }

    /// Saves the node the next dialogue should start from.
    ///
    /// Returns `false` if the node does not belong to this participant's graph.
    pub fn save_starting_node(&mut self, node: NodeId) -> bool {
        let owned = self
            .graph
            .as_ref()
            .is_some_and(|graph| graph.node(node).is_some());
        if owned {
            self.starting_node = Some(node);
            tracing::debug!(participant = %self.id, %node, "starting node saved");
        }
        owned
    }

    /// Forgets the saved starting node.
    pub fn clear_starting_node(&mut self) {
        self.starting_node = None;
    }

    /// Returns how often a node of a graph has been traversed.
    #[must_use]
    pub fn traversal_count(&self, graph: &Guid, node: &Guid) -> u32 {
        self.traversed_path
            .iter()
            .find(|entry| &entry.graph == graph && &entry.node == node)
            .map_or(0, |entry| entry.count)
    }

    /// Merges a finished session's path into the history, summing counts.
    pub fn record_traversal(&mut self, path: &[TraversedNode]) {
        for step in path {
            match self
                .traversed_path
                .iter_mut()
                .find(|entry| entry.graph == step.graph && entry.node == step.node)
            {
                Some(entry) => entry.count += step.count,
                None => self.traversed_path.push(step.clone()),
            }
        }
    }

    /// Receives a command sent by a decorator.
    pub fn process_command(&mut self, command: &str, payload: Option<&str>) {
        tracing::debug!(participant = %self.id, command, payload, "command received");
        self.commands.push(ReceivedCommand {
            command: command.to_string(),
            payload: payload.map(str::to_string),
        });
    }
}

fn graph_assigned(participant: &mut Participant, mut graph: Graph) {
    graph.initialize_nodes();
    tracing::debug!(participant = %participant.id, graph = %graph.name, "dialogue graph assigned");
    participant.graph = Some(Arc::new(graph));
    participant.starting_node = None;
}

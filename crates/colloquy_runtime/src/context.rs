//! Transient state of one dialogue session.
//!
//! A [`DialogueContext`] is created by the manager when a dialogue starts and
//! dropped when it closes. It tracks the active node and row, the people in
//! the conversation and the nodes traversed during this session. It is the
//! [`DialogueSession`] that decorators read and mutate.

use std::sync::Arc;

use colloquy_graph::decorator::DialogueSession;
use colloquy_graph::id::Guid;
use colloquy_graph::node::NodeId;
use colloquy_graph::row::{DialogueRow, RowHandle};
use colloquy_graph::Graph;

use crate::participant::{SharedParticipant, TraversedNode};

/// The parts of a [`DialogueContext`] replicated from the authority.
///
/// Nodes are identified by guid so a snapshot can be applied to another
/// copy of the same graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    /// Guid of the graph being played.
    pub graph: Guid,
    /// Guid of the active node.
    pub active_node: Option<Guid>,
    /// Index of the row data being shown.
    pub row_data_index: usize,
    /// Nodes traversed in the session so far.
    pub traversed_path: Vec<TraversedNode>,
}

/// State of a running dialogue.
#[derive(Debug)]
pub struct DialogueContext {
    graph: Arc<Graph>,
    active_node: Option<NodeId>,
    allowed_children: Vec<NodeId>,
    active_row: Option<RowHandle>,
    row_data_index: usize,
    active_participant: Option<SharedParticipant>,
    player_participant: Option<SharedParticipant>,
    dialogue_participant: Option<SharedParticipant>,
    participants: Vec<SharedParticipant>,
    traversed_path: Vec<TraversedNode>,
}

impl DialogueContext {
    /// Creates a context for `graph`.
    ///
    /// The dialogue participant owns the graph and starts as the active
    /// participant.
    #[must_use]
    pub fn new(
        graph: Arc<Graph>,
        player: SharedParticipant,
        dialogue: SharedParticipant,
        participants: Vec<SharedParticipant>,
    ) -> Self {
        Self {
            graph,
            active_node: None,
            allowed_children: Vec::new(),
            active_row: None,
            row_data_index: 0,
            active_participant: Some(Arc::clone(&dialogue)),
            player_participant: Some(player),
            dialogue_participant: Some(dialogue),
            participants,
            traversed_path: Vec::new(),
        }
    }

    /// Returns `true` if there is an active node and both the player and
    /// dialogue participants are set.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.active_node.is_some()
            && self.dialogue_participant.is_some()
            && self.player_participant.is_some()
    }

    /// Returns the graph being played.
    #[must_use]
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Returns the active node.
    #[must_use]
    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    /// Returns the children of the active node whose decorators passed.
    #[must_use]
    pub fn allowed_children(&self) -> &[NodeId] {
        &self.allowed_children
    }

    /// Returns the active row handle.
    #[must_use]
    pub fn active_row(&self) -> Option<&RowHandle> {
        self.active_row.as_ref()
    }

    /// Resolves the active row, if it is valid.
    #[must_use]
    pub fn resolve_active_row(&self) -> Option<&DialogueRow> {
        self.active_row.as_ref().and_then(RowHandle::resolve)
    }

    /// Returns the index of the row data being shown.
    #[must_use]
    pub fn row_data_index(&self) -> usize {
        self.row_data_index
    }

    /// Returns the participant currently speaking.
    #[must_use]
    pub fn active_participant(&self) -> Option<&SharedParticipant> {
        self.active_participant.as_ref()
    }

    /// Returns the player participant.
    #[must_use]
    pub fn player_participant(&self) -> Option<&SharedParticipant> {
        self.player_participant.as_ref()
    }

    /// Returns the participant owning the graph.
    #[must_use]
    pub fn dialogue_participant(&self) -> Option<&SharedParticipant> {
        self.dialogue_participant.as_ref()
    }

    /// Returns every other participant in the conversation.
    #[must_use]
    pub fn participants(&self) -> &[SharedParticipant] {
        &self.participants
    }

    /// Returns the nodes traversed in this session.
    #[must_use]
    pub fn traversed_path(&self) -> &[TraversedNode] {
        &self.traversed_path
    }

    /// Makes `node` the active node.
    ///
    /// The active row is reset to the node's own row and the allowed
    /// children are recomputed.
    pub fn set_active_node(&mut self, node: NodeId) {
        self.active_node = Some(node);
        self.active_row = self
            .graph
            .node(node)
            .and_then(|node| node.kind().dialogue_data())
            .and_then(|data| data.row.clone());
        self.row_data_index = 0;
        self.refresh_allowed_children();
    }

    /// Re-evaluates the decorators of the active node's children.
    pub fn refresh_allowed_children(&mut self) {
        let graph = Arc::clone(&self.graph);
        self.allowed_children = match self.active_node {
            Some(node) => graph.allowed_children(node, Some(&*self)),
            None => Vec::new(),
        };
    }

    /// Sets the active row and restarts its data at index zero.
    pub fn update_active_row(&mut self, row: Option<RowHandle>) {
        self.active_row = row;
        self.row_data_index = 0;
    }

    /// Sets the row data index.
    pub fn update_row_data_index(&mut self, index: usize) {
        self.row_data_index = index;
    }

    /// Makes `participant` the active participant.
    ///
    /// Only the player or the dialogue participant can become active;
    /// returns `false` for anyone else.
    pub fn update_active_participant(&mut self, participant: &SharedParticipant) -> bool {
        let known = [&self.player_participant, &self.dialogue_participant]
            .into_iter()
            .flatten()
            .any(|candidate| Arc::ptr_eq(candidate, participant));
        if known {
            self.active_participant = Some(Arc::clone(participant));
        }
        known
    }

    /// Increments the session traversal count of `node`.
    pub fn record_traversal(&mut self, node: NodeId) {
        let Some(guid) = self.graph.node(node).map(|node| node.guid.clone()) else {
            return;
        };
        match self
            .traversed_path
            .iter_mut()
            .find(|entry| entry.node == guid)
        {
            Some(entry) => entry.count += 1,
            None => self
                .traversed_path
                .push(TraversedNode::new(guid, self.graph.guid.clone(), 1)),
        }
    }

    /// Captures the replicated parts of this context.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            graph: self.graph.guid.clone(),
            active_node: self
                .active_node
                .and_then(|node| self.graph.node(node))
                .map(|node| node.guid.clone()),
            row_data_index: self.row_data_index,
            traversed_path: self.traversed_path.clone(),
        }
    }

    /// Overwrites this context with an authoritative snapshot.
    ///
    /// Returns `false`, leaving the context untouched, if the snapshot
    /// belongs to another graph or names a node this graph lacks.
    pub fn apply_snapshot(&mut self, snapshot: &ContextSnapshot) -> bool {
        if snapshot.graph != self.graph.guid {
            return false;
        }
        let node = match &snapshot.active_node {
            Some(guid) => match self.graph.find_node_by_guid(guid) {
                Some(node) => Some(node),
                None => return false,
            },
            None => None,
        };

        match node {
            Some(node) if self.active_node != Some(node) => self.set_active_node(node),
            Some(_) => {}
            None => {
                self.active_node = None;
                self.active_row = None;
                self.allowed_children.clear();
            }
        }
        self.row_data_index = snapshot.row_data_index;
        self.traversed_path.clone_from(&snapshot.traversed_path);
        true
    }

    fn is_active(&self, participant: Option<&SharedParticipant>) -> bool {
        match (&self.active_participant, participant) {
            (Some(active), Some(other)) => Arc::ptr_eq(active, other),
            _ => false,
        }
    }
}

impl DialogueSession for DialogueContext {
    fn traversal_count(&self, guid: &Guid) -> u32 {
        let session = self
            .traversed_path
            .iter()
            .find(|entry| &entry.node == guid)
            .map_or(0, |entry| entry.count);
        let history = self.dialogue_participant.as_ref().map_or(0, |participant| {
            participant.read().traversal_count(&self.graph.guid, guid)
        });
        session + history
    }

    fn save_starting_node(&mut self, node: NodeId) -> bool {
        self.dialogue_participant
            .as_ref()
            .is_some_and(|participant| participant.write().save_starting_node(node))
    }

    fn process_command(&mut self, command: &str, payload: Option<&str>) {
        if let Some(participant) = &self.dialogue_participant {
            participant.write().process_command(command, payload);
        }
    }

    fn swap_active_participant(&mut self) {
        let next = if self.is_active(self.player_participant.as_ref()) {
            self.dialogue_participant.clone()
        } else {
            self.player_participant.clone()
        };
        if next.is_some() {
            self.active_participant = next;
        }
    }

    fn active_row_data_len(&self) -> Option<usize> {
        self.resolve_active_row().map(|row| row.data.len())
    }

    fn set_active_row_data_index(&mut self, index: usize) {
        if self.active_row_data_len().is_some_and(|len| index < len) {
            self.row_data_index = index;
        }
    }

    fn override_active_row(&mut self, row: &RowHandle) -> bool {
        if row.resolve().is_none() {
            return false;
        }
        self.update_active_row(Some(row.clone()));
        true
    }
}

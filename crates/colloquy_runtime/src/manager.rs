//! The dialogue manager state machine.
//!
//! A [`DialogueManager`] plays one dialogue at a time. It builds a
//! [`DialogueContext`] from the participants' graph, walks it node by node,
//! shows rows for as long as [`row_duration`] says, offers options to the
//! widget and closes the session when the graph runs out.
//!
//! Progress is driven by the host calling [`update`](DialogueManager::update)
//! every frame; row and delay timers are deadlines checked against the
//! manager's [`Clock`].
//!
//! # Lifecycle
//!
//! ```text
//! Default ──request_start_dialogue──▶ Active ──close_dialogue──▶ default_state
//!    ▲                                  │
//!    └────────────── failure ───────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut manager = DialogueManager::new(ManagerId::new("npc_manager"))
//!     .with_world(WorldId::new("main"))
//!     .with_widget(Box::new(MyWidget::default()));
//!
//! manager.request_start_dialogue(&player, &[npc])?;
//! loop {
//!     manager.update()?;
//! }
//! ```

use core::fmt;
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use colloquy_core::{Clock, DialogueSettings, SubtitlesKey, SubtitlesSettings};
use colloquy_graph::decorator::{DecoratorBinding, DecoratorError};
use colloquy_graph::id::{Guid, ManagerId, ParticipantId, WorldId};
use colloquy_graph::node::{NodeClass, NodeId, NodeKind};
use colloquy_graph::row::row_duration;
use colloquy_graph::{Graph, Node, ValidationError};
use parking_lot::RwLock;

use crate::context::{ContextSnapshot, DialogueContext};
use crate::hooks::{DialogueEvent, DialogueHooks, EventKind};
use crate::participant::{ParticipantState, SharedParticipant};
use crate::ui::{DialogueWidget, WidgetCommand};

/// Manager shared between the host and the sync component.
pub type SharedManager = Arc<RwLock<DialogueManager>>;

/// State of a dialogue manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ManagerState {
    /// Idle and ready to start a dialogue.
    #[default]
    Default,
    /// Playing a dialogue.
    Active,
    /// Refuses to start dialogues.
    Inactive,
}

/// Errors raised while starting or running a dialogue.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    /// The manager is not bound to a world.
    #[error("Cannot find World!")]
    MissingWorld,

    /// The context is missing or incomplete.
    #[error("Invalid Dialogue Context!")]
    InvalidContext,

    /// The active row is missing, empty or its index is out of range.
    #[error("Dialogue Row data contain Invalid Rows!")]
    InvalidRows,

    /// The participant offering the dialogue has no graph.
    #[error("Participant {0} has no Dialogue Graph!")]
    MissingGraph(ParticipantId),

    /// The graph failed runtime validation.
    #[error("Dialogue Graph {graph} is not valid ({} errors)", .errors.len())]
    InvalidGraph {
        /// Graph name.
        graph: String,
        /// Every violation found.
        errors: Vec<ValidationError>,
    },

    /// The manager is not in a state that can start a dialogue.
    #[error("Dialogue Manager is {0:?} and cannot start a dialogue!")]
    NotStartable(ManagerState),

    /// The graph's start node has no child that may be entered.
    #[error("Dialogue Graph {0} has only Start Node and no Nodes to start!")]
    NothingToStart(String),

    /// A delay is too long to be scheduled.
    #[error("Delay of {0:?} is out of range!")]
    InvalidDelay(Duration),

    /// The participant offering the dialogue cannot start one.
    #[error("Participant {0} cannot start a dialogue!")]
    ParticipantCannotStart(ParticipantId),

    /// The initiator cannot take part in a dialogue.
    #[error("Participant {0} cannot join the dialogue!")]
    ParticipantUnavailable(ParticipantId),

    /// Every requested participant was skipped.
    #[error("No participant can join the dialogue!")]
    NoParticipants,

    /// A participant's graph cannot change during a dialogue.
    #[error("Participant {0} is in a dialogue and cannot change its graph!")]
    ParticipantActive(ParticipantId),

    /// The guid is not among the allowed children of the active node.
    #[error("Node {0} is not a valid option!")]
    InvalidSelection(Guid),

    /// A decorator failed while a node was entered.
    #[error(transparent)]
    Decorator(#[from] DecoratorError),
}

impl DialogueError {
    /// Returns `true` if this error ends a running session.
    #[must_use]
    pub fn aborts_session(&self) -> bool {
        !matches!(
            self,
            DialogueError::NotStartable(_)
                | DialogueError::InvalidSelection(_)
                | DialogueError::ParticipantActive(_)
        )
    }
}

/// Plays dialogues between participants.
pub struct DialogueManager {
    id: ManagerId,
    world: Option<WorldId>,
    state: ManagerState,
    default_state: ManagerState,
    settings: DialogueSettings,
    clock: Clock,
    hooks: Arc<DialogueHooks>,
    widget: Option<Box<dyn DialogueWidget>>,
    widget_class: Option<String>,
    z_order: i32,
    context: Option<DialogueContext>,
    replicated: Option<ContextSnapshot>,
    row_deadline: Option<Instant>,
    delay_deadline: Option<Instant>,
    options_offered: bool,
}

impl DialogueManager {
    /// Creates an idle manager with default settings and the system clock.
    #[must_use]
    pub fn new(id: ManagerId) -> Self {
        Self {
            id,
            world: None,
            state: ManagerState::Default,
            default_state: ManagerState::Default,
            settings: DialogueSettings::default(),
            clock: Clock::system(),
            hooks: Arc::new(DialogueHooks::new()),
            widget: None,
            widget_class: None,
            z_order: 0,
            context: None,
            replicated: None,
            row_deadline: None,
            delay_deadline: None,
            options_offered: false,
        }
    }

    /// Binds the manager to a world.
    #[must_use]
    pub fn with_world(mut self, world: WorldId) -> Self {
        self.world = Some(world);
        self
    }

    /// Replaces the settings.
    ///
    /// Settings that fail [`DialogueSettings::validate`] are ignored.
    #[must_use]
    pub fn with_settings(mut self, settings: DialogueSettings) -> Self {
        match settings.validate() {
            Ok(()) => self.settings = settings,
            Err(error) => tracing::warn!(manager = %self.id, %error, "settings rejected"),
        }
        self
    }

    /// Sets the state the manager rests in, and moves it there.
    ///
    /// `Active` cannot be a resting state and is ignored.
    #[must_use]
    pub fn with_default_state(mut self, state: ManagerState) -> Self {
        if state == ManagerState::Active {
            tracing::warn!(manager = %self.id, "Active cannot be a default state");
            return self;
        }
        self.default_state = state;
        self.state = state;
        self
    }

    /// Registers the widget driven by this manager.
    #[must_use]
    pub fn with_widget(mut self, widget: Box<dyn DialogueWidget>) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Sets the widget class, overriding the settings' default class.
    #[must_use]
    pub fn with_widget_class(mut self, class: impl Into<String>) -> Self {
        self.widget_class = Some(class.into());
        self
    }

    /// Sets the Z-order the widget is shown at.
    #[must_use]
    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    /// Replaces the clock used for row and delay timers.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Shares a hook registry with other components.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<DialogueHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Wraps the manager for sharing.
    #[must_use]
    pub fn shared(self) -> SharedManager {
        Arc::new(RwLock::new(self))
    }

    /// Returns the manager identifier.
    #[must_use]
    pub fn id(&self) -> &ManagerId {
        &self.id
    }

    /// Returns the world the manager is bound to.
    #[must_use]
    pub fn world(&self) -> Option<&WorldId> {
        self.world.as_ref()
    }

    /// Binds or unbinds the world.
    pub fn set_world(&mut self, world: Option<WorldId>) {
        self.world = world;
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Returns the resting state.
    #[must_use]
    pub fn default_state(&self) -> ManagerState {
        self.default_state
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    /// Returns the widget class: the manager's own, else the settings' default.
    #[must_use]
    pub fn widget_class(&self) -> Option<&str> {
        self.widget_class
            .as_deref()
            .or(self.settings.default_widget_class.as_deref())
    }

    /// Returns the Z-order the widget is shown at.
    #[must_use]
    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    /// Returns the subtitle settings for rows with `ui_row_id` shown in
    /// this manager's widget.
    #[must_use]
    pub fn subtitles_for(&self, ui_row_id: u8) -> &SubtitlesSettings {
        let key = match self.widget_class() {
            Some(class) => SubtitlesKey::new(class, ui_row_id),
            None => SubtitlesKey {
                widget_class: None,
                ui_row_id,
            },
        };
        self.settings.subtitles_for(&key)
    }

    /// Returns the hook registry.
    #[must_use]
    pub fn hooks(&self) -> &Arc<DialogueHooks> {
        &self.hooks
    }

    /// Returns the running dialogue's context.
    #[must_use]
    pub fn context(&self) -> Option<&DialogueContext> {
        self.context.as_ref()
    }

    /// Returns the last context received from the network authority.
    #[must_use]
    pub fn replicated_context(&self) -> Option<&ContextSnapshot> {
        self.replicated.as_ref()
    }

    /// Captures the running dialogue's context for replication.
    #[must_use]
    pub fn context_snapshot(&self) -> Option<ContextSnapshot> {
        self.context.as_ref().map(DialogueContext::snapshot)
    }

    /// Receives the authoritative context.
    ///
    /// The snapshot is always stored. When this manager runs its own copy
    /// of the dialogue, the snapshot is applied to it and `ContextUpdated`
    /// is broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueError::InvalidContext`] if the local dialogue does
    /// not match the snapshot. The local session is left running.
    pub fn receive_context(&mut self, snapshot: ContextSnapshot) -> Result<(), DialogueError> {
        let applied = self
            .context
            .as_mut()
            .map(|context| context.apply_snapshot(&snapshot));
        tracing::debug!(manager = %self.id, node = ?snapshot.active_node, "context received");
        self.replicated = Some(snapshot);

        match applied {
            Some(true) => {
                self.emit(EventKind::ContextUpdated);
                Ok(())
            }
            Some(false) => {
                tracing::warn!(manager = %self.id, "received context does not match the running dialogue");
                Err(DialogueError::InvalidContext)
            }
            None => Ok(()),
        }
    }

    /// Returns `true` while a dialogue is playing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ManagerState::Active
    }

    /// Returns `true` while the widget shows the allowed children as options.
    #[must_use]
    pub fn has_options(&self) -> bool {
        self.options_offered
    }

    /// Time left before the current row line finishes.
    #[must_use]
    pub fn row_time_remaining(&self) -> Option<Duration> {
        self.row_deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Time left before the current delay expires.
    #[must_use]
    pub fn delay_time_remaining(&self) -> Option<Duration> {
        self.delay_deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Returns `true` if `participant` could open a dialogue here now.
    #[must_use]
    pub fn can_start_dialogue(&self, participant: &SharedParticipant) -> bool {
        self.world.is_some()
            && self.state == ManagerState::Default
            && participant.read().can_start_dialogue()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Starting
    // ─────────────────────────────────────────────────────────────────────

    /// Starts a dialogue between `initiator` (the player) and `participants`.
    ///
    /// The first participant that can participate offers the graph. The
    /// initiator is never counted twice.
    ///
    /// # Errors
    ///
    /// Returns a [`DialogueError`] if the dialogue cannot start. A `Failed`
    /// event is broadcast for every error.
    pub fn request_start_dialogue(
        &mut self,
        initiator: &SharedParticipant,
        participants: &[SharedParticipant],
    ) -> Result<(), DialogueError> {
        tracing::debug!(manager = %self.id, participants = participants.len(), "dialogue start requested");
        let result = self.start_dialogue(initiator, participants);
        self.guard(result)
    }

    fn start_dialogue(
        &mut self,
        initiator: &SharedParticipant,
        participants: &[SharedParticipant],
    ) -> Result<(), DialogueError> {
        let world = self.world.clone().ok_or(DialogueError::MissingWorld)?;
        if self.state != ManagerState::Default {
            return Err(DialogueError::NotStartable(self.state));
        }

        {
            let player = initiator.read();
            if !player.can_participate() {
                return Err(DialogueError::ParticipantUnavailable(player.id().clone()));
            }
        }

        let mut joined: Vec<SharedParticipant> = Vec::new();
        for participant in participants {
            if Arc::ptr_eq(participant, initiator)
                || joined.iter().any(|other| Arc::ptr_eq(other, participant))
            {
                continue;
            }
            let candidate = participant.read();
            if candidate.can_participate() {
                joined.push(Arc::clone(participant));
            } else {
                tracing::debug!(participant = %candidate.id(), state = ?candidate.state(), "participant skipped");
            }
        }
        if joined.is_empty() {
            return Err(DialogueError::NoParticipants);
        }
        let main = joined.remove(0);

        let (main_id, graph, saved) = {
            let owner = main.read();
            let graph = owner
                .graph()
                .cloned()
                .ok_or_else(|| DialogueError::MissingGraph(owner.id().clone()))?;
            if !owner.can_start_dialogue() {
                return Err(DialogueError::ParticipantCannotStart(owner.id().clone()));
            }
            (owner.id().clone(), graph, owner.starting_node())
        };

        let binding = DecoratorBinding::new()
            .with_world(world)
            .with_participant(main_id)
            .with_manager(self.id.clone());
        graph.initialize_decorators(&binding);

        if let Err(errors) = graph.validate_runtime() {
            graph.cleanup_decorators();
            return Err(DialogueError::InvalidGraph {
                graph: graph.name.clone(),
                errors,
            });
        }

        let mut context = DialogueContext::new(
            Arc::clone(&graph),
            Arc::clone(initiator),
            Arc::clone(&main),
            joined,
        );
        let starting = match starting_node(&graph, saved, &context) {
            Ok(node) => node,
            Err(error) => {
                graph.cleanup_decorators();
                return Err(error);
            }
        };
        context.set_active_node(starting);

        for participant in session_participants(&context) {
            participant.write().set_state(ParticipantState::Active);
        }

        tracing::info!(manager = %self.id, graph = %graph.name, node = %starting, "dialogue started");
        self.context = Some(context);
        self.transition(ManagerState::Active);
        self.emit(EventKind::Initialized);
        self.emit(EventKind::ContextUpdated);
        self.emit(EventKind::Started);
        self.refresh_widget(WidgetCommand::CreateDialogueWidget);

        self.process_node()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────────────

    fn process_node(&mut self) -> Result<(), DialogueError> {
        if self.world.is_none() {
            return Err(DialogueError::MissingWorld);
        }
        self.prepare_node()?;

        let (node, kind) = {
            let context = self.context.as_ref().ok_or(DialogueError::InvalidContext)?;
            let node = context.active_node().ok_or(DialogueError::InvalidContext)?;
            let kind = context
                .graph()
                .node(node)
                .map(|entry| entry.kind().clone())
                .ok_or(DialogueError::InvalidContext)?;
            (node, kind)
        };
        tracing::debug!(manager = %self.id, %node, class = %kind.class(), "processing node");
        self.emit(EventKind::NodeStarted);

        match kind {
            NodeKind::Lead(_) | NodeKind::Answer(_) => self.process_node_dialogue(),
            NodeKind::Complete | NodeKind::AutoComplete => {
                self.process_node_complete();
                Ok(())
            }
            NodeKind::Delay { duration } => self.start_delay(duration),
            NodeKind::ReturnToNode(data) => self.start_delay(data.delay),
            NodeKind::Start => self.node_finished(),
        }
    }

    fn prepare_node(&mut self) -> Result<(), DialogueError> {
        let context = self.context.as_mut().ok_or(DialogueError::InvalidContext)?;
        if !context.is_valid() {
            return Err(DialogueError::InvalidContext);
        }
        let node = context.active_node().ok_or(DialogueError::InvalidContext)?;
        let graph = Arc::clone(context.graph());
        graph.execute_decorators(node, &mut *context)?;
        context.record_traversal(node);
        Ok(())
    }

    fn process_node_dialogue(&mut self) -> Result<(), DialogueError> {
        self.clear_timers();
        let context = self.context.as_ref().ok_or(DialogueError::InvalidContext)?;
        let rows = context
            .resolve_active_row()
            .map(|row| row.data.len())
            .ok_or(DialogueError::InvalidRows)?;
        if context.row_data_index() >= rows {
            return Err(DialogueError::InvalidRows);
        }
        self.emit(EventKind::ContextUpdated);
        self.start_execute_dialogue_row(WidgetCommand::ShowDialogueRow)
    }

    fn process_node_complete(&mut self) {
        tracing::debug!(manager = %self.id, "complete node reached");
        self.close_dialogue();
    }

    fn node_finished(&mut self) -> Result<(), DialogueError> {
        self.clear_timers();
        let context = self.context.as_mut().ok_or(DialogueError::InvalidContext)?;
        context.refresh_allowed_children();
        let graph = Arc::clone(context.graph());
        let allowed = context.allowed_children().to_vec();
        let was_dialogue = context
            .active_node()
            .and_then(|node| graph.node(node))
            .is_some_and(Node::is_dialogue);

        self.emit(EventKind::NodeFinished);
        if was_dialogue {
            self.refresh_widget(WidgetCommand::HideDialogueRow);
        }

        let Some(first) = allowed.first().copied() else {
            tracing::debug!(manager = %self.id, "no allowed children left");
            self.close_dialogue();
            return Ok(());
        };
        if graph.node(first).is_some_and(Node::auto_starts) {
            return self.enter_node(first);
        }

        tracing::debug!(manager = %self.id, options = allowed.len(), "offering options");
        self.options_offered = true;
        self.refresh_widget(WidgetCommand::AddDialogueOptions);
        Ok(())
    }

    fn enter_node(&mut self, node: NodeId) -> Result<(), DialogueError> {
        self.clear_timers();
        if core::mem::take(&mut self.options_offered) {
            self.refresh_widget(WidgetCommand::RemoveDialogueOptions);
        }
        let context = self.context.as_mut().ok_or(DialogueError::InvalidContext)?;
        context.set_active_node(node);
        tracing::debug!(manager = %self.id, %node, "node selected");
        self.emit(EventKind::NodeSelected);
        self.emit(EventKind::ContextUpdated);
        self.process_node()
    }

    /// Selects one of the allowed children of the active node.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueError::InvalidSelection`] if `guid` is not an
    /// allowed child, or whatever error processing the node raises.
    pub fn select_node(&mut self, guid: &Guid) -> Result<(), DialogueError> {
        let Some(context) = self.context.as_ref() else {
            tracing::warn!(manager = %self.id, %guid, "node selected without a dialogue");
            return Err(DialogueError::InvalidContext);
        };
        let graph = context.graph();
        let Some(node) = context
            .allowed_children()
            .iter()
            .copied()
            .find(|child| graph.node(*child).is_some_and(|entry| &entry.guid == guid))
        else {
            tracing::warn!(manager = %self.id, %guid, "node is not an allowed option");
            return Err(DialogueError::InvalidSelection(guid.clone()));
        };
        let result = self.enter_node(node);
        self.guard(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rows
    // ─────────────────────────────────────────────────────────────────────

    fn start_execute_dialogue_row(&mut self, command: WidgetCommand) -> Result<(), DialogueError> {
        let (index, duration) = {
            let context = self.context.as_ref().ok_or(DialogueError::InvalidContext)?;
            let row = context.resolve_active_row().ok_or(DialogueError::InvalidRows)?;
            let index = context.row_data_index();
            let data = row.data.get(index).ok_or(DialogueError::InvalidRows)?;
            let duration = row_duration(data, self.settings.duration_coefficient)
                .ok_or(DialogueError::InvalidRows)?;
            (index, duration)
        };

        let deadline = self
            .clock
            .now()
            .checked_add(duration)
            .ok_or(DialogueError::InvalidRows)?;
        self.row_deadline = Some(deadline);
        tracing::debug!(manager = %self.id, index, ?duration, "row timer started");
        self.refresh_widget(command);
        self.emit(EventKind::RowStarted);
        Ok(())
    }

    fn finished_execute_dialogue_row(&mut self) -> Result<(), DialogueError> {
        if self.world.is_none() {
            return Err(DialogueError::MissingWorld);
        }
        self.row_deadline = None;

        let next = {
            let context = self.context.as_ref().ok_or(DialogueError::InvalidContext)?;
            let next = context.row_data_index() + 1;
            context
                .resolve_active_row()
                .is_some_and(|row| next < row.data.len())
                .then_some(next)
        };
        self.emit(EventKind::RowFinished);

        match next {
            Some(index) => {
                if let Some(context) = self.context.as_mut() {
                    context.update_row_data_index(index);
                }
                self.emit(EventKind::ContextUpdated);
                self.start_execute_dialogue_row(WidgetCommand::UpdateDialogueRow)
            }
            None => self.node_finished(),
        }
    }

    /// Finishes the current row line immediately.
    ///
    /// Does nothing when no row is showing.
    ///
    /// # Errors
    ///
    /// Returns whatever error advancing the dialogue raises.
    pub fn skip_row(&mut self) -> Result<(), DialogueError> {
        if self.row_deadline.is_none() {
            return Ok(());
        }
        tracing::debug!(manager = %self.id, "row skipped");
        let result = self.finished_execute_dialogue_row();
        self.guard(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Timers
    // ─────────────────────────────────────────────────────────────────────

    /// Advances the dialogue if a row or delay timer has expired.
    ///
    /// Call once per frame.
    ///
    /// # Errors
    ///
    /// Returns whatever error advancing the dialogue raises.
    pub fn update(&mut self) -> Result<(), DialogueError> {
        if self.state != ManagerState::Active {
            return Ok(());
        }
        let now = self.clock.now();
        let result = if self.row_deadline.is_some_and(|deadline| now >= deadline) {
            self.finished_execute_dialogue_row()
        } else if self.delay_deadline.is_some_and(|deadline| now >= deadline) {
            self.delay_expired()
        } else {
            Ok(())
        };
        self.guard(result)
    }

    fn start_delay(&mut self, duration: Duration) -> Result<(), DialogueError> {
        self.clear_timers();
        let deadline = self
            .clock
            .now()
            .checked_add(duration)
            .ok_or(DialogueError::InvalidDelay(duration))?;
        self.delay_deadline = Some(deadline);
        tracing::debug!(manager = %self.id, ?duration, "delay timer started");
        Ok(())
    }

    fn delay_expired(&mut self) -> Result<(), DialogueError> {
        self.delay_deadline = None;
        let context = self.context.as_ref().ok_or(DialogueError::InvalidContext)?;
        let node = context.active_node().ok_or(DialogueError::InvalidContext)?;
        let jump = match context.graph().node(node).map(Node::kind) {
            Some(NodeKind::ReturnToNode(data)) => Some(data.target),
            _ => None,
        };

        match jump {
            Some(Some(target)) => {
                tracing::debug!(manager = %self.id, from = %node, to = %target, "returning to node");
                self.enter_node(target)
            }
            Some(None) => {
                tracing::warn!(manager = %self.id, %node, "return node has no target");
                self.close_dialogue();
                Ok(())
            }
            None => self.node_finished(),
        }
    }

    fn clear_timers(&mut self) {
        self.row_deadline = None;
        self.delay_deadline = None;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Closing and state
    // ─────────────────────────────────────────────────────────────────────

    /// Closes the running dialogue.
    ///
    /// Safe to call in any state. The session's traversal is merged into
    /// the dialogue participant's history and `Closed` is broadcast when a
    /// session existed.
    pub fn close_dialogue(&mut self) {
        self.clear_timers();
        self.options_offered = false;

        if let Some(context) = self.context.take() {
            if let Some(owner) = context.dialogue_participant() {
                owner.write().record_traversal(context.traversed_path());
            }
            restore_participants(&context);
            context.graph().cleanup_decorators();
            self.refresh_widget(WidgetCommand::CloseDialogueWidget);
            self.hooks.invoke(&DialogueEvent::Closed(&context));
            tracing::info!(manager = %self.id, graph = %context.graph().name, "dialogue closed");
        }

        if self.state == ManagerState::Active {
            self.transition(self.default_state);
        }
    }

    /// Moves the manager to `state`.
    ///
    /// A manager only becomes `Active` by starting a dialogue; leaving
    /// `Active` closes the running dialogue. Returns `false` if the
    /// transition was refused.
    pub fn set_state(&mut self, state: ManagerState) -> bool {
        if state == self.state {
            return true;
        }
        if state == ManagerState::Active {
            tracing::warn!(manager = %self.id, "manager becomes active only by starting a dialogue");
            return false;
        }
        if self.state == ManagerState::Active {
            self.close_dialogue();
        }
        self.transition(state);
        true
    }

    /// Sets the state restored after a dialogue.
    ///
    /// Returns `false` for `Active`, which cannot be a resting state.
    pub fn set_default_state(&mut self, state: ManagerState) -> bool {
        if state == ManagerState::Active {
            return false;
        }
        self.default_state = state;
        true
    }

    fn abort(&mut self) {
        self.clear_timers();
        self.options_offered = false;
        if let Some(context) = self.context.take() {
            restore_participants(&context);
            context.graph().cleanup_decorators();
            self.refresh_widget(WidgetCommand::CloseDialogueWidget);
        }
        if self.state == ManagerState::Active {
            self.transition(self.default_state);
        }
    }

    fn fail(&mut self, error: &DialogueError) {
        let reason = error.to_string();
        if error.aborts_session() {
            tracing::error!(manager = %self.id, %reason, "dialogue failed");
        } else {
            tracing::warn!(manager = %self.id, %reason, "dialogue request refused");
        }
        self.hooks.invoke(&DialogueEvent::Failed { reason: &reason });
        if error.aborts_session() {
            self.abort();
        }
    }

    fn guard(&mut self, result: Result<(), DialogueError>) -> Result<(), DialogueError> {
        if let Err(error) = &result {
            self.fail(error);
        }
        result
    }

    fn transition(&mut self, to: ManagerState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(manager = %self.id, ?from, ?to, "manager state changed");
        self.hooks.invoke(&DialogueEvent::StateChanged { from, to });
    }

    fn emit(&self, kind: EventKind) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        if let Some(event) = DialogueEvent::for_context(kind, context) {
            self.hooks.invoke(&event);
        }
    }

    fn refresh_widget(&mut self, command: WidgetCommand) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        match widget.refresh(command, self.context.as_ref()) {
            Ok(()) => {
                self.hooks.invoke(&DialogueEvent::UiChanged {
                    command,
                    context: self.context.as_ref(),
                });
            }
            Err(error) => {
                tracing::warn!(manager = %self.id, %command, %error, "widget command failed");
            }
        }
    }
}

impl fmt::Debug for DialogueManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueManager")
            .field("id", &self.id)
            .field("world", &self.world)
            .field("state", &self.state)
            .field("default_state", &self.default_state)
            .field("has_widget", &self.widget.is_some())
            .field("widget_class", &self.widget_class)
            .field("z_order", &self.z_order)
            .field("context", &self.context)
            .field("replicated", &self.replicated)
            .field("row_deadline", &self.row_deadline)
            .field("delay_deadline", &self.delay_deadline)
            .finish_non_exhaustive()
    }
}

/// The node a new session enters: the saved node if it can start, else the
/// graph's start node. A start node resolves to its first child, which must
/// pass its decorators.
fn starting_node(
    graph: &Graph,
    saved: Option<NodeId>,
    context: &DialogueContext,
) -> Result<NodeId, DialogueError> {
    let node = saved
        .filter(|node| graph.can_start_node(*node, Some(context)))
        .or_else(|| graph.start_node())
        .ok_or(DialogueError::InvalidContext)?;
    let entry = graph.node(node).ok_or(DialogueError::InvalidContext)?;
    if entry.class() != NodeClass::Start {
        return Ok(node);
    }

    entry
        .children()
        .first()
        .copied()
        .filter(|first| graph.can_start_node(*first, Some(context)))
        .ok_or_else(|| DialogueError::NothingToStart(graph.name.clone()))
}

fn session_participants(context: &DialogueContext) -> impl Iterator<Item = &SharedParticipant> {
    context
        .player_participant()
        .into_iter()
        .chain(context.dialogue_participant())
        .chain(context.participants())
}

fn restore_participants(context: &DialogueContext) {
    for participant in session_participants(context) {
        let mut participant = participant.write();
        let state = participant.default_state();
        participant.set_state(state);
    }
}

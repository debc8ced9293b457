//! Dialogue lifecycle events.
//!
//! All hooks receive `&DialogueEvent` and can match on variants for typed
//! access. Session events borrow the manager's [`DialogueContext`].
//!
//! # Example
//!
//! ```ignore
//! use colloquy_runtime::hooks::events::DialogueEvent;
//!
//! fn handle_event(event: &DialogueEvent<'_>) {
//!     match event {
//!         DialogueEvent::NodeStarted(context) => {
//!             tracing::info!(node = ?context.active_node(), "node started");
//!         }
//!         DialogueEvent::Failed { reason } => {
//!             tracing::error!(reason, "dialogue failed");
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use core::fmt;

use crate::context::DialogueContext;
use crate::manager::ManagerState;
use crate::ui::WidgetCommand;

/// Event fired by a dialogue manager.
#[derive(Debug, Clone, Copy)]
pub enum DialogueEvent<'a> {
    // ─────────────────────────────────────────────────────────────────────────
    // Session Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A context was built for a new dialogue.
    Initialized(&'a DialogueContext),

    /// The dialogue started.
    Started(&'a DialogueContext),

    /// The dialogue closed. Carries the context as it was when closing.
    Closed(&'a DialogueContext),

    /// The context changed.
    ContextUpdated(&'a DialogueContext),

    /// The dialogue failed and the session was aborted.
    Failed {
        /// Human-readable reason.
        reason: &'a str,
    },

    /// The manager state changed.
    StateChanged {
        /// Previous state.
        from: ManagerState,
        /// New state.
        to: ManagerState,
    },

    /// A widget command was applied successfully.
    UiChanged {
        /// The command sent to the widget.
        command: WidgetCommand,
        /// The context at the time, if a dialogue is running.
        context: Option<&'a DialogueContext>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Node Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A child node was selected and became active.
    NodeSelected(&'a DialogueContext),

    /// The active node started processing.
    NodeStarted(&'a DialogueContext),

    /// The active node finished.
    NodeFinished(&'a DialogueContext),

    // ─────────────────────────────────────────────────────────────────────────
    // Row Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A row line started showing.
    RowStarted(&'a DialogueContext),

    /// A row line finished showing.
    RowFinished(&'a DialogueContext),
}

/// Discriminant of [`DialogueEvent`], used as the hook registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`DialogueEvent::Initialized`].
    Initialized,
    /// See [`DialogueEvent::Started`].
    Started,
    /// See [`DialogueEvent::Closed`].
    Closed,
    /// See [`DialogueEvent::ContextUpdated`].
    ContextUpdated,
    /// See [`DialogueEvent::Failed`].
    Failed,
    /// See [`DialogueEvent::StateChanged`].
    StateChanged,
    /// See [`DialogueEvent::UiChanged`].
    UiChanged,
    /// See [`DialogueEvent::NodeSelected`].
    NodeSelected,
    /// See [`DialogueEvent::NodeStarted`].
    NodeStarted,
    /// See [`DialogueEvent::NodeFinished`].
    NodeFinished,
    /// See [`DialogueEvent::RowStarted`].
    RowStarted,
    /// See [`DialogueEvent::RowFinished`].
    RowFinished,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 12] = [
        EventKind::Initialized,
        EventKind::Started,
        EventKind::Closed,
        EventKind::ContextUpdated,
        EventKind::Failed,
        EventKind::StateChanged,
        EventKind::UiChanged,
        EventKind::NodeSelected,
        EventKind::NodeStarted,
        EventKind::NodeFinished,
        EventKind::RowStarted,
        EventKind::RowFinished,
    ];

    /// Returns the kind's name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Initialized => "Initialized",
            EventKind::Started => "Started",
            EventKind::Closed => "Closed",
            EventKind::ContextUpdated => "ContextUpdated",
            EventKind::Failed => "Failed",
            EventKind::StateChanged => "StateChanged",
            EventKind::UiChanged => "UiChanged",
            EventKind::NodeSelected => "NodeSelected",
            EventKind::NodeStarted => "NodeStarted",
            EventKind::NodeFinished => "NodeFinished",
            EventKind::RowStarted => "RowStarted",
            EventKind::RowFinished => "RowFinished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'a> DialogueEvent<'a> {
    /// Builds the session event of `kind` for `context`.
    ///
    /// Returns `None` for kinds that do not carry only a context.
    #[must_use]
    pub fn for_context(kind: EventKind, context: &'a DialogueContext) -> Option<Self> {
        let event = match kind {
            EventKind::Initialized => DialogueEvent::Initialized(context),
            EventKind::Started => DialogueEvent::Started(context),
            EventKind::Closed => DialogueEvent::Closed(context),
            EventKind::ContextUpdated => DialogueEvent::ContextUpdated(context),
            EventKind::NodeSelected => DialogueEvent::NodeSelected(context),
            EventKind::NodeStarted => DialogueEvent::NodeStarted(context),
            EventKind::NodeFinished => DialogueEvent::NodeFinished(context),
            EventKind::RowStarted => DialogueEvent::RowStarted(context),
            EventKind::RowFinished => DialogueEvent::RowFinished(context),
            EventKind::Failed | EventKind::StateChanged | EventKind::UiChanged => return None,
        };
        Some(event)
    }

    /// Returns the kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            DialogueEvent::Initialized(_) => EventKind::Initialized,
            DialogueEvent::Started(_) => EventKind::Started,
            DialogueEvent::Closed(_) => EventKind::Closed,
            DialogueEvent::ContextUpdated(_) => EventKind::ContextUpdated,
            DialogueEvent::Failed { .. } => EventKind::Failed,
            DialogueEvent::StateChanged { .. } => EventKind::StateChanged,
            DialogueEvent::UiChanged { .. } => EventKind::UiChanged,
            DialogueEvent::NodeSelected(_) => EventKind::NodeSelected,
            DialogueEvent::NodeStarted(_) => EventKind::NodeStarted,
            DialogueEvent::NodeFinished(_) => EventKind::NodeFinished,
            DialogueEvent::RowStarted(_) => EventKind::RowStarted,
            DialogueEvent::RowFinished(_) => EventKind::RowFinished,
        }
    }

    /// Returns the context carried by this event, if any.
    #[must_use]
    pub fn context(&self) -> Option<&DialogueContext> {
        match self {
            DialogueEvent::Initialized(context)
            | DialogueEvent::Started(context)
            | DialogueEvent::Closed(context)
            | DialogueEvent::ContextUpdated(context)
            | DialogueEvent::NodeSelected(context)
            | DialogueEvent::NodeStarted(context)
            | DialogueEvent::NodeFinished(context)
            | DialogueEvent::RowStarted(context)
            | DialogueEvent::RowFinished(context) => Some(*context),
            DialogueEvent::UiChanged { context, .. } => *context,
            DialogueEvent::Failed { .. } | DialogueEvent::StateChanged { .. } => None,
        }
    }
}

impl fmt::Display for DialogueEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueEvent::Failed { reason } => write!(f, "Failed({reason})"),
            DialogueEvent::StateChanged { from, to } => {
                write!(f, "StateChanged({from:?} -> {to:?})")
            }
            DialogueEvent::UiChanged { command, .. } => write!(f, "UiChanged({command})"),
            other => match other.context().and_then(DialogueContext::active_node) {
                Some(node) => write!(f, "{}({node})", other.kind()),
                None => write!(f, "{}", other.kind()),
            },
        }
    }
}

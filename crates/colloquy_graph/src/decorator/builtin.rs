//! Decorators shipped with the dialogue system.
//!
//! | Decorator | Evaluate | Execute |
//! |-----------|----------|---------|
//! | [`Condition`] | user closure | – |
//! | [`OnlyFirstTime`] | node never traversed | – |
//! | [`OverrideDialogue`] | – | swaps the active row on every visit |
//! | [`OverrideOnlyFirstTime`] | – | swaps the active row on first visit |
//! | [`SaveNodeAsStart`] | – | saves the node as the participant's start |
//! | [`SendCommand`] | – | sends a command to the owning participant |
//! | [`SwapParticipants`] | – | flips the active participant |
//! | [`SelectRandomRow`] | – | picks a random line of the active row |

use std::sync::Arc;

use rand::Rng;

use super::{Decorator, DecoratorScope, DialogueSession};
use crate::node::NodeClass;
use crate::row::{DialogueTable, RowHandle};

/// Predicate closure used by [`Condition`].
pub type ConditionFn =
    Box<dyn Fn(&DecoratorScope<'_>, Option<&dyn DialogueSession>) -> bool + Send + Sync>;

/// A decorator whose evaluation is a user-supplied closure.
pub struct Condition {
    name: String,
    stackable: bool,
    predicate: ConditionFn,
}

impl Condition {
    /// Creates a named condition.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&DecoratorScope<'_>, Option<&dyn DialogueSession>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            stackable: false,
            predicate: Box::new(predicate),
        }
    }

    /// A condition that always evaluates to `value`.
    #[must_use]
    pub fn constant(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, move |_, _| value)
    }

    /// Allows several conditions on the same owner.
    #[must_use]
    pub fn stackable(mut self) -> Self {
        self.stackable = true;
        self
    }
}

impl Decorator for Condition {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_stackable(&self) -> bool {
        self.stackable
    }

    fn evaluate(&self, scope: &DecoratorScope<'_>, session: Option<&dyn DialogueSession>) -> bool {
        (self.predicate)(scope, session)
    }
}

fn first_time(scope: &DecoratorScope<'_>, session: Option<&dyn DialogueSession>) -> bool {
    match (scope.owning_node(), session) {
        (Some(node), Some(session)) => session.traversal_count(&node.guid) == 0,
        _ => true,
    }
}

/// Passes only while the owning node has never been traversed.
#[derive(Debug, Default)]
pub struct OnlyFirstTime;

impl Decorator for OnlyFirstTime {
    fn validate(&self, scope: &DecoratorScope<'_>, messages: &mut Vec<String>) {
        let Some(node) = scope.owning_node() else {
            return;
        };
        let name = self.name();

        match node.class() {
            NodeClass::Start => messages.push(format!(
                "Decorator {name}: is not allowed for Start Nodes!\nAttach this decorator to subsequent nodes instead."
            )),
            NodeClass::ReturnToNode => messages.push(format!(
                "Decorator {name}: is not allowed for Return Nodes!\nAttach this decorator to different nodes instead."
            )),
            _ => {}
        }

        let first_after_start = scope
            .graph
            .start_node()
            .and_then(|start| scope.graph.node(start))
            .and_then(|start| start.children().first())
            .is_some_and(|first| *first == node.id);

        if first_after_start {
            messages.push(format!(
                "Decorator {name}: is not allowed for the first dialogue Node after the Start node!\nAttach this decorator to subsequent nodes instead."
            ));
        }
    }

    fn evaluate(&self, scope: &DecoratorScope<'_>, session: Option<&dyn DialogueSession>) -> bool {
        first_time(scope, session)
    }
}

/// Replaces the active row every time the owning node is entered.
#[derive(Debug, Default)]
pub struct OverrideDialogue {
    table: Option<Arc<DialogueTable>>,
    row_name: String,
}

impl OverrideDialogue {
    /// Creates the decorator with the replacement row.
    #[must_use]
    pub fn new(row: RowHandle) -> Self {
        Self {
            table: Some(Arc::clone(row.table())),
            row_name: row.row_name().to_string(),
        }
    }

    /// Creates the decorator with a row name but no table yet.
    #[must_use]
    pub fn unbound(row_name: impl Into<String>) -> Self {
        Self {
            table: None,
            row_name: row_name.into(),
        }
    }

    /// Returns the replacement row, if a table is set.
    #[must_use]
    pub fn row(&self) -> Option<RowHandle> {
        self.table
            .as_ref()
            .map(|table| RowHandle::new(Arc::clone(table), self.row_name.as_str()))
    }
}

impl Decorator for OverrideDialogue {
    fn validate(&self, _scope: &DecoratorScope<'_>, messages: &mut Vec<String>) {
        let name = self.name();
        if self.table.is_none() {
            messages.push(format!("{name} has no Data Table!"));
        }
        let resolves = self.row().is_some_and(|row| row.resolve().is_some());
        if self.row_name.is_empty() || (self.table.is_some() && !resolves) {
            messages.push(format!("[{name} Validation]: Invalid Row Name!"));
        }
    }

    fn execute(&self, _scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        let Some(row) = self.row() else {
            tracing::warn!(decorator = self.name(), "no data table, execution skipped");
            return;
        };
        if !session.override_active_row(&row) {
            tracing::warn!(row = row.row_name(), "override row could not be resolved");
        }
    }
}

/// Replaces the active row with `row` the first time the node is entered.
#[derive(Debug)]
pub struct OverrideOnlyFirstTime {
    row: RowHandle,
}

impl OverrideOnlyFirstTime {
    /// Creates the decorator with the replacement row.
    #[must_use]
    pub fn new(row: RowHandle) -> Self {
        Self { row }
    }
}

impl Decorator for OverrideOnlyFirstTime {
    fn validate(&self, _scope: &DecoratorScope<'_>, messages: &mut Vec<String>) {
        if self.row.resolve().is_none() {
            messages.push(format!("Decorator {}: Invalid Row Name!", self.name()));
        }
    }

    fn execute(&self, scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        if !first_time(scope, Some(&*session)) {
            return;
        }
        if !session.override_active_row(&self.row) {
            tracing::warn!(row = self.row.row_name(), "override row could not be resolved");
        }
    }
}

/// Saves the owning node as the participant's next starting node.
#[derive(Debug, Default)]
pub struct SaveNodeAsStart;

impl Decorator for SaveNodeAsStart {
    fn is_graph_allowed(&self) -> bool {
        false
    }

    fn execute(&self, scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        if let Some(node) = scope.owning_node()
            && !session.save_starting_node(node.id)
        {
            tracing::warn!(node = %node.id, "participant refused the starting node");
        }
    }
}

/// Sends a command to the participant owning the graph.
#[derive(Debug, Clone)]
pub struct SendCommand {
    command: String,
    payload: Option<String>,
}

impl SendCommand {
    /// Creates the decorator for `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            payload: None,
        }
    }

    /// Attaches an optional payload to the command.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

impl Decorator for SendCommand {
    fn is_stackable(&self) -> bool {
        true
    }

    fn validate(&self, _scope: &DecoratorScope<'_>, messages: &mut Vec<String>) {
        if self.command.is_empty() {
            messages.push(format!(
                "Decorator {}: StringCommand is empty! Sending Command would fail.",
                self.name()
            ));
        }
    }

    fn execute(&self, _scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        session.process_command(&self.command, self.payload.as_deref());
    }
}

/// Flips the active participant between the player and the dialogue
/// participant.
#[derive(Debug, Default)]
pub struct SwapParticipants;

impl Decorator for SwapParticipants {
    fn execute(&self, _scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        session.swap_active_participant();
    }
}

/// Picks a random line of the active row within an inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct SelectRandomRow {
    range: (i32, i32),
}

impl SelectRandomRow {
    /// Creates the decorator for the inclusive line range `from..=to`.
    ///
    /// The bounds may be given in either order.
    #[must_use]
    pub fn new(from: i32, to: i32) -> Self {
        Self { range: (from, to) }
    }

    /// Clamps the range to `0..len`. Returns `None` for an empty row.
    #[must_use]
    pub fn clamped_range(&self, len: usize) -> Option<(usize, usize)> {
        if len == 0 {
            return None;
        }
        let (low, high) = if self.range.0 > self.range.1 {
            (self.range.1, self.range.0)
        } else {
            self.range
        };
        let max = len - 1;
        let low = usize::try_from(low.max(0)).unwrap_or(0).min(max);
        let high = usize::try_from(high.max(0)).unwrap_or(0).min(max).max(low);
        Some((low, high))
    }
}

impl Decorator for SelectRandomRow {
    fn is_graph_allowed(&self) -> bool {
        false
    }

    fn execute(&self, _scope: &DecoratorScope<'_>, session: &mut dyn DialogueSession) {
        let Some(len) = session.active_row_data_len() else {
            tracing::warn!(decorator = self.name(), "active row is invalid, execution skipped");
            return;
        };
        let Some((low, high)) = self.clamped_range(len) else {
            tracing::warn!(decorator = self.name(), "active row has no lines, execution skipped");
            return;
        };

        let index = rand::thread_rng().gen_range(low..=high);
        session.set_active_row_data_index(index);
    }
}

//! Widget command surface.
//!
//! The runtime never renders anything itself. It sends a small fixed
//! vocabulary of [`WidgetCommand`]s to whatever [`DialogueWidget`] the host
//! registered and only cares whether each command succeeded.

use core::fmt;
use core::str::FromStr;

use crate::context::DialogueContext;

/// Command sent to the dialogue widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetCommand {
    /// Create the dialogue widget.
    CreateDialogueWidget,
    /// Tear the dialogue widget down.
    CloseDialogueWidget,
    /// Show the first line of the active row.
    ShowDialogueRow,
    /// Show the next line of the active row.
    UpdateDialogueRow,
    /// Hide the active row.
    HideDialogueRow,
    /// Offer the allowed children as options.
    AddDialogueOptions,
    /// Remove the offered options.
    RemoveDialogueOptions,
}

impl WidgetCommand {
    /// Every command, in declaration order.
    pub const ALL: [WidgetCommand; 7] = [
        WidgetCommand::CreateDialogueWidget,
        WidgetCommand::CloseDialogueWidget,
        WidgetCommand::ShowDialogueRow,
        WidgetCommand::UpdateDialogueRow,
        WidgetCommand::HideDialogueRow,
        WidgetCommand::AddDialogueOptions,
        WidgetCommand::RemoveDialogueOptions,
    ];

    /// Returns the command's string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetCommand::CreateDialogueWidget => "CreateDialogueWidget",
            WidgetCommand::CloseDialogueWidget => "CloseDialogueWidget",
            WidgetCommand::ShowDialogueRow => "ShowDialogueRow",
            WidgetCommand::UpdateDialogueRow => "UpdateDialogueRow",
            WidgetCommand::HideDialogueRow => "HideDialogueRow",
            WidgetCommand::AddDialogueOptions => "AddDialogueOptions",
            WidgetCommand::RemoveDialogueOptions => "RemoveDialogueOptions",
        }
    }
}

impl fmt::Display for WidgetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetCommand {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetCommand::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| WidgetError::UnknownCommand(s.to_string()))
    }
}

/// Errors reported by widgets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// The string is not part of the command vocabulary.
    #[error("unknown widget command: {0}")]
    UnknownCommand(String),

    /// The widget could not apply the command.
    #[error("widget refused {command}: {reason}")]
    Refused {
        /// The refused command.
        command: WidgetCommand,
        /// Why the widget refused it.
        reason: String,
    },
}

/// A dialogue UI driven by widget commands.
pub trait DialogueWidget: Send + Sync {
    /// Applies a command. `context` is `None` once the dialogue has closed.
    ///
    /// # Errors
    ///
    /// Returns a [`WidgetError`] if the widget cannot apply the command.
    fn refresh(
        &mut self,
        command: WidgetCommand,
        context: Option<&DialogueContext>,
    ) -> Result<(), WidgetError>;
}

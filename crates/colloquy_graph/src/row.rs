//! Dialogue rows: the lines a dialogue node displays.
//!
//! Rows live in a [`DialogueTable`] and are referenced from dialogue nodes
//! through a [`RowHandle`]. Each [`DialogueRow`] holds one or more
//! [`RowData`] entries that are shown in sequence, each for the duration
//! computed by [`row_duration`].
//!
//! # Example
//!
//! ```ignore
//! let table = Arc::new(DialogueTable::from_json(r#"{
//!     "name": "village",
//!     "rows": {
//!         "greeting": {
//!             "participant_name": "Elder",
//!             "title": "Greeting",
//!             "data": [{ "text": "Welcome, traveller." }]
//!         }
//!     }
//! }"#)?);
//!
//! let lead = graph.add_node(NodeKind::lead(RowHandle::new(table, "greeting")));
//! ```

use core::time::Duration;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::id::Guid;

/// Shortest time a row stays on screen, in seconds.
pub const MIN_ROW_DURATION: f32 = 0.0001;

/// Default characters-to-seconds coefficient (8 seconds per 100 characters).
pub const DEFAULT_DURATION_COEFFICIENT: f32 = 8.0;

/// How the display duration of a row is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowDurationMode {
    /// Length of the row's sound, or `duration` when there is none.
    #[default]
    Duration,
    /// Always `duration_override`.
    Override,
    /// Length of the row's sound plus `duration_override`.
    Add,
    /// Derived from the text length and the duration coefficient.
    AutoCalculate,
}

/// One displayable line of a dialogue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowData {
    /// The line's text.
    pub text: String,
    /// Length of the attached voice-over in seconds, if any.
    #[serde(default)]
    pub sound_duration: Option<f32>,
    /// How the display duration is computed.
    #[serde(default)]
    pub duration_mode: RowDurationMode,
    /// Explicit duration in seconds.
    #[serde(default)]
    pub duration: f32,
    /// Override (or addend) in seconds.
    #[serde(default)]
    pub duration_override: f32,
    /// Identity of this line.
    #[serde(default)]
    pub guid: Guid,
}

impl RowData {
    /// Creates a line with the default duration mode and no sound.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sound_duration: None,
            duration_mode: RowDurationMode::default(),
            duration: 0.0,
            duration_override: 0.0,
            guid: Guid::new(),
        }
    }

    /// Sets the duration mode and its values.
    #[must_use]
    pub fn with_duration(mut self, mode: RowDurationMode, duration: f32, duration_override: f32) -> Self {
        self.duration_mode = mode;
        self.duration = duration;
        self.duration_override = duration_override;
        self
    }

    /// Attaches a voice-over of the given length.
    #[must_use]
    pub fn with_sound_duration(mut self, seconds: f32) -> Self {
        self.sound_duration = Some(seconds);
        self
    }
}

/// A dialogue row: who speaks, the option title and the lines to show.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueRow {
    /// Optional type id used by widgets to style rows differently.
    #[serde(default)]
    pub ui_row_id: u8,
    /// Display name of the speaking participant.
    #[serde(default)]
    pub participant_name: String,
    /// Title shown when the row is offered as an option.
    #[serde(default)]
    pub title: String,
    /// Lines shown in sequence.
    #[serde(default)]
    pub data: Vec<RowData>,
    /// Identity of this row.
    #[serde(default)]
    pub guid: Guid,
}

impl DialogueRow {
    /// Creates a row spoken by `participant_name`.
    #[must_use]
    pub fn new(participant_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            participant_name: participant_name.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Appends a line.
    #[must_use]
    pub fn with_data(mut self, data: RowData) -> Self {
        self.data.push(data);
        self
    }

    /// A row is playable when it has at least one line.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

/// A named collection of dialogue rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueTable {
    /// Table name, used in diagnostics.
    pub name: String,
    /// Rows keyed by row name.
    #[serde(default)]
    pub rows: BTreeMap<String, DialogueRow>,
}

impl DialogueTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Parses a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns the parser error when the document is not a valid table.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Inserts a row, returning `self` for chaining.
    #[must_use]
    pub fn with_row(mut self, name: impl Into<String>, row: DialogueRow) -> Self {
        self.rows.insert(name.into(), row);
        self
    }

    /// Looks up a row by name.
    #[must_use]
    pub fn row(&self, name: &str) -> Option<&DialogueRow> {
        self.rows.get(name)
    }

    /// Returns the row names in sorted order.
    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

/// Reference from a dialogue node to a row of a shared table.
#[derive(Debug, Clone)]
pub struct RowHandle {
    table: Arc<DialogueTable>,
    row_name: String,
}

impl RowHandle {
    /// Creates a handle to `row_name` in `table`.
    #[must_use]
    pub fn new(table: Arc<DialogueTable>, row_name: impl Into<String>) -> Self {
        Self {
            table,
            row_name: row_name.into(),
        }
    }

    /// Returns the referenced table.
    #[must_use]
    pub fn table(&self) -> &Arc<DialogueTable> {
        &self.table
    }

    /// Returns the referenced row name.
    #[must_use]
    pub fn row_name(&self) -> &str {
        &self.row_name
    }

    /// Resolves the handle to a valid row.
    ///
    /// Returns `None` when the row is missing or has no lines.
    #[must_use]
    pub fn resolve(&self) -> Option<&DialogueRow> {
        self.table.row(&self.row_name).filter(|row| row.is_valid())
    }
}

/// Computes how long a line stays on screen.
///
/// `coefficient` is the number of seconds per 100 characters used by
/// [`RowDurationMode::AutoCalculate`]. The result never drops below
/// [`MIN_ROW_DURATION`]. Returns `None` when the computed length is
/// infinite or too large for a [`Duration`].
#[must_use]
pub fn row_duration(data: &RowData, coefficient: f32) -> Option<Duration> {
    let seconds = match data.duration_mode {
        RowDurationMode::Duration => data.sound_duration.unwrap_or(data.duration),
        RowDurationMode::Override => data.duration_override,
        RowDurationMode::Add => match data.sound_duration {
            Some(sound) => sound + data.duration_override,
            None => data.duration_override,
        },
        RowDurationMode::AutoCalculate => {
            data.text.chars().count() as f32 * coefficient / 100.0
        }
    };

    Duration::try_from_secs_f32(seconds.max(MIN_ROW_DURATION)).ok()
}

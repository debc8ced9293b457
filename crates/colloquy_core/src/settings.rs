//! Project-wide dialogue configuration.
//!
//! [`DialogueSettings`] is the read-only configuration surface consumed by
//! the runtime: widget defaults, input mode, row timing coefficients and
//! subtitle styling. Settings are plain serde data and are usually loaded
//! once at startup from a JSON document.
//!
//! # Example
//!
//! ```ignore
//! let settings = DialogueSettings::from_path("config/dialogue.json")?;
//!
//! let style = settings.subtitles_for(&SubtitlesKey::new("RowWidget", 2));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors produced while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file '{path}': {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings document is not valid JSON for [`DialogueSettings`].
    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A numeric setting is out of range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Input routing while a dialogue is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Only the dialogue UI receives input.
    UiOnly,
    /// Both the dialogue UI and the game receive input.
    #[default]
    UiAndGame,
}

// ─────────────────────────────────────────────────────────────────────────────
// Subtitles
// ─────────────────────────────────────────────────────────────────────────────

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl LinearColor {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Font description for subtitle text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontInfo {
    /// Font family. An empty family marks the settings as unset.
    pub family: String,
    /// Typeface within the family.
    pub typeface: String,
    /// Point size.
    pub size: u32,
    /// Outline thickness.
    pub outline: u32,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            family: "Roboto".to_string(),
            typeface: "Regular".to_string(),
            size: 16,
            outline: 1,
        }
    }
}

/// Text styling applied to dialogue rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitlesSettings {
    /// Font used for row text.
    pub font: FontInfo,
    /// Text color.
    pub font_color: LinearColor,
    /// Shadow offset on X and Y.
    pub shadow_offset: [f32; 2],
    /// Shadow color.
    pub shadow_color: LinearColor,
}

impl Default for SubtitlesSettings {
    fn default() -> Self {
        Self {
            font: FontInfo::default(),
            font_color: LinearColor::WHITE,
            shadow_offset: [1.5, 1.25],
            shadow_color: LinearColor::BLACK,
        }
    }
}

impl SubtitlesSettings {
    /// Returns `true` if these settings name a font.
    ///
    /// Overrides without a font are ignored.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.font.family.is_empty()
    }
}

/// Composite key selecting a subtitle override.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubtitlesKey {
    /// Row widget class. `None` addresses the default settings.
    pub widget_class: Option<String>,
    /// UI row id the override applies to.
    pub ui_row_id: u8,
}

impl SubtitlesKey {
    /// Creates a key for a widget class and row id.
    #[must_use]
    pub fn new(widget_class: impl Into<String>, ui_row_id: u8) -> Self {
        Self {
            widget_class: Some(widget_class.into()),
            ui_row_id,
        }
    }

    /// Key addressing the default settings.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            widget_class: None,
            ui_row_id: 0,
        }
    }
}

/// Subtitle settings registered for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitlesOverride {
    /// Key the override applies to.
    pub key: SubtitlesKey,
    /// Settings used for that key.
    pub settings: SubtitlesSettings,
}

// ─────────────────────────────────────────────────────────────────────────────
// DialogueSettings
// ─────────────────────────────────────────────────────────────────────────────

/// Global dialogue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Widget class created when a dialogue starts.
    pub default_widget_class: Option<String>,
    /// Input routing during dialogue.
    pub input_mode: InputMode,
    /// Whether subtitles are displayed.
    pub subtitles_allowed: bool,
    /// Whether skipping a row's audio skips the whole row.
    pub skip_row_with_audio_skip: bool,
    /// Characters-to-seconds coefficient for auto-calculated rows.
    pub duration_coefficient: f32,
    /// Widget refresh period in seconds.
    pub update_frequency: f32,
    /// Fade duration in seconds when a row is skipped.
    pub skip_fade_duration: f32,
    /// How long the skip input must be held, in seconds.
    pub skip_hold_duration: f32,
    /// Default subtitle styling.
    pub subtitles: SubtitlesSettings,
    /// Per-widget subtitle overrides.
    pub subtitles_overrides: Vec<SubtitlesOverride>,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            default_widget_class: None,
            input_mode: InputMode::UiAndGame,
            subtitles_allowed: true,
            skip_row_with_audio_skip: false,
            duration_coefficient: 8.0,
            update_frequency: 0.05,
            skip_fade_duration: 0.01,
            skip_hold_duration: 0.75,
            subtitles: SubtitlesSettings::default(),
            subtitles_overrides: Vec::new(),
        }
    }
}

impl DialogueSettings {
    /// Parses settings from a JSON string and validates them.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed JSON and
    /// [`SettingsError::InvalidValue`] for out-of-range numbers.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when the file cannot be read, otherwise
    /// the same errors as [`DialogueSettings::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "dialogue settings loaded");
        Ok(settings)
    }

    /// Checks numeric fields.
    ///
    /// # Errors
    ///
    /// Returns the first field that is negative or not finite.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("duration_coefficient", self.duration_coefficient),
            ("update_frequency", self.update_frequency),
            ("skip_fade_duration", self.skip_fade_duration),
            ("skip_hold_duration", self.skip_hold_duration),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::InvalidValue {
                    field,
                    reason: format!("expected a non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Returns the subtitle settings for a key.
    ///
    /// A registered, valid override wins; anything else yields the defaults.
    #[must_use]
    pub fn subtitles_for(&self, key: &SubtitlesKey) -> &SubtitlesSettings {
        self.subtitles_overrides
            .iter()
            .find(|entry| &entry.key == key)
            .map(|entry| &entry.settings)
            .filter(|settings| settings.is_valid())
            .unwrap_or(&self.subtitles)
    }

    /// Stores subtitle settings for a key.
    ///
    /// A key without a widget class replaces the defaults; otherwise the
    /// override for that key is inserted or replaced.
    pub fn set_subtitles(&mut self, key: SubtitlesKey, settings: SubtitlesSettings) {
        if key.widget_class.is_none() {
            self.subtitles = settings;
            return;
        }
        match self
            .subtitles_overrides
            .iter_mut()
            .find(|entry| entry.key == key)
        {
            Some(entry) => entry.settings = settings,
            None => self
                .subtitles_overrides
                .push(SubtitlesOverride { key, settings }),
        }
    }

    /// Builder-style setter for the duration coefficient.
    #[must_use]
    pub fn with_duration_coefficient(mut self, coefficient: f32) -> Self {
        self.duration_coefficient = coefficient;
        self
    }

    /// Builder-style setter for the default widget class.
    #[must_use]
    pub fn with_default_widget_class(mut self, class: impl Into<String>) -> Self {
        self.default_widget_class = Some(class.into());
        self
    }

    /// Builder-style setter for the input mode.
    #[must_use]
    pub fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }
}

//! Core infrastructure for Colloquy.
//!
//! This crate provides the foundations the dialogue crates build on:
//!
//! - [`TracingConfig`] - Logging setup via the `tracing` crate
//! - [`Clock`] - Mockable time source for row and delay timers
//! - [`DialogueSettings`] - Read-only dialogue configuration loaded from JSON
//!
//! # Feature Flags
//!
//! - `test-utils` - Enables [`MockClock`] for deterministic time testing
//!
//! # Example
//!
//! ```no_run
//! use colloquy_core::{DialogueSettings, TracingConfig};
//! use tracing::Level;
//!
//! TracingConfig::new().with_level(Level::DEBUG).init();
//!
//! let settings = DialogueSettings::from_path("dialogue.json").unwrap_or_default();
//! ```
//!
//! # Architecture
//!
//! This crate is part of Layer 1 infrastructure:
//!
//! - **Layer 1** (`colloquy_core`): Logging, time and configuration
//! - **Layer 2** (`colloquy_graph`): Dialogue graph model and decorators
//! - **Layer 3** (`colloquy_runtime`): Participants, manager and network sync

pub mod settings;
mod time;
mod tracing_config;

pub use settings::{DialogueSettings, InputMode, SettingsError, SubtitlesKey, SubtitlesSettings};
pub use time::{Clock, ClockProvider};
pub use tracing_config::{TracingConfig, TracingFormat};

// Re-export test utilities
#[cfg(any(test, feature = "test-utils"))]
pub use time::MockClock;

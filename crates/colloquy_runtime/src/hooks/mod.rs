//! Lifecycle hooks for dialogue managers.
//!
//! A manager broadcasts a [`DialogueEvent`] at every step of a conversation:
//! initialization, node and row progress, widget changes, failure and close.
//! Collaborators register observers on a [`DialogueHooks`] registry.
//!
//! # Design Principles
//!
//! - Hooks execute in registration order
//! - Broadcasting to zero listeners is a no-op
//! - Hooks observe; they cannot call back into the manager or the registry
//!
//! # Architecture
//!
//! - **Events** ([`events`]): `DialogueEvent` enum carrying the context
//! - **API** ([`api`]): Registration and invocation mechanism
//!
//! # Example
//!
//! ```ignore
//! use colloquy_runtime::hooks::{DialogueEvent, EventKind};
//!
//! manager.hooks().register_observer(EventKind::RowStarted, "subtitles", |event: &DialogueEvent<'_>| {
//!     if let Some(row) = event.context().and_then(|context| context.resolve_active_row()) {
//!         tracing::info!(speaker = %row.participant_name, "row started");
//!     }
//! })?;
//! ```

pub mod api;
pub mod events;

pub use api::{DialogueHooks, HookRegistrationError};
pub use events::{DialogueEvent, EventKind};

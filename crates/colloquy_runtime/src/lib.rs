//! Dialogue runtime for Colloquy (Layer 3).
//!
//! `colloquy_runtime` plays the graphs defined in `colloquy_graph`. A
//! [`DialogueManager`] takes a player and the participants they talk to,
//! walks the graph of the participant offering the dialogue and reports
//! every step through [`hooks`] and a host-provided [`DialogueWidget`].
//!
//! # Core Concepts
//!
//! - [`Participant`] - Owns a graph, a saved starting node and traversal history
//! - [`DialogueContext`] - Transient state of one running dialogue
//! - [`DialogueManager`] - State machine driving rows, delays and options
//! - [`DialogueSync`] - Routes requests to the network authority
//!
//! # Example
//!
//! ```ignore
//! use colloquy_runtime::prelude::*;
//!
//! let npc = Participant::new(ParticipantId::new("blacksmith"))
//!     .with_graph(graph)
//!     .shared();
//! let player = Participant::new(ParticipantId::new("player")).shared();
//!
//! let mut manager = DialogueManager::new(ManagerId::new("main"))
//!     .with_world(WorldId::new("village"));
//! manager.request_start_dialogue(&player, &[npc])?;
//!
//! while manager.is_active() {
//!     manager.update()?;
//! }
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`colloquy_core`): tracing, clock, settings
//! - **Layer 2** (`colloquy_graph`): dialogue graph model
//! - **Layer 3** (`colloquy_runtime`): participants, manager, network sync (this crate)

/// Transient state of a running dialogue.
pub mod context;

/// Lifecycle events and the hook registry.
pub mod hooks;

/// The dialogue manager state machine.
pub mod manager;

/// Dialogue participants.
pub mod participant;

/// Request routing to the network authority.
pub mod sync;

/// Widget command surface.
pub mod ui;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::context::{ContextSnapshot, DialogueContext};
    pub use crate::hooks::{DialogueEvent, DialogueHooks, EventKind, HookRegistrationError};
    pub use crate::manager::{DialogueError, DialogueManager, ManagerState, SharedManager};
    pub use crate::participant::{
        Participant, ParticipantState, ReceivedCommand, SharedParticipant, TraversedNode,
    };
    pub use crate::sync::{
        ChannelTransport, DialogueSync, DispatchOutcome, RpcTransport, SyncError, SyncInbox,
        SyncOwner, SyncRequest,
    };
    pub use crate::ui::{DialogueWidget, WidgetCommand, WidgetError};
    pub use colloquy_graph::prelude::*;
}

pub use context::{ContextSnapshot, DialogueContext};
pub use manager::{DialogueError, DialogueManager, ManagerState, SharedManager};
pub use participant::{Participant, SharedParticipant};
pub use sync::DialogueSync;
pub use ui::{DialogueWidget, WidgetCommand};

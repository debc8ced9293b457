//! Dialogue graph model for Colloquy (Layer 2).
//!
//! `colloquy_graph` defines authored dialogue: graphs of nodes, the
//! decorators gating and reacting to them, and the dialogue rows they
//! display. Everything here is data plus read algorithms; the runtime that
//! walks a graph lives in `colloquy_runtime`.
//!
//! # Core Concepts
//!
//! - [`Graph`] - Arena of nodes with traversal and validation
//! - [`Node`] - A dialogue step with adjacency, decorators and connection rules
//! - [`Decorator`] - Condition and side effect attached to a graph or node
//! - [`DialogueTable`] - The rows dialogue nodes display
//!
//! # Example
//!
//! ```ignore
//! use colloquy_graph::prelude::*;
//!
//! let mut graph = Graph::new("village");
//! let start = graph.start_node().expect("new graphs have a start node");
//! let greeting = graph.add_node(NodeKind::lead(RowHandle::new(table, "greeting")));
//! graph.connect(start, greeting)?;
//!
//! for (level, nodes) in graph.levels().iter().enumerate() {
//!     println!("{level}: {nodes:?}");
//! }
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`colloquy_core`): tracing, clock, settings
//! - **Layer 2** (`colloquy_graph`): dialogue graph model (this crate)
//! - **Layer 3** (`colloquy_runtime`): participants, manager, network sync

/// Decorators and the session interface they act on.
pub mod decorator;

/// Edges between nodes.
pub mod edge;

/// Graph structure, traversal and validation.
pub mod graph;

/// Persistent and binding identifiers.
pub mod id;

/// Node types and the connection rule.
pub mod node;

/// Dialogue rows and row durations.
pub mod row;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::decorator::builtin::{
        Condition, OnlyFirstTime, OverrideDialogue, OverrideOnlyFirstTime, SaveNodeAsStart,
        SelectRandomRow, SendCommand, SwapParticipants,
    };
    pub use crate::decorator::{
        Attachment, BoxedDecorator, Decorator, DecoratorBinding, DecoratorError, DecoratorHandle,
        DecoratorScope, DecoratorState, DialogueSession, ValidationMode,
    };
    pub use crate::edge::{Edge, EdgeId};
    pub use crate::graph::{Graph, ValidationError};
    pub use crate::id::{Guid, ManagerId, ParticipantId, WorldId};
    pub use crate::node::{
        ConnectionError, DialogueNodeData, Node, NodeClass, NodeId, NodeKind, PinDirection,
        ReturnToNodeData,
    };
    pub use crate::row::{
        DialogueRow, DialogueTable, RowData, RowDurationMode, RowHandle, row_duration,
    };
}

pub use decorator::{Decorator, DecoratorHandle, DialogueSession};
pub use graph::{Graph, ValidationError};
pub use id::Guid;
pub use node::{Node, NodeId, NodeKind};
pub use row::DialogueTable;

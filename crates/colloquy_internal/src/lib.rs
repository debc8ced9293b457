//! # Colloquy Internal Library
//!
//! Re-exports the core Colloquy crates for convenience.

/// Layer 1: tracing, clock and settings.
pub use colloquy_core;

/// Layer 2: dialogue graph model.
pub use colloquy_graph;

/// Layer 3: participants, manager and network sync.
pub use colloquy_runtime;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use colloquy_core::{
        Clock, DialogueSettings, InputMode, SubtitlesKey, SubtitlesSettings, TracingConfig,
        TracingFormat,
    };
    pub use colloquy_runtime::prelude::*;
}

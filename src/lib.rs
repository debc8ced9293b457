//! A dialogue system for games: authored dialogue graphs, decorators,
//! participants and a replicated dialogue manager.
//!

pub use colloquy_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use colloquy_internal::prelude::*;
}

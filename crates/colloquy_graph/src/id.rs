//! Identifiers shared across the dialogue model.
//!
//! [`Guid`] identifies authored objects (graphs, nodes, rows) and survives
//! serialization. The binding identifiers ([`WorldId`], [`ParticipantId`],
//! [`ManagerId`]) name the runtime collaborators a decorator is bound to.

use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Globally unique identifier for graphs, nodes and dialogue rows.
///
/// Generated with nanoid, so independently authored graphs can be merged
/// without collisions. Internally uses `Arc<str>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Arc<str>);

impl Guid {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Creates an identifier from a known value.
    ///
    /// Used when restoring authored data or in tests.
    #[must_use]
    pub fn from_string(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! binding_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Creates an identifier from the given name.
            #[must_use]
            pub fn new(name: impl Into<Arc<str>>) -> Self {
                Self(name.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

binding_id!(
    /// Identifies the host world a dialogue runs in.
    WorldId,
    "world"
);

binding_id!(
    /// Identifies a dialogue participant.
    ParticipantId,
    "participant"
);

binding_id!(
    /// Identifies a dialogue manager.
    ManagerId,
    "manager"
);

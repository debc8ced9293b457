//! Hook registration API for dialogue events.
//!
//! The [`DialogueHooks`] registry lets UI layers and other collaborators
//! observe a manager's lifecycle. Hooks are keyed by [`EventKind`] and run in
//! registration order.
//!
//! # Multi-Event Registration
//!
//! Register one hook on several kinds with
//! [`register_observer_all`](DialogueHooks::register_observer_all):
//!
//! ```ignore
//! hooks.register_observer_all(
//!     &[EventKind::RowStarted, EventKind::RowFinished],
//!     "subtitles",
//!     |event: &DialogueEvent<'_>| match event {
//!         DialogueEvent::RowStarted(context) => show(context),
//!         DialogueEvent::RowFinished(_) => hide(),
//!         _ => {}
//!     },
//! )?;
//! ```
//!
//! # Example: Observer
//!
//! ```ignore
//! hooks.register_observer(EventKind::Failed, "logger", |event: &DialogueEvent<'_>| {
//!     if let DialogueEvent::Failed { reason } = event {
//!         tracing::error!(reason, "dialogue failed");
//!     }
//! })?;
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::events::{DialogueEvent, EventKind};

// ─────────────────────────────────────────────────────────────────────────────
// BoxedHook
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased hook that receives `&DialogueEvent` directly.
///
/// Most users should use [`DialogueHooks::register_observer`] instead of
/// creating `BoxedHook` directly.
pub struct BoxedHook {
    handler: Box<dyn Fn(&DialogueEvent<'_>) + Send + Sync>,
}

impl BoxedHook {
    /// Wraps a handler.
    #[must_use]
    pub fn new(handler: impl Fn(&DialogueEvent<'_>) + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Invokes the hook with the given event.
    pub fn invoke(&self, event: &DialogueEvent<'_>) {
        (self.handler)(event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistrationError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during hook registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookRegistrationError {
    /// A hook with this name already exists for the event kind.
    DuplicateName {
        /// The event kind where the duplicate was found.
        kind: EventKind,
        /// The duplicate hook name.
        name: String,
    },
}

impl fmt::Display for HookRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookRegistrationError::DuplicateName { kind, name } => {
                write!(f, "hook '{}' already registered for event '{}'", name, kind)
            }
        }
    }
}

impl core::error::Error for HookRegistrationError {}

// ─────────────────────────────────────────────────────────────────────────────
// HookEntry
// ─────────────────────────────────────────────────────────────────────────────

/// Entry in the hook registry.
struct HookEntry {
    /// Human-readable name for debugging and logging.
    name: String,
    /// The hook function.
    hook: BoxedHook,
}

// ─────────────────────────────────────────────────────────────────────────────
// DialogueHooks
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of dialogue event observers.
///
/// # Thread Safety
///
/// Uses interior mutability via [`RwLock`], so hooks can be registered
/// through a shared reference while the manager owns the registry.
///
/// # Re-entrancy
///
/// Hooks run while the broadcasting manager is mutably borrowed. When the
/// manager is a [`SharedManager`](crate::manager::SharedManager) or is
/// driven through a [`DialogueSync`](crate::sync::DialogueSync), its write
/// lock is held for the whole broadcast. A hook must not lock that manager,
/// dispatch requests to it, or register hooks on this registry: all three
/// deadlock. Record what the hook needs and act on it after the call
/// returns.
#[derive(Default)]
pub struct DialogueHooks {
    /// Maps event kind to a list of hook entries.
    hooks: RwLock<HashMap<EventKind, Vec<HookEntry>>>,
}

impl DialogueHooks {
    /// Creates a new empty hooks registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an observer for one event kind.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if `name` is already
    /// registered for `kind`.
    pub fn register_observer<F>(
        &self,
        kind: EventKind,
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        F: Fn(&DialogueEvent<'_>) + Send + Sync + 'static,
    {
        self.register_boxed(kind, name, BoxedHook::new(hook))?;
        Ok(self)
    }

    /// Registers one observer for several event kinds.
    ///
    /// Each registration is named `name@Kind`.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] on the first kind
    /// that already has a hook with that name. Kinds registered before the
    /// failure stay registered.
    pub fn register_observer_all<F>(
        &self,
        kinds: &[EventKind],
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        F: Fn(&DialogueEvent<'_>) + Send + Sync + 'static,
    {
        let name = name.into();
        // Arc is used internally to allow multiple kinds to share the same hook
        let hook = Arc::new(hook);

        for kind in kinds {
            let hook_name = if kinds.len() > 1 {
                format!("{}@{}", name, kind)
            } else {
                name.clone()
            };
            let hook_clone = Arc::clone(&hook);
            self.register_boxed(
                *kind,
                hook_name,
                BoxedHook::new(move |event: &DialogueEvent<'_>| hook_clone(event)),
            )?;
        }
        Ok(self)
    }

    /// Registers a pre-built [`BoxedHook`] for the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if `name` is already
    /// registered for `kind`.
    pub fn register_boxed(
        &self,
        kind: EventKind,
        name: impl Into<String>,
        hook: BoxedHook,
    ) -> Result<(), HookRegistrationError> {
        let name = name.into();

        let mut hooks = self.hooks.write();
        let entries = hooks.entry(kind).or_default();

        // Check for duplicate names
        if entries.iter().any(|entry| entry.name == name) {
            return Err(HookRegistrationError::DuplicateName { kind, name });
        }

        entries.push(HookEntry { name, hook });
        Ok(())
    }

    /// Removes a hook. Returns `false` if it was not registered.
    pub fn unregister(&self, kind: EventKind, name: &str) -> bool {
        let mut hooks = self.hooks.write();
        let Some(entries) = hooks.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        entries.len() != before
    }

    /// Invokes every hook registered for the event's kind, in registration
    /// order. Broadcasting with no listeners is a no-op.
    pub fn invoke(&self, event: &DialogueEvent<'_>) {
        let hooks = self.hooks.read();

        if let Some(entries) = hooks.get(&event.kind()) {
            for entry in entries {
                entry.hook.invoke(event);
            }
        }
    }

    /// Returns the number of hooks registered for the given kind.
    #[must_use]
    pub fn hook_count(&self, kind: EventKind) -> usize {
        let hooks = self.hooks.read();
        hooks.get(&kind).map_or(0, Vec::len)
    }

    /// Checks if a hook with the given name exists for the kind.
    #[must_use]
    pub fn contains_hook(&self, kind: EventKind, name: &str) -> bool {
        let hooks = self.hooks.read();
        hooks
            .get(&kind)
            .is_some_and(|entries| entries.iter().any(|entry| entry.name == name))
    }
}

impl fmt::Debug for DialogueHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        let mut map = f.debug_map();
        for (kind, entries) in hooks.iter() {
            let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
            map.entry(kind, &names);
        }
        map.finish()
    }
}

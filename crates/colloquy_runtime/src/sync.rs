//! Routing dialogue requests to the network authority.
//!
//! A [`DialogueSync`] sits next to the managers of one player. Requests to
//! start, close or change the state of a manager all pass through a single
//! gate, [`dispatch`](DialogueSync::dispatch):
//!
//! - an inactive component drops the request with a warning
//! - a component without authority forwards it over its [`RpcTransport`]
//! - the authority applies it to the registered manager
//!
//! Context broadcasts travel the other way: the authority sends a
//! [`ContextSnapshot`] to its replicas, which store it on their manager.
//!
//! [`channel`] builds an in-process reliable transport. The client side
//! gets a [`ChannelTransport`]; the server side drains the matching
//! [`SyncInbox`] into its own authoritative `DialogueSync`.
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut inbox) = sync::channel();
//! let client = DialogueSync::new(SyncOwner::PlayerController, false)
//!     .with_transport(Arc::new(transport));
//! let mut server = DialogueSync::new(SyncOwner::PlayerController, true);
//! server.add_manager(&manager);
//!
//! client.receive_start_request(&manager_id, Some(player), vec![npc])?;
//! inbox.deliver(&server);
//! ```

use core::fmt;
use std::sync::Arc;

use colloquy_graph::id::ManagerId;
use hashbrown::HashMap;
use tokio::sync::mpsc;

use crate::context::ContextSnapshot;
use crate::manager::{DialogueError, ManagerState, SharedManager};
use crate::participant::SharedParticipant;

/// Who owns a sync component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncOwner {
    /// A player controller; the only owner allowed to route requests.
    #[default]
    PlayerController,
    /// Any other actor.
    Other,
}

/// A request routed to a dialogue manager.
#[derive(Debug, Clone)]
pub enum SyncRequest {
    /// Start a dialogue.
    Start {
        /// Target manager.
        manager: ManagerId,
        /// The player starting the dialogue.
        initiator: Option<SharedParticipant>,
        /// Everyone else in the dialogue.
        participants: Vec<SharedParticipant>,
    },
    /// Close the running dialogue.
    Close {
        /// Target manager.
        manager: ManagerId,
    },
    /// Change the manager's state.
    SetState {
        /// Target manager.
        manager: ManagerId,
        /// Requested state.
        state: ManagerState,
    },
    /// Replicate the authority's context.
    BroadcastContext {
        /// Target manager.
        manager: ManagerId,
        /// The authoritative context.
        snapshot: ContextSnapshot,
    },
}

impl SyncRequest {
    /// Returns the target manager.
    #[must_use]
    pub fn manager(&self) -> &ManagerId {
        match self {
            SyncRequest::Start { manager, .. }
            | SyncRequest::Close { manager }
            | SyncRequest::SetState { manager, .. }
            | SyncRequest::BroadcastContext { manager, .. } => manager,
        }
    }

    /// Returns `true` for requests sent from the authority to its replicas.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        matches!(self, SyncRequest::BroadcastContext { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            SyncRequest::Start { .. } => "start",
            SyncRequest::Close { .. } => "close",
            SyncRequest::SetState { .. } => "set_state",
            SyncRequest::BroadcastContext { .. } => "broadcast_context",
        }
    }
}

/// Errors raised while routing requests.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The transport's receiving end is gone.
    #[error("sync transport is closed")]
    TransportClosed,

    /// The request must be forwarded but the component has no transport.
    #[error("no transport to forward the request")]
    NoTransport,

    /// No manager with this id is registered.
    #[error("unknown dialogue manager: {0}")]
    UnknownManager(ManagerId),

    /// The manager rejected the request.
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
}

/// Reliable, ordered delivery of requests to the other side: the authority
/// for clients, the replicas for the authority.
pub trait RpcTransport: Send + Sync {
    /// Sends a request without waiting for it to be applied.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::TransportClosed`] if the request cannot be
    /// delivered.
    fn send_reliable(&self, request: SyncRequest) -> Result<(), SyncError>;
}

/// What [`DialogueSync::dispatch`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The request was dropped.
    Dropped,
    /// The request was sent to the authority.
    Forwarded,
    /// The request was applied to a local manager.
    Applied,
}

// ─────────────────────────────────────────────────────────────────────────────
// DialogueSync
// ─────────────────────────────────────────────────────────────────────────────

/// Routes dialogue requests between a player and the authority.
pub struct DialogueSync {
    owner: SyncOwner,
    authority: bool,
    active: bool,
    managers: HashMap<ManagerId, SharedManager>,
    transport: Option<Arc<dyn RpcTransport>>,
}

impl DialogueSync {
    /// Creates an active component.
    #[must_use]
    pub fn new(owner: SyncOwner, authority: bool) -> Self {
        Self {
            owner,
            authority,
            active: true,
            managers: HashMap::new(),
            transport: None,
        }
    }

    /// Sets the transport used to reach the authority.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Returns the owner.
    #[must_use]
    pub fn owner(&self) -> SyncOwner {
        self.owner
    }

    /// Returns `true` if this component applies requests itself.
    #[must_use]
    pub fn has_authority(&self) -> bool {
        self.authority
    }

    /// Returns `true` if the component routes requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enables or disables routing.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Called when the owner enters play. Components not owned by a player
    /// controller deactivate themselves.
    pub fn begin_play(&mut self) {
        if self.owner != SyncOwner::PlayerController {
            tracing::warn!(owner = ?self.owner, "dialogue sync requires a player controller owner, deactivating");
            self.active = false;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a manager. Returns `false` if it was already registered or
    /// the component is inactive.
    pub fn add_manager(&mut self, manager: &SharedManager) -> bool {
        if !self.active {
            tracing::warn!("dialogue sync is inactive, manager not registered");
            return false;
        }
        let id = manager.read().id().clone();
        if self.managers.contains_key(&id) {
            return false;
        }
        tracing::debug!(manager = %id, "manager registered");
        self.managers.insert(id, Arc::clone(manager));
        true
    }

    /// Unregisters a manager. Returns `false` if it was not registered.
    pub fn remove_manager(&mut self, id: &ManagerId) -> bool {
        let removed = self.managers.remove(id).is_some();
        if removed {
            tracing::debug!(manager = %id, "manager unregistered");
        }
        removed
    }

    /// Returns `true` if a manager with this id is registered.
    #[must_use]
    pub fn contains_manager(&self, id: &ManagerId) -> bool {
        self.managers.contains_key(id)
    }

    /// Returns a registered manager.
    #[must_use]
    pub fn manager(&self, id: &ManagerId) -> Option<&SharedManager> {
        self.managers.get(id)
    }

    /// Returns the number of registered managers.
    #[must_use]
    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────

    /// Requests a dialogue start on `manager`.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn receive_start_request(
        &self,
        manager: &ManagerId,
        initiator: Option<SharedParticipant>,
        participants: Vec<SharedParticipant>,
    ) -> Result<DispatchOutcome, SyncError> {
        self.dispatch(SyncRequest::Start {
            manager: manager.clone(),
            initiator,
            participants,
        })
    }

    /// Requests `manager` to close its dialogue.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn receive_close_request(&self, manager: &ManagerId) -> Result<DispatchOutcome, SyncError> {
        self.dispatch(SyncRequest::Close {
            manager: manager.clone(),
        })
    }

    /// Requests `manager` to change state.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn receive_set_state(
        &self,
        manager: &ManagerId,
        state: ManagerState,
    ) -> Result<DispatchOutcome, SyncError> {
        self.dispatch(SyncRequest::SetState {
            manager: manager.clone(),
            state,
        })
    }

    /// Sends the context of `manager` to the replicas.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownManager`] for an unregistered manager and
    /// [`DialogueError::InvalidContext`] when it runs no dialogue, otherwise
    /// see [`dispatch`](Self::dispatch).
    pub fn broadcast_context(&self, manager: &ManagerId) -> Result<DispatchOutcome, SyncError> {
        let shared = self
            .managers
            .get(manager)
            .ok_or_else(|| SyncError::UnknownManager(manager.clone()))?;
        let snapshot = shared
            .read()
            .context_snapshot()
            .ok_or(DialogueError::InvalidContext)?;
        self.dispatch(SyncRequest::BroadcastContext {
            manager: manager.clone(),
            snapshot,
        })
    }

    /// Routes a request: drop, forward to the other side, or apply locally.
    ///
    /// Requests addressed to the authority are forwarded by clients and
    /// applied by the authority. Context broadcasts are forwarded by the
    /// authority and applied by clients.
    ///
    /// Applying a request holds the manager's write lock while its hooks
    /// run; see [`DialogueHooks`](crate::hooks::DialogueHooks).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoTransport`] or [`SyncError::TransportClosed`]
    /// when forwarding fails, [`SyncError::UnknownManager`] when the
    /// authority has no such manager, and [`SyncError::Dialogue`] when the
    /// manager rejects the request.
    pub fn dispatch(&self, request: SyncRequest) -> Result<DispatchOutcome, SyncError> {
        if !self.active {
            tracing::warn!(request = request.name(), manager = %request.manager(), "dialogue sync is inactive, request dropped");
            return Ok(DispatchOutcome::Dropped);
        }
        if let SyncRequest::Start {
            initiator: None,
            manager,
            ..
        } = &request
        {
            tracing::error!(%manager, "start request without an initiator, request dropped");
            return Ok(DispatchOutcome::Dropped);
        }

        if request.is_broadcast() == self.authority {
            let transport = self.transport.as_ref().ok_or(SyncError::NoTransport)?;
            tracing::debug!(request = request.name(), manager = %request.manager(), "forwarding request");
            transport.send_reliable(request)?;
            return Ok(DispatchOutcome::Forwarded);
        }

        self.apply(request)
    }

    // The manager's write lock is held while it runs, hooks included.
    fn apply(&self, request: SyncRequest) -> Result<DispatchOutcome, SyncError> {
        let Some(shared) = self.managers.get(request.manager()) else {
            tracing::warn!(request = request.name(), manager = %request.manager(), "unknown dialogue manager");
            return Err(SyncError::UnknownManager(request.manager().clone()));
        };
        let mut manager = shared.write();

        match request {
            SyncRequest::Start {
                initiator: Some(initiator),
                participants,
                ..
            } => manager.request_start_dialogue(&initiator, &participants)?,
            SyncRequest::Start { initiator: None, .. } => return Ok(DispatchOutcome::Dropped),
            SyncRequest::Close { .. } => manager.close_dialogue(),
            SyncRequest::SetState { state, .. } => {
                if !manager.set_state(state) {
                    tracing::warn!(manager = %manager.id(), ?state, "state change refused");
                }
            }
            SyncRequest::BroadcastContext { snapshot, .. } => manager.receive_context(snapshot)?,
        }
        Ok(DispatchOutcome::Applied)
    }
}

impl fmt::Debug for DialogueSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueSync")
            .field("owner", &self.owner)
            .field("authority", &self.authority)
            .field("active", &self.active)
            .field("managers", &self.managers.keys().collect::<Vec<_>>())
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Channel transport
// ─────────────────────────────────────────────────────────────────────────────

/// Creates an in-process transport and the inbox it delivers to.
#[must_use]
pub fn channel() -> (ChannelTransport, SyncInbox) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelTransport { sender }, SyncInbox { receiver })
}

/// Client end of [`channel`].
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<SyncRequest>,
}

impl RpcTransport for ChannelTransport {
    fn send_reliable(&self, request: SyncRequest) -> Result<(), SyncError> {
        self.sender
            .send(request)
            .map_err(|_| SyncError::TransportClosed)
    }
}

/// Server end of [`channel`].
#[derive(Debug)]
pub struct SyncInbox {
    receiver: mpsc::UnboundedReceiver<SyncRequest>,
}

impl SyncInbox {
    /// Dispatches every pending request to `server`, in arrival order.
    ///
    /// Returns the number of requests delivered. Failed requests are logged.
    pub fn deliver(&mut self, server: &DialogueSync) -> usize {
        let mut delivered = 0;
        while let Ok(request) = self.receiver.try_recv() {
            if let Err(error) = server.dispatch(request) {
                tracing::warn!(%error, "delivered request failed");
            }
            delivered += 1;
        }
        delivered
    }

    /// Waits for the next request and dispatches it to `server`.
    ///
    /// Returns `None` once every transport has been dropped.
    pub async fn recv_and_deliver(
        &mut self,
        server: &DialogueSync,
    ) -> Option<Result<DispatchOutcome, SyncError>> {
        let request = self.receiver.recv().await?;
        Some(server.dispatch(request))
    }
}

//! ManageSessionsUseCase: the named-session registry and the current-session
//! pointer.
//!
//! The registry is the controller's in-memory database of every remote
//! desktop session the operator has created. Each entry owns the session's
//! [`ConnectionLifecycle`]; the registry itself is mutated only by the
//! dispatcher's single control context, so it needs no locking.
//!
//! Invariants:
//! - session ids are unique and immutable after creation;
//! - the current pointer is unset or names an existing session;
//! - the first successfully created session becomes current automatically;
//! - listing preserves insertion order.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::infrastructure::lifecycle::{ConnectionLifecycle, LifecycleConfig, LifecycleError};
use crate::infrastructure::rdp_bridge::{ConnectionParams, RdpConnectionFactory};

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("session id {0:?} already exists")]
    DuplicateId(String),
    #[error("session {0:?} not found")]
    NotFound(String),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// One named session: its creation parameters and connection lifecycle.
pub struct Session {
    id: String,
    params: ConnectionParams,
    hidden: bool,
    lifecycle: ConnectionLifecycle,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Whether the session was created with its window hidden.
    pub fn starts_hidden(&self) -> bool {
        self.hidden
    }

    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    pub fn is_live(&self) -> bool {
        self.lifecycle.is_live()
    }
}

/// Point-in-time view of one registry entry, for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    pub live: bool,
    pub is_current: bool,
}

/// Registry of all sessions plus the current-session pointer.
///
/// A `HashMap` provides the id lookup; `order` preserves creation order for
/// `list_sessions`, which reports sessions in the order the operator made
/// them.
pub struct SessionRegistry {
    factory: Arc<dyn RdpConnectionFactory>,
    lifecycle_config: LifecycleConfig,
    sessions: HashMap<String, Session>,
    order: Vec<String>,
    current: Option<String>,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn RdpConnectionFactory>, lifecycle_config: LifecycleConfig) -> Self {
        Self {
            factory,
            lifecycle_config,
            sessions: HashMap::new(),
            order: Vec::new(),
            current: None,
        }
    }

    /// Creates a session, connects it, and registers it under `id`.
    ///
    /// On the first successful creation the new session becomes current; a
    /// later creation never displaces an existing current session. On any
    /// failure the registry is left untouched.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateId`] if `id` is already registered.
    /// - [`RegistryError::Lifecycle`] if the connect attempt fails; the
    ///   session is not inserted.
    pub async fn add_session(
        &mut self,
        id: &str,
        params: ConnectionParams,
        hidden: bool,
    ) -> Result<(), RegistryError> {
        if self.sessions.contains_key(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }

        let lifecycle = ConnectionLifecycle::new(
            id,
            Arc::clone(&self.factory),
            self.lifecycle_config.clone(),
        );
        lifecycle.connect(params.clone(), hidden).await?;

        self.sessions.insert(
            id.to_string(),
            Session {
                id: id.to_string(),
                params,
                hidden,
                lifecycle,
            },
        );
        self.order.push(id.to_string());

        if self.current.is_none() {
            self.current = Some(id.to_string());
            info!(session = %id, "first session registered, now current");
        }
        Ok(())
    }

    /// The current session, or `None` when unset. Never errors.
    pub fn get_current(&self) -> Option<&Session> {
        self.current
            .as_deref()
            .and_then(|id| self.sessions.get(id))
    }

    /// The current session's id, if any.
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Makes `id` the current session.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when `id` is unknown; the current
    /// pointer is left unchanged.
    pub fn switch_current(&mut self, id: &str) -> Result<(), RegistryError> {
        if !self.sessions.contains_key(id) {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        self.current = Some(id.to_string());
        Ok(())
    }

    /// Snapshots of all sessions in creation order.
    ///
    /// A pure query: reads only the liveness flags and never blocks on any
    /// session's lifecycle.
    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|session| SessionSnapshot {
                id: session.id.clone(),
                live: session.is_live(),
                is_current: self.current.as_deref() == Some(session.id.as_str()),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Closes every session and clears the registry.
    ///
    /// Shutdown requests are issued to all sessions first, then each worker
    /// is joined so handle release is observed before the entries are
    /// dropped. A failure in one session does not abort the sweep.
    pub fn close_all(&mut self) {
        for id in &self.order {
            if let Some(session) = self.sessions.get(id) {
                info!(session = %id, "closing");
                session.lifecycle.close();
            }
        }
        for id in &self.order {
            if let Some(session) = self.sessions.get(id) {
                session.lifecycle.join();
            }
        }
        let count = self.sessions.len();
        self.sessions.clear();
        self.order.clear();
        self.current = None;
        if count > 0 {
            warn!("closed {count} session(s)");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Per-session connection lifecycle.
//!
//! Each session owns a dedicated worker thread that constructs the RDP
//! connection, connects, and then blocks in the collaborator's message loop
//! for the session's entire active lifetime. The collaborator requires
//! single-threaded affinity for its loop, so the worker thread owns the
//! connection exclusively; the control context only talks to it through the
//! readiness oneshot at connect time and the shutdown request at close time.
//!
//! State machine:
//!
//! ```text
//! Idle ──► Connecting ──► Active ──► Closed
//!              │
//!              └────────► Failed
//! ```
//!
//! `Active → Closed` also happens on external termination: the remote side
//! disconnecting, the remote window being closed, or a collaborator failure
//! inside the worker (caught at the thread boundary, logged, never
//! propagated to the control context).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::rdp_bridge::{BridgeError, ConnectionParams, RdpConnection, RdpConnectionFactory};

/// Lifecycle state of one session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection attempt has been made (or the last one timed out).
    Idle,
    /// A worker thread is establishing the connection.
    Connecting,
    /// The connection is ready and input can be injected.
    Active,
    /// The connect attempt failed before the connection became ready.
    Failed,
    /// The message loop has returned; the handle is released.
    Closed,
}

/// Error type for lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("a connection attempt is already running or was already made")]
    AlreadyRunning,
    #[error("connection did not become ready within {0:?}")]
    ConnectTimeout(Duration),
    #[error("failed to spawn session worker thread")]
    Spawn(#[source] std::io::Error),
    #[error("session worker exited before the connection became ready")]
    WorkerExited,
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Timing knobs for the connect handshake.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How long `connect` waits for the worker to report readiness.
    pub connect_timeout: Duration,
    /// Settle delay before hiding a start-hidden session, so the window can
    /// materialize first.
    pub hide_settle: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            hide_settle: Duration::from_secs(1),
        }
    }
}

/// State shared between the control context and the session worker thread.
struct Shared {
    state: Mutex<SessionState>,
    live: AtomicBool,
    handle: RwLock<Option<Arc<dyn RdpConnection>>>,
}

/// Owns one session's connection from connect to teardown.
pub struct ConnectionLifecycle {
    session_id: String,
    factory: Arc<dyn RdpConnectionFactory>,
    config: LifecycleConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionLifecycle {
    pub fn new(
        session_id: impl Into<String>,
        factory: Arc<dyn RdpConnectionFactory>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            factory,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                live: AtomicBool::new(false),
                handle: RwLock::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Starts the connection and waits for it to become ready.
    ///
    /// Spawns the session worker thread and blocks (without spinning) on a
    /// readiness oneshot under the configured timeout. On timeout the
    /// receiver is dropped, so a handle produced later by the stale attempt
    /// is discarded by the worker rather than published.
    ///
    /// If `start_hidden` is set, waits a short settle delay after readiness
    /// and then hides the session window.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::AlreadyRunning`] if the state is not `Idle`.
    /// - [`LifecycleError::ConnectTimeout`] if readiness does not arrive in
    ///   time; the state resets to `Idle`.
    /// - [`LifecycleError::Bridge`] if the collaborator rejects the connect;
    ///   the state becomes `Failed`.
    pub async fn connect(
        &self,
        params: ConnectionParams,
        start_hidden: bool,
    ) -> Result<(), LifecycleError> {
        {
            let mut state = self.shared.state.lock().expect("lock poisoned");
            if *state != SessionState::Idle {
                return Err(LifecycleError::AlreadyRunning);
            }
            *state = SessionState::Connecting;
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let factory = Arc::clone(&self.factory);
        let session_id = self.session_id.clone();

        let worker = std::thread::Builder::new()
            .name(format!("rdp-session-{}", self.session_id))
            .spawn(move || run_session(session_id, shared, factory, params, ready_tx))
            .map_err(|e| {
                self.reset_to_idle();
                LifecycleError::Spawn(e)
            })?;
        *self.worker.lock().expect("lock poisoned") = Some(worker);

        match tokio::time::timeout(self.config.connect_timeout, ready_rx).await {
            Ok(Ok(Ok(conn))) => {
                let published = {
                    let mut state = self.shared.state.lock().expect("lock poisoned");
                    if *state == SessionState::Connecting {
                        *self.shared.handle.write().expect("lock poisoned") =
                            Some(Arc::clone(&conn));
                        self.shared.live.store(true, Ordering::SeqCst);
                        *state = SessionState::Active;
                        true
                    } else {
                        // The worker already observed a close between
                        // readiness and publication.
                        false
                    }
                };
                if !published {
                    warn!(session = %self.session_id, "connection closed during startup");
                    return Ok(());
                }
                info!(session = %self.session_id, "connection ready");
                if start_hidden {
                    tokio::time::sleep(self.config.hide_settle).await;
                    if let Err(e) = conn.move_to_background() {
                        warn!(session = %self.session_id, "failed to hide window: {e}");
                    }
                }
                Ok(())
            }
            Ok(Ok(Err(bridge_err))) => {
                *self.shared.state.lock().expect("lock poisoned") = SessionState::Failed;
                Err(LifecycleError::Bridge(bridge_err))
            }
            Ok(Err(_recv_dropped)) => {
                *self.shared.state.lock().expect("lock poisoned") = SessionState::Failed;
                Err(LifecycleError::WorkerExited)
            }
            Err(_elapsed) => {
                self.reset_to_idle();
                Err(LifecycleError::ConnectTimeout(self.config.connect_timeout))
            }
        }
    }

    /// Requests cooperative shutdown of the session.
    ///
    /// Marks the session not-live and asks the collaborator to terminate its
    /// message loop; the handle itself is released when the loop returns.
    /// Calling `close` on a session that never connected, or twice, is a
    /// no-op.
    pub fn close(&self) {
        self.shared.live.store(false, Ordering::SeqCst);
        let conn = self.shared.handle.read().expect("lock poisoned").clone();
        if let Some(conn) = conn {
            debug!(session = %self.session_id, "requesting shutdown");
            conn.request_shutdown();
        }
    }

    /// Waits for the worker thread to finish and release the handle.
    ///
    /// Handle release after [`close`](Self::close) is normally asynchronous;
    /// this is the synchronous observation point for callers that need it.
    pub fn join(&self) {
        let worker = self.worker.lock().expect("lock poisoned").take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!(session = %self.session_id, "session worker panicked");
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.shared.state.lock().expect("lock poisoned")
    }

    /// Whether the session is live (connected and not closing).
    pub fn is_live(&self) -> bool {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// The published connection handle, if the session is active.
    pub fn handle(&self) -> Option<Arc<dyn RdpConnection>> {
        self.shared.handle.read().expect("lock poisoned").clone()
    }

    fn reset_to_idle(&self) {
        let mut state = self.shared.state.lock().expect("lock poisoned");
        if *state == SessionState::Connecting {
            *state = SessionState::Idle;
        }
    }
}

/// Body of the session worker thread.
///
/// Owns the connection exclusively: constructs it, connects, reports
/// readiness, then blocks in the message loop until shutdown or remote
/// close. All collaborator failures are absorbed here.
fn run_session(
    session_id: String,
    shared: Arc<Shared>,
    factory: Arc<dyn RdpConnectionFactory>,
    params: ConnectionParams,
    ready_tx: oneshot::Sender<Result<Arc<dyn RdpConnection>, BridgeError>>,
) {
    let conn = match factory
        .create(&params)
        .and_then(|conn| conn.connect().map(|()| conn))
    {
        Ok(conn) => conn,
        Err(e) => {
            debug!(session = %session_id, "connect failed in worker: {e}");
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if ready_tx.send(Ok(Arc::clone(&conn))).is_err() {
        // The control context abandoned this attempt (timeout). The handle
        // must not be published; shut the orphan connection down instead.
        debug!(session = %session_id, "discarding handle from abandoned connect attempt");
        conn.request_shutdown();
        return;
    }

    // Blocks for the session's whole active lifetime. A collaborator
    // failure is caught here and treated as a remote-side close; it never
    // reaches the control context.
    if let Err(e) = conn.run_message_loop() {
        error!(session = %session_id, "collaborator failure, treating as closed: {e}");
    } else {
        info!(session = %session_id, "message loop ended");
    }

    let mut state = shared.state.lock().expect("lock poisoned");
    shared.live.store(false, Ordering::SeqCst);
    *shared.handle.write().expect("lock poisoned") = None;
    *state = SessionState::Closed;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

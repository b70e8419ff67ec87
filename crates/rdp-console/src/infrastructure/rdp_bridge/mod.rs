//! The RDP collaborator boundary.
//!
//! The actual remote desktop protocol (wire connection, frame rendering,
//! native window handling) lives outside this crate. This module models it
//! as the capability surface the controller consumes: [`RdpConnection`] for
//! one established session and [`RdpConnectionFactory`] for constructing
//! connection objects with their parameters assigned.
//!
//! Input-send operations are documented by the collaborator as deliverable
//! without the window being foreground or visible ("background" delivery);
//! everything else is only safe to invoke from the session's own worker
//! thread, except `request_shutdown`, which is the documented asynchronous
//! termination handshake.

pub mod mock;

use thiserror::Error;

/// Error surfaced from the remote desktop collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Any failure raised by the collaborator, carried opaquely.
    #[error("collaborator failure: {0}")]
    CollaboratorFailure(String),
}

/// Creation-time parameters for one connection.
///
/// Credentials are passed through opaquely; the controller never interprets
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub server: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub width: u32,
    pub height: u32,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            username: String::new(),
            password: String::new(),
            port: 3389,
            width: 1024,
            height: 768,
        }
    }
}

/// Capability surface of one remote desktop connection.
///
/// The session's worker thread owns the connection for its entire active
/// lifetime: it calls [`connect`](RdpConnection::connect) and then blocks in
/// [`run_message_loop`](RdpConnection::run_message_loop) until the remote
/// side disconnects or shutdown is requested.
pub trait RdpConnection: Send + Sync {
    /// Initiates the connection with the parameters assigned at construction.
    fn connect(&self) -> Result<(), BridgeError>;

    /// Runs the collaborator's blocking event loop.
    ///
    /// Returns when the remote side disconnects, shutdown is requested, or
    /// the collaborator fails.
    fn run_message_loop(&self) -> Result<(), BridgeError>;

    /// Requests cooperative termination of the message loop.
    ///
    /// Safe to call from any thread; the loop observes the request
    /// asynchronously.
    fn request_shutdown(&self);

    /// Left-button press-and-release at absolute coordinates.
    fn send_mouse_click(&self, x: i32, y: i32) -> Result<(), BridgeError>;

    /// Right-button press-and-release at absolute coordinates.
    fn send_mouse_right_click(&self, x: i32, y: i32) -> Result<(), BridgeError>;

    /// Left-button press without release.
    fn send_mouse_down(&self, x: i32, y: i32) -> Result<(), BridgeError>;

    /// Left-button release.
    fn send_mouse_up(&self, x: i32, y: i32) -> Result<(), BridgeError>;

    /// Pointer move; `is_drag` marks the move as part of an active drag.
    fn send_mouse_move(&self, x: i32, y: i32, is_drag: bool) -> Result<(), BridgeError>;

    /// Sends one key event for the given virtual key code.
    fn send_key(&self, vk: u16) -> Result<(), BridgeError>;

    /// Hides the session window.
    fn move_to_background(&self) -> Result<(), BridgeError>;

    /// Restores the session window.
    fn restore_window(&self) -> Result<(), BridgeError>;
}

/// Constructs connection objects with their parameters assigned.
///
/// The production implementation wraps the native RDP client bridge; tests
/// and the current binary use [`mock::MockRdpFactory`].
pub trait RdpConnectionFactory: Send + Sync {
    /// Constructs a new, not-yet-connected connection object.
    fn create(
        &self,
        params: &ConnectionParams,
    ) -> Result<std::sync::Arc<dyn RdpConnection>, BridgeError>;
}

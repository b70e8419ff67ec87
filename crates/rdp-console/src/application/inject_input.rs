//! InjectInputUseCase: pointer and keyboard delivery into one session.
//!
//! Every operation targets a session's [`ConnectionLifecycle`] and requires
//! it to be `Active`. Two variants are exposed:
//!
//! - [`InputInjector`]: the strict API; operations on an inactive session
//!   return [`InjectError::SessionNotActive`] so programmatic callers can
//!   react.
//! - [`SilentInjector`]: the lossy wrapper matching the original operator
//!   behavior; input to an inactive session is a logged no-op so scripted
//!   sequences keep running.
//!
//! Input is delivered "background": the collaborator accepts these sends
//! whether or not the session window is visible.

use std::sync::Arc;
use std::time::Duration;

use rdp_core::keymap::{self, KeySpec, KeymapError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::infrastructure::lifecycle::ConnectionLifecycle;
use crate::infrastructure::rdp_bridge::{BridgeError, RdpConnection};

/// Error type for input injection.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The target session has no active connection.
    #[error("no active connection for this session")]
    SessionNotActive,
    #[error(transparent)]
    Key(#[from] KeymapError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Pacing applied between injected events.
///
/// The delays serialize input at a rate the remote side tolerates; they
/// block the calling context on purpose.
#[derive(Debug, Clone)]
pub struct InjectorTiming {
    /// Delay between key presses in [`InputInjector::type_text`].
    pub type_interval: Duration,
    /// Number of interpolated moves in a drag.
    pub drag_steps: u32,
    /// Delay after each interpolated drag move.
    pub drag_step_delay: Duration,
    /// Settle delay around the drag's press and release.
    pub drag_settle: Duration,
}

impl Default for InjectorTiming {
    fn default() -> Self {
        Self {
            type_interval: Duration::from_millis(50),
            drag_steps: 20,
            drag_step_delay: Duration::from_millis(10),
            drag_settle: Duration::from_millis(100),
        }
    }
}

impl InjectorTiming {
    /// Zero delays for tests; event ordering is unaffected.
    pub fn immediate() -> Self {
        Self {
            type_interval: Duration::ZERO,
            drag_steps: 20,
            drag_step_delay: Duration::ZERO,
            drag_settle: Duration::ZERO,
        }
    }
}

/// The strict input injector. Stateless per call apart from pacing knobs.
#[derive(Debug, Clone, Default)]
pub struct InputInjector {
    timing: InjectorTiming,
}

impl InputInjector {
    pub fn new(timing: InjectorTiming) -> Self {
        Self { timing }
    }

    /// Left-button press-and-release at absolute coordinates.
    pub fn click(&self, session: &ConnectionLifecycle, x: i32, y: i32) -> Result<(), InjectError> {
        self.connection(session)?.send_mouse_click(x, y)?;
        Ok(())
    }

    /// Right-button press-and-release at absolute coordinates.
    pub fn right_click(
        &self,
        session: &ConnectionLifecycle,
        x: i32,
        y: i32,
    ) -> Result<(), InjectError> {
        self.connection(session)?.send_mouse_right_click(x, y)?;
        Ok(())
    }

    /// Left-button press without release.
    pub fn pointer_down(
        &self,
        session: &ConnectionLifecycle,
        x: i32,
        y: i32,
    ) -> Result<(), InjectError> {
        self.connection(session)?.send_mouse_down(x, y)?;
        Ok(())
    }

    /// Left-button release.
    pub fn pointer_up(
        &self,
        session: &ConnectionLifecycle,
        x: i32,
        y: i32,
    ) -> Result<(), InjectError> {
        self.connection(session)?.send_mouse_up(x, y)?;
        Ok(())
    }

    /// Pointer move; `dragging` marks the move as part of an active drag.
    pub fn pointer_move(
        &self,
        session: &ConnectionLifecycle,
        x: i32,
        y: i32,
        dragging: bool,
    ) -> Result<(), InjectError> {
        self.connection(session)?.send_mouse_move(x, y, dragging)?;
        Ok(())
    }

    /// Resolves `spec` and sends one key event.
    ///
    /// # Errors
    ///
    /// [`InjectError::Key`] when the specifier does not resolve; nothing is
    /// sent in that case.
    pub fn press_key(
        &self,
        session: &ConnectionLifecycle,
        spec: KeySpec<'_>,
    ) -> Result<(), InjectError> {
        let conn = self.connection(session)?;
        let vk = keymap::resolve(spec)?;
        conn.send_key(vk)?;
        Ok(())
    }

    /// Types `text` one key press at a time.
    ///
    /// Spaces map to the symbolic SPACE key; every other character goes
    /// through [`press_key`](Self::press_key). Presses are sequential with a
    /// fixed inter-press delay, so long strings take proportionally long.
    /// Characters that do not resolve are reported and skipped; the rest of
    /// the string is still typed. There is no mid-string cancellation.
    pub async fn type_text(
        &self,
        session: &ConnectionLifecycle,
        text: &str,
    ) -> Result<(), InjectError> {
        for ch in text.chars() {
            let result = if ch == ' ' {
                self.press_key(session, KeySpec::Name("SPACE"))
            } else {
                let mut buf = [0u8; 4];
                self.press_key(session, KeySpec::Name(ch.encode_utf8(&mut buf)))
            };
            match result {
                Ok(()) => {}
                Err(InjectError::Key(e)) => {
                    warn!("skipping untypable character: {e}");
                }
                Err(other) => return Err(other),
            }
            tokio::time::sleep(self.timing.type_interval).await;
        }
        Ok(())
    }

    /// Drags from `(x1, y1)` to `(x2, y2)` with linear interpolation.
    ///
    /// The sequence is deterministic: move to the start (no drag flag),
    /// settle, press, settle, then `drag_steps` interpolated moves with the
    /// drag flag and a step delay each, a final dragging move to exactly
    /// `(x2, y2)`, settle, release. Interpolated coordinates are truncated
    /// to integers, not rounded.
    pub async fn drag_drop(
        &self,
        session: &ConnectionLifecycle,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    ) -> Result<(), InjectError> {
        let conn = self.connection(session)?;
        let steps = self.timing.drag_steps.max(1);

        conn.send_mouse_move(x1, y1, false)?;
        tokio::time::sleep(self.timing.drag_settle).await;
        conn.send_mouse_down(x1, y1)?;
        tokio::time::sleep(self.timing.drag_settle).await;

        let dx = f64::from(x2 - x1) / f64::from(steps);
        let dy = f64::from(y2 - y1) / f64::from(steps);
        for i in 0..steps {
            let ix = (f64::from(x1) + dx * f64::from(i)) as i32;
            let iy = (f64::from(y1) + dy * f64::from(i)) as i32;
            conn.send_mouse_move(ix, iy, true)?;
            tokio::time::sleep(self.timing.drag_step_delay).await;
        }

        conn.send_mouse_move(x2, y2, true)?;
        tokio::time::sleep(self.timing.drag_settle).await;
        conn.send_mouse_up(x2, y2)?;
        Ok(())
    }

    /// Hides the session window. No local visibility state is kept.
    pub fn hide(&self, session: &ConnectionLifecycle) -> Result<(), InjectError> {
        self.connection(session)?.move_to_background()?;
        Ok(())
    }

    /// Restores the session window.
    pub fn show(&self, session: &ConnectionLifecycle) -> Result<(), InjectError> {
        self.connection(session)?.restore_window()?;
        Ok(())
    }

    fn connection(
        &self,
        session: &ConnectionLifecycle,
    ) -> Result<Arc<dyn RdpConnection>, InjectError> {
        if !session.is_live() {
            return Err(InjectError::SessionNotActive);
        }
        session.handle().ok_or(InjectError::SessionNotActive)
    }
}

/// Lossy wrapper over [`InputInjector`].
///
/// Input aimed at an inactive session is dropped with a debug log instead of
/// erroring, matching the original controller's behavior for scripted
/// sequences. Collaborator failures are still reported, at warn level.
#[derive(Debug, Clone, Default)]
pub struct SilentInjector {
    inner: InputInjector,
}

impl SilentInjector {
    pub fn new(timing: InjectorTiming) -> Self {
        Self {
            inner: InputInjector::new(timing),
        }
    }

    pub fn click(&self, session: &ConnectionLifecycle, x: i32, y: i32) {
        log_dropped(self.inner.click(session, x, y));
    }

    pub fn right_click(&self, session: &ConnectionLifecycle, x: i32, y: i32) {
        log_dropped(self.inner.right_click(session, x, y));
    }

    pub fn pointer_down(&self, session: &ConnectionLifecycle, x: i32, y: i32) {
        log_dropped(self.inner.pointer_down(session, x, y));
    }

    pub fn pointer_up(&self, session: &ConnectionLifecycle, x: i32, y: i32) {
        log_dropped(self.inner.pointer_up(session, x, y));
    }

    pub fn pointer_move(&self, session: &ConnectionLifecycle, x: i32, y: i32, dragging: bool) {
        log_dropped(self.inner.pointer_move(session, x, y, dragging));
    }

    pub fn press_key(&self, session: &ConnectionLifecycle, spec: KeySpec<'_>) {
        log_dropped(self.inner.press_key(session, spec));
    }

    pub async fn type_text(&self, session: &ConnectionLifecycle, text: &str) {
        log_dropped(self.inner.type_text(session, text).await);
    }

    pub async fn drag_drop(&self, session: &ConnectionLifecycle, x1: i32, y1: i32, x2: i32, y2: i32) {
        log_dropped(self.inner.drag_drop(session, x1, y1, x2, y2).await);
    }

    pub fn hide(&self, session: &ConnectionLifecycle) {
        log_dropped(self.inner.hide(session));
    }

    pub fn show(&self, session: &ConnectionLifecycle) {
        log_dropped(self.inner.show(session));
    }
}

fn log_dropped(result: Result<(), InjectError>) {
    match result {
        Ok(()) => {}
        Err(InjectError::SessionNotActive) => {
            debug!("input dropped: session not active");
        }
        Err(e) => warn!("input dropped: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

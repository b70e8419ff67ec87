//! Mock RDP bridge for unit and integration testing.
//!
//! [`MockRdpConnection`] records every injected input event instead of
//! talking to a remote host, and its message loop blocks on a condvar until
//! shutdown is requested, mimicking the collaborator's blocking run loop.
//! [`MockRdpFactory`] retains a handle to every connection it creates so
//! tests can assert on the recorded events afterwards.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::{BridgeError, ConnectionParams, RdpConnection, RdpConnectionFactory};

/// One input event recorded by the mock, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Click { x: i32, y: i32 },
    RightClick { x: i32, y: i32 },
    MouseDown { x: i32, y: i32 },
    MouseUp { x: i32, y: i32 },
    MouseMove { x: i32, y: i32, is_drag: bool },
    Key(u16),
    Hide,
    Show,
}

/// Failure and delay knobs applied to connections the factory creates.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// `connect()` sleeps this long before returning, for timeout tests.
    pub connect_delay: Option<Duration>,
    /// `connect()` fails with this message instead of succeeding.
    pub fail_connect: Option<String>,
    /// `run_message_loop()` fails immediately with this message, simulating
    /// a collaborator crash after a successful connect.
    pub fail_message_loop: Option<String>,
}

/// A recording implementation of [`RdpConnection`].
pub struct MockRdpConnection {
    params: ConnectionParams,
    behavior: MockBehavior,
    events: Mutex<Vec<RecordedEvent>>,
    shutdown: Mutex<bool>,
    shutdown_signal: Condvar,
}

impl MockRdpConnection {
    pub fn new(params: ConnectionParams, behavior: MockBehavior) -> Self {
        Self {
            params,
            behavior,
            events: Mutex::new(Vec::new()),
            shutdown: Mutex::new(false),
            shutdown_signal: Condvar::new(),
        }
    }

    /// Returns the parameters this connection was constructed with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Returns a snapshot of all recorded events in delivery order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Simulates the remote side closing the connection: the message loop
    /// returns normally, as if the user closed the remote window.
    pub fn close_from_remote(&self) {
        self.request_shutdown();
    }

    fn record(&self, event: RecordedEvent) -> Result<(), BridgeError> {
        self.events.lock().expect("lock poisoned").push(event);
        Ok(())
    }
}

impl RdpConnection for MockRdpConnection {
    fn connect(&self) -> Result<(), BridgeError> {
        if let Some(delay) = self.behavior.connect_delay {
            std::thread::sleep(delay);
        }
        if let Some(ref msg) = self.behavior.fail_connect {
            return Err(BridgeError::CollaboratorFailure(msg.clone()));
        }
        Ok(())
    }

    fn run_message_loop(&self) -> Result<(), BridgeError> {
        if let Some(ref msg) = self.behavior.fail_message_loop {
            return Err(BridgeError::CollaboratorFailure(msg.clone()));
        }
        let mut down = self.shutdown.lock().expect("lock poisoned");
        while !*down {
            down = self.shutdown_signal.wait(down).expect("lock poisoned");
        }
        Ok(())
    }

    fn request_shutdown(&self) {
        let mut down = self.shutdown.lock().expect("lock poisoned");
        *down = true;
        self.shutdown_signal.notify_all();
    }

    fn send_mouse_click(&self, x: i32, y: i32) -> Result<(), BridgeError> {
        self.record(RecordedEvent::Click { x, y })
    }

    fn send_mouse_right_click(&self, x: i32, y: i32) -> Result<(), BridgeError> {
        self.record(RecordedEvent::RightClick { x, y })
    }

    fn send_mouse_down(&self, x: i32, y: i32) -> Result<(), BridgeError> {
        self.record(RecordedEvent::MouseDown { x, y })
    }

    fn send_mouse_up(&self, x: i32, y: i32) -> Result<(), BridgeError> {
        self.record(RecordedEvent::MouseUp { x, y })
    }

    fn send_mouse_move(&self, x: i32, y: i32, is_drag: bool) -> Result<(), BridgeError> {
        self.record(RecordedEvent::MouseMove { x, y, is_drag })
    }

    fn send_key(&self, vk: u16) -> Result<(), BridgeError> {
        self.record(RecordedEvent::Key(vk))
    }

    fn move_to_background(&self) -> Result<(), BridgeError> {
        self.record(RecordedEvent::Hide)
    }

    fn restore_window(&self) -> Result<(), BridgeError> {
        self.record(RecordedEvent::Show)
    }
}

/// Factory handing out [`MockRdpConnection`]s.
///
/// The behavior template applies to every subsequently created connection;
/// created connections are retained for later assertions.
#[derive(Default)]
pub struct MockRdpFactory {
    behavior: Mutex<MockBehavior>,
    created: Mutex<Vec<Arc<MockRdpConnection>>>,
}

impl MockRdpFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `connect()` fail with the given message.
    pub fn fail_connect(&self, message: &str) {
        self.behavior.lock().expect("lock poisoned").fail_connect = Some(message.to_string());
    }

    /// Delays every subsequent `connect()` by the given duration.
    pub fn delay_connect(&self, delay: Duration) {
        self.behavior.lock().expect("lock poisoned").connect_delay = Some(delay);
    }

    /// Makes every subsequent message loop fail immediately.
    pub fn fail_message_loop(&self, message: &str) {
        self.behavior.lock().expect("lock poisoned").fail_message_loop = Some(message.to_string());
    }

    /// Clears all configured failure and delay knobs.
    pub fn reset_behavior(&self) {
        *self.behavior.lock().expect("lock poisoned") = MockBehavior::default();
    }

    /// Returns the most recently created connection, if any.
    pub fn last_connection(&self) -> Option<Arc<MockRdpConnection>> {
        self.created.lock().expect("lock poisoned").last().cloned()
    }

    /// Returns all created connections in creation order.
    pub fn created(&self) -> Vec<Arc<MockRdpConnection>> {
        self.created.lock().expect("lock poisoned").clone()
    }

    /// Returns how many connections this factory has created.
    pub fn created_count(&self) -> usize {
        self.created.lock().expect("lock poisoned").len()
    }
}

impl RdpConnectionFactory for MockRdpFactory {
    fn create(&self, params: &ConnectionParams) -> Result<Arc<dyn RdpConnection>, BridgeError> {
        let behavior = self.behavior.lock().expect("lock poisoned").clone();
        let conn = Arc::new(MockRdpConnection::new(params.clone(), behavior));
        self.created
            .lock()
            .expect("lock poisoned")
            .push(Arc::clone(&conn));
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> MockRdpConnection {
        MockRdpConnection::new(ConnectionParams::default(), MockBehavior::default())
    }

    #[test]
    fn test_mock_records_input_events_in_order() {
        // Arrange
        let conn = make_connection();

        // Act
        conn.send_mouse_move(10, 20, false).unwrap();
        conn.send_mouse_down(10, 20).unwrap();
        conn.send_mouse_up(30, 40).unwrap();
        conn.send_key(0x0D).unwrap();

        // Assert
        assert_eq!(
            conn.events(),
            vec![
                RecordedEvent::MouseMove { x: 10, y: 20, is_drag: false },
                RecordedEvent::MouseDown { x: 10, y: 20 },
                RecordedEvent::MouseUp { x: 30, y: 40 },
                RecordedEvent::Key(0x0D),
            ]
        );
    }

    #[test]
    fn test_message_loop_blocks_until_shutdown_requested() {
        // Arrange
        let conn = Arc::new(make_connection());
        let loop_conn = Arc::clone(&conn);

        // Act – run the loop on a worker thread, then release it.
        let worker = std::thread::spawn(move || loop_conn.run_message_loop());
        conn.request_shutdown();

        // Assert
        let result = worker.join().expect("worker must not panic");
        assert!(result.is_ok());
    }

    #[test]
    fn test_connect_fails_when_configured_to_fail() {
        // Arrange
        let behavior = MockBehavior {
            fail_connect: Some("logon denied".to_string()),
            ..Default::default()
        };
        let conn = MockRdpConnection::new(ConnectionParams::default(), behavior);

        // Act / Assert
        assert_eq!(
            conn.connect(),
            Err(BridgeError::CollaboratorFailure("logon denied".to_string()))
        );
    }

    #[test]
    fn test_factory_retains_created_connections() {
        // Arrange
        let factory = MockRdpFactory::new();
        let params = ConnectionParams {
            server: "10.0.0.5".to_string(),
            ..Default::default()
        };

        // Act
        let _ = factory.create(&params).unwrap();

        // Assert
        assert_eq!(factory.created_count(), 1);
        let last = factory.last_connection().expect("connection retained");
        assert_eq!(last.params().server, "10.0.0.5");
    }

    #[test]
    fn test_factory_behavior_applies_to_new_connections() {
        // Arrange
        let factory = MockRdpFactory::new();
        factory.fail_connect("unreachable");

        // Act
        let _ = factory.create(&ConnectionParams::default()).unwrap();
        let conn = factory.last_connection().unwrap();

        // Assert
        assert!(conn.connect().is_err());
    }
}

//! End-to-end console scenarios driven through the command dispatcher, with
//! the recording bridge standing in for the RDP collaborator.

use std::sync::Arc;
use std::time::Duration;

use rdp_console::application::dispatch_commands::{CommandDispatcher, LoopControl};
use rdp_console::application::inject_input::{InjectorTiming, InputInjector};
use rdp_console::application::manage_sessions::SessionRegistry;
use rdp_console::infrastructure::lifecycle::LifecycleConfig;
use rdp_console::infrastructure::rdp_bridge::mock::{MockRdpFactory, RecordedEvent};
use rdp_console::infrastructure::rdp_bridge::RdpConnectionFactory;
use rdp_console::infrastructure::storage::config::SessionDefaults;

fn make_dispatcher() -> (CommandDispatcher, Arc<MockRdpFactory>) {
    let factory = Arc::new(MockRdpFactory::new());
    let registry = SessionRegistry::new(
        Arc::clone(&factory) as Arc<dyn RdpConnectionFactory>,
        LifecycleConfig {
            connect_timeout: Duration::from_millis(500),
            hide_settle: Duration::ZERO,
        },
    );
    let dispatcher = CommandDispatcher::new(
        registry,
        InputInjector::new(InjectorTiming::immediate()),
        SessionDefaults::default(),
    );
    (dispatcher, factory)
}

#[tokio::test]
async fn test_full_operator_scenario_two_sessions() {
    // Arrange
    let (mut dispatcher, factory) = make_dispatcher();

    // Act – the canonical two-session workflow.
    dispatcher.handle_line("new a").await;
    dispatcher.handle_line("new b 10.0.0.2 admin secret").await;
    assert_eq!(dispatcher.prompt(), "[a]> "); // first session stays current
    dispatcher.handle_line("use b").await;
    assert_eq!(dispatcher.prompt(), "[b]> ");

    let listing = dispatcher.registry().list_sessions();
    assert_eq!(listing.len(), 2);
    assert_eq!((listing[0].id.as_str(), listing[0].is_current), ("a", false));
    assert_eq!((listing[1].id.as_str(), listing[1].is_current), ("b", true));

    dispatcher.handle_line("click 100 200").await;
    dispatcher.handle_line("type hi").await;
    dispatcher.handle_line("key ENTER").await;
    dispatcher.handle_line("hide").await;
    dispatcher.handle_line("show").await;

    // Assert – everything landed on "b", nothing on "a".
    let connections = factory.created();
    assert_eq!(connections.len(), 2);
    assert!(connections[0].events().is_empty());
    assert_eq!(connections[1].params().server, "10.0.0.2");
    assert_eq!(connections[1].params().username, "admin");
    assert_eq!(
        connections[1].events(),
        vec![
            RecordedEvent::Click { x: 100, y: 200 },
            RecordedEvent::Key(0x48), // 'h'
            RecordedEvent::Key(0x49), // 'i'
            RecordedEvent::Key(0x0D), // ENTER
            RecordedEvent::Hide,
            RecordedEvent::Show,
        ]
    );

    // Act – exit tears everything down and stops the loop.
    let control = dispatcher.handle_line("exit").await;

    // Assert
    assert_eq!(control, LoopControl::Exit);
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn test_drag_scenario_delivers_full_gesture_to_current_session() {
    // Arrange
    let (mut dispatcher, factory) = make_dispatcher();
    dispatcher.handle_line("new a").await;

    // Act
    dispatcher.handle_line("drag 0 0 100 50").await;

    // Assert – press at the start, release at the end, 22 moves between.
    let events = factory.last_connection().unwrap().events();
    assert_eq!(events.first(), Some(&RecordedEvent::MouseMove { x: 0, y: 0, is_drag: false }));
    assert_eq!(events.get(1), Some(&RecordedEvent::MouseDown { x: 0, y: 0 }));
    assert_eq!(events.last(), Some(&RecordedEvent::MouseUp { x: 100, y: 50 }));
    let moves = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::MouseMove { .. }))
        .count();
    assert_eq!(moves, 22);

    dispatcher.handle_line("exit").await;
}

#[tokio::test]
async fn test_console_survives_remote_close_of_current_session() {
    // Arrange
    let (mut dispatcher, factory) = make_dispatcher();
    dispatcher.handle_line("new a").await;

    // Act – the remote side closes the session out from under the console.
    let conn = factory.last_connection().unwrap();
    conn.close_from_remote();
    dispatcher
        .registry()
        .get_current()
        .expect("session a is current")
        .lifecycle()
        .join();

    // Input to the dead session is reported, not fatal.
    let control = dispatcher.handle_line("click 10 10").await;
    assert_eq!(control, LoopControl::Continue);
    assert!(conn.events().is_empty());

    // The dead entry stays listed, and new sessions still work.
    dispatcher.handle_line("new b").await;
    let listing = dispatcher.registry().list_sessions();
    assert_eq!(listing.len(), 2);
    assert!(!listing[0].live);
    assert!(listing[1].live);
    assert!(listing[0].is_current); // death does not move the current pointer

    dispatcher.handle_line("exit").await;
}

#[tokio::test]
async fn test_console_survives_connect_failure_and_retries() {
    // Arrange
    let (mut dispatcher, factory) = make_dispatcher();
    factory.fail_connect("unreachable");

    // Act – the failed create leaves no trace.
    let control = dispatcher.handle_line("new a").await;
    assert_eq!(control, LoopControl::Continue);
    assert!(dispatcher.registry().is_empty());
    assert_eq!(dispatcher.prompt(), "[NoSession]> ");

    // The same id can be retried once the host is reachable.
    factory.reset_behavior();
    dispatcher.handle_line("new a").await;

    // Assert
    assert_eq!(dispatcher.registry().len(), 1);
    assert_eq!(dispatcher.prompt(), "[a]> ");

    dispatcher.handle_line("exit").await;
}

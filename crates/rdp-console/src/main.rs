//! rdp-console binary: interactive multi-session RDP controller.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rdp_console::application::dispatch_commands::{CommandDispatcher, LoopControl};
use rdp_console::application::inject_input::{InjectorTiming, InputInjector};
use rdp_console::application::manage_sessions::SessionRegistry;
use rdp_console::infrastructure::rdp_bridge::mock::MockRdpFactory;
use rdp_console::infrastructure::rdp_bridge::RdpConnectionFactory;
use rdp_console::infrastructure::storage::config::{load_config, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("failed to load config, using defaults: {e}");
            AppConfig::default()
        }
    };

    let timing = InjectorTiming {
        type_interval: Duration::from_millis(cfg.timing.type_interval_ms),
        drag_steps: cfg.timing.drag_steps,
        drag_step_delay: Duration::from_millis(cfg.timing.drag_step_delay_ms),
        drag_settle: Duration::from_millis(cfg.timing.drag_settle_ms),
    };

    // The ActiveX-backed bridge only exists on Windows hosts with the MSTSC
    // control registered; the recording bridge stands in everywhere else so
    // the console loop stays usable end to end.
    let factory: Arc<dyn RdpConnectionFactory> = Arc::new(MockRdpFactory::new());
    let registry = SessionRegistry::new(factory, cfg.timing.lifecycle_config());
    let mut dispatcher =
        CommandDispatcher::new(registry, InputInjector::new(timing), cfg.defaults.clone());

    println!("Multi-session RDP console");
    println!("commands: new, use, list, hide, show, click, rclick, type, key, drag, wait, exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", dispatcher.prompt());
        std::io::stdout().flush()?;

        match lines.next_line().await? {
            Some(line) => {
                if dispatcher.handle_line(&line).await == LoopControl::Exit {
                    break;
                }
            }
            None => {
                // Input stream closed without `exit`; tear down all sessions.
                dispatcher.shutdown();
                break;
            }
        }
    }

    Ok(())
}

//! DispatchCommandsUseCase: the operator console grammar and command loop.
//!
//! One command per line, whitespace-separated tokens, case-sensitive command
//! words. Global commands (`new`, `use`, `list`, `wait`, `exit`/`q`) go to
//! the session registry; everything else targets the current session and is
//! rejected with a message when no session is current.
//!
//! The loop never dies on operator error: malformed input, unknown commands,
//! and failed operations are printed and the loop continues. Only `exit`
//! (or the input stream closing) ends it.

use std::time::Duration;

use rdp_core::KeySpec;
use thiserror::Error;
use tracing::debug;

use crate::application::inject_input::{InjectError, InputInjector};
use crate::application::manage_sessions::SessionRegistry;
use crate::infrastructure::rdp_bridge::ConnectionParams;
use crate::infrastructure::storage::config::SessionDefaults;

// ── Grammar ───────────────────────────────────────────────────────────────────

const USAGE_NEW: &str = "usage: new <id> [host] [username] [password]";
const USAGE_USE: &str = "usage: use <id>";
const USAGE_CLICK: &str = "usage: click <x> <y>";
const USAGE_RCLICK: &str = "usage: rclick <x> <y>";
const USAGE_TYPE: &str = "usage: type <text>";
const USAGE_KEY: &str = "usage: key <name|code>";
const USAGE_DRAG: &str = "usage: drag <x1> <y1> <x2> <y2>";
const USAGE_WAIT: &str = "usage: wait <seconds>";

/// One parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New {
        id: String,
        host: Option<String>,
        username: Option<String>,
        password: Option<String>,
    },
    Use(String),
    List,
    Hide,
    Show,
    Click { x: i32, y: i32 },
    RightClick { x: i32, y: i32 },
    Type(String),
    Key(String),
    Drag { x1: i32, y1: i32, x2: i32, y2: i32 },
    Wait(Duration),
    Exit,
}

/// Error type for command parsing and routing.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("{0}")]
    Malformed(&'static str),
    #[error("unknown command {0:?} (try: new, use, list, hide, show, click, rclick, type, key, drag, wait, exit)")]
    Unknown(String),
    #[error("no active session (create one with `new <id>`)")]
    NoActiveSession,
}

/// Parses one console line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut tokens = trimmed.split_whitespace();
    let word = tokens.next().expect("non-empty line has a first token");
    let rest: Vec<&str> = tokens.collect();

    let command = match word {
        "new" => {
            if rest.is_empty() || rest.len() > 4 {
                return Err(CommandError::Malformed(USAGE_NEW));
            }
            Command::New {
                id: rest[0].to_string(),
                host: rest.get(1).map(|s| s.to_string()),
                username: rest.get(2).map(|s| s.to_string()),
                password: rest.get(3).map(|s| s.to_string()),
            }
        }
        "use" => match rest.as_slice() {
            [id] => Command::Use((*id).to_string()),
            _ => return Err(CommandError::Malformed(USAGE_USE)),
        },
        "list" => Command::List,
        "hide" => Command::Hide,
        "show" => Command::Show,
        "click" => {
            let (x, y) = parse_point(&rest, USAGE_CLICK)?;
            Command::Click { x, y }
        }
        "rclick" => {
            let (x, y) = parse_point(&rest, USAGE_RCLICK)?;
            Command::RightClick { x, y }
        }
        "type" => {
            // Everything after the command word, spaces preserved.
            let text = trimmed
                .strip_prefix("type")
                .expect("first token is `type`")
                .trim_start();
            if text.is_empty() {
                return Err(CommandError::Malformed(USAGE_TYPE));
            }
            Command::Type(text.to_string())
        }
        "key" => match rest.as_slice() {
            [name] => Command::Key((*name).to_string()),
            _ => return Err(CommandError::Malformed(USAGE_KEY)),
        },
        "drag" => match rest.as_slice() {
            [x1, y1, x2, y2] => Command::Drag {
                x1: parse_int(x1, USAGE_DRAG)?,
                y1: parse_int(y1, USAGE_DRAG)?,
                x2: parse_int(x2, USAGE_DRAG)?,
                y2: parse_int(y2, USAGE_DRAG)?,
            },
            _ => return Err(CommandError::Malformed(USAGE_DRAG)),
        },
        "wait" => match rest.as_slice() {
            [secs] => {
                let secs: f64 = secs
                    .parse()
                    .map_err(|_| CommandError::Malformed(USAGE_WAIT))?;
                // Rejects NaN, infinities, negatives, and values too large
                // for a Duration; an absurd delay must not kill the loop.
                let delay = Duration::try_from_secs_f64(secs)
                    .map_err(|_| CommandError::Malformed(USAGE_WAIT))?;
                Command::Wait(delay)
            }
            _ => return Err(CommandError::Malformed(USAGE_WAIT)),
        },
        // `q` is the historical short form of `exit`.
        "exit" | "q" => Command::Exit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_point(rest: &[&str], usage: &'static str) -> Result<(i32, i32), CommandError> {
    match rest {
        [x, y] => Ok((parse_int(x, usage)?, parse_int(y, usage)?)),
        _ => Err(CommandError::Malformed(usage)),
    }
}

fn parse_int(token: &str, usage: &'static str) -> Result<i32, CommandError> {
    token.parse().map_err(|_| CommandError::Malformed(usage))
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Whether the console loop should keep reading lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Routes parsed commands to the registry and the input injector.
///
/// Owns the registry: the dispatcher is the single control context, so all
/// registry mutation funnels through `handle_line`.
pub struct CommandDispatcher {
    registry: SessionRegistry,
    injector: InputInjector,
    defaults: SessionDefaults,
}

impl CommandDispatcher {
    pub fn new(
        registry: SessionRegistry,
        injector: InputInjector,
        defaults: SessionDefaults,
    ) -> Self {
        Self {
            registry,
            injector,
            defaults,
        }
    }

    /// The console prompt, naming the current session.
    pub fn prompt(&self) -> String {
        match self.registry.current_id() {
            Some(id) => format!("[{id}]> "),
            None => "[NoSession]> ".to_string(),
        }
    }

    /// Read-only view of the registry, for inspection.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Parses and executes one line. Errors are printed, never propagated:
    /// the loop only stops on `exit` or end of input.
    pub async fn handle_line(&mut self, line: &str) -> LoopControl {
        match parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => LoopControl::Continue,
            Err(e) => {
                println!("{e}");
                LoopControl::Continue
            }
        }
    }

    /// Closes every session; used when the input stream ends without `exit`.
    pub fn shutdown(&mut self) {
        self.registry.close_all();
    }

    async fn execute(&mut self, command: Command) -> LoopControl {
        debug!(?command, "executing");
        match command {
            Command::New {
                id,
                host,
                username,
                password,
            } => {
                let params = ConnectionParams {
                    server: host.unwrap_or_else(|| self.defaults.host.clone()),
                    username: username.unwrap_or_else(|| self.defaults.username.clone()),
                    password: password.unwrap_or_else(|| self.defaults.password.clone()),
                    port: self.defaults.port,
                    width: self.defaults.width,
                    height: self.defaults.height,
                };
                let server = params.server.clone();
                println!("[{id}] connecting to {server}...");
                match self
                    .registry
                    .add_session(&id, params, self.defaults.start_hidden)
                    .await
                {
                    Ok(()) => println!("session {id:?} connected to {server}"),
                    Err(e) => println!("failed to create session {id:?}: {e}"),
                }
            }
            Command::Use(id) => match self.registry.switch_current(&id) {
                Ok(()) => println!("current session: {id}"),
                Err(e) => println!("{e}"),
            },
            Command::List => {
                let listing = self.registry.list_sessions();
                if listing.is_empty() {
                    println!("no sessions");
                }
                for snapshot in listing {
                    let liveness = if snapshot.live { "live" } else { "closed" };
                    let marker = if snapshot.is_current { " *" } else { "" };
                    println!("  {} ({liveness}){marker}", snapshot.id);
                }
            }
            Command::Wait(delay) => {
                tokio::time::sleep(delay).await;
            }
            Command::Exit => {
                self.registry.close_all();
                return LoopControl::Exit;
            }
            // Session-scoped commands.
            session_command => {
                let Some(session) = self.registry.get_current() else {
                    println!("{}", CommandError::NoActiveSession);
                    return LoopControl::Continue;
                };
                let lifecycle = session.lifecycle();
                let result = match session_command {
                    Command::Hide => self.injector.hide(lifecycle),
                    Command::Show => self.injector.show(lifecycle),
                    Command::Click { x, y } => self.injector.click(lifecycle, x, y),
                    Command::RightClick { x, y } => self.injector.right_click(lifecycle, x, y),
                    Command::Type(text) => self.injector.type_text(lifecycle, &text).await,
                    Command::Key(name) => self.injector.press_key(lifecycle, KeySpec::Name(&name)),
                    Command::Drag { x1, y1, x2, y2 } => {
                        self.injector.drag_drop(lifecycle, x1, y1, x2, y2).await
                    }
                    _ => unreachable!("global commands handled above"),
                };
                if let Err(e) = result {
                    match e {
                        InjectError::SessionNotActive => {
                            println!("session is no longer active")
                        }
                        other => println!("input failed: {other}"),
                    }
                }
            }
        }
        LoopControl::Continue
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

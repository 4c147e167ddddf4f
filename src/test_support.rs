//! Test doubles for the session bus and KWin
//!
//! `MockEngine` behaves like KWin for the purposes of the activation flow: it
//! reads the script it was asked to load, recovers the criteria from the
//! JavaScript literals, applies the match rule to its window list, and calls
//! the published receiver back.
//!
//! `FakeKWin` does the same over a real zbus peer-to-peer connection, for
//! exercising `ZbusSignalBus` and `KWinScripting` without a session bus.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regex::RegexBuilder;
use zbus::Connection;

use crate::error::ActivationError;
use crate::kwin::{ScriptHandle, ScriptingEngine, SCRIPTING_PATH};
use crate::receiver::{ActivationReceiver, SignalBus, SignalState};
use crate::script::{KwinApi, MatchCriteria, WindowInfo, CALLBACK_ADDRESS};

#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub fail_publish: bool,
    pub load_id: i32,
    pub fail_run: bool,
    pub panic_on_run: bool,
    /// Deliver the callback from a spawned task after this long
    pub signal_delay: Option<Duration>,
    /// Never call back
    pub silent: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            fail_publish: false,
            load_id: 1,
            fail_run: false,
            panic_on_run: false,
            signal_delay: None,
            silent: false,
        }
    }
}

#[derive(Debug, Default)]
struct DesktopState {
    receiver: Option<Arc<SignalState>>,
    publish_calls: usize,
    unpublish_calls: usize,
    loaded: Vec<PathBuf>,
    unloaded: Vec<PathBuf>,
    last_script: Option<String>,
    last_match: Option<usize>,
}

#[derive(Debug)]
pub struct MockDesktop {
    windows: Vec<WindowInfo>,
    behavior: MockBehavior,
    state: Mutex<DesktopState>,
}

impl MockDesktop {
    pub fn with_behavior(windows: Vec<WindowInfo>, behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            windows,
            behavior,
            state: Mutex::new(DesktopState::default()),
        })
    }

    pub fn bus(self: &Arc<Self>) -> MockBus {
        MockBus(Arc::clone(self))
    }

    pub fn engine(self: &Arc<Self>) -> MockEngine {
        MockEngine(Arc::clone(self))
    }

    pub fn publish_calls(&self) -> usize {
        self.state.lock().unwrap().publish_calls
    }

    pub fn unpublish_calls(&self) -> usize {
        self.state.lock().unwrap().unpublish_calls
    }

    pub fn is_published(&self) -> bool {
        self.state.lock().unwrap().receiver.is_some()
    }

    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().loaded.clone()
    }

    pub fn unloaded_paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().unloaded.clone()
    }

    pub fn last_script(&self) -> Option<String> {
        self.state.lock().unwrap().last_script.clone()
    }

    /// Window index the last run matched, if any
    pub fn last_match(&self) -> Option<usize> {
        self.state.lock().unwrap().last_match
    }
}

pub struct MockBus(Arc<MockDesktop>);

impl SignalBus for MockBus {
    async fn publish(&self, receiver: ActivationReceiver) -> Result<(), ActivationError> {
        if self.0.behavior.fail_publish {
            return Err(ActivationError::PublishFailed(
                "name already owned by another connection".to_string(),
            ));
        }
        let mut state = self.0.state.lock().unwrap();
        if state.receiver.is_some() {
            return Err(ActivationError::PublishFailed(
                "receiver already published".to_string(),
            ));
        }
        state.publish_calls += 1;
        state.receiver = Some(receiver.state());
        Ok(())
    }

    async fn unpublish(&self) -> Result<(), ActivationError> {
        self.unpublish_detached();
        Ok(())
    }

    fn unpublish_detached(&self) {
        let mut state = self.0.state.lock().unwrap();
        state.unpublish_calls += 1;
        state.receiver = None;
    }
}

pub struct MockEngine(Arc<MockDesktop>);

impl ScriptingEngine for MockEngine {
    async fn load_script(&self, path: &Path) -> Result<ScriptHandle, ActivationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ActivationError::LoadFailed(e.to_string()))?;
        let mut state = self.0.state.lock().unwrap();
        state.loaded.push(path.to_path_buf());
        state.last_script = Some(text);
        ScriptHandle::from_id(self.0.behavior.load_id, KwinApi::Plasma5)
    }

    async fn run_script(&self, _handle: &ScriptHandle) -> Result<(), ActivationError> {
        let behavior = &self.0.behavior;
        if behavior.panic_on_run {
            panic!("engine exploded");
        }
        if behavior.fail_run {
            return Err(ActivationError::Bus(zbus::Error::Failure(
                "KWin not reachable".to_string(),
            )));
        }

        let (script, receiver) = {
            let state = self.0.state.lock().unwrap();
            (state.last_script.clone().unwrap_or_default(), state.receiver.clone())
        };
        let criteria = criteria_from_script(&script).ok();
        let matched = criteria
            .as_ref()
            .and_then(|criteria| criteria.select(&self.0.windows));
        self.0.state.lock().unwrap().last_match = matched;

        let Some(receiver) = receiver else {
            return Ok(());
        };
        // The script builds its RegExp before any callDBus, so a bad
        // pattern throws and nothing calls back.
        let throws = criteria
            .as_ref()
            .is_some_and(|criteria| !title_pattern_compiles(criteria));
        if behavior.silent || throws {
            return Ok(());
        }

        let deliver = move || {
            if matched.is_some() {
                receiver.window_found();
            } else {
                receiver.window_not_found();
            }
        };
        match behavior.signal_delay {
            Some(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    deliver();
                });
            }
            None => deliver(),
        }
        Ok(())
    }

    async fn unload_script(&self, path: &Path) -> Result<bool, ActivationError> {
        self.0.state.lock().unwrap().unloaded.push(path.to_path_buf());
        Ok(true)
    }
}

// ============================================================================
// Peer-to-peer fakes
// ============================================================================

/// Two ends of an in-process D-Bus connection: (ours, KWin's)
pub async fn peer_connections() -> (Connection, Connection) {
    let guid = zbus::Guid::generate();
    let (ours, theirs) = tokio::net::UnixStream::pair().unwrap();
    let server = zbus::connection::Builder::unix_stream(ours)
        .server(guid)
        .unwrap()
        .p2p()
        .build();
    let client = zbus::connection::Builder::unix_stream(theirs).p2p().build();
    let (ours, kwin) = futures::try_join!(server, client).unwrap();
    wait_for_object_server(&ours, &kwin).await;
    wait_for_object_server(&kwin, &ours).await;
    (ours, kwin)
}

/// Start `to`'s object server and wait until it dispatches.
///
/// `ObjectServer::at` on a built connection does not wait for the dispatch
/// task to subscribe, so method calls sent right after it can be dropped.
async fn wait_for_object_server(from: &Connection, to: &Connection) {
    to.object_server();
    loop {
        let ping = from.call_method(
            None::<&str>,
            "/",
            Some("org.freedesktop.DBus.Peer"),
            "Ping",
            &(),
        );
        if let Ok(Ok(_)) = tokio::time::timeout(Duration::from_millis(100), ping).await {
            return;
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeKWinState {
    pub loaded: Vec<String>,
    pub unloaded: Vec<String>,
    pub runs: usize,
}

/// KWin's scripting objects, served on `connection` for the Plasma 6 layout
pub struct FakeKWin;

impl FakeKWin {
    pub async fn serve(
        connection: &Connection,
        windows: Vec<WindowInfo>,
        load_id: i32,
    ) -> Arc<Mutex<FakeKWinState>> {
        let state = Arc::new(Mutex::new(FakeKWinState::default()));
        let server = connection.object_server();
        server
            .at(
                SCRIPTING_PATH,
                FakeScripting {
                    state: Arc::clone(&state),
                    load_id,
                },
            )
            .await
            .unwrap();
        if let Ok(handle) = ScriptHandle::from_id(load_id, KwinApi::Plasma6) {
            server
                .at(
                    handle.object_path.as_str(),
                    FakeScript {
                        state: Arc::clone(&state),
                        windows,
                        connection: connection.clone(),
                    },
                )
                .await
                .unwrap();
        }
        state
    }
}

struct FakeScripting {
    state: Arc<Mutex<FakeKWinState>>,
    load_id: i32,
}

#[zbus::interface(name = "org.kde.kwin.Scripting")]
impl FakeScripting {
    #[zbus(name = "loadScript")]
    async fn load_script(&self, path: String) -> i32 {
        self.state.lock().unwrap().loaded.push(path);
        self.load_id
    }

    #[zbus(name = "unloadScript")]
    async fn unload_script(&self, name: String) -> bool {
        let mut state = self.state.lock().unwrap();
        let known = state.loaded.contains(&name);
        state.unloaded.push(name);
        known
    }
}

struct FakeScript {
    state: Arc<Mutex<FakeKWinState>>,
    windows: Vec<WindowInfo>,
    connection: Connection,
}

#[zbus::interface(name = "org.kde.kwin.Script")]
impl FakeScript {
    /// Returns at once; the callback follows from another task, as in KWin.
    #[zbus(name = "run")]
    async fn run(&self) {
        let path = {
            let mut state = self.state.lock().unwrap();
            state.runs += 1;
            state.loaded.last().cloned().unwrap_or_default()
        };
        let script = std::fs::read_to_string(path).unwrap_or_default();
        let found = criteria_from_script(&script)
            .ok()
            .and_then(|criteria| criteria.select(&self.windows))
            .is_some();

        let addr = CALLBACK_ADDRESS;
        let method = if found {
            addr.found_method
        } else {
            addr.not_found_method
        };
        let connection = self.connection.clone();
        tokio::spawn(async move {
            let _ = connection
                .call_method(
                    Some(addr.bus_name),
                    addr.object_path,
                    Some(addr.interface),
                    method,
                    &(),
                )
                .await;
        });
    }
}

/// Recover the criteria from a generated script's string literals
pub fn criteria_from_script(script: &str) -> Result<MatchCriteria, ActivationError> {
    let title = read_js_literal(script, "new RegExp('");
    let class = read_js_literal(script, "var wantedClass = '");
    MatchCriteria::new(title.as_deref(), class.as_deref())
}

fn title_pattern_compiles(criteria: &MatchCriteria) -> bool {
    criteria.title().map_or(true, |title| {
        RegexBuilder::new(title).case_insensitive(true).build().is_ok()
    })
}

fn read_js_literal(text: &str, marker: &str) -> Option<String> {
    let start = text.find(marker)? + marker.len();
    let mut out = String::new();
    let mut chars = text[start..].chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                'u' => {
                    let hex: String = chars.by_ref().take(4).collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                }
                other => out.push(other),
            },
            '\'' => return Some(out),
            _ => out.push(ch),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::generate_activation_script;

    #[test]
    fn test_criteria_recovered_from_script() {
        let script = generate_activation_script(Some("it's a \\d+ \"test\""), None, KwinApi::Plasma5);
        let criteria = criteria_from_script(&script).unwrap();
        assert_eq!(criteria.title(), Some("it's a \\d+ \"test\""));
        assert_eq!(criteria.class(), None);
    }

    #[test]
    fn test_class_with_terminator_recovered() {
        let script = generate_activation_script(None, Some("a';b"), KwinApi::Plasma6);
        let criteria = criteria_from_script(&script).unwrap();
        assert_eq!(criteria.class(), Some("a';b"));
    }

    #[test]
    fn test_unicode_escape_recovered() {
        let script = generate_activation_script(Some("a\u{2029}b"), None, KwinApi::Plasma5);
        let criteria = criteria_from_script(&script).unwrap();
        assert_eq!(criteria.title(), Some("a\u{2029}b"));
    }

    #[test]
    fn test_invalid_title_pattern_does_not_compile() {
        assert!(!title_pattern_compiles(&MatchCriteria::by_title("(unclosed").unwrap()));
        assert!(title_pattern_compiles(&MatchCriteria::by_class("emacs").unwrap()));
    }
}

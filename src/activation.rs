//! Activation orchestrator
//!
//! Wires one attempt together: publish the callback receiver, write and load
//! the script, run it, wait a bounded time for the callback, then tear
//! everything down. Teardown runs on every path past a successful publish,
//! including a panic inside the flow, and never changes the outcome. If the
//! attempt future is dropped instead, the publication and the script file
//! clean themselves up on drop.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Mutex;
use zbus::Connection;

use crate::activation_state::{ActivationState, StateTrail};
use crate::config::Config;
use crate::debug_log::debug_log;
use crate::error::ActivationError;
use crate::events::ActivationReport;
use crate::kwin::{KWinScripting, ScriptingEngine};
use crate::receiver::{ActivationReceiver, Publication, SignalBus, SignalWatch, ZbusSignalBus};
use crate::script::{KwinApi, MatchCriteria};
use crate::script_file::{default_script_dir, ScriptFile};
use crate::timeouts::signal_timeout;

#[derive(Debug, Clone)]
pub struct ActivationOptions {
    /// How long to wait for WindowFound/WindowNotFound after `run`
    pub signal_timeout: Duration,
    pub script_dir: PathBuf,
    pub api: KwinApi,
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self {
            signal_timeout: signal_timeout(),
            script_dir: default_script_dir(),
            api: KwinApi::default(),
        }
    }
}

impl ActivationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            signal_timeout: config.signal_timeout(),
            script_dir: config.script_dir(),
            api: config.kwin_api(),
        }
    }
}

/// What the flow learned before teardown
#[derive(Debug, Clone, Copy)]
struct Resolution {
    found: bool,
    signal_arrived: bool,
}

pub struct Activator<B, E> {
    bus: B,
    engine: E,
    options: ActivationOptions,
    /// The callback bus name is process-wide; attempts take turns.
    in_flight: Mutex<()>,
}

impl<B: SignalBus, E: ScriptingEngine> Activator<B, E> {
    pub fn new(bus: B, engine: E, options: ActivationOptions) -> Self {
        Self {
            bus,
            engine,
            options,
            in_flight: Mutex::new(()),
        }
    }

    /// Activate the first matching window. Every failure becomes `false`.
    pub async fn activate(&self, criteria: &MatchCriteria) -> bool {
        match self.try_activate(criteria).await {
            Ok(report) => report.found,
            Err(e) => {
                debug_log(
                    "ACTIVATE",
                    &format!("Activation for {} failed: {}", criteria, e),
                );
                false
            }
        }
    }

    /// Like [`activate`](Self::activate) but keeps the error. Teardown has
    /// already run by the time this returns, whatever the result.
    pub async fn try_activate(
        &self,
        criteria: &MatchCriteria,
    ) -> Result<ActivationReport, ActivationError> {
        let _turn = self.in_flight.lock().await;
        let started = Instant::now();
        let mut trail = StateTrail::new();

        let (receiver, mut watch) = ActivationReceiver::new();
        let publication = match Publication::publish(&self.bus, receiver).await {
            Ok(publication) => publication,
            Err(e) => {
                debug_log("RECEIVER", &format!("Failed to publish D-Bus service: {}", e));
                return Err(e);
            }
        };
        trail.advance(ActivationState::ServicePublished);

        let mut script_file = ScriptFile::reserve(&self.options.script_dir);
        let mut loaded = false;

        let flow = AssertUnwindSafe(self.drive(
            criteria,
            &mut script_file,
            &mut loaded,
            &mut watch,
            &mut trail,
        ))
        .catch_unwind()
        .await;

        self.teardown(publication, script_file, loaded, &mut trail).await;

        let resolution = match flow {
            Ok(result) => result?,
            Err(panic) => return Err(ActivationError::Panicked(panic_message(&*panic))),
        };

        Ok(ActivationReport {
            criteria: criteria.to_string(),
            found: resolution.found,
            signal_arrived: resolution.signal_arrived,
            states: trail.visited().to_vec(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            error: None,
        })
    }

    async fn drive(
        &self,
        criteria: &MatchCriteria,
        script_file: &mut ScriptFile,
        loaded: &mut bool,
        watch: &mut SignalWatch,
        trail: &mut StateTrail,
    ) -> Result<Resolution, ActivationError> {
        debug_log("ACTIVATE", &format!("Activating window by {}", criteria));

        let script = criteria.script(self.options.api);
        let path = script_file
            .write(&script)
            .map_err(|e| {
                debug_log("SCRIPT", &format!("Failed to write script file: {}", e));
                ActivationError::ScriptWrite(e)
            })?
            .to_path_buf();
        trail.advance(ActivationState::ScriptWritten);

        let handle = self.engine.load_script(&path).await?;
        *loaded = true;
        trail.advance(ActivationState::ScriptLoaded);

        self.engine.run_script(&handle).await?;
        trail.advance(ActivationState::ScriptRunning);

        trail.advance(ActivationState::AwaitingSignal);
        let signal_arrived = watch.wait(self.options.signal_timeout).await;
        if !signal_arrived {
            debug_log(
                "ACTIVATE",
                &format!(
                    "No callback within {:?}; keeping receiver state",
                    self.options.signal_timeout
                ),
            );
        }

        let found = watch.found();
        trail.advance(ActivationState::Resolved);
        Ok(Resolution {
            found,
            signal_arrived,
        })
    }

    async fn teardown(
        &self,
        publication: Publication<'_, B>,
        script_file: ScriptFile,
        loaded: bool,
        trail: &mut StateTrail,
    ) {
        if let Err(e) = publication.revoke().await {
            debug_log("RECEIVER", &format!("Failed to unpublish D-Bus service: {}", e));
        }

        if loaded {
            if let Err(e) = self.engine.unload_script(script_file.path()).await {
                debug_log("KWIN", &format!("Failed to unload script: {}", e));
            }
        }

        script_file.remove();
        trail.advance(ActivationState::TornDown);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Activator talking to KWin over the session bus
pub type SessionActivator = Activator<ZbusSignalBus, KWinScripting>;

pub async fn connect_activator(options: ActivationOptions) -> Result<SessionActivator, ActivationError> {
    let connection = Connection::session().await?;
    let api = options.api;
    Ok(Activator::new(
        ZbusSignalBus::new(connection.clone()),
        KWinScripting::new(connection, api),
        options,
    ))
}

/// One-shot activation on the session bus with options from the config file
pub async fn activate_window(title: Option<&str>, class: Option<&str>) -> bool {
    let criteria = match MatchCriteria::new(title, class) {
        Ok(criteria) => criteria,
        Err(e) => {
            debug_log("ACTIVATE", &e.to_string());
            return false;
        }
    };

    let config = Config::load().unwrap_or_else(|e| {
        debug_log("CONFIG", &format!("{}; using defaults", e));
        Config::default()
    });

    match connect_activator(ActivationOptions::from_config(&config)).await {
        Ok(activator) => activator.activate(&criteria).await,
        Err(e) => {
            debug_log("ACTIVATE", &format!("Failed to connect to session bus: {}", e));
            false
        }
    }
}

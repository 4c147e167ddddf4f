//! Callback service the KWin script reports back to
//!
//! KWin's `run` returns before the script has looked at a single window, so the
//! outcome arrives separately: the script calls `WindowFound` or
//! `WindowNotFound` on this object. Each attempt gets a fresh receiver whose
//! state is shared only with that attempt's [`SignalWatch`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use zbus::Connection;

use crate::debug_log::debug_log;
use crate::error::{ActivationError, ResultExt};
use crate::script::CALLBACK_ADDRESS;

/// Outcome cell for one attempt
#[derive(Debug)]
pub struct SignalState {
    found: AtomicBool,
    notify: Mutex<Option<oneshot::Sender<()>>>,
}

impl SignalState {
    fn new(notify: oneshot::Sender<()>) -> Self {
        Self {
            found: AtomicBool::new(false),
            notify: Mutex::new(Some(notify)),
        }
    }

    pub fn window_found(&self) {
        self.record(true);
        debug_log("RECEIVER", "WindowFound signal received");
    }

    pub fn window_not_found(&self) {
        self.record(false);
        debug_log("RECEIVER", "WindowNotFound signal received");
    }

    pub fn found(&self) -> bool {
        self.found.load(Ordering::SeqCst)
    }

    // Later signals still overwrite `found`; only the first one wakes the waiter.
    fn record(&self, found: bool) {
        self.found.store(found, Ordering::SeqCst);
        let sender = self.notify.lock().ok().and_then(|mut slot| slot.take());
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }
}

/// D-Bus object published at [`CALLBACK_ADDRESS`]
#[derive(Debug, Clone)]
pub struct ActivationReceiver {
    state: Arc<SignalState>,
}

impl ActivationReceiver {
    pub fn new() -> (Self, SignalWatch) {
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(SignalState::new(tx));
        let watch = SignalWatch {
            state: Arc::clone(&state),
            notified: rx,
        };
        (Self { state }, watch)
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }
}

#[zbus::interface(name = "com.example.WindowManagement")]
impl ActivationReceiver {
    #[zbus(name = "WindowFound")]
    async fn window_found(&self) {
        self.state.window_found();
    }

    #[zbus(name = "WindowNotFound")]
    async fn window_not_found(&self) {
        self.state.window_not_found();
    }
}

/// The orchestrator's end of a receiver
#[derive(Debug)]
pub struct SignalWatch {
    state: Arc<SignalState>,
    notified: oneshot::Receiver<()>,
}

impl SignalWatch {
    /// Wait up to `deadline` for the first signal. Returns whether one arrived.
    pub async fn wait(&mut self, deadline: Duration) -> bool {
        matches!(
            tokio::time::timeout(deadline, &mut self.notified).await,
            Ok(Ok(()))
        )
    }

    pub fn found(&self) -> bool {
        self.state.found()
    }
}

/// Where receivers get published
#[allow(async_fn_in_trait)]
pub trait SignalBus {
    async fn publish(&self, receiver: ActivationReceiver) -> Result<(), ActivationError>;
    async fn unpublish(&self) -> Result<(), ActivationError>;
    /// Start an unpublish without waiting for it. Must not block.
    fn unpublish_detached(&self);
}

/// A receiver that is live on a [`SignalBus`]
///
/// [`revoke`](Self::revoke) unpublishes and waits. Dropping an unrevoked
/// publication, e.g. when the attempt future is cancelled, falls back to
/// [`SignalBus::unpublish_detached`].
pub struct Publication<'a, B: SignalBus> {
    bus: &'a B,
    live: bool,
}

impl<'a, B: SignalBus> Publication<'a, B> {
    pub async fn publish(bus: &'a B, receiver: ActivationReceiver) -> Result<Self, ActivationError> {
        bus.publish(receiver).await?;
        Ok(Self { bus, live: true })
    }

    pub async fn revoke(mut self) -> Result<(), ActivationError> {
        let result = self.bus.unpublish().await;
        self.live = false;
        result
    }
}

impl<B: SignalBus> Drop for Publication<'_, B> {
    fn drop(&mut self) {
        if self.live {
            debug_log("RECEIVER", "Attempt dropped while published; unpublishing in background");
            self.bus.unpublish_detached();
        }
    }
}

/// Publishes receivers on a session bus connection
#[derive(Debug, Clone)]
pub struct ZbusSignalBus {
    connection: Connection,
}

impl ZbusSignalBus {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl SignalBus for ZbusSignalBus {
    async fn publish(&self, receiver: ActivationReceiver) -> Result<(), ActivationError> {
        let addr = CALLBACK_ADDRESS;
        let added = self
            .connection
            .object_server()
            .at(addr.object_path, receiver)
            .await
            .map_activation_err(ActivationError::PublishFailed)?;
        if !added {
            return Err(ActivationError::PublishFailed(format!(
                "an object is already registered at {}",
                addr.object_path
            )));
        }

        // Without the name the script cannot reach us; drop the object again.
        if let Err(e) = self.connection.request_name(addr.bus_name).await {
            let _ = self
                .connection
                .object_server()
                .remove::<ActivationReceiver, _>(addr.object_path)
                .await;
            return Err(ActivationError::PublishFailed(e.to_string()));
        }

        debug_log(
            "RECEIVER",
            &format!("D-Bus service published at {}", addr.bus_name),
        );
        Ok(())
    }

    async fn unpublish(&self) -> Result<(), ActivationError> {
        revoke_on(&self.connection).await
    }

    fn unpublish_detached(&self) {
        let connection = self.connection.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = revoke_on(&connection).await {
                        debug_log("RECEIVER", &format!("Failed to unpublish D-Bus service: {}", e));
                    }
                });
            }
            Err(_) => debug_log("RECEIVER", "No runtime left to unpublish D-Bus service"),
        }
    }
}

async fn revoke_on(connection: &Connection) -> Result<(), ActivationError> {
    let addr = CALLBACK_ADDRESS;
    let released = connection.release_name(addr.bus_name).await;
    let removed = connection
        .object_server()
        .remove::<ActivationReceiver, _>(addr.object_path)
        .await;
    released?;
    removed?;
    debug_log("RECEIVER", "D-Bus service unpublished");
    Ok(())
}

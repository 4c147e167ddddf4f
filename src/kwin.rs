//! KWin scripting client
//!
//! `loadScript` hands back a numeric id; the script itself is then a separate
//! object whose `run` starts it. `run` only means KWin accepted the call. The
//! match outcome comes back through [`crate::receiver`].

use std::path::Path;

use zbus::Connection;

use crate::debug_log::debug_log;
use crate::error::ActivationError;
use crate::script::KwinApi;

pub const KWIN_BUS_NAME: &str = "org.kde.KWin";
pub const SCRIPTING_PATH: &str = "/Scripting";
pub const SCRIPTING_INTERFACE: &str = "org.kde.kwin.Scripting";
pub const SCRIPT_INTERFACE: &str = "org.kde.kwin.Script";

/// A script KWin accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHandle {
    pub id: i32,
    pub object_path: String,
}

impl ScriptHandle {
    /// Validate the id from `loadScript`. Zero and negative ids are failures.
    pub fn from_id(id: i32, api: KwinApi) -> Result<Self, ActivationError> {
        if id <= 0 {
            return Err(ActivationError::LoadFailed(format!(
                "Invalid script ID: {}",
                id
            )));
        }
        let object_path = match api {
            KwinApi::Plasma5 => format!("/{}", id),
            KwinApi::Plasma6 => format!("/Scripting/Script{}", id),
        };
        Ok(Self { id, object_path })
    }
}

#[allow(async_fn_in_trait)]
pub trait ScriptingEngine {
    async fn load_script(&self, path: &Path) -> Result<ScriptHandle, ActivationError>;
    async fn run_script(&self, handle: &ScriptHandle) -> Result<(), ActivationError>;
    async fn unload_script(&self, path: &Path) -> Result<bool, ActivationError>;
}

/// [`ScriptingEngine`] backed by KWin on the session bus
#[derive(Debug, Clone)]
pub struct KWinScripting {
    connection: Connection,
    api: KwinApi,
}

impl KWinScripting {
    pub fn new(connection: Connection, api: KwinApi) -> Self {
        Self { connection, api }
    }
}

impl ScriptingEngine for KWinScripting {
    async fn load_script(&self, path: &Path) -> Result<ScriptHandle, ActivationError> {
        let path = path.to_string_lossy().to_string();
        let reply = self
            .connection
            .call_method(
                Some(KWIN_BUS_NAME),
                SCRIPTING_PATH,
                Some(SCRIPTING_INTERFACE),
                "loadScript",
                &(path.as_str(),),
            )
            .await?;

        let id: i32 = reply.body().deserialize()?;
        debug_log("KWIN", &format!("loadScript({}) returned {}", path, id));
        ScriptHandle::from_id(id, self.api)
    }

    async fn run_script(&self, handle: &ScriptHandle) -> Result<(), ActivationError> {
        debug_log("KWIN", &format!("Running script with ID: {}", handle.id));
        self.connection
            .call_method(
                Some(KWIN_BUS_NAME),
                handle.object_path.as_str(),
                Some(SCRIPT_INTERFACE),
                "run",
                &(),
            )
            .await?;
        Ok(())
    }

    async fn unload_script(&self, path: &Path) -> Result<bool, ActivationError> {
        let path = path.to_string_lossy().to_string();
        let reply = self
            .connection
            .call_method(
                Some(KWIN_BUS_NAME),
                SCRIPTING_PATH,
                Some(SCRIPTING_INTERFACE),
                "unloadScript",
                &(path.as_str(),),
            )
            .await?;

        let unloaded: bool = reply.body().deserialize()?;
        Ok(unloaded)
    }
}

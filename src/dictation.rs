//! SpeechNote dictation service
//!
//! Single-shot `InvokeAction` calls on the session bus; nothing is kept
//! between calls.

use zbus::zvariant::Value;
use zbus::Connection;

use crate::debug_log::debug_log;
use crate::error::{ActivationError, ResultExt};

pub const SPEECH_NOTE_BUS_NAME: &str = "net.mkiol.SpeechNote";
pub const SPEECH_NOTE_PATH: &str = "/net/mkiol/SpeechNote";
pub const SPEECH_NOTE_INTERFACE: &str = "net.mkiol.SpeechNote";

#[allow(async_fn_in_trait)]
pub trait DictationService {
    async fn invoke_action(&self, action: &str, param: &str) -> Result<(), ActivationError>;
}

#[derive(Debug, Clone)]
pub struct SpeechNote {
    connection: Connection,
}

impl SpeechNote {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl DictationService for SpeechNote {
    async fn invoke_action(&self, action: &str, param: &str) -> Result<(), ActivationError> {
        self.connection
            .call_method(
                Some(SPEECH_NOTE_BUS_NAME),
                SPEECH_NOTE_PATH,
                Some(SPEECH_NOTE_INTERFACE),
                "InvokeAction",
                &(action, Value::from(param)),
            )
            .await
            .map_err(|e| {
                debug_log("DICTATION", &format!("Error invoking SpeechNote action: {}", e));
                e
            })
            .map_activation_err(ActivationError::Dictation)?;

        debug_log(
            "DICTATION",
            &format!(
                "Successfully invoked action '{}' with param '{}'",
                action, param
            ),
        );
        Ok(())
    }
}

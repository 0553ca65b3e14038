//! Web driver implementing the Driver trait.
//!
//! View events arrive as commands from the exported [`crate::MiniApp`]
//! handle; renders are forwarded to an optional JavaScript callback as plain
//! objects.

use std::{pin::pin, time::Duration};

use futures::{
    StreamExt,
    channel::mpsc,
    future::{self, Either},
};
use minichat_app::{AdapterEvent, ChatState, Driver};
use minichat_core::Environment;
use serde::Serialize;
use wasm_bindgen::JsValue;

use crate::{WebEnv, WebError, env::WebInstant, utils};

/// How long a poll waits for a command before letting the runtime tick.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Commands sent from the JS handle to the running session.
pub type Command = AdapterEvent<WebInstant>;

/// Driver running inside the web view.
pub struct WebDriver {
    env: WebEnv,
    commands: mpsc::UnboundedReceiver<Command>,
    on_render: Option<js_sys::Function>,
}

impl WebDriver {
    /// Driver reading commands from `commands` and rendering through
    /// `on_render(state)`.
    pub fn new(
        env: WebEnv,
        commands: mpsc::UnboundedReceiver<Command>,
        on_render: Option<js_sys::Function>,
    ) -> Self {
        Self { env, commands, on_render }
    }
}

/// Convert a snapshot into a plain JS object.
pub fn state_to_js(state: &ChatState) -> Result<JsValue, WebError> {
    Ok(state.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

impl Driver for WebDriver {
    type Error = WebError;
    type Instant = WebInstant;

    async fn poll_event(&mut self) -> Result<Option<Command>, WebError> {
        let timeout = pin!(utils::sleep(POLL_INTERVAL));

        match future::select(self.commands.next(), timeout).await {
            Either::Left((Some(command), _)) => Ok(Some(command)),
            // Every handle is gone; nothing can talk to this session again.
            Either::Left((None, _)) => Ok(Some(AdapterEvent::Teardown)),
            Either::Right((slept, _)) => slept.map(|()| None),
        }
    }

    fn now(&self) -> WebInstant {
        self.env.now()
    }

    fn render(&mut self, state: &ChatState) -> Result<(), WebError> {
        let Some(callback) = &self.on_render else {
            return Ok(());
        };
        callback.call1(&JsValue::NULL, &state_to_js(state)?)?;
        Ok(())
    }

    fn stop(&mut self) {
        tracing::info!("web driver stopped");
        self.on_render = None;
        self.commands.close();
    }
}

//! Exported application class.
//!
//! `MiniApp` is the composition root inside the web view. It wires the real
//! globals ([`JsHost`]), browser time ([`WebEnv`]) and the command-fed
//! [`WebDriver`] into the generic runtime, then hands the page a small handle:
//!
//! ```js
//! const app = new MiniApp({ namespace: "MyLife" }, (state) => render(state));
//! app.start();
//! app.sendMessage("Hello");
//! ```

use futures::channel::mpsc;
use minichat_app::{AdapterEvent, ChatState, Runtime};
use minichat_proto::Role;
use tokio::sync::watch;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::{
    JsHost, WebConfig, WebEnv, WebError, WebResult,
    driver::{Command, WebDriver, state_to_js},
};

type WebRuntime = Runtime<WebDriver, WebEnv, JsHost>;

/// Chat session bound to the host application's bridge.
#[wasm_bindgen]
pub struct MiniApp {
    runtime: Option<WebRuntime>,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<ChatState>,
}

#[wasm_bindgen]
impl MiniApp {
    /// Create a session.
    ///
    /// `options` is an optional configuration object; `on_render` is called
    /// with a fresh state object after every change.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, on_render: Option<js_sys::Function>) -> Result<MiniApp, JsValue> {
        let config: WebConfig = if options.is_undefined() || options.is_null() {
            WebConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(WebError::from)?
        };

        tracing::info!(namespace = %config.namespace, proxy = %config.proxy, "creating mini app");

        let host = JsHost::new(config.namespace, config.proxy);
        let (commands, receiver) = mpsc::unbounded();
        let driver = WebDriver::new(WebEnv::new(), receiver, on_render);
        let runtime =
            Runtime::new(driver, WebEnv::new(), host, config.adapter).map_err(WebError::from)?;
        let snapshots = runtime.subscribe();

        Ok(Self { runtime: Some(runtime), commands, snapshots })
    }

    /// Start detecting the host and processing events.
    ///
    /// Returns `false` if the session was already started.
    pub fn start(&mut self) -> bool {
        let Some(runtime) = self.runtime.take() else {
            return false;
        };

        spawn_local(async move {
            if let Err(e) = runtime.run().await {
                tracing::error!(error = %e, "mini app runtime failed");
            }
        });
        true
    }

    /// Send a message. `role` defaults to `"user"`.
    ///
    /// Blank text is ignored and returns `false`.
    #[wasm_bindgen(js_name = sendMessage)]
    pub fn send_message(&self, text: &str, role: Option<String>) -> Result<bool, JsValue> {
        let Some(event) = send_event(text, role.as_deref())? else {
            return Ok(false);
        };
        self.push(event)?;
        Ok(true)
    }

    /// Send the init handshake now instead of waiting for the grace delay.
    pub fn initialize(&self) -> Result<(), JsValue> {
        Ok(self.push(AdapterEvent::Initialize)?)
    }

    /// Latest state snapshot as a plain object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(state_to_js(&self.snapshots.borrow())?)
    }

    /// Stop listening to the host. Later host events are ignored.
    pub fn teardown(&self) -> Result<(), JsValue> {
        Ok(self.push(AdapterEvent::Teardown)?)
    }
}

impl MiniApp {
    fn push(&self, command: Command) -> WebResult<()> {
        self.commands.unbounded_send(command).map_err(|_| WebError::Closed)
    }
}

/// View-side send guard: trimmed-empty text sends nothing. Anything else is
/// sent exactly as typed.
fn send_event(text: &str, role: Option<&str>) -> WebResult<Option<Command>> {
    let role = role.map_or(Ok(Role::User), str::parse)?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(AdapterEvent::SendMessage { text: text.to_string(), role }))
}

//! [`Host`] over the web view's real globals.
//!
//! Every lookup goes through `js_sys::Reflect` on the global object at call
//! time, so a host that injects its objects late is found by a later probe.
//! Handlers handed to the host are owned by JS, not by the `JsHost`: the host
//! may keep calling them after the runtime is gone, and the closed
//! [`EventSink`] drops those calls. The teardown hook is a plain JS function
//! with no Rust side at all.

use js_sys::{Array, Function, Object, Reflect};
use minichat_core::{EventSink, Host, HostError, Surface};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::error::describe_js_error;

const ON_EVENT: &str = "onEvent";
const RECEIVE_EVENT: &str = "receiveEvent";

/// Host bridge reached through `window` globals.
pub struct JsHost {
    namespace: String,
    proxy: String,
}

impl JsHost {
    /// Host whose namespaced objects live under `window[namespace]` and whose
    /// proxy is `window[proxy]`.
    pub fn new(namespace: impl Into<String>, proxy: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), proxy: proxy.into() }
    }

    fn object(&self, surface: Surface) -> Option<Object> {
        let global = js_sys::global();
        let value = match surface {
            Surface::Proxy => get(&global, &self.proxy)?,
            Surface::WebApp | Surface::WebView => {
                let namespace = get(&global, &self.namespace)?;
                get(&namespace, surface.name())?
            },
        };
        value.dyn_into::<Object>().ok()
    }

    fn function(&self, surface: Surface, method: &str) -> Result<(Object, Function), HostError> {
        let object = self.object(surface).ok_or(HostError::SurfaceMissing { surface })?;
        let function = get(&object, method)
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or_else(|| HostError::MethodMissing { surface, method: method.to_string() })?;
        Ok((object, function))
    }
}

/// Wrap `sink` in a JS handler that JS owns and may call at any time.
fn sink_handler(sink: EventSink) -> JsValue {
    Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
        match serde_wasm_bindgen::from_value::<Value>(event) {
            Ok(payload) => {
                if !sink.deliver(payload) {
                    tracing::debug!("host event arrived after teardown");
                }
            },
            Err(e) => tracing::warn!(error = %e, "dropping host event that is not plain data"),
        }
    })
    .into_js_value()
}

/// Handler that ignores every event.
fn no_op() -> JsValue {
    Function::new_no_args("").into()
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn to_js(value: &Value) -> Result<JsValue, HostError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| HostError::Threw { message: e.to_string() })
}

fn threw(error: &JsValue) -> HostError {
    HostError::Threw { message: describe_js_error(error) }
}

impl Host for JsHost {
    fn has_surface(&self, surface: Surface) -> bool {
        self.object(surface).is_some()
    }

    fn has_method(&self, surface: Surface, method: &str) -> bool {
        self.function(surface, method).is_ok()
    }

    fn invoke(&self, surface: Surface, method: &str, args: &[Value]) -> Result<(), HostError> {
        let (object, function) = self.function(surface, method)?;
        let js_args = args.iter().map(to_js).collect::<Result<Array, _>>()?;
        Reflect::apply(&function, &object, &js_args).map_err(|e| threw(&e))?;
        Ok(())
    }

    fn subscribe(&self, surface: Surface, event: &str, sink: EventSink) -> Result<(), HostError> {
        let (object, on_event) = self.function(surface, ON_EVENT)?;
        let handler = sink_handler(sink);
        on_event.call2(&object, &JsValue::from_str(event), &handler).map_err(|e| threw(&e))?;
        Ok(())
    }

    fn set_receive_hook(&self, sink: Option<EventSink>) -> Result<(), HostError> {
        let web_view = self
            .object(Surface::WebView)
            .ok_or(HostError::SurfaceMissing { surface: Surface::WebView })?;
        let handler = sink.map_or_else(no_op, sink_handler);
        Reflect::set(&web_view, &JsValue::from_str(RECEIVE_EVENT), &handler)
            .map_err(|e| threw(&e))?;
        Ok(())
    }
}

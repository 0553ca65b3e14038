//! Browser tests for the JS host bridge.
//!
//! Run with `wasm-pack test --headless --firefox crates/minichat-web`. Each
//! test installs a fake host object on the global scope under a unique name.

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Object, Reflect};
use minichat_core::{EventSink, Host, HostError, Surface};
use minichat_web::{JsHost, MiniApp};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

fn set(target: &JsValue, key: &str, value: &JsValue) {
    Reflect::set(target, &JsValue::from_str(key), value).unwrap();
}

/// Let the spawned runtime loop run for `millis`.
async fn settle(millis: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        let set_timeout: Function =
            Reflect::get(&js_sys::global(), &JsValue::from_str("setTimeout")).unwrap().unchecked_into();
        set_timeout.call2(&JsValue::NULL, &resolve, &JsValue::from(millis)).unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

fn web_view(namespace: &str) -> JsValue {
    let root = Reflect::get(&js_sys::global(), &JsValue::from_str(namespace)).unwrap();
    Reflect::get(&root, &JsValue::from_str("WebView")).unwrap()
}

/// Install `window[namespace] = { WebApp: {...}, WebView: {...} }` whose
/// methods record their arguments into `window[namespace].calls`.
fn install_namespaced(namespace: &str) -> Array {
    let calls = Array::new();
    let root = Object::new();
    set(&root, "calls", &calls);

    let record = Function::new_with_args(
        "name",
        "const calls = this; return function(...args) { calls.push([name, ...args]); };",
    );
    let make = |name: &str| record.call1(&calls, &JsValue::from_str(name)).unwrap();

    let web_app = Object::new();
    set(&web_app, "MiniAppChatCompletions", &make("MiniAppChatCompletions"));
    set(&web_app, "MiniAppInit", &make("MiniAppInit"));

    let web_view = Object::new();
    let on_event = Function::new_with_args(
        "event, handler",
        "this.handlers = this.handlers || {}; this.handlers[event] = handler;",
    );
    set(&web_view, "onEvent", &on_event);

    set(&root, "WebApp", &web_app);
    set(&root, "WebView", &web_view);
    set(&js_sys::global(), namespace, &root);
    calls
}

#[wasm_bindgen_test]
fn probes_follow_the_globals() {
    install_namespaced("ProbeHost");
    let host = JsHost::new("ProbeHost", "ProbeHostProxy");

    assert!(host.has_surface(Surface::WebApp));
    assert!(host.has_method(Surface::WebApp, "MiniAppChatCompletions"));
    assert!(!host.has_method(Surface::WebApp, "chat_completions"));
    assert!(!host.has_surface(Surface::Proxy));
}

#[wasm_bindgen_test]
fn invoke_passes_plain_objects() {
    let calls = install_namespaced("InvokeHost");
    let host = JsHost::new("InvokeHost", "InvokeHostProxy");

    host.invoke(Surface::WebApp, "MiniAppInit", &[json!({"request_id": "req_1"})]).unwrap();

    let call: Array = calls.get(0).unchecked_into();
    assert_eq!(call.get(0).as_string().as_deref(), Some("MiniAppInit"));
    let payload = call.get(1);
    let id = Reflect::get(&payload, &JsValue::from_str("request_id")).unwrap();
    assert_eq!(id.as_string().as_deref(), Some("req_1"));
}

#[wasm_bindgen_test]
fn thrown_exceptions_become_host_errors() {
    install_namespaced("ThrowHost");
    let web_app = Reflect::get(
        &Reflect::get(&js_sys::global(), &JsValue::from_str("ThrowHost")).unwrap(),
        &JsValue::from_str("WebApp"),
    )
    .unwrap();
    set(&web_app, "MiniAppInit", &Function::new_no_args("throw new Error('bridge offline');"));
    let host = JsHost::new("ThrowHost", "ThrowHostProxy");

    let result = host.invoke(Surface::WebApp, "MiniAppInit", &[json!({})]);

    assert_eq!(result, Err(HostError::Threw { message: "bridge offline".into() }));
}

#[wasm_bindgen_test]
fn receive_hook_delivers_to_sink() {
    install_namespaced("HookHost");
    let host = JsHost::new("HookHost", "HookHostProxy");
    let (sink, mut rx) = EventSink::channel();

    host.set_receive_hook(Some(sink)).unwrap();

    let web_view = web_view("HookHost");
    let hook: Function = Reflect::get(&web_view, &JsValue::from_str("receiveEvent"))
        .unwrap()
        .unchecked_into();
    let event = js_sys::JSON::parse(r#"{"type":"MiniAppInitResult","data":{}}"#).unwrap();
    hook.call1(&JsValue::NULL, &event).unwrap();

    assert_eq!(rx.try_recv().unwrap(), json!({"type": "MiniAppInitResult", "data": {}}));
}

#[wasm_bindgen_test]
fn mini_app_starts_and_guards_blank_input() {
    install_namespaced("AppHost");
    let options = js_sys::JSON::parse(r#"{"namespace":"AppHost"}"#).unwrap();
    let mut app = MiniApp::new(options, None).unwrap();

    assert!(app.start());
    assert!(!app.start());
    assert!(!app.send_message("   ", None).unwrap());
    assert!(app.send_message("Hi", None).unwrap());
}

#[wasm_bindgen_test]
async fn host_callbacks_stay_callable_after_teardown() {
    install_namespaced("TeardownHost");
    let options = js_sys::JSON::parse(r#"{"namespace":"TeardownHost"}"#).unwrap();
    let mut app = MiniApp::new(options, None).unwrap();
    assert!(app.start());
    settle(150).await;

    app.teardown().unwrap();
    settle(150).await;

    let web_view = web_view("TeardownHost");
    let event = js_sys::JSON::parse(r#"{"type":"MiniAppInitResult","data":{}}"#).unwrap();

    let hook: Function = Reflect::get(&web_view, &JsValue::from_str("receiveEvent"))
        .unwrap()
        .unchecked_into();
    assert!(hook.call1(&JsValue::NULL, &event).is_ok());

    let handlers = Reflect::get(&web_view, &JsValue::from_str("handlers")).unwrap();
    let subscribed: Function = Reflect::get(&handlers, &JsValue::from_str("receiveEvent"))
        .unwrap()
        .unchecked_into();
    assert!(subscribed.call1(&JsValue::NULL, &event).is_ok());

    let state = app.state().unwrap();
    let initialized = Reflect::get(&state, &JsValue::from_str("isInitialized")).unwrap();
    assert_eq!(initialized.as_bool(), Some(false));
}

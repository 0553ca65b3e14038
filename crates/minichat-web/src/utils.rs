//! Utility functions for the WASM module

use std::time::Duration;

use wasm_bindgen_futures::JsFuture;

use crate::{WebError, WebResult};

/// Set up better panic messages in the browser console.
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Resolve after `duration` using `setTimeout`.
pub async fn sleep(duration: Duration) -> WebResult<()> {
    let window = web_sys::window().ok_or(WebError::NoWindow)?;
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);

    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
    });
    scheduled?;

    JsFuture::from(promise).await?;
    Ok(())
}

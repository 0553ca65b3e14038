//! Configuration accepted from JavaScript.

use minichat_core::AdapterConfig;
use serde::Deserialize;

/// Global holding the host's namespaced objects by default.
pub const DEFAULT_NAMESPACE: &str = "MyLife";

/// Global holding the push-style proxy by default.
pub const DEFAULT_PROXY: &str = "MyLifeWebViewProxy";

/// Options object passed to the `MiniApp` constructor.
///
/// Every field is optional. Adapter settings sit at the top level next to the
/// host globals:
///
/// ```js
/// new MiniApp({ namespace: "Telegram", systemPrompt: "Be brief.", probeIntervalMs: 250 })
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebConfig {
    /// Global whose `WebApp` and `WebView` members are the namespaced surfaces.
    pub namespace: String,
    /// Global exposing `postEvent`.
    pub proxy: String,
    /// Adapter settings.
    #[serde(flatten)]
    pub adapter: AdapterConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            proxy: DEFAULT_PROXY.to_string(),
            adapter: AdapterConfig::default(),
        }
    }
}

//! minichat terminal entry point.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a loopback host shaped like the push-style proxy
//! minichat-tui --variant proxy
//!
//! # Legacy single-turn host, slow and flaky, with debug logs
//! minichat-tui --variant single-turn --latency-ms 2000 --fail-rate 0.3 \
//!     --log-level debug --log-file minichat.log
//! ```

use std::{fs::File, path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use minichat_core::{AdapterConfig, TransportVariant};
use minichat_tui::{LoopbackConfig, LoopbackHost, Runtime, SystemEnv, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Host API shape the loopback host exposes.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    /// `WebViewProxy.postEvent`
    Proxy,
    /// `WebApp.MiniAppChatCompletions`
    Namespaced,
    /// `WebApp.chat_completions`
    SingleTurn,
}

impl From<Variant> for TransportVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Proxy => Self::ProxyPush,
            Variant::Namespaced => Self::NamespacedMethod,
            Variant::SingleTurn => Self::SingleTurn,
        }
    }
}

/// minichat terminal client
#[derive(Parser, Debug)]
#[command(name = "minichat-tui")]
#[command(about = "Terminal front end for the mini-app chat adapter")]
#[command(version)]
struct Args {
    /// Host API shape to simulate
    #[arg(long, value_enum, default_value = "proxy")]
    variant: Variant,

    /// Delay before the host answers, in milliseconds
    #[arg(long, default_value = "600")]
    latency_ms: u64,

    /// Probability (0.0 to 1.0) that a completion fails
    #[arg(long, default_value = "0.0", value_parser = parse_rate)]
    fail_rate: f64,

    /// System prompt seeding the conversation
    #[arg(long)]
    system_prompt: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not between 0.0 and 1.0"))
    }
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let file = Arc::new(File::create(path)?);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(file).with_ansi(false))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut config = AdapterConfig::default();
    if let Some(prompt) = args.system_prompt.clone() {
        config.system_prompt = prompt;
    }

    let host = LoopbackHost::new(LoopbackConfig {
        variant: args.variant.into(),
        latency: Duration::from_millis(args.latency_ms),
        fail_rate: args.fail_rate,
    });

    tracing::info!(variant = ?args.variant, latency_ms = args.latency_ms, "minichat-tui starting");

    let driver = TerminalDriver::new(host.clone())?;
    let runtime = Runtime::new(driver, SystemEnv::new(), host, config)?;

    Ok(runtime.run().await?)
}

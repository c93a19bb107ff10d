//! Component-scoped logging for scans, the registry, the library and the watcher.
//!
//! Every event is tagged with the component that produced it and logged under
//! the target `iconscope::<component>`, so levels can be tuned per component
//! without knowing which module the event came from. Output goes to stderr;
//! stdout is reserved for command results (`scan --json` and friends).
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! watcher = "debug"          # same as "iconscope::watcher"
//! registry = "trace"
//! ```
//!
//! `RUST_LOG` replaces the configured filter entirely:
//! `RUST_LOG=iconscope::scan=debug iconscope scan`.

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Target prefix shared by every component event.
pub const TARGET_PREFIX: &str = "iconscope";

/// Components that tag their events, in pipeline order.
pub const COMPONENTS: &[&str] = &[
    "scan", "ignore", "usages", "registry", "library", "variants", "watcher", "broadcast",
];

/// Wall-clock stamp, `HH:MM:SS.mmm`.
fn clock(w: &mut Writer<'_>) -> std::fmt::Result {
    write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
}

/// Expand a configured module name into a filter target.
///
/// Bare component names (`watcher`) are qualified; paths (`iconscope::indexing`,
/// `notify`) pass through.
fn qualify(module: &str) -> String {
    if module.contains("::") || !COMPONENTS.contains(&module) {
        module.to_string()
    } else {
        format!("{TARGET_PREFIX}::{module}")
    }
}

/// Filter directives from config, per-module entries sorted for a stable result.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut overrides: Vec<String> = config
        .modules
        .iter()
        .map(|(module, level)| format!("{}={level}", qualify(module)))
        .collect();
    overrides.sort();

    std::iter::once(config.default.clone())
        .chain(overrides)
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the stderr subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes
/// repeated calls (tests, nested commands) harmless.
pub fn init_with_config(config: &LoggingConfig) -> bool {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(filter_directives(config)),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(clock as fn(&mut Writer<'_>) -> std::fmt::Result)
        .with_filter(filter);

    tracing_subscriber::registry().with(layer).try_init().is_ok()
}

/// Install the subscriber with the default `warn` level.
pub fn init() -> bool {
    init_with_config(&LoggingConfig::default())
}

/// Info event from a component.
///
/// ```ignore
/// log_event!("scan", "completed", "{} icons", count);
/// log_event!("watcher", "started");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:literal, $event:expr) => {
        tracing::info!(target: concat!("iconscope::", $component), "[{}] {}", $component, $event)
    };
    ($component:literal, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: concat!("iconscope::", $component),
            "[{}] {}: {}",
            $component,
            $event,
            format!($($arg)*)
        )
    };
}

/// Debug event from a component.
///
/// ```ignore
/// debug_event!("registry", "unchanged", "{}", key);
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:literal, $event:expr) => {
        tracing::debug!(target: concat!("iconscope::", $component), "[{}] {}", $component, $event)
    };
    ($component:literal, $event:expr, $($arg:tt)*) => {
        tracing::debug!(
            target: concat!("iconscope::", $component),
            "[{}] {}: {}",
            $component,
            $event,
            format!($($arg)*)
        )
    };
}

/// Warning from a component: a file skipped, a pattern rejected, a load that failed.
///
/// ```ignore
/// warn_event!("scan", "skipping {}: {e}", path.display());
/// ```
#[macro_export]
macro_rules! warn_event {
    ($component:literal, $($arg:tt)*) => {
        tracing::warn!(
            target: concat!("iconscope::", $component),
            "[{}] {}",
            $component,
            format!($($arg)*)
        )
    };
}

//! # Structured Logging Module
//!
//! Environment-aware structured logging for following channel establishment
//! and event relay across the asynchronous poll loops.

use chrono::Utc;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` takes precedence over the environment's default level. Set
/// `PORTLET_BRIDGE_LOG_JSON` to emit JSON lines instead of human-readable output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json_output = std::env::var("PORTLET_BRIDGE_LOG_JSON").is_ok();

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let console_layer = (!json_output).then(|| {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
        });
        let json_layer = json_output.then(|| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(json_layer);

        // A host application may already own the global subscriber
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            json = json_output,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("PORTLET_BRIDGE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for channel lifecycle operations
pub fn log_channel_operation(
    operation: &str,
    instance_id: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        instance_id = %instance_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🔌 CHANNEL_OPERATION"
    );
}

/// Log structured data for listener registration operations
pub fn log_listener_operation(
    operation: &str,
    instance_id: &str,
    listener_id: &str,
    event_type: Option<&str>,
    status: &str,
) {
    tracing::debug!(
        operation = %operation,
        instance_id = %instance_id,
        listener_id = %listener_id,
        event_type = event_type,
        status = %status,
        timestamp = %Utc::now().to_rfc3339(),
        "👂 LISTENER_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

//! Tracing setup for zencode.
//!
//! [`init`] installs the global subscriber: an `EnvFilter` (overridable with
//! `RUST_LOG`) and a compact stderr formatter. With the `telemetry` feature,
//! spans are also exported over OTLP when the standard OTel environment
//! variables ask for it:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 cargo run -p zencode-cli --features telemetry
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to disable export even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

#[cfg(feature = "telemetry")]
pub use otel::{OtelGuard, otel_layer};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps exporters alive; flushes pending spans on drop.
#[derive(Default)]
#[must_use = "dropping the guard stops span export"]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    _otel: Option<OtelGuard>,
}

/// Install the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset. Must be called from
/// inside a Tokio runtime when OTLP export is enabled.
pub fn init(service_name: &str, default_filter: &str) -> TelemetryGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact());

    #[cfg(feature = "telemetry")]
    if otel_enabled() {
        match otel::otel_layer(service_name) {
            Ok((layer, guard)) => {
                registry.with(layer).init();
                return TelemetryGuard { _otel: Some(guard) };
            }
            Err(e) => eprintln!("OTel export disabled: {e}"),
        }
    }

    #[cfg(not(feature = "telemetry"))]
    let _ = service_name;

    registry.init();
    TelemetryGuard::default()
}

/// Check whether OTel export should be enabled.
///
/// True when `OTEL_SDK_DISABLED` is not `"true"` and either
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set or `OTEL_TRACES_EXPORTER` is set to
/// something other than `"none"`.
pub fn otel_enabled() -> bool {
    otel_enabled_from(|name| std::env::var(name).ok())
}

fn otel_enabled_from(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }
    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }
    var("OTEL_TRACES_EXPORTER").is_some_and(|exporter| !exporter.eq_ignore_ascii_case("none"))
}

/// Sampling rate for a span, by name prefix.
///
/// | Prefix       | Rate | Rationale                              |
/// |--------------|------|----------------------------------------|
/// | `assist.*`   | 100% | User-visible model round trips         |
/// | `llm.*`      | 100% | Provider calls                         |
/// | `profile.*`  | 100% | Remote identity lookups                |
/// | `store.*`    |  1%  | Very high volume key-value traffic     |
/// | other        | 10%  | Default for unclassified spans         |
///
/// Errors are always sampled regardless of name.
pub fn sample_rate(name: &str) -> f64 {
    if name.starts_with("assist") || name.starts_with("llm") || name.starts_with("profile") {
        1.0
    } else if name.starts_with("store") {
        0.01
    } else {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_otel_disabled_by_default() {
        assert!(!otel_enabled_from(env(&[])));
    }

    #[test]
    fn test_otel_endpoint_enables() {
        assert!(otel_enabled_from(env(&[(
            "OTEL_EXPORTER_OTLP_ENDPOINT",
            "http://localhost:4317"
        )])));
    }

    #[test]
    fn test_sdk_disabled_wins() {
        assert!(!otel_enabled_from(env(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("OTEL_SDK_DISABLED", "TRUE"),
        ])));
    }

    #[test]
    fn test_traces_exporter() {
        assert!(otel_enabled_from(env(&[("OTEL_TRACES_EXPORTER", "otlp")])));
        assert!(!otel_enabled_from(env(&[("OTEL_TRACES_EXPORTER", "none")])));
    }

    #[test]
    fn test_sample_rates() {
        assert_eq!(sample_rate("assist.ask"), 1.0);
        assert_eq!(sample_rate("llm.send_message"), 1.0);
        assert_eq!(sample_rate("profile.resolve"), 1.0);
        assert_eq!(sample_rate("store.flush"), 0.01);
        assert_eq!(sample_rate("session.restore"), 0.1);
    }
}

//! Optional log output for hosts running the explorer engine.
//!
//! The engine reports through `tracing` under the `chronomap` target: fetch
//! tickets and stale results, rejected rows, scope resets, focus changes and
//! playback start/stop. Nothing is printed until a subscriber is installed.

/// Filter used when `RUST_LOG` is unset: engine debug events, everything else at info.
pub const DEFAULT_FILTER: &str = "info,chronomap=debug";

/// Installs a compact fmt subscriber filtered by `RUST_LOG` or [`DEFAULT_FILTER`].
///
/// Returns `false` without the `telemetry` feature, or when the host already
/// set a global subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}

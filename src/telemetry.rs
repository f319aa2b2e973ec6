use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Workspace crates logged at `debug` unless `RUST_LOG` says otherwise.
const WORKSPACE_TARGETS: [&str; 4] = ["brief_backend", "api", "elicitation", "ai_llm_service"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// `RUST_LOG` when set, else `info` globally plus `debug` for workspace crates.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives()))
}

fn default_directives() -> String {
    let mut s = String::from("info");
    for target in WORKSPACE_TARGETS {
        s.push_str(&format!(",{target}=debug"));
    }
    s
}

/// Installs the global subscriber: compact single-line events, RFC3339
/// timestamps, span close timings, ANSI only on a terminal.
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let use_ansi = io::stdout().is_terminal();

    let fmt_layer = fmt::layer()
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(
            fmt::format()
                .compact()
                .with_timer(ChronoRfc3339Utc)
                .with_level(true)
                .with_target(true)
                .with_source_location(true),
        );

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_raises_workspace_crates() {
        let d = default_directives();
        assert!(d.starts_with("info,"));
        for t in WORKSPACE_TARGETS {
            assert!(d.contains(&format!("{t}=debug")));
        }
        assert!(EnvFilter::try_new(d).is_ok());
    }
}

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Local-time timestamp, padded level, `file:line`, then the event fields.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        if ansi {
            write!(writer, "\x1b[2m{timestamp}\x1b[0m ")?;
        } else {
            write!(writer, "{timestamp} ")?;
        }

        let colour = match *meta.level() {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        };
        if ansi {
            write!(writer, "{colour}{:>5}\x1b[0m ", meta.level())?;
        } else {
            write!(writer, "{:>5} ", meta.level())?;
        }

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let file = file.rsplit(['/', '\\']).next().unwrap_or(file);
            write!(writer, "{file}:{line} ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Picks the log filter directive.
///
/// An explicit `--log-level` wins, then `RUST_LOG`, then the config file, then
/// `info`.
pub fn resolve_filter(
    flag: Option<&str>,
    env: Option<&str>,
    config: Option<&str>,
) -> String {
    flag.or(env)
        .or(config)
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .unwrap_or("info")
        .to_string()
}

/// Installs the global subscriber. Output goes to stderr so stdout carries
/// only results.
pub fn init(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid log level '{directive}'"))?;

    let layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("logging already initialized")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn flag_beats_environment_and_config() {
        assert_eq!(resolve_filter(Some("debug"), Some("warn"), Some("error")), "debug");
    }

    #[test]
    fn environment_beats_config() {
        assert_eq!(resolve_filter(None, Some("paytax_core=trace"), Some("error")), "paytax_core=trace");
    }

    #[test]
    fn falls_back_to_info() {
        assert_eq!(resolve_filter(None, None, None), "info");
        assert_eq!(resolve_filter(Some("  "), None, None), "info");
    }

    #[test]
    fn bad_directive_is_an_error() {
        assert!(init("paytax=notalevel").is_err());
    }
}

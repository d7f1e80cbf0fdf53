use crate::error::Result;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Maps the verbosity flags onto the console filter.
///
/// Measurement results go to stdout, so diagnostics stay at WARN unless asked
/// for; `quiet` keeps errors visible rather than silencing the console
/// entirely, since a failed run must still say why it failed.
fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: a compact stderr console filtered by the
/// CLI flags, plus an optional log file that always captures DEBUG detail so a
/// run can be inspected afterwards without re-running at higher verbosity.
pub fn init(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console_level(verbosity, quiet));

    let registry = tracing_subscriber::registry().with(console);

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use serial_test::serial;

    #[test]
    fn verbosity_flags_map_to_console_levels() {
        assert_eq!(console_level(0, false), LevelFilter::WARN);
        assert_eq!(console_level(1, false), LevelFilter::INFO);
        assert_eq!(console_level(2, false), LevelFilter::DEBUG);
        assert_eq!(console_level(7, false), LevelFilter::TRACE);
    }

    #[test]
    fn quiet_keeps_errors_visible() {
        assert_eq!(console_level(0, true), LevelFilter::ERROR);
        assert_eq!(console_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    #[serial]
    fn log_file_captures_debug_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let file = File::create(&path).unwrap();
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_filter(LevelFilter::DEBUG);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(frames = 3, "metric resolved");
            tracing::trace!("below the file filter");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("metric resolved"));
        assert!(!content.contains("below the file filter"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let dir_as_file = Path::new("/");
        if cfg!(unix) && dir_as_file.is_dir() {
            let result = init(0, false, Some(dir_as_file));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}

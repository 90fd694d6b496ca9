use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global tracing subscriber: a compact stderr layer gated by
/// `-v`/`-q`, plus an optional plain-text file layer carrying thread ids
/// so interleaved scan jobs can be told apart.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();
    let registry = tracing_subscriber::registry()
        .with(console_level(verbosity, quiet))
        .with(console);

    match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_target(true);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, info, warn};

    static INIT: Once = Once::new();

    fn install_test_subscriber() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("global subscriber");
        });
    }

    #[test]
    #[serial]
    fn subscriber_installs_once_and_accepts_events() {
        install_test_subscriber();
        warn!("scan batch warning");
        info!("scan batch info");
        debug!("scan batch debug");
    }

    #[test]
    #[serial]
    fn quiet_maps_to_off_and_verbosity_saturates() {
        assert_eq!(console_level(3, true), LevelFilter::OFF);
        assert_eq!(console_level(0, false), LevelFilter::WARN);
        assert_eq!(console_level(9, false), LevelFilter::TRACE);
    }

    #[test]
    #[serial]
    fn unwritable_log_file_path_propagates_error() {
        let path = PathBuf::from("/");
        if cfg!(unix) && path.is_dir() {
            let result = setup_logging(0, false, Some(path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}

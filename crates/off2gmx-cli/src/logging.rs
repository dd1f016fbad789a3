use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer);

    if let Some(path) = log_file {
        let file = File::create(&path).map_err(CliError::Io)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
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

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).unwrap();
        });
    }

    #[test]
    #[serial]
    fn logger_initializes_once_and_macros_emit() {
        ensure_global_logger_is_set();

        warn!("conversion warning path");
        info!("conversion progress line");
        debug!("parse detail line");
    }

    #[test]
    #[serial]
    fn file_layer_captures_messages() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("convert.log");

        let file = File::create(&log_path).unwrap();
        let file_layer = fmt::layer().with_writer(file).with_ansi(false);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            info!("tables written to tabpot");
        });

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("tables written to tabpot"));
        assert!(content.contains("INFO"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}

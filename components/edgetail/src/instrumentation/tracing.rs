// Local crates
use crate::helpers::load_config::LoggingConfig;

// External crates
use std::env;
use std::io;
use std::panic;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    Layer,
    filter::{Directive, EnvFilter},
    fmt,
    prelude::*,
    registry::Registry,
};

/// Install the global subscriber.
///
/// - Human readable events go to stderr; stdout belongs to the tailed events.
/// - `RUST_LOG` wins over the configured level.
/// - With `logging.directory` set, a daily rolling JSON file is written too.
/// - With `TOKIO_CONSOLE` set, the tokio-console layer is added.
///
/// The returned guard flushes the file writer on drop and must be held until
/// the process exits.
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(build_filter(config));

    let (file_writer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = rolling::daily(directory, "edgetail.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(non_blocking_writer), Some(guard))
        }
        None => (None, None),
    };

    let json_layer = file_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(build_filter(config))
    });

    let console_layer = env::var_os("TOKIO_CONSOLE")
        .is_some()
        .then(|| console_subscriber::ConsoleLayer::builder().spawn());

    let subscriber = Registry::default()
        .with(console_layer)
        .with(stderr_layer)
        .with(json_layer)
        .with(ErrorLayer::default());

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("edgetail: failed to install tracing subscriber: {e}");
    }

    guard
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    if let Ok(reqwest_directive) = "reqwest=warn".parse::<Directive>() {
        filter = filter.add_directive(reqwest_directive);
    }
    if let Ok(hyper_directive) = "hyper_util=warn".parse::<Directive>() {
        filter = filter.add_directive(hyper_directive);
    }

    filter
}

pub fn init_panic_handler() {
    panic::set_hook(Box::new(|panic_info| {
        let msg = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.as_str(),
                None => "Unknown panic",
            },
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        error!(
            message = %msg,
            location = %location,
            "edgetail panicked!"
        );
        eprintln!("edgetail panicked at {location}: {msg}");
    }));
}

use std::io;
use std::path::Path;
use chrono::Local;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{ fmt, prelude::*, EnvFilter, filter::LevelFilter };
use tracing_appender::rolling::{ RollingFileAppender, Rotation };
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::{ LogConfig, LogRotation };

/// Keeps the non-blocking writers alive; dropping it flushes pending log lines
pub struct LogGuards {
    _file_guard: WorkerGuard,
    _console_guard: Option<WorkerGuard>,
}

/// Initialize the logging system with non-blocking file and optional console output
pub fn init_logging(level: Level, debug: bool, log_config: &LogConfig) -> io::Result<LogGuards> {
    if !log_config.directory.exists() {
        std::fs::create_dir_all(&log_config.directory).map_err(|e| {
            eprintln!("Failed to create log directory: {}", e);
            e
        })?;
    }

    let timestamp = Local::now().format("%Y%m%d");
    let filename = format!("{}_{}.log", log_config.filename_prefix, timestamp);

    let file_appender = RollingFileAppender::new(
        rotation_of(log_config.rotation),
        log_config.directory.clone(),
        filename
    );
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt
        ::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE);

    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());

    let guards = if debug {
        let (console_writer, console_guard) = tracing_appender::non_blocking(io::stdout());

        let console_layer = fmt
            ::layer()
            .with_writer(console_writer)
            .with_ansi(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .pretty();

        tracing_subscriber::registry().with(filter).with(file_layer).with(console_layer).init();

        LogGuards {
            _file_guard: file_guard,
            _console_guard: Some(console_guard),
        }
    } else {
        tracing_subscriber::registry().with(filter).with(file_layer).init();

        LogGuards {
            _file_guard: file_guard,
            _console_guard: None,
        }
    };

    if let Some(max_files) = log_config.max_files {
        if
            let Err(e) = cleanup_old_logs(
                &log_config.directory,
                &log_config.filename_prefix,
                max_files
            )
        {
            // pruning is best effort
            eprintln!("Failed to clean up old log files: {}", e);
        }
    }

    tracing::info!(
        log_dir = %log_config.directory.display(),
        log_prefix = %log_config.filename_prefix,
        "Asynchronous logging initialized at level: {:?}",
        level
    );

    Ok(guards)
}

fn rotation_of(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

/// Clean up old log files to keep only the most recent ones
fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_files: usize) -> io::Result<()> {
    let mut entries = std::fs
        ::read_dir(log_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();

            if path.is_file() && path.file_name()?.to_string_lossy().starts_with(prefix) {
                let modified = entry.metadata().ok()?.modified().ok()?;
                return Some((path, modified));
            }
            None
        })
        .collect::<Vec<_>>();

    if entries.len() > max_files {
        // newest first
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        for (path, _) in entries.iter().skip(max_files) {
            std::fs::remove_file(path)?;
        }
    }

    Ok(())
}

//! Supervisor log sink.
//!
//! A single [`log::Log`] implementation backs the whole process: every
//! record is rendered once and delivered to stderr, and mirrored into
//! `logs/app.log` under the layout root when the supervisor runs with
//! a data directory. Miner child output does not pass through here; it
//! travels the event channel and the per-miner log files.

use anyhow::{anyhow, Result};
use log::{LevelFilter, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use crate::paths::Layout;

struct AppLog {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl AppLog {
    fn render(record: &Record) -> String {
        format!(
            "{} {:<5} {}: {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl log::Log for AppLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::render(record);
        let _ = writeln!(std::io::stderr(), "{}", line);
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Level from an explicit flag, else `RUST_LOG`, else info. Unknown
/// names fall back to info rather than erroring at startup.
pub fn parse_level(flag: Option<&str>) -> LevelFilter {
    let name = flag
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_default();
    match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install the process-wide logger.
///
/// With a layout, records are also appended to its `logs/app.log`;
/// without one only stderr is written. Fails if a logger is already
/// installed.
pub fn init_logging(layout: Option<&Layout>, log_level: Option<String>) -> Result<()> {
    let level = parse_level(log_level.as_deref());

    let file = match layout {
        Some(layout) => {
            std::fs::create_dir_all(layout.logs_dir())?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(layout.app_log_path())?;
            Some(Mutex::new(file))
        }
        None => None,
    };

    log::set_boxed_logger(Box::new(AppLog { level, file }))
        .map_err(|_| anyhow!("Logging was already initialized"))?;
    log::set_max_level(level);

    match layout {
        Some(layout) => log::info!(
            "Logging to {} (level: {})",
            layout.app_log_path().display(),
            level
        ),
        None => log::info!("Logging to stderr only (level: {})", level),
    }
    Ok(())
}

// Tue Jan 13 2026 - Alex

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const CRATE_PREFIX: &str = "zonal_batch::";

pub struct LoggingUtils;

impl LoggingUtils {
    pub fn init_logger(level: LevelFilter) {
        let logger = Box::new(ColoredLogger::new(level));
        if log::set_boxed_logger(logger).is_ok() {
            log::set_max_level(level);
        }
    }

    pub fn init_logger_with_file(level: LevelFilter, file_path: &Path) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        let logger = Box::new(FileLogger::new(level, file));
        if log::set_boxed_logger(logger).is_ok() {
            log::set_max_level(level);
        }
        Ok(())
    }

    pub fn level_from_str(s: &str) -> LevelFilter {
        match s.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }

    pub fn level_from_verbosity(verbosity: usize) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn short_target(target: &str) -> &str {
    target.strip_prefix(CRATE_PREFIX).unwrap_or(target)
}

/// Worker threads are named, so this shows which pool thread emitted a line.
fn thread_label() -> String {
    std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string()
}

struct ColoredLogger {
    level: LevelFilter,
}

impl ColoredLogger {
    fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    fn format_level(&self, level: Level) -> ColoredString {
        match level {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".green().bold(),
            Level::Debug => "DEBUG".blue().bold(),
            Level::Trace => "TRACE".magenta().bold(),
        }
    }
}

impl Log for ColoredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let origin = format!("[{} {}]", thread_label(), short_target(record.target()));
        eprintln!("{} {} {}", self.format_level(record.level()), origin.dimmed(), record.args());
    }

    fn flush(&self) {}
}

struct FileLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl FileLogger {
    fn new(level: LevelFilter, file: File) -> Self {
        Self {
            level,
            file: Mutex::new(file),
        }
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "{} {:5} [{} {}] {}\n",
            timestamp(),
            record.level(),
            thread_label(),
            short_target(record.target()),
            record.args()
        );

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn timestamp() -> String {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

/// Logs the elapsed time of a run phase at debug level when dropped.
pub struct ScopedTimer {
    name: String,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(name: &str) -> Self {
        log::debug!("[TIMER] {} started", name);
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        log::debug!("[TIMER] {} took {:.2}ms", self.name, elapsed.as_secs_f64() * 1000.0);
    }
}

/// `RUST_LOG`-driven logging, defaulting to `info`.
pub fn init_from_env() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// `RUST_LOG` takes precedence over `level`. Otherwise logs go to
/// `log_file` when given, else to stderr.
pub fn init_for_run(level: LevelFilter, log_file: Option<&Path>) -> std::io::Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        init_from_env();
        return Ok(());
    }

    match log_file {
        Some(path) => LoggingUtils::init_logger_with_file(level, path),
        None => {
            LoggingUtils::init_logger(level);
            Ok(())
        }
    }
}

pub fn scoped_timer(name: &str) -> ScopedTimer {
    ScopedTimer::new(name)
}

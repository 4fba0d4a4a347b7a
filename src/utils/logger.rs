//! Log sink used by the pipelines, and terminal logging setup for the CLI.

use colored::Colorize;
use crossbeam_channel::Receiver;
use env_logger::Builder;
use log::Level;
use std::io::Write;
use std::sync::Mutex;
use std::time::SystemTime;

use super::locks::lock;
use super::watchers::Watchers;

pub fn setup_logging(verbose: bool) {
    use log::LevelFilter;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    Builder::from_default_env()
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", name.cyan(), level_str, path, record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .init();
}

/// Severity of a [`LogMessage`]. Ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Info => "Info",
            LogLevel::Warn => "Warn",
            LogLevel::Error => "Error",
            LogLevel::Fatal => "Fatal",
        }
    }
}

/// One recorded log line.
#[derive(Clone, Debug)]
pub struct LogMessage {
    pub created_at: SystemTime,
    pub level: LogLevel,
    pub message: String,
    /// Rendered error chain, when the line was logged with an error.
    pub error: Option<String>,
}

impl LogMessage {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self
            .created_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        match &self.error {
            Some(e) => write!(
                f,
                "{}:[{}] {} [{}]",
                self.level.name(),
                secs,
                self.message,
                e
            ),
            None => write!(f, "{}:[{}] {}", self.level.name(), secs, self.message),
        }
    }
}

/// Render an error and its `source()` chain as `outer: inner: ...`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}

/// Fire-and-forget log sink. Implementations must not block the caller for long and must
/// never fail.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, error: Option<&dyn std::error::Error>);

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, None);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    fn warn(&self, message: &str, error: Option<&dyn std::error::Error>) {
        self.log(LogLevel::Warn, message, error);
    }

    fn error(&self, message: &str, error: Option<&dyn std::error::Error>) {
        self.log(LogLevel::Error, message, error);
    }

    fn fatal(&self, message: &str, error: Option<&dyn std::error::Error>) {
        self.log(LogLevel::Fatal, message, error);
    }
}

fn forward_to_facade(level: LogLevel, message: &str, error: Option<&dyn std::error::Error>) {
    let text = match error {
        Some(e) => format!("{} [{}]", message, error_chain(e)),
        None => message.to_string(),
    };
    match level {
        LogLevel::Trace => log::trace!("{}", text),
        LogLevel::Debug => log::debug!("{}", text),
        LogLevel::Info => log::info!("{}", text),
        LogLevel::Warn => log::warn!("{}", text),
        LogLevel::Error => log::error!("{}", text),
        LogLevel::Fatal => log::error!("FATAL: {}", text),
    }
}

/// Forwards every line to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, level: LogLevel, message: &str, error: Option<&dyn std::error::Error>) {
        forward_to_facade(level, message, error);
    }
}

/// Drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str, _error: Option<&dyn std::error::Error>) {}
}

/// Keeps every line in memory (for a status line / error list) and forwards to the `log` facade.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    messages: Mutex<Vec<LogMessage>>,
    watchers: Watchers<LogMessage>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<LogMessage> {
        lock(&self.messages).clone()
    }

    /// Lines at `level` or more severe.
    pub fn at_least(&self, level: LogLevel) -> Vec<LogMessage> {
        lock(&self.messages)
            .iter()
            .filter(|m| m.level >= level)
            .cloned()
            .collect()
    }

    /// Lines at exactly `level`.
    pub fn at(&self, level: LogLevel) -> Vec<LogMessage> {
        lock(&self.messages)
            .iter()
            .filter(|m| m.level == level)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.messages).clear();
    }

    pub fn subscribe(&self) -> Receiver<LogMessage> {
        self.watchers.subscribe()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, error: Option<&dyn std::error::Error>) {
        forward_to_facade(level, message, error);
        let msg = LogMessage {
            created_at: SystemTime::now(),
            level,
            message: message.to_string(),
            error: error.map(error_chain),
        };
        lock(&self.messages).push(msg.clone());
        self.watchers.notify(msg);
    }
}

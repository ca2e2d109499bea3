use colored::*;
use std::time::{SystemTime, UNIX_EPOCH};

/// Enum representing the log levels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn tag(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

pub fn verbose_log(level: LogLevel, message: &str, verbose: bool) {
    if should_emit(level, verbose) {
        log(level, message);
    }
}

/// `Debug` lines need verbose; everything else always prints.
fn should_emit(level: LogLevel, verbose: bool) -> bool {
    verbose || level != LogLevel::Debug
}

/// Logs messages to the console
pub fn log(level: LogLevel, message: &str) {
    let line = format_line(&clock(SystemTime::now()), level, message);
    match level {
        LogLevel::Info => println!("{}", line.green()),
        LogLevel::Warn => eprintln!("{}", line.yellow()),
        LogLevel::Error => eprintln!("{}", line.red()),
        LogLevel::Debug => println!("{}", line.dimmed()),
    }
}

fn format_line(stamp: &str, level: LogLevel, message: &str) -> String {
    format!("{} [{}] {}", stamp, level.tag(), message)
}

/// `HH:MM:SS` in UTC.
fn clock(now: SystemTime) -> String {
    now.duration_since(UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 86_400;
            format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
        })
        .unwrap_or_else(|_| "00:00:00".to_string())
}

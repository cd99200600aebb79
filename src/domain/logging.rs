use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum LogLevel {
    #[display(fmt = "DEBUG")]
    Debug,
    #[display(fmt = " INFO")]
    Info,
    #[display(fmt = " WARN")]
    Warn,
}

/// Layer that produced a log line
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LogComponent {
    #[display(fmt = "DOM:{}", _0)]
    Domain(&'static str),
    #[display(fmt = "APP:{}", _0)]
    Application(&'static str),
    #[display(fmt = "INF:{}", _0)]
    Infrastructure(&'static str),
    #[display(fmt = "PRE:{}", _0)]
    Presentation(&'static str),
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: u64,
    pub level: LogLevel,
    pub component: LogComponent,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: LogComponent, message: impl Into<String>) -> Self {
        Self { timestamp: get_time_provider().current_timestamp(), level, component, message: message.into() }
    }

    /// `[time] LEVEL COMPONENT | message`, shared by every sink
    pub fn format_line(&self) -> String {
        let timestamp = get_time_provider().format_timestamp(self.timestamp);
        format!("[{}] {} {} | {}", timestamp, self.level, self.component, self.message)
    }
}

/// Clock used to stamp log entries; the browser binding installs a real one.
pub trait TimeProvider: Send + Sync {
    fn current_timestamp(&self) -> u64;
    fn format_timestamp(&self, timestamp: u64) -> String;
}

pub trait Logger: Send + Sync {
    fn log(&self, entry: LogEntry);
}

static GLOBAL_LOGGER: OnceLock<Box<dyn Logger>> = OnceLock::new();
static GLOBAL_TIME_PROVIDER: OnceLock<Box<dyn TimeProvider>> = OnceLock::new();

/// Install the global logger. Only the first call wins.
pub fn init_logger(logger: Box<dyn Logger>) {
    let _ = GLOBAL_LOGGER.set(logger);
}

/// Install the global time provider. Only the first call wins.
pub fn init_time_provider(time_provider: Box<dyn TimeProvider>) {
    let _ = GLOBAL_TIME_PROVIDER.set(time_provider);
}

/// Entries logged before [`init_logger`] are dropped.
pub fn get_logger() -> &'static dyn Logger {
    GLOBAL_LOGGER.get().map(|logger| logger.as_ref()).unwrap_or(&NoOpLogger)
}

pub fn get_time_provider() -> &'static dyn TimeProvider {
    GLOBAL_TIME_PROVIDER.get().map(|provider| provider.as_ref()).unwrap_or(&SequenceClock)
}

struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _entry: LogEntry) {}
}

/// Counts entries instead of telling time
struct SequenceClock;

impl TimeProvider for SequenceClock {
    fn current_timestamp(&self) -> u64 {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        NEXT.fetch_add(1, Ordering::Relaxed)
    }

    fn format_timestamp(&self, timestamp: u64) -> String {
        format!("#{:06}", timestamp)
    }
}

/// Debug lines are compiled out of release builds.
#[macro_export]
macro_rules! log_debug {
    ($component:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            $crate::domain::logging::get_logger().log($crate::domain::logging::LogEntry::new(
                $crate::domain::logging::LogLevel::Debug,
                $component,
                format!($($arg)*),
            ));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($component:expr, $($arg:tt)*) => {
        $crate::domain::logging::get_logger().log($crate::domain::logging::LogEntry::new(
            $crate::domain::logging::LogLevel::Info,
            $component,
            format!($($arg)*),
        ))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::domain::logging::get_logger().log($crate::domain::logging::LogEntry::new(
            $crate::domain::logging::LogLevel::Warn,
            $component,
            format!($($arg)*),
        ))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_and_level_display() {
        assert_eq!(LogComponent::Domain("Series").to_string(), "DOM:Series");
        assert_eq!(LogComponent::Presentation("Widget").to_string(), "PRE:Widget");
        assert_eq!(LogLevel::Warn.to_string(), " WARN");
        assert!(LogLevel::Warn > LogLevel::Debug);
    }

    #[test]
    fn entry_line_names_level_and_component() {
        let entry = LogEntry::new(LogLevel::Info, LogComponent::Application("Controller"), "redraw");
        assert!(entry.format_line().ends_with(" INFO APP:Controller | redraw"));
    }
}

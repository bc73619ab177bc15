//! Logging configuration for the instruction core.
//!
//! The core is a library embedded in a driver loop, so logging stays
//! lightweight: a thread-safe global level per category, set once by the
//! embedder, and a [`log`] function taking a lazy message closure so that
//! disabled categories cost nothing on the instruction hot path.

use std::sync::atomic::{AtomicU8, Ordering};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the different concerns of the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Instruction execution (mode switches, halts, crashes)
    Cpu,
    /// Stack discipline (pushes/pulls, emulation-mode pinning)
    Stack,
    /// Interrupt entry and return (BRK, COP, RTI, WAI)
    Interrupts,
}

impl LogCategory {
    fn index(self) -> usize {
        match self {
            LogCategory::Cpu => 0,
            LogCategory::Stack => 1,
            LogCategory::Interrupts => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            LogCategory::Cpu => "CPU",
            LogCategory::Stack => "STACK",
            LogCategory::Interrupts => "IRQ",
        }
    }
}

static LEVELS: [AtomicU8; 3] = [AtomicU8::new(0), AtomicU8::new(0), AtomicU8::new(0)];

/// Set the log level for one category.
pub fn set_level(category: LogCategory, level: LogLevel) {
    LEVELS[category.index()].store(level as u8, Ordering::Relaxed);
}

/// Set the log level for every category at once.
pub fn set_global_level(level: LogLevel) {
    for slot in &LEVELS {
        slot.store(level as u8, Ordering::Relaxed);
    }
}

/// Check whether a message at the given category/level would be emitted.
#[inline]
pub fn enabled(category: LogCategory, level: LogLevel) -> bool {
    level <= LogLevel::from_u8(LEVELS[category.index()].load(Ordering::Relaxed))
}

/// Log a message with lazy evaluation (zero cost when disabled).
///
/// ```
/// use emu_65816::logging::{log, LogCategory, LogLevel};
///
/// log(LogCategory::Cpu, LogLevel::Debug, || {
///     format!("BRK at PC={:04X}", 0x1234)
/// });
/// ```
#[inline]
pub fn log<F: FnOnce() -> String>(category: LogCategory, level: LogLevel, message: F) {
    if enabled(category, level) {
        eprintln!("[{}] {}", category.name(), message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::from_str("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::from_str("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("5"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str("bogus"), None);
    }

    #[test]
    fn test_enabled_respects_level() {
        set_level(LogCategory::Stack, LogLevel::Warn);
        assert!(enabled(LogCategory::Stack, LogLevel::Error));
        assert!(enabled(LogCategory::Stack, LogLevel::Warn));
        assert!(!enabled(LogCategory::Stack, LogLevel::Debug));
        set_level(LogCategory::Stack, LogLevel::Off);
    }
}

//! Kernel-style print macros for the message slot device
//!
//! Leveled, line-atomic output to stderr in the spirit of `printk`.
//! Every line is tagged with the device name so module output is easy to
//! pick out of a mixed log.
//!
//! # Environment Variables
//!
//! - `MSGSLOT_LOG_LEVEL=<level>` - off/error/warn/info/debug/trace or 0-5 (default: info)
//! - `MSGSLOT_FLUSH_EPRINT=1` - Flush stderr after each line
//!
//! # Usage
//!
//! ```ignore
//! use msgslot_core::{kinfo, kdebug};
//!
//! kinfo!("registered major {}", major);
//! kdebug!("minor {} channel {}: no message", minor, channel);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::constants::DEVICE_RANGE_NAME;
use crate::env::{env_get_bool, env_get_opt};

/// Log levels, most severe first
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or digit; unknown strings give `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "err",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Read logging settings from the environment (once)
///
/// Runs implicitly on the first log call.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    FLUSH_ENABLED.store(env_get_bool("MSGSLOT_FLUSH_EPRINT", false), Ordering::Relaxed);

    if let Some(raw) = env_get_opt::<String>("MSGSLOT_LOG_LEVEL") {
        let level = LogLevel::parse(&raw).unwrap_or(LogLevel::Info);
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

#[inline]
pub fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Override the level (wins over the environment)
pub fn set_log_level(level: LogLevel) {
    INITIALIZED.store(true, Ordering::SeqCst);
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn set_flush_enabled(enabled: bool) {
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

#[doc(hidden)]
pub fn _kprintln_impl(args: std::fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if flush_enabled() {
        let _ = handle.flush();
    }
}

#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = write!(handle, "{}[{}]: ", DEVICE_RANGE_NAME, level.tag());
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if flush_enabled() {
        let _ = handle.flush();
    }
}

// ============================================================================
// Public Macros
// ============================================================================
//
// The leveled macros test the level before building `format_args!`, so
// arguments to a disabled level are never evaluated.

/// Print a line to stderr, unconditionally
#[macro_export]
macro_rules! kprintln {
    () => {{
        $crate::kprint::_kprintln_impl(format_args!(""));
    }};
    ($($arg:tt)*) => {{
        $crate::kprint::_kprintln_impl(format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::Error) {
            $crate::kprint::_klog_impl(
                $crate::kprint::LogLevel::Error,
                format_args!($($arg)*)
            );
        }
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::Warn) {
            $crate::kprint::_klog_impl(
                $crate::kprint::LogLevel::Warn,
                format_args!($($arg)*)
            );
        }
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::Info) {
            $crate::kprint::_klog_impl(
                $crate::kprint::LogLevel::Info,
                format_args!($($arg)*)
            );
        }
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::Debug) {
            $crate::kprint::_klog_impl(
                $crate::kprint::LogLevel::Debug,
                format_args!($($arg)*)
            );
        }
    }};
}

/// Trace level (tree dumps and the like)
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::Trace) {
            $crate::kprint::_klog_impl(
                $crate::kprint::LogLevel::Trace,
                format_args!($($arg)*)
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse(" 1 "), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::from_u8(99), LogLevel::Trace);
    }

    #[test]
    fn test_macros_compile() {
        set_log_level(LogLevel::Info);
        assert!(!level_enabled(LogLevel::Debug));

        kprintln!();
        kerror!("error {}", 1);
        kwarn!("warn");
        kinfo!("info");
        kdebug!("debug {:?}", Some(2));
        ktrace!("trace");
    }

    #[test]
    fn test_disabled_level_skips_arguments() {
        use std::sync::atomic::AtomicUsize;

        static EVALUATED: AtomicUsize = AtomicUsize::new(0);
        fn expensive() -> usize {
            EVALUATED.fetch_add(1, Ordering::SeqCst)
        }

        // No test in this crate raises the level above info
        set_log_level(LogLevel::Info);
        ktrace!("dump {}", expensive());
        kdebug!("dump {}", expensive());
        assert!(!level_enabled(LogLevel::Trace));
        assert_eq!(EVALUATED.load(Ordering::SeqCst), 0);
    }
}

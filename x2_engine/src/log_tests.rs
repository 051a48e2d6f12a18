//! Unit tests for log.rs

use crate::log::{format_entry, DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::x2::{Engine, Error};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Logger capturing (severity, message) pairs
struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

fn capture() -> Arc<Mutex<Vec<(LogSeverity, String)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "x2::Shader".to_string(),
        message: "pipeline created".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
}

// ============================================================================
// FORMATTING TESTS
// ============================================================================

#[test]
fn test_format_entry_without_location() {
    let line = format_entry(&entry(LogSeverity::Info, None, None));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[x2::Shader] pipeline created"));
    assert!(!line.contains("("));
}

#[test]
fn test_format_entry_with_location() {
    let line = format_entry(&entry(LogSeverity::Error, Some("shader.rs"), Some(42)));
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("(shader.rs:42)"));
}

#[test]
fn test_default_logger_does_not_panic() {
    let logger = DefaultLogger;
    logger.log(&entry(LogSeverity::Trace, None, None));
    logger.log(&entry(LogSeverity::Error, Some("log.rs"), Some(1)));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("x2::test", "vkQueueSubmit failed: {}", -3);
    assert_eq!(err, Error::BackendError("vkQueueSubmit failed: -3".to_string()));

    let logged = entries.lock().unwrap().clone();
    assert_eq!(logged, vec![(LogSeverity::Error, "vkQueueSubmit failed: -3".to_string())]);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_invalid_returns_early() {
    let entries = capture();

    fn check(value: u32) -> crate::x2::Result<u32> {
        if value == 0 {
            crate::engine_bail_invalid!("x2::test", "value must not be zero");
        }
        Ok(value)
    }

    assert_eq!(check(3), Ok(3));
    assert_eq!(
        check(0),
        Err(Error::InvalidResource("value must not be zero".to_string()))
    );
    assert_eq!(entries.lock().unwrap().len(), 1);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_info_and_warn_macros_reach_logger() {
    let entries = capture();

    crate::engine_info!("x2::test", "renderer '{}' built", "Deferred");
    crate::engine_warn!("x2::test", "duplicate stage skipped");

    let logged = entries.lock().unwrap().clone();
    assert_eq!(logged[0], (LogSeverity::Info, "renderer 'Deferred' built".to_string()));
    assert_eq!(logged[1].0, LogSeverity::Warn);
    Engine::reset_logger();
}

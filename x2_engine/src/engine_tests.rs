//! Unit tests for the Engine logger registry
//!
//! The logger is process-global: every test here is #[serial].

use crate::x2::Engine;
use crate::x2::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
#[serial]
fn test_set_logger_receives_entries() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    Engine::log(LogSeverity::Info, "x2::Engine", "hello".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].source, "x2::Engine");
    assert!(captured[0].file.is_none());
    drop(captured);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    Engine::log_detailed(LogSeverity::Error, "x2::Engine", "boom".to_string(), "engine.rs", 7);

    let captured = entries.lock().unwrap();
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].file, Some("engine.rs"));
    assert_eq!(captured[0].line, Some(7));
    drop(captured);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });
    Engine::reset_logger();

    Engine::log(LogSeverity::Debug, "x2::Engine", "to stdout".to_string());

    assert!(entries.lock().unwrap().is_empty());
}

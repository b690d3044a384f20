//! Log capture for unit tests
//!
//! Installs a process-wide logger once; tests filter the captured messages
//! by their own agent or run id since tests run in parallel.

use parking_lot::Mutex;

struct CaptureLog {
    messages: Mutex<Vec<String>>,
}

impl log::Log for CaptureLog {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        self.messages.lock().push(record.args().to_string());
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLog = CaptureLog {
    messages: parking_lot::const_mutex(Vec::new()),
};

/// Start capturing; safe to call from every test
pub fn capture_logs() {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(log::LevelFilter::Trace);
}

/// Captured messages containing `needle`
pub fn logged(needle: &str) -> Vec<String> {
    CAPTURE
        .messages
        .lock()
        .iter()
        .filter(|m| m.contains(needle))
        .cloned()
        .collect()
}

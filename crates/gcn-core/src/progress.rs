//! Progress surface for long running teardowns

use std::sync::Mutex;

/// Receives one short message per teardown step
pub trait ProgressSink: Send + Sync {
    /// Start of a titled operation
    fn begin(&self, _title: &str) {}

    /// Step message, fire and forget
    fn report(&self, message: &str);

    /// Failure notification shown to the user
    fn error(&self, message: &str);
}

/// Progress sink keeping every message in memory
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }

    fn error(&self, message: &str) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_progress() {
        let progress = RecordingProgress::new();
        progress.begin("Deleting devops project");
        progress.report("Deleting code repository app...");
        progress.error("Failed to delete code repository app: boom");

        assert_eq!(progress.messages(), vec!["Deleting code repository app..."]);
        assert_eq!(progress.errors().len(), 1);
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use httptool::{with_logger, CancellationToken, Field, LogLevel, Logger, RequestOption};

#[derive(Debug, Clone)]
pub struct Event {
    pub level: LogLevel,
    pub msg: String,
    pub fields: Vec<Field>,
}

impl Event {
    pub fn field(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing field {}", key))
    }
}

/// Logger that keeps every event in memory
#[derive(Clone, Default)]
pub struct MockLogger {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(&self) -> RequestOption {
        with_logger(Arc::new(self.clone()))
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }

    fn push(&self, level: LogLevel, msg: &str, fields: &[Field]) {
        self.events.lock().unwrap().push(Event {
            level,
            msg: msg.to_owned(),
            fields: fields.to_vec(),
        });
    }
}

impl Logger for MockLogger {
    fn log_mode(&self, _level: LogLevel) -> Arc<dyn Logger> {
        Arc::new(self.clone())
    }

    fn debug(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.push(LogLevel::Debug, msg, fields);
    }

    fn info(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.push(LogLevel::Info, msg, fields);
    }

    fn warn(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.push(LogLevel::Warn, msg, fields);
    }

    fn error(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.push(LogLevel::Error, msg, fields);
    }
}

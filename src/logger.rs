//! Logging capability consumed by the request pipeline
//!
//! The pipeline only depends on the [`Logger`] trait. The default
//! implementation forwards to `tracing`; formatting and output are up to the
//! subscriber the process installs.

use std::fmt::Write as _;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;

/// A structured log field
pub type Field = (&'static str, String);

/// Log severity, ordered from quietest to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Silent = 1,
    Error,
    Warn,
    Info,
    Debug,
}

/// Logging capability
pub trait Logger: Send + Sync {
    /// A logger that emits events up to `level`
    fn log_mode(&self, level: LogLevel) -> Arc<dyn Logger>;

    fn debug(&self, scope: &CancellationToken, msg: &str, fields: &[Field]);

    fn info(&self, scope: &CancellationToken, msg: &str, fields: &[Field]);

    fn warn(&self, scope: &CancellationToken, msg: &str, fields: &[Field]);

    fn error(&self, scope: &CancellationToken, msg: &str, fields: &[Field]);
}

static DEFAULT: Lazy<Arc<dyn Logger>> =
    Lazy::new(|| Arc::new(TracingLogger::new(LogLevel::Warn)));

/// The process-wide default logger, a [`TracingLogger`] at [`LogLevel::Warn`]
pub fn default_logger() -> Arc<dyn Logger> {
    DEFAULT.clone()
}

/// Logger that forwards events to `tracing` under the `httptool` target
#[derive(Debug, Clone)]
pub struct TracingLogger {
    level: LogLevel,
}

impl TracingLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// The most verbose level this logger emits
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, level: LogLevel, msg: &str, fields: &[Field]) {
        if self.level < level {
            return;
        }

        let f = EventFields::split(fields);
        match level {
            LogLevel::Debug => tracing::debug!(
                target: "httptool",
                method = f.method, url = f.url, err = f.err, dur_ms = f.dur_ms,
                fields = %f.rest,
                "{}", msg
            ),
            LogLevel::Info => tracing::info!(
                target: "httptool",
                method = f.method, url = f.url, err = f.err, dur_ms = f.dur_ms,
                fields = %f.rest,
                "{}", msg
            ),
            LogLevel::Warn => tracing::warn!(
                target: "httptool",
                method = f.method, url = f.url, err = f.err, dur_ms = f.dur_ms,
                fields = %f.rest,
                "{}", msg
            ),
            LogLevel::Error => tracing::error!(
                target: "httptool",
                method = f.method, url = f.url, err = f.err, dur_ms = f.dur_ms,
                fields = %f.rest,
                "{}", msg
            ),
            LogLevel::Silent => {}
        }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(LogLevel::Warn)
    }
}

impl Logger for TracingLogger {
    fn log_mode(&self, level: LogLevel) -> Arc<dyn Logger> {
        Arc::new(Self { level })
    }

    fn debug(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.emit(LogLevel::Debug, msg, fields);
    }

    fn info(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.emit(LogLevel::Info, msg, fields);
    }

    fn warn(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.emit(LogLevel::Warn, msg, fields);
    }

    fn error(&self, _scope: &CancellationToken, msg: &str, fields: &[Field]) {
        self.emit(LogLevel::Error, msg, fields);
    }
}

/// Fields split into the keys subscribers filter on and everything else
///
/// `method`, `url`, `err` and `dur_ms` become tracing fields of their own.
/// Absent keys are left unrecorded. The rest is rendered into `fields`.
#[derive(Debug, Default, PartialEq, Eq)]
struct EventFields<'a> {
    method: Option<&'a str>,
    url: Option<&'a str>,
    err: Option<&'a str>,
    dur_ms: Option<&'a str>,
    rest: String,
}

impl<'a> EventFields<'a> {
    fn split(fields: &'a [Field]) -> Self {
        let mut out = EventFields::default();
        let mut rest: Vec<(&'static str, &str)> = Vec::new();
        for (key, value) in fields {
            let value = value.as_str();
            match *key {
                "method" => out.method = Some(value),
                "url" => out.url = Some(value),
                "err" => out.err = Some(value),
                "dur_ms" => out.dur_ms = Some(value),
                other => rest.push((other, value)),
            }
        }
        for (i, (key, value)) in rest.iter().enumerate() {
            if i > 0 {
                out.rest.push(' ');
            }
            let _ = write!(out.rest, "{}={:?}", key, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tracing::field::Visit;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Silent < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn test_default_logger_is_shared() {
        assert!(Arc::ptr_eq(&default_logger(), &default_logger()));
        assert_eq!(TracingLogger::default().level(), LogLevel::Warn);
    }

    #[test]
    fn test_event_fields_split() {
        let fields = [
            ("method", "POST".to_string()),
            ("url", "http://x/a".to_string()),
            ("body", "{}".to_string()),
            ("reply", "ok".to_string()),
            ("err", String::new()),
            ("dur_ms", "12".to_string()),
        ];
        let f = EventFields::split(&fields);
        assert_eq!(f.method, Some("POST"));
        assert_eq!(f.url, Some("http://x/a"));
        assert_eq!(f.err, Some(""));
        assert_eq!(f.dur_ms, Some("12"));
        assert_eq!(f.rest, r#"body="{}" reply="ok""#);

        assert_eq!(EventFields::split(&[]), EventFields::default());
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<HashMap<String, String>>>>);

    struct Visitor<'a>(&'a mut HashMap<String, String>);

    impl Visit for Visitor<'_> {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut recorded = HashMap::new();
            event.record(&mut Visitor(&mut recorded));
            self.0.lock().unwrap().push(recorded);
        }
    }

    #[test]
    fn test_tracing_logger_records_separate_fields() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            let logger = TracingLogger::new(LogLevel::Debug);
            let fields = [
                ("method", "GET".to_string()),
                ("url", "http://x/".to_string()),
                ("reply", "hi".to_string()),
                ("err", "boom".to_string()),
                ("dur_ms", "7".to_string()),
            ];
            logger.debug(&CancellationToken::new(), "request done", &fields);
        });

        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event["method"], "GET");
        assert_eq!(event["url"], "http://x/");
        assert_eq!(event["err"], "boom");
        assert_eq!(event["dur_ms"], "7");
        assert_eq!(event["fields"], r#"reply="hi""#);
        assert_eq!(event["message"], "request done");
    }

    #[test]
    fn test_log_mode_returns_new_logger() {
        let logger = TracingLogger::new(LogLevel::Warn);
        let _verbose = logger.log_mode(LogLevel::Debug);
        assert_eq!(logger.level(), LogLevel::Warn);

        // Silent swallows everything without panicking.
        let silent = logger.log_mode(LogLevel::Silent);
        silent.error(&CancellationToken::new(), "ignored", &[]);
    }
}

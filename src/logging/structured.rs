//! Structured logging utilities.
//!
//! Every line reads `[request=<id>] [host=<ip>] EVENT key=value ...` so one
//! submission can be followed through validation, dedup, storage and audit.

use std::fmt::{self, Write};

/// Logging context for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub request_id: String,
    pub host_ip: Option<String>,
}

impl LogContext {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            host_ip: None,
        }
    }

    /// Same request, now attributed to a host.
    pub fn with_host(&self, host_ip: &str) -> Self {
        Self {
            request_id: self.request_id.clone(),
            host_ip: Some(host_ip.to_string()),
        }
    }

    /// Render one event. Values use their `Debug` form so strings are quoted
    /// and a host id with stray whitespace stays visible.
    pub fn event_line(&self, event: &str, fields: &[(&str, &dyn fmt::Debug)]) -> String {
        let mut line = format!("{self} {event}");
        for (key, value) in fields {
            let _ = write!(line, " {key}={value:?}");
        }
        line
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host_ip {
            Some(host) => write!(f, "[request={}] [host={}]", self.request_id, host),
            None => write!(f, "[request={}]", self.request_id),
        }
    }
}

/// Log an event with context at the given level. The line is only built when
/// the level is enabled.
#[macro_export]
macro_rules! log_event {
    ($level:expr, $ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        if log::log_enabled!($level) {
            log::log!(
                $level,
                "{}",
                $ctx.event_line(
                    $event,
                    &[$((stringify!($key), &$value as &dyn ::std::fmt::Debug)),*]
                )
            );
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::log_event!(log::Level::Info, $ctx, $event $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::log_event!(log::Level::Warn, $ctx, $event $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::log_event!(log::Level::Error, $ctx, $event $(, $key = $value)*)
    };
}

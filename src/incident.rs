use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Receiver of site-fatal and run-fatal failures.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, incident: &Incident);
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Incident {
    /// `None` for failures that abort the whole run.
    pub site_id: Option<String>,
    pub message: String,
    pub trace: String,
    pub occurred_at: DateTime<Utc>,
}

impl Incident {
    pub fn site<S: Into<String>>(site_id: &str, message: S, error: &dyn StdError) -> Self {
        Self {
            site_id: Some(site_id.to_string()),
            message: message.into(),
            trace: error_trace(error),
            occurred_at: Utc::now(),
        }
    }

    pub fn run<S: Into<String>>(message: S, error: &dyn StdError) -> Self {
        Self {
            site_id: None,
            message: message.into(),
            trace: error_trace(error),
            occurred_at: Utc::now(),
        }
    }
}

/// Logs incidents and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

#[async_trait]
impl ErrorReporter for TracingReporter {
    async fn report(&self, incident: &Incident) {
        match &incident.site_id {
            Some(site_id) => tracing::error!(
                site = %site_id,
                trace = %incident.trace,
                "{}",
                incident.message
            ),
            None => tracing::error!(trace = %incident.trace, "{}", incident.message),
        }
    }
}

/// Renders an error and its chain of sources, one cause per line.
pub fn error_trace(error: &dyn StdError) -> String {
    let mut trace = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str("\n  caused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}

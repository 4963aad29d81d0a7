//! Session-scoped user alerts.
//!
//! Alerts survive redirect sequences by living in the session rather than
//! the request: anything pushed during one request is drained (and numbered)
//! by the next successful render pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visual severity of an alert, matching the presentation layer's contexts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertContext {
    #[default]
    Success,
    Info,
    Warning,
    Danger,
}

/// One user-facing notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub message: String,

    /// Short heading; defaults to "FYI".
    pub title: String,

    pub context: AlertContext,

    /// Optional action link rendered with the alert.
    #[serde(default)]
    pub link: Option<String>,

    /// Caption for the action link.
    #[serde(default)]
    pub caption: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Render position, assigned exactly once when the queue is drained.
    #[serde(default)]
    pub number: Option<usize>,
}

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: "FYI".to_string(),
            context: AlertContext::default(),
            link: None,
            caption: None,
            created_at: Utc::now(),
            number: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_context(mut self, context: AlertContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>, caption: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self.caption = Some(caption.into());
        self
    }
}

/// Ordered, session-scoped alert queue.
///
/// Accumulates until drained; draining numbers the alerts (1-based) and
/// empties the queue so each alert renders exactly once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAlerts {
    alerts: Vec<Alert>,
}

impl SessionAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alert for the next render pass.
    pub fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    /// Drain and number the pending alerts for one render pass.
    pub fn drain(&mut self) -> Vec<Alert> {
        let mut alerts = std::mem::take(&mut self.alerts);
        for (index, alert) in alerts.iter_mut().enumerate() {
            alert.number = Some(index + 1);
        }
        alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerts_accumulate_until_drained() {
        let mut alerts = SessionAlerts::new();
        alerts.push(Alert::new("linked your account").with_context(AlertContext::Success));
        alerts.push(
            Alert::new("your token expires soon")
                .with_title("Heads up")
                .with_context(AlertContext::Warning)
                .with_link("/settings/tokens", "Renew token"),
        );
        assert_eq!(alerts.len(), 2);

        let drained = alerts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].number, Some(1));
        assert_eq!(drained[0].title, "FYI");
        assert_eq!(drained[1].number, Some(2));
        assert_eq!(drained[1].caption.as_deref(), Some("Renew token"));

        // Drained exactly once.
        assert!(alerts.is_empty());
        assert!(alerts.drain().is_empty());
    }

    #[test]
    fn test_alerts_survive_serialization() {
        let mut alerts = SessionAlerts::new();
        alerts.push(Alert::new("stored in the session"));

        let json = serde_json::to_string(&alerts).unwrap();
        let mut restored: SessionAlerts = serde_json::from_str(&json).unwrap();
        let drained = restored.drain();
        assert_eq!(drained[0].message, "stored in the session");
        assert_eq!(drained[0].number, Some(1));
    }
}

//! Evidence - immutable facts supporting an issue

use crate::source::SourceSystem;
use serde::{Deserialize, Serialize};

/// A single evidence entry supporting an inbox record
///
/// Evidence is append-only: subsequent detections of the same underlying
/// issue add entries, they never rewrite existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Originating source system
    pub source: SourceSystem,

    /// Upstream identifier within the source system
    pub source_id: String,

    /// Optional deep link into the source system.
    /// Always `None` for invoicing evidence; see [`Evidence::with_url`].
    pub url: Option<String>,

    /// Canonical timestamp at capture
    pub captured_at: String,

    /// Optional structured detail payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl Evidence {
    /// Create a new evidence entry with no url or detail
    pub fn new(
        source: SourceSystem,
        source_id: impl Into<String>,
        captured_at: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            url: None,
            captured_at: captured_at.into(),
            detail: None,
        }
    }

    /// Attach a deep link.
    ///
    /// Invoicing evidence never stores a url: the field stays `None`
    /// regardless of what is passed here.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        if self.source != SourceSystem::Invoicing {
            self.url = Some(url.into());
        }
        self
    }

    /// Attach a structured detail payload
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let evidence = Evidence::new(SourceSystem::Mail, "thread-7", "2026-02-08T11:00:00.000Z")
            .with_url("https://mail.example/thread-7")
            .with_detail(json!({"subject": "Renewal"}));

        assert_eq!(evidence.source, SourceSystem::Mail);
        assert_eq!(evidence.url.as_deref(), Some("https://mail.example/thread-7"));
        assert_eq!(evidence.detail.unwrap()["subject"], "Renewal");
    }

    #[test]
    fn test_invoicing_url_never_stored() {
        let evidence = Evidence::new(SourceSystem::Invoicing, "rec_9f3", "2026-02-08T11:00:00.000Z")
            .with_url("https://billing.example/rec_9f3");

        assert!(evidence.url.is_none());
    }
}

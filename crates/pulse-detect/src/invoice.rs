//! Overdue invoice detection

use crate::{Detector, EntitySnapshot};
use pulse_domain::identity::resolve_invoice_identity;
use pulse_domain::traits::CandidateIssue;
use pulse_domain::{Evidence, IssueKey, SourceSystem};
use serde_json::json;

/// Detector kind slug for overdue invoices
pub const OVERDUE_INVOICE: &str = "overdue_invoice";

/// Underlying issue key for an overdue invoice
///
/// Keyed on the invoice's immutable internal id; the display number never
/// participates.
pub fn overdue_invoice_key(entity_id: &str, invoice_record_id: &str) -> IssueKey {
    IssueKey::new(OVERDUE_INVOICE, entity_id, invoice_record_id)
}

/// Flags unpaid invoices past their due timestamp
pub struct OverdueInvoiceDetector;

impl Detector for OverdueInvoiceDetector {
    fn kind(&self) -> &'static str {
        OVERDUE_INVOICE
    }

    fn source(&self) -> SourceSystem {
        SourceSystem::Invoicing
    }

    fn evaluate(&self, snapshot: &EntitySnapshot) -> Vec<CandidateIssue> {
        if !snapshot.entity.active {
            return Vec::new();
        }

        snapshot
            .invoices
            .iter()
            .filter(|invoice| invoice.is_overdue(&snapshot.now))
            .map(|invoice| {
                tracing::debug!(
                    entity = %snapshot.entity.id,
                    invoice = %invoice.record_id,
                    "overdue invoice detected"
                );
                CandidateIssue {
                    key: overdue_invoice_key(&snapshot.entity.id, &invoice.record_id),
                    entity_id: snapshot.entity.id.clone(),
                    subject_identity: resolve_invoice_identity(invoice),
                    evidence: Evidence::new(
                        SourceSystem::Invoicing,
                        invoice.record_id.clone(),
                        snapshot.now.clone(),
                    )
                    .with_detail(json!({
                        "invoice_number": invoice.number,
                        "due_at": invoice.due_at,
                    })),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_domain::{Entity, Invoice};

    const NOW: &str = "2026-02-08T11:00:00.000Z";

    fn snapshot(invoices: Vec<Invoice>) -> EntitySnapshot {
        let mut snapshot = EntitySnapshot::bare(Entity::new("client-1", "Acme"), NOW);
        snapshot.invoices = invoices;
        snapshot
    }

    fn invoice(record_id: &str, due_at: &str, paid: bool) -> Invoice {
        Invoice {
            record_id: record_id.to_string(),
            number: "INV-0042".to_string(),
            entity_id: "client-1".to_string(),
            due_at: Some(due_at.to_string()),
            paid,
        }
    }

    #[test]
    fn test_overdue_unpaid_invoice_detected() {
        let detector = OverdueInvoiceDetector;
        let snapshot = snapshot(vec![invoice("rec_9f3", "2026-02-01T00:00:00.000Z", false)]);

        let candidates = detector.evaluate(&snapshot);
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].key,
            overdue_invoice_key("client-1", "rec_9f3")
        );
        assert_eq!(candidates[0].subject_identity.source_id, "rec_9f3");
        // Invoicing evidence carries no url
        assert!(candidates[0].evidence.url.is_none());
    }

    #[test]
    fn test_paid_and_future_invoices_skipped() {
        let detector = OverdueInvoiceDetector;
        let snapshot = snapshot(vec![
            invoice("rec_paid", "2026-02-01T00:00:00.000Z", true),
            invoice("rec_future", "2026-03-01T00:00:00.000Z", false),
        ]);

        assert!(detector.evaluate(&snapshot).is_empty());
    }

    #[test]
    fn test_idempotent_evaluation() {
        let detector = OverdueInvoiceDetector;
        let snapshot = snapshot(vec![invoice("rec_9f3", "2026-02-01T00:00:00.000Z", false)]);

        let first = detector.evaluate(&snapshot);
        let second = detector.evaluate(&snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn test_inactive_entity_skipped() {
        let detector = OverdueInvoiceDetector;
        let mut snapshot = snapshot(vec![invoice("rec_9f3", "2026-02-01T00:00:00.000Z", false)]);
        snapshot.entity.active = false;

        assert!(detector.evaluate(&snapshot).is_empty());
    }
}

//! Tracking engine
//!
//! Pure transformations over invoice documents. Each operation clones what it
//! changes and returns a new invoice; the input is never modified. The only
//! outside input is the injected clock.

use std::sync::Arc;

use sd_core::clock::{Clock, SystemClock};
use sd_models::amount::lenient_number;
use sd_models::{Invoice, Milestone, MilestoneData, MilestoneType, Stage, Tracking};
use serde_json::Value;
use tracing::{debug, trace};

use crate::policy::{completion_weight, stage_override};

/// Notes attached to the seed milestone of every fresh tracking log
pub const INITIAL_NOTES: &str = "Invoice created";

/// Milestone data key carrying a payment amount
pub const AMOUNT_PAID_KEY: &str = "amountPaid";

const FULL_PAYMENT_NOTES: &str = "Payment received in full";
const PARTIAL_PAYMENT_NOTES: &str = "Partial payment received";

/// Result of an operation that appends milestones
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneOutcome {
    pub invoice: Invoice,
    /// The input had no tracking and was initialized first
    pub auto_initialized: bool,
}

impl MilestoneOutcome {
    pub fn into_invoice(self) -> Invoice {
        self.invoice
    }

    /// Tracking of the returned invoice; always present after an append
    pub fn tracking(&self) -> Option<&Tracking> {
        self.invoice.tracking.as_ref()
    }
}

/// Parameters for marking an invoice's service as completed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Paid in full at completion
    pub is_paid: bool,
    pub notes: String,
    /// Partial payment taken at completion; ignored when `is_paid`
    pub amount_paid: f64,
}

impl CompletionRequest {
    pub fn unpaid() -> Self {
        Self::default()
    }

    pub fn paid() -> Self {
        Self {
            is_paid: true,
            ..Self::default()
        }
    }

    pub fn partial(amount_paid: f64) -> Self {
        Self {
            amount_paid,
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

#[derive(Clone)]
pub struct TrackingEngine {
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TrackingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingEngine").finish_non_exhaustive()
    }
}

impl Default for TrackingEngine {
    fn default() -> Self {
        Self::system()
    }
}

impl TrackingEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Engine reading the wall clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Start a fresh tracking log.
    ///
    /// Any existing tracking is discarded; use [`Self::ensure_tracking`] to
    /// keep it.
    pub fn initialize_tracking(&self, invoice: &Invoice) -> Invoice {
        if invoice.is_tracked() {
            debug!(
                invoice = %invoice.display_ref(),
                "Discarding existing tracking history"
            );
        }

        let mut updated = invoice.clone();
        updated.tracking = Some(self.fresh_tracking());
        trace!(invoice = %updated.display_ref(), "Tracking initialized");
        updated
    }

    /// Initialize only when the invoice is not tracked yet
    pub fn ensure_tracking(&self, invoice: &Invoice) -> Invoice {
        if invoice.is_tracked() {
            invoice.clone()
        } else {
            self.initialize_tracking(invoice)
        }
    }

    /// Append a milestone and recompute everything derived from the log
    pub fn add_milestone(
        &self,
        invoice: &Invoice,
        milestone_type: MilestoneType,
        notes: impl Into<String>,
        data: MilestoneData,
    ) -> MilestoneOutcome {
        let auto_initialized = !invoice.is_tracked();
        let previous = match &invoice.tracking {
            Some(tracking) => tracking.clone(),
            None => {
                debug!(
                    invoice = %invoice.display_ref(),
                    "Untracked invoice, initializing before append"
                );
                self.fresh_tracking()
            }
        };

        let now = self.clock.now();
        let paid = payment_source(invoice, &data);

        let mut milestones = previous.milestones;
        milestones.push(
            Milestone::new(milestone_type.clone(), now)
                .with_notes(notes)
                .with_data(data),
        );

        let completion_percentage = milestones
            .iter()
            .map(|m| completion_weight(&m.milestone_type))
            .max()
            .unwrap_or(0);

        let payment_percentage = match paid {
            Some(paid) => payment_percentage(invoice.total.lenient(), paid),
            None => previous.payment_percentage,
        };

        let current_stage = stage_override(&milestone_type).unwrap_or(previous.current_stage);

        debug!(
            invoice = %invoice.display_ref(),
            milestone = %milestone_type,
            stage = %current_stage,
            completion = completion_percentage,
            payment = payment_percentage,
            milestones = milestones.len(),
            "Milestone appended"
        );

        let mut updated = invoice.clone();
        updated.tracking = Some(Tracking {
            current_stage,
            milestones,
            completion_percentage,
            payment_percentage,
            last_updated: now,
        });

        MilestoneOutcome {
            invoice: updated,
            auto_initialized,
        }
    }

    /// Record service completion, plus a payment when one was taken.
    ///
    /// Appends `service_completed`, then `payment_received` carrying the
    /// invoice's stored total as-is when `is_paid`, or `payment_partial`
    /// when a positive partial amount is given. The returned invoice must be
    /// saved as one unit.
    pub fn mark_invoice_completed(
        &self,
        invoice: &Invoice,
        request: CompletionRequest,
    ) -> MilestoneOutcome {
        let completed = self.add_milestone(
            invoice,
            MilestoneType::ServiceCompleted,
            request.notes,
            MilestoneData::new(),
        );
        let auto_initialized = completed.auto_initialized;

        let payment = if request.is_paid {
            let mut data = MilestoneData::new();
            data.insert(AMOUNT_PAID_KEY.to_string(), invoice.total.raw().clone());
            Some((MilestoneType::PaymentReceived, FULL_PAYMENT_NOTES, data))
        } else if request.amount_paid > 0.0 {
            Some((
                MilestoneType::PaymentPartial,
                PARTIAL_PAYMENT_NOTES,
                amount_data(request.amount_paid),
            ))
        } else {
            None
        };

        match payment {
            Some((milestone_type, notes, data)) => {
                let outcome = self.add_milestone(&completed.invoice, milestone_type, notes, data);
                MilestoneOutcome {
                    invoice: outcome.invoice,
                    auto_initialized,
                }
            }
            None => completed,
        }
    }

    /// Append an `archived` milestone
    pub fn archive(&self, invoice: &Invoice, notes: impl Into<String>) -> MilestoneOutcome {
        self.add_milestone(invoice, MilestoneType::Archived, notes, MilestoneData::new())
    }

    fn fresh_tracking(&self) -> Tracking {
        let now = self.clock.now();
        Tracking {
            current_stage: Stage::Created,
            milestones: vec![Milestone::new(MilestoneType::Created, now).with_notes(INITIAL_NOTES)],
            completion_percentage: 0,
            payment_percentage: 0.0,
            last_updated: now,
        }
    }
}

/// Milestone data carrying a payment amount
pub fn amount_data(amount: f64) -> MilestoneData {
    let mut data = MilestoneData::new();
    let value = serde_json::Number::from_f64(amount).map_or(Value::Null, Value::Number);
    data.insert(AMOUNT_PAID_KEY.to_string(), value);
    data
}

/// Paid amount to measure against the total, if this append carries one.
///
/// A payment in the milestone data wins over the invoice's `paidAmount`.
/// Missing, unreadable and zero amounts all count as "no amount".
fn payment_source(invoice: &Invoice, data: &MilestoneData) -> Option<f64> {
    let from_data = data.get(AMOUNT_PAID_KEY).map(lenient_number);
    let from_invoice = invoice.paid_amount.as_ref().map(|a| a.lenient());

    from_data
        .filter(|v| *v != 0.0)
        .or_else(|| from_invoice.filter(|v| *v != 0.0))
}

/// `paid / total` as a percentage clamped to 0..=100; 0 when total is not
/// positive
pub fn payment_percentage(total: f64, paid: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (paid / total * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use sd_core::clock::ManualClock;
    use serde_json::json;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn engine() -> TrackingEngine {
        TrackingEngine::new(Arc::new(
            ManualClock::new(start()).with_step(Duration::minutes(1)),
        ))
    }

    fn data(value: Value) -> MilestoneData {
        match value {
            Value::Object(map) => map,
            _ => MilestoneData::new(),
        }
    }

    fn tracking(invoice: &Invoice) -> &Tracking {
        invoice.tracking.as_ref().expect("invoice should be tracked")
    }

    #[test]
    fn test_initialize_tracking() {
        let invoice = Invoice::new(200.0);
        let tracked = engine().initialize_tracking(&invoice);

        assert!(invoice.tracking.is_none());
        let t = tracking(&tracked);
        assert_eq!(t.current_stage, Stage::Created);
        assert_eq!(t.completion_percentage, 0);
        assert_eq!(t.payment_percentage, 0.0);
        assert_eq!(t.milestones.len(), 1);
        assert_eq!(t.milestones[0].milestone_type, MilestoneType::Created);
        assert_eq!(t.milestones[0].notes, INITIAL_NOTES);
        assert_eq!(t.last_updated, start());
    }

    #[test]
    fn test_initialize_twice_discards_history() {
        let engine = engine();
        let once = engine.initialize_tracking(&Invoice::new(100.0));
        let with_parts = engine
            .add_milestone(&once, MilestoneType::PartsAdded, "", MilestoneData::new())
            .into_invoice();
        let again = engine.initialize_tracking(&engine.initialize_tracking(&with_parts));

        let t = tracking(&again);
        assert_eq!(t.milestones.len(), 1);
        assert_eq!(t.completion_percentage, 0);
    }

    #[test]
    fn test_ensure_tracking_keeps_history() {
        let engine = engine();
        let tracked = engine
            .add_milestone(&Invoice::new(100.0), MilestoneType::PartsAdded, "", MilestoneData::new())
            .into_invoice();

        let ensured = engine.ensure_tracking(&tracked);
        assert_eq!(ensured, tracked);

        let fresh = engine.ensure_tracking(&Invoice::new(100.0));
        assert_eq!(tracking(&fresh).milestones.len(), 1);
    }

    #[test]
    fn test_add_milestone_auto_initializes() {
        let outcome = engine().add_milestone(
            &Invoice::new(100.0),
            MilestoneType::PartsAdded,
            "Brake pads",
            MilestoneData::new(),
        );

        assert!(outcome.auto_initialized);
        let t = outcome.tracking().unwrap();
        assert_eq!(t.milestones.len(), 2);
        assert_eq!(t.milestones[0].milestone_type, MilestoneType::Created);
        assert_eq!(t.milestones[1].notes, "Brake pads");
        assert_eq!(t.completion_percentage, 30);
    }

    #[test]
    fn test_add_milestone_is_append_only() {
        let engine = engine();
        let before = engine.initialize_tracking(&Invoice::new(100.0));
        let outcome = engine.add_milestone(
            &before,
            MilestoneType::CustomerApproved,
            "",
            MilestoneData::new(),
        );

        assert!(!outcome.auto_initialized);
        let old = &tracking(&before).milestones;
        let new = &outcome.tracking().unwrap().milestones;
        assert_eq!(new.len(), old.len() + 1);
        assert_eq!(&new[..old.len()], &old[..]);
        assert_eq!(tracking(&before).milestones.len(), 1);
    }

    #[test]
    fn test_completion_is_max_weight_not_latest() {
        let engine = engine();
        let mut invoice = engine.initialize_tracking(&Invoice::new(100.0));
        let mut seen = Vec::new();

        for t in [
            MilestoneType::Created,
            MilestoneType::PartsAdded,
            MilestoneType::ServiceCompleted,
            MilestoneType::CustomerApproved,
            MilestoneType::Created,
        ] {
            invoice = engine
                .add_milestone(&invoice, t, "", MilestoneData::new())
                .into_invoice();
            seen.push(tracking(&invoice).completion_percentage);
        }

        assert_eq!(seen, vec![10, 30, 60, 100, 100]);
    }

    #[test]
    fn test_stage_transitions() {
        let cases = [
            (MilestoneType::ServiceCompleted, Stage::Completed),
            (MilestoneType::PaymentReceived, Stage::Paid),
            (MilestoneType::PaymentPartial, Stage::Created),
            (MilestoneType::Archived, Stage::Archived),
            (MilestoneType::PartsAdded, Stage::Created),
            (MilestoneType::from("warranty_claim"), Stage::Created),
        ];

        let engine = engine();
        let base = engine.initialize_tracking(&Invoice::new(100.0));
        for (milestone_type, expected) in cases {
            let outcome = engine.add_milestone(&base, milestone_type.clone(), "", MilestoneData::new());
            assert_eq!(
                outcome.tracking().unwrap().current_stage,
                expected,
                "after {}",
                milestone_type
            );
        }
    }

    #[test]
    fn test_engine_does_not_guard_nonsensical_order() {
        let engine = engine();
        let archived = engine.archive(&Invoice::new(100.0), "closed").into_invoice();
        let paid = engine
            .add_milestone(&archived, MilestoneType::PaymentReceived, "", data(json!({"amountPaid": 100})))
            .into_invoice();
        assert_eq!(tracking(&paid).current_stage, Stage::Paid);
    }

    #[test]
    fn test_payment_percentage_clamps() {
        let outcome = engine().add_milestone(
            &Invoice::new(100.0),
            MilestoneType::PaymentPartial,
            "",
            data(json!({"amountPaid": 150})),
        );
        assert_eq!(outcome.tracking().unwrap().payment_percentage, 100.0);
    }

    #[test]
    fn test_payment_falls_back_to_paid_amount_then_previous() {
        let engine = engine();
        let invoice = Invoice::new("200").with_paid_amount("50");
        let with_paid = engine
            .add_milestone(&invoice, MilestoneType::PartsAdded, "", MilestoneData::new())
            .into_invoice();
        assert_eq!(tracking(&with_paid).payment_percentage, 25.0);

        let mut cleared = with_paid.clone();
        cleared.paid_amount = None;
        let carried = engine
            .add_milestone(&cleared, MilestoneType::CustomerApproved, "", MilestoneData::new())
            .into_invoice();
        assert_eq!(tracking(&carried).payment_percentage, 25.0);
    }

    #[test]
    fn test_data_amount_wins_over_paid_amount() {
        let invoice = Invoice::new(200.0).with_paid_amount(50.0);
        let outcome = engine().add_milestone(
            &invoice,
            MilestoneType::PaymentPartial,
            "",
            data(json!({"amountPaid": "150"})),
        );
        assert_eq!(outcome.tracking().unwrap().payment_percentage, 75.0);
    }

    #[test]
    fn test_unparseable_total_yields_zero_payment() {
        let invoice = Invoice::new("n/a").with_paid_amount(50.0);
        let outcome = engine().add_milestone(&invoice, MilestoneType::PartsAdded, "", MilestoneData::new());
        assert_eq!(outcome.tracking().unwrap().payment_percentage, 0.0);
    }

    #[test]
    fn test_mark_completed_paid_in_full() {
        let outcome = engine().mark_invoice_completed(
            &Invoice::new("200.00"),
            CompletionRequest::paid().with_notes("Picked up"),
        );

        assert!(outcome.auto_initialized);
        let t = outcome.tracking().unwrap();
        let types: Vec<_> = t.milestones.iter().map(|m| m.milestone_type.clone()).collect();
        assert_eq!(
            types,
            vec![
                MilestoneType::Created,
                MilestoneType::ServiceCompleted,
                MilestoneType::PaymentReceived,
            ]
        );
        assert_eq!(t.milestones[1].notes, "Picked up");
        assert_eq!(t.milestones[2].data[AMOUNT_PAID_KEY], json!("200.00"));
        assert_eq!(t.current_stage, Stage::Paid);
        assert_eq!(t.payment_percentage, 100.0);
        assert_eq!(t.completion_percentage, 60);
    }

    #[test]
    fn test_full_payment_keeps_numeric_total() {
        let outcome = engine().mark_invoice_completed(&Invoice::new(149.5), CompletionRequest::paid());
        let t = outcome.tracking().unwrap();
        assert_eq!(t.milestones[2].data[AMOUNT_PAID_KEY], json!(149.5));
        assert_eq!(t.payment_percentage, 100.0);
    }

    #[test]
    fn test_mark_completed_without_payment() {
        let engine = engine();
        let tracked = engine.initialize_tracking(&Invoice::new(200.0));
        let outcome = engine.mark_invoice_completed(&tracked, CompletionRequest::unpaid());

        assert!(!outcome.auto_initialized);
        let t = outcome.tracking().unwrap();
        assert_eq!(t.milestones.len(), 2);
        assert_eq!(t.current_stage, Stage::Completed);
    }

    #[test]
    fn test_mark_completed_ignores_non_positive_partial() {
        let engine = engine();
        let tracked = engine.initialize_tracking(&Invoice::new(200.0));
        let outcome = engine.mark_invoice_completed(&tracked, CompletionRequest::partial(-10.0));
        assert_eq!(outcome.tracking().unwrap().milestones.len(), 2);
    }

    #[test]
    fn test_last_updated_follows_clock() {
        let engine = engine();
        let tracked = engine.initialize_tracking(&Invoice::new(100.0));
        let next = engine
            .add_milestone(&tracked, MilestoneType::PartsAdded, "", MilestoneData::new())
            .into_invoice();

        let t = tracking(&next);
        assert_eq!(t.last_updated, start() + Duration::minutes(1));
        assert_eq!(t.milestones[1].timestamp, t.last_updated);
    }

    #[test]
    fn test_payment_percentage_fn() {
        assert_eq!(payment_percentage(200.0, 80.0), 40.0);
        assert_eq!(payment_percentage(0.0, 80.0), 0.0);
        assert_eq!(payment_percentage(100.0, -20.0), 0.0);
        assert_eq!(payment_percentage(100.0, 1000.0), 100.0);
    }
}

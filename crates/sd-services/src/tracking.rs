//! Invoice tracking service
//!
//! Load, transform, write back. Every operation saves the complete document
//! returned by the engine so the milestones appended by one call are stored
//! together.

use std::sync::Arc;

use sd_contracts::{Contract, InvoiceAmountContract, MilestoneContract, MilestoneInput};
use sd_core::config::{ReinitPolicy, TrackingConfig};
use sd_core::error::ValidationErrors;
use sd_core::result::{SdResult, ServiceResult};
use sd_models::{Invoice, MilestoneData, MilestoneType};
use sd_tracking::{
    tracking_status, tracking_summary, CompletionRequest, MilestoneOutcome, TrackingEngine,
    TrackingStatus, TrackingSummary,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::store::InvoiceStore;

/// A milestone to append
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneParams {
    pub milestone_type: MilestoneType,
    pub notes: String,
    pub data: MilestoneData,
}

impl MilestoneParams {
    pub fn new(milestone_type: MilestoneType) -> Self {
        Self {
            milestone_type,
            notes: String::new(),
            data: MilestoneData::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl MilestoneInput for MilestoneParams {
    fn milestone_type(&self) -> &MilestoneType {
        &self.milestone_type
    }

    fn data(&self) -> &MilestoneData {
        &self.data
    }
}

pub struct InvoiceTrackingService {
    store: Arc<dyn InvoiceStore>,
    engine: TrackingEngine,
    config: TrackingConfig,
}

impl InvoiceTrackingService {
    pub fn new(store: Arc<dyn InvoiceStore>, engine: TrackingEngine, config: TrackingConfig) -> Self {
        Self {
            store,
            engine,
            config,
        }
    }

    pub fn engine(&self) -> &TrackingEngine {
        &self.engine
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Start tracking an invoice.
    ///
    /// Under `ReinitPolicy::Preserve` an already-tracked invoice is returned
    /// as stored.
    pub async fn initialize(&self, id: &str) -> ServiceResult<Invoice> {
        let invoice = match self.load_checked(id).await {
            Ok(invoice) => invoice,
            Err(result) => return result,
        };

        let updated = match (invoice.is_tracked(), self.config.reinit_policy) {
            (true, ReinitPolicy::Preserve) => {
                info!(invoice = %id, "Invoice already tracked, keeping history");
                return ServiceResult::success(invoice);
            }
            (true, ReinitPolicy::Reset) => {
                warn!(
                    invoice = %id,
                    milestones = invoice.tracking.as_ref().map_or(0, |t| t.milestones.len()),
                    "Resetting tracking history"
                );
                self.engine.initialize_tracking(&invoice)
            }
            (false, _) => self.engine.initialize_tracking(&invoice),
        };

        self.persist(updated).await.into()
    }

    /// Append one milestone
    pub async fn add_milestone(
        &self,
        id: &str,
        params: MilestoneParams,
    ) -> ServiceResult<MilestoneOutcome> {
        if self.config.strict_amounts {
            if let Err(errors) = MilestoneContract::new().validate(&params) {
                return ServiceResult::failure(errors);
            }
        }

        let invoice = match self.load_checked(id).await {
            Ok(invoice) => invoice,
            Err(result) => return result,
        };

        let outcome =
            self.engine
                .add_milestone(&invoice, params.milestone_type, params.notes, params.data);
        self.persist_outcome(outcome).await
    }

    /// Record service completion and any payment taken with it
    pub async fn mark_completed(
        &self,
        id: &str,
        request: CompletionRequest,
    ) -> ServiceResult<MilestoneOutcome> {
        if self.config.strict_amounts {
            let mut errors = ValidationErrors::new();
            let amount = serde_json::Number::from_f64(request.amount_paid)
                .map_or(Value::String(request.amount_paid.to_string()), Value::Number);
            MilestoneContract::new().validate_amount_paid(Some(&amount), &mut errors);
            if let Err(errors) = errors.into_result() {
                return ServiceResult::failure(errors);
            }
        }

        let invoice = match self.load_checked(id).await {
            Ok(invoice) => invoice,
            Err(result) => return result,
        };

        let outcome = self.engine.mark_invoice_completed(&invoice, request);
        self.persist_outcome(outcome).await
    }

    /// Append an `archived` milestone
    pub async fn archive(&self, id: &str, notes: impl Into<String>) -> ServiceResult<MilestoneOutcome> {
        self.add_milestone(id, MilestoneParams::new(MilestoneType::Archived).with_notes(notes))
            .await
    }

    /// `None` inside a success when the invoice is not tracked
    pub async fn summary(&self, id: &str) -> ServiceResult<Option<TrackingSummary>> {
        self.store.load(id).await.map(|i| tracking_summary(&i)).into()
    }

    pub async fn status(&self, id: &str) -> ServiceResult<TrackingStatus> {
        self.store.load(id).await.map(|i| tracking_status(&i)).into()
    }

    /// Load an invoice, running the amount contract in strict mode
    async fn load_checked<T>(&self, id: &str) -> Result<Invoice, ServiceResult<T>> {
        let invoice = self.store.load(id).await.map_err(ServiceResult::from_error)?;

        if self.config.strict_amounts {
            InvoiceAmountContract::new()
                .validate(&invoice)
                .map_err(ServiceResult::failure)?;
        }

        Ok(invoice)
    }

    async fn persist(&self, mut invoice: Invoice) -> SdResult<Invoice> {
        if let Some(tracking) = &invoice.tracking {
            invoice.updated_at = Some(tracking.last_updated);
            let first = tracking
                .milestones
                .first()
                .map_or(tracking.last_updated, |m| m.timestamp);
            invoice.created_at.get_or_insert(first);
        }

        let saved = self.store.save(&invoice, self.config.write_policy).await;
        match &saved {
            Ok(saved) => info!(
                invoice = %saved.display_ref(),
                lock_version = saved.lock_version,
                stage = %saved.tracking.as_ref().map_or("untracked", |t| t.current_stage.as_str()),
                "Invoice tracking saved"
            ),
            Err(e) => warn!(invoice = %invoice.display_ref(), error = %e, "Failed to save invoice"),
        }
        saved
    }

    async fn persist_outcome(&self, outcome: MilestoneOutcome) -> ServiceResult<MilestoneOutcome> {
        let auto_initialized = outcome.auto_initialized;
        self.persist(outcome.invoice)
            .await
            .map(|invoice| MilestoneOutcome {
                invoice,
                auto_initialized,
            })
            .into()
    }
}

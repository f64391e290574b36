//! Milestone contract

use sd_core::error::ValidationErrors;
use sd_models::{Milestone, MilestoneData, MilestoneType};
use serde_json::Value;

use crate::base::{Contract, ValidationResult};

/// Data key carrying a payment amount
pub const AMOUNT_PAID_KEY: &str = "amountPaid";

/// Milestone data for validation
pub trait MilestoneInput: Send + Sync {
    fn milestone_type(&self) -> &MilestoneType;
    fn data(&self) -> &MilestoneData;
}

impl MilestoneInput for Milestone {
    fn milestone_type(&self) -> &MilestoneType {
        &self.milestone_type
    }

    fn data(&self) -> &MilestoneData {
        &self.data
    }
}

/// Rejects milestone types this build does not know and unreadable payment
/// amounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct MilestoneContract;

impl MilestoneContract {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_type(&self, milestone_type: &MilestoneType, errors: &mut ValidationErrors) {
        if !milestone_type.is_known() {
            errors.add("milestone_type", "is not included in the list");
        }
    }

    /// `amountPaid`, when present, must be a finite, non-negative number
    pub fn validate_amount_paid(&self, amount: Option<&Value>, errors: &mut ValidationErrors) {
        let Some(amount) = amount.filter(|v| !v.is_null()) else {
            return;
        };
        match sd_models::amount::strict_number(amount) {
            None => errors.add("amount_paid", "is not a number"),
            Some(v) if v < 0.0 => {
                errors.add("amount_paid", "must be greater than or equal to 0")
            }
            Some(_) => {}
        }
    }
}

impl<T: MilestoneInput> Contract<T> for MilestoneContract {
    fn validate(&self, input: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_type(input.milestone_type(), &mut errors);
        self.validate_amount_paid(input.data().get(AMOUNT_PAID_KEY), &mut errors);

        errors.into_result()
    }
}

//! Invoice amount contract
//!
//! The engine reads `total` and `paidAmount` leniently (anything unreadable
//! counts as 0). This contract rejects such values up front.

use sd_core::error::ValidationErrors;
use sd_models::{Amount, Invoice};
use validator::Validate;

use crate::base::{Contract, ValidationResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct InvoiceAmountContract;

impl InvoiceAmountContract {
    pub fn new() -> Self {
        Self
    }

    /// `total` must be a finite, non-negative number
    pub fn validate_total(&self, total: &Amount, errors: &mut ValidationErrors) {
        if total.is_missing() {
            errors.add("total", "can't be blank");
            return;
        }
        match total.strict() {
            None => errors.add("total", "is not a number"),
            Some(v) if v < 0.0 => errors.add("total", "must be greater than or equal to 0"),
            Some(_) => {}
        }
    }

    /// `paidAmount`, when present, must be a finite, non-negative number
    pub fn validate_paid_amount(&self, paid: Option<&Amount>, errors: &mut ValidationErrors) {
        let Some(paid) = paid.filter(|p| !p.is_missing()) else {
            return;
        };
        match paid.strict() {
            None => errors.add("paid_amount", "is not a number"),
            Some(v) if v < 0.0 => {
                errors.add("paid_amount", "must be greater than or equal to 0")
            }
            Some(_) => {}
        }
    }
}

impl Contract<Invoice> for InvoiceAmountContract {
    fn validate(&self, invoice: &Invoice) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_total(&invoice.total, &mut errors);
        self.validate_paid_amount(invoice.paid_amount.as_ref(), &mut errors);

        if let Err(field_errors) = invoice.validate() {
            for (field, messages) in field_errors.field_errors() {
                for message in messages {
                    errors.add(field.to_string(), message.code.to_string());
                }
            }
        }

        errors.into_result()
    }
}

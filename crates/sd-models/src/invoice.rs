//! Invoice document
//!
//! Only the fields the tracking engine reads are typed; everything else the
//! dashboard stores on an invoice (customer, vehicle, line items, ...) is kept
//! in `extra` and written back untouched.

use chrono::{DateTime, Utc};
use sd_core::traits::{Entity, Identifiable, Lockable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::amount::Amount;
use crate::tracking::Tracking;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub invoice_number: Option<String>,

    /// Amount owed
    #[serde(default)]
    pub total: Amount,

    /// Cumulative amount paid so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Amount>,

    /// Absent until tracking is initialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,

    /// Bumped by stores on every successful save
    #[serde(default)]
    pub lock_version: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Remaining document fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    pub fn new(total: impl Into<Amount>) -> Self {
        Self {
            total: total.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    pub fn with_paid_amount(mut self, paid: impl Into<Amount>) -> Self {
        self.paid_amount = Some(paid.into());
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.tracking.is_some()
    }

    /// Label for log lines: the id, the invoice number, or "<new>"
    pub fn display_ref(&self) -> &str {
        self.id
            .as_deref()
            .or(self.invoice_number.as_deref())
            .unwrap_or("<new>")
    }
}

impl Identifiable for Invoice {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Lockable for Invoice {
    fn lock_version(&self) -> i32 {
        self.lock_version
    }
}

impl Entity for Invoice {
    const TYPE_NAME: &'static str = "Invoice";
}

//! Invoice document storage
//!
//! Stores hold whole invoice documents. Saves replace the stored document;
//! under `WritePolicy::Optimistic` a save whose lock version differs from the
//! stored one is refused with `SdError::Conflict`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use sd_core::config::WritePolicy;
use sd_core::error::SdError;
use sd_core::result::SdResult;
use sd_models::{Entity, Identifiable, Invoice, Lockable};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Load an invoice by id
    async fn load(&self, id: &str) -> SdResult<Invoice>;

    /// Replace the stored document; returns what was stored
    async fn save(&self, invoice: &Invoice, policy: WritePolicy) -> SdResult<Invoice>;

    /// All stored invoices, ordered by id
    async fn list(&self) -> SdResult<Vec<Invoice>>;
}

/// Lock version the next write of `incoming` should carry.
///
/// Under `WritePolicy::Optimistic` the incoming version must match the stored one.
pub(crate) fn next_lock_version<E: Entity>(
    incoming: &E,
    stored: Option<&E>,
    policy: WritePolicy,
) -> SdResult<i32> {
    let base = match (stored, policy) {
        (Some(current), WritePolicy::Optimistic)
            if current.lock_version() != incoming.lock_version() =>
        {
            return Err(SdError::conflict(format!(
                "{} {} was modified concurrently (lock version {} is stale, stored is {})",
                E::TYPE_NAME,
                current.id().unwrap_or("<new>"),
                incoming.lock_version(),
                current.lock_version()
            )));
        }
        (Some(current), _) => current.lock_version().max(incoming.lock_version()),
        (None, _) => incoming.lock_version(),
    };
    Ok(base + 1)
}

/// Decide what to write over `stored`.
///
/// Assigns an id to new documents and bumps the lock version.
pub(crate) fn prepare_save(
    invoice: &Invoice,
    stored: Option<&Invoice>,
    policy: WritePolicy,
) -> SdResult<Invoice> {
    let lock_version = next_lock_version(invoice, stored, policy)?;

    let mut next = invoice.clone();
    if next.is_new_record() {
        next.id = Some(uuid::Uuid::new_v4().to_string());
    }
    next.lock_version = lock_version;
    Ok(next)
}

/// In-memory invoice store
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    invoices: RwLock<BTreeMap<String, Invoice>>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with documents, keyed by their ids
    pub fn with_invoices(invoices: impl IntoIterator<Item = Invoice>) -> Self {
        let store = Self::new();
        {
            let mut map = store.invoices.write();
            for invoice in invoices {
                let id = invoice
                    .id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                let mut invoice = invoice;
                invoice.id = Some(id.clone());
                map.insert(id, invoice);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.invoices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.read().is_empty()
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn load(&self, id: &str) -> SdResult<Invoice> {
        self.invoices
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SdError::not_found(Invoice::TYPE_NAME, id))
    }

    async fn save(&self, invoice: &Invoice, policy: WritePolicy) -> SdResult<Invoice> {
        let mut invoices = self.invoices.write();
        let stored = invoice.id().and_then(|id| invoices.get(id));
        let next = prepare_save(invoice, stored, policy)?;

        let id = next.id.clone().unwrap_or_default();
        invoices.insert(id, next.clone());
        Ok(next)
    }

    async fn list(&self) -> SdResult<Vec<Invoice>> {
        Ok(self.invoices.read().values().cloned().collect())
    }
}

//! Directory-backed invoice store
//!
//! One pretty-printed `<id>.json` document per invoice. Writes go to a
//! temporary file first and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sd_core::config::WritePolicy;
use sd_core::error::{SdError, ValidationErrors};
use sd_core::result::SdResult;
use sd_models::{Entity, Identifiable, Invoice};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::store::{prepare_save, InvoiceStore};

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes read-check-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> SdResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            let mut errors = ValidationErrors::new();
            errors.add("id", "may only contain letters, digits, '-' and '_'");
            return Err(SdError::Validation(errors));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read_optional(&self, id: &str) -> SdResult<Option<Invoice>> {
        let path = self.path_for(id)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut invoice: Invoice = serde_json::from_str(&contents)?;
        if invoice.id.is_none() {
            invoice.id = Some(id.to_string());
        }
        Ok(Some(invoice))
    }
}

/// Write `body` to `tmp` and rename it over `path`. A failed attempt leaves no `tmp` behind.
async fn replace_file(tmp: &Path, path: &Path, body: Vec<u8>) -> std::io::Result<()> {
    let written = match tokio::fs::write(tmp, body).await {
        Ok(()) => tokio::fs::rename(tmp, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        if let Err(cleanup) = tokio::fs::remove_file(tmp).await {
            if cleanup.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "Could not remove temporary file");
            }
        }
    }
    written
}

#[async_trait]
impl InvoiceStore for JsonFileStore {
    async fn load(&self, id: &str) -> SdResult<Invoice> {
        self.read_optional(id)
            .await?
            .ok_or_else(|| SdError::not_found(Invoice::TYPE_NAME, id))
    }

    async fn save(&self, invoice: &Invoice, policy: WritePolicy) -> SdResult<Invoice> {
        let _guard = self.write_lock.lock().await;

        let stored = match invoice.id() {
            Some(id) => self.read_optional(id).await?,
            None => None,
        };
        let next = prepare_save(invoice, stored.as_ref(), policy)?;
        let id = next.id.as_deref().unwrap_or_default();
        let path = self.path_for(id)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&next)?;
        replace_file(&tmp, &path, body).await?;

        debug!(invoice = %id, lock_version = next.lock_version, path = %path.display(), "Invoice saved");
        Ok(next)
    }

    async fn list(&self) -> SdResult<Vec<Invoice>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut invoices = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read_optional(id).await {
                Ok(Some(invoice)) => invoices.push(invoice),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable invoice"),
            }
        }

        invoices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(invoices)
    }
}

//! Core traits shared by models and stores

/// Trait for documents that have an identifier once stored
pub trait Identifiable {
    fn id(&self) -> Option<&str>;
    fn is_new_record(&self) -> bool {
        self.id().is_none()
    }
}

/// Trait for lockable entities (optimistic locking)
pub trait Lockable {
    fn lock_version(&self) -> i32;
}

/// Base trait for stored documents
pub trait Entity: Identifiable + Lockable + Send + Sync {
    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;
}

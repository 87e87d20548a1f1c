// # Memory Schedule Store
//
// In-memory implementation of ScheduleStore.
//
// ## Use Cases
//
// - Testing
// - Embedding the registrar without touching the host
//
// ## Characteristics
//
// - Thread-safe (uses std::sync::Mutex)
// - Optionally restricted to one account, mimicking an unprivileged caller

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::Error;
use crate::traits::ScheduleStore;

/// In-memory schedule store
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    tables: Mutex<HashMap<String, String>>,
    only_owner: Option<String>,
    writes: Mutex<usize>,
}

impl MemoryScheduleStore {
    /// Create an empty store that accepts any owner
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects every owner except `owner`
    pub fn restricted_to(owner: impl Into<String>) -> Self {
        Self {
            only_owner: Some(owner.into()),
            ..Self::default()
        }
    }

    /// Seed `owner`'s table
    pub fn with_table(self, owner: impl Into<String>, table: impl Into<String>) -> Self {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(owner.into(), table.into());
        self
    }

    /// Current table of `owner`
    pub fn table(&self, owner: &str) -> Option<String> {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(owner)
            .cloned()
    }

    /// Number of successful `replace` calls
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_owner(&self, owner: &str) -> Result<(), Error> {
        match self.only_owner {
            Some(ref allowed) if allowed != owner => Err(Error::permission(format!(
                "cannot manage the schedule of '{}' as '{}'",
                owner, allowed
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn read(&self, owner: &str) -> Result<Option<String>, Error> {
        self.check_owner(owner)?;
        Ok(self.table(owner))
    }

    async fn replace(&self, owner: &str, table: &str) -> Result<(), Error> {
        self.check_owner(owner)?;
        self.tables
            .lock()
            .map_err(|e| Error::Other(format!("schedule store lock poisoned: {}", e)))?
            .insert(owner.to_string(), table.to_string());
        *self
            .writes
            .lock()
            .map_err(|e| Error::Other(format!("schedule store lock poisoned: {}", e)))? += 1;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

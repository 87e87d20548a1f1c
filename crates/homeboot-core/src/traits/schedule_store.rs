// # Schedule Store Trait
//
// Defines the interface for reading and replacing a user's recurring task
// table (a crontab).
//
// ## Purpose
//
// The store is an externally-owned resource. The registrar never edits it
// in place: it reads the whole table, computes the new table and hands it
// back to `replace`, which must install it in one step.
//
// ## Implementations
//
// - `CrontabStore`: the system `crontab` utility
// - `MemoryScheduleStore`: in-memory, for tests and dry runs

use async_trait::async_trait;

/// Trait for schedule store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Read and replace the owner's schedule
/// - ✅ Stage the new table in a temporary file before installing it
///
/// ## Forbidden Capabilities
/// - ❌ Merge or deduplicate entries (owned by `TaskRegistrar`)
/// - ❌ Partially rewrite the table
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Read the owner's full schedule
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The current table
    /// - `Ok(None)`: The owner has no table yet
    /// - `Err(Error::Permission)`: The caller may not read this owner's table
    async fn read(&self, owner: &str) -> Result<Option<String>, crate::Error>;

    /// Atomically replace the owner's full schedule
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The new table is installed
    /// - `Err(Error::Permission)`: The caller may not write this owner's table
    async fn replace(&self, owner: &str, table: &str) -> Result<(), crate::Error>;

    /// Store name (for logging)
    fn store_name(&self) -> &'static str;
}

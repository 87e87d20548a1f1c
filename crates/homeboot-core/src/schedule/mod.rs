//! Idempotent task registrar
//!
//! Inserts or replaces one recurring task in a user's schedule without ever
//! producing duplicates.
//!
//! ## Identity
//!
//! Every registration carries a stable task identifier, written as a marker
//! comment directly above the entry:
//!
//! ```text
//! # homeboot-task: duckdns-update
//! */5 * * * * /usr/local/bin/homeboot ddns-update --config /home/farmer/duckdns/duckdns.env
//! ```
//!
//! Re-registering the same identifier removes the marker and the entry below
//! it. An unmarked entry whose command is byte-equal to the new command is
//! removed too, so a hand-added copy is adopted instead of duplicated.
//! Every other line is preserved verbatim and in order.
//!
//! ## Flow
//!
//! 1. Read the owner's whole table ([`ScheduleStore::read`])
//! 2. Compute the merged table in memory
//! 3. Replace the whole table in one step ([`ScheduleStore::replace`])

pub mod crontab;
pub mod memory;

pub use crontab::CrontabStore;
pub use memory::MemoryScheduleStore;

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::validate_schedule;
use crate::error::{Error, Result};
use crate::traits::ScheduleStore;

/// Prefix of the marker comment identifying a registration
pub const TASK_MARKER_PREFIX: &str = "# homeboot-task:";

/// One recurring task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRegistration {
    /// Stable logical identifier (e.g., "duckdns-update")
    pub task_id: String,
    /// Cron expression
    pub schedule: String,
    /// Command line run by cron
    pub command: String,
}

impl TaskRegistration {
    /// Create a registration
    pub fn new(
        task_id: impl Into<String>,
        schedule: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            schedule: schedule.into(),
            command: command.into(),
        }
    }

    /// Marker comment line
    pub fn marker(&self) -> String {
        format!("{} {}", TASK_MARKER_PREFIX, self.task_id)
    }

    /// Schedule entry line
    pub fn entry(&self) -> String {
        format!("{} {}", self.schedule.trim(), self.command.trim())
    }

    /// Validate the registration
    pub fn validate(&self) -> Result<()> {
        if self.task_id.is_empty()
            || !self
                .task_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::validation(format!(
                "task id '{}' must be non-empty and use [A-Za-z0-9_-] only",
                self.task_id
            )));
        }

        validate_schedule(&self.schedule)?;

        if self.command.trim().is_empty() {
            return Err(Error::validation("task command cannot be empty"));
        }
        if self.command.contains('\n') || self.command.contains('%') {
            return Err(Error::validation(
                "task command cannot contain newlines or '%'",
            ));
        }

        Ok(())
    }
}

/// Result of a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    /// Number of prior entries removed for this task
    pub replaced: usize,
    /// Whether the stored table changed
    pub changed: bool,
}

/// Extract the command part of a schedule line
///
/// Returns `None` for blank lines, comments and environment assignments.
pub fn entry_command(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let fields = if line.starts_with('@') { 1 } else { 5 };
    let mut rest = line;
    for _ in 0..fields {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }

    let first_field = line.split_whitespace().next()?;
    if !line.starts_with('@') && first_field.contains('=') {
        return None;
    }

    (!rest.is_empty()).then_some(rest)
}

/// Merge a registration into a schedule table
///
/// Returns the new table (newline-terminated) and the number of prior
/// entries removed.
pub fn merge_registration(table: &str, registration: &TaskRegistration) -> (String, usize) {
    let marker = registration.marker();
    let command = registration.command.trim();

    let lines: Vec<&str> = table.lines().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len() + 2);
    let mut replaced = 0;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim() == marker {
            replaced += 1;
            i += 1;
            // The marked entry is the next line, unless the marker was orphaned
            if i < lines.len() && entry_command(lines[i]).is_some() {
                i += 1;
            }
            continue;
        }

        if entry_command(line) == Some(command) {
            replaced += 1;
            i += 1;
            continue;
        }

        kept.push(line);
        i += 1;
    }

    let mut out = String::with_capacity(table.len() + marker.len() + command.len() + 32);
    for line in kept {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&marker);
    out.push('\n');
    out.push_str(&registration.entry());
    out.push('\n');

    (out, replaced)
}

/// Registers recurring tasks through a [`ScheduleStore`]
pub struct TaskRegistrar {
    store: Arc<dyn ScheduleStore>,
}

impl TaskRegistrar {
    /// Create a registrar backed by `store`
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Register `registration` in `owner`'s schedule
    ///
    /// # Returns
    ///
    /// - `Ok(Registered)`: Exactly one entry for the task now exists
    /// - `Err(Error::Validation)`: Malformed registration (nothing read or written)
    /// - `Err(Error::Permission)`: The caller may not manage `owner`'s schedule
    pub async fn register(
        &self,
        registration: &TaskRegistration,
        owner: &str,
    ) -> Result<Registered> {
        registration.validate()?;

        let current = self.store.read(owner).await?.unwrap_or_default();
        let (merged, replaced) = merge_registration(&current, registration);

        if merged == current {
            debug!(
                "Task '{}' already registered for {}, schedule unchanged",
                registration.task_id, owner
            );
            return Ok(Registered {
                replaced,
                changed: false,
            });
        }

        self.store.replace(owner, &merged).await?;
        info!(
            "Registered task '{}' ({}) for {} in {} (replaced {})",
            registration.task_id,
            registration.schedule,
            owner,
            self.store.store_name(),
            replaced
        );

        Ok(Registered {
            replaced,
            changed: true,
        })
    }
}

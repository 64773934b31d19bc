//! Change history for account affiliation and identity fields.
//!
//! A mutation that changes any tracked field produces exactly one
//! [`HistoryRecord`] holding the old and new value of *every* tracked field.
//! Mutations that leave the tracked set untouched produce nothing. Store
//! adapters call [`record_transition`] inside the same transaction as the
//! account update so that the two either land together or not at all.

pub mod export;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::HistoryRecord;

pub use export::{csv_stream, ExportError, EXPORT_HEADER, UNKNOWN_LABEL};

/// The account attributes whose change is audited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFields {
    pub department_id: Option<i32>,
    pub program_id: Option<i32>,
    pub year_level: Option<String>,
    pub status: String,
    pub batch: Option<String>,
    pub role_id: i32,
}

impl TrackedFields {
    /// Names of the tracked fields that differ between `self` and `other`
    pub fn changed_fields(&self, other: &TrackedFields) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.department_id != other.department_id {
            changed.push("department");
        }
        if self.program_id != other.program_id {
            changed.push("program");
        }
        if self.year_level != other.year_level {
            changed.push("year_level");
        }
        if self.status != other.status {
            changed.push("status");
        }
        if self.batch != other.batch {
            changed.push("batch");
        }
        if self.role_id != other.role_id {
            changed.push("role");
        }
        changed
    }
}

/// Builds the history record for a transition, or `None` when no tracked field changed.
pub fn record_transition(
    account_id: &str,
    actor_id: &str,
    before: &TrackedFields,
    after: &TrackedFields,
    changed_at: DateTime<Utc>,
) -> Option<HistoryRecord> {
    if before == after {
        return None;
    }

    Some(HistoryRecord {
        id: Uuid::new_v4(),
        account_id: account_id.to_string(),
        old_department_id: before.department_id,
        new_department_id: after.department_id,
        old_program_id: before.program_id,
        new_program_id: after.program_id,
        old_year_level: before.year_level.clone(),
        new_year_level: after.year_level.clone(),
        old_status: before.status.clone(),
        new_status: after.status.clone(),
        old_batch: before.batch.clone(),
        new_batch: after.batch.clone(),
        old_role_id: before.role_id,
        new_role_id: after.role_id,
        changed_at,
        updated_by: actor_id.to_string(),
    })
}

impl HistoryRecord {
    pub fn before(&self) -> TrackedFields {
        TrackedFields {
            department_id: self.old_department_id,
            program_id: self.old_program_id,
            year_level: self.old_year_level.clone(),
            status: self.old_status.clone(),
            batch: self.old_batch.clone(),
            role_id: self.old_role_id,
        }
    }

    pub fn after(&self) -> TrackedFields {
        TrackedFields {
            department_id: self.new_department_id,
            program_id: self.new_program_id,
            year_level: self.new_year_level.clone(),
            status: self.new_status.clone(),
            batch: self.new_batch.clone(),
            role_id: self.new_role_id,
        }
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.before().changed_fields(&self.after())
    }
}

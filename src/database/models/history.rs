use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable snapshot of an account's tracked-field transition.
/// Holds old and new values for every tracked field, changed or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub account_id: String,
    pub old_department_id: Option<i32>,
    pub new_department_id: Option<i32>,
    pub old_program_id: Option<i32>,
    pub new_program_id: Option<i32>,
    pub old_year_level: Option<String>,
    pub new_year_level: Option<String>,
    pub old_status: String,
    pub new_status: String,
    pub old_batch: Option<String>,
    pub new_batch: Option<String>,
    pub old_role_id: i32,
    pub new_role_id: i32,
    pub changed_at: DateTime<Utc>,
    pub updated_by: String,
}

/// History record joined with the labels of the rows it references
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryEntry {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: HistoryRecord,
    pub account_name: Option<String>,
    pub updated_by_name: Option<String>,
    pub old_department_name: Option<String>,
    pub new_department_name: Option<String>,
    pub old_program_name: Option<String>,
    pub new_program_name: Option<String>,
    pub old_role_name: Option<String>,
    pub new_role_name: Option<String>,
}

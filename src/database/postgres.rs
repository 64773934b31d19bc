use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use futures::stream::{BoxStream, StreamExt};
use sqlx::{PgConnection, PgPool};

use crate::database::models::{Account, AccountUpdate, HistoryEntry, HistoryRecord, NewAccount, PasswordHash};
use crate::database::store::{AccountStore, AccountUpdateOutcome, HistoryStore, StoreError};
use crate::history;

const ACCOUNT_COLUMNS: &str = "id, student_number, employee_number, name, email, password_hash, \
     role_id, department_id, program_id, year_level, status, batch, photo, created_at, updated_at";

/// History rows with every weak reference resolved to its label.
/// Unresolvable references come back as NULL labels.
macro_rules! history_select {
    () => {
        r#"
        SELECT
            h.id, h.account_id,
            h.old_department_id, h.new_department_id,
            h.old_program_id, h.new_program_id,
            h.old_year_level, h.new_year_level,
            h.old_status, h.new_status,
            h.old_batch, h.new_batch,
            h.old_role_id, h.new_role_id,
            h.changed_at, h.updated_by,
            a.name AS account_name,
            u.name AS updated_by_name,
            od.name AS old_department_name,
            nd.name AS new_department_name,
            op.name AS old_program_name,
            np.name AS new_program_name,
            orl.name AS old_role_name,
            nrl.name AS new_role_name
        FROM account_history h
        LEFT JOIN accounts a ON a.id = h.account_id
        LEFT JOIN accounts u ON u.id = h.updated_by
        LEFT JOIN departments od ON od.id = h.old_department_id
        LEFT JOIN departments nd ON nd.id = h.new_department_id
        LEFT JOIN programs op ON op.id = h.old_program_id
        LEFT JOIN programs np ON np.id = h.new_program_id
        LEFT JOIN roles orl ON orl.id = h.old_role_id
        LEFT JOIN roles nrl ON nrl.id = h.new_role_id
        "#
    };
}

// Per-account changed_at is strictly increasing; id only breaks ties
// between different accounts in the export
const LIST_HISTORY_SQL: &str = concat!(history_select!(), " WHERE h.account_id = $1 ORDER BY h.changed_at DESC, h.id DESC");

const EXPORT_HISTORY_SQL: &str = concat!(history_select!(), " ORDER BY h.changed_at ASC, h.id ASC");

/// Store adapter over a Postgres pool (schema in `sql/schema.sql`)
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends one history record on the caller's connection, normally the
/// transaction holding the account row lock
async fn insert_history(conn: &mut PgConnection, record: &HistoryRecord) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO account_history (
            id, account_id,
            old_department_id, new_department_id,
            old_program_id, new_program_id,
            old_year_level, new_year_level,
            old_status, new_status,
            old_batch, new_batch,
            old_role_id, new_role_id,
            changed_at, updated_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(record.id)
    .bind(&record.account_id)
    .bind(record.old_department_id)
    .bind(record.new_department_id)
    .bind(record.old_program_id)
    .bind(record.new_program_id)
    .bind(&record.old_year_level)
    .bind(&record.new_year_level)
    .bind(&record.old_status)
    .bind(&record.new_status)
    .bind(&record.old_batch)
    .bind(&record.new_batch)
    .bind(record.old_role_id)
    .bind(record.new_role_id)
    .bind(record.changed_at)
    .bind(&record.updated_by)
    .execute(conn)
    .await?;

    Ok(())
}

#[async_trait]
impl AccountStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE id = $1 OR student_number = $1 OR employee_number = $1 LIMIT 1"
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Column unique constraints cannot see a student number reused as
        // another account's id, so check across all identifier columns too
        let mut identifiers: Vec<String> = [
            Some(account.id.clone()),
            account.student_number.clone(),
            account.employee_number.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        identifiers.sort();
        identifiers.dedup();

        // Concurrent inserts claiming the same identifier queue here until
        // the first commits, so the check below sees its row. Sorted order
        // keeps two multi-identifier inserts from deadlocking.
        for ident in &identifiers {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(ident)
                .execute(&mut *tx)
                .await?;
        }

        let taken: Option<String> = sqlx::query_scalar(
            r#"
            SELECT ident FROM unnest($1::text[]) AS ident
            WHERE EXISTS (
                SELECT 1 FROM accounts
                WHERE id = ident OR student_number = ident OR employee_number = ident
            )
            LIMIT 1
            "#,
        )
        .bind(identifiers)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(taken) = taken {
            return Err(StoreError::UniqueViolation(taken));
        }

        let now = Utc::now().trunc_subsecs(6);
        let sql = format!(
            "INSERT INTO accounts (id, student_number, employee_number, name, email, password_hash, \
             role_id, department_id, program_id, year_level, status, batch, photo, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Account>(&sql)
            .bind(&account.id)
            .bind(&account.student_number)
            .bind(&account.employee_number)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.role_id)
            .bind(account.department_id)
            .bind(account.program_id)
            .bind(&account.year_level)
            .bind(&account.status)
            .bind(&account.batch)
            .bind(&account.photo)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_account(
        &self,
        id: &str,
        actor_id: &str,
        update: &AccountUpdate,
    ) -> Result<Option<AccountUpdateOutcome>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent tracked-field changes to this account
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE");
        let Some(mut account) = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        // Database clock bumped past this account's latest record, so
        // history stays strictly ordered whichever node writes it
        let now: DateTime<Utc> = sqlx::query_scalar(
            "SELECT GREATEST(clock_timestamp(), max(changed_at) + interval '1 microsecond') \
             FROM account_history WHERE account_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let before = account.tracked();
        update.apply_to(&mut account);

        let sql = format!(
            "UPDATE accounts SET name = $2, email = $3, photo = $4, department_id = $5, program_id = $6, \
             year_level = $7, status = $8, batch = $9, role_id = $10, updated_at = $11 \
             WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.photo)
            .bind(account.department_id)
            .bind(account.program_id)
            .bind(&account.year_level)
            .bind(&account.status)
            .bind(&account.batch)
            .bind(account.role_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let history = history::record_transition(id, actor_id, &before, &account.tracked(), now);
        if let Some(record) = &history {
            insert_history(&mut *tx, record).await?;
        }

        tx.commit().await?;
        Ok(Some(AccountUpdateOutcome { account, history }))
    }

    async fn set_password_hash(&self, id: &str, hash: &PasswordHash) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn list_history(&self, account_id: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let entries = sqlx::query_as::<_, HistoryEntry>(LIST_HISTORY_SQL)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    fn export_history(&self) -> BoxStream<'_, Result<HistoryEntry, StoreError>> {
        sqlx::query_as::<_, HistoryEntry>(EXPORT_HISTORY_SQL)
            .fetch(&self.pool)
            .map(|row| row.map_err(StoreError::from))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_queries_resolve_every_label() {
        for sql in [LIST_HISTORY_SQL, EXPORT_HISTORY_SQL] {
            for label in [
                "account_name",
                "updated_by_name",
                "old_department_name",
                "new_department_name",
                "old_program_name",
                "new_program_name",
                "old_role_name",
                "new_role_name",
            ] {
                assert!(sql.contains(&format!("AS {}", label)), "{} missing from query", label);
            }
        }
        assert!(LIST_HISTORY_SQL.contains("ORDER BY h.changed_at DESC"));
    }
}

//! PgStore behaviour against a live database. Each test builds the schema
//! in a throwaway Postgres schema; without DATABASE_URL they return early.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use uuid::Uuid;

use campus_discipline_api::database::models::{AccountUpdate, NewAccount, PasswordHash, DEFAULT_STATUS};
use campus_discipline_api::database::{AccountStore, HistoryStore, PgStore, StoreError};
use campus_discipline_api::types::Role;

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

struct TestDb {
    store: PgStore,
    pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    async fn connect() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return Ok(None);
        };

        let schema = format!("discipline_test_{}", Uuid::new_v4().simple());
        let admin = PgPool::connect(&url).await?;
        admin.execute(format!("CREATE SCHEMA {}", schema).as_str()).await?;

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await?;

        pool.execute(SCHEMA_SQL).await?;
        pool.execute("INSERT INTO departments (id, name) VALUES (1, 'Engineering'), (2, 'Nursing')")
            .await?;

        Ok(Some(Self {
            store: PgStore::new(pool.clone()),
            pool,
            admin,
            schema,
        }))
    }

    async fn teardown(self) -> Result<()> {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }
}

fn student(id: &str) -> NewAccount {
    NewAccount {
        id: id.to_string(),
        student_number: None,
        employee_number: None,
        name: format!("Student {}", id),
        email: None,
        password_hash: PasswordHash::new("$2b$10$not-a-real-hash".to_string()),
        role_id: Role::Student.id(),
        department_id: None,
        program_id: None,
        year_level: None,
        status: DEFAULT_STATUS.to_string(),
        batch: None,
        photo: None,
    }
}

fn move_to(department_id: i32) -> AccountUpdate {
    AccountUpdate {
        department_id: Some(department_id),
        ..Default::default()
    }
}

#[tokio::test]
async fn failed_history_write_rolls_back_the_account_update() -> Result<()> {
    let Some(db) = TestDb::connect().await? else {
        return Ok(());
    };
    db.store.insert_account(student("S001")).await?;

    // The account UPDATE succeeds; the history INSERT after it cannot
    db.pool
        .execute("ALTER TABLE account_history ADD CONSTRAINT no_suspensions CHECK (new_status <> 'suspended')")
        .await?;

    let update = AccountUpdate {
        department_id: Some(2),
        status: Some("suspended".to_string()),
        ..Default::default()
    };
    let err = db.store.update_account("S001", "A001", &update).await.unwrap_err();
    assert!(matches!(err, StoreError::Sqlx(_)), "{:?}", err);

    let account = db.store.find_by_id("S001").await?.unwrap();
    assert_eq!(account.status, DEFAULT_STATUS);
    assert_eq!(account.department_id, None);
    assert!(db.store.list_history("S001").await?.is_empty());

    let outcome = db.store.update_account("S001", "A001", &move_to(2)).await?.unwrap();
    assert!(outcome.history.is_some());
    assert_eq!(db.store.list_history("S001").await?.len(), 1);

    db.teardown().await
}

#[tokio::test]
async fn history_stays_ordered_when_a_writer_clock_runs_ahead() -> Result<()> {
    let Some(db) = TestDb::connect().await? else {
        return Ok(());
    };
    db.store.insert_account(student("S001")).await?;

    // A record stamped by a node whose clock is an hour fast
    let skewed: DateTime<Utc> = Utc::now() + Duration::hours(1);
    sqlx::query(
        "INSERT INTO account_history (id, account_id, old_status, new_status, old_role_id, new_role_id, \
         changed_at, updated_by) VALUES ($1, 'S001', 'active', 'active', 3, 3, $2, 'A001')",
    )
    .bind(Uuid::new_v4())
    .bind(skewed)
    .execute(&db.pool)
    .await?;

    let first = db.store.update_account("S001", "A001", &move_to(1)).await?.unwrap();
    let second = db.store.update_account("S001", "A001", &move_to(2)).await?.unwrap();
    let first = first.history.unwrap();
    let second = second.history.unwrap();
    assert!(first.changed_at > skewed);
    assert!(second.changed_at > first.changed_at);

    let entries = db.store.list_history("S001").await?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].record.id, second.id);
    assert_eq!(entries[1].record.id, first.id);
    // What the update returned is exactly what was stored
    assert_eq!(entries[0].record.changed_at, second.changed_at);
    assert_eq!(entries[1].record.changed_at, first.changed_at);

    db.teardown().await
}

#[tokio::test]
async fn concurrent_inserts_cannot_share_an_identifier() -> Result<()> {
    let Some(db) = TestDb::connect().await? else {
        return Ok(());
    };

    for round in 0..10 {
        let contested = format!("X{:03}", round);
        let by_id = student(&contested);
        let mut by_number = student(&format!("Y{:03}", round));
        by_number.student_number = Some(contested.clone());

        let (a, b) = tokio::join!(db.store.insert_account(by_id), db.store.insert_account(by_number));
        match (a, b) {
            (Ok(_), Err(StoreError::UniqueViolation(taken))) | (Err(StoreError::UniqueViolation(taken)), Ok(_)) => {
                assert_eq!(taken, contested);
            }
            other => panic!("expected exactly one insert to win for {}: {:?}", contested, other),
        }

        let owners: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM accounts WHERE id = $1 OR student_number = $1 OR employee_number = $1",
        )
        .bind(&contested)
        .fetch_one(&db.pool)
        .await?;
        assert_eq!(owners, 1);
    }

    db.teardown().await
}

#[tokio::test]
async fn unknown_references_are_reported_by_column() -> Result<()> {
    let Some(db) = TestDb::connect().await? else {
        return Ok(());
    };

    let mut account = student("S001");
    account.program_id = Some(77);
    let err = db.store.insert_account(account).await.unwrap_err();
    assert!(matches!(&err, StoreError::InvalidReference(col) if col == "program_id"), "{:?}", err);

    db.store.insert_account(student("S001")).await?;
    let err = db.store.update_account("S001", "A001", &move_to(999)).await.unwrap_err();
    assert!(matches!(&err, StoreError::InvalidReference(col) if col == "department_id"), "{:?}", err);
    assert!(db.store.list_history("S001").await?.is_empty());

    db.teardown().await
}

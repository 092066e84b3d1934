use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, SqlitePool};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use onboard_core::{EmployeeRecord, Field};

/// SQLite extended result code for `UNIQUE` constraint violations.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle for reading and inserting employee records.
    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository {
            pool: self.pool.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection. Later queries fail with `PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `employees` table.
///
/// Uniqueness of `employee_id` and `email` is enforced by the table itself;
/// [`EmployeeRepository::find_conflicting`] is only a fast path for callers
/// that want to reject duplicates before attempting a write.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = "SELECT id, first_name, last_name, employee_id, email, phone_number, \
     department, date_of_joining, role, created_at FROM employees";

impl EmployeeRepository {
    /// Returns every stored employee holding either the given employee ID or email.
    pub async fn find_conflicting(
        &self,
        employee_id: &str,
        email: &str,
    ) -> Result<Vec<StoredEmployee>, EmployeeStoreError> {
        let rows = sqlx::query_as::<_, StoredEmployee>(&format!(
            "{SELECT_COLUMNS} WHERE employee_id = ? OR email = ? ORDER BY created_at"
        ))
        .bind(employee_id)
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a validated record.
    ///
    /// A record whose employee ID or email is already stored is rejected with
    /// [`EmployeeStoreError::Duplicate`], even when no pre-check was made.
    pub async fn insert(
        &self,
        record: &EmployeeRecord,
        created_at: DateTime<Utc>,
    ) -> Result<StoredEmployee, EmployeeStoreError> {
        let stored = StoredEmployee::from_record(record, created_at);

        sqlx::query(
            "INSERT INTO employees \
             (id, first_name, last_name, employee_id, email, phone_number, department, date_of_joining, role, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&stored.id)
        .bind(&stored.first_name)
        .bind(&stored.last_name)
        .bind(&stored.employee_id)
        .bind(&stored.email)
        .bind(&stored.phone_number)
        .bind(&stored.department)
        .bind(stored.date_of_joining)
        .bind(&stored.role)
        .bind(to_rfc3339(stored.created_at))
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE) {
                    let field = if db_err.message().contains("employees.email") {
                        Field::Email
                    } else {
                        Field::EmployeeId
                    };
                    debug!(stage = "storage", %field, "insert rejected by unique constraint");
                    EmployeeStoreError::Duplicate { field }
                } else {
                    EmployeeStoreError::Database(sqlx::Error::Database(db_err))
                }
            }
            other => EmployeeStoreError::Database(other),
        })?;

        Ok(stored)
    }

    /// Loads the employee with the given human-facing employee ID.
    pub async fn fetch_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<StoredEmployee>, EmployeeStoreError> {
        let row = sqlx::query_as::<_, StoredEmployee>(&format!(
            "{SELECT_COLUMNS} WHERE employee_id = ?"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Loads the employee registered with the given email.
    pub async fn fetch_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredEmployee>, EmployeeStoreError> {
        let row = sqlx::query_as::<_, StoredEmployee>(&format!("{SELECT_COLUMNS} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn count(&self) -> Result<u64, EmployeeStoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

/// Row stored in the `employees` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredEmployee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: String,
    pub email: String,
    pub phone_number: String,
    pub department: String,
    pub date_of_joining: NaiveDate,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl StoredEmployee {
    fn from_record(record: &EmployeeRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: record.first_name().to_string(),
            last_name: record.last_name().to_string(),
            employee_id: record.employee_id().to_string(),
            email: record.email().to_string(),
            phone_number: record.phone_number().to_string(),
            department: record.department().as_str().to_string(),
            date_of_joining: record.date_of_joining(),
            role: record.role().to_string(),
            created_at,
        }
    }
}

/// Errors that can occur while reading or writing employees.
#[derive(Debug, Error)]
pub enum EmployeeStoreError {
    #[error("an employee with the same {field} already exists")]
    Duplicate { field: Field },
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl EmployeeStoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

impl From<sqlx::Error> for EmployeeStoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_core::{validate, EmployeeDraft};

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:?cache=shared")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    fn record(employee_id: &str, email: &str) -> EmployeeRecord {
        let draft = EmployeeDraft {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            employee_id: employee_id.into(),
            email: email.into(),
            phone_number: "5551234567".into(),
            department: "Engineering".into(),
            date_of_joining: "2024-01-15".into(),
            role: "Engineer".into(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        validate(&draft, today).expect("fixture must be valid")
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'employees'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1, "expected employees table to be created");
    }

    #[tokio::test]
    async fn insert_makes_record_findable_by_both_keys() {
        let db = setup_db().await;
        let repo = db.employees();

        let stored = repo
            .insert(&record("E-1", "grace@example.com"), Utc::now())
            .await
            .expect("insert succeeds");
        assert_eq!(stored.department, "Engineering");

        let by_id = repo
            .fetch_by_employee_id("E-1")
            .await
            .expect("query")
            .expect("row present");
        let by_email = repo
            .fetch_by_email("grace@example.com")
            .await
            .expect("query")
            .expect("row present");
        assert_eq!(by_id.id, stored.id);
        assert_eq!(by_email.id, stored.id);
        assert_eq!(
            by_id.date_of_joining,
            NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date")
        );
    }

    #[tokio::test]
    async fn find_conflicting_matches_either_key() {
        let db = setup_db().await;
        let repo = db.employees();
        repo.insert(&record("E-1", "one@example.com"), Utc::now())
            .await
            .expect("insert one");
        repo.insert(&record("E-2", "two@example.com"), Utc::now())
            .await
            .expect("insert two");

        let none = repo
            .find_conflicting("E-3", "three@example.com")
            .await
            .expect("query");
        assert!(none.is_empty());

        let by_id = repo
            .find_conflicting("E-1", "three@example.com")
            .await
            .expect("query");
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].employee_id, "E-1");

        let both = repo
            .find_conflicting("E-1", "two@example.com")
            .await
            .expect("query");
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_employee_id_without_precheck() {
        let db = setup_db().await;
        let repo = db.employees();
        repo.insert(&record("E-1", "first@example.com"), Utc::now())
            .await
            .expect("first insert");

        let err = repo
            .insert(&record("E-1", "second@example.com"), Utc::now())
            .await
            .expect_err("duplicate id must fail");
        assert!(matches!(
            err,
            EmployeeStoreError::Duplicate {
                field: Field::EmployeeId
            }
        ));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email_without_precheck() {
        let db = setup_db().await;
        let repo = db.employees();
        repo.insert(&record("E-1", "same@example.com"), Utc::now())
            .await
            .expect("first insert");

        let err = repo
            .insert(&record("E-2", "same@example.com"), Utc::now())
            .await
            .expect_err("duplicate email must fail");
        assert!(matches!(err, EmployeeStoreError::Duplicate { field: Field::Email }));
        assert!(err.is_duplicate());
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn queries_fail_once_pool_is_closed() {
        let db = setup_db().await;
        db.close().await;

        let err = db
            .employees()
            .find_conflicting("E-1", "x@example.com")
            .await
            .expect_err("closed pool must error");
        assert!(matches!(err, EmployeeStoreError::Database(sqlx::Error::PoolClosed)));
    }

    #[tokio::test]
    async fn records_survive_reconnect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("employees.db").display()
        );

        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        db.employees()
            .insert(&record("E-9", "persist@example.com"), Utc::now())
            .await
            .expect("insert");
        db.close().await;

        let reopened = Database::connect(&url).await.expect("reconnect");
        reopened.run_migrations().await.expect("migrations are idempotent");
        let row = reopened
            .employees()
            .fetch_by_email("persist@example.com")
            .await
            .expect("query");
        assert_eq!(row.map(|row| row.employee_id), Some("E-9".to_string()));
    }
}

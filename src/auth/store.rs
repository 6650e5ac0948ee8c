//! Credential Store
//! Mission: Own user records behind a storage-agnostic seam

use crate::auth::models::{normalize_email, NewUser, UserAccount};
use crate::subscription::models::{SubscriptionState, SubscriptionStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Storage failures the callers branch on. Uniqueness and existence come from
/// the backing store's own guarantees, never from a racy pre-check.
#[derive(Debug)]
pub enum StoreError {
    /// The normalized email is already registered.
    Conflict,
    /// No account matches the given key.
    NotFound,
    /// Backend fault; details stay server-side.
    Backend(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict => write!(f, "Email already registered"),
            StoreError::NotFound => write!(f, "User not found"),
            StoreError::Backend(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Backend(e.into()),
        }
    }
}

/// Contract every credential backend must satisfy.
///
/// `create` must reject duplicate normalized emails atomically: two
/// concurrent registrations for the same address yield exactly one success
/// and one `Conflict`. `set_subscription` replaces the whole subscription
/// record and bumps `updated_at` in the same operation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserAccount>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<UserAccount, StoreError>;
    async fn set_subscription(
        &self,
        id: &Uuid,
        subscription: SubscriptionState,
    ) -> Result<UserAccount, StoreError>;
    async fn list(&self) -> Result<Vec<UserAccount>, StoreError>;
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Users table. WAL keeps readers unblocked during writes; the UNIQUE
/// constraint on email is what turns a duplicate insert into `Conflict`.
const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    display_name TEXT,
    plan_id TEXT,
    sub_status TEXT,
    sub_expires_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
"#;

const USER_COLUMNS: &str =
    "id, email, password_hash, display_name, plan_id, sub_status, sub_expires_at, created_at, updated_at";

/// SQLite-backed credential store.
///
/// One connection behind a mutex; statements are short and the guard is never
/// held across an await point.
pub struct SqliteCredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCredentialStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize user schema")?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap_or_default();
        if journal_mode.to_lowercase() != "wal" {
            warn!("WAL mode not active, journal_mode = {}", journal_mode);
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap_or(0);

        info!("🔐 User store initialized at: {} ({} accounts)", db_path, count);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize user schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<UserAccount> {
        let id = parse_column(row, 0, |s| Uuid::parse_str(s))?;
        let plan_id: Option<String> = row.get(4)?;
        let sub_status: Option<String> = row.get(5)?;
        let sub_expires_at: Option<String> = row.get(6)?;

        // Subscription columns are either all meaningful or all absent;
        // sub_status is the marker.
        let subscription = sub_status.map(|status| SubscriptionState {
            plan_id: plan_id.unwrap_or_else(|| "free".to_string()),
            status: SubscriptionStatus::from_str(&status).unwrap_or(SubscriptionStatus::None),
            expires_at: sub_expires_at.as_deref().and_then(parse_rfc3339),
        });

        Ok(UserAccount {
            id,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            display_name: row.get(3)?,
            subscription,
            created_at: parse_column(row, 7, |s| {
                parse_rfc3339(s).ok_or("invalid RFC 3339 timestamp")
            })?,
            updated_at: parse_column(row, 8, |s| {
                parse_rfc3339(s).ok_or("invalid RFC 3339 timestamp")
            })?,
        })
    }

    fn get_by_email(conn: &Connection, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE email = ?1",
            USER_COLUMNS
        ))?;

        match stmt.query_row(params![email], Self::row_to_account) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_by_id(conn: &Connection, id: &Uuid) -> Result<Option<UserAccount>, StoreError> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))?;

        match stmt.query_row(params![id.to_string()], Self::row_to_account) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let email = normalize_email(email);
        let conn = self.conn.lock();
        Self::get_by_email(&conn, &email)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserAccount>, StoreError> {
        let conn = self.conn.lock();
        Self::get_by_id(&conn, id)
    }

    async fn create(&self, new_user: NewUser) -> Result<UserAccount, StoreError> {
        let now = Utc::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            email: normalize_email(&new_user.email),
            password_hash: new_user.password_hash,
            display_name: new_user.display_name,
            subscription: None,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn.lock();

        // Single INSERT; the UNIQUE(email) constraint converts a concurrent
        // duplicate into Conflict instead of a second stored record.
        conn.execute(
            "INSERT INTO users (id, email, password_hash, display_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.display_name,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;

        info!("✅ Created account: {}", user.email);

        Ok(user)
    }

    async fn set_subscription(
        &self,
        id: &Uuid,
        subscription: SubscriptionState,
    ) -> Result<UserAccount, StoreError> {
        let now = Utc::now();
        let conn = self.conn.lock();

        // Whole-record overwrite in one statement; zero changed rows means the
        // account vanished. Readback happens under the same lock so callers
        // see the record they just wrote.
        let changed = conn.execute(
            "UPDATE users SET plan_id = ?2, sub_status = ?3, sub_expires_at = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                subscription.plan_id,
                subscription.status.as_str(),
                subscription.expires_at.map(|t| t.to_rfc3339()),
                now.to_rfc3339(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound);
        }

        Self::get_by_id(&conn, id)?.ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], Self::row_to_account)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_column<T, E, F>(row: &rusqlite::Row, idx: usize, parse: F) -> rusqlite::Result<T>
where
    E: std::fmt::Display,
    F: FnOnce(&str) -> Result<T, E>,
{
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("{}", e).into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$2b$04$fakehashfortestingonly".to_string(),
            display_name: Some("Tester".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_roundtrip() {
        let store = SqliteCredentialStore::in_memory().unwrap();

        let created = store.create(new_user("alice@example.com")).await.unwrap();
        assert_eq!(created.email, "alice@example.com");
        assert!(created.subscription.is_none());

        let found = store.find_by_email("alice@example.com").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, created.id);

        let by_id = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(by_id.unwrap().email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_lookup_normalizes_email() {
        let store = SqliteCredentialStore::in_memory().unwrap();
        store.create(new_user("  Alice@Example.COM ")).await.unwrap();

        let found = store.find_by_email("alice@example.com").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().email, "alice@example.com");

        let found_mixed = store.find_by_email("ALICE@example.com ").await.unwrap();
        assert!(found_mixed.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = SqliteCredentialStore::in_memory().unwrap();
        store.create(new_user("alice@example.com")).await.unwrap();

        let second = store.create(new_user("Alice@example.com")).await;
        assert!(matches!(second, Err(StoreError::Conflict)));

        // Exactly one record stored.
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_subscription_overwrites_and_bumps_updated_at() {
        let store = SqliteCredentialStore::in_memory().unwrap();
        let user = store.create(new_user("alice@example.com")).await.unwrap();

        let expires = Utc::now() + Duration::days(30);
        let updated = store
            .set_subscription(&user.id, SubscriptionState::active("pro", Some(expires)))
            .await
            .unwrap();

        let sub = updated.subscription.expect("subscription stored");
        assert_eq!(sub.plan_id, "pro");
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.expires_at.is_some());
        assert!(updated.updated_at >= user.updated_at);

        // Overwrite replaces the whole record.
        let cancelled = store
            .set_subscription(&user.id, SubscriptionState::cancelled("pro"))
            .await
            .unwrap();
        let sub = cancelled.subscription.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(sub.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_set_subscription_for_missing_user_is_not_found() {
        let store = SqliteCredentialStore::in_memory().unwrap();
        let result = store
            .set_subscription(&Uuid::new_v4(), SubscriptionState::active("pro", None))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let store = SqliteCredentialStore::in_memory().unwrap();
        store.create(new_user("a@example.com")).await.unwrap();
        store.create(new_user("b@example.com")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let users = store.list().await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_subscription_survives_reload() {
        let store = SqliteCredentialStore::in_memory().unwrap();
        let user = store.create(new_user("alice@example.com")).await.unwrap();
        store
            .set_subscription(&user.id, SubscriptionState::active("pro-plus", None))
            .await
            .unwrap();

        let reread = store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        let sub = reread.subscription.unwrap();
        assert_eq!(sub.plan_id, "pro-plus");
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_records_survive_store_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("users.db");
        let db_path = db_path.to_str().unwrap();

        let created_id = {
            let store = SqliteCredentialStore::new(db_path).unwrap();
            let user = store.create(new_user("alice@example.com")).await.unwrap();
            store
                .set_subscription(&user.id, SubscriptionState::active("pro", None))
                .await
                .unwrap();
            user.id
        };

        let reopened = SqliteCredentialStore::new(db_path).unwrap();
        let user = reopened
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, created_id);
        assert_eq!(user.subscription.unwrap().plan_id, "pro");
    }
}

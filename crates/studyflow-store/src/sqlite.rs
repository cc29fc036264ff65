//! SQLite-backed store.
//!
//! One connection behind a mutex, WAL mode, idempotent migrations run at
//! open time. Timestamps are stored as RFC 3339 text in UTC.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use studyflow_core::Provider;

use crate::credential::{Credential, TokenWrite};
use crate::error::{StoreError, StoreResult};
use crate::state::AuthState;
use crate::store::{CredentialStore, StateStore};

const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_init",
    "CREATE TABLE credentials (
        user_id TEXT NOT NULL,
        provider TEXT NOT NULL,
        access_token TEXT NOT NULL,
        refresh_token TEXT,
        token_expiry TEXT,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, provider)
    );
    CREATE TABLE oauth_states (
        state TEXT PRIMARY KEY,
        provider TEXT NOT NULL,
        user_id TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );",
)];

/// Shared SQLite store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and runs migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::run_migrations(&conn)?;
        info!(path = %path.display(), "credential store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory database. Used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    fn run_migrations(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )?;

        for (name, sql) in MIGRATIONS {
            let applied: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                    [name],
                    |row| row.get(0),
                )
                .unwrap_or(false);
            if !applied {
                conn.execute_batch(sql)?;
                conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
                debug!(migration = name, "applied migration");
            }
        }
        Ok(())
    }
}

fn parse_utc(text: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

impl CredentialStore for SqliteStore {
    fn get(&self, user_id: &str, provider: Provider) -> StoreResult<Option<Credential>> {
        let conn = self.conn();
        let row: Option<(String, Option<String>, Option<String>, String)> = conn
            .query_row(
                "SELECT access_token, refresh_token, token_expiry, updated_at
                 FROM credentials WHERE user_id = ?1 AND provider = ?2",
                params![user_id, provider.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((access_token, refresh_token, token_expiry, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Credential {
            user_id: user_id.to_string(),
            provider,
            access_token,
            refresh_token,
            token_expiry: token_expiry.as_deref().map(parse_utc).transpose()?,
            updated_at: parse_utc(&updated_at)?,
        }))
    }

    fn upsert(&self, user_id: &str, provider: Provider, tokens: &TokenWrite) -> StoreResult<()> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO credentials (user_id, provider, access_token, refresh_token, token_expiry, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id, provider) DO UPDATE SET
                 access_token = excluded.access_token,
                 refresh_token = COALESCE(excluded.refresh_token, credentials.refresh_token),
                 token_expiry = excluded.token_expiry,
                 updated_at = excluded.updated_at",
            params![
                user_id,
                provider.as_str(),
                tokens.access_token,
                tokens.refresh_token,
                tokens.token_expiry.map(|t| t.to_rfc3339()),
                now.to_rfc3339(),
            ],
        )?;
        debug!(user_id, provider = %provider, "credential upserted");
        Ok(())
    }

    fn update_access_token(
        &self,
        user_id: &str,
        provider: Provider,
        access_token: &str,
        token_expiry: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "UPDATE credentials
             SET access_token = ?3, token_expiry = ?4, updated_at = ?5
             WHERE user_id = ?1 AND provider = ?2",
            params![
                user_id,
                provider.as_str(),
                access_token,
                token_expiry.map(|t| t.to_rfc3339()),
                now.to_rfc3339(),
            ],
        )?;
        debug!(user_id, provider = %provider, "access token updated");
        Ok(())
    }

    fn delete(&self, user_id: &str, provider: Provider) -> StoreResult<bool> {
        let conn = self.conn();
        let deleted = conn.execute(
            "DELETE FROM credentials WHERE user_id = ?1 AND provider = ?2",
            params![user_id, provider.as_str()],
        )?;
        Ok(deleted > 0)
    }
}

impl StateStore for SqliteStore {
    fn insert_state(&self, state: &AuthState) -> StoreResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO oauth_states (state, provider, user_id, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                state.nonce,
                state.provider.as_str(),
                state.user_id,
                state.expires_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn take_state(&self, nonce: &str) -> StoreResult<Option<AuthState>> {
        let conn = self.conn();
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT provider, user_id, expires_at FROM oauth_states WHERE state = ?1",
                [nonce],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((provider, user_id, expires_at)) = row else {
            return Ok(None);
        };

        // Single use: delete before handing the row back.
        conn.execute("DELETE FROM oauth_states WHERE state = ?1", [nonce])?;

        Ok(Some(AuthState {
            nonce: nonce.to_string(),
            provider: provider.parse().map_err(StoreError::from)?,
            user_id,
            expires_at: parse_utc(&expires_at)?,
        }))
    }

    fn purge_expired_states(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let conn = self.conn();
        let purged = conn.execute(
            "DELETE FROM oauth_states WHERE expires_at <= ?1",
            [now.to_rfc3339()],
        )?;
        Ok(purged)
    }
}

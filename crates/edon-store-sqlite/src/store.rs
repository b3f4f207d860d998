// crates/edon-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Gateway Store
// Description: Durable SQLite-backed persistence for tenants, users,
// intents, credentials, audit events and the active policy preset.
// Purpose: Give the pipeline and evaluator a single transactional store
// instead of scattered in-process state, and make the strict-tenant
// credential lookup rule a property of the SQL, not of caller discipline.
// Dependencies: edon-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every row is a canonical JSON snapshot of an `edon-core` type plus the
//! handful of plain columns the store needs to index or filter on
//! (`tenant_id`, `action_id`, `decided_at`). The store never re-derives
//! domain invariants; it persists what `edon-core` already validated.
//!
//! Security posture: credential rows are write-only from the store's own
//! API surface upward — there is no `list_credentials` that returns
//! `credential_data`, only [`SqliteStore::credential_summaries`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use edon_core::Action;
use edon_core::ApiKeyRecord;
use edon_core::AuditEvent;
use edon_core::ChannelTokenRecord;
use edon_core::Credential;
use edon_core::CredentialKey;
use edon_core::CredentialSummary;
use edon_core::Decision;
use edon_core::DecisionId;
use edon_core::ExecutionOutcome;
use edon_core::IntentContract;
use edon_core::PolicyPackName;
use edon_core::Tenant;
use edon_core::TenantId;
use edon_core::TenantStatus;
use edon_core::Timestamp;
use edon_core::User;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

const SCHEMA_VERSION: i64 = 1;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Maximum size, in bytes, of a single credential's opaque data blob.
pub const MAX_CREDENTIAL_DATA_BYTES: usize = 256 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest, the default).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the SQLite-backed gateway store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Busy timeout, in milliseconds, before a locked write fails.
    pub busy_timeout_ms: u64,
    /// Synchronous pragma.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config pointing at `path` with the store's defaults.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS, sync_mode: SqliteSyncMode::Full }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// SQLite store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// I/O failure opening or preparing the store.
    #[error("store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Stored data failed to decode; the store refuses to return it.
    #[error("store data corrupt: {0}")]
    Corrupt(String),
    /// Schema version on disk is newer or otherwise unsupported.
    #[error("store schema version mismatch: {0}")]
    VersionMismatch(String),
    /// Caller-supplied data rejected before it reached SQL.
    #[error("store invalid input: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed durable store for gateway state.
///
/// # Invariants
/// - Every credential query carries an explicit `tenant_id` predicate;
///   there is no lookup path that can silently widen to another tenant.
#[derive(Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if absent) a gateway store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the database cannot be opened,
    /// migrated, or has an unsupported schema version.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            }
        }
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns the schema version this store's on-disk database was
    /// migrated to.
    #[must_use]
    pub const fn schema_version(&self) -> i64 {
        SCHEMA_VERSION
    }

    /// Runs a trivial query against the database, for `/health` liveness
    /// checks that want to confirm the connection still answers.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the connection cannot execute a query.
    pub fn ping(&self) -> Result<(), SqliteStoreError> {
        self.lock()
            .query_row("SELECT 1", [], |_row| Ok(()))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    // -- Tenants / users --------------------------------------------------

    /// Inserts or replaces a tenant row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn upsert_tenant(&self, tenant: &Tenant) -> Result<(), SqliteStoreError> {
        self.lock()
            .execute(
                "INSERT INTO tenants (tenant_id, display_name, status, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                    display_name = excluded.display_name, status = excluded.status",
                params![
                    tenant.id.to_string(),
                    tenant.display_name,
                    tenant.status.as_str(),
                    tenant.created_at.to_rfc3339()
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Loads a tenant by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn get_tenant(&self, tenant_id: TenantId) -> Result<Option<Tenant>, SqliteStoreError> {
        let row = self
            .lock()
            .query_row(
                "SELECT display_name, status, created_at FROM tenants WHERE tenant_id = ?1",
                params![tenant_id.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some((display_name, status, created_at)) = row else {
            return Ok(None);
        };
        let created_at = parse_timestamp(&created_at)?;
        Ok(Some(Tenant { id: tenant_id, display_name, status: TenantStatus::parse(&status), created_at }))
    }

    /// Inserts or replaces a user row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn upsert_user(&self, user: &User) -> Result<(), SqliteStoreError> {
        self.lock()
            .execute(
                "INSERT INTO users (user_id, tenant_id, email, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET email = excluded.email",
                params![user.id.to_string(), user.tenant_id.to_string(), user.email, user.created_at.to_rfc3339()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    // -- API keys / channel tokens ------------------------------------------

    /// Inserts or replaces an API key row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn upsert_api_key(&self, key: &ApiKeyRecord) -> Result<(), SqliteStoreError> {
        self.lock()
            .execute(
                "INSERT INTO api_keys (key_id, tenant_id, token_hash, created_at, active)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(key_id) DO UPDATE SET token_hash = excluded.token_hash, active = excluded.active",
                params![key.id.to_string(), key.tenant_id.to_string(), key.token_hash, key.created_at.to_rfc3339(), key.active],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Resolves the tenant owning an active API key with the given
    /// `token_hash`. Revoked keys never match.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn find_tenant_by_api_key_hash(&self, token_hash: &str) -> Result<Option<TenantId>, SqliteStoreError> {
        let raw: Option<String> = self
            .lock()
            .query_row(
                "SELECT tenant_id FROM api_keys WHERE token_hash = ?1 AND active = 1",
                params![token_hash],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        raw.map(|id| id.parse().map_err(|_| SqliteStoreError::Corrupt("invalid tenant_id".to_string()))).transpose()
    }

    /// Inserts or replaces a channel token row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn upsert_channel_token(&self, token: &ChannelTokenRecord) -> Result<(), SqliteStoreError> {
        self.lock()
            .execute(
                "INSERT INTO channel_tokens (token_id, tenant_id, token_hash, created_at, active)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(token_id) DO UPDATE SET token_hash = excluded.token_hash, active = excluded.active",
                params![token.id.to_string(), token.tenant_id.to_string(), token.token_hash, token.created_at.to_rfc3339(), token.active],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Resolves the tenant owning an active channel token with the given
    /// `token_hash`. Revoked tokens never match.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn find_tenant_by_channel_token_hash(&self, token_hash: &str) -> Result<Option<TenantId>, SqliteStoreError> {
        let raw: Option<String> = self
            .lock()
            .query_row(
                "SELECT tenant_id FROM channel_tokens WHERE token_hash = ?1 AND active = 1",
                params![token_hash],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        raw.map(|id| id.parse().map_err(|_| SqliteStoreError::Corrupt("invalid tenant_id".to_string()))).transpose()
    }

    // -- Intents ------------------------------------------------------------

    /// Replaces the active intent contract for `intent.tenant_id`.
    ///
    /// Exactly one contract is active per tenant at a time (spec invariant);
    /// this is an upsert keyed by `tenant_id`, not by `intent.id`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or encode failure.
    pub fn set_intent(&self, intent: &IntentContract) -> Result<(), SqliteStoreError> {
        let payload = serde_json::to_vec(intent).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        self.lock()
            .execute(
                "INSERT INTO active_intents (tenant_id, intent_json, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(tenant_id) DO UPDATE SET intent_json = excluded.intent_json, updated_at = excluded.updated_at",
                params![intent.tenant_id.to_string(), payload, intent.created_at.to_rfc3339()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Loads the active intent contract for `tenant_id`, if one was set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn get_intent(&self, tenant_id: TenantId) -> Result<Option<IntentContract>, SqliteStoreError> {
        let row: Option<Vec<u8>> = self
            .lock()
            .query_row(
                "SELECT intent_json FROM active_intents WHERE tenant_id = ?1",
                params![tenant_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        row.map(|bytes| serde_json::from_slice(&bytes).map_err(|err| SqliteStoreError::Corrupt(err.to_string())))
            .transpose()
    }

    // -- Credentials ----------------------------------------------------------

    /// Writes a credential, replacing any existing row under the same
    /// `(credential_id, tenant_id)` key.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] if the encoded credential data
    /// exceeds [`MAX_CREDENTIAL_DATA_BYTES`], or [`SqliteStoreError::Db`] on
    /// a database failure.
    pub fn set_credential(&self, credential: &Credential) -> Result<(), SqliteStoreError> {
        let data = serde_json::to_vec(&credential.data).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if data.len() > MAX_CREDENTIAL_DATA_BYTES {
            return Err(SqliteStoreError::Invalid(format!(
                "credential data exceeds {MAX_CREDENTIAL_DATA_BYTES} bytes"
            )));
        }
        let guard = self.lock();
        match &credential.key.tenant_id {
            Some(tenant_id) => {
                guard
                    .execute(
                        "INSERT INTO credentials (credential_id, tenant_id, tool, data_json, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)
                         ON CONFLICT(credential_id, tenant_id) DO UPDATE SET
                             tool = excluded.tool, data_json = excluded.data_json, updated_at = excluded.updated_at",
                        params![
                            credential.key.credential_id.to_string(),
                            tenant_id.to_string(),
                            credential.tool,
                            data,
                            credential.updated_at.to_rfc3339(),
                        ],
                    )
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            None => {
                // SQL NULL is never equal to itself, so `ON CONFLICT(credential_id,
                // tenant_id)` can't see an existing global-credential row to
                // replace it; delete then insert instead.
                guard
                    .execute(
                        "DELETE FROM credentials WHERE credential_id = ?1 AND tenant_id IS NULL",
                        params![credential.key.credential_id.to_string()],
                    )
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                guard
                    .execute(
                        "INSERT INTO credentials (credential_id, tenant_id, tool, data_json, updated_at)
                         VALUES (?1, NULL, ?2, ?3, ?4)",
                        params![credential.key.credential_id.to_string(), credential.tool, data, credential.updated_at.to_rfc3339()],
                    )
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
        }
        Ok(())
    }

    /// Loads a credential by its composite key.
    ///
    /// `key.tenant_id = Some(t)` matches only rows owned by `t`;
    /// `key.tenant_id = None` matches only the global/service-wide row for
    /// `credential_id`. Neither ever falls back to the other.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn get_credential(&self, key: &CredentialKey) -> Result<Option<Credential>, SqliteStoreError> {
        let guard = self.lock();
        let row = match &key.tenant_id {
            Some(tenant_id) => guard
                .query_row(
                    "SELECT tool, data_json, updated_at FROM credentials
                     WHERE credential_id = ?1 AND tenant_id = ?2",
                    params![key.credential_id.to_string(), tenant_id.to_string()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?, row.get::<_, String>(2)?)),
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?,
            None => guard
                .query_row(
                    "SELECT tool, data_json, updated_at FROM credentials
                     WHERE credential_id = ?1 AND tenant_id IS NULL",
                    params![key.credential_id.to_string()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?, row.get::<_, String>(2)?)),
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?,
        };
        let Some((tool, data_bytes, updated_at)) = row else {
            return Ok(None);
        };
        let data = serde_json::from_slice(&data_bytes).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
        let updated_at = parse_timestamp(&updated_at)?;
        Ok(Some(Credential { key: key.clone(), tool, data, updated_at }))
    }

    /// Deletes a credential by its composite key. A no-op if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn delete_credential(&self, key: &CredentialKey) -> Result<(), SqliteStoreError> {
        let guard = self.lock();
        match &key.tenant_id {
            Some(tenant_id) => guard
                .execute(
                    "DELETE FROM credentials WHERE credential_id = ?1 AND tenant_id = ?2",
                    params![key.credential_id.to_string(), tenant_id.to_string()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?,
            None => guard
                .execute(
                    "DELETE FROM credentials WHERE credential_id = ?1 AND tenant_id IS NULL",
                    params![key.credential_id.to_string()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?,
        };
        Ok(())
    }

    /// Lists credential summaries (never the opaque data) for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn credential_summaries(&self, tenant_id: TenantId) -> Result<Vec<CredentialSummary>, SqliteStoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare("SELECT credential_id, tool, updated_at FROM credentials WHERE tenant_id = ?1 ORDER BY credential_id")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![tenant_id.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut summaries = Vec::new();
        for row in rows {
            let (credential_id, tool, updated_at) = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            summaries.push(CredentialSummary {
                credential_id: credential_id.into(),
                tool,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }
        Ok(summaries)
    }

    // -- Audit / decisions ------------------------------------------------------

    /// Upserts an audit event, keyed by `decision_id`. Exactly one row
    /// exists per `decision_id` after this call (spec invariant 4).
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or encode failure.
    pub fn record_audit_event(&self, event: &AuditEvent) -> Result<(), SqliteStoreError> {
        let action_json = serde_json::to_vec(&event.action).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let decision_json = serde_json::to_vec(&event.decision).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let execution_json = serde_json::to_vec(&event.execution).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        self.lock()
            .execute(
                "INSERT INTO audit_events (
                    decision_id, tenant_id, agent_id, action_id, action_json,
                    decision_json, execution_json, decided_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(decision_id) DO UPDATE SET
                     decision_json = excluded.decision_json,
                     execution_json = excluded.execution_json",
                params![
                    event.decision_id.to_string(),
                    event.tenant_id.to_string(),
                    event.agent_id.as_ref().map(std::string::ToString::to_string),
                    event.action.id.to_string(),
                    action_json,
                    decision_json,
                    execution_json,
                    event.decided_at.to_rfc3339(),
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Loads a single audit event by its decision id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn get_audit_event(&self, decision_id: &DecisionId) -> Result<Option<AuditEvent>, SqliteStoreError> {
        let row = self
            .lock()
            .query_row(
                "SELECT tenant_id, agent_id, action_json, decision_json, execution_json, decided_at
                 FROM audit_events WHERE decision_id = ?1",
                params![decision_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some((tenant_id, agent_id, action_bytes, decision_bytes, execution_bytes, decided_at)) = row else {
            return Ok(None);
        };
        decode_audit_event(tenant_id, agent_id, &action_bytes, &decision_bytes, &execution_bytes, &decided_at)
    }

    /// Queries audit events for `tenant_id`, optionally narrowed to a
    /// single `action_id`, newest first, capped at `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn query_audit_events(
        &self,
        tenant_id: TenantId,
        action_id_filter: Option<&str>,
        limit: u32,
    ) -> Result<Vec<AuditEvent>, SqliteStoreError> {
        let guard = self.lock();
        let limit = i64::from(limit.min(1000));
        let mut statement = guard
            .prepare(
                "SELECT tenant_id, agent_id, action_json, decision_json, execution_json, decided_at
                 FROM audit_events
                 WHERE tenant_id = ?1 AND (?2 IS NULL OR action_id = ?2)
                 ORDER BY decided_at DESC, rowid DESC
                 LIMIT ?3",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![tenant_id.to_string(), action_id_filter, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut events = Vec::new();
        for row in rows {
            let (tenant_id, agent_id, action_bytes, decision_bytes, execution_bytes, decided_at) =
                row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if let Some(event) =
                decode_audit_event(tenant_id, agent_id, &action_bytes, &decision_bytes, &execution_bytes, &decided_at)?
            {
                events.push(event);
            }
        }
        Ok(events)
    }

    // -- Active policy preset -----------------------------------------------

    /// Records which named policy pack is active for `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn set_active_policy_preset(&self, tenant_id: TenantId, preset: PolicyPackName) -> Result<(), SqliteStoreError> {
        self.lock()
            .execute(
                "INSERT INTO active_policy_preset (tenant_id, preset_name)
                 VALUES (?1, ?2)
                 ON CONFLICT(tenant_id) DO UPDATE SET preset_name = excluded.preset_name",
                params![tenant_id.to_string(), preset.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Returns the active named policy pack for `tenant_id`, if any was set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database or decode failure.
    pub fn get_active_policy_preset(&self, tenant_id: TenantId) -> Result<Option<PolicyPackName>, SqliteStoreError> {
        let raw: Option<String> = self
            .lock()
            .query_row(
                "SELECT preset_name FROM active_policy_preset WHERE tenant_id = ?1",
                params![tenant_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        raw.map(|name| PolicyPackName::parse(&name).ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown preset name: {name}"))))
            .transpose()
    }

    // -- Rate limit counters -------------------------------------------------

    /// Increments the counter for `(subject, window, bucket_key)` and
    /// returns its new value. Concurrent increments serialize through the
    /// same connection mutex, so no update is lost.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn increment_rate_limit_counter(&self, subject: &str, window: &str, bucket_key: &str, updated_at: Timestamp) -> Result<u32, SqliteStoreError> {
        let guard = self.lock();
        guard
            .execute(
                "INSERT INTO rate_limit_counters (subject, window, bucket_key, value, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT(subject, window, bucket_key) DO UPDATE SET
                     value = value + 1, updated_at = excluded.updated_at",
                params![subject, window, bucket_key, updated_at.to_rfc3339()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let value: i64 = guard
            .query_row(
                "SELECT value FROM rate_limit_counters WHERE subject = ?1 AND window = ?2 AND bucket_key = ?3",
                params![subject, window, bucket_key],
                |row| row.get(0),
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(u32::try_from(value).unwrap_or(u32::MAX))
    }

    /// Reads the current counter value for `(subject, window, bucket_key)`
    /// without incrementing it. Returns 0 if no bucket has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on a database failure.
    pub fn read_rate_limit_counter(&self, subject: &str, window: &str, bucket_key: &str) -> Result<u32, SqliteStoreError> {
        let value: Option<i64> = self
            .lock()
            .query_row(
                "SELECT value FROM rate_limit_counters WHERE subject = ?1 AND window = ?2 AND bucket_key = ?3",
                params![subject, window, bucket_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(u32::try_from(value.unwrap_or(0)).unwrap_or(u32::MAX))
    }
}

fn decode_audit_event(
    tenant_id: String,
    agent_id: Option<String>,
    action_bytes: &[u8],
    decision_bytes: &[u8],
    execution_bytes: &[u8],
    decided_at: &str,
) -> Result<Option<AuditEvent>, SqliteStoreError> {
    let tenant_id: TenantId = tenant_id.parse().map_err(|_| SqliteStoreError::Corrupt("invalid tenant_id".to_string()))?;
    let action: Action = serde_json::from_slice(action_bytes).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    let decision: Decision = serde_json::from_slice(decision_bytes).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    let execution: ExecutionOutcome =
        serde_json::from_slice(execution_bytes).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    let decided_at = parse_timestamp(decided_at)?;
    let mut event = AuditEvent::pending(tenant_id, agent_id.map(Into::into), action, decision, decided_at);
    event.execution = execution;
    Ok(Some(event))
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, SqliteStoreError> {
    Timestamp::from_rfc3339(raw).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
}

// ============================================================================
// SECTION: Schema
// ============================================================================

fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;").map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS tenants (
                    tenant_id TEXT PRIMARY KEY,
                    display_name TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'active',
                    created_at TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS users (
                    user_id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    email TEXT NOT NULL,
                    created_at TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_users_tenant ON users (tenant_id);
                 CREATE TABLE IF NOT EXISTS api_keys (
                    key_id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    token_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    active INTEGER NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_api_keys_hash ON api_keys (token_hash);
                 CREATE TABLE IF NOT EXISTS channel_tokens (
                    token_id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    token_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    active INTEGER NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_channel_tokens_hash ON channel_tokens (token_hash);
                 CREATE TABLE IF NOT EXISTS active_intents (
                    tenant_id TEXT PRIMARY KEY REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    intent_json BLOB NOT NULL,
                    updated_at TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS credentials (
                    credential_id TEXT NOT NULL,
                    tenant_id TEXT REFERENCES tenants(tenant_id) ON DELETE CASCADE,
                    tool TEXT NOT NULL,
                    data_json BLOB NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (credential_id, tenant_id)
                 );
                 CREATE TABLE IF NOT EXISTS audit_events (
                    decision_id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    agent_id TEXT,
                    action_id TEXT NOT NULL,
                    action_json BLOB NOT NULL,
                    decision_json BLOB NOT NULL,
                    execution_json BLOB NOT NULL,
                    decided_at TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_audit_events_tenant ON audit_events (tenant_id, decided_at);
                 CREATE INDEX IF NOT EXISTS idx_audit_events_action ON audit_events (action_id);
                 CREATE TABLE IF NOT EXISTS active_policy_preset (
                    tenant_id TEXT PRIMARY KEY,
                    preset_name TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS rate_limit_counters (
                    subject TEXT NOT NULL,
                    window TEXT NOT NULL,
                    bucket_key TEXT NOT NULL,
                    value INTEGER NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (subject, window, bucket_key)
                 );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!("unsupported schema version: {value}")));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edon_core::Action;
    use edon_core::ActionSource;
    use edon_core::CredentialId;
    use edon_core::RiskLevel;
    use edon_core::Tool;
    use serde_json::json;

    fn open_temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(SqliteStoreConfig::new(dir.path().join("gateway.db"))).unwrap();
        (dir, store)
    }

    #[test]
    fn tenant_round_trips() {
        let (_dir, store) = open_temp_store();
        let tenant = Tenant {
            id: TenantId::new(),
            display_name: "Acme".to_string(),
            status: edon_core::TenantStatus::Active,
            created_at: Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
        };
        store.upsert_tenant(&tenant).unwrap();
        let loaded = store.get_tenant(tenant.id).unwrap().unwrap();
        assert_eq!(loaded.display_name, "Acme");
        assert_eq!(loaded.status, edon_core::TenantStatus::Active);
    }

    #[test]
    fn inactive_tenant_status_persists() {
        let (_dir, store) = open_temp_store();
        let tenant = Tenant {
            id: TenantId::new(),
            display_name: "Suspended Co".to_string(),
            status: edon_core::TenantStatus::Inactive,
            created_at: Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
        };
        store.upsert_tenant(&tenant).unwrap();
        let loaded = store.get_tenant(tenant.id).unwrap().unwrap();
        assert_eq!(loaded.status, edon_core::TenantStatus::Inactive);
    }

    #[test]
    fn credential_lookup_is_strictly_tenant_scoped() {
        let (_dir, store) = open_temp_store();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let key_a = CredentialKey { credential_id: CredentialId::new("x"), tenant_id: Some(tenant_a) };
        let key_b = CredentialKey { credential_id: CredentialId::new("x"), tenant_id: Some(tenant_b) };
        store.set_credential(&Credential { key: key_a.clone(), tool: "gmail".to_string(), data: json!({"token": "a-secret"}), updated_at: now }).unwrap();
        store.set_credential(&Credential { key: key_b.clone(), tool: "gmail".to_string(), data: json!({"token": "b-secret"}), updated_at: now }).unwrap();

        let loaded_a = store.get_credential(&key_a).unwrap().unwrap();
        assert_eq!(loaded_a.data, json!({"token": "a-secret"}));
        let loaded_b = store.get_credential(&key_b).unwrap().unwrap();
        assert_eq!(loaded_b.data, json!({"token": "b-secret"}));
    }

    #[test]
    fn deleting_one_tenants_credential_leaves_the_others() {
        let (_dir, store) = open_temp_store();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let key_a = CredentialKey { credential_id: CredentialId::new("x"), tenant_id: Some(tenant_a) };
        let key_b = CredentialKey { credential_id: CredentialId::new("x"), tenant_id: Some(tenant_b) };
        store.set_credential(&Credential { key: key_a.clone(), tool: "gmail".to_string(), data: json!({}), updated_at: now }).unwrap();
        store.set_credential(&Credential { key: key_b.clone(), tool: "gmail".to_string(), data: json!({}), updated_at: now }).unwrap();

        store.delete_credential(&key_a).unwrap();
        assert!(store.get_credential(&key_a).unwrap().is_none());
        assert!(store.get_credential(&key_b).unwrap().is_some());
    }

    #[test]
    fn global_credential_is_addressed_by_null_tenant_and_never_leaks_to_a_tenant_lookup() {
        let (_dir, store) = open_temp_store();
        let tenant_a = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let global_key = CredentialKey { credential_id: CredentialId::new("shared-search"), tenant_id: None };
        let tenant_key = CredentialKey { credential_id: CredentialId::new("shared-search"), tenant_id: Some(tenant_a) };
        store
            .set_credential(&Credential { key: global_key.clone(), tool: "search".to_string(), data: json!({"token": "global"}), updated_at: now })
            .unwrap();

        let loaded = store.get_credential(&global_key).unwrap().unwrap();
        assert_eq!(loaded.data, json!({"token": "global"}));
        assert!(store.get_credential(&tenant_key).unwrap().is_none(), "no cross-tenant fallback, ever");
    }

    #[test]
    fn re_setting_a_global_credential_replaces_the_row_instead_of_duplicating_it() {
        let (_dir, store) = open_temp_store();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let key = CredentialKey { credential_id: CredentialId::new("shared-search"), tenant_id: None };
        store.set_credential(&Credential { key: key.clone(), tool: "search".to_string(), data: json!({"token": "v1"}), updated_at: now }).unwrap();
        store.set_credential(&Credential { key: key.clone(), tool: "search".to_string(), data: json!({"token": "v2"}), updated_at: now }).unwrap();

        let loaded = store.get_credential(&key).unwrap().unwrap();
        assert_eq!(loaded.data, json!({"token": "v2"}));
    }

    #[test]
    fn audit_event_upsert_keeps_exactly_one_row_per_decision() {
        let (_dir, store) = open_temp_store();
        let tenant_id = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let action = Action::new(Tool::Email, "draft", json!({}), now, ActionSource::Agent, RiskLevel::Low);
        let decision = Decision::approved("ok");
        let mut event = AuditEvent::pending(tenant_id, None, action, decision, now);
        store.record_audit_event(&event).unwrap();
        event.execution = ExecutionOutcome::Succeeded { detail: "sent".to_string() };
        store.record_audit_event(&event).unwrap();

        let results = store.query_audit_events(tenant_id, None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].decision_id, event.decision_id);
    }

    #[test]
    fn query_audit_events_filters_by_action_id() {
        let (_dir, store) = open_temp_store();
        let tenant_id = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let action1 = Action::new(Tool::Email, "draft", json!({}), now, ActionSource::Agent, RiskLevel::Low);
        let action1_id = action1.id.to_string();
        let event1 = AuditEvent::pending(tenant_id, None, action1, Decision::approved("ok"), now);
        let action2 = Action::new(Tool::Email, "draft", json!({}), now, ActionSource::Agent, RiskLevel::Low);
        let event2 = AuditEvent::pending(tenant_id, None, action2, Decision::approved("ok"), now);
        store.record_audit_event(&event1).unwrap();
        store.record_audit_event(&event2).unwrap();

        let results = store.query_audit_events(tenant_id, Some(&action1_id), 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].decision_id, event1.decision_id);
    }

    #[test]
    fn api_key_lookup_ignores_revoked_keys() {
        let (_dir, store) = open_temp_store();
        let tenant_id = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let key = ApiKeyRecord { id: "key-1".into(), tenant_id, token_hash: edon_core::hash_token("raw-token"), created_at: now, active: true };
        store.upsert_api_key(&key).unwrap();
        assert_eq!(store.find_tenant_by_api_key_hash(&key.token_hash).unwrap(), Some(tenant_id));

        let revoked = ApiKeyRecord { active: false, ..key.clone() };
        store.upsert_api_key(&revoked).unwrap();
        assert_eq!(store.find_tenant_by_api_key_hash(&key.token_hash).unwrap(), None);
    }

    #[test]
    fn channel_token_lookup_ignores_revoked_tokens() {
        let (_dir, store) = open_temp_store();
        let tenant_id = TenantId::new();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let token = ChannelTokenRecord { id: "chan-1".into(), tenant_id, token_hash: edon_core::hash_token("raw-channel-token"), created_at: now, active: true };
        store.upsert_channel_token(&token).unwrap();
        assert_eq!(store.find_tenant_by_channel_token_hash(&token.token_hash).unwrap(), Some(tenant_id));

        let revoked = ChannelTokenRecord { active: false, ..token.clone() };
        store.upsert_channel_token(&revoked).unwrap();
        assert_eq!(store.find_tenant_by_channel_token_hash(&token.token_hash).unwrap(), None);
    }

    #[test]
    fn rate_limit_counter_increments_and_persists_across_calls() {
        let (_dir, store) = open_temp_store();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        assert_eq!(store.increment_rate_limit_counter("agent-1", "minute", "2026-01-01T00:00", now).unwrap(), 1);
        assert_eq!(store.increment_rate_limit_counter("agent-1", "minute", "2026-01-01T00:00", now).unwrap(), 2);
        assert_eq!(store.read_rate_limit_counter("agent-1", "minute", "2026-01-01T00:00").unwrap(), 2);
    }

    #[test]
    fn rate_limit_counter_is_scoped_by_bucket_key() {
        let (_dir, store) = open_temp_store();
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        store.increment_rate_limit_counter("agent-1", "minute", "2026-01-01T00:00", now).unwrap();
        assert_eq!(store.read_rate_limit_counter("agent-1", "minute", "2026-01-01T00:01").unwrap(), 0);
    }

    #[test]
    fn unknown_token_hash_resolves_to_no_tenant() {
        let (_dir, store) = open_temp_store();
        assert_eq!(store.find_tenant_by_api_key_hash("nonexistent-hash").unwrap(), None);
        assert_eq!(store.find_tenant_by_channel_token_hash("nonexistent-hash").unwrap(), None);
    }

    #[test]
    fn active_policy_preset_round_trips() {
        let (_dir, store) = open_temp_store();
        let tenant_id = TenantId::new();
        store.set_active_policy_preset(tenant_id, PolicyPackName::OpsCommander).unwrap();
        assert_eq!(store.get_active_policy_preset(tenant_id).unwrap(), Some(PolicyPackName::OpsCommander));
    }
}

// crates/provisioner-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Job Store
// Description: Durable JobStore backed by SQLite WAL.
// Purpose: Persist job records with versioned, hash-verified snapshots.
// Dependencies: provisioner-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each save writes the canonical JSON form of a [`JobRecord`] as the next
//! version in `job_record_versions` and moves the `jobs` row (identifier,
//! current state, latest version) forward in the same transaction. Loads
//! recompute the digest of the stored bytes and fail closed on mismatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use provisioner_core::DEFAULT_HASH_ALGORITHM;
use provisioner_core::HashAlgorithm;
use provisioner_core::JobId;
use provisioner_core::JobRecord;
use provisioner_core::JobState;
use provisioner_core::JobStore;
use provisioner_core::StoreError;
use provisioner_core::canonical_json_bytes;
use provisioner_core::hash_bytes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version written to `store_meta`.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum size of one stored job record snapshot.
pub const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// Write-ahead log.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Sync on every commit.
    #[default]
    Full,
    /// Sync at checkpoints only.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration of the `SQLite` job store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Versions kept per job; older versions are pruned.
    #[serde(default)]
    pub max_versions: Option<u64>,
}

impl SqliteStoreConfig {
    /// Creates a configuration with defaults for the given path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_versions: None,
        }
    }
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` job store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Filesystem error.
    #[error("sqlite job store io error: {0}")]
    Io(String),
    /// Database engine error.
    #[error("sqlite job store db error: {0}")]
    Db(String),
    /// Stored data failed integrity checks.
    #[error("sqlite job store corruption: {0}")]
    Corrupt(String),
    /// Schema version is not supported.
    #[error("sqlite job store version mismatch: {0}")]
    VersionMismatch(String),
    /// Stored or supplied data is invalid.
    #[error("sqlite job store invalid data: {0}")]
    Invalid(String),
    /// Snapshot exceeds [`MAX_RECORD_BYTES`].
    #[error("sqlite job store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual size in bytes.
        actual_bytes: usize,
    },
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            too_large @ SqliteStoreError::TooLarge { .. } => Self::Invalid(too_large.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed job store.
#[derive(Clone)]
pub struct SqliteJobStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteJobStore {
    /// Opens (creating if needed) a job store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the configuration is invalid or the
    /// database cannot be opened or initialized.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        if config.max_versions == Some(0) {
            return Err(SqliteStoreError::Invalid("max_versions must be greater than zero".to_string()));
        }
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns every retained version of a job, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when a version fails integrity checks.
    pub fn history(&self, id: &JobId) -> Result<Vec<JobRecord>, SqliteStoreError> {
        let rows = {
            let guard = self.lock()?;
            let mut statement = guard.prepare(
                "SELECT record_json, record_hash, hash_algorithm FROM job_record_versions \
                 WHERE job_id = ?1 ORDER BY version ASC",
            )?;
            let rows = statement
                .query_map(params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<Result<Vec<StoredSnapshot>, _>>()?;
            rows
        };
        rows.into_iter().map(|snapshot| decode_snapshot(id, snapshot)).collect()
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Loads the latest version of a job record.
    fn load_record(&self, id: &JobId) -> Result<Option<JobRecord>, SqliteStoreError> {
        let snapshot = {
            let mut guard = self.lock()?;
            let tx = guard.transaction()?;
            let snapshot = match latest_version(&tx, id)? {
                Some(version) => Some(read_version(&tx, id, version)?),
                None => None,
            };
            tx.commit()?;
            snapshot
        };
        snapshot.map(|snapshot| decode_snapshot(id, snapshot)).transpose()
    }

    /// Appends a new version of a job record.
    fn save_record(&self, record: &JobRecord) -> Result<(), SqliteStoreError> {
        let bytes = canonical_json_bytes(record).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if bytes.len() > MAX_RECORD_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_RECORD_BYTES,
                actual_bytes: bytes.len(),
            });
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes);
        let job_id = record.id.as_str();

        let mut guard = self.lock()?;
        let tx = guard.transaction()?;
        let next_version = match latest_version(&tx, &record.id)? {
            None => 1,
            Some(version) => version.checked_add(1).ok_or_else(|| {
                SqliteStoreError::Corrupt(format!("version overflow for job {job_id}"))
            })?,
        };
        tx.execute(
            "INSERT INTO jobs (job_id, state, latest_version) VALUES (?1, ?2, ?3) \
             ON CONFLICT(job_id) DO UPDATE SET state = excluded.state, \
             latest_version = excluded.latest_version",
            params![job_id, record.state.as_str(), next_version],
        )?;
        tx.execute(
            "INSERT INTO job_record_versions (job_id, version, record_json, record_hash, \
             hash_algorithm, saved_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![job_id, next_version, bytes, digest.value, digest.algorithm.label(), unix_millis()],
        )?;
        enforce_retention(&tx, job_id, next_version, self.config.max_versions)?;
        tx.commit()?;
        Ok(())
    }

    /// Lists jobs whose current state matches.
    fn query_state(&self, state: JobState) -> Result<Vec<JobId>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard.prepare("SELECT job_id FROM jobs WHERE state = ?1 ORDER BY job_id")?;
        let ids = statement
            .query_map(params![state.as_str()], |row| row.get::<_, String>(0))?
            .map(|row| row.map(JobId::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl JobStore for SqliteJobStore {
    fn load(&self, id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        self.load_record(id).map_err(StoreError::from)
    }

    fn save(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.save_record(record).map_err(StoreError::from)
    }

    fn ids_in_state(&self, state: JobState) -> Result<Vec<JobId>, StoreError> {
        self.query_state(state).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Snapshot Helpers
// ============================================================================

/// Stored bytes, digest, and digest algorithm of one version.
type StoredSnapshot = (Vec<u8>, String, String);

/// Returns the latest version number of a job, if it exists.
fn latest_version(tx: &Transaction<'_>, id: &JobId) -> Result<Option<i64>, SqliteStoreError> {
    let version: Option<i64> = tx
        .query_row("SELECT latest_version FROM jobs WHERE job_id = ?1", params![id.as_str()], |row| row.get(0))
        .optional()?;
    match version {
        Some(value) if value < 1 => {
            Err(SqliteStoreError::Corrupt(format!("invalid latest_version for job {}", id.as_str())))
        }
        other => Ok(other),
    }
}

/// Reads one version, enforcing the size limit before fetching the bytes.
fn read_version(tx: &Transaction<'_>, id: &JobId, version: i64) -> Result<StoredSnapshot, SqliteStoreError> {
    let metadata: Option<(i64, String, String)> = tx
        .query_row(
            "SELECT length(record_json), record_hash, hash_algorithm FROM job_record_versions \
             WHERE job_id = ?1 AND version = ?2",
            params![id.as_str(), version],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((length, hash, algorithm)) = metadata else {
        return Err(SqliteStoreError::Corrupt(format!(
            "missing version {version} for job {}",
            id.as_str()
        )));
    };
    let length = usize::try_from(length)
        .map_err(|_| SqliteStoreError::Invalid(format!("negative record length for job {}", id.as_str())))?;
    if length > MAX_RECORD_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_RECORD_BYTES,
            actual_bytes: length,
        });
    }
    let bytes: Vec<u8> = tx.query_row(
        "SELECT record_json FROM job_record_versions WHERE job_id = ?1 AND version = ?2",
        params![id.as_str(), version],
        |row| row.get(0),
    )?;
    Ok((bytes, hash, algorithm))
}

/// Verifies and decodes a stored snapshot.
fn decode_snapshot(id: &JobId, (bytes, hash, algorithm): StoredSnapshot) -> Result<JobRecord, SqliteStoreError> {
    let algorithm = parse_hash_algorithm(&algorithm)?;
    if hash_bytes(algorithm, &bytes).value != hash {
        return Err(SqliteStoreError::Corrupt(format!("hash mismatch for job {}", id.as_str())));
    }
    let record: JobRecord =
        serde_json::from_slice(&bytes).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if record.id != *id {
        return Err(SqliteStoreError::Invalid("job_id mismatch between key and payload".to_string()));
    }
    Ok(record)
}

/// Parses a stored digest algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    if label == HashAlgorithm::Sha256.label() {
        Ok(HashAlgorithm::Sha256)
    } else {
        Err(SqliteStoreError::Invalid(format!("unsupported hash algorithm: {label}")))
    }
}

// ============================================================================
// SECTION: Connection Helpers
// ============================================================================

/// Ensures the parent directory exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates path length limits and rejects directories.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        return Err(SqliteStoreError::Invalid("store path contains an overlong component".to_string()));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Opens a connection and applies durability pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection.execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection.execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(connection)
}

/// Creates the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> =
        tx.query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0)).optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS jobs (
                    job_id TEXT PRIMARY KEY,
                    state TEXT NOT NULL,
                    latest_version INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs (state);
                CREATE TABLE IF NOT EXISTS job_record_versions (
                    job_id TEXT NOT NULL,
                    version INTEGER NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    saved_at INTEGER NOT NULL,
                    PRIMARY KEY (job_id, version),
                    FOREIGN KEY (job_id) REFERENCES jobs(job_id) ON DELETE CASCADE
                );",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!("unsupported schema version: {value}")));
        }
    }
    tx.commit()?;
    Ok(())
}

/// Prunes versions older than the retention window.
fn enforce_retention(
    tx: &Transaction<'_>,
    job_id: &str,
    latest_version: i64,
    max_versions: Option<u64>,
) -> Result<(), SqliteStoreError> {
    let Some(max_versions) = max_versions else {
        return Ok(());
    };
    let max_versions =
        i64::try_from(max_versions).map_err(|_| SqliteStoreError::Invalid("max_versions too large".to_string()))?;
    if latest_version > max_versions {
        tx.execute(
            "DELETE FROM job_record_versions WHERE job_id = ?1 AND version <= ?2",
            params![job_id, latest_version - max_versions],
        )?;
    }
    Ok(())
}

/// Returns the current unix time in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

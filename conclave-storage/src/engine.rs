//! StorageEngine: owns the connection pool, runs migrations at startup, and
//! implements the Memory Store and confidence persistence traits.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::instrument;

use conclave_core::config::StorageConfig;
use conclave_core::errors::ConclaveResult;
use conclave_core::models::{ConfidenceRecord, FeedbackLabel, FindingRef, MemoryEntry};
use conclave_core::traits::{
    IConfidenceStore, IMemoryStore, PutOutcome, RetentionPolicy, StrategyParams,
};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{confidence_ops, finding_ops, maintenance, memory_crud, memory_query, memory_search};

pub struct StorageEngine {
    pool: ConnectionPool,
    /// File-backed: reads go to the read pool. In-memory: readers are
    /// isolated databases, so reads go through the writer.
    use_read_pool: bool,
}

impl StorageEngine {
    /// Open a file-backed store with default settings.
    pub fn open(path: &Path) -> ConclaveResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> ConclaveResult<Self> {
        let pool = ConnectionPool::open(path, config.read_pool_size, config.busy_timeout_ms)?;
        let engine = Self {
            pool,
            use_read_pool: true,
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory store (for tests and ephemeral runs).
    pub fn open_in_memory() -> ConclaveResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self {
            pool,
            use_read_pool: false,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> ConclaveResult<()> {
        let version = self.pool.writer.with_conn(migrations::run_migrations)?;
        tracing::info!(schema_version = version, "memory store ready");
        Ok(())
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn with_reader<F, T>(&self, f: F) -> ConclaveResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> ConclaveResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }
}

impl IMemoryStore for StorageEngine {
    #[instrument(skip(self, entry), fields(category = %entry.category, entry_id = %entry.id))]
    fn put(&self, entry: &MemoryEntry) -> ConclaveResult<PutOutcome> {
        let outcome = self
            .pool
            .writer
            .with_conn(|conn| memory_crud::put_entry(conn, entry))?;
        if !outcome.was_inserted() {
            tracing::debug!(existing_id = %outcome.id(), "deduplicated memory entry");
        }
        Ok(outcome)
    }

    fn get(&self, id: &str) -> ConclaveResult<Option<MemoryEntry>> {
        self.with_reader(|conn| memory_crud::get_entry(conn, id))
    }

    fn get_by_fingerprint(
        &self,
        category: &str,
        fingerprint: &str,
    ) -> ConclaveResult<Option<MemoryEntry>> {
        self.with_reader(|conn| memory_crud::get_by_fingerprint(conn, category, fingerprint))
    }

    fn query(
        &self,
        category: Option<&str>,
        params: &StrategyParams,
    ) -> ConclaveResult<Vec<MemoryEntry>> {
        self.with_reader(|conn| match params {
            StrategyParams::Descriptors { values, limit } => {
                memory_query::query_by_descriptors(conn, values, category, *limit)
            }
            StrategyParams::SignatureBands { bands, limit } => {
                memory_query::query_by_bands(conn, bands, category, *limit)
            }
            StrategyParams::Tags { values, limit } => {
                memory_query::query_by_tags(conn, values, category, *limit)
            }
            StrategyParams::Terms { terms, limit } => {
                memory_search::search_terms(conn, terms, category, *limit)
            }
            StrategyParams::Recent { limit } => memory_query::query_recent(conn, category, *limit),
        })
    }

    #[instrument(skip(self))]
    fn update_feedback(&self, id: &str, label: FeedbackLabel, weight: f64) -> ConclaveResult<()> {
        self.pool
            .writer
            .with_conn(|conn| memory_crud::update_feedback(conn, id, label, weight))
    }

    fn record_finding(&self, finding: &FindingRef) -> ConclaveResult<()> {
        self.pool
            .writer
            .with_conn(|conn| finding_ops::record(conn, finding))
    }

    fn get_finding(&self, id: &str) -> ConclaveResult<Option<FindingRef>> {
        self.with_reader(|conn| finding_ops::get(conn, id))
    }

    fn count(&self) -> ConclaveResult<usize> {
        self.with_reader(maintenance::count)
    }

    fn count_by_category(&self) -> ConclaveResult<BTreeMap<String, usize>> {
        self.with_reader(maintenance::count_by_category)
    }

    #[instrument(skip(self))]
    fn apply_retention(&self, policy: &RetentionPolicy) -> ConclaveResult<usize> {
        let removed = self
            .pool
            .writer
            .with_conn(|conn| maintenance::apply_retention(conn, policy))?;
        tracing::info!(removed, "retention applied");
        Ok(removed)
    }
}

impl IConfidenceStore for StorageEngine {
    fn load_confidence(
        &self,
        agent_name: &str,
        category: &str,
    ) -> ConclaveResult<Option<ConfidenceRecord>> {
        self.with_reader(|conn| confidence_ops::load(conn, agent_name, category))
    }

    fn save_confidence(&self, record: &ConfidenceRecord) -> ConclaveResult<()> {
        self.pool
            .writer
            .with_conn(|conn| confidence_ops::save(conn, record))
    }

    fn list_confidence(&self) -> ConclaveResult<Vec<ConfidenceRecord>> {
        self.with_reader(confidence_ops::list)
    }
}

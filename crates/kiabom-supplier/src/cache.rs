use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use kiabom_sch::Currency;
use kiabom_sch::supplier::{SupplierQuery, SupplierRecord};

/// Environment variable overriding the cache location.
pub const CACHE_DIR_ENV: &str = "KIABOM_CACHE_DIR";

pub const DEFAULT_TTL_HOURS: i64 = 24;

/// `$KIABOM_CACHE_DIR`, else `<user cache dir>/kiabom`.
pub fn default_cache_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::cache_dir().map(|d| d.join("kiabom"))
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    record: SupplierRecord,
}

/// Caches another supplier's answers on disk, one JSON file per query.
///
/// Misses are cached too so that unknown parts are not re-queried on every
/// run. Cache I/O problems never fail a lookup.
pub struct CachedSupplier<S> {
    inner: S,
    dir: PathBuf,
    ttl: Duration,
}

impl<S: SupplierQuery> CachedSupplier<S> {
    pub fn new(inner: S, root: impl AsRef<Path>, ttl: Duration) -> Self {
        let dir = root
            .as_ref()
            .join(inner.name().to_ascii_lowercase());
        Self { inner, dir, ttl }
    }

    fn entry_path(&self, query: &str, currency: Currency) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(currency.code().as_bytes());
        hasher.update(b"\0");
        hasher.update(query.trim().to_lowercase().as_bytes());
        self.dir.join(format!("{:x}.json", hasher.finalize()))
    }

    fn read(&self, query: &str, currency: Currency, now: DateTime<Utc>) -> Option<SupplierRecord> {
        let path = self.entry_path(query, currency);
        let bytes = fs::read(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("Ignoring unreadable cache entry {}: {err}", path.display());
                return None;
            }
        };
        if now - entry.stored_at > self.ttl {
            return None;
        }
        Some(entry.record)
    }

    fn write(&self, query: &str, currency: Currency, record: &SupplierRecord, now: DateTime<Utc>) {
        let path = self.entry_path(query, currency);
        let entry = CacheEntry {
            stored_at: now,
            record: record.clone(),
        };
        let result = fs::create_dir_all(&self.dir)
            .map_err(anyhow::Error::from)
            .and_then(|_| Ok(serde_json::to_vec_pretty(&entry)?))
            .and_then(|bytes| Ok(fs::write(&path, bytes)?));
        if let Err(err) = result {
            log::debug!("Failed to write cache entry {}: {err}", path.display());
        }
    }
}

impl<S: SupplierQuery> SupplierQuery for CachedSupplier<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn order_code_field(&self) -> Option<&str> {
        self.inner.order_code_field()
    }

    fn lookup(
        &self,
        queries: &BTreeSet<String>,
        currency: Currency,
    ) -> Result<HashMap<String, SupplierRecord>> {
        let now = Utc::now();
        let mut records = HashMap::new();
        let mut missing = BTreeSet::new();

        for query in queries {
            match self.read(query, currency, now) {
                Some(record) => {
                    records.insert(query.clone(), record);
                }
                None => {
                    missing.insert(query.clone());
                }
            }
        }
        log::debug!(
            "{}: {} cached, {} to fetch",
            self.name(),
            records.len(),
            missing.len()
        );
        if missing.is_empty() {
            return Ok(records);
        }

        let mut fetched = self.inner.lookup(&missing, currency)?;
        for query in &missing {
            // Only answers are cached; unanswered queries are retried next run.
            let record = match fetched.remove(query) {
                Some(record) => {
                    self.write(query, currency, &record, now);
                    record
                }
                None => SupplierRecord::not_found(self.name(), query.as_str()),
            };
            records.insert(query.clone(), record);
        }
        Ok(records)
    }
}

use chrono::{DateTime, Local};
use dashmap::DashMap;
use glob::glob;
use regex::Regex;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::flight::FlightGroup;
use crate::utils::{
    config::CacheConfig,
    error::{CacheIoError, MirageResult},
    types::{Row, RowSet},
};

const CACHE_FILE_SUFFIX: &str = "_data.json";

/// Durable, cross-process store of materialized rows: one JSON file per
/// table, fronted by a process-lifetime resident view.
///
/// A cache file is created on first successful materialization, read on
/// every later open, and only ever rewritten whole. There is no eviction and
/// no invalidation; clearing is an explicit maintenance operation.
pub struct DataCache {
    directory: PathBuf,
    resident: Arc<DashMap<String, Arc<RowSet>>>,
    flight: FlightGroup<Arc<RowSet>>,
}

/// A cache file found on disk
#[derive(Debug, Clone)]
pub struct CachedTableInfo {
    pub table_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

impl DataCache {
    /// Create a data cache rooted at the given directory
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            resident: Arc::new(DashMap::new()),
            flight: FlightGroup::new(),
        }
    }

    /// Create a data cache from configuration
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.directory.clone())
    }

    /// Directory holding the cache files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Deterministic cache-file identity for a table name
    pub fn cache_path(&self, table_name: &str) -> PathBuf {
        let sanitized = sanitize_table_name(table_name);
        self.directory
            .join(format!("{}{}", sanitized, CACHE_FILE_SUFFIX))
    }

    /// Return the resident or on-disk rows for a table, or run `materialize`
    /// exactly once to produce them. Concurrent callers for the same
    /// uncached table coalesce onto a single materialization.
    ///
    /// Newly materialized rows are persisted best-effort: a write failure is
    /// logged and the in-memory rows still serve this process.
    pub async fn get_or_materialize<F>(
        &self,
        table_name: &str,
        materialize: F,
    ) -> MirageResult<Arc<RowSet>>
    where
        F: Future<Output = MirageResult<Vec<Row>>> + Send + 'static,
    {
        if let Some(rows) = self.resident(table_name) {
            return Ok(rows);
        }

        let resident = Arc::clone(&self.resident);
        let key = table_name.to_string();
        let path = self.cache_path(table_name);

        self.flight
            .run(table_name, async move {
                if let Some(rows) = resident.get(&key).map(|entry| entry.value().clone()) {
                    return Ok(rows);
                }

                if let Some(rows) = load_rows(&path) {
                    let rows = Arc::new(rows);
                    resident.insert(key, Arc::clone(&rows));
                    return Ok(rows);
                }

                let rows = Arc::new(RowSet::new(materialize.await?));
                if let Err(warning) = store_rows(&path, &rows) {
                    // Non-fatal: the rows still serve this process.
                    eprintln!("warning: {}", warning);
                }
                resident.insert(key, Arc::clone(&rows));
                Ok(rows)
            })
            .await
    }

    /// Rows already held in memory for a table, if any
    pub fn resident(&self, table_name: &str) -> Option<Arc<RowSet>> {
        self.resident
            .get(table_name)
            .map(|entry| entry.value().clone())
    }

    /// True if a readable, well-formed cache file or a resident row set
    /// exists for the table
    pub fn is_cached(&self, table_name: &str) -> bool {
        self.resident.contains_key(table_name) || load_rows(&self.cache_path(table_name)).is_some()
    }

    /// List the cache files currently on disk
    pub fn list(&self) -> Result<Vec<CachedTableInfo>, CacheIoError> {
        let pattern = format!("{}/*{}", self.directory.display(), CACHE_FILE_SUFFIX);
        let paths = glob(&pattern).map_err(|e| CacheIoError::ScanFailed {
            path: self.directory.display().to_string(),
            detail: e.to_string(),
        })?;

        let mut entries = Vec::new();
        for path in paths.flatten() {
            let table_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(file_name) => file_name
                    .trim_end_matches(CACHE_FILE_SUFFIX)
                    .to_string(),
                None => continue,
            };

            let metadata = fs::metadata(&path).ok();
            entries.push(CachedTableInfo {
                table_name,
                size_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                modified: metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Local>::from),
                path,
            });
        }

        entries.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        Ok(entries)
    }

    /// Remove the cached rows for one table, on disk and resident.
    /// Returns true if a cache file existed.
    pub fn clear(&self, table_name: &str) -> Result<bool, CacheIoError> {
        self.resident.remove(table_name);

        let path = self.cache_path(table_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheIoError::RemoveFailed {
                path: path.display().to_string(),
                detail: e.to_string(),
            }),
        }
    }

    /// Remove every cache file and the whole resident view.
    /// Returns the number of files removed.
    pub fn clear_all(&self) -> Result<usize, CacheIoError> {
        self.resident.clear();

        let mut removed = 0;
        for entry in self.list()? {
            fs::remove_file(&entry.path).map_err(|e| CacheIoError::RemoveFailed {
                path: entry.path.display().to_string(),
                detail: e.to_string(),
            })?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Replace characters that cannot appear in a cache file name
fn sanitize_table_name(table_name: &str) -> String {
    if let Ok(pattern) = Regex::new(r"[^A-Za-z0-9_.-]") {
        pattern.replace_all(table_name, "_").into_owned()
    } else {
        table_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Read a cache file back into rows; any unreadable or malformed file is
/// treated as a cache miss
fn load_rows(path: &Path) -> Option<RowSet> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Persist rows all-or-nothing: serialize to a sibling temp file, then
/// rename over the final path
fn store_rows(path: &Path, rows: &RowSet) -> Result<(), CacheIoError> {
    let write_failed = |detail: String| CacheIoError::WriteFailed {
        path: path.display().to_string(),
        detail,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| write_failed(format!("failed to create cache directory: {}", e)))?;
    }

    let payload = serde_json::to_vec(rows).map_err(|e| write_failed(e.to_string()))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &payload).map_err(|e| write_failed(e.to_string()))?;
    fs::rename(&tmp_path, path).map_err(|e| write_failed(e.to_string()))
}

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

use crate::cache::flight::FlightGroup;
use crate::utils::{error::MirageResult, types::ColumnDef};

/// Process-lifetime memo of resolved column sets, keyed by table name.
///
/// An entry is created on first successful resolution and never mutated.
/// Failures are not cached. The table name alone is the cache identity, so
/// re-declaring a name with a different description returns the columns
/// resolved for the first declaration.
pub struct SchemaCache {
    entries: Arc<DashMap<String, Arc<Vec<ColumnDef>>>>,
    flight: FlightGroup<Arc<Vec<ColumnDef>>>,
}

impl SchemaCache {
    /// Create an empty schema cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            flight: FlightGroup::new(),
        }
    }

    /// Get the cached columns for a table, if resolved
    pub fn get(&self, table_name: &str) -> Option<Arc<Vec<ColumnDef>>> {
        self.entries.get(table_name).map(|entry| entry.value().clone())
    }

    /// Check whether a table has been resolved
    pub fn contains(&self, table_name: &str) -> bool {
        self.entries.contains_key(table_name)
    }

    /// Number of resolved tables
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no table has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached columns, or run `resolve` exactly once to produce
    /// them. Concurrent callers for the same uncached name coalesce onto a
    /// single resolution and observe the same outcome.
    pub async fn get_or_resolve<F>(
        &self,
        table_name: &str,
        resolve: F,
    ) -> MirageResult<Arc<Vec<ColumnDef>>>
    where
        F: Future<Output = MirageResult<Vec<ColumnDef>>> + Send + 'static,
    {
        if let Some(columns) = self.get(table_name) {
            return Ok(columns);
        }

        let entries = Arc::clone(&self.entries);
        let key = table_name.to_string();

        self.flight
            .run(table_name, async move {
                // A racing resolution may have landed while we queued up.
                if let Some(columns) = entries.get(&key).map(|entry| entry.value().clone()) {
                    return Ok(columns);
                }

                let columns = Arc::new(resolve.await?);
                entries.insert(key, Arc::clone(&columns));
                Ok(columns)
            })
            .await
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use super::medium::Medium;
use crate::error::StoreError;
use crate::models::{Comment, Order, Product, User};

/// Names of the tables held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableName {
    Users,
    Orders,
    Products,
    Comments,
}

impl TableName {
    pub const ALL: [TableName; 4] = [
        TableName::Users,
        TableName::Orders,
        TableName::Products,
        TableName::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Users => "users",
            TableName::Orders => "orders",
            TableName::Products => "products",
            TableName::Comments => "comments",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record kind stored in exactly one table, keyed by its ID
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: TableName;

    fn id(&self) -> &str;

    fn table(tables: &Tables) -> &Table<Self>;

    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

macro_rules! impl_record {
    ($record:ty, $name:ident, $field:ident) => {
        impl Record for $record {
            const TABLE: TableName = TableName::$name;

            fn id(&self) -> &str {
                &self.id
            }

            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }
        }
    };
}

impl_record!(User, Users, users);
impl_record!(Order, Orders, orders);
impl_record!(Product, Products, products);
impl_record!(Comment, Comments, comments);

/// In-memory copy of one table
///
/// Once `loaded` is set the map is authoritative and the medium is never
/// re-read. `dirty` marks changes not yet written to the medium.
#[derive(Debug)]
pub struct Table<R> {
    rows: BTreeMap<String, R>,
    loaded: bool,
    dirty: bool,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            loaded: false,
            dirty: false,
        }
    }
}

impl<R: Record> Table<R> {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.rows.get(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn insert(&mut self, record: R) -> Result<(), StoreError> {
        if self.rows.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists {
                table: R::TABLE,
                id: record.id().to_string(),
            });
        }
        self.rows.insert(record.id().to_string(), record);
        self.dirty = true;
        Ok(())
    }

    pub fn replace(&mut self, record: R) -> Result<(), StoreError> {
        match self.rows.get_mut(record.id()) {
            Some(existing) => *existing = record,
            None => return Err(not_found::<R>(record.id())),
        }
        self.dirty = true;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<R, StoreError> {
        let removed = self.rows.remove(id).ok_or_else(|| not_found::<R>(id))?;
        self.dirty = true;
        Ok(removed)
    }

    /// Serialize the whole table as a pretty-printed JSON object
    pub fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec_pretty(&self.rows).map_err(|source| StoreError::MalformedSnapshot {
            table: R::TABLE,
            source,
        })
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), StoreError> {
        self.rows =
            serde_json::from_slice(snapshot).map_err(|source| StoreError::MalformedSnapshot {
                table: R::TABLE,
                source,
            })?;
        Ok(())
    }

    /// Load the table from the medium unless it is already cached.
    ///
    /// A table the medium has never seen is created empty and persisted once.
    /// On failure the table stays unloaded so a later call retries.
    pub async fn ensure_loaded(&mut self, medium: &dyn Medium) -> Result<(), StoreError> {
        if self.loaded {
            return Ok(());
        }

        let stored = medium
            .load(R::TABLE)
            .await
            .map_err(|source| StoreError::MediumUnavailable {
                table: R::TABLE,
                source,
            })?;

        match stored {
            Some(snapshot) => {
                self.restore(&snapshot)?;
                tracing::info!("Loaded table {} ({} records)", R::TABLE, self.rows.len());
            }
            None => {
                tracing::info!("Table {} not found on {}, creating it", R::TABLE, medium.name());
                self.rows.clear();
                medium
                    .save(R::TABLE, &self.snapshot()?)
                    .await
                    .map_err(|source| StoreError::MediumUnavailable {
                        table: R::TABLE,
                        source,
                    })?;
            }
        }

        self.loaded = true;
        Ok(())
    }

    /// Write the table to the medium if it has unsaved changes.
    ///
    /// Returns whether a physical write happened. The dirty flag is only
    /// cleared once the medium accepted the snapshot.
    pub async fn flush(&mut self, medium: &dyn Medium) -> Result<bool, StoreError> {
        if !self.dirty {
            return Ok(false);
        }

        let snapshot = self.snapshot()?;
        medium
            .save(R::TABLE, &snapshot)
            .await
            .map_err(|source| StoreError::MediumUnavailable {
                table: R::TABLE,
                source,
            })?;

        self.dirty = false;
        tracing::debug!("Persisted table {} ({} bytes)", R::TABLE, snapshot.len());
        Ok(true)
    }
}

fn not_found<R: Record>(id: &str) -> StoreError {
    StoreError::NotFound {
        table: R::TABLE,
        id: id.to_string(),
    }
}

/// Every table owned by one store
#[derive(Debug, Default)]
pub struct Tables {
    users: Table<User>,
    orders: Table<Order>,
    products: Table<Product>,
    comments: Table<Comment>,
}

impl Tables {
    /// Persist every dirty table, returning how many were written
    pub async fn flush_dirty(&mut self, medium: &dyn Medium) -> Result<usize, StoreError> {
        let mut written = 0;
        written += usize::from(self.users.flush(medium).await?);
        written += usize::from(self.orders.flush(medium).await?);
        written += usize::from(self.products.flush(medium).await?);
        written += usize::from(self.comments.flush(medium).await?);
        Ok(written)
    }

    pub fn has_dirty(&self) -> bool {
        self.users.is_dirty()
            || self.orders.is_dirty()
            || self.products.is_dirty()
            || self.comments.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, content: &str) -> Comment {
        Comment {
            id: id.to_string(),
            user_id: "u1".to_string(),
            content: content.to_string(),
            created: 1,
            updated: 1,
        }
    }

    #[test]
    fn test_table_names() {
        let names: Vec<&str> = TableName::ALL.iter().map(TableName::as_str).collect();
        assert_eq!(names, vec!["users", "orders", "products", "comments"]);
        assert_eq!(TableName::Orders.to_string(), "orders");
    }

    #[test]
    fn test_insert_rejects_duplicate_and_keeps_original() {
        let mut table = Table::<Comment>::default();
        table.insert(comment("c1", "first")).unwrap();

        let err = table.insert(comment("c1", "second")).unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(table.get("c1").unwrap().content, "first");
    }

    #[test]
    fn test_replace_and_remove_require_existing_id() {
        let mut table = Table::<Comment>::default();
        assert!(table.replace(comment("c1", "x")).unwrap_err().is_not_found());
        assert!(table.remove("c1").unwrap_err().is_not_found());
        assert!(!table.is_dirty());
    }

    #[test]
    fn test_snapshot_is_pretty_json_object_keyed_by_id() {
        let mut table = Table::<Comment>::default();
        table.insert(comment("b", "two")).unwrap();
        table.insert(comment("a", "one")).unwrap();

        let snapshot = String::from_utf8(table.snapshot().unwrap()).unwrap();
        assert!(snapshot.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(parsed["a"]["content"], "one");
        assert_eq!(parsed["b"]["content"], "two");
    }

    #[test]
    fn test_restore_rejects_malformed_snapshot() {
        let mut table = Table::<Comment>::default();
        let err = table.restore(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(
            err,
            StoreError::MalformedSnapshot {
                table: TableName::Comments,
                ..
            }
        ));
    }
}

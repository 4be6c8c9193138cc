//! Lazily loaded, debounced key-value table store
//!
//! Each table is read from the backing medium on first access and served from
//! memory afterwards. Mutations are linearized by a single reader-writer lock
//! and persisted through a [`DebouncedSaver`], so the medium sees complete
//! table snapshots at most once per save interval (plus one trailing write).

pub mod medium;
pub mod table;

pub use medium::Medium;
pub use table::{Record, Table, TableName, Tables};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::error::StoreError;
use crate::models::{Comment, Order, Product, User};
use crate::throttle::{log_save_errors, DebouncedSaver, SaveAction, SaveErrorSink, SaveOutcome};

/// Row count per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub users: usize,
    pub orders: usize,
    pub products: usize,
    pub comments: usize,
}

struct StoreInner {
    tables: RwLock<Tables>,
    medium: Arc<dyn Medium>,
}

#[async_trait]
impl SaveAction for StoreInner {
    async fn save(&self) -> Result<(), StoreError> {
        // Trailing writes flush whatever is in memory when the timer fires
        let mut tables = self.tables.write().await;
        let written = tables.flush_dirty(self.medium.as_ref()).await?;
        tracing::debug!("Trailing save wrote {} table(s)", written);
        Ok(())
    }
}

/// Handle to the table store (cheap to clone, shared across handlers)
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    saver: DebouncedSaver,
}

impl Store {
    /// Create a store whose trailing-save failures are logged
    pub fn new(medium: Arc<dyn Medium>, save_interval: Duration) -> Self {
        Self::with_error_sink(medium, save_interval, log_save_errors())
    }

    pub fn with_error_sink(
        medium: Arc<dyn Medium>,
        save_interval: Duration,
        sink: SaveErrorSink,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tables: RwLock::new(Tables::default()),
                medium,
            }),
            saver: DebouncedSaver::new(save_interval, sink),
        }
    }

    pub fn medium_name(&self) -> &'static str {
        self.inner.medium.name()
    }

    /// Insert a record, failing if its ID is taken
    pub async fn create<R: Record>(&self, record: R) -> Result<(), StoreError> {
        let mut tables = self.inner.tables.write().await;
        R::table_mut(&mut tables)
            .ensure_loaded(self.inner.medium.as_ref())
            .await?;
        R::table_mut(&mut tables).insert(record)?;
        self.persist(&mut tables).await
    }

    /// Copy of the record with the given ID
    pub async fn get<R: Record>(&self, id: &str) -> Result<R, StoreError> {
        let tables = self.read_loaded::<R>().await?;
        R::table(&tables)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: R::TABLE,
                id: id.to_string(),
            })
    }

    /// Replace an existing record as a whole
    pub async fn update<R: Record>(&self, record: R) -> Result<(), StoreError> {
        let mut tables = self.inner.tables.write().await;
        R::table_mut(&mut tables)
            .ensure_loaded(self.inner.medium.as_ref())
            .await?;
        R::table_mut(&mut tables).replace(record)?;
        self.persist(&mut tables).await
    }

    /// Remove a record, returning it
    pub async fn delete<R: Record>(&self, id: &str) -> Result<R, StoreError> {
        let mut tables = self.inner.tables.write().await;
        R::table_mut(&mut tables)
            .ensure_loaded(self.inner.medium.as_ref())
            .await?;
        let removed = R::table_mut(&mut tables).remove(id)?;
        self.persist(&mut tables).await?;
        Ok(removed)
    }

    /// Copies of every record in a table, in ID order
    pub async fn list<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.filter(|_: &R| true).await
    }

    /// Copies of the records matching `predicate` (full table scan)
    pub async fn filter<R, P>(&self, predicate: P) -> Result<Vec<R>, StoreError>
    where
        R: Record,
        P: Fn(&R) -> bool,
    {
        let tables = self.read_loaded::<R>().await?;
        Ok(R::table(&tables)
            .values()
            .filter(|record| predicate(*record))
            .cloned()
            .collect())
    }

    pub async fn orders_by_user_id(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        tracing::debug!("Scanning orders for user {}", user_id);
        self.filter(|order: &Order| order.user_id == user_id).await
    }

    /// All products sorted by name
    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products = self.list::<Product>().await?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .filter(|user: &User| user.email.eq_ignore_ascii_case(email))
            .await?;
        Ok(users.into_iter().next())
    }

    /// Row counts, loading any table not yet cached
    pub async fn counts(&self) -> Result<TableCounts, StoreError> {
        let mut tables = self.inner.tables.write().await;
        let medium = self.inner.medium.as_ref();
        load_all(&mut tables, medium).await?;

        Ok(TableCounts {
            users: User::table(&tables).len(),
            orders: Order::table(&tables).len(),
            products: Product::table(&tables).len(),
            comments: Comment::table(&tables).len(),
        })
    }

    /// Write every dirty table now, ignoring the save interval.
    ///
    /// Call before shutdown: a pending trailing write would otherwise be lost
    /// with the process.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let mut tables = self.inner.tables.write().await;
        if !tables.has_dirty() {
            return Ok(());
        }

        let medium = Arc::clone(&self.inner.medium);
        self.saver
            .force(async {
                let written = tables.flush_dirty(medium.as_ref()).await?;
                tracing::info!("Flushed {} table(s) to {}", written, medium.name());
                Ok::<(), StoreError>(())
            })
            .await
    }

    /// Make sure `R`'s table is loaded without copying any record
    pub async fn preload<R: Record>(&self) -> Result<(), StoreError> {
        self.read_loaded::<R>().await.map(drop)
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.inner.tables.read().await.has_dirty()
    }

    async fn persist(&self, tables: &mut Tables) -> Result<(), StoreError> {
        let medium = Arc::clone(&self.inner.medium);
        let trailing: Arc<dyn SaveAction> = self.inner.clone();

        let immediate = async {
            let written = tables.flush_dirty(medium.as_ref()).await?;
            tracing::debug!("Immediate save wrote {} table(s)", written);
            Ok::<(), StoreError>(())
        };
        let outcome = self.saver.request_save(immediate, trailing).await?;

        if outcome == SaveOutcome::Scheduled {
            tracing::debug!(
                "Save deferred to trailing write within {:?}",
                self.saver.interval()
            );
        }
        Ok(())
    }

    /// Shared guard over tables with `R`'s table loaded.
    ///
    /// Loading needs the exclusive lock; the guard is downgraded afterwards so
    /// concurrent readers are not held up.
    async fn read_loaded<R: Record>(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        let tables = self.inner.tables.read().await;
        if R::table(&tables).is_loaded() {
            return Ok(tables);
        }
        drop(tables);

        let mut tables = self.inner.tables.write().await;
        R::table_mut(&mut tables)
            .ensure_loaded(self.inner.medium.as_ref())
            .await?;
        Ok(tables.downgrade())
    }
}

async fn load_all(tables: &mut Tables, medium: &dyn Medium) -> Result<(), StoreError> {
    User::table_mut(tables).ensure_loaded(medium).await?;
    Order::table_mut(tables).ensure_loaded(medium).await?;
    Product::table_mut(tables).ensure_loaded(medium).await?;
    Comment::table_mut(tables)
        .ensure_loaded(medium)
        .await
}

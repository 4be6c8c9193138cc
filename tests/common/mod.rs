//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use shopfront_store::models::{Comment, Order, OrderProduct, OrderStatus, Product, User};
use shopfront_store::store::{Medium, TableName};
use shopfront_store::{MediumError, Store};

pub const INTERVAL: Duration = Duration::from_secs(10);

/// In-memory medium that records every call
#[derive(Default)]
pub struct MemoryMedium {
    tables: Mutex<HashMap<TableName, Vec<u8>>>,
    saves: Mutex<Vec<(TableName, Vec<u8>)>>,
    loads: AtomicUsize,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    hold_next_save: AtomicBool,
    save_started: Notify,
    save_released: Notify,
}

impl MemoryMedium {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Medium where every table already exists and is empty
    pub fn seeded() -> Arc<Self> {
        let medium = Self::default();
        for table in TableName::ALL {
            medium.put_raw(table, b"{}".to_vec());
        }
        Arc::new(medium)
    }

    pub fn put_raw(&self, table: TableName, bytes: Vec<u8>) {
        self.tables.lock().unwrap().insert(table, bytes);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    /// Every snapshot ever written for `table`, oldest first
    pub fn history(&self, table: TableName) -> Vec<Value> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == table)
            .map(|(_, bytes)| serde_json::from_slice(bytes).unwrap())
            .collect()
    }

    /// Current stored snapshot of `table`
    pub fn stored(&self, table: TableName) -> Option<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Park the next save until [`MemoryMedium::release_save`] is called
    pub fn hold_next_save(&self) {
        self.hold_next_save.store(true, Ordering::SeqCst);
    }

    pub async fn wait_save_started(&self) {
        self.save_started.notified().await;
    }

    pub fn release_save(&self) {
        self.save_released.notify_one();
    }
}

fn unavailable() -> MediumError {
    MediumError::Api {
        status: 503,
        message: "medium offline".to_string(),
    }
}

#[async_trait]
impl Medium for MemoryMedium {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, table: TableName) -> Result<Option<Vec<u8>>, MediumError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.tables.lock().unwrap().get(&table).cloned())
    }

    async fn save(&self, table: TableName, snapshot: &[u8]) -> Result<(), MediumError> {
        if self.hold_next_save.swap(false, Ordering::SeqCst) {
            self.save_started.notify_one();
            self.save_released.notified().await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.saves
            .lock()
            .unwrap()
            .push((table, snapshot.to_vec()));
        self.put_raw(table, snapshot.to_vec());
        Ok(())
    }
}

pub fn store_with(medium: &Arc<MemoryMedium>, interval: Duration) -> Store {
    Store::new(medium.clone(), interval)
}

// =============================================================================
// Record builders
// =============================================================================

pub fn user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("user-{}", id),
        password_hash: "00".repeat(32),
        email: email.to_string(),
        plan: "free".to_string(),
        created: 1_700_000_000,
        updated: 1_700_000_000,
    }
}

pub fn order(id: &str, user_id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        user_id: user_id.to_string(),
        status,
        currency: "USD".to_string(),
        products: vec![OrderProduct {
            id: "p1".to_string(),
            product_name: "Notebook".to_string(),
            quantity: 2,
            price: 1250,
        }],
        total_amount: 2500,
        paid_amount: 0,
        description: String::new(),
        created: 1_700_000_000,
        updated: 1_700_000_000,
    }
}

pub fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        kind: "digital".to_string(),
        image: String::new(),
        description: String::new(),
        price: 999,
        currency: "USD".to_string(),
        status: "active".to_string(),
        content: vec![],
        created: 1_700_000_000,
        updated: 1_700_000_000,
    }
}

pub fn comment(id: &str, user_id: &str, content: &str) -> Comment {
    Comment {
        id: id.to_string(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        created: 1_700_000_000,
        updated: 1_700_000_000,
    }
}

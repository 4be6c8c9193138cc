use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Allowed forward moves: pending -> paid -> shipped -> completed,
    /// and pending -> cancelled
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Completed)
        )
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    /// Product ID
    pub id: String,
    #[serde(rename = "name")]
    pub product_name: String,
    pub quantity: u32,
    /// Unit price in cents
    pub price: i64,
}

impl OrderProduct {
    /// `price * quantity`, `None` on overflow
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

/// Order record stored in the `orders` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub products: Vec<OrderProduct>,
    /// Amounts in cents
    pub total_amount: i64,
    pub paid_amount: i64,
    pub description: String,
    pub created: i64,
    pub updated: i64,
}

impl Order {
    /// Sum of all line totals in cents, `None` if it does not fit in an i64
    pub fn compute_total(products: &[OrderProduct]) -> Option<i64> {
        products
            .iter()
            .try_fold(0i64, |total, line| total.checked_add(line.line_total()?))
    }

    /// Total amount in currency units (cents / 100)
    pub fn total_amount_in_units(&self) -> f64 {
        self.total_amount as f64 / 100.0
    }

    pub fn paid_amount_in_units(&self) -> f64 {
        self.paid_amount as f64 / 100.0
    }

    pub fn created_rfc3339(&self) -> String {
        timestamp_to_rfc3339(self.created)
    }

    pub fn updated_rfc3339(&self) -> String {
        timestamp_to_rfc3339(self.updated)
    }
}

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

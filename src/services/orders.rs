use serde::Deserialize;

use crate::constants::{
    ERR_INVALID_CURRENCY, ERR_NO_CHANGES, ERR_TOTAL_OVERFLOW, ORDER_CURRENCIES,
};
use crate::error::{AppError, Result};
use crate::models::{Order, OrderProduct, OrderStatus};
use crate::security::new_record_id;
use crate::store::Store;

use super::now;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub currency: String,
    pub products: Vec<OrderProduct>,
    #[serde(default)]
    pub description: String,
}

/// Replacement contents of a pending order
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrder {
    pub currency: String,
    pub products: Vec<OrderProduct>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone)]
pub struct OrderService {
    store: Store,
}

impl OrderService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a pending order owned by `user_id`
    ///
    /// The total is computed from the order lines, never taken from the client.
    pub async fn create(&self, user_id: &str, request: CreateOrder) -> Result<Order> {
        if user_id.is_empty() {
            return Err(AppError::InvalidInput("User ID is empty".to_string()));
        }
        let total_amount = validate_lines(&request.currency, &request.products)?;

        let timestamp = now();
        let order = Order {
            id: new_record_id(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            currency: request.currency,
            total_amount,
            products: request.products,
            paid_amount: 0,
            description: request.description,
            created: timestamp,
            updated: timestamp,
        };

        self.store.create(order.clone()).await?;
        tracing::info!(
            "Order {} created for user {}: {} {}",
            order.id,
            user_id,
            order.total_amount,
            order.currency
        );
        Ok(order)
    }

    /// Fetch an order, checking it belongs to `user_id`
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Order> {
        let order = self.store.get::<Order>(id).await?;
        if order.user_id != user_id {
            tracing::warn!("User {} tried to access order {}", user_id, id);
            return Err(AppError::Forbidden);
        }
        Ok(order)
    }

    /// Orders of a user, newest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        if user_id.is_empty() {
            return Err(AppError::InvalidInput("User ID is empty".to_string()));
        }

        let mut orders = self.store.orders_by_user_id(user_id).await?;
        orders.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }

    /// Replace the lines of a pending order
    pub async fn update(&self, user_id: &str, id: &str, request: UpdateOrder) -> Result<Order> {
        let mut order = self.get(user_id, id).await?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::InvalidInput(
                "Only pending orders can be modified".to_string(),
            ));
        }
        let total_amount = validate_lines(&request.currency, &request.products)?;

        if order.currency == request.currency
            && order.products == request.products
            && order.description == request.description
        {
            return Err(AppError::InvalidInput(ERR_NO_CHANGES.to_string()));
        }

        order.total_amount = total_amount;
        order.currency = request.currency;
        order.products = request.products;
        order.description = request.description;
        order.updated = now();

        self.store.update(order.clone()).await?;
        Ok(order)
    }

    /// Record a captured payment against a pending order
    ///
    /// Capturing the payment itself happens at the payment provider; this only
    /// stores the outcome.
    pub async fn mark_paid(&self, id: &str, paid_amount: i64) -> Result<Order> {
        let mut order = self.store.get::<Order>(id).await?;

        if paid_amount < order.total_amount {
            tracing::warn!(
                "Underpayment for order {}: {} < {}",
                id,
                paid_amount,
                order.total_amount
            );
            return Err(AppError::InvalidInput(
                "Paid amount is less than the order total".to_string(),
            ));
        }

        transition(&mut order, OrderStatus::Paid)?;
        order.paid_amount = paid_amount;
        self.store.update(order.clone()).await?;

        tracing::info!("Order {} paid: {}", id, paid_amount);
        Ok(order)
    }

    /// Move an order along its lifecycle (shipping, completion)
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
        if status == OrderStatus::Paid {
            return Err(AppError::InvalidInput(
                "Use mark_paid to record payments".to_string(),
            ));
        }

        let mut order = self.store.get::<Order>(id).await?;
        transition(&mut order, status)?;
        self.store.update(order.clone()).await?;
        Ok(order)
    }

    /// Cancel a pending order on behalf of its owner
    pub async fn cancel(&self, user_id: &str, id: &str) -> Result<Order> {
        let mut order = self.get(user_id, id).await?;
        transition(&mut order, OrderStatus::Cancelled)?;
        self.store.update(order.clone()).await?;
        Ok(order)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        self.get(user_id, id).await?;
        self.store.delete::<Order>(id).await?;
        Ok(())
    }
}

fn transition(order: &mut Order, next: OrderStatus) -> Result<()> {
    if !order.status.can_transition_to(next) {
        return Err(AppError::InvalidInput(format!(
            "Order cannot move from {:?} to {:?}",
            order.status, next
        )));
    }
    order.status = next;
    order.updated = now();
    Ok(())
}

/// Check currency and lines, returning the order total in cents
fn validate_lines(currency: &str, products: &[OrderProduct]) -> Result<i64> {
    if !ORDER_CURRENCIES.contains(&currency) {
        return Err(AppError::InvalidInput(ERR_INVALID_CURRENCY.to_string()));
    }
    if products.is_empty() {
        return Err(AppError::InvalidInput(
            "Order must contain at least one product".to_string(),
        ));
    }
    if products.iter().any(|line| line.quantity == 0 || line.price < 0) {
        return Err(AppError::InvalidInput(
            "Order lines need a positive quantity and a non-negative price".to_string(),
        ));
    }
    Order::compute_total(products)
        .ok_or_else(|| AppError::InvalidInput(ERR_TOTAL_OVERFLOW.to_string()))
}

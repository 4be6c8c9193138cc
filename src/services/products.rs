use serde::Deserialize;

use crate::constants::{ERR_INVALID_CURRENCY, ORDER_CURRENCIES};
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::security::new_record_id;
use crate::store::Store;

use super::now;

/// Product fields supplied by an administrator
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Assigned when empty
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub content: Vec<String>,
}

#[derive(Clone)]
pub struct ProductService {
    store: Store,
}

impl ProductService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewProduct) -> Result<Product> {
        validate(&new.name, new.price, &new.currency)?;

        let timestamp = now();
        let product = Product {
            id: if new.id.is_empty() {
                new_record_id()
            } else {
                new.id
            },
            name: new.name.trim().to_string(),
            kind: new.kind,
            image: new.image,
            description: new.description,
            price: new.price,
            currency: new.currency,
            status: new.status,
            content: new.content,
            created: timestamp,
            updated: timestamp,
        };

        self.store.create(product.clone()).await?;
        tracing::info!("Product {} created", product.id);
        Ok(product)
    }

    pub async fn get(&self, id: &str) -> Result<Product> {
        Ok(self.store.get::<Product>(id).await?)
    }

    /// Every product, sorted by name
    pub async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Replace a product, keeping its creation time
    pub async fn update(&self, mut product: Product) -> Result<Product> {
        validate(&product.name, product.price, &product.currency)?;

        let existing = self.store.get::<Product>(&product.id).await?;
        product.created = existing.created;
        product.updated = now();

        self.store.update(product.clone()).await?;
        Ok(product)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete::<Product>(id).await?;
        tracing::info!("Product {} deleted", id);
        Ok(())
    }
}

fn validate(name: &str, price: i64, currency: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("Product name is required".to_string()));
    }
    if price < 0 {
        return Err(AppError::InvalidInput("Price cannot be negative".to_string()));
    }
    if !ORDER_CURRENCIES.contains(&currency) {
        return Err(AppError::InvalidInput(ERR_INVALID_CURRENCY.to_string()));
    }
    Ok(())
}

use serde::{Deserialize, Serialize};

/// Product record stored in the `products` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    pub description: String,
    /// Price in cents (1999 is 19.99)
    pub price: i64,
    pub currency: String,
    pub status: String,
    /// Deliverable content lines unlocked by purchase
    #[serde(default)]
    pub content: Vec<String>,
    pub created: i64,
    pub updated: i64,
}

use serde::{Deserialize, Serialize};

/// Comment record stored in the `comments` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created: i64,
    pub updated: i64,
}

//! Business rules on top of the table store
//!
//! Services validate input, assign IDs and timestamps, and enforce ownership.
//! The store below them treats records as opaque values keyed by ID.

pub mod comments;
pub mod orders;
pub mod products;
pub mod users;

pub use comments::CommentService;
pub use orders::{CreateOrder, OrderService, UpdateOrder};
pub use products::{NewProduct, ProductService};
pub use users::{RegisterUser, UpdateProfile, UserService};

/// Current time as a Unix timestamp (seconds)
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub mod comment;
pub mod order;
pub mod product;
pub mod user;

pub use comment::Comment;
pub use order::{Order, OrderProduct, OrderStatus};
pub use product::Product;
pub use user::User;

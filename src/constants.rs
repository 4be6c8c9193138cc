/// Minimum gap between two physical writes to the backing medium (seconds)
/// The GitHub contents API rate-limits commits, so bursts are coalesced
pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 10;

/// File extension used for every table snapshot
pub const TABLE_FILE_EXTENSION: &str = "json";

/// Default GitHub REST endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// User agent sent to the GitHub API (required by GitHub)
pub const GITHUB_USER_AGENT: &str = concat!("shopfront-store/", env!("CARGO_PKG_VERSION"));

/// Maximum username length
pub const MAX_USERNAME_LEN: usize = 64;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum comment length in characters
pub const MAX_COMMENT_LEN: usize = 2_000;

/// Plans a user may subscribe to
pub const USER_PLANS: [&str; 3] = ["free", "premium", "enterprise"];

/// Currencies accepted on orders
pub const ORDER_CURRENCIES: [&str; 2] = ["CNY", "USD"];

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for invalid email format
pub const ERR_INVALID_EMAIL: &str = "Invalid email format";

/// Error message for unknown plan
pub const ERR_INVALID_PLAN: &str = "Plan must be one of: free, premium, enterprise";

/// Error message for unsupported currency
pub const ERR_INVALID_CURRENCY: &str = "Currency must be one of: CNY, USD";

/// Error message for order lines whose total does not fit in cents
pub const ERR_TOTAL_OVERFLOW: &str = "Order total is too large";

/// Error message for an update that changes nothing
pub const ERR_NO_CHANGES: &str = "No changes";

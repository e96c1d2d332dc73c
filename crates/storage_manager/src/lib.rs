//! storage_manager - durable key-value storage for session credentials
//!
//! The rest of the client treats storage as an opaque string-keyed store.
//! Three keys are in use: the bearer access token, the refresh token, and a
//! cached JSON snapshot of the user profile.

pub mod error;
pub mod storage;

pub use error::{Result, StorageError};
pub use storage::{FileStorage, KeyValueStorage};

/// Short-lived bearer token attached to authenticated requests.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Long-lived token exchanged for a fresh access token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Cached profile snapshot for optimistic rendering on cold start.
pub const USER_DATA_KEY: &str = "user_data";

/// Every key the session owns, in the order they are cleared on logout.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY];

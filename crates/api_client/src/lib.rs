//! api_client - resilient HTTP client for the BloodLink backend
//!
//! Wraps every outbound call with bearer-token attachment, bounded retries
//! with exponential backoff, and a single transparent token-refresh cycle on
//! authorization failure.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use error::{ApiError, Result};

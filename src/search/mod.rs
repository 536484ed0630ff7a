pub mod client;
pub mod query;

pub use client::{ApiClient, ApiError, SearchBackend};
pub use query::{SearchQuery, format_timestamp};

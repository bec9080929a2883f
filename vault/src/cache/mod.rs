//! Value/token caching.

mod manager;
mod token_cache;

pub use manager::{BatchPartition, CacheManager};
pub use token_cache::{CacheEntry, TokenCache};

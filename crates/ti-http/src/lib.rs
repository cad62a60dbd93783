mod cache;
mod fetcher;

pub use cache::{ContentCache, InMemoryCache};
pub use fetcher::{Fetcher, RetryConfig, DEFAULT_TIMEOUT};

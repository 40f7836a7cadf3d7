//! Hacker News search client: per-term result cache, pagination and local
//! dismissal, driven by a fetch controller that runs requests off the UI
//! thread.

pub mod cache;
pub mod config;
pub mod controller;
pub mod dismiss;
pub mod error;
pub mod hn_client;
pub mod models;
pub mod session;

pub use cache::QueryCache;
pub use config::Config;
pub use controller::{FetchController, LifetimeToken};
pub use error::{ConfigError, FetchError};
pub use hn_client::{HackerNewsClient, SearchBackend};
pub use models::{CacheEntry, Hit, PageResult, QueryKey};
pub use session::{needs_fetch, FetchOrigin, FetchRequest, KeyedError, Projection, SessionState};

// Library interface for festnews modules
// This allows tests and other binaries to import modules

pub mod error;
pub mod fetcher;
pub mod ingestion;
pub mod model;
pub mod server;
pub mod store;
pub mod translate;
pub mod view;

pub use error::{FetchError, RequestError};
pub use fetcher::{ArticleSource, FeedCatalog, FeedFetcher};
pub use model::{Article, Page, PageMeta, SortOrder};
pub use store::{ArticleStore, Cache, TopicCacheEntry};

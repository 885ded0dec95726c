//! Article download and text extraction.
//!
//! The stages only see the [`ArticleFetcher`] trait. [`HttpArticleFetcher`]
//! is the production implementation.

mod article;

pub use article::HttpArticleFetcher;

use crate::error::FetchError;
use async_trait::async_trait;

/// Turns a URL into the plain-text body of the article it points to.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

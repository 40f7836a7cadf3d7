use reqwest::blocking::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{PageResult, SearchResponse};

/// Anything that can fetch one page of results for a search term.
///
/// Called from worker threads, so implementations must be shareable.
pub trait SearchBackend: Send + Sync {
    fn search(&self, key: &str, page: u32) -> Result<PageResult, FetchError>;
}

pub struct HackerNewsClient {
    client: Client,
    base_url: String,
    hits_per_page: u32,
}

impl HackerNewsClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("hn-search/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            hits_per_page: config.hits_per_page,
        })
    }

    pub(crate) fn search_url(&self, key: &str, page: u32) -> String {
        format!(
            "{}/search?query={}&page={}&hitsPerPage={}",
            self.base_url,
            urlencoding::encode(key),
            page,
            self.hits_per_page
        )
    }
}

impl SearchBackend for HackerNewsClient {
    fn search(&self, key: &str, page: u32) -> Result<PageResult, FetchError> {
        let url = self.search_url(key, page);
        debug!(%url, "Requesting search page");

        let response = self.client.get(&url).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        let result = parsed.into_page(key);

        debug!(key, page = result.page, hits = result.hits.len(), "Search page received");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_the_term() {
        let client = HackerNewsClient::new(&Config::default()).unwrap();
        assert_eq!(
            client.search_url("c++ & rust", 2),
            "https://hn.algolia.com/api/v1/search?query=c%2B%2B%20%26%20rust&page=2&hitsPerPage=100"
        );
    }
}

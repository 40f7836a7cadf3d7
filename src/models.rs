use serde::{Deserialize, Deserializer};

/// Exact search term used as the cache partition key. No normalization.
pub type QueryKey = String;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Hit {
    #[serde(rename = "objectID")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(rename = "num_comments", default, deserialize_with = "null_as_default")]
    pub comment_count: u32,
    #[serde(rename = "points", default, deserialize_with = "null_as_default")]
    pub score: i64,
}

/// One page worth of results for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub key: QueryKey,
    pub hits: Vec<Hit>,
    pub page: u32,
}

/// Accumulated hits for a query. `page` is the page of the last merged result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub hits: Vec<Hit>,
    pub page: u32,
}

// Body of GET /search. The key is not echoed back by the index, so the
// client attaches the one it asked for.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<Hit>,
    pub page: u32,
}

impl SearchResponse {
    pub(crate) fn into_page(self, key: &str) -> PageResult {
        PageResult {
            key: key.to_string(),
            hits: self.hits,
            page: self.page,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

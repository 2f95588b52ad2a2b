//! REST collection endpoints: the archive and the subscription list.
//!
//! Both collections page identically (see [`crate::pagination`]); the
//! archive additionally accepts sort, filter, and search refinements, and
//! subscriptions carry per-id operations (delete, channel videos) plus an
//! unseen-updates counter.
//! Empty refinements are omitted from the query string entirely, since the
//! server distinguishes a missing parameter from a present-but-empty one.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ArchiveEntry, ChannelDump, Page, Subscription};

/// Header carrying the bearer credential on REST requests
const AUTH_HEADER: &str = "X-Authentication";

/// Query refinements for one archive page request
#[derive(Clone, Debug, Default)]
pub struct ArchiveQuery {
    /// Cursor: fetch rows after this row id (0 = from the beginning)
    pub cursor: i64,

    /// Maximum rows per page
    pub limit: usize,

    /// Sort order (e.g. "title_asc", "date_desc")
    pub sort_by: Option<String>,

    /// Only entries from this uploader/channel
    pub filter_uploader: Option<String>,

    /// Only entries in this container format (e.g. "mp4")
    pub filter_format: Option<String>,

    /// Only entries at least this many seconds long
    pub filter_min_duration: Option<i64>,

    /// Only entries at most this many seconds long
    pub filter_max_duration: Option<i64>,

    /// Free-text title search
    pub search_query: Option<String>,
}

impl ArchiveQuery {
    /// Page starting at `cursor`, `limit` rows, no refinements
    pub fn page(cursor: i64, limit: usize) -> Self {
        Self {
            cursor,
            limit,
            ..Default::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("id", self.cursor.to_string()),
            ("limit", self.limit.to_string()),
        ];

        let optional_strings = [
            ("sort_by", &self.sort_by),
            ("filter_uploader", &self.filter_uploader),
            ("filter_format", &self.filter_format),
            ("search_query", &self.search_query),
        ];
        for (name, value) in optional_strings {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((name, value.to_string()));
            }
        }

        if let Some(min) = self.filter_min_duration {
            params.push(("filter_min_duration", min.to_string()));
        }
        if let Some(max) = self.filter_max_duration {
            params.push(("filter_max_duration", max.to_string()));
        }

        params
    }
}

/// Client for the paginated REST collections
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl RestClient {
    /// Build a client from the shared configuration
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.endpoints.rest_base_url)
            .map_err(|_| Error::InvalidEndpoint(config.endpoints.rest_base_url.clone()))?;
        let http = reqwest::Client::builder()
            .timeout(config.sync.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Fetch one page of the archive
    pub async fn archive(&self, query: &ArchiveQuery) -> Result<Page<ArchiveEntry>> {
        self.get_page("archive", &query.params()).await
    }

    /// Fetch one page of the subscription list
    pub async fn subscriptions(&self, cursor: i64, limit: usize) -> Result<Page<Subscription>> {
        let params = [("id", cursor.to_string()), ("limit", limit.to_string())];
        self.get_page("subscriptions", &params).await
    }

    /// Remove a subscription by id
    pub async fn delete_subscription(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&format!("subscriptions/{id}"))?;

        tracing::debug!(%url, "Deleting subscription");

        self.authed(self.http.delete(url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fetch the extractor dump of a subscribed channel's videos
    pub async fn subscription_videos(&self, id: &str) -> Result<ChannelDump> {
        let url = self.endpoint(&format!("subscriptions/{id}/videos"))?;

        tracing::debug!(%url, "Fetching subscription channel videos");

        let dump = self
            .authed(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<ChannelDump>()
            .await?;
        Ok(dump)
    }

    /// Number of unseen videos across all subscriptions.
    ///
    /// Intended to be re-polled at a coarse interval; the count only moves
    /// when the server's subscription checker runs.
    pub async fn subscription_updates_count(&self) -> Result<u64> {
        let url = self.endpoint("subscriptions/updates/count")?;

        let counter = self
            .authed(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<UpdateCount>()
            .await?;
        Ok(counter.count)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Page<T>> {
        let url = self.endpoint(path)?;

        tracing::debug!(%url, ?params, "Fetching collection page");

        let page = self
            .authed(self.http.get(url).query(params))
            .send()
            .await?
            .error_for_status()?
            .json::<Page<T>>()
            .await?;
        Ok(page)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|_| Error::InvalidEndpoint(format!("{}{path}", self.base_url)))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header(AUTH_HEADER, token),
            None => req,
        }
    }
}

/// Wire shape of the unseen-updates counter
#[derive(Debug, Deserialize)]
struct UpdateCount {
    count: u64,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_query_carries_only_cursor_and_limit() {
        let params = ArchiveQuery::page(0, 10).params();
        assert_eq!(
            params,
            vec![("id", "0".to_string()), ("limit", "10".to_string())]
        );
    }

    #[test]
    fn empty_refinements_are_omitted() {
        let query = ArchiveQuery {
            sort_by: Some(String::new()),
            filter_uploader: Some(String::new()),
            ..ArchiveQuery::page(5, 20)
        };
        let params = query.params();
        assert!(
            params.iter().all(|(name, _)| *name == "id" || *name == "limit"),
            "present-but-empty refinements must not reach the query string"
        );
    }

    #[test]
    fn populated_refinements_use_server_parameter_names() {
        let query = ArchiveQuery {
            sort_by: Some("date_desc".to_string()),
            filter_uploader: Some("SomeChannel".to_string()),
            filter_format: Some("mp4".to_string()),
            filter_min_duration: Some(60),
            filter_max_duration: Some(600),
            search_query: Some("rust talks".to_string()),
            ..ArchiveQuery::page(100, 50)
        };

        let params = query.params();
        let lookup = |name: &str| {
            params
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(lookup("sort_by"), Some("date_desc"));
        assert_eq!(lookup("filter_uploader"), Some("SomeChannel"));
        assert_eq!(lookup("filter_format"), Some("mp4"));
        assert_eq!(lookup("filter_min_duration"), Some("60"));
        assert_eq!(lookup("filter_max_duration"), Some("600"));
        assert_eq!(lookup("search_query"), Some("rust talks"));
    }
}

//! HTTP retrieval of timetable feeds.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use hypercal_core::{BoxFuture, CoreResult, FeedCalendar, FeedError, FeedFetcher};

use crate::ics::parse_feed;

/// Settings for [`HttpFeedFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// URL prefixes a feed must start with.
    pub allowed_prefixes: Vec<String>,

    /// Timeout of one feed download.
    pub timeout: Duration,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec![Self::DEFAULT_ALLOWED_PREFIX.to_string()],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: Self::default_user_agent(),
        }
    }
}

impl FetcherConfig {
    /// Host prefix of the timetable software.
    pub const DEFAULT_ALLOWED_PREFIX: &'static str = "https://hplanning";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Returns the default user agent, `hypercal/<version>`.
    pub fn default_user_agent() -> String {
        format!("hypercal/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Replaces the accepted URL prefixes.
    pub fn with_allowed_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the download timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Checks that `url` may be fetched, without any network access.
    ///
    /// # Errors
    ///
    /// [`FeedError::UnsupportedFeedUrl`] when no allowed prefix matches,
    /// [`FeedError::MalformedFeedUrl`] when the URL does not parse.
    pub fn check_url(&self, url: &str) -> CoreResult<Url> {
        if !self
            .allowed_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
        {
            return Err(FeedError::unsupported_url(url));
        }
        Url::parse(url).map_err(|e| FeedError::malformed_url(url, e.to_string()))
    }
}

/// Fetches feeds over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFeedFetcher {
    /// Creates a fetcher with the given settings.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(config: FetcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Returns the fetcher settings.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    async fn download(&self, url: &str) -> CoreResult<String> {
        let target = self.config.check_url(url)?;

        debug!(url = %url, "Downloading feed");
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| FeedError::unreachable(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Feed server returned an error");
            return Err(FeedError::unreachable(url, format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::unreachable(url, e.to_string()))
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, CoreResult<FeedCalendar>> {
        Box::pin(async move {
            let body = self.download(url).await?;
            let calendar = parse_feed(&body).ok_or_else(|| FeedError::empty(url))?;
            debug!(
                url = %url,
                components = calendar.components.len(),
                "Fetched feed"
            );
            Ok(calendar)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypercal_core::FeedErrorKind;
    use mockito::Server;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
                        VERSION:2.0\r\n\
                        BEGIN:VEVENT\r\n\
                        UID:evt-1\r\n\
                        DTSTART:20250205T080000Z\r\n\
                        DTEND:20250205T100000Z\r\n\
                        SUMMARY:B-INFO-204 - Algorithms - TD\r\n\
                        END:VEVENT\r\n\
                        END:VCALENDAR\r\n";

    fn fetcher_for(server: &Server) -> HttpFeedFetcher {
        let config = FetcherConfig::default().with_allowed_prefixes([server.url()]);
        HttpFeedFetcher::new(config).unwrap()
    }

    #[test]
    fn default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.allowed_prefixes, vec!["https://hplanning".to_string()]);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("hypercal/"));
    }

    #[test]
    fn check_url_policy() {
        let config = FetcherConfig::default();

        assert!(config.check_url("https://hplanning2025.univ.example/ical?id=1").is_ok());
        assert_eq!(
            config.check_url("https://evil.example/feed.ics").unwrap_err().kind(),
            FeedErrorKind::UnsupportedFeedUrl
        );
        assert_eq!(
            config
                .check_url("https://evil.example/?next=https://hplanning.example/a.ics")
                .unwrap_err()
                .kind(),
            FeedErrorKind::UnsupportedFeedUrl
        );
        assert_eq!(
            config.check_url("https://hplanning:notaport/feed.ics").unwrap_err().kind(),
            FeedErrorKind::MalformedFeedUrl
        );
    }

    #[tokio::test]
    async fn fetches_and_parses_feed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/feed.ics")
            .match_header("user-agent", mockito::Matcher::Regex("^hypercal/".to_string()))
            .with_status(200)
            .with_header("content-type", "text/calendar")
            .with_body(FEED)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server);
        let calendar = fetcher
            .fetch(&format!("{}/feed.ics", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        let uids: Vec<_> = calendar.events().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, ["evt-1"]);
    }

    #[tokio::test]
    async fn http_error_is_unreachable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/feed.ics")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/feed.ics", server.url());
        let err = fetcher_for(&server).fetch(&url).await.unwrap_err();

        assert_eq!(err.kind(), FeedErrorKind::SourceUnreachable);
        assert_eq!(err.url(), url);
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn body_without_calendar_is_empty_source() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/feed.ics")
            .with_status(200)
            .with_body("<html>Maintenance</html>")
            .create_async()
            .await;

        let url = format!("{}/feed.ics", server.url());
        let err = fetcher_for(&server).fetch(&url).await.unwrap_err();

        assert_eq!(err, FeedError::empty(url));
    }

    #[tokio::test]
    async fn rejected_url_is_not_requested() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let fetcher = HttpFeedFetcher::new(FetcherConfig::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/feed.ics", server.url()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FeedErrorKind::UnsupportedFeedUrl);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_failure_is_unreachable() {
        let config = FetcherConfig::default()
            .with_allowed_prefixes(["http://127.0.0.1:1/"])
            .with_timeout(Duration::from_secs(2));
        let fetcher = HttpFeedFetcher::new(config).unwrap();

        let err = fetcher.fetch("http://127.0.0.1:1/feed.ics").await.unwrap_err();
        assert_eq!(err.kind(), FeedErrorKind::SourceUnreachable);
    }
}

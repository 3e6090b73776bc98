//! HTTP fetcher for timeline pages
//!
//! One request per page, with two distinct recovery policies:
//! - HTTP 429 is a scheduling signal, not an error: cool down for the
//!   configured period and retry the same page for as long as it takes.
//! - Transient transport failures get a bounded fixed-delay retry; when
//!   that is exhausted the failure is returned as data for the controller
//!   to act on, never raised.

use crate::config::{MirrorConfig, PacingConfig};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchResult {
    /// Page fetched with a 2xx status
    Success {
        /// Raw document body
        body: String,
        /// HTTP status code
        status: u16,
    },

    /// Non-2xx response (other than 429, which is waited out internally)
    HttpError { status: u16 },

    /// Transport-level failure after retries were exhausted
    NetworkError { error: String },
}

/// Builds the HTTP client used for every page request
///
/// The request shape (user agent, Accept, Accept-Language) is purely an
/// anti-throttling measure and has no effect on parsing.
pub fn build_http_client(config: &MirrorConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml"),
    );
    let accept_language = HeaderValue::from_str(&config.accept_language)
        .unwrap_or_else(|_| HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(ACCEPT_LANGUAGE, accept_language);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one timeline page for a feed owner
///
/// Loops on HTTP 429 with the configured cooldown until a non-429 response
/// arrives. Every other non-2xx status and any retry-exhausted transport
/// failure is returned to the caller, which decides whether that ends the
/// run.
pub async fn fetch_page(
    client: &Client,
    mirror: &MirrorConfig,
    pacing: &PacingConfig,
    owner: &str,
    cursor: Option<&str>,
    with_replies: bool,
) -> FetchResult {
    let url = page_url(&mirror.base_url, owner, cursor, with_replies);

    loop {
        let referer = pick_referer(&mirror.referers);
        let attempt = send_with_retry(
            client,
            &url,
            referer,
            pacing.retry_attempts,
            Duration::from_millis(pacing.retry_delay_ms),
        )
        .await;

        match attempt {
            Ok(response) => {
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    tracing::warn!(
                        %url,
                        cooldown_secs = pacing.rate_limit_cooldown_secs,
                        "rate limited, cooling down before retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(pacing.rate_limit_cooldown_secs)).await;
                    continue;
                }

                if !status.is_success() {
                    return FetchResult::HttpError {
                        status: status.as_u16(),
                    };
                }

                match response.text().await {
                    Ok(body) => {
                        tracing::debug!(%url, bytes = body.len(), "fetched page");
                        return FetchResult::Success {
                            body,
                            status: status.as_u16(),
                        };
                    }
                    Err(e) => {
                        return FetchResult::NetworkError {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                return FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Sends one GET, retrying transient transport failures a bounded number
/// of times with a fixed delay
async fn send_with_retry(
    client: &Client,
    url: &str,
    referer: Option<&str>,
    attempts: u32,
    delay: Duration,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut attempt = 0;
    loop {
        let mut request = client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        match request.send().await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt >= attempts {
                    return Err(e);
                }
                attempt += 1;
                tracing::debug!(%url, attempt, error = %e, "transient fetch failure, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Builds the page URL from the mirror base, owner, and pagination state
fn page_url(base: &str, owner: &str, cursor: Option<&str>, with_replies: bool) -> String {
    let mut url = format!("{}/{}", base.trim_end_matches('/'), owner);
    if with_replies {
        url.push_str("/with_replies");
    }
    if let Some(cursor) = cursor {
        url.push_str("?cursor=");
        url.push_str(cursor);
    }
    url
}

/// Picks a referer from the rotation pool, if one is configured
fn pick_referer(pool: &[String]) -> Option<&str> {
    if pool.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..pool.len());
    Some(pool[idx].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;

    #[test]
    fn test_page_url_plain() {
        assert_eq!(
            page_url("https://nitter.net", "alice", None, false),
            "https://nitter.net/alice"
        );
    }

    #[test]
    fn test_page_url_trims_trailing_slash() {
        assert_eq!(
            page_url("https://nitter.net/", "alice", None, false),
            "https://nitter.net/alice"
        );
    }

    #[test]
    fn test_page_url_with_replies_and_cursor() {
        assert_eq!(
            page_url("https://nitter.net", "alice", Some("AbC%3D"), true),
            "https://nitter.net/alice/with_replies?cursor=AbC%3D"
        );
    }

    #[test]
    fn test_pick_referer_empty_pool() {
        assert_eq!(pick_referer(&[]), None);
    }

    #[test]
    fn test_pick_referer_draws_from_pool() {
        let pool = vec![
            "https://www.google.com/".to_string(),
            "https://duckduckgo.com/".to_string(),
        ];
        for _ in 0..20 {
            let picked = pick_referer(&pool).unwrap();
            assert!(pool.iter().any(|r| r == picked));
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&MirrorConfig::default()).is_ok());
    }

    #[test]
    fn test_build_http_client_with_odd_accept_language() {
        // A non-ASCII header value falls back to the default instead of failing
        let mut config = MirrorConfig::default();
        config.accept_language = "sí\u{0}".to_string();
        assert!(build_http_client(&config).is_ok());
    }
}

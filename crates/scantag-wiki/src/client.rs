//! HTTP client wrapper with rate limiting and maxlag handling

use crate::error::{Error, Result};
use governor::{Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Rate limiter shared by every request to one API
pub type ApiRateLimiter = Arc<
    RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

/// Seconds to wait when a lag refusal carries no `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Connection settings for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout: Duration,
    /// Client-side request rate; `None` disables rate limiting
    pub requests_per_second: Option<u32>,
    /// `maxlag` parameter sent with every request
    pub maxlag: Option<u32>,
    /// How many lag refusals to sit out before giving up
    pub maxlag_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: format!("scantag/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            requests_per_second: Some(1),
            maxlag: Some(5),
            maxlag_retries: 10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
}

/// HTTP client wrapper for Action API requests
///
/// Every request is sent with `format=json&formatversion=2`. An `error`
/// object in the response becomes [`Error::Api`], except lag refusals and
/// HTTP 429, which are waited out and retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<ApiRateLimiter>,
    maxlag: Option<u32>,
    maxlag_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with a session cookie store
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .cookie_store(true)
            .build()?;

        let rate_limiter = options
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client,
            rate_limiter,
            maxlag: options.maxlag,
            maxlag_retries: options.maxlag_retries,
        })
    }

    /// Wait for rate limiter if enabled
    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Make a GET request and return the JSON body
    pub async fn get_json(&self, url: &Url, params: &[(&str, &str)]) -> Result<Value> {
        self.request(Method::Get, url, params).await
    }

    /// Make a form POST request and return the JSON body
    pub async fn post_form(&self, url: &Url, params: &[(&str, &str)]) -> Result<Value> {
        self.request(Method::Post, url, params).await
    }

    async fn request(&self, method: Method, url: &Url, params: &[(&str, &str)]) -> Result<Value> {
        let maxlag = self.maxlag.map(|m| m.to_string());
        let mut all_params: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 3);
        all_params.extend_from_slice(params);
        all_params.push(("format", "json"));
        all_params.push(("formatversion", "2"));
        if let Some(maxlag) = maxlag.as_deref() {
            all_params.push(("maxlag", maxlag));
        }

        let mut lagged = 0;
        loop {
            self.wait_for_rate_limit().await;

            let request = match method {
                Method::Get => self.client.get(url.clone()).query(&all_params),
                Method::Post => self.client.post(url.clone()).form(&all_params),
            };
            let response = request.send().await?;

            let status = response.status();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await?;

            let body: Option<Value> = serde_json::from_str(&text).ok();
            let lag_refusal = status == StatusCode::TOO_MANY_REQUESTS
                || body
                    .as_ref()
                    .and_then(|b| b.pointer("/error/code"))
                    .and_then(Value::as_str)
                    == Some("maxlag");

            if lag_refusal {
                if lagged >= self.maxlag_retries {
                    return Err(Error::MaxlagExceeded(self.maxlag_retries));
                }
                lagged += 1;
                let wait = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                warn!(wait_secs = wait, attempt = lagged, "server lagged, waiting");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            let body = match body {
                Some(body) => body,
                None if !status.is_success() => {
                    return Err(Error::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    })
                }
                None => serde_json::from_str(&text)?,
            };

            if let Some(error) = body.get("error") {
                let code = error
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let info = error.get("info").and_then(Value::as_str).unwrap_or("");
                debug!(code, info, "API returned an error");
                return Err(Error::api(code, info));
            }

            if !status.is_success() {
                return Err(Error::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            return Ok(body);
        }
    }
}

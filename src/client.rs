//! Client for The Odds API v4.
//!
//! Every call is rate limited, retried on `429`/`5xx`, and decoded into the typed payloads of
//! [`crate::types::response`].
//!
//! # Example
//!
//! ```no_run
//! use oddsapi_client_sdk::client::{Client, Config};
//! use oddsapi_client_sdk::types::{MarketKey, Region};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("my-api-key", Config::default())?;
//!
//! let mut params = client.odds_params_upcoming();
//! params.set_regions([Region::Us, Region::Uk])?;
//! params.set_markets([MarketKey::Spreads])?;
//!
//! let response = client.odds(&mut params).await?;
//! for odds in response.data() {
//!     println!("{} vs {}", odds.home_team, odds.away_team);
//! }
//! println!("requests remaining: {:?}", response.requests_remaining());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff as _;
use bon::Builder;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, Request, StatusCode};
use secrecy::{ExposeSecret as _, SecretString};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, ResponseMeta};
use crate::rate_limit::{DEFAULT_PERCENT_OF_LIMIT, LazyRateLimiter, RateLimitConfig, RateLimiter};
use crate::retry::{LinearJitterBackoff, should_retry};
use crate::types::DateFormat;
use crate::types::request::{EventOddsParams, EventsParams, OddsParams, SportsParams};
use crate::types::response::{Event, Odds, Sports};
use crate::{Result, request_handler, serde_helpers};

/// The production API host.
pub const DEFAULT_HOST: &str = "https://api.the-odds-api.com/";
pub const DEFAULT_USER_AGENT: &str = "oddsapi-client-sdk";
/// Requests per second allowed when no ceiling is configured.
pub const DEFAULT_RATE_LIMIT: u32 = 10;

const REQUESTS_REMAINING: &str = "x-requests-remaining";
const REQUESTS_USED: &str = "x-requests-used";
const REQUESTS_LAST: &str = "x-requests-last";

/// Settings fixed for the lifetime of a [`Client`].
#[non_exhaustive]
#[derive(Clone, Debug, Builder)]
pub struct Config {
    /// Requests-per-second ceiling of the account. Must be at least one.
    #[builder(default = DEFAULT_RATE_LIMIT)]
    rate_limit: u32,
    /// Share of `rate_limit` sustained by the limiter, in `(0, 1]`. The remainder sizes the
    /// burst. Defaults to `0.75`.
    percent_of_limit: Option<f64>,
    #[builder(into, default = DEFAULT_USER_AGENT.to_owned())]
    user_agent: String,
    /// Retries after the first attempt for `429`/`5xx` responses.
    #[builder(default = 5)]
    max_retries: u32,
    #[builder(default = Duration::from_secs(1))]
    retry_wait_min: Duration,
    #[builder(default = Duration::from_secs(2))]
    retry_wait_max: Duration,
    /// Per-attempt transport timeout. Unbounded when unset.
    timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl Config {
    #[must_use]
    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    #[must_use]
    pub fn percent_of_limit(&self) -> f64 {
        self.percent_of_limit.unwrap_or(DEFAULT_PERCENT_OF_LIMIT)
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// A decoded payload together with the HTTP exchange that produced it.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct Response<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub data: T,
}

impl<T> Response<T> {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, data: T) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// The canonical reason phrase for [`Self::status`], e.g. `"OK"`.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or_default()
    }

    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }

    /// Usage credits left on the account, from `x-requests-remaining`.
    #[must_use]
    pub fn requests_remaining(&self) -> Option<u64> {
        quota(&self.headers, REQUESTS_REMAINING)
    }

    /// Usage credits spent since the quota last reset, from `x-requests-used`.
    #[must_use]
    pub fn requests_used(&self) -> Option<u64> {
        quota(&self.headers, REQUESTS_USED)
    }

    /// Usage cost of this request, from `x-requests-last`.
    #[must_use]
    pub fn requests_last(&self) -> Option<u64> {
        quota(&self.headers, REQUESTS_LAST)
    }

    #[must_use]
    pub fn meta(&self) -> ResponseMeta {
        ResponseMeta {
            status: self.status,
            headers: self.headers.clone(),
        }
    }
}

fn quota(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// The capability [`request_handler`](crate::request_handler) needs from a client.
#[async_trait]
pub trait RequestClient: Send + Sync {
    /// Base URL request paths are joined onto.
    fn base_url(&self) -> &Url;

    /// Builds a `GET` for `url`.
    ///
    /// The `User-Agent` header is set first; entries in `headers` are merged afterwards and
    /// replace any header with the same name, including `User-Agent`.
    fn new_get_request(&self, url: Url, headers: Option<&HeaderMap>) -> Result<Request>;

    /// Sends `request`, retrying retryable statuses, and decodes the body as `T`.
    async fn execute<T: DeserializeOwned + Send>(&self, request: Request) -> Result<Response<T>>;
}

/// HTTP client for The Odds API.
///
/// Cloning is cheap and clones share the rate limiter.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
    /// Observed while waiting on the limiter, the server, and retry backoff
    cancel: CancellationToken,
}

#[derive(Debug)]
struct ClientInner {
    config: Config,
    /// The [`Url`] against which `client` is making requests.
    host: Url,
    api_token: SecretString,
    user_agent: Option<HeaderValue>,
    /// The inner [`ReqwestClient`] used to make requests to `host`.
    client: ReqwestClient,
    limiter: LazyRateLimiter,
}

impl Client {
    /// Creates a client for [`DEFAULT_HOST`].
    ///
    /// Fails with [`Kind::Validation`](crate::error::Kind::Validation) when the rate limit
    /// settings are out of range.
    pub fn new<S: Into<String>>(api_token: S, config: Config) -> Result<Client> {
        Self::with_host(DEFAULT_HOST, api_token, config)
    }

    /// Creates a client for `host`, appending a trailing `/` when missing.
    pub fn with_host<S: Into<String>>(host: &str, api_token: S, config: Config) -> Result<Client> {
        let host = if host.ends_with('/') {
            Url::parse(host)?
        } else {
            Url::parse(&format!("{host}/"))?
        };

        let limits = RateLimitConfig::new(config.rate_limit, config.percent_of_limit())?;
        let user_agent = (!config.user_agent.is_empty())
            .then(|| HeaderValue::from_str(&config.user_agent))
            .transpose()?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                host,
                api_token: SecretString::from(api_token.into()),
                user_agent,
                client: builder.build()?,
                limiter: LazyRateLimiter::new(limits),
            }),
            cancel: CancellationToken::new(),
        })
    }

    /// Returns a client sharing this one's connection pool and rate limiter whose calls abort
    /// with [`Kind::Cancelled`](crate::error::Kind::Cancelled) once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Client {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    /// Returns the base URL of the API.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.inner.host
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The shared limiter, once the first request has completed.
    #[must_use]
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.inner.limiter.get()
    }

    #[must_use]
    pub fn sports_params(&self) -> SportsParams {
        SportsParams::new(self.inner.api_token.expose_secret())
    }

    #[must_use]
    pub fn odds_params<S: Into<String>>(&self, sport_key: S) -> OddsParams {
        OddsParams::new(self.inner.api_token.expose_secret(), sport_key)
    }

    /// Odds parameters for the next events across all sports.
    #[must_use]
    pub fn odds_params_upcoming(&self) -> OddsParams {
        OddsParams::upcoming(self.inner.api_token.expose_secret())
    }

    #[must_use]
    pub fn events_params<S: Into<String>>(&self, sport_key: S) -> EventsParams {
        let mut params = EventsParams::new(self.inner.api_token.expose_secret(), sport_key);
        params.set_date_format(DateFormat::default());
        params
    }

    #[must_use]
    pub fn event_odds_params<S: Into<String>, E: Into<String>>(
        &self,
        sport_key: S,
        event_key: E,
    ) -> EventOddsParams {
        EventOddsParams::new(self.inner.api_token.expose_secret(), sport_key, event_key)
    }

    /// Lists in-season sports.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a list of sports.
    pub async fn sports(&self) -> Result<Response<Vec<Sports>>> {
        request_handler(&mut self.sports_params(), self).await
    }

    /// Lists upcoming and live events with bookmaker odds for a sport.
    ///
    /// `params` is normalized in place before encoding.
    pub async fn odds(&self, params: &mut OddsParams) -> Result<Response<Vec<Odds>>> {
        request_handler(params, self).await
    }

    /// Lists upcoming and live events for a sport, without odds.
    pub async fn events(&self, params: &mut EventsParams) -> Result<Response<Vec<Event>>> {
        request_handler(params, self).await
    }

    /// Odds for a single event.
    pub async fn event_odds(&self, params: &mut EventOddsParams) -> Result<Response<Odds>> {
        request_handler(params, self).await
    }

    fn backoff(&self) -> LinearJitterBackoff {
        let config = &self.inner.config;
        LinearJitterBackoff::new(
            config.retry_wait_min,
            config.retry_wait_max,
            config.max_retries,
        )
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip(self, request),
            fields(
                method = %request.method(),
                path = request.url().path(),
                status_code
            )
        )
    )]
    async fn dispatch<T: DeserializeOwned>(&self, request: Request) -> Result<Response<T>> {
        let method = request.method().clone();
        let path = request.url().path().to_owned();

        if self.cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        if let Some(limiter) = self.inner.limiter.get() {
            limiter.acquire(&self.cancel).await?;
        }

        let mut backoff = self.backoff();
        let response = loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| Error::construction("request body cannot be replayed"))?;

            let response = tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::cancelled()),
                response = self.inner.client.execute(attempt) => response?,
            };

            let status = response.status();
            if !should_retry(status) {
                break response;
            }
            let Some(wait) = backoff.next_backoff() else {
                break response;
            };

            #[cfg(feature = "tracing")]
            tracing::warn!(
                status = %status,
                attempt = backoff.attempts(),
                ?wait,
                "retryable response, backing off"
            );

            tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::cancelled()),
                _ = response.bytes() => {}
            }
            tokio::select! {
                () = self.cancel.cancelled() => return Err(Error::cancelled()),
                () = tokio::time::sleep(wait) => {}
            }
        };

        self.inner.limiter.get_or_init();

        let status = response.status();
        let headers = response.headers().clone();
        let meta = ResponseMeta {
            status,
            headers: headers.clone(),
        };

        #[cfg(feature = "tracing")]
        tracing::Span::current().record("status_code", status.as_u16());

        let body = tokio::select! {
            () = self.cancel.cancelled() => return Err(Error::cancelled()),
            body = response.bytes() => body.map_err(|e| Error::from(e).with_response(meta.clone()))?,
        };

        if should_retry(status) {
            let message = String::from_utf8_lossy(&body);

            #[cfg(feature = "tracing")]
            tracing::warn!(
                status = %status,
                method = %method,
                path = %path,
                message = %message,
                "retries exhausted"
            );

            return Err(Error::status(status, method, path, message).with_response(meta));
        }

        let data = serde_helpers::decode_with_warnings(&body).map_err(|e| e.with_response(meta))?;

        Ok(Response {
            status,
            headers,
            data,
        })
    }
}

#[async_trait]
impl RequestClient for Client {
    fn base_url(&self) -> &Url {
        &self.inner.host
    }

    fn new_get_request(&self, url: Url, headers: Option<&HeaderMap>) -> Result<Request> {
        let mut request_headers = HeaderMap::new();
        if let Some(user_agent) = &self.inner.user_agent {
            request_headers.insert(USER_AGENT, user_agent.clone());
        }
        if let Some(headers) = headers {
            request_headers.extend(headers.clone());
        }

        Ok(self
            .inner
            .client
            .request(Method::GET, url)
            .headers(request_headers)
            .build()?)
    }

    async fn execute<T: DeserializeOwned + Send>(&self, request: Request) -> Result<Response<T>> {
        self.dispatch(request).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderName;

    use super::*;
    use crate::error::Kind;
    use crate::types::request::Params as _;

    fn client() -> Client {
        Client::new("api-token", Config::default()).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = Config::default();

        assert_eq!(config.rate_limit(), 10);
        assert!((config.percent_of_limit() - 0.75).abs() < f64::EPSILON, "default share");
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(config.max_retries(), 5);
        assert_eq!(config.retry_wait_min, Duration::from_secs(1));
        assert_eq!(config.retry_wait_max, Duration::from_secs(2));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn invalid_config_should_fail_validation() {
        let config = Config::builder().percent_of_limit(1.5).build();
        let err = Client::new("api-token", config).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);

        let config = Config::builder().rate_limit(0).build();
        let err = Client::new("api-token", config).unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn invalid_host_should_fail_construction() {
        let err = Client::with_host("not a url", "api-token", Config::default()).unwrap_err();

        assert_eq!(err.kind(), Kind::Construction);
    }

    #[test]
    fn host_should_gain_trailing_slash() {
        let client =
            Client::with_host("http://localhost:8080/proxy", "api-token", Config::default())
                .unwrap();

        assert_eq!(client.host().as_str(), "http://localhost:8080/proxy/");
        assert_eq!(client.base_url(), client.host());
    }

    #[test]
    fn factories_should_inject_token() {
        let client = client();
        let mut params = client.sports_params();

        let url = params.build_path(client.host()).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.the-odds-api.com/v4/sports?apiKey=api-token"
        );
        assert_eq!(client.odds_params_upcoming().sport_key, "upcoming");
        assert_eq!(
            client.events_params("soccer_epl").date_format,
            Some(DateFormat::Iso)
        );
        let event_odds = client.event_odds_params("soccer_epl", "e1");
        assert_eq!(event_odds.event_key, "e1");
        assert_eq!(event_odds.api_token.expose_secret(), "api-token");
    }

    #[test]
    fn new_get_request_should_set_user_agent() {
        let client = client();
        let url = Url::parse("https://api.the-odds-api.com/v4/sports").unwrap();

        let request = client.new_get_request(url, None).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.headers()[USER_AGENT], DEFAULT_USER_AGENT);
    }

    #[test]
    fn new_get_request_caller_headers_should_override() {
        let client = client();
        let url = Url::parse("https://api.the-odds-api.com/v4/sports").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("custom/1.0"));
        headers.insert(
            HeaderName::from_static("x-trace-id"),
            HeaderValue::from_static("abc"),
        );

        let request = client.new_get_request(url, Some(&headers)).unwrap();

        assert_eq!(request.headers()[USER_AGENT], "custom/1.0");
        assert_eq!(request.headers()["x-trace-id"], "abc");
        assert_eq!(request.headers().get_all(USER_AGENT).iter().count(), 1);
    }

    #[test]
    fn empty_user_agent_should_be_omitted() {
        let client = Client::new("api-token", Config::builder().user_agent("").build()).unwrap();
        let url = Url::parse("https://api.the-odds-api.com/v4/sports").unwrap();

        let request = client.new_get_request(url, None).unwrap();

        assert!(request.headers().get(USER_AGENT).is_none(), "no user agent");
    }

    #[test]
    fn with_cancellation_should_share_limiter() {
        let client = client();
        let cancellable = client.with_cancellation(CancellationToken::new());

        assert!(Arc::ptr_eq(&client.inner, &cancellable.inner), "shared state");
        assert!(client.rate_limiter().is_none(), "nothing completed yet");
    }

    #[test]
    fn response_quota_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUESTS_REMAINING, HeaderValue::from_static("485"));
        headers.insert(REQUESTS_USED, HeaderValue::from_static(" 15 "));
        headers.insert(REQUESTS_LAST, HeaderValue::from_static("n/a"));
        let response = Response {
            status: StatusCode::OK,
            headers,
            data: (),
        };

        assert_eq!(response.requests_remaining(), Some(485));
        assert_eq!(response.requests_used(), Some(15));
        assert_eq!(response.requests_last(), None);
        assert_eq!(response.status_text(), "OK");
    }
}

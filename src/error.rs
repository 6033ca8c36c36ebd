use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

/// HTTP method type, re-exported for use with error inspection.
pub use reqwest::Method;
/// HTTP status code type, re-exported for use with error inspection.
pub use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap};

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A required identifier was missing or an enumerated literal was invalid. No request was
    /// sent.
    Validation,
    /// The request URL or the request itself could not be constructed. No request was sent.
    Construction,
    /// The HTTP exchange failed, or the server kept answering with a retryable status until
    /// retries were exhausted
    Transport,
    /// The response body was not valid JSON for the expected shape
    Decode,
    /// The call's [`CancellationToken`](tokio_util::sync::CancellationToken) fired while waiting
    /// on the rate limiter, the server, or a retry backoff
    Cancelled,
}

/// Status and headers of an HTTP exchange that completed before an error was raised.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseMeta {
    /// The canonical reason phrase for [`Self::status`], e.g. `"Not Found"`.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
    response: Option<Box<ResponseMeta>>,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
            response: None,
        }
    }

    /// Attaches the status and headers of the exchange that produced this error.
    #[must_use]
    pub fn with_response(mut self, response: ResponseMeta) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// The HTTP exchange observed before this error was raised, if any.
    ///
    /// Always present for [`Kind::Decode`] and for [`Kind::Transport`] errors raised after the
    /// retry budget ran out on a `429`/`5xx` status.
    pub fn response(&self) -> Option<&ResponseMeta> {
        self.response.as_deref()
    }

    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn construction<S: Into<String>>(message: S) -> Self {
        Error::with_source(
            Kind::Construction,
            Construction {
                reason: message.into(),
            },
        )
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Cancelled.into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// A retryable status (`429` or `5xx`) that persisted through every retry.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Construction {
    pub reason: String,
}

impl fmt::Display for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to construct request: {}", self.reason)
    }
}

impl StdError for Construction {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request cancelled before completion")
    }
}

impl StdError for Cancelled {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Error::with_source(Kind::Construction, e)
        } else {
            Error::with_source(Kind::Transport, e)
        }
    }
}

impl From<header::InvalidHeaderValue> for Error {
    fn from(e: header::InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Construction, e)
    }
}

impl From<header::InvalidHeaderName> for Error {
    fn from(e: header::InvalidHeaderName) -> Self {
        Error::with_source(Kind::Construction, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Decode, e)
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(e: serde_html_form::ser::Error) -> Self {
        Error::with_source(Kind::Construction, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Construction, e)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(e: chrono::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Transport, err)
    }
}

impl From<Cancelled> for Error {
    fn from(err: Cancelled) -> Self {
        Error::with_source(Kind::Cancelled, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_should_succeed() {
        let error = Error::validation("sport key is empty");

        assert_eq!(error.kind(), Kind::Validation);
        assert_eq!(error.to_string(), "Validation: invalid: sport key is empty");
        assert!(error.response().is_none(), "no exchange happened");
    }

    #[test]
    fn status_into_transport_error_should_succeed() {
        let error = Error::status(
            StatusCode::TOO_MANY_REQUESTS,
            Method::GET,
            "/v4/sports".to_owned(),
            "slow down",
        );

        assert_eq!(error.kind(), Kind::Transport);
        let status = error.downcast_ref::<Status>().unwrap();
        assert_eq!(status.status_code, StatusCode::TOO_MANY_REQUESTS);
        assert!(error.to_string().contains("/v4/sports"));
    }

    #[test]
    fn with_response_should_expose_status() {
        let meta = ResponseMeta {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
        };
        let error = Error::construction("bad").with_response(meta);

        let response = error.response().unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.status_text(), "Not Found");
    }

    #[test]
    fn cancelled_kind_is_distinct_from_transport() {
        let error = Error::cancelled();

        assert_eq!(error.kind(), Kind::Cancelled);
        assert_ne!(error.kind(), Kind::Transport);
    }
}

#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub(crate) mod serde_helpers;
pub mod types;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use url::form_urlencoded;

use crate::client::{RequestClient, Response};
use crate::error::Error;
use crate::types::request::Params;

pub type Result<T> = std::result::Result<T, Error>;

/// Trait for converting request types to URL query parameters.
///
/// This trait is automatically implemented for all types that implement [`Serialize`].
/// It uses [`serde_html_form`] to serialize the struct fields into a query string, then
/// orders the pairs by key so the same parameter set always encodes to the same string.
/// Reserved characters are percent-encoded (`,` as `%2C`, `:` as `%3A`).
pub trait ToQueryParams: Serialize {
    /// Converts the request to a URL query string without the leading `?`.
    ///
    /// Returns an empty string if no parameters are set.
    fn query_params(&self) -> Result<String> {
        let encoded = serde_html_form::to_string(self).inspect_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::error!("Unable to convert to URL-encoded string {e:?}");
            #[cfg(not(feature = "tracing"))]
            let _: &serde_html_form::ser::Error = e;
        })?;

        let mut pairs: Vec<_> = form_urlencoded::parse(encoded.as_bytes()).collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

        Ok(form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish())
    }
}

impl<T: Serialize> ToQueryParams for T {}

/// Joins `segments` onto a copy of `base` and attaches the encoded `query`.
///
/// `base` is never modified. A trailing empty segment yields a trailing slash, and any path
/// already on `base` is kept as a prefix.
///
/// ```
/// use oddsapi_client_sdk::build_url;
/// use oddsapi_client_sdk::types::Url;
///
/// let base = Url::parse("https://api.the-odds-api.com/")?;
/// let url = build_url(&base, &["v4", "sports"], &[("apiKey", "api-token")])?;
///
/// assert_eq!(url.as_str(), "https://api.the-odds-api.com/v4/sports?apiKey=api-token");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build_url<Q: Serialize>(base: &Url, segments: &[&str], query: &Q) -> Result<Url> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|()| Error::construction(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);

    let query = query.query_params()?;
    url.set_query((!query.is_empty()).then_some(query.as_str()));

    Ok(url)
}

/// Builds, sends and decodes one API operation for any parameter set.
///
/// Validation and path building happen before anything touches the network, so a missing
/// identifier fails with [`Kind::Validation`](error::Kind::Validation) and no request is
/// issued. `T` may be a single payload or a `Vec` of payloads.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, err(level = "debug"))
)]
pub async fn request_handler<P, C, T>(params: &mut P, client: &C) -> Result<Response<T>>
where
    P: Params + ?Sized,
    C: RequestClient + ?Sized,
    T: DeserializeOwned + Send,
{
    let url = params.build_path(client.base_url())?;
    let request = client.new_get_request(url, None)?;

    client.execute(request).await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_with::skip_serializing_none;

    use super::*;
    use crate::error::Kind;

    #[skip_serializing_none]
    #[derive(Serialize)]
    struct Query {
        #[serde(rename = "zeta")]
        last: &'static str,
        #[serde(rename = "alpha")]
        first: Option<&'static str>,
        #[serde(rename = "eventIds")]
        ids: &'static str,
    }

    fn base() -> Url {
        Url::parse("https://api.the-odds-api.com/").unwrap()
    }

    #[test]
    fn query_params_should_sort_keys() {
        let query = Query {
            last: "z",
            first: Some("a"),
            ids: "e1,e2",
        };

        assert_eq!(
            query.query_params().unwrap(),
            "alpha=a&eventIds=e1%2Ce2&zeta=z"
        );
    }

    #[test]
    fn query_params_should_skip_absent_fields() {
        let query = Query {
            last: "z",
            first: None,
            ids: "2024-01-01T00:00:00Z",
        };

        assert_eq!(
            query.query_params().unwrap(),
            "eventIds=2024-01-01T00%3A00%3A00Z&zeta=z"
        );
    }

    #[test]
    fn query_params_empty_should_be_empty_string() {
        let empty: BTreeMap<String, String> = BTreeMap::new();

        assert_eq!(empty.query_params().unwrap(), "");
    }

    #[test]
    fn build_url_without_query_should_have_no_question_mark() {
        let url = build_url(&base(), &["v4", "sports"], &()).unwrap();

        assert_eq!(url.as_str(), "https://api.the-odds-api.com/v4/sports");
    }

    #[test]
    fn build_url_trailing_empty_segment_should_add_slash() {
        let url = build_url(&base(), &["v4", "sports", "upcoming", "odds", ""], &()).unwrap();

        assert_eq!(url.path(), "/v4/sports/upcoming/odds/");
    }

    #[test]
    fn build_url_should_keep_base_path_prefix() {
        let base = Url::parse("http://localhost:8080/proxy/").unwrap();

        let url = build_url(&base, &["v4", "sports"], &[("apiKey", "k")]).unwrap();

        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v4/sports?apiKey=k");
        assert_eq!(base.as_str(), "http://localhost:8080/proxy/");
    }

    #[test]
    fn build_url_should_escape_segments() {
        let url = build_url(&base(), &["v4", "sports", "a/b"], &()).unwrap();

        assert_eq!(url.path(), "/v4/sports/a%2Fb");
    }

    #[test]
    fn build_url_cannot_be_base_should_fail_construction() {
        let base = Url::parse("mailto:odds@example.com").unwrap();

        let err = build_url(&base, &["v4"], &()).unwrap_err();

        assert_eq!(err.kind(), Kind::Construction);
    }
}

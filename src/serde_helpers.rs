//! Serde helpers for flexible payload decoding.
//!
//! When the `tracing` feature is enabled, payloads are decoded through
//! [`decode_with_warnings`], which logs every field the target type does not capture and the
//! JSON path of the first field that fails to decode.

use serde::de::DeserializeOwned;

/// A `serde_as` type that deserializes strings or integers as `String`.
///
/// Timestamps arrive as RFC 3339 strings with `dateFormat=iso` and as unix seconds with
/// `dateFormat=unix`; both land in the same `String` field.
pub struct StringFromAny;

impl<'de> serde_with::DeserializeAs<'de, String> for StringFromAny {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt;

        use serde::de::{self, Visitor};

        struct StringOrNumberVisitor;

        impl Visitor<'_> for StringOrNumberVisitor {
            type Value = String;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("string or integer timestamp")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(v.to_owned())
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(v.to_string())
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(v.to_string())
            }
        }

        deserializer.deserialize_any(StringOrNumberVisitor)
    }
}

impl serde_with::SerializeAs<String> for StringFromAny {
    fn serialize_as<S>(source: &String, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(source)
    }
}

/// Decode a response body, logging fields the target type ignores.
///
/// Unknown fields never fail decoding; they are reported at `warn` level with their JSON path
/// and value. On failure the offending path is logged at `error` level before the
/// [`Kind::Decode`](crate::error::Kind::Decode) error is returned.
#[cfg(feature = "tracing")]
pub fn decode_with_warnings<T: DeserializeOwned>(body: &[u8]) -> crate::Result<T> {
    use std::any::type_name;

    use serde_json::Value;

    let value: Value = serde_json::from_slice(body)?;

    tracing::trace!(
        type_name = %type_name::<T>(),
        json = %value,
        "decoding response body"
    );

    let mut unknown_paths: Vec<String> = Vec::new();

    let result: T = serde_ignored::deserialize(&value, |path| {
        unknown_paths.push(path.to_string());
    })
    .inspect_err(|_| {
        let path_result: std::result::Result<T, _> = serde_path_to_error::deserialize(&value);
        if let Err(path_err) = path_result {
            let path = path_err.path().to_string();

            tracing::error!(
                type_name = %type_name::<T>(),
                path = %path,
                value = %format_value(lookup_value(&value, &path)),
                error = %path_err.inner(),
                "response decoding failed"
            );
        }
    })?;

    for path in unknown_paths {
        tracing::warn!(
            type_name = %type_name::<T>(),
            field = %path,
            value = %format_value(lookup_value(&value, &path)),
            "unknown field in API response"
        );
    }

    Ok(result)
}

/// Pass-through decoding when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub fn decode_with_warnings<T: DeserializeOwned>(body: &[u8]) -> crate::Result<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Look up a value by a `serde_ignored` or `serde_path_to_error` path.
///
/// `?` segments mark `Option` wrappers and are skipped. Array indices may use dot or bracket
/// notation.
#[cfg(feature = "tracing")]
fn lookup_value<'value>(
    value: &'value serde_json::Value,
    path: &str,
) -> Option<&'value serde_json::Value> {
    use serde_json::Value;

    let mut current = value;

    for segment in parse_path_segments(path) {
        if segment == "?" {
            continue;
        }

        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// `"bookmakers[0].markets.1.key"` -> `["bookmakers", "0", "markets", "1", "key"]`
#[cfg(feature = "tracing")]
fn parse_path_segments(path: &str) -> Vec<String> {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(feature = "tracing")]
fn format_value(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<unable to retrieve>".to_owned(),
    }
}

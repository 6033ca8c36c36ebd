//! Types for The Odds API v4.
//!
//! This module contains all types used by the client, organized into:
//!
//! - **Enumerated values**: closed literal sets accepted by query parameters
//!   ([`Region`], [`MarketKey`], [`OddsFormat`], [`DateFormat`]). Each carries an
//!   `Unknown` variant so an unrecognized literal can be held and rejected at the
//!   point of use rather than at construction.
//!
//! - **Request types**: per-operation parameter sets with validating setters
//!   (e.g., [`request::OddsParams`], [`request::EventOddsParams`]).
//!
//! - **Response types**: structs representing API payloads
//!   (e.g., [`response::Odds`], [`response::Event`], [`response::Sports`]).
//!
//! Commonly used external types are re-exported so callers do not need to add
//! these dependencies to their `Cargo.toml`.
//!
//! ```
//! use oddsapi_client_sdk::types::{MarketKey, ParameterValue as _, Region};
//!
//! assert!(Region::from("uk").is_valid());
//! assert!(!MarketKey::from("us").is_valid());
//! assert_eq!(MarketKey::Spreads.as_str(), "spreads");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod request;
pub mod response;

/// Date and time types for commence-time bounds.
pub use chrono::{DateTime, Utc};
/// Arbitrary precision decimal type for prices and handicap points.
pub use rust_decimal::Decimal;
/// Macro for creating [`Decimal`] literals at compile time.
///
/// # Example
/// ```
/// use oddsapi_client_sdk::types::dec;
/// let price = dec!(1.91);
/// ```
pub use rust_decimal_macros::dec;
/// URL type used for the client's base host and built request targets.
pub use url::Url;

/// Sport key that returns the next events across all sports.
pub const DEFAULT_SPORT: &str = "upcoming";

/// A closed set of string literals accepted by a query parameter.
///
/// Values are never rejected on construction; an unrecognized literal is kept as-is and
/// reported through [`ParameterValue::is_valid`] so call sites can substitute the default.
pub trait ParameterValue: AsRef<str> + Default + fmt::Display {
    /// Human readable name used in validation messages.
    const NAME: &'static str;

    fn is_valid(&self) -> bool;
}

/// Bookmaker region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Region {
    #[default]
    Us,
    Us2,
    Uk,
    Au,
    Eu,
    /// Unrecognized region literal.
    #[serde(untagged)]
    Unknown(String),
}

/// Betting market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum MarketKey {
    /// Head to head, also known as moneyline
    #[default]
    H2h,
    Spreads,
    Totals,
    Outrights,
    /// Unrecognized market literal.
    #[serde(untagged)]
    Unknown(String),
}

/// Price representation in odds payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OddsFormat {
    American,
    #[default]
    Decimal,
    /// Unrecognized odds format literal.
    #[serde(untagged)]
    Unknown(String),
}

/// Timestamp representation in response payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DateFormat {
    #[default]
    Iso,
    Unix,
    /// Unrecognized date format literal.
    #[serde(untagged)]
    Unknown(String),
}

macro_rules! parameter_value {
    ($ty:ident, $name:literal, { $($variant:ident => $literal:literal),+ $(,)? }) => {
        impl $ty {
            /// The literal sent on the wire.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $literal,)+
                    Self::Unknown(value) => value,
                }
            }
        }

        impl ParameterValue for $ty {
            const NAME: &'static str = $name;

            fn is_valid(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                match value {
                    $($literal => Self::$variant,)+
                    other => Self::Unknown(other.to_owned()),
                }
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self::from(value.as_str())
            }
        }
    };
}

parameter_value!(Region, "region", {
    Us => "us",
    Us2 => "us2",
    Uk => "uk",
    Au => "au",
    Eu => "eu",
});

parameter_value!(MarketKey, "market", {
    H2h => "h2h",
    Spreads => "spreads",
    Totals => "totals",
    Outrights => "outrights",
});

parameter_value!(OddsFormat, "odds format", {
    American => "american",
    Decimal => "decimal",
});

parameter_value!(DateFormat, "date format", {
    Iso => "iso",
    Unix => "unix",
});

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::serde_helpers::StringFromAny;
use crate::types::Decimal;

/// An in-season (or recently ended) sport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
#[non_exhaustive]
pub struct Sports {
    /// Identifier used as the `sport` path segment of other requests
    pub key: String,
    pub active: bool,
    pub group: String,
    pub description: String,
    pub title: String,
    pub has_outrights: bool,
}

/// An event without odds.
///
/// `commence_time` is an RFC 3339 string or a unix timestamp rendered as a string, depending on
/// the requested [`DateFormat`](crate::types::DateFormat).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
#[non_exhaustive]
pub struct Event {
    pub id: String,
    pub sport_key: String,
    pub sport_title: String,
    #[serde_as(as = "StringFromAny")]
    pub commence_time: String,
    pub home_team: String,
    pub away_team: String,
}

/// An event with the odds offered by each bookmaker.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
#[non_exhaustive]
pub struct Odds {
    pub id: String,
    pub sport_key: String,
    pub sport_title: String,
    #[serde_as(as = "StringFromAny")]
    pub commence_time: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    #[builder(default)]
    pub bookmakers: Vec<BookMaker>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
#[non_exhaustive]
pub struct BookMaker {
    pub key: String,
    pub title: String,
    #[serde_as(as = "StringFromAny")]
    pub last_update: String,
    #[serde(default)]
    #[builder(default)]
    pub markets: Vec<Market>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
#[non_exhaustive]
pub struct Market {
    pub key: String,
    #[serde_as(as = "StringFromAny")]
    pub last_update: String,
    #[serde(default)]
    #[builder(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
#[non_exhaustive]
pub struct Outcome {
    pub name: String,
    pub price: Decimal,
    /// Handicap or total line, present for `spreads` and `totals`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Decimal>,
}

//! Per-operation parameter sets.
//!
//! A parameter set is created per call (usually through a [`Client`](crate::client::Client)
//! factory which injects the API token), adjusted through its setters, and consumed by
//! [`Params::build_path`]. Multi-valued fields are stored comma-joined, exactly as they are
//! sent on the wire.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Serialize, Serializer};
use serde_with::skip_serializing_none;
use url::Url;

use crate::error::Error;
use crate::types::{DEFAULT_SPORT, DateFormat, MarketKey, OddsFormat, ParameterValue, Region};
use crate::{Result, build_url};

/// A parameter set that knows which resource it targets.
pub trait Params {
    /// Validates required identifiers, applies defaults to unset or invalid fields, and
    /// joins the resource path and encoded query onto a copy of `base`.
    ///
    /// `base` itself is never modified.
    fn build_path(&mut self, base: &Url) -> Result<Url>;
}

/// Parameters for `GET v4/sports`.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct SportsParams {
    #[serde(rename = "apiKey", serialize_with = "expose")]
    pub api_token: SecretString,
}

impl SportsParams {
    #[must_use]
    pub fn new<S: Into<String>>(api_token: S) -> Self {
        Self {
            api_token: SecretString::from(api_token.into()),
        }
    }
}

impl Params for SportsParams {
    fn build_path(&mut self, base: &Url) -> Result<Url> {
        build_url(base, &["v4", "sports"], &*self)
    }
}

/// Parameters for `GET v4/sports/{sport}/odds/`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct OddsParams {
    #[serde(skip)]
    pub sport_key: String,
    #[serde(rename = "apiKey", serialize_with = "expose")]
    pub api_token: SecretString,
    /// One or more regions, comma separated
    pub regions: String,
    /// One or more markets, comma separated. Defaults to `h2h` when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markets: String,
    #[serde(rename = "dateFormat")]
    pub date_format: Option<DateFormat>,
    #[serde(rename = "oddsFormat")]
    pub odds_format: Option<OddsFormat>,
    #[serde(rename = "eventIds")]
    pub event_ids: Option<String>,
    pub bookmakers: Option<String>,
    /// Only events commencing on or after this RFC 3339 time. Ignored by the API for
    /// [`DEFAULT_SPORT`].
    #[serde(rename = "commenceTimeFrom")]
    pub commence_time_from: Option<String>,
    /// Only events commencing on or before this RFC 3339 time. Ignored by the API for
    /// [`DEFAULT_SPORT`].
    #[serde(rename = "commenceTimeTo")]
    pub commence_time_to: Option<String>,
}

impl OddsParams {
    #[must_use]
    pub fn new<T: Into<String>, S: Into<String>>(api_token: T, sport_key: S) -> Self {
        Self {
            sport_key: sport_key.into(),
            api_token: SecretString::from(api_token.into()),
            ..Self::default()
        }
    }

    /// Odds for the next events across all sports.
    #[must_use]
    pub fn upcoming<T: Into<String>>(api_token: T) -> Self {
        Self::new(api_token, DEFAULT_SPORT)
    }

    /// Replaces the regions. No values resets to the default region; the first invalid value
    /// also resets to the default region and is reported.
    pub fn set_regions<I, R>(&mut self, regions: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Region>,
    {
        set_regions(&mut self.regions, regions)
    }

    /// Replaces the markets. No values resets to the default market; an invalid value leaves
    /// the field untouched and is reported.
    pub fn set_markets<I, M>(&mut self, markets: I) -> Result<()>
    where
        I: IntoIterator<Item = M>,
        M: Into<MarketKey>,
    {
        set_markets(&mut self.markets, markets)
    }

    /// Returns `false`, storing the default, when `date_format` is not a known literal.
    pub fn set_date_format(&mut self, date_format: DateFormat) -> bool {
        set_value(&mut self.date_format, date_format)
    }

    /// Returns `false`, storing the default, when `odds_format` is not a known literal.
    pub fn set_odds_format(&mut self, odds_format: OddsFormat) -> bool {
        set_value(&mut self.odds_format, odds_format)
    }

    /// No values clears the filter.
    pub fn set_event_ids<I, S>(&mut self, event_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.event_ids = join(event_ids);
    }

    /// No values clears the filter.
    pub fn set_bookmakers<I, S>(&mut self, bookmakers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bookmakers = join(bookmakers);
    }

    pub fn set_commence_time_from<Tz: TimeZone>(&mut self, time: &DateTime<Tz>)
    where
        Tz::Offset: fmt::Display,
    {
        self.commence_time_from = Some(to_rfc3339(time));
    }

    /// Stores `time` verbatim after checking it parses as RFC 3339.
    pub fn set_commence_time_from_iso(&mut self, time: &str) -> Result<()> {
        self.commence_time_from = Some(parse_rfc3339(time)?);
        Ok(())
    }

    pub fn set_commence_time_to<Tz: TimeZone>(&mut self, time: &DateTime<Tz>)
    where
        Tz::Offset: fmt::Display,
    {
        self.commence_time_to = Some(to_rfc3339(time));
    }

    /// Stores `time` verbatim after checking it parses as RFC 3339.
    pub fn set_commence_time_to_iso(&mut self, time: &str) -> Result<()> {
        self.commence_time_to = Some(parse_rfc3339(time)?);
        Ok(())
    }

    fn normalize(&mut self) {
        normalize_value(&mut self.date_format);
        normalize_value(&mut self.odds_format);
        clear_if_empty(&mut self.event_ids);
        clear_if_empty(&mut self.bookmakers);
        clear_if_empty(&mut self.commence_time_from);
        clear_if_empty(&mut self.commence_time_to);
        default_if_empty::<Region>(&mut self.regions);
        default_if_empty::<MarketKey>(&mut self.markets);
    }
}

impl Params for OddsParams {
    fn build_path(&mut self, base: &Url) -> Result<Url> {
        require("sport key", &self.sport_key)?;
        self.normalize();

        let params = &*self;
        build_url(
            base,
            &["v4", "sports", &params.sport_key, "odds", ""],
            params,
        )
    }
}

/// Parameters for `GET v4/sports/{sport}/events`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct EventsParams {
    #[serde(skip)]
    pub sport_key: String,
    #[serde(rename = "apiKey", serialize_with = "expose")]
    pub api_token: SecretString,
    #[serde(rename = "dateFormat")]
    pub date_format: Option<DateFormat>,
    #[serde(rename = "eventIds")]
    pub event_ids: Option<String>,
    #[serde(rename = "commenceTimeFrom")]
    pub commence_time_from: Option<String>,
    #[serde(rename = "commenceTimeTo")]
    pub commence_time_to: Option<String>,
}

impl EventsParams {
    #[must_use]
    pub fn new<T: Into<String>, S: Into<String>>(api_token: T, sport_key: S) -> Self {
        Self {
            sport_key: sport_key.into(),
            api_token: SecretString::from(api_token.into()),
            ..Self::default()
        }
    }

    /// Returns `false`, storing the default, when `date_format` is not a known literal.
    pub fn set_date_format(&mut self, date_format: DateFormat) -> bool {
        set_value(&mut self.date_format, date_format)
    }

    /// No values clears the filter.
    pub fn set_event_ids<I, S>(&mut self, event_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.event_ids = join(event_ids);
    }

    pub fn set_commence_time_from<Tz: TimeZone>(&mut self, time: &DateTime<Tz>)
    where
        Tz::Offset: fmt::Display,
    {
        self.commence_time_from = Some(to_rfc3339(time));
    }

    /// Stores `time` verbatim after checking it parses as RFC 3339.
    pub fn set_commence_time_from_iso(&mut self, time: &str) -> Result<()> {
        self.commence_time_from = Some(parse_rfc3339(time)?);
        Ok(())
    }

    pub fn set_commence_time_to<Tz: TimeZone>(&mut self, time: &DateTime<Tz>)
    where
        Tz::Offset: fmt::Display,
    {
        self.commence_time_to = Some(to_rfc3339(time));
    }

    /// Stores `time` verbatim after checking it parses as RFC 3339.
    pub fn set_commence_time_to_iso(&mut self, time: &str) -> Result<()> {
        self.commence_time_to = Some(parse_rfc3339(time)?);
        Ok(())
    }

    fn normalize(&mut self) {
        normalize_value(&mut self.date_format);
        clear_if_empty(&mut self.event_ids);
        clear_if_empty(&mut self.commence_time_from);
        clear_if_empty(&mut self.commence_time_to);
    }
}

impl Params for EventsParams {
    fn build_path(&mut self, base: &Url) -> Result<Url> {
        require("sport key", &self.sport_key)?;
        self.normalize();

        let params = &*self;
        build_url(base, &["v4", "sports", &params.sport_key, "events"], params)
    }
}

/// Parameters for `GET v4/sports/{sport}/events/{event}/odds`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct EventOddsParams {
    #[serde(skip)]
    pub sport_key: String,
    #[serde(skip)]
    pub event_key: String,
    #[serde(rename = "apiKey", serialize_with = "expose")]
    pub api_token: SecretString,
    pub regions: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markets: String,
    #[serde(rename = "dateFormat")]
    pub date_format: Option<DateFormat>,
    #[serde(rename = "oddsFormat")]
    pub odds_format: Option<OddsFormat>,
    pub bookmakers: Option<String>,
}

impl EventOddsParams {
    #[must_use]
    pub fn new<T, S, E>(api_token: T, sport_key: S, event_key: E) -> Self
    where
        T: Into<String>,
        S: Into<String>,
        E: Into<String>,
    {
        Self {
            sport_key: sport_key.into(),
            event_key: event_key.into(),
            api_token: SecretString::from(api_token.into()),
            ..Self::default()
        }
    }

    /// See [`OddsParams::set_regions`].
    pub fn set_regions<I, R>(&mut self, regions: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Region>,
    {
        set_regions(&mut self.regions, regions)
    }

    /// See [`OddsParams::set_markets`].
    pub fn set_markets<I, M>(&mut self, markets: I) -> Result<()>
    where
        I: IntoIterator<Item = M>,
        M: Into<MarketKey>,
    {
        set_markets(&mut self.markets, markets)
    }

    pub fn set_date_format(&mut self, date_format: DateFormat) -> bool {
        set_value(&mut self.date_format, date_format)
    }

    pub fn set_odds_format(&mut self, odds_format: OddsFormat) -> bool {
        set_value(&mut self.odds_format, odds_format)
    }

    pub fn set_bookmakers<I, S>(&mut self, bookmakers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bookmakers = join(bookmakers);
    }

    fn normalize(&mut self) {
        normalize_value(&mut self.date_format);
        normalize_value(&mut self.odds_format);
        clear_if_empty(&mut self.bookmakers);
        default_if_empty::<Region>(&mut self.regions);
    }
}

impl Params for EventOddsParams {
    fn build_path(&mut self, base: &Url) -> Result<Url> {
        require("sport key", &self.sport_key)?;
        require("event key", &self.event_key)?;
        self.normalize();

        let params = &*self;
        build_url(
            base,
            &[
                "v4",
                "sports",
                &params.sport_key,
                "events",
                &params.event_key,
                "odds",
            ],
            params,
        )
    }
}

fn expose<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{name} is empty")));
    }
    Ok(())
}

fn invalid<T: ParameterValue>(value: &T) -> Error {
    Error::validation(format!("invalid {} provided: {value}", T::NAME))
}

/// Joins valid values with `,`. Yields `Ok(None)` for no values and the first invalid value
/// otherwise.
fn join_values<I, V, T>(values: I) -> std::result::Result<Option<String>, T>
where
    I: IntoIterator<Item = V>,
    V: Into<T>,
    T: ParameterValue,
{
    let mut joined: Option<String> = None;
    for value in values {
        let value = value.into();
        if !value.is_valid() {
            return Err(value);
        }
        match &mut joined {
            Some(joined) => {
                joined.push(',');
                joined.push_str(value.as_ref());
            }
            None => joined = Some(value.as_ref().to_owned()),
        }
    }
    Ok(joined)
}

fn set_regions<I, R>(field: &mut String, regions: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: Into<Region>,
{
    match join_values::<_, _, Region>(regions) {
        Ok(joined) => {
            *field = joined.unwrap_or_else(|| Region::default().to_string());
            Ok(())
        }
        Err(region) => {
            *field = Region::default().to_string();
            Err(invalid(&region))
        }
    }
}

fn set_markets<I, M>(field: &mut String, markets: I) -> Result<()>
where
    I: IntoIterator<Item = M>,
    M: Into<MarketKey>,
{
    let joined = join_values::<_, _, MarketKey>(markets).map_err(|market| invalid(&market))?;
    *field = joined.unwrap_or_else(|| MarketKey::default().to_string());
    Ok(())
}

fn set_value<T: ParameterValue>(field: &mut Option<T>, value: T) -> bool {
    let valid = value.is_valid();
    *field = Some(if valid { value } else { T::default() });
    valid
}

fn join<I, S>(values: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let values: Vec<S> = values.into_iter().collect();
    if values.is_empty() {
        return None;
    }
    let values: Vec<&str> = values.iter().map(|value| value.as_ref()).collect();
    Some(values.join(","))
}

fn normalize_value<T: ParameterValue>(field: &mut Option<T>) {
    if !field.as_ref().is_some_and(ParameterValue::is_valid) {
        *field = Some(T::default());
    }
}

fn clear_if_empty(field: &mut Option<String>) {
    if field.as_deref().is_some_and(str::is_empty) {
        *field = None;
    }
}

fn default_if_empty<T: ParameterValue>(field: &mut String) {
    if field.is_empty() {
        *field = T::default().to_string();
    }
}

fn to_rfc3339<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_rfc3339(time: &str) -> Result<String> {
    DateTime::parse_from_rfc3339(time)?;
    Ok(time.to_owned())
}

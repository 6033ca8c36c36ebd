#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Deeply nested uses in sub-modules are falsely flagged as being unused"
)]

use std::time::Duration;

use httpmock::MockServer;
use oddsapi_client_sdk::client::{Client, Config};
use serde_json::{Value, json};

pub const API_TOKEN: &str = "api-token";
pub const SPORT: &str = "americanfootball_nfl";
pub const EVENT_ID: &str = "bda33adca828c09dc3cac3a856aef176";

/// Config with a millisecond backoff window so retry tests stay fast.
#[must_use]
pub fn fast_config() -> Config {
    Config::builder()
        .rate_limit(1000)
        .retry_wait_min(Duration::ZERO)
        .retry_wait_max(Duration::from_millis(5))
        .build()
}

pub fn create_client(server: &MockServer) -> anyhow::Result<Client> {
    Ok(Client::with_host(
        &server.base_url(),
        API_TOKEN,
        fast_config(),
    )?)
}

#[must_use]
pub fn sports_json() -> Value {
    json!([
        {
            "key": "americanfootball_nfl",
            "active": true,
            "group": "American Football",
            "description": "US Football",
            "title": "NFL",
            "has_outrights": false
        },
        {
            "key": "americanfootball_nfl_super_bowl_winner",
            "active": true,
            "group": "American Football",
            "description": "Super Bowl Winner 2024/2025",
            "title": "NFL Super Bowl Winner",
            "has_outrights": true
        }
    ])
}

#[must_use]
pub fn odds_json() -> Value {
    json!({
        "id": EVENT_ID,
        "sport_key": SPORT,
        "sport_title": "NFL",
        "commence_time": "2021-09-10T00:20:00Z",
        "home_team": "Tampa Bay Buccaneers",
        "away_team": "Dallas Cowboys",
        "bookmakers": [
            {
                "key": "fanduel",
                "title": "FanDuel",
                "last_update": "2021-06-10T13:33:18Z",
                "markets": [
                    {
                        "key": "spreads",
                        "last_update": "2021-06-10T13:33:18Z",
                        "outcomes": [
                            { "name": "Dallas Cowboys", "price": 1.91, "point": 6.5 },
                            { "name": "Tampa Bay Buccaneers", "price": 1.91, "point": -6.5 }
                        ]
                    }
                ]
            }
        ]
    })
}

#[must_use]
pub fn events_json() -> Value {
    json!([
        {
            "id": EVENT_ID,
            "sport_key": SPORT,
            "sport_title": "NFL",
            "commence_time": "2021-09-10T00:20:00Z",
            "home_team": "Tampa Bay Buccaneers",
            "away_team": "Dallas Cowboys"
        }
    ])
}

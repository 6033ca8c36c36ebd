//! Client-side rate limiting.
//!
//! A token bucket sized from the account's requests-per-second ceiling. The bucket sustains
//! `ceiling * percent_of_limit` requests per second and holds up to
//! `ceiling * (1 - percent_of_limit)` tokens (never fewer than one) for bursts.
//!
//! The shared limiter is created lazily by [`LazyRateLimiter`] once the first request has
//! completed; requests issued before that point are not throttled.

#![expect(
    clippy::float_arithmetic,
    reason = "Token accounting is fractional between refills"
)]
#![expect(
    clippy::module_name_repetitions,
    reason = "Limiter types intentionally mirror the module name for clarity"
)]

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::error::Error;

/// Share of the ceiling used as the sustained rate when none is configured.
pub const DEFAULT_PERCENT_OF_LIMIT: f64 = 0.75;

/// Token bucket
///
/// Tokens are consumed when making requests and refill at a constant rate up to `capacity`.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    tokens: f64,
    /// Tokens added per second
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    #[must_use]
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: f64::from(capacity),
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Takes one token, or returns how long until one is available.
    pub fn try_acquire(&mut self) -> std::result::Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(needed / self.refill_rate))
        }
    }

    /// Whole tokens currently available.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "tokens is clamped to [0, capacity]"
    )]
    pub fn available(&mut self) -> u32 {
        self.refill();
        self.tokens.floor() as u32
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        let added = elapsed.as_secs_f64() * self.refill_rate;
        self.tokens = (self.tokens + added).min(f64::from(self.capacity));
        self.last_refill = now;
    }
}

/// Sustained rate and burst size derived from a requests-per-second ceiling.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Tokens added per second
    pub rate: f64,
    /// Bucket capacity
    pub burst: u32,
}

impl RateLimitConfig {
    /// Splits `rate_limit` into a sustained share of `percent_of_limit` and a burst share of
    /// the remainder.
    ///
    /// Fails with [`Kind::Validation`](crate::error::Kind::Validation) when `rate_limit` is
    /// zero or `percent_of_limit` is outside `(0, 1]`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "burst is a non-negative value bounded by rate_limit"
    )]
    pub fn new(rate_limit: u32, percent_of_limit: f64) -> Result<Self> {
        if rate_limit == 0 {
            return Err(Error::validation("rate limit must be at least 1 request/s"));
        }
        if !(percent_of_limit > 0.0 && percent_of_limit <= 1.0) {
            return Err(Error::validation(format!(
                "percent of rate limit must be in (0, 1], got {percent_of_limit}"
            )));
        }

        let ceiling = f64::from(rate_limit);
        let burst = (ceiling * (1.0 - percent_of_limit)).floor() as u32;

        Ok(Self {
            rate: ceiling * percent_of_limit,
            burst: burst.max(1),
        })
    }
}

/// Thread-safe token bucket shared by every call on a client.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(TokenBucket::new(config.burst, config.rate)),
        }
    }

    /// Sustained requests per second.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.config.rate
    }

    #[must_use]
    pub fn burst(&self) -> u32 {
        self.config.burst
    }

    /// Takes one token without waiting, or returns how long until one is available.
    pub fn try_acquire(&self) -> std::result::Result<(), Duration> {
        self.bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_acquire()
    }

    pub fn available(&self) -> u32 {
        self.bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .available()
    }

    /// Waits for a token.
    ///
    /// Returns [`Kind::Cancelled`](crate::error::Kind::Cancelled) as soon as `cancel` fires,
    /// without consuming a token.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }

            let wait = match self.try_acquire() {
                Ok(()) => return Ok(()),
                Err(wait) => wait,
            };

            #[cfg(feature = "tracing")]
            tracing::trace!(?wait, "rate limited, waiting for a token");

            tokio::select! {
                () = cancel.cancelled() => return Err(Error::cancelled()),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }
}

/// A [`RateLimiter`] whose configuration is fixed up front but which is only built on first use.
///
/// Concurrent first callers race safely: exactly one limiter is created and every caller
/// observes that same instance.
#[derive(Debug)]
pub struct LazyRateLimiter {
    config: RateLimitConfig,
    limiter: OnceLock<RateLimiter>,
}

impl LazyRateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            limiter: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// The limiter, if it has been initialized.
    #[must_use]
    pub fn get(&self) -> Option<&RateLimiter> {
        self.limiter.get()
    }

    /// Returns the limiter, building it on the first call.
    ///
    /// Building the limiter charges one token for the request that triggered it.
    pub fn get_or_init(&self) -> &RateLimiter {
        self.limiter.get_or_init(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                rate = self.config.rate,
                burst = self.config.burst,
                "initializing rate limiter"
            );

            let limiter = RateLimiter::new(self.config);
            // A fresh bucket always holds at least one token.
            _ = limiter.try_acquire();
            limiter
        })
    }
}

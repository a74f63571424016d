use std::num::NonZeroU64;
use std::time::Duration;

use chrono::TimeDelta;
use s3sign_core::time::{format_iso8601, DateTime};

/// Validity interval of a presigned url, quantized to a fixed window.
///
/// Two calls with the same ttl whose `now` falls in the same
/// `[k * window, (k + 1) * window)` interval give the same window, so the
/// presigned urls built from it are byte-identical and safe to cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpirationWindow {
    anchor: DateTime,
    expiry: DateTime,
}

impl ExpirationWindow {
    /// Align `now` and `ttl` (seconds) to `window_size` (seconds).
    ///
    /// - `anchor = floor(now / window_size) * window_size`
    /// - `expiry = anchor + max(ceil(ttl / window_size), 1) * window_size`
    ///
    /// A zero or sub-window ttl still grants one full window.
    pub fn align(now: DateTime, ttl: u64, window_size: NonZeroU64) -> Self {
        let window = i64::try_from(window_size.get()).unwrap_or(i64::MAX);

        let anchor_secs = now.timestamp().div_euclid(window) * window;
        let anchor = DateTime::from_timestamp(anchor_secs, 0).unwrap_or(DateTime::MIN_UTC);

        let count = ttl.div_ceil(window_size.get()).max(1);
        let expiry = i64::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(window))
            .and_then(TimeDelta::try_seconds)
            .and_then(|d| anchor.checked_add_signed(d))
            .unwrap_or(DateTime::MAX_UTC);

        Self { anchor, expiry }
    }

    /// Window start, used as signing time.
    pub fn anchor(&self) -> DateTime {
        self.anchor
    }

    /// Window end.
    pub fn expiry(&self) -> DateTime {
        self.expiry
    }

    /// `expiry - anchor`.
    pub fn lifetime(&self) -> Duration {
        (self.expiry - self.anchor).to_std().unwrap_or_default()
    }

    /// Anchor in ISO8601 basic format: `20240327T120000Z`.
    pub fn anchor_iso8601(&self) -> String {
        format_iso8601(self.anchor)
    }

    /// Expiry as unix epoch seconds.
    pub fn expiry_epoch(&self) -> i64 {
        self.expiry.timestamp()
    }
}

//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Timestamp measured in seconds past the epoch.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    #[inline]
    pub const fn from_epoch_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    #[inline]
    pub const fn epoch_seconds(&self) -> u64 {
        self.0
    }

    pub fn now() -> Self {
        SystemTime::now().into()
    }

    #[inline]
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_secs()))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        // Times before the epoch are clamped to it.
        Self(
            time.duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        )
    }
}

impl From<Timestamp> for SystemTime {
    fn from(Timestamp(seconds): Timestamp) -> Self {
        UNIX_EPOCH + Duration::from_secs(seconds)
    }
}

/// A half-open interval `[start, start + duration)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeFrame {
    start: Timestamp,
    duration: Duration,
}

impl TimeFrame {
    pub const ZERO: Self = Self {
        start: Timestamp(0),
        duration: Duration::ZERO,
    };

    pub fn new(start: Timestamp, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn end(&self) -> Timestamp {
        self.start.saturating_add(self.duration)
    }

    pub fn includes(&self, time: Timestamp) -> bool {
        self.start <= time && time < self.end()
    }

    pub fn is_zero(&self) -> bool {
        self.duration.is_zero()
    }
}

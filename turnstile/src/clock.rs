//! Time sources used when checking temporal claims

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

impl From<SystemTime> for UnixTime {
    #[inline]
    fn from(t: SystemTime) -> Self {
        // Instants before the epoch clamp to zero
        let secs = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self(secs)
    }
}

/// A source of the current time
pub trait Clock {
    /// The current time
    fn now(&self) -> UnixTime;
}

impl<C: Clock + ?Sized> Clock for &'_ C {
    #[inline]
    fn now(&self) -> UnixTime {
        C::now(self)
    }
}

/// The system clock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A clock that only moves when told to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl TestClock {
    /// A clock frozen at `time`
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Sets the current time
    pub fn set(&mut self, time: UnixTime) {
        self.0 = time;
    }

    /// Advances the clock by `secs` seconds
    pub fn advance(&mut self, secs: u64) {
        self.0 .0 = self.0 .0.saturating_add(secs);
    }
}

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

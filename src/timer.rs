use crate::mutex::{MainCtx, MainCtxCell};

/// System tick length.
pub const TIMER_TICK_MS: u16 = 1;

/// Absolute point in time in system ticks.
///
/// The counter wraps around. Ordering is defined on the wrapping
/// difference, so two timestamps can only be compared while they are
/// less than half of the counter range apart.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct Timestamp(pub u16);

/// Time span in system ticks.
#[derive(
    PartialEq,
    Eq,
    Copy,
    Clone,
    PartialOrd,
    Ord,
    Debug,
    Default,
    derive_more::Add,
    derive_more::Sub,
    derive_more::AddAssign,
    derive_more::SubAssign,
)]
pub struct RelTimestamp(pub i16);

impl Timestamp {
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }
}

impl RelTimestamp {
    #[inline]
    pub const fn from_ticks(ticks: i16) -> Self {
        Self(ticks)
    }

    #[inline]
    pub const fn from_millis(ms: i16) -> Self {
        Self(ms / TIMER_TICK_MS as i16)
    }
}

impl Ord for Timestamp {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        if self.0 == other.0 {
            core::cmp::Ordering::Equal
        } else if self.0.wrapping_sub(other.0) & (1 << (u16::BITS - 1)) == 0 {
            core::cmp::Ordering::Greater
        } else {
            core::cmp::Ordering::Less
        }
    }
}

impl PartialOrd for Timestamp {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl core::ops::Add<RelTimestamp> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, other: RelTimestamp) -> Self::Output {
        Self(self.0.wrapping_add(other.0 as u16))
    }
}

impl core::ops::Sub for Timestamp {
    type Output = RelTimestamp;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        RelTimestamp(self.0.wrapping_sub(other.0) as i16)
    }
}

/// Polled, non-blocking countdown timer.
///
/// A fresh timer reads as expired until it is [set](Self::set) for the first time.
/// Once expiry has been observed it stays expired until the next `set`,
/// even if the tick counter wraps around afterwards.
pub struct SwTimer {
    dur: RelTimestamp,
    deadline: MainCtxCell<Timestamp>,
    expired: MainCtxCell<bool>,
}

impl SwTimer {
    pub const fn new(dur: RelTimestamp) -> Self {
        Self {
            dur,
            deadline: MainCtxCell::new(Timestamp::new()),
            expired: MainCtxCell::new(true),
        }
    }

    /// Restart the countdown from `now`.
    pub fn set(&self, m: &MainCtx<'_>, now: Timestamp) {
        self.deadline.set(m, now + self.dur);
        self.expired.set(m, false);
    }

    pub fn is_expired(&self, m: &MainCtx<'_>, now: Timestamp) -> bool {
        if !self.expired.get(m) && now >= self.deadline.get(m) {
            self.expired.set(m, true);
        }
        self.expired.get(m)
    }
}


// vim: ts=4 sw=4 expandtab

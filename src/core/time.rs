//! Millisecond wall clock.
//!
//! Every span creation timestamp and every hint-freshness window is measured
//! against this clock. Tests can pin it to a value they move by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};

/// Wall clock instant in milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallClock(pub u64);

/// Live pin, if any. Holding only a weak reference means a dropped
/// [`PinnedClock`] unpins automatically.
static ACTIVE_PIN: Mutex<Option<Weak<AtomicU64>>> = Mutex::new(None);

/// Serialises pinning tests against each other.
static PIN_GATE: Mutex<()> = Mutex::new(());

impl WallClock {
    pub fn now() -> Self {
        let pinned = ACTIVE_PIN
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(cell) = pinned {
            return Self(cell.load(Ordering::SeqCst));
        }

        use std::time::{SystemTime, UNIX_EPOCH};
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    /// Milliseconds elapsed from `self` to `now`; zero if `self` is in the future.
    pub fn age_ms(self, now: WallClock) -> u64 {
        now.0.saturating_sub(self.0)
    }

    pub fn saturating_sub_ms(self, ms: u64) -> Self {
        Self(self.0.saturating_sub(ms))
    }
}

/// Handle to a pinned clock. `WallClock::now` reads this cell until the
/// handle drops; only one handle exists at a time, which keeps concurrent
/// clock-sensitive tests from seeing each other's time.
#[doc(hidden)]
pub struct PinnedClock {
    cell: Arc<AtomicU64>,
    _exclusive: MutexGuard<'static, ()>,
}

impl PinnedClock {
    pub fn set(&self, ms: u64) {
        self.cell.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.cell.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn now_ms(&self) -> u64 {
        self.cell.load(Ordering::SeqCst)
    }
}

#[doc(hidden)]
pub fn pin_clock_for_tests(start_ms: u64) -> PinnedClock {
    let exclusive = PIN_GATE.lock().unwrap_or_else(|err| err.into_inner());
    let cell = Arc::new(AtomicU64::new(start_ms));
    *ACTIVE_PIN.lock().unwrap_or_else(|err| err.into_inner()) = Some(Arc::downgrade(&cell));
    PinnedClock {
        cell,
        _exclusive: exclusive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_saturates_for_future_stamps() {
        let later = WallClock(2_000);
        let earlier = WallClock(1_000);
        assert_eq!(earlier.age_ms(later), 1_000);
        assert_eq!(later.age_ms(earlier), 0);
    }

    #[test]
    fn pinned_clock_controls_now_until_dropped() {
        {
            let pin = pin_clock_for_tests(42);
            assert_eq!(WallClock::now(), WallClock(42));
            pin.advance(8);
            assert_eq!(WallClock::now(), WallClock(50));
            pin.set(7);
            assert_eq!(WallClock::now(), WallClock(7));
            assert_eq!(pin.now_ms(), 7);
        }
        // The weak reference died with the pin; back on the system clock.
        assert!(WallClock::now().0 > 1_000_000_000_000);
    }
}

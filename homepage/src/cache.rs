use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// A single value remembered for `ttl` after it was stored.
pub struct TtlCache<T> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Option<(T, DateTime<Utc>)>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        TtlCache { clock, ttl, entry: None }
    }

    /// The stored value, if it is younger than the TTL.
    pub fn get(&self) -> Option<T> {
        let (value, stored_at) = self.entry.as_ref()?;
        if self.clock.now() - *stored_at < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn set(&mut self, value: T) {
        self.entry = Some((value, self.clock.now()));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
use crate::clock::ManualClock;

#[test]
fn expires_after_ttl_test() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let mut cache = TtlCache::new(clock.clone(), Duration::seconds(3600));
    assert_eq!(cache.get(), None::<u32>);

    cache.set(7);
    clock.advance(Duration::seconds(3599));
    assert_eq!(cache.get(), Some(7));

    clock.advance(Duration::seconds(1));
    assert_eq!(cache.get(), None, "Entry exactly one TTL old is stale");
}

#[test]
fn invalidate_test() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let mut cache = TtlCache::new(clock, Duration::seconds(60));
    cache.set("stack");
    cache.invalidate();
    assert_eq!(cache.get(), None);
}

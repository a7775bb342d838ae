//! Logical-clock timer queue shared by every mini-game.
//!
//! Timers carry a typed payload instead of a closure: the owning controller
//! pops due timers and matches on the payload with full `&mut self` access,
//! which keeps every state mutation on the controller's own call stack.
//!
//! The clock only moves when the owner asks it to (`pop_due` / `advance_to`),
//! so tests drive time explicitly and never sleep.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest accepted repeat interval. A zero interval would re-fire forever
/// inside a single `pop_due` loop.
pub const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Config-friendly seconds to `Duration`. Negative and NaN inputs become zero,
/// values too large to represent saturate at `Duration::MAX`.
pub fn duration_from_secs(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
    }
}

/// Opaque handle returned when a timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// A timer that came due, handed back to the owner for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    pub event: E,
    /// Logical time the timer was due. The clock reads exactly this while
    /// the owner handles it.
    pub due: Duration,
}

struct Entry<E> {
    handle: TimerHandle,
    event: E,
    interval: Option<Duration>,
}

/// Pending one-shot and repeating timers against a monotonic logical clock.
pub struct Scheduler<E> {
    now: Duration,
    next_handle: u64,
    next_seq: u64,
    /// Keyed by (due, arm sequence) so equal due times fire in arm order.
    queue: BTreeMap<(Duration, u64), Entry<E>>,
    index: HashMap<TimerHandle, (Duration, u64)>,
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }

    /// Arm a one-shot timer firing `delay` after now.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerHandle {
        self.arm(delay, event, None)
    }

    /// Arm a timer firing every `interval`, first after one interval.
    pub fn schedule_repeating(&mut self, interval: Duration, event: E) -> TimerHandle {
        let interval = if interval < MIN_REPEAT_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Repeat interval below floor, clamping"
            );
            MIN_REPEAT_INTERVAL
        } else {
            interval
        };
        self.arm(interval, event, Some(interval))
    }

    /// Disarm a timer. Returns whether it was still pending.
    ///
    /// Safe to call from inside the handler of the timer being fired: a
    /// repeating timer cancelled that way never fires again.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.index.remove(&handle) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Disarm everything.
    pub fn cancel_all(&mut self) {
        if !self.queue.is_empty() {
            tracing::trace!(count = self.queue.len(), "Cancelling all timers");
        }
        self.queue.clear();
        self.index.clear();
    }

    /// Remove and return the earliest timer due at or before `until`.
    ///
    /// Moves the clock to the timer's due time. Repeating timers are re-armed
    /// before being returned, so the handler may still cancel them.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<E>> {
        let (&key, _) = self.queue.first_key_value()?;
        let (due, _) = key;
        if due > until {
            return None;
        }
        let entry = self.queue.remove(&key)?;
        let handle = entry.handle;
        self.now = self.now.max(due);

        // A repeat that would overflow the clock fires one last time.
        let event = match entry.interval.and_then(|i| due.checked_add(i)) {
            Some(next_due) => {
                let seq = self.bump_seq();
                let next_key = (next_due, seq);
                self.index.insert(handle, next_key);
                let event = entry.event.clone();
                self.queue.insert(next_key, entry.clone_with(event.clone()));
                event
            },
            None => {
                self.index.remove(&handle);
                entry.event
            },
        };

        Some(Fired { handle, event, due })
    }

    /// Move the clock forward to `until` (never backwards). Call after
    /// draining `pop_due` so the clock reflects the full step.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Forget all timers and rewind the clock to zero.
    pub fn clear(&mut self) {
        self.cancel_all();
        self.now = Duration::ZERO;
    }

    fn arm(&mut self, delay: Duration, event: E, interval: Option<Duration>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let key = (self.now.saturating_add(delay), self.bump_seq());
        self.queue.insert(
            key,
            Entry {
                handle,
                event,
                interval,
            },
        );
        self.index.insert(handle, key);
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<E> Entry<E> {
    fn clone_with(&self, event: E) -> Self {
        Self {
            handle: self.handle,
            event,
            interval: self.interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(f) = s.pop_due(until) {
            out.push(f.event);
        }
        s.advance_to(until);
        out
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut s = Scheduler::new();
        s.schedule(secs(2.0), "a");
        assert!(drain(&mut s, secs(1.9)).is_empty());
        let fired = s.pop_due(secs(2.5)).unwrap();
        assert_eq!(fired.event, "a");
        assert_eq!(fired.due, secs(2.0));
        assert_eq!(s.now(), secs(2.0));
        assert!(s.pop_due(secs(10.0)).is_none());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn repeating_fires_every_interval() {
        let mut s = Scheduler::new();
        s.schedule_repeating(secs(1.0), "tick");
        assert_eq!(drain(&mut s, secs(3.5)).len(), 3);
        assert_eq!(s.now(), secs(3.5));
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn repeating_cancelled_in_handler_stops() {
        let mut s = Scheduler::new();
        let h = s.schedule_repeating(secs(1.0), "tick");
        let mut fired = 0;
        while let Some(f) = s.pop_due(secs(10.0)) {
            fired += 1;
            if fired == 2 {
                assert!(s.cancel(f.handle));
            }
        }
        assert_eq!(fired, 2);
        assert!(!s.is_pending(h));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let a = s.schedule(secs(1.0), "a");
        s.schedule(secs(2.0), "b");
        assert!(s.cancel(a));
        assert!(!s.cancel(a), "second cancel is a no-op");
        assert_eq!(drain(&mut s, secs(5.0)), vec!["b"]);
    }

    #[test]
    fn equal_due_times_fire_in_arm_order() {
        let mut s = Scheduler::new();
        s.schedule(secs(1.0), "first");
        s.schedule(secs(1.0), "second");
        s.schedule(secs(0.5), "earliest");
        assert_eq!(drain(&mut s, secs(1.0)), vec!["earliest", "first", "second"]);
    }

    #[test]
    fn delays_are_relative_to_current_clock() {
        let mut s = Scheduler::new();
        s.advance_to(secs(10.0));
        s.schedule(secs(1.0), "late");
        assert!(s.pop_due(secs(10.5)).is_none());
        assert_eq!(s.pop_due(secs(11.0)).map(|f| f.due), Some(secs(11.0)));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut s = Scheduler::new();
        s.schedule_repeating(Duration::ZERO, "spin");
        assert_eq!(drain(&mut s, Duration::from_millis(5)).len(), 5);
    }

    #[test]
    fn cancel_all_and_clear() {
        let mut s = Scheduler::new();
        s.schedule(secs(1.0), "a");
        s.schedule_repeating(secs(1.0), "b");
        s.advance_to(secs(0.5));
        s.cancel_all();
        assert_eq!(s.pending(), 0);
        assert_eq!(s.now(), secs(0.5));
        s.clear();
        assert_eq!(s.now(), Duration::ZERO);
    }

    #[test]
    fn config_seconds_are_sanitised() {
        assert_eq!(duration_from_secs(1.5), Duration::from_millis(1500));
        assert_eq!(duration_from_secs(-2.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f32::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(1e30), Duration::MAX);
        assert_eq!(duration_from_secs(f32::INFINITY), Duration::MAX);
    }

    #[test]
    fn huge_delays_saturate_instead_of_overflowing() {
        let mut s = Scheduler::new();
        s.advance_to(secs(1.0));
        let h = s.schedule(Duration::MAX, "never");
        s.schedule(secs(1.0), "soon");
        assert!(s.is_pending(h));
        assert_eq!(drain(&mut s, secs(100.0)), vec!["soon"]);
        assert!(s.is_pending(h));
    }

    #[test]
    fn repeat_past_the_end_of_time_fires_once_more_and_stops() {
        let mut s = Scheduler::new();
        s.advance_to(secs(1.0));
        let h = s.schedule_repeating(Duration::MAX, "far");
        let fired = s.pop_due(Duration::MAX).map(|f| f.due);
        assert_eq!(fired, Some(Duration::MAX));
        assert!(!s.is_pending(h));
        assert!(s.pop_due(Duration::MAX).is_none());
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut s: Scheduler<&str> = Scheduler::new();
        s.advance_to(secs(3.0));
        s.advance_to(secs(1.0));
        assert_eq!(s.now(), secs(3.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fire_order_is_monotonic_and_skips_cancelled(
                delays in proptest::collection::vec(0u64..5_000, 1..40),
                cancel_mask in proptest::collection::vec(proptest::bool::ANY, 40),
            ) {
                let mut s = Scheduler::new();
                let handles: Vec<_> = delays
                    .iter()
                    .enumerate()
                    .map(|(i, &ms)| s.schedule(Duration::from_millis(ms), i))
                    .collect();
                for (i, h) in handles.iter().enumerate() {
                    if cancel_mask[i] {
                        s.cancel(*h);
                    }
                }

                let mut last = Duration::ZERO;
                let mut seen = 0;
                while let Some(f) = s.pop_due(Duration::from_secs(10)) {
                    prop_assert!(f.due >= last);
                    prop_assert!(!cancel_mask[f.event], "cancelled timer {} fired", f.event);
                    last = f.due;
                    seen += 1;
                }
                let expected = (0..delays.len()).filter(|&i| !cancel_mask[i]).count();
                prop_assert_eq!(seen, expected);
            }
        }
    }
}

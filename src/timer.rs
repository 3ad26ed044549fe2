//! Resettable single-shot timers.
//!
//! A [`TimerService`] owns a set of logical timers. Each timer has a fixed
//! period and an elapse value that is handed back to the owner from
//! [`TimerService::pop_due`] once the timer runs for a full period without
//! being reset or cancelled:
//! - `reset` reschedules the timer a full period from now (starting it if idle)
//! - `cancel` disarms it until the next `reset`
//! - a timer has at most one pending schedule; an elapse is delivered once

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{trace, warn};

/// Source of distinct [`TimerService`] ids.
static NEXT_SERVICE_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to one logical timer inside a [`TimerService`].
///
/// Deliberately neither `Clone` nor `Copy`: the component that created the
/// timer is its only owner. A handle is only valid with the service that
/// issued it; debug builds assert this.
#[derive(Debug, PartialEq, Eq)]
pub struct TimerHandle {
    service: u64,
    index: usize,
}

#[derive(Debug)]
struct Slot<E> {
    /// Name used in logs.
    label: &'static str,
    period: Duration,
    /// Pending deadline, if armed.
    deadline: Option<Instant>,
    /// Value delivered when the timer elapses.
    on_elapsed: E,
    /// Order of the most recent schedule, breaks deadline ties.
    seq: u64,
}

/// Owner of a group of resettable timers.
#[derive(Debug)]
pub struct TimerService<E> {
    id: u64,
    slots: Vec<Slot<E>>,
    next_seq: u64,
}

impl<E: Clone> TimerService<E> {
    pub fn new() -> Self {
        Self {
            id: NEXT_SERVICE_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            next_seq: 0,
        }
    }

    /// Register a timer without starting it.
    pub fn register(
        &mut self,
        label: &'static str,
        period: Duration,
        on_elapsed: E,
    ) -> TimerHandle {
        self.slots.push(Slot {
            label,
            period,
            deadline: None,
            on_elapsed,
            seq: 0,
        });

        TimerHandle {
            service: self.id,
            index: self.slots.len() - 1,
        }
    }

    /// Register a timer and start its first period at `now`.
    pub fn create(
        &mut self,
        label: &'static str,
        period: Duration,
        on_elapsed: E,
        now: Instant,
    ) -> TimerHandle {
        let handle = self.register(label, period, on_elapsed);
        self.reset(&handle, now);
        handle
    }

    /// Drop any pending schedule and start a fresh period at `now`.
    ///
    /// A period too long to represent as an instant leaves the timer disarmed.
    pub fn reset(&mut self, handle: &TimerHandle, now: Instant) {
        let seq = self.bump_seq();
        let slot = self.slot_mut(handle);
        let Some(deadline) = now.checked_add(slot.period) else {
            warn!("Timer '{}' period {:?} overflows the clock", slot.label, slot.period);
            slot.deadline = None;
            return;
        };

        if slot.deadline == Some(deadline) {
            // Same instant as the last reset; nothing to reschedule.
            return;
        }

        trace!("Timer '{}' scheduled in {:?}", slot.label, slot.period);
        slot.deadline = Some(deadline);
        slot.seq = seq;
    }

    /// Disarm the timer. It stays silent until the next `reset`.
    pub fn cancel(&mut self, handle: &TimerHandle) {
        let slot = self.slot_mut(handle);
        if slot.deadline.take().is_some() {
            trace!("Timer '{}' cancelled", slot.label);
        }
    }

    /// Disarm every timer.
    pub fn cancel_all(&mut self) {
        for slot in &mut self.slots {
            slot.deadline = None;
        }
    }

    /// Whether the timer has a pending schedule.
    pub fn is_pending(&self, handle: &TimerHandle) -> bool {
        self.slot(handle).deadline.is_some()
    }

    /// Pending deadline of the timer.
    pub fn deadline(&self, handle: &TimerHandle) -> Option<Instant> {
        self.slot(handle).deadline
    }

    /// Time left before the timer elapses, zero once overdue.
    pub fn remaining(&self, handle: &TimerHandle, now: Instant) -> Option<Duration> {
        self.deadline(handle)
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Earliest pending deadline across all timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().filter_map(|slot| slot.deadline).min()
    }

    /// Take the earliest timer whose deadline is at or before `now`.
    ///
    /// The timer is disarmed before its elapse value is returned, so callers
    /// that cancel or reset other timers in response see those changes on the
    /// next call.
    pub fn pop_due(&mut self, now: Instant) -> Option<E> {
        let slot = self
            .slots
            .iter_mut()
            .filter(|slot| slot.deadline.is_some_and(|deadline| deadline <= now))
            .min_by_key(|slot| (slot.deadline, slot.seq))?;

        slot.deadline = None;
        trace!("Timer '{}' elapsed", slot.label);
        Some(slot.on_elapsed.clone())
    }

    fn slot(&self, handle: &TimerHandle) -> &Slot<E> {
        debug_assert_eq!(handle.service, self.id, "foreign TimerHandle");
        &self.slots[handle.index]
    }

    fn slot_mut(&mut self, handle: &TimerHandle) -> &mut Slot<E> {
        debug_assert_eq!(handle.service, self.id, "foreign TimerHandle");
        &mut self.slots[handle.index]
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

impl<E: Clone> Default for TimerService<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    const IDLE_MS: u64 = 120_000;

    fn drain(timers: &mut TimerService<&'static str>, now: Instant) -> Vec<&'static str> {
        std::iter::from_fn(|| timers.pop_due(now)).collect()
    }

    #[test]
    fn test_fires_once_after_full_period() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        timers.create("idle", Duration::from_millis(IDLE_MS), "idle", clock.now());

        clock.advance_ms(IDLE_MS - 1);
        assert!(drain(&mut timers, clock.now()).is_empty());

        clock.advance_ms(1);
        assert_eq!(drain(&mut timers, clock.now()), ["idle"]);

        // Single shot: nothing more, however long we wait
        clock.advance_ms(IDLE_MS * 5);
        assert!(drain(&mut timers, clock.now()).is_empty());
    }

    #[test]
    fn test_resets_closer_than_period_never_fire() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let idle = timers.create("idle", Duration::from_millis(IDLE_MS), "idle", clock.now());

        for step in [1, 500, 60_000, IDLE_MS - 1, 10, IDLE_MS - 1] {
            clock.advance_ms(step);
            assert!(drain(&mut timers, clock.now()).is_empty());
            timers.reset(&idle, clock.now());
        }

        assert!(timers.is_pending(&idle));
    }

    #[test]
    fn test_reset_then_full_period_fires_at_new_deadline() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut timers = TimerService::new();
        let idle = timers.create("idle", Duration::from_millis(IDLE_MS), "idle", start);

        clock.advance_ms(119_999);
        timers.reset(&idle, clock.now());

        clock.advance_ms(IDLE_MS - 1);
        assert!(drain(&mut timers, clock.now()).is_empty());

        clock.advance_ms(1);
        assert_eq!(clock.now() - start, Duration::from_millis(239_999));
        assert_eq!(drain(&mut timers, clock.now()), ["idle"]);
    }

    #[test]
    fn test_cancel_suppresses_firing() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let modal = timers.create("modal", Duration::from_secs(60), "modal", clock.now());

        clock.advance_ms(30_000);
        timers.cancel(&modal);
        assert!(!timers.is_pending(&modal));

        clock.advance(Duration::from_secs(3600));
        assert!(drain(&mut timers, clock.now()).is_empty());
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_reset_after_cancel_restarts() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let modal = timers.register("modal", Duration::from_secs(60), "modal");
        assert!(!timers.is_pending(&modal));

        // Reset on a never-started timer behaves like create-then-start
        timers.reset(&modal, clock.now());
        timers.cancel(&modal);
        clock.advance_ms(10_000);
        timers.reset(&modal, clock.now());

        clock.advance_ms(59_999);
        assert!(drain(&mut timers, clock.now()).is_empty());
        clock.advance_ms(1);
        assert_eq!(drain(&mut timers, clock.now()), ["modal"]);
    }

    #[test]
    fn test_repeated_resets_do_not_accumulate() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let idle = timers.register("idle", Duration::from_millis(100), "idle");

        for _ in 0..50 {
            timers.reset(&idle, clock.now());
        }

        clock.advance_ms(100);
        assert_eq!(drain(&mut timers, clock.now()), ["idle"]);
    }

    #[test]
    fn test_due_timers_pop_in_deadline_order() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        timers.create("late", Duration::from_millis(300), "late", clock.now());
        timers.create("early", Duration::from_millis(100), "early", clock.now());
        timers.create("middle", Duration::from_millis(200), "middle", clock.now());

        assert_eq!(
            timers.next_deadline(),
            Some(clock.now() + Duration::from_millis(100))
        );

        clock.advance_ms(1000);
        assert_eq!(drain(&mut timers, clock.now()), ["early", "middle", "late"]);
    }

    #[test]
    fn test_cancel_between_pops_is_honoured() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let _first = timers.create("first", Duration::from_millis(100), "first", clock.now());
        let second = timers.create("second", Duration::from_millis(100), "second", clock.now());

        clock.advance_ms(100);
        assert_eq!(timers.pop_due(clock.now()), Some("first"));
        timers.cancel(&second);
        assert_eq!(timers.pop_due(clock.now()), None);
    }

    #[test]
    fn test_remaining() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let modal = timers.create("modal", Duration::from_secs(60), "modal", clock.now());

        clock.advance_ms(12_500);
        assert_eq!(
            timers.remaining(&modal, clock.now()),
            Some(Duration::from_millis(47_500))
        );

        clock.advance(Duration::from_secs(120));
        assert_eq!(timers.remaining(&modal, clock.now()), Some(Duration::ZERO));

        timers.cancel_all();
        assert_eq!(timers.remaining(&modal, clock.now()), None);
    }

    #[test]
    fn test_unrepresentable_period_stays_disarmed() {
        let clock = ManualClock::new();
        let mut timers = TimerService::new();
        let forever = timers.create("forever", Duration::MAX, "forever", clock.now());

        assert!(!timers.is_pending(&forever));
        assert_eq!(timers.next_deadline(), None);

        clock.advance(Duration::from_secs(86_400 * 365));
        assert!(drain(&mut timers, clock.now()).is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "foreign TimerHandle")]
    fn test_handle_from_other_service_is_rejected() {
        let clock = ManualClock::new();
        let mut first: TimerService<&'static str> = TimerService::new();
        let mut second: TimerService<&'static str> = TimerService::new();
        let _ours = second.register("ours", Duration::from_secs(1), "ours");
        let theirs = first.register("theirs", Duration::from_secs(1), "theirs");

        second.reset(&theirs, clock.now());
    }
}

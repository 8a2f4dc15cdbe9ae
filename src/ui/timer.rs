//! Cancellable one-shot timers driven by an explicit clock.
//!
//! Nothing here reads the system clock. Callers pass `now` in, so the event
//! loop feeds it `Instant::now()` on every tick while tests step time
//! forward by hand.
use std::time::{Duration, Instant};

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What a timer means once it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent
{
    /// The triple-tap window closed
    TapWindowClosed,
    /// A press was held long enough over a bubble
    LongPress
    {
        /// Ordinal of the pressed bubble
        bubble: usize,
    },
    /// A revealed timestamp should be hidden again
    HideTimestamp
    {
        /// Ordinal of the revealed bubble
        bubble: usize,
    },
}

/// A pending timer.
#[derive(Debug, Clone, Copy)]
struct Pending
{
    /// Handle returned to the caller
    id: TimerId,
    /// When the timer fires
    deadline: Instant,
    /// Payload delivered on expiry
    event: TimerEvent,
}

/// Set of pending one-shot timers.
#[derive(Debug, Default)]
pub struct Scheduler
{
    /// Next handle to give out
    next_id: u64,
    /// Timers that have not fired or been cancelled yet
    pending: Vec<Pending>,
}

impl Scheduler
{
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Schedules `event` to fire `delay` after `now`.
    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        event: TimerEvent,
    ) -> TimerId
    {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        self.pending.push(Pending {
            id,
            deadline: now + delay,
            event,
        });

        id
    }

    /// Cancels a timer. Cancelling a fired or unknown timer does nothing.
    ///
    /// # Returns
    ///
    /// Whether a pending timer was removed.
    pub fn cancel(&mut self, id: TimerId) -> bool
    {
        let before = self.pending.len();
        self.pending.retain(|pending| pending.id != id);
        self.pending.len() != before
    }

    /// Whether `id` is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool
    {
        self.pending
            .iter()
            .any(|pending| pending.id == id)
    }

    /// Removes and returns every timer due at `now`, earliest first.
    ///
    /// Timers with equal deadlines fire in scheduling order.
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerEvent>
    {
        let (mut due, pending): (Vec<Pending>, Vec<Pending>) = self
            .pending
            .drain(..)
            .partition(|pending| pending.deadline <= now);

        self.pending = pending;
        due.sort_by_key(|pending| (pending.deadline, pending.id.0));

        due.into_iter()
            .map(|pending| pending.event)
            .collect()
    }

    /// Number of pending timers.
    #[must_use]
    pub const fn len(&self) -> usize
    {
        self.pending.len()
    }

    /// Whether no timer is pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool
    {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn fires_only_after_deadline()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(start, Duration::from_millis(500), TimerEvent::TapWindowClosed);

        assert!(scheduler.fire_due(start + Duration::from_millis(499)).is_empty());
        assert_eq!(
            scheduler.fire_due(start + Duration::from_millis(500)),
            vec![TimerEvent::TapWindowClosed]
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(start, Duration::from_millis(500), TimerEvent::LongPress { bubble: 1 });

        assert!(scheduler.is_pending(id));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.fire_due(start + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn due_timers_fire_in_deadline_order()
    {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(start, Duration::from_millis(2500), TimerEvent::HideTimestamp { bubble: 0 });
        scheduler.schedule(start, Duration::from_millis(500), TimerEvent::LongPress { bubble: 2 });

        assert_eq!(
            scheduler.fire_due(start + Duration::from_secs(3)),
            vec![
                TimerEvent::LongPress { bubble: 2 },
                TimerEvent::HideTimestamp { bubble: 0 },
            ]
        );
    }
}

use std::time::Duration;

/// Identifies one `schedule` call. Only the most recent ticket can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceTicket(u64);

/// When and under which ticket a scheduled value becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub ticket: DebounceTicket,
    /// Monotonic time at which the value is due.
    pub at: Duration,
}

/// Cooperative debounce: collapses bursts of `schedule` calls into a single
/// value, the last one.
///
/// The debouncer does not own a timer. A host either arms a timer per
/// [`Deadline`] and calls [`Debouncer::fire`] when it expires, or polls
/// [`Debouncer::take_due`] with its own clock. Times are monotonic offsets
/// from an arbitrary origin (e.g. `performance.now()`).
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    next_ticket: u64,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    deadline: Deadline,
    value: T,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_ticket: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and push the deadline to `now + delay`.
    pub fn schedule(&mut self, now: Duration, value: T) -> Deadline {
        self.next_ticket += 1;
        let deadline = Deadline {
            ticket: DebounceTicket(self.next_ticket),
            at: now + self.delay,
        };
        self.pending = Some(Pending { deadline, value });
        deadline
    }

    /// Drop the pending value, if any.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Timer callback for `ticket`. Yields the value only if no later
    /// `schedule` or `cancel` happened since the ticket was issued.
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<T> {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline.ticket == ticket);
        if current { self.cancel() } else { None }
    }

    /// Clock-driven variant of [`Debouncer::fire`].
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline.at <= now);
        if due { self.cancel() } else { None }
    }

    pub fn deadline(&self) -> Option<Deadline> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn burst_collapses_to_last_value() {
        let mut d = Debouncer::new(ms(300));
        for (i, t) in [0, 50, 120, 290, 410].into_iter().enumerate() {
            d.schedule(ms(t), i);
            assert_eq!(d.take_due(ms(t)), None);
        }
        assert_eq!(d.take_due(ms(709)), None);
        assert_eq!(d.take_due(ms(710)), Some(4));
        assert_eq!(d.take_due(ms(2000)), None);
    }

    #[test]
    fn stale_tickets_never_fire() {
        let mut d = Debouncer::new(ms(300));
        let first = d.schedule(ms(0), "a");
        let second = d.schedule(ms(100), "b");
        assert_eq!(d.fire(first.ticket), None);
        assert!(d.is_pending());
        assert_eq!(d.fire(second.ticket), Some("b"));
        assert_eq!(d.fire(second.ticket), None);
    }

    #[test]
    fn cancel_discards_pending() {
        let mut d = Debouncer::new(ms(300));
        let deadline = d.schedule(ms(0), 1);
        assert_eq!(d.cancel(), Some(1));
        assert_eq!(d.fire(deadline.ticket), None);
        assert_eq!(d.take_due(ms(1000)), None);
    }

    #[test]
    fn spaced_calls_fire_separately() {
        let mut d = Debouncer::new(ms(300));
        d.schedule(ms(0), 1);
        assert_eq!(d.take_due(ms(300)), Some(1));
        d.schedule(ms(400), 2);
        assert_eq!(d.deadline().map(|dl| dl.at), Some(ms(700)));
        assert_eq!(d.take_due(ms(700)), Some(2));
    }
}

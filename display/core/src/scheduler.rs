//! Deferred Work: Timers, Redraw Frames and Completions
//!
//! The engine never spawns tasks and never sleeps. Anything that has to happen
//! later is recorded here as a deadline in a named [`TimerSlot`]; the runtime
//! loop waits until the earliest deadline and hands the due slots back to the
//! engine in deadline order.
//!
//! A slot holds at most one deadline. Scheduling an occupied slot replaces the
//! previous deadline, which is how "issue a new frame request, cancel the old
//! one" falls out for free.
//!
//! Asynchronous operations report back through a [`Completion`]: a future that
//! resolves exactly once, either with the operation's result or with
//! [`Outcome::Superseded`] when a newer operation took its place.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

/// Longest delay a slot can be armed with; longer delays are clamped
pub const MAX_DELAY: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Named scheduler entries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerSlot {
    /// Redraw frame that settles the in-flight screen operation
    ScreenFrame,
    /// Redraw frame between writing alert content and starting its entrance
    AlertReveal,
    /// Steady-state timeout of a non-scrolling alert (alert sequence number)
    AlertSteady(u64),
    /// Settle delay before discarding a superseded generation (handover sequence number)
    Settle(u64),
}

/// Deadline table keyed by slot
#[derive(Debug)]
pub struct Scheduler {
    frame_interval: Duration,
    deadlines: HashMap<TimerSlot, Instant>,
}

impl Scheduler {
    /// Create a scheduler whose redraw frames are `frame_interval` apart
    #[must_use]
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            deadlines: HashMap::new(),
        }
    }

    /// Interval used for redraw frames
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Arm `slot` to fire after `delay`, replacing any deadline it already had
    ///
    /// `delay` is clamped to [`MAX_DELAY`].
    pub fn schedule(&mut self, slot: TimerSlot, delay: Duration) -> Instant {
        let now = Instant::now();
        if delay > MAX_DELAY {
            tracing::debug!(?slot, ?delay, "Clamping timer delay");
        }
        let deadline = now
            .checked_add(delay.min(MAX_DELAY))
            .unwrap_or(now);
        if self.deadlines.insert(slot, deadline).is_some() {
            tracing::trace!(?slot, "Replaced pending deadline");
        }
        deadline
    }

    /// Arm `slot` to fire on the next redraw frame
    pub fn schedule_frame(&mut self, slot: TimerSlot) -> Instant {
        self.schedule(slot, self.frame_interval)
    }

    /// Disarm `slot`; returns whether it was armed
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        self.deadlines.remove(&slot).is_some()
    }

    /// Disarm every slot matching `predicate`; returns how many were removed
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&TimerSlot) -> bool) -> usize {
        let before = self.deadlines.len();
        self.deadlines.retain(|slot, _| !predicate(slot));
        before - self.deadlines.len()
    }

    /// Whether `slot` is armed
    #[must_use]
    pub fn is_scheduled(&self, slot: TimerSlot) -> bool {
        self.deadlines.contains_key(&slot)
    }

    /// Deadline of `slot`, if armed
    #[must_use]
    pub fn deadline(&self, slot: TimerSlot) -> Option<Instant> {
        self.deadlines.get(&slot).copied()
    }

    /// Earliest armed deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every slot due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerSlot> {
        let mut due: Vec<(Instant, TimerSlot)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(slot, deadline)| (*deadline, *slot))
            .collect();
        due.sort();
        for (_, slot) in &due {
            self.deadlines.remove(slot);
        }
        due.into_iter().map(|(_, slot)| slot).collect()
    }

    /// Number of armed slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Whether nothing is armed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

/// How an asynchronous operation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation reached its terminal state
    Completed(T),
    /// A newer operation canceled this one before it settled
    Superseded,
}

impl<T> Outcome<T> {
    /// Whether the operation completed
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Engine-side half of a completion; consumed on resolution
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<Outcome<T>>,
}

impl<T> Resolver<T> {
    /// Resolve with the operation's result
    pub fn complete(self, value: T) {
        // The caller may have dropped its handle; that is not an error
        let _ = self.tx.send(Outcome::Completed(value));
    }

    /// Resolve as canceled
    pub fn supersede(self) {
        let _ = self.tx.send(Outcome::Superseded);
    }
}

/// Caller-side handle to an asynchronous engine operation
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> Completion<T> {
    /// Check without waiting; `None` while the operation is still in flight
    pub fn try_outcome(&mut self) -> Option<Outcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Outcome::Superseded),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Engine dropped the resolver without settling
            Poll::Ready(Err(_)) => Poll::Ready(Outcome::Superseded),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create a linked resolver/completion pair
#[must_use]
pub fn completion<T>() -> (Resolver<T>, Completion<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Completion { rx })
}

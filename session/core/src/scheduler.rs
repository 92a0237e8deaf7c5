//! Timer Scheduler
//!
//! Periodic timers for the session runtime. Each armed timer is a small
//! tokio task that posts [`TimerFired`] into the runtime's timer channel;
//! it never touches session state itself. Dropping the [`TimerHandle`]
//! aborts the task, so timers cannot outlive the runtime that armed them.
//!
//! Every arm gets a fresh generation. The runtime compares a tick's
//! generation with the handle it currently holds and ignores stale ticks,
//! which closes the window where a tick was already queued when its timer
//! was cancelled.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest period a timer will tick at; `interval_at` panics on zero
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(10);

/// Which timer fired
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Preview countdown (100ms)
    Countdown,
    /// Handoff animation frames
    Animation,
}

/// A tick from an armed timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    /// Timer that ticked
    pub kind: TimerKind,
    /// Generation of the arm that produced it
    pub generation: u64,
}

/// Owns a running timer; aborts it on drop
#[derive(Debug)]
pub struct TimerHandle {
    kind: TimerKind,
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Timer kind
    #[must_use]
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Generation this handle was armed with
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick belongs to this handle
    #[must_use]
    pub fn owns(&self, tick: &TimerFired) -> bool {
        tick.kind == self.kind && tick.generation == self.generation
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Arms periodic timers that report into one channel
#[derive(Debug)]
pub struct Scheduler {
    tx: mpsc::Sender<TimerFired>,
    next_generation: u64,
}

impl Scheduler {
    /// Create a scheduler and the receiver its timers post to
    #[must_use]
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<TimerFired>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                tx,
                next_generation: 0,
            },
            rx,
        )
    }

    /// Start a timer ticking every `period`, first tick one period from now
    ///
    /// Periods below [`MIN_TIMER_PERIOD`] are raised to it.
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self, kind: TimerKind, period: Duration) -> TimerHandle {
        let period = period.max(MIN_TIMER_PERIOD);
        self.next_generation = self.next_generation.wrapping_add(1);
        let generation = self.next_generation;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(TimerFired { kind, generation }).await.is_err() {
                    break;
                }
            }
        });

        tracing::trace!(
            ?kind,
            generation,
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "Timer armed"
        );
        TimerHandle {
            kind,
            generation,
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_with_generation() {
        let (mut scheduler, mut rx) = Scheduler::new(8);
        let handle = scheduler.arm(TimerKind::Countdown, Duration::from_millis(100));

        let tick = rx.recv().await.unwrap();
        assert!(handle.owns(&tick));
        assert_eq!(tick.kind, TimerKind::Countdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_changes_generation() {
        let (mut scheduler, _rx) = Scheduler::new(8);
        let first = scheduler.arm(TimerKind::Animation, Duration::from_millis(50));
        let second = scheduler.arm(TimerKind::Animation, Duration::from_millis(50));

        assert_ne!(first.generation(), second.generation());
        let stale = TimerFired {
            kind: TimerKind::Animation,
            generation: first.generation(),
        };
        assert!(!second.owns(&stale));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_raised_to_minimum() {
        let (mut scheduler, mut rx) = Scheduler::new(8);
        let start = Instant::now();
        let handle = scheduler.arm(TimerKind::Animation, Duration::ZERO);

        let tick = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(handle.owns(&tick));
        assert!(start.elapsed() >= MIN_TIMER_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_ticking() {
        let (mut scheduler, mut rx) = Scheduler::new(8);
        let handle = scheduler.arm(TimerKind::Countdown, Duration::from_millis(100));
        drop(handle);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(rx.try_recv().is_err());
    }
}

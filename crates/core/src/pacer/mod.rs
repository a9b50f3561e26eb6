//! Frame pacing against the wall clock.
//!
//! File replay uses deadline scheduling: the deadline advances by exactly one
//! frame interval per window, never `now + interval`, so a slow window
//! shortens the next wait instead of shifting every later frame. Live capture
//! gates on elapsed time since the last emitted action.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Source of monotonic time and the single blocking wait the pacers need.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests. Sleeping advances the clock instead of
/// blocking, and every `now()` call may optionally advance it by a fixed tick
/// to simulate processing time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Rc<Cell<Instant>>,
    slept: Rc<Cell<Duration>>,
    tick: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::with_tick(Duration::ZERO)
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self {
            current: Rc::new(Cell::new(Instant::now())),
            slept: Rc::new(Cell::new(Duration::ZERO)),
            tick,
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.current.set(self.current.get() + duration);
    }

    /// Total time spent in `sleep`.
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let now = self.current.get();
        self.current.set(now + self.tick);
        now
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}

/// One step of deadline scheduling: how long to wait before acting on the
/// window whose deadline is `deadline`, and the deadline of the next window.
pub fn next_frame(now: Instant, deadline: Instant, interval: Duration) -> (Duration, Instant) {
    (deadline.saturating_duration_since(now), deadline + interval)
}

/// Drift-free deadline pacer for file replay and real-time encoding.
#[derive(Debug, Clone)]
pub struct ReplayPacer {
    next_deadline: Instant,
    interval: Duration,
    frames: u64,
}

impl ReplayPacer {
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            next_deadline: start,
            interval,
            frames: 0,
        }
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns how long to wait before acting on the current window and
    /// advances the deadline by one interval.
    pub fn tick(&mut self, now: Instant) -> Duration {
        let (wait, next) = next_frame(now, self.next_deadline, self.interval);
        self.next_deadline = next;
        self.frames += 1;
        wait
    }

    /// `tick` followed by the wait itself.
    pub fn wait<C: Clock>(&mut self, clock: &C) {
        let wait = self.tick(clock.now());
        if !wait.is_zero() {
            clock.sleep(wait);
        }
    }
}

/// Elapsed-time gate for live capture.
#[derive(Debug, Clone)]
pub struct LivePacer {
    last_action: Instant,
    interval: Duration,
}

impl LivePacer {
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            last_action: start,
            interval,
        }
    }

    pub fn last_action(&self) -> Instant {
        self.last_action
    }

    /// True when a full interval has elapsed since the last action; the gate
    /// then restarts from `now`.
    pub fn should_emit(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_action) >= self.interval {
            self.last_action = now;
            true
        } else {
            false
        }
    }
}

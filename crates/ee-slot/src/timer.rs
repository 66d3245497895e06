//! One-shot and repeating timers keyed by handle
//!
//! State machines own a `Scheduler`, keep the handles they armed and cancel
//! them when leaving the state that armed them. `advance` reports which
//! handles fired during the tick; nothing runs behind the owner's back.

/// Opaque timer id, never reused within one scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    remaining: f32,
    interval: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&mut self, delay: f32, interval: Option<f32>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.timers.push(Timer {
            handle,
            remaining: delay.max(0.0),
            interval,
        });
        handle
    }

    /// Fire once after `delay` seconds
    pub fn once(&mut self, delay: f32) -> TimerHandle {
        self.arm(delay, None)
    }

    /// Fire after `delay`, then every `interval` until cancelled
    pub fn repeat(&mut self, delay: f32, interval: f32) -> TimerHandle {
        self.arm(delay, Some(interval.max(f32::EPSILON)))
    }

    /// Returns false if the handle already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        before != self.timers.len()
    }

    /// Cancel through an optional slot, clearing it
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn remaining(&self, handle: TimerHandle) -> Option<f32> {
        self.timers
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.remaining)
    }

    /// Make a pending timer fire on the next advance
    pub fn expire(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.timers.iter_mut().find(|t| t.handle == handle) {
            timer.remaining = 0.0;
        }
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance every timer by `dt`. A repeating timer fires at most once per
    /// call and keeps the overshoot.
    pub fn advance(&mut self, dt: f32) -> Vec<TimerHandle> {
        let mut fired = Vec::new();
        for timer in &mut self.timers {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                fired.push(timer.handle);
                if let Some(interval) = timer.interval {
                    timer.remaining = (timer.remaining + interval).max(0.0);
                }
            }
        }
        self.timers
            .retain(|t| t.interval.is_some() || !fired.contains(&t.handle));
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_fires_and_is_removed() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.once(0.5);
        assert!(scheduler.advance(0.3).is_empty());
        assert_eq!(scheduler.advance(0.3), vec![handle]);
        assert!(!scheduler.is_pending(handle));
        assert!(scheduler.advance(1.0).is_empty());
    }

    #[test]
    fn test_repeat_keeps_firing() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.repeat(3.0, 3.0);
        let mut count = 0;
        for _ in 0..100 {
            if scheduler.advance(0.1).contains(&handle) {
                count += 1;
            }
        }
        assert_eq!(count, 3);
        assert!(scheduler.is_pending(handle));
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let mut scheduler = Scheduler::new();
        let mut slot = Some(scheduler.once(0.1));
        scheduler.cancel_slot(&mut slot);
        assert!(slot.is_none());
        assert!(scheduler.advance(1.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_expire_fires_next_advance() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.once(10.0);
        scheduler.expire(handle);
        assert_eq!(scheduler.advance(0.0), vec![handle]);
    }

    #[test]
    fn test_handles_unique() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.once(1.0);
        scheduler.cancel(a);
        let b = scheduler.once(1.0);
        assert_ne!(a, b);
        assert!(!scheduler.cancel(a));
    }
}

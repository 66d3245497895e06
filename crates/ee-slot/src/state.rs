//! Tick-driven state machine primitive
//!
//! `transit()` only records the request; the switch happens on the next
//! `update()`, which reports `is_entering() == true` for exactly that one
//! tick. Transits requested during the entering tick are honoured on the
//! following tick.

use std::fmt::Debug;

#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    name: &'static str,
    current: S,
    previous: Option<S>,
    next: Option<S>,
    entering: bool,
    started: bool,
}

impl<S: Copy + Eq + Debug> StateMachine<S> {
    /// Starts in `initial`, entering on the first update
    pub fn new(name: &'static str, initial: S) -> Self {
        Self {
            name,
            current: initial,
            previous: None,
            next: Some(initial),
            entering: false,
            started: false,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    pub fn pending(&self) -> Option<S> {
        self.next
    }

    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    pub fn is_entering(&self) -> bool {
        self.entering
    }

    /// Request a switch on the next update. Re-entering the current state
    /// is allowed and fires `is_entering` again.
    pub fn transit(&mut self, state: S) {
        self.next = Some(state);
    }

    /// Apply a pending transit. Returns the state that was left, if any.
    pub fn update(&mut self) -> Option<S> {
        match self.next.take() {
            Some(next) => {
                self.entering = true;
                if !self.started {
                    self.started = true;
                    self.current = next;
                    return None;
                }
                log::debug!("[{}] {:?} -> {:?}", self.name, self.current, next);
                let left = self.current;
                self.previous = Some(left);
                self.current = next;
                Some(left)
            }
            None => {
                self.entering = false;
                None
            }
        }
    }
}

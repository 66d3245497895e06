//! Step sequencer
//!
//! An ordered list of small steps, each returning `Done` or `Pending`. The
//! owner calls `tick` once per frame; the front step runs and is popped when
//! it reports `Done`, so at most one step completes per tick. This is how
//! animation chains ("play A, when it completes play B, after 0.5 s do C")
//! are expressed without callbacks.
//!
//! ## Architecture
//!
//! ```text
//! Sequence<S, E>
//!     ├── step "delay"        wait(0.5)
//!     ├── step "declare"      call(|s, e| play cue, store ticket)
//!     ├── step "await click"  until(|s, e| ticket done)
//!     └── ...
//! ```
//!
//! `S` is the owner's state, `E` the injected environment (collaborators).

use std::collections::VecDeque;
use std::fmt;

/// Result of running one step for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Pending,
}

impl StepStatus {
    pub fn from_bool(done: bool) -> Self {
        if done {
            StepStatus::Done
        } else {
            StepStatus::Pending
        }
    }

    pub fn is_done(self) -> bool {
        self == StepStatus::Done
    }
}

type StepFn<S, E> = Box<dyn FnMut(&mut S, &mut E, f32) -> StepStatus>;

struct Step<S, E> {
    label: &'static str,
    run: StepFn<S, E>,
}

/// Ordered list of steps advanced once per tick
pub struct Sequence<S, E> {
    name: &'static str,
    steps: VecDeque<Step<S, E>>,
    completed: usize,
}

impl<S: 'static, E: 'static> Sequence<S, E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: VecDeque::new(),
            completed: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append a raw step
    pub fn then(
        mut self,
        label: &'static str,
        run: impl FnMut(&mut S, &mut E, f32) -> StepStatus + 'static,
    ) -> Self {
        self.push(label, run);
        self
    }

    pub fn push(
        &mut self,
        label: &'static str,
        run: impl FnMut(&mut S, &mut E, f32) -> StepStatus + 'static,
    ) {
        self.steps.push_back(Step {
            label,
            run: Box::new(run),
        });
    }

    /// Run `action` once and complete
    pub fn call(self, label: &'static str, action: impl FnOnce(&mut S, &mut E) + 'static) -> Self {
        let mut action = Some(action);
        self.then(label, move |s, e, _| {
            if let Some(action) = action.take() {
                action(s, e);
            }
            StepStatus::Done
        })
    }

    /// Complete after `secs` of ticks
    pub fn wait(self, label: &'static str, secs: f32) -> Self {
        let mut left = secs;
        self.then(label, move |_, _, dt| {
            left -= dt;
            StepStatus::from_bool(left <= 0.0)
        })
    }

    /// Complete once `pred` holds
    pub fn until(
        self,
        label: &'static str,
        mut pred: impl FnMut(&mut S, &mut E) -> bool + 'static,
    ) -> Self {
        self.then(label, move |s, e, _| StepStatus::from_bool(pred(s, e)))
    }

    /// Advance the front step. Returns `Done` when nothing is left.
    pub fn tick(&mut self, state: &mut S, env: &mut E, dt: f32) -> StepStatus {
        let Some(step) = self.steps.front_mut() else {
            return StepStatus::Done;
        };
        if (step.run)(state, env, dt).is_done() {
            log::trace!("[Sequence:{}] step '{}' done", self.name, step.label);
            self.steps.pop_front();
            self.completed += 1;
        }
        StepStatus::from_bool(self.steps.is_empty())
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current_label(&self) -> Option<&'static str> {
        self.steps.front().map(|s| s.label)
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

impl<S, E> fmt::Debug for Sequence<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.label).collect::<Vec<_>>(),
            )
            .field("completed", &self.completed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<&'static str>);

    #[test]
    fn test_steps_run_in_order() {
        let mut seq: Sequence<Log, ()> = Sequence::new("test")
            .call("a", |log: &mut Log, _| log.0.push("a"))
            .call("b", |log: &mut Log, _| log.0.push("b"))
            .call("c", |log: &mut Log, _| log.0.push("c"));
        let mut log = Log::default();
        assert_eq!(seq.tick(&mut log, &mut (), 0.016), StepStatus::Pending);
        assert_eq!(log.0, vec!["a"]);
        seq.tick(&mut log, &mut (), 0.016);
        assert_eq!(seq.tick(&mut log, &mut (), 0.016), StepStatus::Done);
        assert_eq!(log.0, vec!["a", "b", "c"]);
        assert_eq!(seq.completed(), 3);
    }

    #[test]
    fn test_wait_blocks_following_steps() {
        let mut seq: Sequence<Log, ()> = Sequence::new("test")
            .wait("delay", 0.5)
            .call("after", |log: &mut Log, _| log.0.push("after"));
        let mut log = Log::default();
        for _ in 0..4 {
            seq.tick(&mut log, &mut (), 0.1);
        }
        assert!(log.0.is_empty());
        assert_eq!(seq.current_label(), Some("delay"));
        for _ in 0..3 {
            seq.tick(&mut log, &mut (), 0.1);
        }
        assert_eq!(log.0, vec!["after"]);
        assert!(seq.is_done());
    }

    #[test]
    fn test_until_reads_environment() {
        let mut seq: Sequence<Log, bool> = Sequence::new("test")
            .until("flag", |_, flag: &mut bool| *flag)
            .call("go", |log: &mut Log, _| log.0.push("go"));
        let mut log = Log::default();
        let mut flag = false;
        seq.tick(&mut log, &mut flag, 0.1);
        seq.tick(&mut log, &mut flag, 0.1);
        assert_eq!(seq.current_label(), Some("flag"));
        flag = true;
        seq.tick(&mut log, &mut flag, 0.1);
        seq.tick(&mut log, &mut flag, 0.1);
        assert_eq!(log.0, vec!["go"]);
    }

    #[test]
    fn test_empty_sequence_is_done() {
        let mut seq: Sequence<(), ()> = Sequence::new("empty");
        assert_eq!(seq.tick(&mut (), &mut (), 0.1), StepStatus::Done);
        assert!(seq.is_done());
    }
}

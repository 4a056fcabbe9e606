//! Platform abstraction layer
//!
//! The session never touches a browser API directly. It talks to a
//! [`Scheduler`] that provides:
//! - A monotonic wall clock
//! - "Next frame" requests
//! - One-shot and repeating timers, all cancellable
//!
//! Every request carries a [`Wakeup`] that the host hands back to
//! `Session::on_wakeup` when it fires.

#[cfg(target_arch = "wasm32")]
pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Host handle for a pending request
pub type TaskId = u64;

/// What a wakeup is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Animation frame driving one tick
    Frame,
    /// Repeating enemy spawn timer
    Spawn,
    /// Earliest ability deadline (dash, invulnerability, double score)
    Abilities,
    /// End of the "level complete" overlay
    LevelTransition,
}

/// Token delivered back to the session when a request fires.
///
/// `generation` changes on every game reset and `ticket` is unique per
/// request, so a firing that outlived its request is recognizably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    pub task: Task,
    pub generation: u64,
    pub ticket: u64,
}

/// Clock and callback scheduling provided by the host
pub trait Scheduler {
    /// Monotonic time in milliseconds
    fn now(&self) -> f64;

    /// Fire `wakeup` on the next animation frame
    fn request_frame(&mut self, wakeup: Wakeup) -> TaskId;

    /// Fire `wakeup` once after `delay_ms`
    fn set_timeout(&mut self, delay_ms: f64, wakeup: Wakeup) -> TaskId;

    /// Fire `wakeup` every `period_ms` until cancelled
    fn set_interval(&mut self, period_ms: f64, wakeup: Wakeup) -> TaskId;

    /// Cancel a pending request. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TaskId);
}

/// Smallest period a repeating timer may use
pub const MIN_PERIOD_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    id: TaskId,
    due: f64,
    period: Option<f64>,
    wakeup: Wakeup,
}

/// Deterministic headless host with a virtual clock.
///
/// Nothing fires on its own: [`ManualScheduler::pop_due`] hands out due
/// requests in time order (ties in request order) and moves the clock.
/// Used by tests and the native demo.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: f64,
    frame_interval_ms: f64,
    next_id: TaskId,
    pending: Vec<Scheduled>,
}

impl ManualScheduler {
    /// Host producing animation frames every `frame_interval_ms`
    pub fn new(frame_interval_ms: f64) -> Self {
        Self {
            now: 0.0,
            frame_interval_ms: frame_interval_ms.max(MIN_PERIOD_MS),
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now: f64) {
        self.now = self.now.max(now);
    }

    /// Number of live requests for `task`
    pub fn pending_count(&self, task: Task) -> usize {
        self.pending.iter().filter(|s| s.wakeup.task == task).count()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the earliest request due at or before `until`, advancing the
    /// clock to its due time. Repeating requests are re-armed.
    pub fn pop_due(&mut self, until: f64) -> Option<(f64, Wakeup)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;

        let due = self.pending[idx].due;
        let wakeup = self.pending[idx].wakeup;
        self.now = self.now.max(due);
        match self.pending[idx].period {
            Some(period) => self.pending[idx].due = due + period,
            None => {
                self.pending.remove(idx);
            }
        }
        Some((due, wakeup))
    }

    fn push(&mut self, due: f64, period: Option<f64>, wakeup: Wakeup) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Scheduled { id, due, period, wakeup });
        id
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> f64 {
        self.now
    }

    fn request_frame(&mut self, wakeup: Wakeup) -> TaskId {
        let due = self.now + self.frame_interval_ms;
        self.push(due, None, wakeup)
    }

    fn set_timeout(&mut self, delay_ms: f64, wakeup: Wakeup) -> TaskId {
        let due = self.now + delay_ms.max(0.0);
        self.push(due, None, wakeup)
    }

    fn set_interval(&mut self, period_ms: f64, wakeup: Wakeup) -> TaskId {
        let period = period_ms.max(MIN_PERIOD_MS);
        self.push(self.now + period, Some(period), wakeup)
    }

    fn cancel(&mut self, id: TaskId) {
        self.pending.retain(|s| s.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wakeup(task: Task, ticket: u64) -> Wakeup {
        Wakeup { task, generation: 1, ticket }
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut host = ManualScheduler::new(16.0);
        host.set_timeout(50.0, wakeup(Task::LevelTransition, 1));
        host.request_frame(wakeup(Task::Frame, 2));
        host.set_timeout(16.0, wakeup(Task::Abilities, 3));

        assert_eq!(host.pop_due(100.0), Some((16.0, wakeup(Task::Frame, 2))));
        assert_eq!(host.pop_due(100.0), Some((16.0, wakeup(Task::Abilities, 3))));
        assert_eq!(host.pop_due(100.0), Some((50.0, wakeup(Task::LevelTransition, 1))));
        assert_eq!(host.pop_due(100.0), None);
        assert_eq!(host.now(), 50.0);
    }

    #[test]
    fn test_interval_repeats_until_cancelled() {
        let mut host = ManualScheduler::new(16.0);
        let id = host.set_interval(100.0, wakeup(Task::Spawn, 1));

        let fired: Vec<f64> = std::iter::from_fn(|| host.pop_due(350.0)).map(|(t, _)| t).collect();
        assert_eq!(fired, vec![100.0, 200.0, 300.0]);

        host.cancel(id);
        assert!(host.is_idle());
        assert_eq!(host.pop_due(1000.0), None);
    }

    #[test]
    fn test_not_due_yet() {
        let mut host = ManualScheduler::new(16.0);
        host.set_timeout(10.0, wakeup(Task::Abilities, 1));
        assert_eq!(host.pop_due(9.0), None);
        assert_eq!(host.pending_count(Task::Abilities), 1);
        host.cancel(999);
        assert_eq!(host.pending_count(Task::Abilities), 1);
    }
}

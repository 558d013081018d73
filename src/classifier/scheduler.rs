use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tokio::{sync::mpsc, task::JoinHandle, time};

use super::clock::{Clock, ManualClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Work the classifier can defer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    TypingDeadline,
}

/// A deferred task whose delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub id: TaskId,
    pub task: DeferredTask,
}

/// Schedules deferred tasks for the classifier.
///
/// Fired deadlines are delivered back to whoever drives the classifier, which
/// hands them to [`Classifier::on_deadline`](super::Classifier::on_deadline).
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> TaskId;
    fn cancel(&mut self, id: TaskId);
}

/// Runs each deferred task as a sleeping tokio task that reports back over a
/// channel when its delay elapses.
pub struct TokioScheduler {
    next_id: u64,
    tasks: HashMap<TaskId, JoinHandle<()>>,
    fired_tx: mpsc::UnboundedSender<Deadline>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Deadline>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            tasks: HashMap::new(),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Tasks that are still sleeping.
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> TaskId {
        self.tasks.retain(|_, handle| !handle.is_finished());

        let id = TaskId(self.next_id);
        self.next_id += 1;

        let fired_tx = self.fired_tx.clone();
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = fired_tx.send(Deadline { id, task });
        });

        self.tasks.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TaskId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ManualQueue {
    next_id: u64,
    pending: Vec<(Deadline, Instant)>,
    cancelled: Vec<TaskId>,
}

/// Scheduler driven by a [`ManualClock`]. Clones share the same queue, so a
/// test can keep one handle while the classifier owns another.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: Rc::default(),
        }
    }

    /// Removes and returns every task whose delay has elapsed, earliest first.
    pub fn take_due(&self) -> Vec<Deadline> {
        let now = self.clock.now();
        let mut queue = self.queue.borrow_mut();
        let mut due: Vec<(Deadline, Instant)> = Vec::new();
        queue.pending.retain(|entry| {
            if entry.1 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(deadline, at)| (*at, deadline.id));
        due.into_iter().map(|(deadline, _)| deadline).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    pub fn cancelled(&self) -> Vec<TaskId> {
        self.queue.borrow().cancelled.clone()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> TaskId {
        let due_at = self.clock.now() + delay;
        let mut queue = self.queue.borrow_mut();
        let id = TaskId(queue.next_id);
        queue.next_id += 1;
        queue.pending.push((Deadline { id, task }, due_at));
        id
    }

    fn cancel(&mut self, id: TaskId) {
        let mut queue = self.queue.borrow_mut();
        let before = queue.pending.len();
        queue.pending.retain(|(deadline, _)| deadline.id != id);
        if queue.pending.len() != before {
            queue.cancelled.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPING: DeferredTask = DeferredTask::TypingDeadline;

    #[tokio::test(start_paused = true)]
    async fn deadline_arrives_after_its_delay() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        let id = scheduler.schedule(Duration::from_millis(500), TYPING);
        assert_eq!(scheduler.pending(), 1);

        time::sleep(Duration::from_millis(499)).await;
        assert!(fired.try_recv().is_err());

        let deadline = fired.recv().await.unwrap();
        assert_eq!(deadline, Deadline { id, task: TYPING });
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        let cancelled = scheduler.schedule(Duration::from_millis(500), TYPING);
        let kept = scheduler.schedule(Duration::from_millis(800), TYPING);
        assert_eq!(scheduler.pending(), 2);

        scheduler.cancel(cancelled);
        assert_eq!(scheduler.pending(), 1);

        time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(fired.try_recv().unwrap().id, kept);
        assert!(fired.try_recv().is_err());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_aborts_sleeping_tasks() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        scheduler.schedule(Duration::from_millis(500), TYPING);
        drop(scheduler);

        assert!(fired.recv().await.is_none());
    }
}

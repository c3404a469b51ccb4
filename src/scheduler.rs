use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Handle to a scheduled task, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Entry<T> {
    due_ms: u64,
    seq: u64,
    id: u64,
    repeat_ms: Option<u64>,
    task: T,
}

// BinaryHeap is a max-heap; order entries so the earliest deadline pops
// first, with FIFO among equal deadlines.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

/// Deterministic single-threaded task scheduler with millisecond
/// resolution. Time only moves when the caller pumps it via [`advance`],
/// so anything driven by it can be tested exactly.
///
/// [`advance`]: Scheduler::advance
pub struct Scheduler<T> {
    queue: BinaryHeap<Entry<T>>,
    live: HashSet<u64>,
    now_ms: u64,
    next_id: u64,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            live: HashSet::new(),
            now_ms: 0,
            next_id: 0,
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn has_pending(&self) -> bool {
        !self.live.is_empty()
    }

    /// Schedule a one-shot task to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TaskHandle {
        self.push_entry(delay_ms, None, task)
    }

    /// Schedule a task that re-arms itself every `interval_ms` until
    /// cancelled. A zero interval is treated as one millisecond.
    pub fn schedule_repeating(&mut self, interval_ms: u64, task: T) -> TaskHandle {
        let interval = interval_ms.max(1);
        self.push_entry(interval, Some(interval), task)
    }

    /// Cancel a pending task. Returns false if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.live.remove(&handle.0)
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }

    fn push_entry(&mut self, delay_ms: u64, repeat_ms: Option<u64>, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.next_seq += 1;
        self.live.insert(id);
        self.queue.push(Entry {
            due_ms: self.now_ms + delay_ms,
            seq: self.next_seq,
            id,
            repeat_ms,
            task,
        });
        TaskHandle(id)
    }

    /// Move the clock forward by `ms` and return every task that came
    /// due, in deadline order. Repeating tasks fire once per elapsed
    /// interval.
    pub fn advance(&mut self, ms: u64) -> Vec<T>
    where
        T: Clone,
    {
        self.now_ms += ms;
        let mut fired = Vec::new();
        loop {
            let due = matches!(self.queue.peek(), Some(entry) if entry.due_ms <= self.now_ms);
            if !due {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if !self.live.contains(&entry.id) {
                continue;
            }
            match entry.repeat_ms {
                Some(interval) => {
                    fired.push(entry.task.clone());
                    self.next_seq += 1;
                    self.queue.push(Entry {
                        due_ms: entry.due_ms + interval,
                        seq: self.next_seq,
                        id: entry.id,
                        repeat_ms: entry.repeat_ms,
                        task: entry.task,
                    });
                }
                None => {
                    self.live.remove(&entry.id);
                    fired.push(entry.task);
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let mut sched = Scheduler::new();
        sched.schedule(500, "late");
        sched.schedule(100, "early");
        sched.schedule(300, "middle");

        assert_eq!(sched.advance(1000), vec!["early", "middle", "late"]);
        assert!(!sched.has_pending());
    }

    #[test]
    fn equal_deadlines_fire_in_submission_order() {
        let mut sched = Scheduler::new();
        sched.schedule(200, "first");
        sched.schedule(200, "second");
        sched.schedule(200, "third");

        assert_eq!(sched.advance(200), vec!["first", "second", "third"]);
    }

    #[test]
    fn nothing_fires_before_its_deadline() {
        let mut sched = Scheduler::new();
        sched.schedule(800, "revert");

        assert!(sched.advance(799).is_empty());
        assert_eq!(sched.advance(1), vec!["revert"]);
        assert_eq!(sched.now_ms(), 800);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut sched = Scheduler::new();
        let keep = sched.schedule(100, "keep");
        let drop = sched.schedule(100, "drop");

        assert!(sched.cancel(drop));
        assert!(!sched.cancel(drop));
        assert_eq!(sched.advance(100), vec!["keep"]);
        assert!(!sched.cancel(keep));
    }

    #[test]
    fn clear_drops_everything() {
        let mut sched = Scheduler::new();
        sched.schedule(10, "a");
        sched.schedule_repeating(10, "b");
        sched.clear();

        assert!(!sched.has_pending());
        assert!(sched.advance(1000).is_empty());
    }

    #[test]
    fn repeating_task_fires_once_per_interval() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(1000, "tick");

        assert_eq!(sched.advance(3000), vec!["tick", "tick", "tick"]);
        assert_eq!(sched.advance(500), Vec::<&str>::new());
        assert_eq!(sched.advance(500), vec!["tick"]);
    }

    #[test]
    fn cancelling_repeating_task_stops_it() {
        let mut sched = Scheduler::new();
        let tick = sched.schedule_repeating(1000, "tick");

        assert_eq!(sched.advance(1000), vec!["tick"]);
        assert!(sched.cancel(tick));
        assert!(sched.advance(5000).is_empty());
    }

    #[test]
    fn one_shot_interleaves_with_repeating() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(1000, "tick");
        sched.schedule(1500, "revert");

        assert_eq!(sched.advance(2000), vec!["tick", "revert", "tick"]);
    }
}

use std::collections::VecDeque;

use serde::Serialize;

/// Oldest history entries are dropped past this many.
pub const QUEUE_HISTORY_LIMIT: usize = 256;

/// A script waiting to run, paired with the actor it runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptQueueEntry {
    pub script_index: i32,
    pub actor_index: i32,
}

/// The running script plus the ones waiting behind it, in the order they
/// were queued.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptQueue {
    current: Option<ScriptQueueEntry>,
    pending: VecDeque<ScriptQueueEntry>,
    history: VecDeque<ScriptQueueEntry>,
    skip_processing: bool,
}

impl ScriptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the script current when nothing runs, otherwise appends it.
    /// Returns false when the skip-processing latch dropped the request.
    pub fn queue_script(&mut self, script_index: i32, actor_index: i32) -> bool {
        if self.skip_processing {
            log::debug!("skip processing is on, dropping script {script_index}");
            return false;
        }
        let entry = ScriptQueueEntry {
            script_index,
            actor_index,
        };
        if self.current.is_some() {
            self.pending.push_back(entry);
        } else {
            self.start(entry);
        }
        true
    }

    fn start(&mut self, entry: ScriptQueueEntry) {
        if self.history.len() == QUEUE_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(entry);
        self.current = Some(entry);
    }

    pub fn current(&self) -> Option<ScriptQueueEntry> {
        self.current
    }

    /// Finishes the current script and promotes the next queued one.
    pub fn advance(&mut self) -> Option<ScriptQueueEntry> {
        self.current = None;
        let next = self.pending.pop_front()?;
        self.start(next);
        Some(next)
    }

    /// Drops every waiting entry; the current script keeps running.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Drops the current script as well as the waiting ones.
    pub fn clear(&mut self) {
        self.current = None;
        self.pending.clear();
    }

    pub fn peek(&self) -> Option<&ScriptQueueEntry> {
        self.pending.front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &ScriptQueueEntry> {
        self.pending.iter()
    }

    /// The last [`QUEUE_HISTORY_LIMIT`] entries that became current, oldest
    /// first.
    pub fn history(&self) -> &VecDeque<ScriptQueueEntry> {
        &self.history
    }

    pub fn skip_processing(&self) -> bool {
        self.skip_processing
    }

    pub fn set_skip_processing(&mut self, skip: bool) {
        self.skip_processing = skip;
    }
}

#[cfg(test)]
mod tests {
    use super::{ScriptQueue, ScriptQueueEntry, QUEUE_HISTORY_LIMIT};

    fn entry(script_index: i32, actor_index: i32) -> ScriptQueueEntry {
        ScriptQueueEntry {
            script_index,
            actor_index,
        }
    }

    #[test]
    fn first_script_becomes_current() {
        let mut queue = ScriptQueue::new();
        assert!(queue.queue_script(4, 1));
        assert_eq!(queue.current(), Some(entry(4, 1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn queued_scripts_run_in_fifo_order() {
        let mut queue = ScriptQueue::new();
        queue.queue_script(0, 0);
        for script in 1..=3 {
            queue.queue_script(script, script * 10);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek(), Some(&entry(1, 10)));

        let order: Vec<_> = std::iter::from_fn(|| queue.advance()).collect();
        assert_eq!(order, vec![entry(1, 10), entry(2, 20), entry(3, 30)]);
        assert_eq!(queue.current(), None);
        assert_eq!(queue.history().len(), 4);
    }

    #[test]
    fn skip_processing_drops_new_entries_only() {
        let mut queue = ScriptQueue::new();
        queue.queue_script(1, 0);
        queue.set_skip_processing(true);
        assert!(!queue.queue_script(2, 0));
        assert_eq!(queue.current(), Some(entry(1, 0)));
        assert!(queue.is_empty());

        queue.set_skip_processing(false);
        assert!(queue.queue_script(2, 0));
        assert_eq!(queue.pending().count(), 1);
    }

    #[test]
    fn history_keeps_the_newest_entries() {
        let mut queue = ScriptQueue::new();
        for script in 0..QUEUE_HISTORY_LIMIT as i32 + 2 {
            queue.queue_script(script, 0);
            queue.advance();
        }
        assert_eq!(queue.history().len(), QUEUE_HISTORY_LIMIT);
        assert_eq!(queue.history().front(), Some(&entry(2, 0)));
        assert_eq!(
            queue.history().back(),
            Some(&entry(QUEUE_HISTORY_LIMIT as i32 + 1, 0))
        );
    }

    #[test]
    fn reset_keeps_the_running_script() {
        let mut queue = ScriptQueue::new();
        queue.queue_script(1, 0);
        queue.queue_script(2, 0);
        queue.reset();
        assert_eq!(queue.current(), Some(entry(1, 0)));
        assert!(queue.is_empty());
        queue.clear();
        assert_eq!(queue.current(), None);
    }
}

use std::collections::VecDeque;

use crate::types::Priority;

/// Priority queue that serves `critical` before `high` before `medium` before
/// `low`, and arrival order among equal priorities.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    entries: VecDeque<(Priority, T)>,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, priority: Priority, item: T) {
        // Insert after every entry of the same or higher priority
        let index = self.entries.partition_point(|(p, _)| *p >= priority);
        self.entries.insert(index, (priority, item));
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_front().map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, item)| item)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

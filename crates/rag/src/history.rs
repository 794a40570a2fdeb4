//! Bounded in-memory answer history.

use crate::types::AnswerRecord;
use std::collections::VecDeque;

/// Ring of the most recent answers; the oldest record is evicted first.
#[derive(Debug, Clone)]
pub struct AnswerHistory {
    records: VecDeque<AnswerRecord>,
    capacity: usize,
}

impl AnswerHistory {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: AnswerRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records from oldest to newest.
    pub fn snapshot(&self) -> Vec<AnswerRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(i: usize) -> AnswerRecord {
        AnswerRecord {
            query: format!("q{}", i),
            answer: format!("a{}", i),
        }
    }

    #[test]
    fn test_snapshot_is_oldest_first() {
        let mut history = AnswerHistory::new(10);
        history.push(record(1));
        history.push(record(2));

        let snapshot = history.snapshot();
        assert_eq!(snapshot, vec![record(1), record(2)]);
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let mut history = AnswerHistory::new(2);
        for i in 0..5 {
            history.push(record(i));
        }

        assert_eq!(history.len(), 2);
        assert_eq!(history.snapshot(), vec![record(3), record(4)]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = AnswerHistory::new(0);
        history.push(record(1));
        history.push(record(2));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.snapshot(), vec![record(2)]);

        history.clear();
        assert!(history.is_empty());
    }
}

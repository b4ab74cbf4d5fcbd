use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded sequence of recent reference prices for one symbol. The oldest
/// sample is evicted when the window is full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    capacity: usize,
    values: VecDeque<f64>,
}

impl PriceHistory {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            values: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    #[inline]
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// The most recent `count` samples, oldest first. Fewer when the history
    /// is shorter.
    #[inline]
    pub fn tail(&self, count: usize) -> impl Iterator<Item = f64> + '_ {
        let skip = self.values.len().saturating_sub(count);
        self.values.iter().skip(skip).copied()
    }

    /// Sample `age` steps back from the newest (age 0 = newest).
    #[inline]
    pub fn nth_back(&self, age: usize) -> Option<f64> {
        let len = self.values.len();
        if age >= len {
            return None;
        }
        self.values.get(len - 1 - age).copied()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new()
    }
}

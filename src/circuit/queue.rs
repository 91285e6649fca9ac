//! Time-ordered queue of pending events.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::{Event, Time};

/// Heap entry. Ordered so that the max-heap pops the earliest event, and
/// among equal times the one inserted first.
#[derive(Debug, Clone, Copy)]
struct Queued {
    event: Event,
    seq: u64,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .time
            .cmp(&self.event.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue of events keyed by time.
///
/// Events with equal times pop in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event.
    pub fn insert(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued { event, seq });
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of pending events.
    pub fn population(&self) -> usize {
        self.heap.len()
    }

    /// The earliest pending event.
    pub fn peek_minimum(&self) -> Option<&Event> {
        self.heap.peek().map(|queued| &queued.event)
    }

    /// Time of the earliest pending event.
    pub fn minimum_time(&self) -> Option<Time> {
        self.peek_minimum().map(|event| event.time)
    }

    /// Remove and return the earliest pending event.
    pub fn pop_minimum(&mut self) -> Option<Event> {
        self.heap.pop().map(|queued| queued.event)
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl Extend<Event> for EventQueue {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for event in iter {
            self.insert(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{PinId, Signal};

    fn event(time: Time, pin: usize) -> Event {
        Event::new(time, Signal::LOW, PinId(pin))
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.extend([event(9, 0), event(2, 1), event(5, 2)]);

        assert_eq!(queue.population(), 3);
        assert_eq!(queue.minimum_time(), Some(2));
        let times: Vec<_> = std::iter::from_fn(|| queue.pop_minimum())
            .map(|e| e.time)
            .collect();
        assert_eq!(times, vec![2, 5, 9]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_times_pop_in_insertion_order() {
        let mut queue = EventQueue::new();
        queue.extend([event(4, 3), event(1, 9), event(4, 1), event(4, 2)]);

        let pins: Vec<_> = std::iter::from_fn(|| queue.pop_minimum())
            .map(|e| e.pin.0)
            .collect();
        assert_eq!(pins, vec![9, 3, 1, 2]);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = EventQueue::new();
        assert!(queue.peek_minimum().is_none());
        assert!(queue.pop_minimum().is_none());
        queue.insert(event(1, 0));
        queue.clear();
        assert_eq!(queue.population(), 0);
    }
}

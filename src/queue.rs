//! Min-priority queue used as the open set.
//!
//! Built on `BinaryHeap`, which is a max-heap, by reversing the entry order.
//! Entries with equal keys come out in insertion order, which keeps search
//! traces reproducible from run to run.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    seq: u64,
    value: V,
}

impl<K: Ord, V> PartialEq for Entry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord, V> Eq for Entry<K, V> {}

impl<K: Ord, V> PartialOrd for Entry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for Entry<K, V> {
    // Smallest key, then oldest entry, is the "greatest" for the max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A multiset of `(key, value)` pairs that always yields a minimum-key value.
///
/// There is no decrease-key and no removal by value.
///
/// ```
/// use sokoban_solver::queue::PriorityQueue;
///
/// let mut queue = PriorityQueue::new();
/// queue.enqueue(3, "c");
/// queue.enqueue(1, "a");
/// queue.enqueue(1, "b");
/// assert_eq!(queue.dequeue(), Some("a"));
/// assert_eq!(queue.dequeue(), Some("b"));
/// assert_eq!(queue.dequeue(), Some("c"));
/// assert!(queue.is_empty());
/// ```
#[derive(Debug)]
pub struct PriorityQueue<K, V> {
    heap: BinaryHeap<Entry<K, V>>,
    next_seq: u64,
    peak_len: usize,
}

impl<K: Ord, V> PriorityQueue<K, V> {
    pub fn new() -> Self {
        PriorityQueue {
            heap: BinaryHeap::new(),
            next_seq: 0,
            peak_len: 0,
        }
    }

    /// Inserts `value` with priority `key`. O(log n).
    pub fn enqueue(&mut self, key: K, value: V) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { key, seq, value });
        self.peak_len = self.peak_len.max(self.heap.len());
    }

    /// Removes and returns a value with the smallest key; the earliest inserted
    /// among equal keys. `None` when the queue is empty. O(log n).
    pub fn dequeue(&mut self) -> Option<V> {
        self.heap.pop().map(|entry| entry.value)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Largest number of entries held at once.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }
}

impl<K: Ord, V> Default for PriorityQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;

    #[test]
    fn test_dequeue_in_key_order() {
        let mut queue = PriorityQueue::new();
        for (key, value) in [(5, 'e'), (2, 'b'), (4, 'd'), (1, 'a'), (3, 'c')] {
            queue.enqueue(key, value);
        }
        let drained: Vec<char> = std::iter::from_fn(|| queue.dequeue()).collect();
        assert_eq!(drained, vec!['a', 'b', 'c', 'd', 'e']);
    }

    #[test]
    fn test_equal_keys_are_fifo() {
        let mut queue = PriorityQueue::new();
        for value in 0..20 {
            queue.enqueue(OrderedFloat(1.5), value);
        }
        queue.enqueue(OrderedFloat(0.5), 100);
        assert_eq!(queue.dequeue(), Some(100));
        for expected in 0..20 {
            assert_eq!(queue.dequeue(), Some(expected));
        }
    }

    #[test]
    fn test_fifo_survives_interleaving() {
        let mut queue = PriorityQueue::new();
        queue.enqueue(2, "first two");
        queue.enqueue(1, "one");
        assert_eq!(queue.dequeue(), Some("one"));
        queue.enqueue(2, "second two");
        queue.enqueue(2, "third two");
        assert_eq!(queue.dequeue(), Some("first two"));
        assert_eq!(queue.dequeue(), Some("second two"));
        assert_eq!(queue.dequeue(), Some("third two"));
    }

    #[test]
    fn test_empty_queue() {
        let mut queue: PriorityQueue<u32, ()> = PriorityQueue::default();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_peak_len_tracks_high_water() {
        let mut queue = PriorityQueue::new();
        queue.enqueue(1, ());
        queue.enqueue(2, ());
        queue.enqueue(3, ());
        queue.dequeue();
        queue.dequeue();
        queue.enqueue(4, ());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peak_len(), 3);
    }
}

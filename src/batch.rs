// Batching adapters: value streams <-> batch streams.
//
// The merge engines operate on batches (Vec<V> of bounded length) so that
// the per-value cost of crossing the iterator boundary is paid once per
// batch instead of once per value. `Buffered` turns a value iterator into
// a batch iterator; `Debuffer` is its inverse. Concatenating the batches
// of either direction reproduces the original value order exactly.

use std::cmp::Ordering;
use std::mem;

/// Adapts a value iterator into an iterator over batches of at most
/// `capacity` values, in source order. Never yields an empty batch.
pub struct Buffered<I> {
    source: I,
    capacity: usize,
    done: bool,
}

impl<I: Iterator> Buffered<I> {
    pub fn new(source: I, capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be at least 1");
        Self {
            source,
            capacity,
            done: false,
        }
    }
}

impl<I: Iterator> Iterator for Buffered<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        // Once the source reports exhaustion it is never pulled again.
        if self.done {
            return None;
        }
        let mut batch = Vec::with_capacity(self.capacity);
        while batch.len() < self.capacity {
            match self.source.next() {
                Some(value) => batch.push(value),
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if batch.is_empty() { None } else { Some(batch) }
    }
}

/// Flattens an iterator over batches back into individual values,
/// finishing each batch before pulling the next one.
pub struct Debuffer<V, I> {
    cursor: BatchCursor<V, I>,
}

impl<V, I: Iterator<Item = Vec<V>>> Debuffer<V, I> {
    pub fn new(batches: I) -> Self {
        Self {
            cursor: BatchCursor::new(batches),
        }
    }
}

impl<V, I: Iterator<Item = Vec<V>>> Iterator for Debuffer<V, I> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.cursor.pop()
    }
}

/// Pull cursor over a batched source: exposes the head value of the
/// current batch and refills from the underlying iterator on demand.
/// Externally supplied empty batches are skipped. Nothing is pulled
/// until the first head/pop request.
pub(crate) struct BatchCursor<V, I> {
    batches: I,
    current: std::vec::IntoIter<V>,
    done: bool,
}

impl<V, I: Iterator<Item = Vec<V>>> BatchCursor<V, I> {
    pub(crate) fn new(batches: I) -> Self {
        Self {
            batches,
            current: Vec::new().into_iter(),
            done: false,
        }
    }

    fn refill(&mut self) {
        while self.current.as_slice().is_empty() && !self.done {
            match self.batches.next() {
                Some(batch) => self.current = batch.into_iter(),
                None => self.done = true,
            }
        }
    }

    /// Borrows the next value without consuming it, or None when the
    /// source is exhausted.
    pub(crate) fn head(&mut self) -> Option<&V> {
        self.refill();
        self.current.as_slice().first()
    }

    /// Consumes and returns the next value.
    pub(crate) fn pop(&mut self) -> Option<V> {
        self.refill();
        self.current.next()
    }

    /// Takes the remainder of the current batch, or the next whole batch
    /// from the source. Used by the pairwise engine to drain a surviving
    /// source without touching individual values.
    pub(crate) fn take_batch(&mut self) -> Option<Vec<V>> {
        loop {
            let rest: Vec<V> = mem::replace(&mut self.current, Vec::new().into_iter()).collect();
            if !rest.is_empty() {
                return Some(rest);
            }
            if self.done {
                return None;
            }
            match self.batches.next() {
                Some(batch) => self.current = batch.into_iter(),
                None => self.done = true,
            }
        }
    }
}

/// Output accumulator shared by both merge engines: collects merged
/// values and hands them out as batches of at most `capacity` values.
///
/// With `verify` armed, every pushed value is compared against its
/// predecessor and a sort-order violation panics; the buffer then
/// accumulates one value past `capacity` and full flushes hold that
/// last value back, so the check also covers batch boundaries (batching
/// granularity is not part of the observable contract).
pub(crate) struct OutputBuffer<V> {
    values: Vec<V>,
    capacity: usize,
    verify: bool,
}

impl<V> OutputBuffer<V> {
    pub(crate) fn new(capacity: usize, verify: bool) -> Self {
        assert!(capacity > 0, "batch capacity must be at least 1");
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
            verify,
        }
    }

    pub(crate) fn push<F>(&mut self, value: V, cmp: &mut F)
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        if self.verify {
            if let Some(prev) = self.values.last() {
                if cmp(prev, &value) == Ordering::Greater {
                    panic!(
                        "ordering violation: merge produced out-of-order output; \
                         inputs are not sorted under the supplied comparator"
                    );
                }
            }
        }
        self.values.push(value);
    }

    pub(crate) fn is_full(&self) -> bool {
        // When verifying, fill one past capacity so the flush can keep
        // the last value as the cross-batch comparison witness.
        if self.verify {
            self.values.len() > self.capacity
        } else {
            self.values.len() >= self.capacity
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flushes a full batch mid-stream.
    pub(crate) fn take_full(&mut self) -> Vec<V> {
        if self.verify && self.values.len() > 1 {
            // Keep the last value as the comparison witness for the
            // first value of the next batch.
            self.values.drain(..self.values.len() - 1).collect()
        } else {
            mem::replace(&mut self.values, Vec::with_capacity(self.capacity))
        }
    }

    /// Flushes whatever remains, if anything. Used on exhaustion.
    pub(crate) fn take_rest(&mut self) -> Option<Vec<V>> {
        if self.values.is_empty() {
            None
        } else {
            Some(mem::take(&mut self.values))
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_chunks_in_source_order() {
        let buffered = Buffered::new(0..10, 4);
        let batches: Vec<Vec<i32>> = buffered.collect();
        assert_eq!(batches, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn test_buffered_exact_multiple_has_no_trailing_batch() {
        let batches: Vec<Vec<i32>> = Buffered::new(0..8, 4).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_buffered_empty_source() {
        let mut buffered = Buffered::new(std::iter::empty::<i32>(), 4);
        assert_eq!(buffered.next(), None);
        assert_eq!(buffered.next(), None);
    }

    #[test]
    fn test_buffered_capacity_one() {
        let batches: Vec<Vec<i32>> = Buffered::new(0..3, 1).collect();
        assert_eq!(batches, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    #[should_panic(expected = "batch capacity must be at least 1")]
    fn test_buffered_zero_capacity_panics() {
        let _ = Buffered::new(0..3, 0);
    }

    #[test]
    fn test_debuffer_preserves_order() {
        let batches = vec![vec![1, 2, 3], vec![4], vec![5, 6]];
        let values: Vec<i32> = Debuffer::new(batches.into_iter()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_debuffer_skips_empty_batches() {
        let batches: Vec<Vec<i32>> = vec![vec![], vec![1], vec![], vec![], vec![2], vec![]];
        let values: Vec<i32> = Debuffer::new(batches.into_iter()).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_buffer_debuffer_roundtrip() {
        let original: Vec<u32> = (0..1000).collect();
        let roundtrip: Vec<u32> =
            Debuffer::new(Buffered::new(original.clone().into_iter(), 7)).collect();
        assert_eq!(roundtrip, original);
    }

    #[test]
    fn test_buffered_is_lazy() {
        // Construction alone must not pull the source.
        let mut pulled = 0;
        let source = (0..4).inspect(|_| pulled += 1);
        let mut buffered = Buffered::new(source, 2);
        let first = buffered.next().unwrap();
        assert_eq!(first, vec![0, 1]);
        drop(buffered);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_cursor_head_does_not_consume() {
        let mut cursor = BatchCursor::new(vec![vec![7, 8]].into_iter());
        assert_eq!(cursor.head(), Some(&7));
        assert_eq!(cursor.head(), Some(&7));
        assert_eq!(cursor.pop(), Some(7));
        assert_eq!(cursor.pop(), Some(8));
        assert_eq!(cursor.head(), None);
        assert_eq!(cursor.pop(), None);
    }

    #[test]
    fn test_cursor_take_batch_returns_remainder_first() {
        let mut cursor = BatchCursor::new(vec![vec![1, 2, 3], vec![4, 5]].into_iter());
        assert_eq!(cursor.pop(), Some(1));
        assert_eq!(cursor.take_batch(), Some(vec![2, 3]));
        assert_eq!(cursor.take_batch(), Some(vec![4, 5]));
        assert_eq!(cursor.take_batch(), None);
    }

    #[test]
    fn test_output_buffer_flush_boundaries() {
        let mut cmp = i32::cmp as fn(&i32, &i32) -> std::cmp::Ordering;
        let mut buffer = OutputBuffer::new(3, false);
        for v in [1, 2, 3] {
            buffer.push(v, &mut cmp);
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.take_full(), vec![1, 2, 3]);
        assert!(buffer.is_empty());
        buffer.push(4, &mut cmp);
        assert_eq!(buffer.take_rest(), Some(vec![4]));
        assert_eq!(buffer.take_rest(), None);
    }

    #[test]
    fn test_output_buffer_verify_holds_back_witness() {
        let mut cmp = i32::cmp as fn(&i32, &i32) -> std::cmp::Ordering;
        let mut buffer = OutputBuffer::new(3, true);
        for v in [1, 2, 3] {
            buffer.push(v, &mut cmp);
        }
        assert_eq!(buffer.take_full(), vec![1, 2]);
        // The witness is still buffered and flushes with the rest.
        buffer.push(4, &mut cmp);
        assert_eq!(buffer.take_rest(), Some(vec![3, 4]));
    }

    #[test]
    #[should_panic(expected = "ordering violation")]
    fn test_output_buffer_verify_checks_across_capacity_one_batches() {
        let mut cmp = i32::cmp as fn(&i32, &i32) -> std::cmp::Ordering;
        let mut buffer = OutputBuffer::new(1, true);
        buffer.push(5, &mut cmp);
        // One extra value accumulates before the flush so a witness
        // survives even at capacity 1.
        assert!(!buffer.is_full());
        buffer.push(6, &mut cmp);
        assert!(buffer.is_full());
        assert_eq!(buffer.take_full(), vec![5]);
        buffer.push(2, &mut cmp);
    }

    #[test]
    #[should_panic(expected = "ordering violation")]
    fn test_output_buffer_verify_panics_on_regression() {
        let mut cmp = i32::cmp as fn(&i32, &i32) -> std::cmp::Ordering;
        let mut buffer = OutputBuffer::new(8, true);
        buffer.push(5, &mut cmp);
        buffer.push(3, &mut cmp);
    }
}

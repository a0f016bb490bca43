// Two-way merge of batched sources. The common case: a single comparison
// per emitted value, no selection structure. Equal heads emit left then
// right so no value is ever dropped, and once one source runs dry the
// survivor's remaining batches pass through without further comparisons.

use std::cmp::Ordering;

use crate::batch::{BatchCursor, OutputBuffer};
use crate::MergeOptions;

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy)]
enum State {
    Merging,
    Draining(Side),
    Done,
}

/// Merges two batched ordered sources into one batched ordered output
/// with a two-pointer scan.
pub struct PairwiseMerge<V, I, F> {
    left: BatchCursor<V, I>,
    right: BatchCursor<V, I>,
    cmp: F,
    buffer: OutputBuffer<V>,
    // Second half of an equal pair that did not fit the current batch.
    pending: Option<V>,
    state: State,
    verify: bool,
}

impl<V, I, F> PairwiseMerge<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    pub fn new(left: I, right: I, options: MergeOptions, cmp: F) -> Self {
        Self {
            left: BatchCursor::new(left),
            right: BatchCursor::new(right),
            cmp,
            buffer: OutputBuffer::new(options.batch_capacity, options.verify_ordering),
            pending: None,
            state: State::Merging,
            verify: options.verify_ordering,
        }
    }
}

impl<V, I, F> Iterator for PairwiseMerge<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    type Item = Vec<V>;

    fn next(&mut self) -> Option<Vec<V>> {
        loop {
            match self.state {
                State::Merging => {
                    if self.buffer.is_full() {
                        return Some(self.buffer.take_full());
                    }
                    if let Some(value) = self.pending.take() {
                        self.buffer.push(value, &mut self.cmp);
                        continue;
                    }

                    let ord = match (self.left.head(), self.right.head()) {
                        (Some(l), Some(r)) => (self.cmp)(l, r),
                        (Some(_), None) => {
                            self.state = State::Draining(Side::Left);
                            if !self.verify {
                                if let Some(batch) = self.buffer.take_rest() {
                                    return Some(batch);
                                }
                            }
                            continue;
                        }
                        (None, Some(_)) => {
                            self.state = State::Draining(Side::Right);
                            if !self.verify {
                                if let Some(batch) = self.buffer.take_rest() {
                                    return Some(batch);
                                }
                            }
                            continue;
                        }
                        (None, None) => {
                            self.state = State::Done;
                            return self.buffer.take_rest();
                        }
                    };

                    match ord {
                        Ordering::Less => {
                            let value = self.left.pop().expect("left head checked above");
                            self.buffer.push(value, &mut self.cmp);
                        }
                        Ordering::Greater => {
                            let value = self.right.pop().expect("right head checked above");
                            self.buffer.push(value, &mut self.cmp);
                        }
                        Ordering::Equal => {
                            // Both values are kept, left before right.
                            let l = self.left.pop().expect("left head checked above");
                            let r = self.right.pop().expect("right head checked above");
                            self.buffer.push(l, &mut self.cmp);
                            if self.buffer.is_full() {
                                self.pending = Some(r);
                            } else {
                                self.buffer.push(r, &mut self.cmp);
                            }
                        }
                    }
                }
                State::Draining(side) => {
                    let cursor = match side {
                        Side::Left => &mut self.left,
                        Side::Right => &mut self.right,
                    };
                    if self.verify {
                        // Checked drain: route the survivor through the
                        // output buffer so every pair is still compared.
                        if self.buffer.is_full() {
                            return Some(self.buffer.take_full());
                        }
                        match cursor.pop() {
                            Some(value) => self.buffer.push(value, &mut self.cmp),
                            None => {
                                self.state = State::Done;
                                return self.buffer.take_rest();
                            }
                        }
                    } else {
                        match cursor.take_batch() {
                            Some(batch) => return Some(batch),
                            None => {
                                self.state = State::Done;
                                return None;
                            }
                        }
                    }
                }
                State::Done => return None,
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

// K-way merge of batched sources over a loser tree. Each extraction asks
// the tree for the winning source, pulls that source's next head, and
// replays one tree path; everything else stays cached. Sources are only
// pulled when the tree needs their next head, never past the current
// batch boundary.

use std::cmp::Ordering;

use crate::batch::{BatchCursor, OutputBuffer};
use crate::loser_tree::LoserTree;
use crate::MergeOptions;

/// Merges three or more batched ordered sources into one batched ordered
/// output in O(log k) comparisons per value.
pub struct TreeMerge<V, I, F> {
    cursors: Vec<BatchCursor<V, I>>,
    // Built lazily on the first pull so that constructing the merge does
    // not touch the sources.
    tree: Option<LoserTree<V>>,
    buffer: OutputBuffer<V>,
    cmp: F,
}

impl<V, I, F> TreeMerge<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    pub fn new(sources: Vec<I>, options: MergeOptions, cmp: F) -> Self {
        assert!(
            sources.len() >= 2,
            "TreeMerge requires at least two sources"
        );
        Self {
            cursors: sources.into_iter().map(BatchCursor::new).collect(),
            tree: None,
            buffer: OutputBuffer::new(options.batch_capacity, options.verify_ordering),
            cmp,
        }
    }
}

impl<V, I, F> Iterator for TreeMerge<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    type Item = Vec<V>;

    fn next(&mut self) -> Option<Vec<V>> {
        let Self {
            cursors,
            tree,
            buffer,
            cmp,
        } = self;

        let tree = match tree {
            Some(tree) => tree,
            None => {
                let heads = cursors.iter_mut().map(BatchCursor::pop).collect();
                tree.insert(LoserTree::new(heads, cmp))
            }
        };

        loop {
            if buffer.is_full() {
                return Some(buffer.take_full());
            }
            let Some((_, winner)) = tree.peek() else {
                return buffer.take_rest();
            };
            let value = match cursors[winner].pop() {
                Some(next) => tree.push(next, cmp),
                None => match tree.mark_winner_exhausted(cmp) {
                    Some(value) => value,
                    None => continue,
                },
            };
            buffer.push(value, cmp);
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

//! Lazy k-way merge of sorted sequences.
//!
//! Given any number of iterators that are each sorted under a common
//! comparator, [`merge`] yields their combined values in sorted order.
//! Sources are pulled on demand, so merging works on streams that are
//! too large to collect, and dropping the merge early releases the
//! sources without draining them.
//!
//! Internally values move in batches of [`DEFAULT_BATCH_CAPACITY`] to
//! amortize per-value dispatch. The batching is invisible at the value
//! level; callers that already produce batches can use [`merge_batched`]
//! and keep the batch representation end to end.
//!
//! Two sources are merged with a two-pointer scan, three or more with a
//! tournament (loser) tree that needs O(log k) comparisons per value.
//! Equal values are all kept, ordered by source index, which makes the
//! merge stable across sources.
//!
//! ```
//! use kway::merge;
//!
//! let merged: Vec<i32> = merge(vec![
//!     vec![1, 3, 5].into_iter(),
//!     vec![2, 3, 4].into_iter(),
//! ])
//! .collect();
//! assert_eq!(merged, vec![1, 2, 3, 3, 4, 5]);
//! ```
//!
//! Inputs that are not sorted under the supplied comparator produce
//! unspecified output order (no panic, no value loss in the engines'
//! common paths). Enable [`MergeOptions::verify_ordering`] in tests to
//! panic at the first out-of-order value instead.

use std::cmp::Ordering;

pub mod batch;
pub mod loser_tree;
pub mod merge;
pub mod pairwise;

pub use batch::{Buffered, Debuffer};
pub use loser_tree::LoserTree;
pub use merge::TreeMerge;
pub use pairwise::PairwiseMerge;

/// Default number of values per internal batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 128;

/// Plain-function comparator over borrowed values.
pub type Comparator<V> = fn(&V, &V) -> Ordering;

/// Tuning and debugging knobs for a merge. The observable output is the
/// same for every valid configuration.
#[derive(Clone, Copy, Debug)]
pub struct MergeOptions {
    /// Values per internal batch. Must be at least 1.
    pub batch_capacity: usize,
    /// Panic on the first out-of-order output value instead of silently
    /// producing unspecified order. Off by default; meant for tests.
    pub verify_ordering: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            verify_ordering: false,
        }
    }
}

/// Merged value stream returned by [`merge`] and friends.
///
/// The zero- and one-source cases never pay for batching: an empty
/// input yields nothing, a single source is passed through as-is.
pub enum MergeIter<V, I, F>
where
    I: Iterator<Item = V>,
{
    Empty,
    Single(I),
    Merged(Debuffer<V, BatchMergeIter<V, Buffered<I>, F>>),
}

impl<V, I, F> Iterator for MergeIter<V, I, F>
where
    I: Iterator<Item = V>,
    F: FnMut(&V, &V) -> Ordering,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        match self {
            MergeIter::Empty => None,
            MergeIter::Single(source) => source.next(),
            MergeIter::Merged(inner) => inner.next(),
        }
    }
}

/// Merged batch stream returned by [`merge_batched`] and friends.
pub enum BatchMergeIter<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
{
    Empty,
    Single(I),
    Pair(PairwiseMerge<V, I, F>),
    Tree(TreeMerge<V, I, F>),
}

impl<V, I, F> Iterator for BatchMergeIter<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    type Item = Vec<V>;

    fn next(&mut self) -> Option<Vec<V>> {
        match self {
            BatchMergeIter::Empty => None,
            BatchMergeIter::Single(source) => source.next(),
            BatchMergeIter::Pair(merge) => merge.next(),
            BatchMergeIter::Tree(merge) => merge.next(),
        }
    }
}

/// Merges sorted sources of naturally ordered values.
pub fn merge<V, I>(sources: Vec<I>) -> MergeIter<V, I, Comparator<V>>
where
    V: Ord,
    I: Iterator<Item = V>,
{
    merge_by(sources, V::cmp as Comparator<V>)
}

/// Merges sources that are each sorted under `cmp`.
pub fn merge_by<V, I, F>(sources: Vec<I>, cmp: F) -> MergeIter<V, I, F>
where
    I: Iterator<Item = V>,
    F: FnMut(&V, &V) -> Ordering,
{
    merge_by_with_options(sources, MergeOptions::default(), cmp)
}

/// Merges sources sorted under `cmp`, with explicit [`MergeOptions`].
pub fn merge_by_with_options<V, I, F>(
    mut sources: Vec<I>,
    options: MergeOptions,
    cmp: F,
) -> MergeIter<V, I, F>
where
    I: Iterator<Item = V>,
    F: FnMut(&V, &V) -> Ordering,
{
    match sources.len() {
        0 => MergeIter::Empty,
        1 => MergeIter::Single(sources.remove(0)),
        _ => {
            let batched = sources
                .into_iter()
                .map(|source| Buffered::new(source, options.batch_capacity))
                .collect();
            MergeIter::Merged(Debuffer::new(merge_batched_by_with_options(
                batched, options, cmp,
            )))
        }
    }
}

/// Merges pre-batched sorted sources of naturally ordered values.
///
/// Every batch must be internally sorted and each source's batches must
/// be sorted across batch boundaries. Empty batches are permitted; the
/// merging paths skip them, while the single-source passthrough forwards
/// batches untouched. Output batches hold at most [`MergeOptions::batch_capacity`]
/// values while both engines are comparing; once a single source
/// survives, its remaining batches pass through unchanged.
pub fn merge_batched<V, I>(sources: Vec<I>) -> BatchMergeIter<V, I, Comparator<V>>
where
    V: Ord,
    I: Iterator<Item = Vec<V>>,
{
    merge_batched_by(sources, V::cmp as Comparator<V>)
}

/// Merges pre-batched sources that are each sorted under `cmp`.
pub fn merge_batched_by<V, I, F>(sources: Vec<I>, cmp: F) -> BatchMergeIter<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    merge_batched_by_with_options(sources, MergeOptions::default(), cmp)
}

/// Merges pre-batched sources sorted under `cmp`, with explicit
/// [`MergeOptions`]. This is the dispatch point: zero and one source
/// short-circuit, two sources get the pairwise engine, more get the
/// loser tree.
pub fn merge_batched_by_with_options<V, I, F>(
    mut sources: Vec<I>,
    options: MergeOptions,
    cmp: F,
) -> BatchMergeIter<V, I, F>
where
    I: Iterator<Item = Vec<V>>,
    F: FnMut(&V, &V) -> Ordering,
{
    assert!(
        options.batch_capacity > 0,
        "batch capacity must be at least 1"
    );
    log::debug!(
        "merging {} batched source(s) with batch capacity {}",
        sources.len(),
        options.batch_capacity
    );
    match sources.len() {
        0 => BatchMergeIter::Empty,
        1 => BatchMergeIter::Single(sources.remove(0)),
        2 => {
            let right = sources.remove(1);
            let left = sources.remove(0);
            BatchMergeIter::Pair(PairwiseMerge::new(left, right, options, cmp))
        }
        _ => BatchMergeIter::Tree(TreeMerge::new(sources, options, cmp)),
    }
}

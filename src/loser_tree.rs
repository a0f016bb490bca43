// Tournament tree (tree of losers) over the current head value of each
// source. The root caches the overall winner; every internal node caches
// the loser of the match played there, so replacing the winner only has
// to replay the matches on one leaf-to-root path: O(log k) comparisons
// per extraction instead of the O(k) of a head re-scan.

use std::cmp::Ordering;
use std::mem;

/// What a tree slot currently holds for its source.
///
/// `Empty` is the construction-time fence: it wins every match, so the
/// slots it occupies drain out through the root while the real values are
/// passed in. `Exhausted` is the terminal sentinel for a source that
/// yielded its last value: it loses every match against a live head and
/// is never selected again.
enum Slot<V> {
    Empty,
    Head(V),
    Exhausted,
}

struct Node<V> {
    slot: Slot<V>,
    // Source index of the value parked here; usize::MAX for build fences.
    source: usize,
}

pub struct LoserTree<V> {
    // Index 0 holds the overall winner, indices 1..capacity hold the
    // losers. Conceptual leaves live at capacity..2*capacity and are not
    // stored; leaf `capacity + i` belongs to source `i`.
    nodes: Vec<Node<V>>,
    capacity: usize,
}

impl<V> LoserTree<V> {
    /// Builds a tree from the initial head of each source, `None` marking
    /// a source that was empty from the start. The source count is padded
    /// to the next power of two with exhausted leaves.
    pub fn new<F>(heads: Vec<Option<V>>, cmp: &mut F) -> Self
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let size = heads.len();
        if size == 0 {
            return Self {
                nodes: Vec::new(),
                capacity: 0,
            };
        }

        let capacity = size.next_power_of_two();
        let nodes = (0..capacity)
            .map(|_| Node {
                slot: Slot::Empty,
                source: usize::MAX,
            })
            .collect();
        let mut tree = Self { nodes, capacity };

        for (source, head) in heads.into_iter().enumerate() {
            let slot = match head {
                Some(value) => Slot::Head(value),
                None => Slot::Exhausted,
            };
            tree.pass(source, slot, cmp);
        }
        for source in size..capacity {
            tree.pass(source, Slot::Exhausted, cmp);
        }

        tree
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The current winner: its head value and source index, or None once
    /// every source is exhausted.
    pub fn peek(&self) -> Option<(&V, usize)> {
        let root = self.nodes.first()?;
        match &root.slot {
            Slot::Head(value) => Some((value, root.source)),
            Slot::Exhausted => None,
            Slot::Empty => {
                debug_assert!(false, "loser tree root still holds a build fence");
                None
            }
        }
    }

    /// Replaces the winner with the next head of its source, replays the
    /// winner's path, and returns the old winner value.
    pub fn push<F>(&mut self, value: V, cmp: &mut F) -> V
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        if self.nodes.is_empty() {
            panic!("cannot push into an empty LoserTree");
        }
        let source = self.nodes[0].source;
        let old = self.pass(source, Slot::Head(value), cmp);
        match old.slot {
            Slot::Head(value) => value,
            _ => panic!("cannot push into a LoserTree with no current winner"),
        }
    }

    /// Marks the winner's source as permanently exhausted and returns the
    /// value that was just displaced, if the winner held one.
    pub fn mark_winner_exhausted<F>(&mut self, cmp: &mut F) -> Option<V>
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        if self.nodes.is_empty() {
            return None;
        }
        let source = self.nodes[0].source;
        let old = self.pass(source, Slot::Exhausted, cmp);
        match old.slot {
            Slot::Head(value) => Some(value),
            _ => None,
        }
    }

    // Replays the tournament along the path from `source`'s leaf to the
    // root: wherever the resident loser beats the climbing candidate the
    // two trade places. Ends by seating the surviving candidate at the
    // root and returning the previous root occupant.
    fn pass<F>(&mut self, source: usize, slot: Slot<V>, cmp: &mut F) -> Node<V>
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let mut candidate = Node { slot, source };
        let mut pos = Self::parent_index(self.leaf_index(source));
        while pos != 0 {
            if Self::wins(&self.nodes[pos], &candidate, cmp) {
                mem::swap(&mut self.nodes[pos], &mut candidate);
            }
            pos = Self::parent_index(pos);
        }
        mem::swap(&mut self.nodes[0], &mut candidate);
        candidate
    }

    // Strict total order on tree entries. Equal head values are won by
    // the lower source index, which keeps extraction deterministic and
    // matches the pairwise engine's left-before-right tie rule.
    fn wins<F>(a: &Node<V>, b: &Node<V>, cmp: &mut F) -> bool
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        match (&a.slot, &b.slot) {
            (Slot::Head(x), Slot::Head(y)) => match cmp(x, y) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => a.source < b.source,
            },
            (Slot::Head(_), Slot::Exhausted) => true,
            (Slot::Exhausted, Slot::Head(_)) => false,
            (Slot::Empty, Slot::Empty) | (Slot::Exhausted, Slot::Exhausted) => {
                a.source < b.source
            }
            (Slot::Empty, _) => true,
            (_, Slot::Empty) => false,
        }
    }

    fn leaf_index(&self, source: usize) -> usize {
        self.capacity + source
    }

    fn parent_index(index: usize) -> usize {
        index / 2
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

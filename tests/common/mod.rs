#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shared view into an [`Instrumented`] source's counters, usable after
/// the source itself has been handed to a merge.
pub struct Probe {
    pulls: Rc<Cell<usize>>,
    dropped: Rc<Cell<bool>>,
}

impl Probe {
    pub fn pulls(&self) -> usize {
        self.pulls.get()
    }

    pub fn dropped(&self) -> bool {
        self.dropped.get()
    }
}

/// Iterator wrapper that counts pulls and records when it is dropped.
pub struct Instrumented<I> {
    inner: I,
    pulls: Rc<Cell<usize>>,
    dropped: Rc<Cell<bool>>,
}

pub fn instrumented<I: Iterator>(inner: I) -> (Instrumented<I>, Probe) {
    let pulls = Rc::new(Cell::new(0));
    let dropped = Rc::new(Cell::new(false));
    let probe = Probe {
        pulls: Rc::clone(&pulls),
        dropped: Rc::clone(&dropped),
    };
    (
        Instrumented {
            inner,
            pulls,
            dropped,
        },
        probe,
    )
}

impl<I: Iterator> Iterator for Instrumented<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.pulls.set(self.pulls.get() + 1);
        self.inner.next()
    }
}

impl<I> Drop for Instrumented<I> {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

/// Generates `k` independently sorted runs of random values, with runs
/// of varying length (including possibly empty ones).
pub fn sorted_random_runs(seed: u64, k: usize, max_len: usize) -> Vec<Vec<i32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..k)
        .map(|_| {
            let len = rng.gen_range(0..=max_len);
            let mut run: Vec<i32> = (0..len).map(|_| rng.gen_range(0..1000)).collect();
            run.sort_unstable();
            run
        })
        .collect()
}

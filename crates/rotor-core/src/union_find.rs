// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Union-find with rollback.
//!
//! Union by size without path compression keeps every `find` at
//! `O(log n)` and makes each union undoable by restoring one parent pointer
//! and one size. The acyclic enumerator relies on this to back out of a
//! branch in constant time per edge.

/// Marker returned by [`RollbackUnionFind::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// Disjoint sets over `0..n` whose unions can be undone in LIFO order.
#[derive(Debug, Clone)]
pub struct RollbackUnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    // (absorbed root, surviving root); `None` when the union was a no-op.
    log: Vec<Option<(usize, usize)>>,
}

impl RollbackUnionFind {
    /// `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            log: Vec::new(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Returns `true` when there are no elements.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the set containing `x`.
    ///
    /// # Panics
    /// Panics if `x >= self.len()`.
    pub fn find(&self, mut x: usize) -> usize {
        while self.parent[x] != x {
            x = self.parent[x];
        }
        x
    }

    /// Returns `true` if `a` and `b` are in the same set.
    pub fn connected(&self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Merges the sets of `a` and `b`. Returns `false` if they were already
    /// merged; the call is logged either way so rollback stays aligned.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            self.log.push(None);
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        self.log.push(Some((rb, ra)));
        true
    }

    /// Current position in the union log.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.log.len())
    }

    /// Undoes every union made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.log.len() > checkpoint.0 {
            if let Some(Some((child, root))) = self.log.pop() {
                self.parent[child] = child;
                self.size[root] -= self.size[child];
            }
        }
    }
}

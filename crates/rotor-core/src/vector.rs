// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Integer vectors indexed by node.
use std::collections::btree_map::{self, BTreeMap};

use crate::error::{RotorError, RotorResult};
use crate::ident::NodeKey;

/// Sparse integer vector indexed by `N`; missing keys read as `0`.
///
/// Arithmetic and comparisons are explicit methods. Comparisons are the
/// componentwise orders: `a.all_lt(&b)` holds when `a[n] < b[n]` for every
/// `n` in the union of both domains, so two vectors can be incomparable.
/// Equality (`==`) uses the same rule, which makes an explicit `0` entry equal
/// to an absent one.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(
    feature = "serde",
    serde(bound(deserialize = "N: serde::Deserialize<'de> + Ord"))
)]
pub struct Vector<N> {
    values: BTreeMap<N, i64>,
}

impl<N: NodeKey> Vector<N> {
    /// Creates an empty vector.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Value at `node` (0 when absent).
    pub fn get(&self, node: &N) -> i64 {
        self.values.get(node).copied().unwrap_or(0)
    }

    /// Sets the value at `node`, keeping the key even when `value` is 0.
    pub fn set(&mut self, node: N, value: i64) {
        self.values.insert(node, value);
    }

    /// Adds `delta` to the value at `node`.
    pub fn add_at(&mut self, node: &N, delta: i64) {
        match self.values.get_mut(node) {
            Some(value) => *value += delta,
            None => {
                self.values.insert(node.clone(), delta);
            }
        }
    }

    /// Removes the entry for `node`, returning its old value.
    pub fn remove(&mut self, node: &N) -> Option<i64> {
        self.values.remove(node)
    }

    /// Stored entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, N, i64> {
        self.values.iter()
    }

    /// Stored keys in ascending order.
    pub fn keys(&self) -> btree_map::Keys<'_, N, i64> {
        self.values.keys()
    }

    /// Number of stored entries (explicit zeros included).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values.
    pub fn total(&self) -> i64 {
        self.values.values().sum()
    }

    /// Underlying map.
    pub fn as_map(&self) -> &BTreeMap<N, i64> {
        &self.values
    }

    /// Elementwise sum over the union of both domains.
    pub fn plus(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise difference over the union of both domains.
    pub fn minus(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    /// Adds `k` to every stored entry.
    pub fn add_scalar(&self, k: i64) -> Self {
        self.map_values(|v| v + k)
    }

    /// Subtracts `k` from every stored entry.
    pub fn sub_scalar(&self, k: i64) -> Self {
        self.map_values(|v| v - k)
    }

    /// Multiplies every stored entry by `k`.
    pub fn scale(&self, k: i64) -> Self {
        self.map_values(|v| v * k)
    }

    /// Floor division of every stored entry by `k` (rounds towards negative
    /// infinity, so `-3 / 2 == -2`).
    pub fn floor_div(&self, k: i64) -> RotorResult<Self, N> {
        if k == 0 {
            return Err(RotorError::DivisionByZero);
        }
        Ok(self.map_values(|v| {
            let q = v / k;
            if v % k != 0 && (v < 0) != (k < 0) {
                q - 1
            } else {
                q
            }
        }))
    }

    /// `self[n] < other[n]` for every key of either vector.
    pub fn all_lt(&self, other: &Self) -> bool {
        self.all_pairs(other, |a, b| a < b)
    }

    /// `self[n] <= other[n]` for every key of either vector.
    pub fn all_le(&self, other: &Self) -> bool {
        self.all_pairs(other, |a, b| a <= b)
    }

    /// `self[n] > other[n]` for every key of either vector.
    pub fn all_gt(&self, other: &Self) -> bool {
        self.all_pairs(other, |a, b| a > b)
    }

    /// `self[n] >= other[n]` for every key of either vector.
    pub fn all_ge(&self, other: &Self) -> bool {
        self.all_pairs(other, |a, b| a >= b)
    }

    /// `self[n] == other[n]` for every key of either vector.
    pub fn all_eq(&self, other: &Self) -> bool {
        self.all_pairs(other, |a, b| a == b)
    }

    /// Every stored entry is `< k`.
    pub fn all_lt_scalar(&self, k: i64) -> bool {
        self.values.values().all(|&v| v < k)
    }

    /// Every stored entry is `<= k`.
    pub fn all_le_scalar(&self, k: i64) -> bool {
        self.values.values().all(|&v| v <= k)
    }

    /// Every stored entry is `> k`.
    pub fn all_gt_scalar(&self, k: i64) -> bool {
        self.values.values().all(|&v| v > k)
    }

    /// Every stored entry is `>= k`.
    pub fn all_ge_scalar(&self, k: i64) -> bool {
        self.values.values().all(|&v| v >= k)
    }

    /// Every stored entry is `== k`.
    pub fn all_eq_scalar(&self, k: i64) -> bool {
        self.values.values().all(|&v| v == k)
    }

    fn map_values(&self, f: impl Fn(i64) -> i64) -> Self {
        Self {
            values: self.values.iter().map(|(n, &v)| (n.clone(), f(v))).collect(),
        }
    }

    fn zip_with(&self, other: &Self, f: impl Fn(i64, i64) -> i64) -> Self {
        let mut values = BTreeMap::new();
        for node in self.values.keys().chain(other.values.keys()) {
            if !values.contains_key(node) {
                values.insert(node.clone(), f(self.get(node), other.get(node)));
            }
        }
        Self { values }
    }

    fn all_pairs(&self, other: &Self, pred: impl Fn(i64, i64) -> bool) -> bool {
        self.values
            .keys()
            .chain(other.values.keys())
            .all(|node| pred(self.get(node), other.get(node)))
    }
}

impl<N: NodeKey> Default for Vector<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeKey> PartialEq for Vector<N> {
    fn eq(&self, other: &Self) -> bool {
        self.all_eq(other)
    }
}

impl<N: NodeKey> Eq for Vector<N> {}

impl<N: NodeKey> FromIterator<(N, i64)> for Vector<N> {
    fn from_iter<I: IntoIterator<Item = (N, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<N: NodeKey> From<BTreeMap<N, i64>> for Vector<N> {
    fn from(values: BTreeMap<N, i64>) -> Self {
        Self { values }
    }
}

impl<'a, N: NodeKey> IntoIterator for &'a Vector<N> {
    type Item = (&'a N, &'a i64);
    type IntoIter = btree_map::Iter<'a, N, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

//! The permutation primitive.
//!
//! A [`Perm`] is an immutable sequence of the ranks `0..n-1` in some order.
//! It supports standardization of arbitrary distinct values, occurrence
//! search (classical pattern containment), point insertion, the eight
//! geometric transforms, and the graded Lehmer-code ranking used by the
//! binary codec.
//!
//! # Invariants
//! - A `Perm` of length `n` contains every rank in `0..n` exactly once;
//!   public constructors validate this.
//! - All operations return new values; nothing mutates in place.

use crate::symmetry::Symmetry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error raised when a value sequence is not a permutation of `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermError {
    /// The sequence misses or repeats a rank.
    NotAPermutation(Vec<usize>),
    /// A rank has no permutation of representable length.
    RankOutOfRange(u64),
}

impl fmt::Display for PermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermError::NotAPermutation(values) => {
                write!(f, "{:?} is not a permutation of 0..{}", values, values.len())
            }
            PermError::RankOutOfRange(rank) => {
                write!(f, "rank {} does not index a permutation", rank)
            }
        }
    }
}

impl std::error::Error for PermError {}

/// An immutable permutation of `0..n`.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Perm(Vec<usize>);

impl Perm {
    /// Creates a permutation, validating that `values` is a permutation of
    /// `0..values.len()`.
    pub fn new(values: Vec<usize>) -> Result<Self, PermError> {
        let n = values.len();
        let mut seen = vec![false; n];
        for i in 0..n {
            let v = values[i];
            if v >= n || seen[v] {
                return Err(PermError::NotAPermutation(values));
            }
            seen[v] = true;
        }
        Ok(Perm(values))
    }

    /// The empty permutation.
    #[inline]
    pub fn empty() -> Self {
        Perm(Vec::new())
    }

    /// The length-1 permutation.
    #[inline]
    pub fn point() -> Self {
        Perm(vec![0])
    }

    /// Standardizes arbitrary values to their ranks.
    ///
    /// Equal values are ranked left to right, matching the usual
    /// standardization of words.
    pub fn to_standard<I>(values: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let values: Vec<usize> = values.into_iter().collect();
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by_key(|&i| (values[i], i));
        let mut ranks = vec![0; values.len()];
        for (rank, &i) in order.iter().enumerate() {
            ranks[i] = rank;
        }
        Perm(ranks)
    }

    /// Internal constructor for sequences already known to be permutations.
    #[inline]
    pub(crate) fn from_ranks(ranks: Vec<usize>) -> Self {
        debug_assert!({
            let mut sorted = ranks.clone();
            sorted.sort_unstable();
            sorted.iter().copied().eq(0..ranks.len())
        });
        Perm(ranks)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying ranks in index order.
    #[inline]
    pub fn values(&self) -> &[usize] {
        &self.0
    }

    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, usize>> {
        self.0.iter().copied()
    }

    /// Inserts `value` at `index`, shifting every rank `>= value` up by one.
    ///
    /// Both arguments name a slot in the grown permutation and must not
    /// exceed `len`. The bounds are debug-checked, not validated: an
    /// out-of-range call is a caller bug and its result is unspecified.
    /// Growth steps inside the crate always derive both arguments from a
    /// bounding box, which keeps them in range.
    pub fn insert(&self, index: usize, value: usize) -> Perm {
        debug_assert!(index <= self.len() && value <= self.len());
        let mut out = Vec::with_capacity(self.len() + 1);
        out.extend(self.iter().map(|v| if v >= value { v + 1 } else { v }));
        out.insert(index, value);
        Perm(out)
    }

    /// Returns the occurrences of `self` as a classical pattern in `other`.
    ///
    /// Each occurrence is the increasing sequence of indices into `other`
    /// realizing the pattern. The sequence is lazy, finite and
    /// non-restartable; the empty pattern occurs exactly once.
    pub fn occurrences_in<'a>(&'a self, other: &'a Perm) -> Occurrences<'a> {
        Occurrences::new(self, other)
    }

    /// Whether `patt` occurs in `self`.
    pub fn contains(&self, patt: &Perm) -> bool {
        patt.occurrences_in(self).next().is_some()
    }

    /// Applies a symmetry to the plot of the permutation.
    pub fn transform(&self, sym: Symmetry) -> Perm {
        let n = self.len();
        let mut points: Vec<(usize, usize)> = self
            .iter()
            .enumerate()
            .map(|(a, b)| sym.map_point(n, a, b))
            .collect();
        points.sort_unstable();
        Perm::from_ranks(points.into_iter().map(|(_, b)| b).collect())
    }

    #[inline]
    pub fn reverse(&self) -> Perm {
        self.transform(Symmetry::Reverse)
    }

    #[inline]
    pub fn complement(&self) -> Perm {
        self.transform(Symmetry::Complement)
    }

    #[inline]
    pub fn inverse(&self) -> Perm {
        self.transform(Symmetry::Inverse)
    }

    #[inline]
    pub fn antidiagonal(&self) -> Perm {
        self.transform(Symmetry::Antidiagonal)
    }

    #[inline]
    pub fn rotate90(&self) -> Perm {
        self.transform(Symmetry::Rotate90)
    }

    #[inline]
    pub fn rotate180(&self) -> Perm {
        self.transform(Symmetry::Rotate180)
    }

    #[inline]
    pub fn rotate270(&self) -> Perm {
        self.transform(Symmetry::Rotate270)
    }

    /// The graded rank of this permutation.
    ///
    /// Permutations are ordered by length, then by Lehmer code within a
    /// length; the empty permutation has rank 0 and the length-1
    /// permutation rank 1. Ranks past `u64::MAX` saturate, so the result
    /// for permutations longer than 20 points is an upper bound only;
    /// every saturated rank exceeds any width the codec accepts.
    pub fn rank(&self) -> u64 {
        let n = self.len();
        let mut rank = perms_shorter_than(n);
        for i in 0..n {
            let smaller_right = self.0[i + 1..].iter().filter(|&&v| v < self.0[i]).count();
            rank = rank.saturating_add((smaller_right as u64).saturating_mul(factorial(n - 1 - i)));
        }
        rank
    }

    /// Inverts [`rank`](Self::rank).
    pub fn unrank(rank: u64) -> Result<Perm, PermError> {
        let mut n = 0;
        loop {
            if n > MAX_UNRANK_LEN {
                return Err(PermError::RankOutOfRange(rank));
            }
            if rank < perms_shorter_than(n + 1) {
                break;
            }
            n += 1;
        }
        let mut rem = rank - perms_shorter_than(n);
        let mut available: Vec<usize> = (0..n).collect();
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            let f = factorial(n - 1 - i);
            let digit = (rem / f) as usize;
            rem %= f;
            values.push(available.remove(digit));
        }
        Ok(Perm(values))
    }
}

/// Longest permutation `unrank` will reconstruct; 20! is the last factorial
/// representable in a `u64`.
const MAX_UNRANK_LEN: usize = 20;

/// `n!`, saturating at `u64::MAX` past 20!.
fn factorial(n: usize) -> u64 {
    (1..=n as u64)
        .try_fold(1u64, |acc, k| acc.checked_mul(k))
        .unwrap_or(u64::MAX)
}

/// Number of permutations of length strictly less than `n`, saturating.
fn perms_shorter_than(n: usize) -> u64 {
    (0..n).map(factorial).fold(0, u64::saturating_add)
}

impl std::ops::Index<usize> for Perm {
    type Output = usize;

    #[inline]
    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}

impl TryFrom<Vec<usize>> for Perm {
    type Error = PermError;

    fn try_from(values: Vec<usize>) -> Result<Self, PermError> {
        Perm::new(values)
    }
}

impl From<Perm> for Vec<usize> {
    fn from(perm: Perm) -> Vec<usize> {
        perm.0
    }
}

impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "ε");
        }
        for v in self.iter() {
            if self.len() > 10 {
                write!(f, "({})", v)?;
            } else {
                write!(f, "{}", v)?;
            }
        }
        Ok(())
    }
}

/// Lazy backtracking search for the occurrences of one pattern in another.
///
/// Indices are chosen left to right; a candidate extends a partial
/// occurrence only if its relative order against every chosen point matches
/// the pattern. Branches without room for the remaining points are cut.
pub struct Occurrences<'a> {
    patt: &'a Perm,
    host: &'a Perm,
    chosen: Vec<usize>,
    next: usize,
    done: bool,
}

impl<'a> Occurrences<'a> {
    fn new(patt: &'a Perm, host: &'a Perm) -> Self {
        Occurrences {
            patt,
            host,
            chosen: Vec::with_capacity(patt.len()),
            next: 0,
            done: false,
        }
    }

    fn compatible(&self, candidate: usize) -> bool {
        let d = self.chosen.len();
        self.chosen.iter().enumerate().all(|(j, &idx)| {
            (self.patt[j] < self.patt[d]) == (self.host[idx] < self.host[candidate])
        })
    }
}

impl<'a> Iterator for Occurrences<'a> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let k = self.patt.len();
        if k == 0 {
            self.done = true;
            return Some(Vec::new());
        }
        loop {
            let remaining = k - self.chosen.len();
            if self.next + remaining > self.host.len() {
                // No room left at this depth; backtrack.
                match self.chosen.pop() {
                    Some(idx) => self.next = idx + 1,
                    None => {
                        self.done = true;
                        return None;
                    }
                }
                continue;
            }
            if self.compatible(self.next) {
                self.chosen.push(self.next);
                if self.chosen.len() == k {
                    let occurrence = self.chosen.clone();
                    self.chosen.pop();
                    self.next = occurrence[k - 1] + 1;
                    return Some(occurrence);
                }
                self.next += 1;
            } else {
                self.next += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(values: &[usize]) -> Perm {
        Perm::new(values.to_vec()).unwrap()
    }

    #[test]
    fn new_rejects_non_permutations() {
        assert!(Perm::new(vec![0, 0]).is_err());
        assert!(Perm::new(vec![1, 2]).is_err());
        assert!(Perm::new(vec![0, 2, 1]).is_ok());
    }

    #[test]
    fn to_standard_ranks_values() {
        assert_eq!(Perm::to_standard([40, 10, 30]), perm(&[2, 0, 1]));
        assert_eq!(Perm::to_standard([]), Perm::empty());
        assert_eq!(Perm::to_standard([7, 7, 1]), perm(&[1, 2, 0]));
    }

    #[test]
    fn insert_shifts_values() {
        // 0 2 1 with 2 inserted at index 1: 0 (2) 3 1
        assert_eq!(perm(&[0, 2, 1]).insert(1, 2), perm(&[0, 2, 3, 1]));
        assert_eq!(Perm::empty().insert(0, 0), Perm::point());
        // Both arguments at their upper bound: appended as the new maximum.
        assert_eq!(perm(&[1, 0]).insert(2, 2), perm(&[1, 0, 2]));
    }

    #[test]
    fn occurrences_of_21_in_321() {
        let patt = perm(&[1, 0]);
        let host = perm(&[2, 1, 0]);
        let occs: Vec<_> = patt.occurrences_in(&host).collect();
        assert_eq!(occs, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn empty_pattern_occurs_once() {
        let host = perm(&[1, 0]);
        let occs: Vec<_> = Perm::empty().occurrences_in(&host).collect();
        assert_eq!(occs, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn containment_examples() {
        assert!(perm(&[2, 0, 3, 1]).contains(&perm(&[1, 0])));
        assert!(!perm(&[0, 1, 2]).contains(&perm(&[1, 0])));
    }

    #[test]
    fn transform_matches_classical_definitions() {
        let p = perm(&[1, 3, 0, 2]);
        assert_eq!(p.reverse(), perm(&[2, 0, 3, 1]));
        assert_eq!(p.complement(), perm(&[2, 0, 3, 1]));
        assert_eq!(p.inverse(), perm(&[2, 0, 3, 1]));
        assert_eq!(p.rotate180(), perm(&[1, 3, 0, 2]));
        assert_eq!(p.rotate90().rotate270(), p);
        assert_eq!(p.inverse().inverse(), p);
    }

    #[test]
    fn rank_is_graded() {
        assert_eq!(Perm::empty().rank(), 0);
        assert_eq!(Perm::point().rank(), 1);
        assert_eq!(perm(&[0, 1]).rank(), 2);
        assert_eq!(perm(&[1, 0]).rank(), 3);
        assert_eq!(perm(&[0, 1, 2]).rank(), 4);
    }

    #[test]
    fn unrank_inverts_rank_for_short_lengths() {
        // Every rank of every length up to 7, the codec's tableless range.
        for rank in 0..5914 {
            let p = Perm::unrank(rank).unwrap();
            assert_eq!(p.rank(), rank);
        }
    }

    #[test]
    fn rank_saturates_instead_of_overflowing() {
        // 21! does not fit in a u64; the decreasing permutation of every
        // longer length has the largest rank of its length.
        for n in [21, 22, 40] {
            let p = Perm::new((0..n).rev().collect()).unwrap();
            assert_eq!(p.rank(), u64::MAX);
        }
        assert!(Perm::unrank(u64::MAX).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let p = perm(&[2, 0, 1]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[2,0,1]");
        assert_eq!(serde_json::from_str::<Perm>(&json).unwrap(), p);
        assert!(serde_json::from_str::<Perm>("[0,0]").is_err());
    }
}

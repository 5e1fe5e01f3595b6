//! Ordered two-stream merge chunking.
//!
//! [`MergeChunks`] consumes two ascending streams and yields paired batches
//! of bounded combined size, preserving order. A run of mutually-equal
//! elements is never split across a chunk boundary: when reconciling two
//! record streams, a run may contain one element from each side
//! representing the same identity, and both must land in the same chunk for
//! per-chunk reconciliation to be correct.
//!
//! The chunker is pure stream state: a single tagged merge cursor over both
//! inputs plus a one-element look-ahead buffer used to detect and absorb
//! run continuations at the boundary. Correctness depends entirely on both
//! inputs being pre-sorted by the same order relation.

use std::iter::Peekable;

use crate::error::{CoreError, CoreResult};

/// Which input stream a merged element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// An iterator yielding `(left_chunk, right_chunk)` pairs of combined size
/// at most the chunk hint, except where a run of equal elements extends a
/// chunk past it.
///
/// Ties between the streams prefer the left side, so both members of a tie
/// are always adjacent in the merge.
pub struct MergeChunks<L, R>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    L::Item: Ord,
{
    left: Peekable<L>,
    right: Peekable<R>,
    /// A merged element pulled while probing for a run continuation that
    /// turned out to start the next chunk.
    pushback: Option<(L::Item, Side)>,
    hint: usize,
}

impl<L, R> MergeChunks<L, R>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    L::Item: Ord,
{
    /// Creates a chunker over two ascending streams.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidChunkHint`] if `hint` is zero.
    pub fn new(left: L, right: R, hint: usize) -> CoreResult<Self> {
        if hint == 0 {
            return Err(CoreError::invalid_chunk_hint(hint));
        }
        Ok(Self {
            left: left.peekable(),
            right: right.peekable(),
            pushback: None,
            hint,
        })
    }

    /// Pulls the next element of the ascending tagged merge.
    fn next_merged(&mut self) -> Option<(L::Item, Side)> {
        if let Some(tagged) = self.pushback.take() {
            return Some(tagged);
        }
        let take_left = match (self.left.peek(), self.right.peek()) {
            (Some(l), Some(r)) => l <= r,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };
        if take_left {
            self.left.next().map(|value| (value, Side::Left))
        } else {
            self.right.next().map(|value| (value, Side::Right))
        }
    }
}

impl<L, R> Iterator for MergeChunks<L, R>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    L::Item: Ord,
{
    type Item = (Vec<L::Item>, Vec<L::Item>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut left_chunk = Vec::new();
        let mut right_chunk = Vec::new();
        let mut last_side = Side::Left;

        for _ in 0..self.hint {
            match self.next_merged() {
                Some((value, side)) => {
                    match side {
                        Side::Left => left_chunk.push(value),
                        Side::Right => right_chunk.push(value),
                    }
                    last_side = side;
                }
                None => break,
            }
        }

        if left_chunk.is_empty() && right_chunk.is_empty() {
            return None;
        }

        // Absorb the run of elements equal to the last one pulled; runs may
        // be arbitrarily longer than the hint.
        while let Some((value, side)) = self.next_merged() {
            let continues_run = {
                let last = match last_side {
                    Side::Left => left_chunk.last(),
                    Side::Right => right_chunk.last(),
                };
                last == Some(&value)
            };
            if continues_run {
                match side {
                    Side::Left => left_chunk.push(value),
                    Side::Right => right_chunk.push(value),
                }
                last_side = side;
            } else {
                self.pushback = Some((value, side));
                break;
            }
        }

        Some((left_chunk, right_chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunks(
        left: Vec<i64>,
        right: Vec<i64>,
        hint: usize,
    ) -> Vec<(Vec<i64>, Vec<i64>)> {
        MergeChunks::new(left.into_iter(), right.into_iter(), hint)
            .unwrap()
            .collect()
    }

    #[test]
    fn zero_hint_is_rejected() {
        let result = MergeChunks::new([1i64].into_iter(), [2i64].into_iter(), 0);
        assert!(matches!(result, Err(CoreError::InvalidChunkHint { got: 0 })));
    }

    #[test]
    fn splits_disjoint_streams_by_combined_size() {
        let got = chunks(vec![10, 20, 30, 40], vec![11, 12, 50, 60], 5);
        assert_eq!(
            got,
            vec![
                (vec![10, 20, 30], vec![11, 12]),
                (vec![40], vec![50, 60]),
            ]
        );
    }

    #[test]
    fn run_extension_absorbs_a_shared_boundary_element() {
        let got = chunks(vec![10, 20, 30, 40], vec![11, 12, 30, 60], 5);
        assert_eq!(got[0], (vec![10, 20, 30], vec![11, 12, 30]));
        assert_eq!(got[1], (vec![40], vec![60]));
    }

    #[test]
    fn exact_multiple_of_hint_terminates_cleanly() {
        let got = chunks(vec![10, 20, 30, 40, 50], vec![11, 12, 13, 60, 70], 5);
        assert_eq!(
            got,
            vec![
                (vec![10, 20], vec![11, 12, 13]),
                (vec![30, 40, 50], vec![60, 70]),
            ]
        );
    }

    #[test]
    fn either_stream_may_be_empty() {
        let got = chunks(vec![1, 2, 3, 4, 5, 6], vec![], 5);
        assert_eq!(got, vec![(vec![1, 2, 3, 4, 5], vec![]), (vec![6], vec![])]);

        let got = chunks(vec![], vec![1, 2, 3, 4, 5, 6], 5);
        assert_eq!(got, vec![(vec![], vec![1, 2, 3, 4, 5]), (vec![], vec![6])]);
    }

    #[test]
    fn both_streams_empty_yield_nothing() {
        assert!(chunks(vec![], vec![], 3).is_empty());
    }

    #[test]
    fn a_run_longer_than_the_hint_is_never_split() {
        let got = chunks(vec![5, 5, 5, 5], vec![5, 5, 5], 2);
        assert_eq!(got, vec![(vec![5, 5, 5, 5], vec![5, 5, 5])]);
    }

    #[test]
    fn run_extension_pushback_starts_the_next_chunk() {
        // The probe for a continuation of the run [3, 3] pulls 4, which must
        // not be lost.
        let got = chunks(vec![1, 2, 3], vec![3, 4], 3);
        assert_eq!(got, vec![(vec![1, 2, 3], vec![3]), (vec![], vec![4])]);
    }

    proptest! {
        #[test]
        fn concatenation_preserves_both_sides_in_order(
            mut left in prop::collection::vec(0i64..64, 0..40),
            mut right in prop::collection::vec(0i64..64, 0..40),
            hint in 1usize..12,
        ) {
            left.sort_unstable();
            right.sort_unstable();

            let got = chunks(left.clone(), right.clone(), hint);
            let left_cat: Vec<i64> = got.iter().flat_map(|(l, _)| l.clone()).collect();
            let right_cat: Vec<i64> = got.iter().flat_map(|(_, r)| r.clone()).collect();

            prop_assert_eq!(left_cat, left);
            prop_assert_eq!(right_cat, right);
        }

        #[test]
        fn chunk_size_is_bounded_except_for_run_extension(
            mut left in prop::collection::vec(0i64..1000, 0..40),
            mut right in prop::collection::vec(0i64..1000, 0..40),
            hint in 1usize..12,
        ) {
            left.sort_unstable();
            right.sort_unstable();

            for (l, r) in chunks(left, right, hint) {
                let combined = l.len() + r.len();
                if combined > hint {
                    // Everything past the hint must continue the trailing run.
                    let mut merged: Vec<i64> = l.iter().chain(r.iter()).copied().collect();
                    merged.sort_unstable();
                    let boundary = merged[hint - 1];
                    prop_assert!(merged[hint..].iter().all(|v| *v == boundary));
                }
            }
        }

        #[test]
        fn shared_elements_are_co_chunked(
            mut left in prop::collection::vec(0i64..32, 0..30),
            mut right in prop::collection::vec(0i64..32, 0..30),
            hint in 1usize..8,
        ) {
            left.sort_unstable();
            left.dedup();
            right.sort_unstable();
            right.dedup();

            let got = chunks(left.clone(), right.clone(), hint);
            for shared in left.iter().filter(|v| right.contains(v)) {
                let holding: Vec<usize> = got
                    .iter()
                    .enumerate()
                    .filter(|(_, (l, r))| l.contains(shared) || r.contains(shared))
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(holding.len(), 1, "element {} split across chunks", shared);
            }
        }
    }
}

//! Fixed-capacity selection of the best-scoring items

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Scored<T> {
    score: f64,
    sequence: u64,
    item: T,
}

impl<T> Scored<T> {
    /// Higher score is better; on a tie the earlier insertion is better
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<T> PartialEq for Scored<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl<T> Eq for Scored<T> {}

impl<T> PartialOrd for Scored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scored<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other)
    }
}

/// Keeps the `capacity` highest-scoring items pushed into it.
///
/// Backed by a min-heap: once full, a new item replaces the current minimum
/// only if it scores higher.
pub struct BoundedTopK<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Scored<T>>>,
    pushed: u64,
}

impl<T> BoundedTopK<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
            pushed: 0,
        }
    }

    pub fn push(&mut self, score: f64, item: T) {
        if self.capacity == 0 {
            return;
        }

        let candidate = Scored {
            score,
            sequence: self.pushed,
            item,
        };
        self.pushed += 1;

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate > worst.0 {
                *worst = Reverse(candidate);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Lowest retained score, if any
    pub fn min_score(&self) -> Option<f64> {
        self.heap.peek().map(|worst| worst.0.score)
    }

    /// Retained items with their scores, best first
    pub fn into_sorted_vec(self) -> Vec<(f64, T)> {
        // Ascending over Reverse is descending over the scores
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(scored)| (scored.score, scored.item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_keeps_highest_scores() {
        let mut top = BoundedTopK::new(3);
        for (score, name) in [(0.2, "a"), (0.9, "b"), (0.5, "c"), (0.1, "d"), (0.7, "e")] {
            top.push(score, name);
        }

        assert_eq!(top.len(), 3);
        assert_eq!(top.min_score(), Some(0.5));
        let names: Vec<&str> = top.into_sorted_vec().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["b", "e", "c"]);
    }

    #[test]
    fn test_ties_prefer_earlier_items() {
        let mut top = BoundedTopK::new(2);
        top.push(1.0, "first");
        top.push(1.0, "second");
        top.push(1.0, "third");

        let names: Vec<&str> = top.into_sorted_vec().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut top = BoundedTopK::new(0);
        top.push(1.0, ());
        assert!(top.is_empty());
    }

    proptest! {
        #[test]
        fn retains_the_k_largest(
            scores in prop::collection::vec(-1000i32..1000, 0..60),
            k in 1usize..8,
        ) {
            let mut top = BoundedTopK::new(k);
            for (index, score) in scores.iter().enumerate() {
                top.push(f64::from(*score), index);
            }

            let mut expected: Vec<i32> = scores.clone();
            expected.sort_unstable_by(|a, b| b.cmp(a));
            expected.truncate(k);

            let kept: Vec<i32> = top.into_sorted_vec().into_iter().map(|(s, _)| s as i32).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}

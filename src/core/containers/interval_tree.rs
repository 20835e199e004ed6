use num_traits::{One, Zero};
use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Div},
};

/// A half-open interval `[start, end)` carrying a value. Queries against the
/// tree use the same half-open convention: two intervals overlap iff
/// `a.start < b.end && a.end > b.start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval<Scalar, Value> {
    pub start: Scalar,
    pub end: Scalar,
    pub value: Value,
}

impl<Scalar, Value> Interval<Scalar, Value>
where
    Scalar: PartialOrd + Copy,
{
    pub fn new(s: Scalar, e: Scalar, v: Value) -> Self {
        let (start, end) = if s <= e { (s, e) } else { (e, s) };
        Self {
            start,
            end,
            value: v,
        }
    }

    pub fn overlaps(&self, start: Scalar, end: Scalar) -> bool {
        self.start < end && self.end > start
    }
}

impl<Scalar, Value> fmt::Display for Interval<Scalar, Value>
where
    Scalar: fmt::Display,
    Value: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interval[{}, {}): {}", self.start, self.end, self.value)
    }
}

/// Centered interval tree built once from a vector of intervals; query-only
/// afterwards. Logical deletion is the owner's concern (see the range index
/// tombstones), not this container's.
#[derive(Default)]
pub struct IntervalTree<Scalar, Value> {
    intervals: Vec<Interval<Scalar, Value>>,
    left: Option<Box<IntervalTree<Scalar, Value>>>,
    right: Option<Box<IntervalTree<Scalar, Value>>>,
    center: Scalar,
}

impl<Scalar, Value> IntervalTree<Scalar, Value>
where
    Scalar: PartialOrd + Copy + Add<Output = Scalar> + Div<Output = Scalar> + Zero + One,
{
    fn empty() -> Self {
        Self {
            intervals: Vec::new(),
            left: None,
            right: None,
            center: Scalar::zero(),
        }
    }

    pub fn new(mut intervals: Vec<Interval<Scalar, Value>>) -> Self {
        if intervals.is_empty() {
            return Self::empty();
        }
        intervals.sort_unstable_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
        Self::build_tree(intervals, 16, 64, None, None)
    }

    fn build_tree(
        intervals: Vec<Interval<Scalar, Value>>,
        depth: usize,
        minbucket: usize,
        left_extent: Option<Scalar>,
        right_extent: Option<Scalar>,
    ) -> Self {
        let left_extent = left_extent.unwrap_or(intervals[0].start);
        let right_extent = right_extent.unwrap_or_else(|| {
            intervals
                .iter()
                .map(|i| i.end)
                .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
                .unwrap_or(intervals[0].end)
        });

        let center = (left_extent + right_extent) / (Scalar::one() + Scalar::one());

        if depth == 0 || intervals.len() < minbucket {
            return Self {
                intervals,
                left: None,
                right: None,
                center,
            };
        }

        // [start, end) entirely left of the center point goes left; entirely
        // right of it goes right; straddlers stay in this node.
        let (lefts, rest): (Vec<_>, Vec<_>) = intervals.into_iter().partition(|i| i.end <= center);
        let (centers, rights): (Vec<_>, Vec<_>) = rest.into_iter().partition(|i| i.start <= center);

        let left = (!lefts.is_empty()).then(|| {
            Box::new(Self::build_tree(
                lefts,
                depth - 1,
                minbucket,
                Some(left_extent),
                Some(center),
            ))
        });
        let right = (!rights.is_empty()).then(|| {
            Box::new(Self::build_tree(
                rights,
                depth - 1,
                minbucket,
                Some(center),
                Some(right_extent),
            ))
        });

        Self {
            intervals: centers,
            left,
            right,
            center,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.as_ref().map_or(true, |l| l.is_empty())
            && self.intervals.is_empty()
            && self.right.as_ref().map_or(true, |r| r.is_empty())
    }

    pub fn visit_overlapping<F>(&self, start: Scalar, end: Scalar, f: &mut F)
    where
        F: FnMut(&Interval<Scalar, Value>),
    {
        // Node intervals are in start order, so once a start passes the query
        // end nothing later in the bucket can match.
        for interval in &self.intervals {
            if interval.start >= end {
                break;
            }
            if interval.overlaps(start, end) {
                f(interval);
            }
        }

        // Left subtree holds intervals with end <= center, which can only
        // overlap a query starting before the center (and vice versa right).
        if start < self.center {
            if let Some(ref left) = self.left {
                left.visit_overlapping(start, end, f);
            }
        }
        if end > self.center {
            if let Some(ref right) = self.right {
                right.visit_overlapping(start, end, f);
            }
        }
    }

    pub fn find_overlapping(&self, start: Scalar, end: Scalar) -> Vec<Interval<Scalar, Value>>
    where
        Value: Clone,
    {
        let mut result = Vec::new();
        self.visit_overlapping(start, end, &mut |i| result.push(i.clone()));
        result
    }

    pub fn visit_all<F>(&self, f: &mut F)
    where
        F: FnMut(&Interval<Scalar, Value>),
    {
        if let Some(ref left) = self.left {
            left.visit_all(f);
        }
        self.intervals.iter().for_each(&mut *f);
        if let Some(ref right) = self.right {
            right.visit_all(f);
        }
    }
}

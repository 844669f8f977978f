//! Vantage-point tree
//!
//! A binary metric-space index. Every node holds a vantage point and a radius
//! μ, the median distance from the vantage point to the points below it. The
//! inside subtree holds the points at distance ≤ μ, the outside subtree the
//! rest. Queries prune subtrees with the triangle inequality, so any distance
//! that is symmetric and satisfies it works.
//!
//! The tree is immutable: rebuild it to reflect a new population.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::color::LabPoint;
use crate::dhash::Fingerprint;
use crate::error::{Error, Result};

/// A metric over `T`
pub trait Distance<T> {
    fn eval(&self, a: &T, b: &T) -> f64;
}

/// Number of differing bits between two fingerprints
#[derive(Debug, Clone, Copy, Default)]
pub struct Hamming;

impl Distance<Fingerprint> for Hamming {
    #[inline(always)]
    fn eval(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        a.distance(b) as f64
    }
}

/// Straight-line distance between two LAB colors
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Distance<LabPoint> for Euclidean {
    #[inline(always)]
    fn eval(&self, a: &LabPoint, b: &LabPoint) -> f64 {
        a.distance(b)
    }
}

impl<T, F> Distance<T> for F
where
    F: Fn(&T, &T) -> f64,
{
    fn eval(&self, a: &T, b: &T) -> f64 {
        self(a, b)
    }
}

/// A query result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a, T> {
    /// Position of the point in the build order
    pub index: usize,
    pub distance: f64,
    pub point: &'a T,
}

struct Node {
    point: usize,
    radius: f64,
    inside: Option<usize>,
    outside: Option<usize>,
}

enum Link {
    Root,
    Inside(usize),
    Outside(usize),
}

/// Heap entry ordered by distance, then by build position
#[derive(Clone, Copy)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance).then(self.index.cmp(&other.index))
    }
}

pub struct VpTree<T, D> {
    points: Vec<T>,
    nodes: Vec<Node>,
    root: Option<usize>,
    distance: D,
}

impl<T, D: Distance<T>> VpTree<T, D> {
    /// Build a tree over `points`
    ///
    /// The vantage point of every subset is its first point in build order, so
    /// the same input always produces the same tree.
    pub fn build(points: Vec<T>, distance: D) -> Self {
        let mut nodes: Vec<Node> = Vec::with_capacity(points.len());
        let mut root = None;

        let mut stack = vec![(Link::Root, (0..points.len()).collect::<Vec<_>>())];
        while let Some((link, subset)) = stack.pop() {
            let Some((&vp, rest)) = subset.split_first() else {
                continue;
            };

            let dists = rest
                .iter()
                .map(|&i| distance.eval(&points[vp], &points[i]))
                .collect::<Vec<_>>();
            let radius = lower_median(&dists);

            let mut inside = Vec::with_capacity(rest.len() / 2 + 1);
            let mut outside = Vec::with_capacity(rest.len() / 2 + 1);
            for (&i, &d) in rest.iter().zip(&dists) {
                if d <= radius {
                    inside.push(i);
                } else {
                    outside.push(i);
                }
            }

            let id = nodes.len();
            nodes.push(Node { point: vp, radius, inside: None, outside: None });
            match link {
                Link::Root => root = Some(id),
                Link::Inside(parent) => nodes[parent].inside = Some(id),
                Link::Outside(parent) => nodes[parent].outside = Some(id),
            }

            stack.push((Link::Outside(id), outside));
            stack.push((Link::Inside(id), inside));
        }

        Self { points, nodes, root, distance }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The `k` points nearest to `query`, ascending by distance
    ///
    /// Points at equal distance come in build order. Fewer than `k` results are
    /// returned only when the tree holds fewer than `k` points.
    pub fn k_nearest(&self, query: &T, k: usize) -> Vec<Neighbor<'_, T>> {
        let Some(root) = self.root else {
            return vec![];
        };
        let k = k.min(self.points.len());
        if k == 0 {
            return vec![];
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        // (node, lower bound of the distance from query to anything below it)
        let mut stack = vec![(root, 0.0)];
        while let Some((id, bound)) = stack.pop() {
            if heap.len() == k && heap.peek().is_some_and(|worst| bound > worst.distance) {
                continue;
            }

            let node = &self.nodes[id];
            let d = self.distance.eval(query, &self.points[node.point]);
            let candidate = Candidate { distance: d, index: node.point };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }

            self.push_children(&mut stack, node, d);
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor { index: c.index, distance: c.distance, point: &self.points[c.index] })
            .collect()
    }

    /// Every point within `radius` of `query`, sorted by distance then build order
    pub fn range(&self, query: &T, radius: f64) -> Result<Vec<Neighbor<'_, T>>> {
        if radius.is_nan() || radius < 0.0 {
            return Err(Error::InvalidArgument(format!("radius must be non-negative, got {radius}")));
        }
        Ok(self.within(query, radius))
    }

    /// Range query for a radius already known to be valid
    pub(crate) fn within(&self, query: &T, radius: f64) -> Vec<Neighbor<'_, T>> {
        let Some(root) = self.root else {
            return vec![];
        };

        let mut found = vec![];
        let mut stack = vec![(root, 0.0)];
        while let Some((id, bound)) = stack.pop() {
            if bound > radius {
                continue;
            }

            let node = &self.nodes[id];
            let d = self.distance.eval(query, &self.points[node.point]);
            if d <= radius {
                found.push(Candidate { distance: d, index: node.point });
            }

            self.push_children(&mut stack, node, d);
        }

        found.sort_unstable();
        found
            .into_iter()
            .map(|c| Neighbor { index: c.index, distance: c.distance, point: &self.points[c.index] })
            .collect()
    }

    /// Queue both children with their triangle-inequality lower bounds, the
    /// side containing the query is popped first
    fn push_children(&self, stack: &mut Vec<(usize, f64)>, node: &Node, d: f64) {
        let inside = node.inside.map(|child| (child, (d - node.radius).max(0.0)));
        let outside = node.outside.map(|child| (child, (node.radius - d).max(0.0)));
        let (near, far) = if d <= node.radius { (inside, outside) } else { (outside, inside) };
        stack.extend(far);
        stack.extend(near);
    }
}

fn lower_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut values = values.to_vec();
    let mid = (values.len() - 1) / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}

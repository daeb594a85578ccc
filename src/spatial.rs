//! Planar nearest neighbor search.
//!
//! [SpatialIndex] is a static 2D k-d tree, built once over a reference
//! point set and queried many times. It is never updated: matching against
//! another reference set means building another index.
//!
//! Ties: when several reference points are equidistant to a query,
//! the one reached first by the tree traversal is returned. That choice
//! depends on the tree layout, callers should not rely on it.
use crate::projection::PlanarPoint;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Match between a query point and a reference point
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpatialMatch {
    /// Index of the query point
    pub query: usize,
    /// Index of the reference point, in the set the index was built from
    pub reference: usize,
    /// Euclidean distance, always positive
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Split {
    X,
    Y,
}

impl Split {
    fn next(&self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
    fn value(&self, p: &PlanarPoint) -> f64 {
        match self {
            Self::X => p.x,
            Self::Y => p.y,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    /// Index into the reference points
    point: usize,
    left: Option<usize>,
    right: Option<usize>,
    split: Split,
}

/// Static 2D k-d tree
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    nodes: Vec<Node>,
    points: Vec<PlanarPoint>,
    root: Option<usize>,
}

impl SpatialIndex {
    /// Builds the index in O(n log n).
    /// Non finite points are kept in the reference set (their index
    /// remains valid) but can never be matched.
    pub fn build(points: &[PlanarPoint]) -> Self {
        let mut indices = (0..points.len())
            .filter(|i| points[*i].is_finite())
            .collect::<Vec<_>>();
        let mut nodes = Vec::with_capacity(indices.len());
        let root = Self::build_recursive(points, &mut indices, Split::X, &mut nodes);
        Self {
            nodes,
            root,
            points: points.to_vec(),
        }
    }

    fn build_recursive(
        points: &[PlanarPoint],
        indices: &mut [usize],
        split: Split,
        nodes: &mut Vec<Node>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        let median = indices.len() / 2;
        indices.select_nth_unstable_by(median, |a, b| {
            split.value(&points[*a]).total_cmp(&split.value(&points[*b]))
        });

        let node = nodes.len();
        nodes.push(Node {
            point: indices[median],
            left: None,
            right: None,
            split,
        });

        let (left, right) = indices.split_at_mut(median);
        let left = Self::build_recursive(points, left, split.next(), nodes);
        let right = Self::build_recursive(points, &mut right[1..], split.next(), nodes);

        nodes[node].left = left;
        nodes[node].right = right;
        Some(node)
    }

    /// Number of reference points (matchable or not)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no reference point can ever be matched
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns reference point at given index
    pub fn point(&self, index: usize) -> Option<&PlanarPoint> {
        self.points.get(index)
    }

    /// Nearest reference point to query, as (reference index, distance).
    /// Returns None when the index is empty or query is not finite.
    pub fn nearest_point(&self, query: &PlanarPoint) -> Option<(usize, f64)> {
        if !query.is_finite() {
            return None;
        }
        let root = self.root?;
        let mut best = (usize::MAX, f64::INFINITY);
        self.nearest_recursive(root, query, &mut best);
        Some((best.0, best.1.sqrt()))
    }

    fn nearest_recursive(&self, node: usize, query: &PlanarPoint, best: &mut (usize, f64)) {
        let node = &self.nodes[node];
        let point = &self.points[node.point];

        let d2 = query.distance_squared(point);
        if d2 < best.1 {
            *best = (node.point, d2);
        }

        let diff = node.split.value(query) - node.split.value(point);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.nearest_recursive(near, query, best);
        }
        // other side of the splitting plane may only help if closer
        if let Some(far) = far {
            if diff * diff < best.1 {
                self.nearest_recursive(far, query, best);
            }
        }
    }

    /// Nearest reference point, for each query point.
    /// Output is aligned with queries.
    pub fn nearest(&self, queries: &[PlanarPoint]) -> Vec<Option<SpatialMatch>> {
        queries
            .iter()
            .enumerate()
            .map(|(query, point)| {
                self.nearest_point(point)
                    .map(|(reference, distance)| SpatialMatch {
                        query,
                        reference,
                        distance,
                    })
            })
            .collect()
    }

    /// Nearest reference point, for each query point, only retained when
    /// strictly closer than upper_bound. Queries without a match are omitted.
    pub fn nearest_within(&self, queries: &[PlanarPoint], upper_bound: f64) -> Vec<SpatialMatch> {
        self.nearest(queries)
            .into_iter()
            .flatten()
            .filter(|m| m.distance < upper_bound)
            .collect()
    }

    /// All reference points strictly closer than radius, for each query point.
    /// A query may match zero, one or several reference points.
    /// Output is sorted by query index, then by increasing distance.
    pub fn within_radius(&self, queries: &[PlanarPoint], radius: f64) -> Vec<SpatialMatch> {
        let mut matches = Vec::new();
        let root = match self.root {
            Some(root) => root,
            None => return matches,
        };
        if !(radius > 0.0) {
            return matches;
        }
        let radius_sq = radius * radius;
        for (query, point) in queries.iter().enumerate() {
            if !point.is_finite() {
                continue;
            }
            let mut found = Vec::new();
            self.radius_recursive(root, point, radius_sq, &mut found);
            found.sort_by(|a, b| a.1.total_cmp(&b.1));
            matches.extend(found.into_iter().map(|(reference, d2)| SpatialMatch {
                query,
                reference,
                distance: d2.sqrt(),
            }));
        }
        matches
    }

    fn radius_recursive(
        &self,
        node: usize,
        query: &PlanarPoint,
        radius_sq: f64,
        found: &mut Vec<(usize, f64)>,
    ) {
        let node = &self.nodes[node];
        let point = &self.points[node.point];

        let d2 = query.distance_squared(point);
        if d2 < radius_sq {
            found.push((node.point, d2));
        }

        let diff = node.split.value(query) - node.split.value(point);
        let reachable = diff * diff < radius_sq;

        if let Some(left) = node.left {
            if diff < 0.0 || reachable {
                self.radius_recursive(left, query, radius_sq, found);
            }
        }
        if let Some(right) = node.right {
            if diff >= 0.0 || reachable {
                self.radius_recursive(right, query, radius_sq, found);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_points(rng: &mut StdRng, n: usize, extent: f64) -> Vec<PlanarPoint> {
        (0..n)
            .map(|_| PlanarPoint::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent)))
            .collect()
    }

    fn brute_force(points: &[PlanarPoint], query: &PlanarPoint) -> f64 {
        points
            .iter()
            .filter(|p| p.is_finite())
            .map(|p| p.distance(query))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn empty_index() {
        let index = SpatialIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.nearest(&[PlanarPoint::new(0.0, 0.0)]), vec![None]);
        assert!(index.within_radius(&[PlanarPoint::new(0.0, 0.0)], 10.0).is_empty());
    }

    #[test]
    fn self_match() {
        let mut rng = StdRng::seed_from_u64(0);
        let points = random_points(&mut rng, 2000, 50_000.0);
        let index = SpatialIndex::build(&points);
        for (i, m) in index.nearest(&points).iter().enumerate() {
            let m = m.expect("self match");
            assert_eq!(m.query, i);
            assert_eq!(m.reference, i, "self match is not identity");
            assert_eq!(m.distance, 0.0);
        }
    }

    #[test]
    fn nearest_vs_brute_force() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = random_points(&mut rng, 1500, 10_000.0);
        let queries = random_points(&mut rng, 300, 12_000.0);
        let index = SpatialIndex::build(&points);
        for m in index.nearest(&queries).into_iter().flatten() {
            let expected = brute_force(&points, &queries[m.query]);
            assert!(
                (m.distance - expected).abs() < 1.0E-9,
                "query #{}: {} != {}",
                m.query,
                m.distance,
                expected
            );
            let d = points[m.reference].distance(&queries[m.query]);
            assert!((d - m.distance).abs() < 1.0E-9);
        }
    }

    #[test]
    fn non_finite_points() {
        let points = vec![
            PlanarPoint::new(f64::NAN, 0.0),
            PlanarPoint::new(10.0, 10.0),
            PlanarPoint::new(0.0, f64::INFINITY),
        ];
        let index = SpatialIndex::build(&points);
        assert_eq!(index.len(), 3);
        let m = index.nearest(&[PlanarPoint::new(0.0, 0.0), PlanarPoint::new(f64::NAN, 1.0)]);
        assert_eq!(m[0].map(|m| m.reference), Some(1));
        assert!(m[1].is_none(), "non finite query matched");
    }

    #[test]
    fn nearest_upper_bound() {
        let points = vec![PlanarPoint::new(0.0, 0.0), PlanarPoint::new(100.0, 0.0)];
        let index = SpatialIndex::build(&points);
        let queries = vec![
            PlanarPoint::new(1.0, 0.0),
            PlanarPoint::new(50.0, 30.0),
            PlanarPoint::new(104.0, 3.0),
        ];
        let matches = index.nearest_within(&queries, 5.0);
        assert_eq!(matches.len(), 1, "{:?}", matches);
        assert_eq!((matches[0].query, matches[0].reference), (0, 0));
        // distance == bound is rejected
        let matches = index.nearest_within(&queries, 1.0);
        assert!(matches.is_empty());
        let matches = index.nearest_within(&queries, 5.0 + 1.0E-9);
        assert_eq!(matches.len(), 2);
        assert_eq!((matches[1].query, matches[1].reference), (2, 1));
    }

    #[test]
    fn radius_search() {
        let mut rng = StdRng::seed_from_u64(2);
        let points = random_points(&mut rng, 1000, 5_000.0);
        let queries = random_points(&mut rng, 100, 5_000.0);
        let index = SpatialIndex::build(&points);

        let mut previous = usize::MAX;
        for radius in [2_000.0, 1_000.0, 500.0, 100.0, 10.0] {
            let matches = index.within_radius(&queries, radius);
            for m in matches.iter() {
                assert!(m.distance < radius, "{} >= {}", m.distance, radius);
                assert!(m.distance >= 0.0);
            }
            for (q, query) in queries.iter().enumerate() {
                let expected = points.iter().filter(|p| p.distance(query) < radius).count();
                let found = matches.iter().filter(|m| m.query == q).count();
                assert_eq!(found, expected, "query #{} radius {}", q, radius);
            }
            assert!(matches.len() <= previous, "shrinking radius increased match count");
            previous = matches.len();
        }
    }

    #[test]
    fn radius_is_strict() {
        let points = vec![PlanarPoint::new(0.0, 0.0), PlanarPoint::new(3.0, 4.0)];
        let index = SpatialIndex::build(&points);
        let matches = index.within_radius(&[PlanarPoint::new(0.0, 0.0)], 5.0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reference, 0);
        let matches = index.within_radius(&[PlanarPoint::new(0.0, 0.0)], 5.000001);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].reference, 1);
        assert!(index.within_radius(&[PlanarPoint::new(0.0, 0.0)], 0.0).is_empty());
    }
}

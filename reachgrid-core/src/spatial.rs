//! Nearest-node lookup over projected coordinates

use rstar::{RTree, primitives::GeomWithData};

use crate::Error;

type IndexedPoint<T> = GeomWithData<[f64; 2], T>;

/// R-tree over node positions answering nearest-node queries under
/// Euclidean distance. Rebuilt per tile, there is no update operation.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T> SpatialIndex<T>
where
    T: Copy + Ord,
{
    /// Bulk loads the index from `(id, x, y)` triples
    ///
    /// # Errors
    ///
    /// Returns `NoPointsFound` if `nodes` is empty
    pub fn build<I>(nodes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (T, f64, f64)>,
    {
        let points: Vec<IndexedPoint<T>> = nodes
            .into_iter()
            .map(|(id, x, y)| GeomWithData::new([x, y], id))
            .collect();

        if points.is_empty() {
            return Err(Error::NoPointsFound);
        }

        Ok(Self {
            tree: RTree::bulk_load(points),
        })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Identifier of the node closest to `(x, y)`
    pub fn nearest_node(&self, x: f64, y: f64) -> Option<T> {
        self.nearest_with_distance(x, y).map(|(id, _)| id)
    }

    /// Closest node and its Euclidean distance from `(x, y)`.
    ///
    /// Equidistant candidates resolve to the lowest identifier, so the
    /// result does not depend on the tree layout.
    pub fn nearest_with_distance(&self, x: f64, y: f64) -> Option<(T, f64)> {
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&[x, y]);
        let (first, best_d2) = candidates.next()?;

        let id = candidates
            .take_while(|(_, d2)| *d2 <= best_d2)
            .map(|(point, _)| point.data)
            .fold(first.data, std::cmp::min);

        Some((id, best_d2.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fails_without_nodes() {
        let result = SpatialIndex::<u32>::build(Vec::new());
        assert!(matches!(result, Err(Error::NoPointsFound)));
    }

    #[test]
    fn test_nearest_node() {
        let index =
            SpatialIndex::build(vec![(1u32, 0.0, 0.0), (2, 10.0, 0.0), (3, 0.0, 10.0)]).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.nearest_node(1.0, 1.0), Some(1));
        assert_eq!(index.nearest_node(9.0, -2.0), Some(2));
        assert_eq!(index.nearest_node(-3.0, 12.0), Some(3));
    }

    #[test]
    fn test_ties_resolve_to_lowest_id() {
        let index =
            SpatialIndex::build(vec![(7u32, 10.0, 0.0), (4, -10.0, 0.0), (9, 0.0, 10.0)]).unwrap();

        // All three nodes are exactly 10 m away from the origin
        assert_eq!(index.nearest_with_distance(0.0, 0.0), Some((4, 10.0)));
    }

    #[test]
    fn test_matches_linear_scan() {
        let nodes: Vec<(u32, f64, f64)> = (0..200u32)
            .map(|i| {
                let f = f64::from(i);
                (i, (f * 37.0) % 101.0, (f * 53.0) % 97.0)
            })
            .collect();
        let index = SpatialIndex::build(nodes.clone()).unwrap();

        for (qx, qy) in [(3.3, 4.4), (50.0, 50.0), (100.0, 0.0), (-20.0, 120.0)] {
            let expected = nodes
                .iter()
                .min_by(|a, b| {
                    let da = (a.1 - qx).powi(2) + (a.2 - qy).powi(2);
                    let db = (b.1 - qx).powi(2) + (b.2 - qy).powi(2);
                    da.total_cmp(&db).then(a.0.cmp(&b.0))
                })
                .map(|n| n.0);
            assert_eq!(index.nearest_node(qx, qy), expected);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Grid-based spatial hash for welding positions within a tolerance.
//!
//! Space is divided into cubic cells twice the tolerance wide, so any point
//! within tolerance of a query lies in the query's cell or one of its 26
//! neighbours. Lookups return the earliest inserted match, which keeps the
//! result identical to a linear first-match scan over the same points.

use ahash::AHashMap;
use nalgebra::Point3;

/// Smallest cell size, used when welding with a zero tolerance
const MIN_CELL_SIZE: f64 = 1e-9;

type CellKey = (i64, i64, i64);

#[derive(Debug, Clone)]
struct Entry<T> {
    position: Point3<f64>,
    order: usize,
    value: T,
}

/// Position -> value map that treats points within `tolerance` as equal
#[derive(Debug, Clone)]
pub struct SpatialHash<T> {
    cells: AHashMap<CellKey, Vec<Entry<T>>>,
    cell_size: f64,
    tolerance: f64,
    len: usize,
}

impl<T: Copy> SpatialHash<T> {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.max(0.0);
        Self {
            cells: AHashMap::new(),
            cell_size: (tolerance * 2.0).max(MIN_CELL_SIZE),
            tolerance,
            len: 0,
        }
    }

    #[inline]
    fn cell_coords(&self, p: &Point3<f64>) -> CellKey {
        let discretize = |v: f64| (v / self.cell_size).floor() as i64;
        (discretize(p.x), discretize(p.y), discretize(p.z))
    }

    /// Earliest inserted value whose position is within tolerance of `point`
    pub fn find(&self, point: &Point3<f64>) -> Option<T> {
        let (cx, cy, cz) = self.cell_coords(point);
        let mut best: Option<&Entry<T>> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(entries) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for entry in entries {
                        if (entry.position - point).norm() <= self.tolerance
                            && best.map_or(true, |b| entry.order < b.order)
                        {
                            best = Some(entry);
                        }
                    }
                }
            }
        }

        best.map(|entry| entry.value)
    }

    /// Insert without checking for an existing match
    pub fn insert(&mut self, point: Point3<f64>, value: T) {
        let order = self.len;
        self.len += 1;
        let key = self.cell_coords(&point);
        self.cells
            .entry(key)
            .or_default()
            .push(Entry {
                position: point,
                order,
                value,
            });
    }

    /// Existing value within tolerance, or a newly created one.
    /// Returns the value and whether it was created.
    pub fn find_or_insert_with(
        &mut self,
        point: Point3<f64>,
        create: impl FnOnce() -> T,
    ) -> (T, bool) {
        if let Some(existing) = self.find(&point) {
            return (existing, false);
        }
        let value = create();
        self.insert(point, value);
        (value, true)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    /// Linear first-match scan the hash must agree with
    fn find_naive(points: &[Point3<f64>], point: &Point3<f64>, tolerance: f64) -> Option<usize> {
        points
            .iter()
            .position(|existing| (existing - point).norm() <= tolerance)
    }

    #[test]
    fn test_spatial_hash_basic() {
        let mut hash = SpatialHash::new(1e-6);

        let p1 = Point3::new(1.0, 2.0, 3.0);
        let p2 = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        let p3 = Point3::new(2.0, 2.0, 3.0);

        assert_eq!(hash.find_or_insert_with(p1, || 0), (0, true));
        assert_eq!(hash.find_or_insert_with(p2, || 1), (0, false));
        assert_eq!(hash.find_or_insert_with(p3, || 2), (2, true));
        assert_eq!(hash.len(), 2);
    }

    #[test]
    fn test_spatial_hash_cell_boundary() {
        let mut hash = SpatialHash::new(0.1);

        // Opposite sides of a cell boundary but within tolerance
        hash.insert(Point3::new(0.199, 0.0, 0.0), 7);
        assert_eq!(hash.find(&Point3::new(0.201, 0.0, 0.0)), Some(7));
    }

    #[test]
    fn test_zero_tolerance_is_exact() {
        let mut hash = SpatialHash::new(0.0);
        hash.insert(Point3::new(0.5, 0.5, 0.5), 1);
        assert_eq!(hash.find(&Point3::new(0.5, 0.5, 0.5)), Some(1));
        assert_eq!(hash.find(&Point3::new(0.5, 0.5, 0.5 + 1e-12)), None);
    }

    #[test]
    fn test_matches_naive_scan() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let tolerance = 0.05;
        let mut points: Vec<Point3<f64>> = Vec::new();
        let mut hash = SpatialHash::new(tolerance);

        for _ in 0..500 {
            let p = Point3::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let expected = find_naive(&points, &p, tolerance);
            let actual = hash.find(&p);
            assert_eq!(actual, expected);
            if expected.is_none() {
                hash.insert(p, points.len());
                points.push(p);
            }
        }
    }
}

use std::collections::HashMap;

/// Spatial hash over point positions for marker hit-testing.
/// Stores indices into the caller's marker list, bucketed by lon/lat cell.
pub struct PointGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Cell size in degrees
    cell_size: f64,
}

impl PointGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    /// Index points in iteration order; NaN positions are left out
    pub fn build(points: impl Iterator<Item = (f64, f64)>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, (lon, lat)) in points.enumerate() {
            grid.insert(lon, lat, idx);
        }
        grid
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    pub fn insert(&mut self, lon: f64, lat: f64, idx: usize) {
        if lon.is_nan() || lat.is_nan() {
            return;
        }
        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Indices in every cell touching the square of `radius_degrees` around
    /// the point. May include points slightly outside the radius.
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let center = self.to_cell(lon, lat);
        // Never wider than the whole globe
        let world = (180.0 / self.cell_size).ceil();
        let reach = (radius_degrees / self.cell_size).ceil().clamp(0.0, world) as i32;

        let mut results = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(indices) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_nearby() {
        let points = [(-122.4, 37.7), (-118.2, 34.0), (139.7, 35.7)];
        let grid = PointGrid::build(points.into_iter(), 1.0);
        assert_eq!(grid.len(), 3);

        let hits = grid.query_radius(-122.0, 37.5, 0.5);
        assert_eq!(hits, vec![0]);

        let mut wide = grid.query_radius(-120.0, 36.0, 3.0);
        wide.sort_unstable();
        assert_eq!(wide, vec![0, 1]);
    }

    #[test]
    fn test_huge_radius_covers_the_globe() {
        let points = [(-179.5, -89.5), (179.5, 89.5)];
        let grid = PointGrid::build(points.into_iter(), 1.0);
        let mut hits = grid.query_radius(0.0, 0.0, 1e12);
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn test_nan_points_are_skipped() {
        let grid = PointGrid::build([(f64::NAN, 0.0)].into_iter(), 1.0);
        assert!(grid.is_empty());
    }
}

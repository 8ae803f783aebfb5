use crate::data::{BBox, GeoFeature};
use std::collections::HashMap;

/// Uniform grid over feature bounding boxes for hover hit-testing.
/// Each feature is inserted into every cell its bbox overlaps, so a point
/// query never misses a feature; false positives are removed by the caller.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    fn insert(&mut self, idx: usize, bbox: BBox) {
        let (min_lon, min_lat, max_lon, max_lat) = bbox;
        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return;
        }
        let min_cell = self.to_cell(min_lon, min_lat);
        let max_cell = self.to_cell(max_lon, max_lat);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                self.cells.entry((x, y)).or_default().push(idx);
            }
        }
    }

    /// Index features by position in the slice
    pub fn build(features: &[GeoFeature], cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, feature) in features.iter().enumerate() {
            grid.insert(idx, feature.bbox);
        }
        grid
    }

    /// Feature indices whose bbox cell covers the point, in insertion order
    pub fn candidates(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

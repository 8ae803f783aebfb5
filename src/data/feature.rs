use glam::DVec2;

/// A ring of (lon, lat) coordinates
pub type Ring = Vec<(f64, f64)>;

#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }
}

/// Bounding box as (min_lon, min_lat, max_lon, max_lat)
pub type BBox = (f64, f64, f64, f64);

/// A named country outline from the geometry collection
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bbox: BBox,
    pub centroid: (f64, f64),
}

impl GeoFeature {
    pub fn new(name: String, polygons: Vec<Polygon>) -> Self {
        let bbox = bounding_box(&polygons);
        let centroid = centroid(&polygons);
        Self {
            name,
            polygons,
            bbox,
            centroid,
        }
    }

    /// Iterate every ring (exteriors and holes)
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flat_map(Polygon::rings)
    }

    /// Point-in-feature test using the even-odd rule across all rings
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let (min_lon, min_lat, max_lon, max_lat) = self.bbox;
        if lon < min_lon || lon > max_lon || lat < min_lat || lat > max_lat {
            return false;
        }
        self.rings().fold(false, |inside, ring| inside ^ ring_contains(ring, lon, lat))
    }
}

/// Ray casting against a single ring
fn ring_contains(ring: &Ring, lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn bounding_box(polygons: &[Polygon]) -> BBox {
    let mut bbox = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(lon, lat) in polygons.iter().flat_map(|p| p.exterior.iter()) {
        bbox.0 = bbox.0.min(lon);
        bbox.1 = bbox.1.min(lat);
        bbox.2 = bbox.2.max(lon);
        bbox.3 = bbox.3.max(lat);
    }
    bbox
}

/// Signed area and first moment of a ring (shoelace)
fn ring_moments(ring: &Ring) -> (f64, DVec2) {
    let mut area = 0.0;
    let mut moment = DVec2::ZERO;
    for (i, &(x0, y0)) in ring.iter().enumerate() {
        let (x1, y1) = ring[(i + 1) % ring.len()];
        let cross = x0 * y1 - x1 * y0;
        area += cross;
        moment += DVec2::new(x0 + x1, y0 + y1) * cross;
    }
    (area * 0.5, moment / 6.0)
}

/// Area-weighted planar centroid. Holes subtract regardless of winding.
fn centroid(polygons: &[Polygon]) -> (f64, f64) {
    let mut total_area = 0.0;
    let mut total_moment = DVec2::ZERO;

    for polygon in polygons {
        for (idx, ring) in polygon.rings().enumerate() {
            let (area, moment) = ring_moments(ring);
            if area == 0.0 {
                continue;
            }
            // Normalize orientation: exterior positive, holes negative
            let sign = if idx == 0 { area.signum() } else { -area.signum() };
            total_area += area * sign;
            total_moment += moment * sign;
        }
    }

    if total_area.abs() > f64::EPSILON {
        let c = total_moment / total_area;
        return (c.x, c.y);
    }

    // Degenerate outline: fall back to the vertex mean
    let points: Vec<DVec2> = polygons
        .iter()
        .flat_map(|p| p.exterior.iter())
        .map(|&(x, y)| DVec2::new(x, y))
        .collect();
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().copied().sum::<DVec2>() / points.len() as f64;
    (mean.x, mean.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]
    }

    #[test]
    fn test_square_centroid() {
        let f = GeoFeature::new("Sq".into(), vec![Polygon { exterior: square(0.0, 0.0, 2.0), holes: vec![] }]);
        assert_eq!(f.centroid, (1.0, 1.0));
        assert_eq!(f.bbox, (0.0, 0.0, 2.0, 2.0));
    }

    #[test]
    fn test_centroid_is_area_weighted() {
        // A 2x2 square at the origin and a 1x1 square further east
        let f = GeoFeature::new(
            "Two".into(),
            vec![
                Polygon { exterior: square(0.0, 0.0, 2.0), holes: vec![] },
                Polygon { exterior: square(10.0, 0.0, 1.0), holes: vec![] },
            ],
        );
        // (4 * 1.0 + 1 * 10.5) / 5
        assert!((f.centroid.0 - 2.9).abs() < 1e-9);
    }

    #[test]
    fn test_hole_shifts_centroid_and_containment() {
        let mut hole = square(0.0, 0.0, 1.0);
        hole.reverse();
        let f = GeoFeature::new(
            "Ring".into(),
            vec![Polygon { exterior: square(0.0, 0.0, 2.0), holes: vec![hole] }],
        );
        assert!(f.centroid.0 > 1.0 && f.centroid.1 > 1.0);
        assert!(!f.contains(0.5, 0.5));
        assert!(f.contains(1.5, 1.5));
        assert!(!f.contains(5.0, 5.0));
    }

    #[test]
    fn test_degenerate_falls_back_to_mean() {
        let f = GeoFeature::new(
            "Line".into(),
            vec![Polygon { exterior: vec![(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)], holes: vec![] }],
        );
        assert_eq!(f.centroid, (2.0, 0.0));
    }
}

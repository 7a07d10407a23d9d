//! Per-region geometric metrics.
//!
//! Eyes and mouth are measured between designated landmark pairs; every other
//! region uses its bounding-box extents.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::{centroid, polygon_area, safe_ratio};
use crate::regions::{EyeLayout, MouthLayout, Region, RegionIndexMap, RegionPoints};
use crate::types::{BoundingBox, LandmarkSet, Pixel, Point};

/// Scalar measurements of one facial region.
///
/// `ratio` is `height / width`, defined as 0 for a zero-width region.
/// `area` is the shoelace area of the boundary in list order.
/// An unavailable region (indices outside the landmark set) has every metric
/// zeroed, no center and `unavailable == true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMetrics {
    pub center: Option<Point>,
    pub width: f32,
    pub height: f32,
    pub ratio: f32,
    pub area: f32,
    /// Mouth only: `top.y - mean(corner.y)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curvature: Option<f32>,
    pub unavailable: bool,
}

impl RegionMetrics {
    pub fn unavailable() -> Self {
        Self {
            center: None,
            width: 0.0,
            height: 0.0,
            ratio: 0.0,
            area: 0.0,
            curvature: None,
            unavailable: true,
        }
    }

    fn measured(center: Option<Point>, width: f32, height: f32) -> Self {
        Self {
            center,
            width,
            height,
            ratio: safe_ratio(height, width),
            area: 0.0,
            curvature: None,
            unavailable: false,
        }
    }
}

fn to_points(pixels: &[Pixel]) -> Vec<Point> {
    pixels.iter().map(|p| p.to_point()).collect()
}

/// Bounding-box extents of a region.
pub fn extent_metrics(pixels: &[Pixel]) -> RegionMetrics {
    let points = to_points(pixels);
    match BoundingBox::enclosing(&points) {
        Some(bbox) => RegionMetrics::measured(centroid(&points), bbox.width, bbox.height),
        None => RegionMetrics::unavailable(),
    }
}

/// Eye openness: vertical pair distance over horizontal pair distance.
pub fn eye_metrics(pixels: &[Pixel], layout: &EyeLayout) -> RegionMetrics {
    let points = to_points(pixels);
    let height = points[layout.top].distance(&points[layout.bottom]);
    let width = points[layout.outer].distance(&points[layout.inner]);
    RegionMetrics::measured(centroid(&points), width, height)
}

/// Outer mouth: corner-to-corner width, top-to-bottom height and curvature.
///
/// Curvature is `top.y - mean(corner_left.y, corner_right.y)` in image
/// coordinates. Negative values drive the smile rules, positive the frown rules.
pub fn mouth_metrics(pixels: &[Pixel], layout: &MouthLayout) -> RegionMetrics {
    let points = to_points(pixels);
    let left = points[layout.corner_left];
    let right = points[layout.corner_right];
    let top = points[layout.top];

    let width = left.distance(&right);
    let height = top.distance(&points[layout.bottom]);

    let mut metrics = RegionMetrics::measured(centroid(&points), width, height);
    metrics.curvature = Some(top.y - (left.y + right.y) / 2.0);
    metrics
}

/// Inner mouth: lip gap height over the inner outline's horizontal extent.
pub fn inner_mouth_metrics(pixels: &[Pixel], layout: &MouthLayout) -> RegionMetrics {
    let points = to_points(pixels);
    let height = points[layout.inner_top].distance(&points[layout.inner_bottom]);
    let width = BoundingBox::enclosing(&points).map_or(0.0, |b| b.width);
    RegionMetrics::measured(centroid(&points), width, height)
}

/// Metrics for one region of `landmarks`.
pub fn measure_region(map: &RegionIndexMap, region: Region, landmarks: &LandmarkSet) -> RegionMetrics {
    let pixels = match map.resolve(region, landmarks) {
        RegionPoints::Available(pixels) => pixels,
        RegionPoints::Unavailable(_) => return RegionMetrics::unavailable(),
    };
    let mut metrics = match region {
        Region::LeftEye | Region::RightEye => eye_metrics(&pixels, &map.eye),
        Region::MouthOuter => mouth_metrics(&pixels, &map.mouth),
        Region::MouthInner => inner_mouth_metrics(&pixels, &map.mouth),
        _ => extent_metrics(&pixels),
    };
    metrics.area = polygon_area(&to_points(&pixels));
    metrics
}

/// Metrics for every mapped region, keyed by region.
pub fn region_metrics(map: &RegionIndexMap, landmarks: &LandmarkSet) -> BTreeMap<Region, RegionMetrics> {
    Region::ALL
        .iter()
        .map(|&region| (region, measure_region(map, region, landmarks)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::IBUG68_REGIONS;

    fn px(coords: &[(i32, i32)]) -> Vec<Pixel> {
        coords.iter().map(|&(x, y)| Pixel::new(x, y)).collect()
    }

    #[test]
    fn eye_ratio_from_pairs() {
        // outer(0) .. inner(3) 20px apart, top(1)/bottom(5) 6px apart
        let eye = px(&[(0, 10), (6, 7), (14, 7), (20, 10), (14, 13), (6, 13)]);
        let m = eye_metrics(&eye, &IBUG68_REGIONS.eye);
        assert!((m.width - 20.0).abs() < 1e-6);
        assert!((m.height - 6.0).abs() < 1e-6);
        assert!((m.ratio - 0.3).abs() < 1e-6);
        assert!(!m.unavailable);
    }

    #[test]
    fn zero_width_eye_has_zero_ratio() {
        let eye = px(&[(5, 10), (5, 7), (5, 7), (5, 10), (5, 13), (5, 13)]);
        let m = eye_metrics(&eye, &IBUG68_REGIONS.eye);
        assert_eq!(m.width, 0.0);
        assert_eq!(m.ratio, 0.0);
        assert!(m.height > 0.0);
    }

    #[test]
    fn mouth_curvature_sign() {
        // 12-point outline: corners at 0 and 6, top at 3, bottom at 9.
        let mut outline = vec![Pixel::new(0, 0); 12];
        outline[0] = Pixel::new(0, 60);
        outline[6] = Pixel::new(40, 60);
        outline[3] = Pixel::new(20, 50);
        outline[9] = Pixel::new(20, 62);
        let m = mouth_metrics(&outline, &IBUG68_REGIONS.mouth);
        // Corners 10px below the top point
        assert_eq!(m.curvature, Some(-10.0));
        assert!((m.width - 40.0).abs() < 1e-6);
        assert!((m.height - 12.0).abs() < 1e-6);
        assert!((m.ratio - 0.3).abs() < 1e-6);
    }

    #[test]
    fn extents_for_generic_region() {
        let m = extent_metrics(&px(&[(0, 0), (10, 0), (10, 4), (0, 4)]));
        assert_eq!(m.width, 10.0);
        assert_eq!(m.height, 4.0);
        assert!((m.ratio - 0.4).abs() < 1e-6);
        assert_eq!(m.center, Some(Point::new(5.0, 2.0)));
        assert_eq!(m.curvature, None);
    }

    #[test]
    fn region_area_follows_boundary() {
        let mut coords = vec![[0, 0]; 68];
        // Nose as a 10x4 rectangle traced in order
        for (k, c) in [[0, 0], [10, 0], [10, 4], [0, 4]].into_iter().enumerate() {
            coords[27 + k] = c;
        }
        for c in coords.iter_mut().take(36).skip(31) {
            *c = [0, 4];
        }
        let set = LandmarkSet::from_coords(&coords);
        let m = measure_region(&IBUG68_REGIONS, Region::Nose, &set);
        assert!((m.area - 40.0).abs() < 1e-6);
        assert_eq!(measure_region(&IBUG68_REGIONS, Region::LeftEye, &set).area, 0.0);
    }

    #[test]
    fn short_landmark_set_marks_regions_unavailable() {
        let set = LandmarkSet::from_coords(&vec![[1, 1]; 30]);
        let all = region_metrics(&IBUG68_REGIONS, &set);
        assert_eq!(all.len(), 8);
        assert!(!all[&Region::FaceOutline].unavailable);
        assert!(all[&Region::LeftEye].unavailable);
        assert_eq!(all[&Region::MouthOuter], RegionMetrics::unavailable());
    }
}

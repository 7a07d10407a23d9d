//! Plane geometry over landmark points.

use crate::types::{Pixel, Point};

/// Calculate the area of a polygon using the shoelace formula.
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = points.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    (area / 2.0).abs()
}

/// Arithmetic mean of the points. `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let mut sum = Point::zero();
    for p in points {
        sum += *p;
    }
    Some(sum * (1.0 / points.len() as f32))
}

/// Mean y coordinate. `None` for an empty slice.
pub fn mean_y(points: &[Point]) -> Option<f32> {
    centroid(points).map(|c| c.y)
}

/// Height divided by width, or 0 when the width is zero.
pub fn safe_ratio(height: f32, width: f32) -> f32 {
    if width != 0.0 {
        height / width
    } else {
        0.0
    }
}

fn cross(o: Pixel, a: Pixel, b: Pixel) -> i64 {
    let (ox, oy) = (o.x as i64, o.y as i64);
    (a.x as i64 - ox) * (b.y as i64 - oy) - (a.y as i64 - oy) * (b.x as i64 - ox)
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns the hull vertices in counter-clockwise order (in a y-up frame),
/// without repeating the first vertex and without collinear boundary points.
/// Degenerate input gives a short result: all-collinear points yield the two
/// extreme endpoints, identical points yield one vertex, empty input none.
pub fn convex_hull(points: &[Pixel]) -> Vec<Pixel> {
    let mut pts: Vec<Pixel> = points.to_vec();
    pts.sort_by_key(|p| (p.x, p.y));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Pixel> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Pixel> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Last point of each chain is the first of the other.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

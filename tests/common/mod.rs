//! Synthetic faces with exactly controlled measurements.

#![allow(dead_code)]

use face_state::{ImageDimensions, LandmarkModel, LandmarkSet, Region, RegionIndexMap};

pub const DIMS: ImageDimensions = ImageDimensions::new(400, 400);

const EYE_WIDTH: i32 = 40;
const MOUTH_WIDTH: i32 = 40;

/// Measurements of a synthetic face. Eye and mouth widths are 40px, so the
/// openness ratio is `eye_height / 40` and the aspect ratio `mouth_height / 40`.
#[derive(Debug, Clone, Copy)]
pub struct FaceShape {
    /// Even, so the eye points average to the eye's center line.
    pub eye_height: i32,
    pub mouth_height: i32,
    /// Corners this many pixels below the top lip point; curvature is its negation.
    pub corner_drop: i32,
    pub brow_gap: i32,
}

impl FaceShape {
    pub fn neutral() -> Self {
        Self {
            eye_height: 10,
            mouth_height: 4,
            corner_drop: 0,
            brow_gap: 25,
        }
    }
}

fn place_eye(points: &mut [[i32; 2]], map: &RegionIndexMap, region: Region, x0: i32, cy: i32, h: i32) {
    let indices = map.indices(region);
    let n = indices.len() as i32;
    for (k, &i) in indices.iter().enumerate() {
        points[i] = [x0 + k as i32 * EYE_WIDTH / n, cy];
    }
    points[indices[map.eye.outer]] = [x0, cy];
    points[indices[map.eye.inner]] = [x0 + EYE_WIDTH, cy];
    points[indices[map.eye.top]] = [x0 + EYE_WIDTH / 2, cy - h / 2];
    points[indices[map.eye.bottom]] = [x0 + EYE_WIDTH / 2, cy + h / 2];
}

fn place_brow(points: &mut [[i32; 2]], map: &RegionIndexMap, region: Region, x0: i32, y: i32) {
    let indices = map.indices(region);
    for (k, &i) in indices.iter().enumerate() {
        points[i] = [x0 + k as i32 * 4, y];
    }
}

/// A landmark set for `model` with the given measurements.
pub fn face(model: LandmarkModel, shape: FaceShape) -> LandmarkSet {
    let map = model.region_map();
    let mut points = vec![[200, 200]; model.point_count()];

    let oval = map.indices(Region::FaceOutline);
    for (k, &i) in oval.iter().enumerate() {
        let angle = std::f32::consts::TAU * k as f32 / oval.len() as f32;
        points[i] = [
            200 + (120.0 * angle.sin()).round() as i32,
            200 - (160.0 * angle.cos()).round() as i32,
        ];
    }

    let eye_y = 150;
    place_eye(&mut points, map, Region::LeftEye, 220, eye_y, shape.eye_height);
    place_eye(&mut points, map, Region::RightEye, 140, eye_y, shape.eye_height);
    place_brow(&mut points, map, Region::EyebrowLeft, 220, eye_y - shape.brow_gap);
    place_brow(&mut points, map, Region::EyebrowRight, 140, eye_y - shape.brow_gap);

    let (x0, top) = (180, 260);
    let m = map.mouth;
    let outer = map.indices(Region::MouthOuter);
    for (k, &i) in outer.iter().enumerate() {
        points[i] = [x0 + k as i32 * 2, top + shape.mouth_height / 2];
    }
    points[outer[m.corner_left]] = [x0, top + shape.corner_drop];
    points[outer[m.corner_right]] = [x0 + MOUTH_WIDTH, top + shape.corner_drop];
    points[outer[m.top]] = [x0 + MOUTH_WIDTH / 2, top];
    points[outer[m.bottom]] = [x0 + MOUTH_WIDTH / 2, top + shape.mouth_height];

    let inner = map.indices(Region::MouthInner);
    for (k, &i) in inner.iter().enumerate() {
        points[i] = [x0 + 5 + k as i32, top + 2];
    }
    points[inner[m.inner_top]] = [x0 + MOUTH_WIDTH / 2, top + 1];
    points[inner[m.inner_bottom]] = [x0 + MOUTH_WIDTH / 2, top + 1 + shape.mouth_height / 2];

    LandmarkSet::from_coords(&points)
}

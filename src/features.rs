//! Eye, mouth and eyebrow features extracted from a landmark set.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::Thresholds;
use crate::error::{Error, Result};
use crate::geometry::mean_y;
use crate::metrics::{measure_region, region_metrics, RegionMetrics};
use crate::regions::{Region, RegionIndexMap};
use crate::types::{LandmarkSet, Pixel, Point};

/// One eye's openness measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EyeFeatures {
    pub center: Option<Point>,
    pub height: f32,
    pub width: f32,
    pub openness_ratio: f32,
    pub landmarks: Vec<Pixel>,
    pub unavailable: bool,
}

impl EyeFeatures {
    fn from_metrics(metrics: &RegionMetrics, landmarks: Vec<Pixel>) -> Self {
        Self {
            center: metrics.center,
            height: metrics.height,
            width: metrics.width,
            openness_ratio: metrics.ratio,
            landmarks,
            unavailable: metrics.unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EyesFeatures {
    pub left_eye: EyeFeatures,
    pub right_eye: EyeFeatures,
    pub left_openness: f32,
    pub right_openness: f32,
    /// Mean openness over the available eyes; `None` when neither is available.
    pub average_openness: Option<f32>,
    pub is_blinking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MouthFeatures {
    pub center: Option<Point>,
    pub width: f32,
    pub height_outer: f32,
    pub height_inner: f32,
    pub aspect_ratio: f32,
    pub is_open: bool,
    pub is_speaking: bool,
    pub curvature: f32,
    pub outer_landmarks: Vec<Pixel>,
    pub inner_landmarks: Vec<Pixel>,
    pub unavailable: bool,
}

/// Everything the extractor measures for one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacialFeatures {
    pub eyes: EyesFeatures,
    pub mouth: MouthFeatures,
    /// Mean eye-to-eyebrow vertical gap over the available sides.
    pub eyebrow_distance: Option<f32>,
    pub regions: BTreeMap<Region, RegionMetrics>,
}

/// Converts a landmark set into [`FacialFeatures`] using one region table.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    regions: &'static RegionIndexMap,
    thresholds: Thresholds,
}

impl FeatureExtractor {
    pub fn new(regions: &'static RegionIndexMap, thresholds: Thresholds) -> Self {
        Self { regions, thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Full feature analysis.
    ///
    /// Fails with [`Error::InsufficientLandmarks`] when the set is shorter
    /// than the model's point count and [`Error::LandmarkCountMismatch`] when
    /// it is longer: the other scheme's indices mean different landmarks.
    pub fn extract(&self, landmarks: &LandmarkSet) -> Result<FacialFeatures> {
        let model = self.regions.model;
        let required = model.point_count();
        if landmarks.len() < required {
            return Err(Error::InsufficientLandmarks {
                found: landmarks.len(),
                required,
            });
        }
        if landmarks.len() != required {
            return Err(Error::LandmarkCountMismatch {
                model: model.name(),
                found: landmarks.len(),
                expected: required,
            });
        }

        let features = FacialFeatures {
            eyes: self.eyes(landmarks),
            mouth: self.mouth(landmarks),
            eyebrow_distance: self.eyebrow_distance(landmarks),
            regions: region_metrics(self.regions, landmarks),
        };
        debug!(
            model = %self.regions.model,
            average_openness = ?features.eyes.average_openness,
            mouth_aspect_ratio = features.mouth.aspect_ratio,
            curvature = features.mouth.curvature,
            eyebrow_distance = ?features.eyebrow_distance,
            "extracted facial features"
        );
        Ok(features)
    }

    fn region_pixels(&self, region: Region, landmarks: &LandmarkSet) -> Vec<Pixel> {
        self.regions
            .resolve(region, landmarks)
            .available()
            .unwrap_or_default()
    }

    pub fn eyes(&self, landmarks: &LandmarkSet) -> EyesFeatures {
        let left = measure_region(self.regions, Region::LeftEye, landmarks);
        let right = measure_region(self.regions, Region::RightEye, landmarks);

        let available: Vec<f32> = [&left, &right]
            .iter()
            .filter(|m| !m.unavailable)
            .map(|m| m.ratio)
            .collect();
        let average_openness = if available.is_empty() {
            None
        } else {
            Some(available.iter().sum::<f32>() / available.len() as f32)
        };

        EyesFeatures {
            left_openness: left.ratio,
            right_openness: right.ratio,
            is_blinking: average_openness.is_some_and(|avg| avg < self.thresholds.blink),
            average_openness,
            left_eye: EyeFeatures::from_metrics(&left, self.region_pixels(Region::LeftEye, landmarks)),
            right_eye: EyeFeatures::from_metrics(
                &right,
                self.region_pixels(Region::RightEye, landmarks),
            ),
        }
    }

    pub fn mouth(&self, landmarks: &LandmarkSet) -> MouthFeatures {
        let outer = measure_region(self.regions, Region::MouthOuter, landmarks);
        let inner = measure_region(self.regions, Region::MouthInner, landmarks);
        let is_open = !outer.unavailable && outer.ratio > self.thresholds.mouth_open;

        MouthFeatures {
            center: outer.center,
            width: outer.width,
            height_outer: outer.height,
            height_inner: inner.height,
            aspect_ratio: outer.ratio,
            is_open,
            is_speaking: is_open,
            curvature: outer.curvature.unwrap_or(0.0),
            outer_landmarks: self.region_pixels(Region::MouthOuter, landmarks),
            inner_landmarks: self.region_pixels(Region::MouthInner, landmarks),
            unavailable: outer.unavailable,
        }
    }

    /// `mean(eye y) - mean(eyebrow y)` per side, averaged over the sides
    /// where both eye and eyebrow are available.
    pub fn eyebrow_distance(&self, landmarks: &LandmarkSet) -> Option<f32> {
        let side = |eye: Region, brow: Region| -> Option<f32> {
            let eye_px = self.regions.resolve(eye, landmarks).available()?;
            let brow_px = self.regions.resolve(brow, landmarks).available()?;
            let eye_pts: Vec<Point> = eye_px.iter().map(|p| p.to_point()).collect();
            let brow_pts: Vec<Point> = brow_px.iter().map(|p| p.to_point()).collect();
            Some(mean_y(&eye_pts)? - mean_y(&brow_pts)?)
        };

        let sides: Vec<f32> = [
            side(Region::LeftEye, Region::EyebrowLeft),
            side(Region::RightEye, Region::EyebrowRight),
        ]
        .into_iter()
        .flatten()
        .collect();

        if sides.is_empty() {
            None
        } else {
            Some(sides.iter().sum::<f32>() / sides.len() as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::IBUG68_REGIONS;

    /// A 68-point face with 20px-wide eyes of the given height, a mouth with
    /// the given corner drop and a brow gap of `brow` pixels.
    fn face68(eye_height: i32, corner_drop: i32, mouth_height: i32, brow: i32) -> LandmarkSet {
        let mut pts = vec![[0, 0]; 68];
        for (i, p) in pts.iter_mut().enumerate().take(17) {
            *p = [10 + i as i32 * 10, 100 + (i as i32 - 8).abs() * -5 + 60];
        }
        for (base, x0) in [(36usize, 40), (42usize, 100)] {
            let h = eye_height / 2;
            pts[base] = [x0, 100];
            pts[base + 1] = [x0 + 6, 100 - h];
            pts[base + 2] = [x0 + 14, 100 - h];
            pts[base + 3] = [x0 + 20, 100];
            pts[base + 4] = [x0 + 14, 100 + h];
            pts[base + 5] = [x0 + 6, 100 + h];
        }
        for (base, x0) in [(17usize, 40), (22usize, 100)] {
            for k in 0..5 {
                pts[base + k] = [x0 + k as i32 * 5, 100 - brow];
            }
        }
        for k in 0..9 {
            pts[27 + k] = [80, 110 + k as i32 * 3];
        }
        // Mouth: corners at 48/54, top 51, bottom 57
        let top_y = 150;
        for k in 0..12 {
            pts[48 + k] = [60 + k as i32 * 3, top_y + mouth_height / 2];
        }
        pts[48] = [60, top_y + corner_drop];
        pts[54] = [100, top_y + corner_drop];
        pts[51] = [80, top_y];
        pts[57] = [80, top_y + mouth_height];
        for k in 0..8 {
            pts[60 + k] = [70 + k as i32 * 3, top_y + 2];
        }
        pts[62] = [80, top_y + 1];
        pts[66] = [80, top_y + 1 + mouth_height / 2];
        LandmarkSet::from_coords(&pts)
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(&IBUG68_REGIONS, Thresholds::default())
    }

    #[test]
    fn wide_open_eyes_and_smile() {
        let features = extractor().extract(&face68(10, 10, 8, 25)).unwrap();
        let avg = features.eyes.average_openness.unwrap();
        assert!((avg - 0.5).abs() < 1e-6);
        assert!(!features.eyes.is_blinking);
        assert!((features.mouth.curvature - (-10.0)).abs() < 1e-6);
        assert!((features.mouth.width - 40.0).abs() < 1e-6);
        assert!((features.mouth.aspect_ratio - 0.2).abs() < 1e-6);
        assert!(features.mouth.is_open);
        assert_eq!(features.mouth.is_open, features.mouth.is_speaking);
    }

    #[test]
    fn blinking_below_threshold() {
        let features = extractor().extract(&face68(2, 0, 2, 25)).unwrap();
        assert!((features.eyes.average_openness.unwrap() - 0.1).abs() < 1e-6);
        assert!(features.eyes.is_blinking);
        assert!(!features.mouth.is_open);
    }

    #[test]
    fn eyebrow_distance_averages_sides() {
        let features = extractor().extract(&face68(10, 0, 4, 25)).unwrap();
        // Eye points average to y=100, brows sit at 100 - 25.
        assert!((features.eyebrow_distance.unwrap() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn too_few_landmarks_is_reported() {
        let short = LandmarkSet::from_coords(&vec![[0, 0]; 10]);
        let err = extractor().extract(&short).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientLandmarks {
                found: 10,
                required: 68
            }
        ));
    }

    #[test]
    fn longer_set_from_another_scheme_is_rejected() {
        let mesh = LandmarkSet::from_coords(&vec![[5, 5]; 468]);
        let err = extractor().extract(&mesh).unwrap_err();
        assert!(matches!(
            err,
            Error::LandmarkCountMismatch {
                model: "ibug68",
                found: 468,
                expected: 68
            }
        ));

        let one_extra = LandmarkSet::from_coords(&vec![[5, 5]; 69]);
        assert!(extractor().extract(&one_extra).is_err());
    }

    #[test]
    fn partial_sets_degrade_to_unavailable() {
        let short = LandmarkSet::from_coords(&vec![[3, 4]; 45]);
        let ex = extractor();

        let eyes = ex.eyes(&short);
        assert!(eyes.left_eye.unavailable);
        assert!(eyes.left_eye.landmarks.is_empty());
        assert!(!eyes.right_eye.unavailable);
        // Right eye collapsed to a point: zero width, zero ratio.
        assert_eq!(eyes.average_openness, Some(0.0));

        let mouth = ex.mouth(&short);
        assert!(mouth.unavailable);
        assert!(!mouth.is_open);
        assert_eq!(mouth.aspect_ratio, 0.0);

        assert_eq!(ex.eyebrow_distance(&short), Some(0.0));
    }
}

//! End-to-end analysis of one landmark set.
//!
//! A [`FaceAnalyzer`] holds only immutable configuration, so one instance can
//! be shared across threads and every call allocates its own results.

use std::collections::BTreeMap;

use chrono::Utc;
use image::RgbImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::animation::{normalize_landmarks, AnimationMapper, AnimationOutput};
use crate::config::AnalysisConfig;
use crate::emotion::{EmotionAnalysis, EmotionClassifier, EmotionInputs};
use crate::error::{Error, Result};
use crate::features::{EyesFeatures, FacialFeatures, FeatureExtractor, MouthFeatures};
use crate::mask::{region_contours, shift_contours, MaskGenerator, MaskSet};
use crate::metrics::RegionMetrics;
use crate::regions::{Region, RegionIndexMap, RegionPoints};
use crate::types::{BoundingBox, ImageDimensions, LandmarkSet, Pixel, Point};

/// The `features` block of an analysis record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBlock {
    pub eyes: EyesFeatures,
    pub mouth: MouthFeatures,
    pub eyebrow_distance: Option<f32>,
    pub regions: BTreeMap<Region, RegionMetrics>,
    pub emotion: EmotionAnalysis,
}

/// Feature analysis, or the reason it was skipped. Serializes either as the
/// feature block itself or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureReport {
    Analyzed(Box<FeatureBlock>),
    Failed { error: String },
}

impl FeatureReport {
    pub fn block(&self) -> Option<&FeatureBlock> {
        match self {
            FeatureReport::Analyzed(block) => Some(block.as_ref()),
            FeatureReport::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FeatureReport::Analyzed(_) => None,
            FeatureReport::Failed { error } => Some(error),
        }
    }
}

/// One analysis record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub landmarks_count: usize,
    pub image_dimensions: ImageDimensions,
    pub features: FeatureReport,
    /// Region boundaries with manual offsets applied; unavailable regions are empty.
    pub contours: BTreeMap<Region, Vec<Pixel>>,
    pub animation: AnimationOutput,
    pub face_bounds: Option<BoundingBox>,
    pub landmarks_normalized: Vec<Point>,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

/// Runs feature extraction, emotion scoring, contour extraction and
/// animation mapping with one configuration.
#[derive(Debug, Clone, Copy)]
pub struct FaceAnalyzer {
    config: AnalysisConfig,
    regions: &'static RegionIndexMap,
    extractor: FeatureExtractor,
    classifier: EmotionClassifier,
    mapper: AnimationMapper,
}

impl FaceAnalyzer {
    /// Build an analyzer, checking the model's region table up front.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let regions = config.model.region_map();
        regions.validate()?;
        debug!(model = %config.model, version = regions.version, "region index map validated");

        Ok(Self {
            config,
            regions,
            extractor: FeatureExtractor::new(regions, config.thresholds),
            classifier: EmotionClassifier::new(config.classifier),
            mapper: AnimationMapper::new(config.animation),
        })
    }

    /// Analyzer with default settings for a model identifier such as `"ibug68"`.
    pub fn for_model(id: &str) -> Result<Self> {
        Self::new(AnalysisConfig::for_model(id.parse()?))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn regions(&self) -> &'static RegionIndexMap {
        self.regions
    }

    /// Analyze the output of a detector that may have found no face.
    pub fn analyze_detection(
        &self,
        detection: Option<&LandmarkSet>,
        dims: ImageDimensions,
    ) -> Result<AnalysisResult> {
        self.analyze(detection.ok_or(Error::NoFaceDetected)?, dims)
    }

    /// Full analysis record.
    ///
    /// An empty landmark set is reported as [`Error::NoFaceDetected`]. A set
    /// whose length differs from the model's point count still yields
    /// contours and neutral animation, with the failure recorded in `features`.
    pub fn analyze(&self, landmarks: &LandmarkSet, dims: ImageDimensions) -> Result<AnalysisResult> {
        if landmarks.is_empty() {
            return Err(Error::NoFaceDetected);
        }

        self.warn_unavailable(landmarks);

        let (features, emotion, animation) = match self.extractor.extract(landmarks) {
            Ok(features) => {
                let emotion = self.classifier.classify_features(&features);
                let animation = self.mapper.map_features(&features, &emotion);
                (self.feature_block(features, emotion.clone()), emotion, animation)
            }
            Err(err) => {
                warn!(error = %err, "feature analysis skipped");
                let emotion = self.classifier.classify(&EmotionInputs::default());
                let animation = self.mapper.map(None, None, &emotion);
                (
                    FeatureReport::Failed {
                        error: err.to_string(),
                    },
                    emotion,
                    animation,
                )
            }
        };

        let contours = shift_contours(&region_contours(self.regions, landmarks), &self.config.offsets);
        let (face_bounds, landmarks_normalized) = match normalize_landmarks(landmarks) {
            Some((bbox, points)) => (Some(bbox), points),
            None => (None, Vec::new()),
        };

        debug!(
            landmarks = landmarks.len(),
            dominant = %emotion.dominant_emotion,
            confidence = emotion.confidence,
            "analysis complete"
        );

        Ok(AnalysisResult {
            landmarks_count: landmarks.len(),
            image_dimensions: dims,
            features,
            contours,
            animation: AnimationOutput {
                facial_animation: animation,
            },
            face_bounds,
            landmarks_normalized,
            timestamp: epoch_seconds(),
        })
    }

    /// Hull, outline and artistic masks at `dims`, plus the debug image when
    /// a source image is supplied.
    pub fn masks(
        &self,
        landmarks: &LandmarkSet,
        dims: ImageDimensions,
        source: Option<&RgbImage>,
    ) -> Result<MaskSet> {
        if landmarks.is_empty() {
            return Err(Error::NoFaceDetected);
        }
        MaskGenerator::new(self.regions, dims)
            .with_offsets(self.config.offsets)
            .generate(landmarks, source)
    }

    fn feature_block(&self, features: FacialFeatures, emotion: EmotionAnalysis) -> FeatureReport {
        FeatureReport::Analyzed(Box::new(FeatureBlock {
            eyes: features.eyes,
            mouth: features.mouth,
            eyebrow_distance: features.eyebrow_distance,
            regions: features.regions,
            emotion,
        }))
    }

    fn warn_unavailable(&self, landmarks: &LandmarkSet) {
        for region in Region::ALL {
            if let RegionPoints::Unavailable(reason) = self.regions.resolve(region, landmarks) {
                warn!(%region, %reason, "region unavailable");
            }
        }
    }
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

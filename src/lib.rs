//! # face-state
//!
//! Facial state analysis from 2D landmarks.
//!
//! This crate provides:
//! - **Region maps**: index tables for the iBUG 68-point and Face Mesh
//!   468-point landmark schemes
//! - **Feature extraction**: eye openness, mouth aspect ratio and curvature,
//!   eyebrow distance, per-region metrics
//! - **Emotion scoring**: a fixed rule table over the extracted signals
//! - **Masks**: convex hull, face outline and artistic edge overlays
//! - **Animation drivers**: clamped openness values and expression weights
//!
//! Landmark detection itself is out of scope; landmarks come from any
//! detector that emits one of the supported schemes.
//!
//! ## Pipeline
//!
//! 1. Resolve each region's landmark indices (regions that do not fit the
//!    landmark set are marked unavailable, never fatal)
//! 2. Measure eyes, mouth and eyebrows
//! 3. Score emotions from the measurements and normalize the scores
//! 4. Map ratios and the dominant emotion to animation drivers
//! 5. Optionally rasterize masks at source resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use face_state::{AnalysisConfig, FaceAnalyzer, ImageDimensions, LandmarkModel, LandmarkSet};
//!
//! let analyzer = FaceAnalyzer::new(AnalysisConfig::for_model(LandmarkModel::Ibug68)).unwrap();
//!
//! let coords: Vec<[i32; 2]> = (0..68).map(|i| [100 + (i % 17) * 6, 80 + (i / 17) * 9]).collect();
//! let landmarks = LandmarkSet::from_coords(&coords);
//! let dims = ImageDimensions::new(320, 240);
//!
//! let result = analyzer.analyze(&landmarks, dims).unwrap();
//! println!("{}", result.animation.facial_animation.emotion.current);
//!
//! let masks = analyzer.masks(&landmarks, dims, None).unwrap();
//! assert_eq!(masks.hull.dimensions(), (320, 240));
//! ```

pub mod analyzer;
pub mod animation;
pub mod config;
pub mod emotion;
mod error;
pub mod features;
pub mod geometry;
pub mod logging;
pub mod mask;
pub mod metrics;
pub mod regions;
mod types;

pub use analyzer::{AnalysisResult, FaceAnalyzer, FeatureBlock, FeatureReport};
pub use animation::{normalize_landmarks, AnimationMapper, AnimationOutput, AnimationParameters};
pub use config::{AnalysisConfig, AnimationScale, ManualOffsets, Thresholds};
pub use emotion::{ClassifierVariant, Emotion, EmotionAnalysis, EmotionClassifier, EmotionInputs, EmotionScoreSet};
pub use error::{Error, Result};
pub use features::{EyeFeatures, EyesFeatures, FacialFeatures, FeatureExtractor, MouthFeatures};
pub use geometry::{convex_hull, polygon_area};
pub use mask::{MaskGenerator, MaskSet, MaskStrategy, OutlineFallback};
pub use metrics::RegionMetrics;
pub use regions::{LandmarkModel, Region, RegionIndexMap, RegionPoints};
pub use types::{BoundingBox, ImageDimensions, LandmarkSet, Pixel, Point};

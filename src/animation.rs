//! Renderer-facing animation drivers.
//!
//! Raw ratios are rescaled into clamped [0, 1] drivers and the dominant
//! emotion is expanded into named expression weights, so the renderer never
//! sees the extractor's internal ratio scales.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AnimationScale;
use crate::emotion::{Emotion, EmotionAnalysis, EmotionScoreSet};
use crate::features::FacialFeatures;
use crate::types::{BoundingBox, LandmarkSet, Point};

/// Expression weights driven by each emotion, before scaling by confidence.
pub fn expression_table(emotion: Emotion) -> &'static [(&'static str, f32)] {
    match emotion {
        Emotion::Happy => &[("smile", 0.8), ("eyeSquint", 0.3)],
        Emotion::Sad => &[("frown", 0.7), ("eyeSquint", 0.1)],
        Emotion::Angry => &[("frown", 0.6), ("eyebrowDown", 0.8)],
        Emotion::Surprised => &[("mouthOpen", 0.8), ("eyebrowUp", 0.7)],
        Emotion::Fear => &[("mouthOpen", 0.4), ("eyebrowUp", 0.5)],
        Emotion::Disgust => &[("frown", 0.5), ("noseWrinkle", 0.6)],
        Emotion::Neutral => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionSummary {
    pub current: Emotion,
    pub intensity: f32,
    pub all_scores: EmotionScoreSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EyePosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationParameters {
    pub eye_openness: f32,
    pub mouth_openness: f32,
    /// Gaze is not estimated; always centered.
    pub eye_position: EyePosition,
    pub expression_weights: BTreeMap<String, f32>,
    pub emotion: EmotionSummary,
}

/// Wrapper matching the renderer's `{ "facial_animation": ... }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationOutput {
    pub facial_animation: AnimationParameters,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationMapper {
    scale: AnimationScale,
}

impl AnimationMapper {
    pub fn new(scale: AnimationScale) -> Self {
        Self { scale }
    }

    /// Map raw openness/aspect ratios plus the emotion result to drivers.
    ///
    /// Missing ratios (unavailable regions) map to a closed 0.
    pub fn map(
        &self,
        average_openness: Option<f32>,
        mouth_aspect_ratio: Option<f32>,
        emotion: &EmotionAnalysis,
    ) -> AnimationParameters {
        let eye_openness = clamp_unit(average_openness.unwrap_or(0.0) * self.scale.eye);
        let mouth_openness = clamp_unit(mouth_aspect_ratio.unwrap_or(0.0) * self.scale.mouth);

        let expression_weights = expression_table(emotion.dominant_emotion)
            .iter()
            .map(|&(name, weight)| (name.to_string(), weight * emotion.confidence))
            .collect();

        AnimationParameters {
            eye_openness,
            mouth_openness,
            eye_position: EyePosition { x: 0.0, y: 0.0 },
            expression_weights,
            emotion: EmotionSummary {
                current: emotion.dominant_emotion,
                intensity: emotion.confidence,
                all_scores: emotion.scores.clone(),
            },
        }
    }

    pub fn map_features(&self, features: &FacialFeatures, emotion: &EmotionAnalysis) -> AnimationParameters {
        let mouth_ratio = (!features.mouth.unavailable).then_some(features.mouth.aspect_ratio);
        self.map(features.eyes.average_openness, mouth_ratio, emotion)
    }
}

fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Landmarks rescaled into [0, 1] relative to their own bounding box.
///
/// Returns the box alongside the points; an axis with zero extent maps to 0.5.
pub fn normalize_landmarks(landmarks: &LandmarkSet) -> Option<(BoundingBox, Vec<Point>)> {
    let bbox = landmarks.bounding_box()?;
    let points = landmarks
        .pixels()
        .iter()
        .map(|p| bbox.normalize_point(p.to_point()))
        .collect();
    Some((bbox, points))
}

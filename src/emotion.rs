//! Rule-based emotion scoring.
//!
//! Scores start from a neutral baseline and each rule whose condition holds
//! adds a fixed weight to one label. Rules are not exclusive, so one frame can
//! raise several labels. The result is normalized into a vote share: the
//! `confidence` of the dominant label ranks labels against each other and is
//! not a calibrated probability.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::FacialFeatures;

/// Emotion labels. Declaration order breaks ties between equal scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Fear,
    Disgust,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Fear,
        Emotion::Disgust,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A measured quantity a rule can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    MouthCurvature,
    MouthAspectRatio,
    AverageOpenness,
    EyebrowDistance,
}

/// Strict comparison against a fixed constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Below(f32),
    Above(f32),
}

impl Comparison {
    pub fn holds(self, value: f32) -> bool {
        match self {
            Comparison::Below(limit) => value < limit,
            Comparison::Above(limit) => value > limit,
        }
    }
}

/// When `signal` satisfies `comparison`, add `delta` to `emotion`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub signal: Signal,
    pub comparison: Comparison,
    pub emotion: Emotion,
    pub delta: f32,
}

impl Rule {
    const fn new(signal: Signal, comparison: Comparison, emotion: Emotion, delta: f32) -> Self {
        Self {
            signal,
            comparison,
            emotion,
            delta,
        }
    }

    /// A rule over an unavailable signal never fires.
    pub fn fires(&self, inputs: &EmotionInputs) -> bool {
        inputs
            .signal(self.signal)
            .is_some_and(|value| self.comparison.holds(value))
    }
}

use Comparison::{Above, Below};
use Signal::{AverageOpenness, EyebrowDistance, MouthAspectRatio, MouthCurvature};

pub const STANDARD_RULES: [Rule; 9] = [
    Rule::new(MouthCurvature, Below(-5.0), Emotion::Happy, 0.4),
    Rule::new(AverageOpenness, Below(0.25), Emotion::Happy, 0.2),
    Rule::new(MouthCurvature, Above(5.0), Emotion::Sad, 0.3),
    Rule::new(EyebrowDistance, Below(20.0), Emotion::Sad, 0.2),
    Rule::new(EyebrowDistance, Below(15.0), Emotion::Angry, 0.3),
    Rule::new(MouthAspectRatio, Below(0.1), Emotion::Angry, 0.2),
    Rule::new(EyebrowDistance, Above(30.0), Emotion::Surprised, 0.3),
    Rule::new(AverageOpenness, Above(0.3), Emotion::Surprised, 0.2),
    Rule::new(MouthAspectRatio, Above(0.2), Emotion::Surprised, 0.2),
];

pub const LIGHTWEIGHT_RULES: [Rule; 4] = [
    Rule::new(MouthCurvature, Below(-5.0), Emotion::Happy, 0.4),
    Rule::new(MouthCurvature, Above(3.0), Emotion::Sad, 0.3),
    Rule::new(MouthAspectRatio, Above(0.15), Emotion::Surprised, 0.3),
    Rule::new(AverageOpenness, Below(0.1), Emotion::Happy, 0.2),
];

/// Which rule table and label set to score with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierVariant {
    /// All seven labels, neutral baseline 0.5, nine rules.
    #[default]
    Standard,
    /// Five labels, neutral baseline 0.4, four rules.
    Lightweight,
}

impl ClassifierVariant {
    pub fn labels(self) -> &'static [Emotion] {
        match self {
            ClassifierVariant::Standard => &Emotion::ALL,
            ClassifierVariant::Lightweight => &[
                Emotion::Neutral,
                Emotion::Happy,
                Emotion::Sad,
                Emotion::Surprised,
                Emotion::Angry,
            ],
        }
    }

    pub fn neutral_baseline(self) -> f32 {
        match self {
            ClassifierVariant::Standard => 0.5,
            ClassifierVariant::Lightweight => 0.4,
        }
    }

    pub fn rules(self) -> &'static [Rule] {
        match self {
            ClassifierVariant::Standard => &STANDARD_RULES,
            ClassifierVariant::Lightweight => &LIGHTWEIGHT_RULES,
        }
    }
}

/// Classifier inputs. `None` marks a signal whose region was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmotionInputs {
    pub mouth_curvature: Option<f32>,
    pub mouth_aspect_ratio: Option<f32>,
    pub average_openness: Option<f32>,
    pub eyebrow_distance: Option<f32>,
}

impl EmotionInputs {
    pub fn from_features(features: &FacialFeatures) -> Self {
        let mouth = (!features.mouth.unavailable).then_some(&features.mouth);
        Self {
            mouth_curvature: mouth.map(|m| m.curvature),
            mouth_aspect_ratio: mouth.map(|m| m.aspect_ratio),
            average_openness: features.eyes.average_openness,
            eyebrow_distance: features.eyebrow_distance,
        }
    }

    pub fn signal(&self, signal: Signal) -> Option<f32> {
        match signal {
            Signal::MouthCurvature => self.mouth_curvature,
            Signal::MouthAspectRatio => self.mouth_aspect_ratio,
            Signal::AverageOpenness => self.average_openness,
            Signal::EyebrowDistance => self.eyebrow_distance,
        }
    }
}

/// Label weights, iterated in label declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmotionScoreSet {
    scores: BTreeMap<Emotion, f32>,
}

impl EmotionScoreSet {
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.scores.get(&emotion).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        self.scores.iter().map(|(&e, &w)| (e, w))
    }

    pub fn total(&self) -> f32 {
        self.scores.values().sum()
    }

    /// Divide every weight by the total. A zero total collapses to neutral.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        let scores = if total > 0.0 {
            self.scores.iter().map(|(&e, &w)| (e, w / total)).collect()
        } else {
            let mut collapsed: BTreeMap<Emotion, f32> =
                self.scores.keys().map(|&e| (e, 0.0)).collect();
            collapsed.insert(Emotion::Neutral, 1.0);
            collapsed
        };
        Self { scores }
    }

    /// Highest weight; ties go to the label declared first.
    pub fn dominant(&self) -> (Emotion, f32) {
        let mut best = (Emotion::Neutral, f32::NEG_INFINITY);
        for (emotion, weight) in self.iter() {
            if weight > best.1 {
                best = (emotion, weight);
            }
        }
        if best.1 == f32::NEG_INFINITY {
            (Emotion::Neutral, 0.0)
        } else {
            best
        }
    }
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionAnalysis {
    pub scores: EmotionScoreSet,
    pub dominant_emotion: Emotion,
    /// Normalized vote share of the dominant label.
    pub confidence: f32,
    pub eyebrow_distance: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionClassifier {
    variant: ClassifierVariant,
}

impl EmotionClassifier {
    pub fn new(variant: ClassifierVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> ClassifierVariant {
        self.variant
    }

    /// Raw weights: the baseline with every firing rule folded in.
    pub fn raw_scores(&self, inputs: &EmotionInputs) -> EmotionScoreSet {
        let initial: BTreeMap<Emotion, f32> = self
            .variant
            .labels()
            .iter()
            .map(|&e| {
                let base = if e == Emotion::Neutral {
                    self.variant.neutral_baseline()
                } else {
                    0.0
                };
                (e, base)
            })
            .collect();

        let scores = self
            .variant
            .rules()
            .iter()
            .filter(|rule| rule.fires(inputs))
            .fold(initial, |mut acc, rule| {
                *acc.entry(rule.emotion).or_insert(0.0) += rule.delta;
                acc
            });
        EmotionScoreSet { scores }
    }

    pub fn classify(&self, inputs: &EmotionInputs) -> EmotionAnalysis {
        let scores = self.raw_scores(inputs).normalized();
        let (dominant_emotion, confidence) = scores.dominant();
        EmotionAnalysis {
            scores,
            dominant_emotion,
            confidence,
            eyebrow_distance: inputs.eyebrow_distance,
        }
    }

    pub fn classify_features(&self, features: &FacialFeatures) -> EmotionAnalysis {
        self.classify(&EmotionInputs::from_features(features))
    }
}

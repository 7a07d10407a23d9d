//! Analysis configuration.
//!
//! Every tunable constant of the pipeline lives here so that extraction,
//! classification and animation mapping agree on one value per metric.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emotion::ClassifierVariant;
use crate::error::Result;
use crate::regions::{LandmarkModel, Region};

/// Decision thresholds applied to the extracted ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Eyes count as blinking when the average openness is below this.
    pub blink: f32,
    /// The mouth counts as open (speaking) when its aspect ratio is above this.
    pub mouth_open: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blink: 0.20,
            mouth_open: 0.15,
        }
    }
}

/// Scale factors from raw ratios to [0, 1] animation drivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationScale {
    pub eye: f32,
    pub mouth: f32,
}

impl Default for AnimationScale {
    fn default() -> Self {
        Self {
            eye: 4.0,
            mouth: 5.0,
        }
    }
}

/// Manual pixel nudges for region placement, persisted between sessions.
///
/// Applied only to emitted contour points. Landmarks and metrics are never
/// shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOffsets {
    pub mouth_offset_x: i32,
    pub mouth_offset_y: i32,
    pub eye_offset_y: i32,
}

impl ManualOffsets {
    /// Pixel shift for a region's contour.
    pub fn for_region(&self, region: Region) -> (i32, i32) {
        match region {
            Region::MouthOuter | Region::MouthInner => (self.mouth_offset_x, self.mouth_offset_y),
            Region::LeftEye | Region::RightEye => (0, self.eye_offset_y),
            _ => (0, 0),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }
}

/// Complete configuration of one analysis deployment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub model: LandmarkModel,
    pub thresholds: Thresholds,
    pub animation: AnimationScale,
    pub classifier: ClassifierVariant,
    pub offsets: ManualOffsets,
}

impl AnalysisConfig {
    pub fn for_model(model: LandmarkModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }
}

fn load_json<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

//! Static landmark index tables, one per supported landmark scheme.
//!
//! The two schemes are not interchangeable: index 33 is a jaw point in the
//! iBUG 68-point layout and an eye corner in the 468-point face mesh. Each
//! table lists, per named region, the landmark indices of that region's
//! boundary polyline in drawing order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{LandmarkSet, Pixel};

/// Supported landmark schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkModel {
    /// iBUG / dlib 68-point annotation.
    Ibug68,
    /// MediaPipe face mesh, 468 points.
    #[default]
    FaceMesh468,
}

impl LandmarkModel {
    pub const fn point_count(self) -> usize {
        match self {
            LandmarkModel::Ibug68 => 68,
            LandmarkModel::FaceMesh468 => 468,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            LandmarkModel::Ibug68 => "ibug68",
            LandmarkModel::FaceMesh468 => "face_mesh468",
        }
    }

    /// The model whose point count is exactly `n`.
    pub fn from_point_count(n: usize) -> Result<Self> {
        match n {
            68 => Ok(LandmarkModel::Ibug68),
            468 => Ok(LandmarkModel::FaceMesh468),
            other => Err(Error::UnknownModel(format!("{other}-point scheme"))),
        }
    }

    pub fn region_map(self) -> &'static RegionIndexMap {
        match self {
            LandmarkModel::Ibug68 => &IBUG68_REGIONS,
            LandmarkModel::FaceMesh468 => &FACE_MESH468_REGIONS,
        }
    }
}

impl fmt::Display for LandmarkModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LandmarkModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ibug68" | "dlib68" | "68" => Ok(LandmarkModel::Ibug68),
            "face_mesh468" | "mediapipe" | "468" => Ok(LandmarkModel::FaceMesh468),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

/// Named facial regions. Declaration order is the order regions are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    LeftEye,
    RightEye,
    MouthOuter,
    MouthInner,
    EyebrowLeft,
    EyebrowRight,
    FaceOutline,
    Nose,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::LeftEye,
        Region::RightEye,
        Region::MouthOuter,
        Region::MouthInner,
        Region::EyebrowLeft,
        Region::EyebrowRight,
        Region::FaceOutline,
        Region::Nose,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Region::LeftEye => "left_eye",
            Region::RightEye => "right_eye",
            Region::MouthOuter => "mouth_outer",
            Region::MouthInner => "mouth_inner",
            Region::EyebrowLeft => "eyebrow_left",
            Region::EyebrowRight => "eyebrow_right",
            Region::FaceOutline => "face_outline",
            Region::Nose => "nose",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Positions (within an eye's index list) of the landmarks used for openness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeLayout {
    pub top: usize,
    pub bottom: usize,
    pub outer: usize,
    pub inner: usize,
}

/// Positions of the mouth landmarks used for width, height and curvature.
///
/// `corner_*`, `top` and `bottom` index the outer lip list; `inner_*` index
/// the inner lip list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouthLayout {
    pub corner_left: usize,
    pub corner_right: usize,
    pub top: usize,
    pub bottom: usize,
    pub inner_top: usize,
    pub inner_bottom: usize,
}

/// Why a region could not be resolved against a landmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Unavailable {
    /// First offending landmark index.
    pub index: usize,
    /// Length of the landmark set it was looked up in.
    pub landmarks: usize,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "landmark index {} out of range for {} landmarks",
            self.index, self.landmarks
        )
    }
}

/// A region looked up in a concrete landmark set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionPoints {
    Available(Vec<Pixel>),
    Unavailable(Unavailable),
}

impl RegionPoints {
    pub fn available(self) -> Option<Vec<Pixel>> {
        match self {
            RegionPoints::Available(points) => Some(points),
            RegionPoints::Unavailable(_) => None,
        }
    }
}

/// Region name to landmark index table for one landmark scheme.
#[derive(Debug, PartialEq, Eq)]
pub struct RegionIndexMap {
    pub model: LandmarkModel,
    /// Bumped whenever an index list changes.
    pub version: u32,
    /// Index lists in [`Region::ALL`] order.
    regions: [&'static [usize]; 8],
    pub eye: EyeLayout,
    pub mouth: MouthLayout,
}

impl RegionIndexMap {
    /// Look up the table for a model identifier such as `"ibug68"` or `"face_mesh468"`.
    pub fn for_identifier(id: &str) -> Result<&'static RegionIndexMap> {
        Ok(id.parse::<LandmarkModel>()?.region_map())
    }

    pub fn indices(&self, region: Region) -> &'static [usize] {
        self.regions[region as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, &'static [usize])> + '_ {
        Region::ALL.iter().map(move |&r| (r, self.indices(r)))
    }

    pub fn max_index(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|ix| ix.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Check every index against the model's point count and every layout
    /// position against its list.
    pub fn validate(&self) -> Result<()> {
        let point_count = self.model.point_count();
        for (region, indices) in self.iter() {
            if let Some(&index) = indices.iter().find(|&&i| i >= point_count) {
                return Err(Error::InvalidRegionMap {
                    model: self.model.name(),
                    region: region.name(),
                    index,
                    point_count,
                });
            }
        }

        let eye_len = self
            .indices(Region::LeftEye)
            .len()
            .min(self.indices(Region::RightEye).len());
        let eye = [self.eye.top, self.eye.bottom, self.eye.outer, self.eye.inner];
        self.check_positions(Region::LeftEye, &eye, eye_len)?;

        let m = self.mouth;
        let outer_len = self.indices(Region::MouthOuter).len();
        self.check_positions(
            Region::MouthOuter,
            &[m.corner_left, m.corner_right, m.top, m.bottom],
            outer_len,
        )?;
        let inner_len = self.indices(Region::MouthInner).len();
        self.check_positions(Region::MouthInner, &[m.inner_top, m.inner_bottom], inner_len)
    }

    fn check_positions(&self, region: Region, positions: &[usize], len: usize) -> Result<()> {
        match positions.iter().find(|&&p| p >= len) {
            Some(&index) => Err(Error::InvalidRegionMap {
                model: self.model.name(),
                region: region.name(),
                index,
                point_count: len,
            }),
            None => Ok(()),
        }
    }

    /// Resolve a region's points in `landmarks`, in boundary order.
    pub fn resolve(&self, region: Region, landmarks: &LandmarkSet) -> RegionPoints {
        let indices = self.indices(region);
        match indices.iter().find(|&&i| i >= landmarks.len()) {
            Some(&index) => RegionPoints::Unavailable(Unavailable {
                index,
                landmarks: landmarks.len(),
            }),
            None => RegionPoints::Available(indices.iter().map(|&i| landmarks.pixels()[i]).collect()),
        }
    }
}

// iBUG 68-point scheme. "Left" is the subject's left: landmarks 42-47 / 22-26.
const IBUG68_LEFT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];
const IBUG68_RIGHT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];
const IBUG68_MOUTH_OUTER: [usize; 12] = [48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59];
const IBUG68_MOUTH_INNER: [usize; 8] = [60, 61, 62, 63, 64, 65, 66, 67];
const IBUG68_EYEBROW_LEFT: [usize; 5] = [22, 23, 24, 25, 26];
const IBUG68_EYEBROW_RIGHT: [usize; 5] = [17, 18, 19, 20, 21];
const IBUG68_FACE_OUTLINE: [usize; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
const IBUG68_NOSE: [usize; 9] = [27, 28, 29, 30, 31, 32, 33, 34, 35];

pub static IBUG68_REGIONS: RegionIndexMap = RegionIndexMap {
    model: LandmarkModel::Ibug68,
    version: 1,
    regions: [
        &IBUG68_LEFT_EYE,
        &IBUG68_RIGHT_EYE,
        &IBUG68_MOUTH_OUTER,
        &IBUG68_MOUTH_INNER,
        &IBUG68_EYEBROW_LEFT,
        &IBUG68_EYEBROW_RIGHT,
        &IBUG68_FACE_OUTLINE,
        &IBUG68_NOSE,
    ],
    eye: EyeLayout {
        top: 1,
        bottom: 5,
        outer: 0,
        inner: 3,
    },
    mouth: MouthLayout {
        corner_left: 0,
        corner_right: 6,
        top: 3,
        bottom: 9,
        inner_top: 2,
        inner_bottom: 6,
    },
};

// MediaPipe face mesh (468 points).
const MESH_LEFT_EYE: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];
const MESH_RIGHT_EYE: [usize; 16] = [
    362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
];
const MESH_MOUTH_OUTER: [usize; 20] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 409, 270, 269, 267, 0, 37, 39, 40, 185,
];
const MESH_MOUTH_INNER: [usize; 20] = [
    78, 95, 88, 178, 87, 14, 317, 402, 318, 324, 308, 415, 310, 311, 312, 13, 82, 81, 80, 191,
];
const MESH_EYEBROW_LEFT: [usize; 10] = [46, 53, 52, 65, 55, 70, 63, 105, 66, 107];
const MESH_EYEBROW_RIGHT: [usize; 10] = [276, 283, 282, 295, 285, 300, 293, 334, 296, 336];
const MESH_FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];
const MESH_NOSE: [usize; 22] = [
    1, 2, 5, 4, 6, 168, 8, 9, 10, 151, 195, 197, 196, 3, 51, 48, 115, 131, 134, 102, 49, 220,
];

pub static FACE_MESH468_REGIONS: RegionIndexMap = RegionIndexMap {
    model: LandmarkModel::FaceMesh468,
    version: 1,
    regions: [
        &MESH_LEFT_EYE,
        &MESH_RIGHT_EYE,
        &MESH_MOUTH_OUTER,
        &MESH_MOUTH_INNER,
        &MESH_EYEBROW_LEFT,
        &MESH_EYEBROW_RIGHT,
        &MESH_FACE_OVAL,
        &MESH_NOSE,
    ],
    // 160/144 vertical, 33/133 horizontal (385/380, 362/263 on the right)
    eye: EyeLayout {
        top: 13,
        bottom: 3,
        outer: 0,
        inner: 8,
    },
    // corners 61/291, outer 0/17, inner 13/14
    mouth: MouthLayout {
        corner_left: 0,
        corner_right: 10,
        top: 15,
        bottom: 5,
        inner_top: 15,
        inner_bottom: 5,
    },
};

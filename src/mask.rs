//! Region contours, binary face masks and composite overlays.
//!
//! Masks are single-channel images at source resolution with every cell
//! either 0 or 255. They are allocated fresh for each request.

use std::collections::BTreeMap;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point as PolyPoint;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ManualOffsets;
use crate::error::{Error, Result};
use crate::geometry::convex_hull;
use crate::regions::{Region, RegionIndexMap, RegionPoints};
use crate::types::{ImageDimensions, LandmarkSet, Pixel};

const MASK_ON: u8 = 255;
const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;
/// Sigma of a 21x21 Gaussian kernel under the usual kernel-size rule.
const GLOW_SIGMA: f32 = 3.5;

const DEBUG_LANDMARK: Rgb<u8> = Rgb([0, 255, 0]);
const DEBUG_PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([255, 0, 255]),
    Rgb([0, 255, 255]),
];

/// How a mask is derived from the landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    ConvexHull,
    FaceOutline,
    Artistic,
}

impl MaskStrategy {
    /// File-name suffix for this strategy's output.
    pub const fn suffix(self) -> &'static str {
        match self {
            MaskStrategy::ConvexHull => "mask_hull",
            MaskStrategy::FaceOutline => "mask_outline",
            MaskStrategy::Artistic => "mask_artistic",
        }
    }
}

/// What to fill when the face outline cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlineFallback {
    /// Use the convex hull of the full landmark set.
    #[default]
    ConvexHull,
    /// Leave the mask empty.
    Empty,
}

impl OutlineFallback {
    /// Choose the polygon to fill for the face-outline strategy.
    pub fn polygon(self, outline: RegionPoints, landmarks: &LandmarkSet) -> Vec<Pixel> {
        match outline {
            RegionPoints::Available(points) => points,
            RegionPoints::Unavailable(reason) => {
                warn!(%reason, policy = ?self, "face outline unavailable, using fallback");
                match self {
                    OutlineFallback::ConvexHull => convex_hull(landmarks.pixels()),
                    OutlineFallback::Empty => Vec::new(),
                }
            }
        }
    }
}

/// Ordered boundary points for every region; unavailable regions are empty.
pub fn region_contours(map: &RegionIndexMap, landmarks: &LandmarkSet) -> BTreeMap<Region, Vec<Pixel>> {
    map.iter()
        .map(|(region, _)| {
            let points = map.resolve(region, landmarks).available().unwrap_or_default();
            (region, points)
        })
        .collect()
}

/// Copy of `contours` with the manual placement offsets applied.
pub fn shift_contours(
    contours: &BTreeMap<Region, Vec<Pixel>>,
    offsets: &ManualOffsets,
) -> BTreeMap<Region, Vec<Pixel>> {
    contours
        .iter()
        .map(|(&region, points)| {
            let (dx, dy) = offsets.for_region(region);
            (region, points.iter().map(|p| p.offset(dx, dy)).collect())
        })
        .collect()
}

/// Drop repeated consecutive vertices and a closing vertex equal to the first.
fn open_polygon(points: &[Pixel]) -> Vec<PolyPoint<i32>> {
    let mut poly: Vec<PolyPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let q = PolyPoint::new(p.x, p.y);
        if poly.last() != Some(&q) {
            poly.push(q);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    poly
}

/// Fill a polygon into `mask`. Fewer than three distinct vertices draw a
/// segment or a single pixel.
pub fn fill_polygon(mask: &mut GrayImage, points: &[Pixel]) {
    if mask.width() == 0 || mask.height() == 0 {
        return;
    }
    let poly = open_polygon(points);
    match poly.as_slice() {
        [] => {}
        [p] => {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < mask.width() && (p.y as u32) < mask.height() {
                mask.put_pixel(p.x as u32, p.y as u32, Luma([MASK_ON]));
            }
        }
        _ => draw_polygon_mut(mask, &poly, Luma([MASK_ON])),
    }
}

/// Canny edge map of a grayscale image with the default thresholds.
pub fn detect_edges(gray: &GrayImage) -> GrayImage {
    canny(gray, CANNY_LOW, CANNY_HIGH)
}

/// Compose the three-channel overlay from a hull mask and an edge map.
///
/// Red and blue carry the edges inside the mask; green carries the mask
/// brightened by half of a blurred copy of itself.
pub fn compose_artistic(mask: &GrayImage, edges: &GrayImage) -> Result<RgbImage> {
    if mask.dimensions() != edges.dimensions() {
        return Err(Error::DimensionMismatch {
            expected_width: mask.width(),
            expected_height: mask.height(),
            actual_width: edges.width(),
            actual_height: edges.height(),
        });
    }

    let glow = if mask.width() == 0 || mask.height() == 0 {
        mask.clone()
    } else {
        gaussian_blur_f32(mask, GLOW_SIGMA)
    };

    Ok(RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let m = mask.get_pixel(x, y)[0];
        let edge = edges.get_pixel(x, y)[0] & m;
        let green = m.saturating_add(glow.get_pixel(x, y)[0] / 2);
        Rgb([edge, green, edge])
    }))
}

/// Rasterizes landmark-derived masks at a fixed image size.
#[derive(Debug, Clone, Copy)]
pub struct MaskGenerator {
    regions: &'static RegionIndexMap,
    dims: ImageDimensions,
    fallback: OutlineFallback,
    offsets: ManualOffsets,
}

impl MaskGenerator {
    pub fn new(regions: &'static RegionIndexMap, dims: ImageDimensions) -> Self {
        Self {
            regions,
            dims,
            fallback: OutlineFallback::default(),
            offsets: ManualOffsets::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: OutlineFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Offsets applied to the contours drawn on the debug image.
    pub fn with_offsets(mut self, offsets: ManualOffsets) -> Self {
        self.offsets = offsets;
        self
    }

    fn blank(&self) -> GrayImage {
        GrayImage::new(self.dims.width, self.dims.height)
    }

    /// Convex hull of `points`, filled.
    pub fn hull_mask(&self, points: &[Pixel]) -> GrayImage {
        let mut mask = self.blank();
        fill_polygon(&mut mask, &convex_hull(points));
        mask
    }

    pub fn convex_hull_mask(&self, landmarks: &LandmarkSet) -> GrayImage {
        self.hull_mask(landmarks.pixels())
    }

    /// The face outline region filled as a polygon, or the fallback polygon
    /// when any outline index is out of range.
    pub fn face_outline_mask(&self, landmarks: &LandmarkSet) -> GrayImage {
        let outline = self.regions.resolve(Region::FaceOutline, landmarks);
        let polygon = self.fallback.polygon(outline, landmarks);
        let mut mask = self.blank();
        fill_polygon(&mut mask, &polygon);
        mask
    }

    /// Artistic overlay from an externally computed edge map.
    pub fn artistic_mask(&self, landmarks: &LandmarkSet, edges: &GrayImage) -> Result<RgbImage> {
        compose_artistic(&self.convex_hull_mask(landmarks), edges)
    }

    /// One mask by strategy. `edges` feeds the artistic strategy and is
    /// treated as blank when absent.
    pub fn mask(
        &self,
        strategy: MaskStrategy,
        landmarks: &LandmarkSet,
        edges: Option<&GrayImage>,
    ) -> Result<DynamicImage> {
        Ok(match strategy {
            MaskStrategy::ConvexHull => DynamicImage::ImageLuma8(self.convex_hull_mask(landmarks)),
            MaskStrategy::FaceOutline => DynamicImage::ImageLuma8(self.face_outline_mask(landmarks)),
            MaskStrategy::Artistic => {
                let blank;
                let edges = match edges {
                    Some(edges) => edges,
                    None => {
                        blank = self.blank();
                        &blank
                    }
                };
                DynamicImage::ImageRgb8(self.artistic_mask(landmarks, edges)?)
            }
        })
    }

    /// All three masks, plus the debug image when a source image is given.
    /// Without a source image the edge map is blank.
    pub fn generate(&self, landmarks: &LandmarkSet, source: Option<&RgbImage>) -> Result<MaskSet> {
        if let Some(image) = source {
            self.check_dimensions(image.width(), image.height())?;
        }
        let edges = match source {
            Some(image) => detect_edges(&DynamicImage::ImageRgb8(image.clone()).to_luma8()),
            None => self.blank(),
        };

        let hull = self.convex_hull_mask(landmarks);
        let artistic = compose_artistic(&hull, &edges)?;
        let debug = source.map(|image| {
            let contours = shift_contours(&region_contours(self.regions, landmarks), &self.offsets);
            render_debug_image(image, landmarks, &contours)
        });

        Ok(MaskSet {
            outline: self.face_outline_mask(landmarks),
            hull,
            artistic,
            debug,
        })
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if (width, height) != (self.dims.width, self.dims.height) {
            return Err(Error::DimensionMismatch {
                expected_width: self.dims.width,
                expected_height: self.dims.height,
                actual_width: width,
                actual_height: height,
            });
        }
        Ok(())
    }
}

/// The masks produced for one face.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSet {
    pub hull: GrayImage,
    pub outline: GrayImage,
    pub artistic: RgbImage,
    pub debug: Option<RgbImage>,
}

impl MaskSet {
    /// `(name, image)` pairs: `{base}_mask_hull`, `{base}_mask_outline`,
    /// `{base}_mask_artistic` and, if rendered, `{base}_debug`.
    pub fn named(&self, base: &str) -> Vec<(String, DynamicImage)> {
        let mut named = vec![
            (
                format!("{base}_{}", MaskStrategy::ConvexHull.suffix()),
                DynamicImage::ImageLuma8(self.hull.clone()),
            ),
            (
                format!("{base}_{}", MaskStrategy::FaceOutline.suffix()),
                DynamicImage::ImageLuma8(self.outline.clone()),
            ),
            (
                format!("{base}_{}", MaskStrategy::Artistic.suffix()),
                DynamicImage::ImageRgb8(self.artistic.clone()),
            ),
        ];
        if let Some(debug) = &self.debug {
            named.push((format!("{base}_debug"), DynamicImage::ImageRgb8(debug.clone())));
        }
        named
    }
}

/// The source image with landmarks dotted and region contours outlined.
pub fn render_debug_image(
    source: &RgbImage,
    landmarks: &LandmarkSet,
    contours: &BTreeMap<Region, Vec<Pixel>>,
) -> RgbImage {
    let mut canvas = source.clone();
    for p in landmarks.pixels() {
        draw_filled_circle_mut(&mut canvas, (p.x, p.y), 1, DEBUG_LANDMARK);
    }

    for (i, points) in contours.values().enumerate() {
        if points.len() < 2 {
            continue;
        }
        let color = DEBUG_PALETTE[i % DEBUG_PALETTE.len()];
        for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            );
        }
    }
    canvas
}

/// Number of set cells in a mask.
pub fn mask_area(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] == MASK_ON).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::{FACE_MESH468_REGIONS, IBUG68_REGIONS};

    fn px(coords: &[(i32, i32)]) -> Vec<Pixel> {
        coords.iter().map(|&(x, y)| Pixel::new(x, y)).collect()
    }

    fn generator(map: &'static RegionIndexMap) -> MaskGenerator {
        MaskGenerator::new(map, ImageDimensions::new(64, 48))
    }

    #[test]
    fn hull_mask_is_binary_and_covers_interior() {
        let pts = px(&[(10, 10), (50, 10), (50, 40), (10, 40), (30, 25)]);
        let mask = generator(&IBUG68_REGIONS).hull_mask(&pts);
        assert_eq!(mask.dimensions(), (64, 48));
        assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(mask.get_pixel(30, 25)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.get_pixel(60, 45)[0], 0);
        assert!(mask_area(&mask) > 1000);
    }

    #[test]
    fn collinear_hull_degenerates_to_line() {
        let pts = px(&[(5, 5), (10, 10), (20, 20)]);
        let mask = generator(&IBUG68_REGIONS).hull_mask(&pts);
        let area = mask_area(&mask);
        assert!(area > 0);
        assert!(area < 64);

        let single = generator(&IBUG68_REGIONS).hull_mask(&px(&[(3, 4), (3, 4)]));
        assert_eq!(mask_area(&single), 1);
        assert_eq!(single.get_pixel(3, 4)[0], 255);

        let none = generator(&IBUG68_REGIONS).hull_mask(&[]);
        assert_eq!(mask_area(&none), 0);
    }

    #[test]
    fn points_outside_image_are_clipped() {
        let pts = px(&[(-20, -20), (100, -20), (100, 100), (-20, 100)]);
        let mask = generator(&IBUG68_REGIONS).hull_mask(&pts);
        assert_eq!(mask_area(&mask), 64 * 48);
    }

    #[test]
    fn outline_falls_back_to_hull() {
        // 68 points cannot resolve the 468-point face oval.
        let set = LandmarkSet::from_coords(
            &(0..68)
                .map(|i| [8 + (i % 10) * 4, 6 + (i / 10) * 5])
                .collect::<Vec<_>>(),
        );
        let gen = generator(&FACE_MESH468_REGIONS);
        assert_eq!(gen.face_outline_mask(&set), gen.convex_hull_mask(&set));

        let empty = gen.with_fallback(OutlineFallback::Empty).face_outline_mask(&set);
        assert_eq!(mask_area(&empty), 0);
    }

    #[test]
    fn outline_mask_follows_jaw_line() {
        let mut coords = vec![[0, 0]; 68];
        let jaw = [
            (10, 5), (10, 15), (10, 25), (12, 35), (15, 40), (20, 43), (25, 44), (30, 45), (32, 45),
            (34, 45), (39, 44), (44, 43), (49, 40), (52, 35), (54, 25), (54, 15), (54, 5),
        ];
        for (i, &(x, y)) in jaw.iter().enumerate() {
            coords[i] = [x, y];
        }
        // Remaining points above the jaw so the hull is larger.
        for c in coords.iter_mut().skip(17) {
            *c = [32, 2];
        }
        let set = LandmarkSet::from_coords(&coords);
        let gen = generator(&IBUG68_REGIONS);
        let outline = gen.face_outline_mask(&set);
        let hull = gen.convex_hull_mask(&set);
        assert_eq!(outline.get_pixel(32, 30)[0], 255);
        assert!(mask_area(&outline) < mask_area(&hull));
    }

    #[test]
    fn artistic_channels() {
        let mut mask = GrayImage::new(32, 32);
        fill_polygon(&mut mask, &px(&[(8, 8), (24, 8), (24, 24), (8, 24)]));
        let edges = GrayImage::from_fn(32, 32, |x, _| if x == 16 || x == 2 { Luma([255]) } else { Luma([0]) });

        let art = compose_artistic(&mask, &edges).unwrap();
        // Edge inside the mask survives in red and blue.
        assert_eq!(art.get_pixel(16, 16)[0], 255);
        assert_eq!(art.get_pixel(16, 16)[2], 255);
        // Edge outside the mask is dropped.
        assert_eq!(art.get_pixel(2, 16)[0], 0);
        // Green saturates inside the mask and glows just outside it.
        assert_eq!(art.get_pixel(16, 16)[1], 255);
        assert!(art.get_pixel(6, 16)[1] > 0);
        assert_eq!(art.get_pixel(0, 0)[1], 0);
    }

    #[test]
    fn mask_by_strategy() {
        let set = LandmarkSet::from_coords(&(0..68).map(|i| [10 + i % 40, 5 + i / 2]).collect::<Vec<_>>());
        let gen = generator(&IBUG68_REGIONS);

        let hull = gen.mask(MaskStrategy::ConvexHull, &set, None).unwrap();
        assert_eq!(hull.as_luma8(), Some(&gen.convex_hull_mask(&set)));

        let art = gen.mask(MaskStrategy::Artistic, &set, None).unwrap();
        let art = art.as_rgb8().unwrap();
        // No edges: red and blue stay dark
        assert!(art.pixels().all(|p| p[0] == 0 && p[2] == 0));

        let bad_edges = GrayImage::new(3, 3);
        assert!(gen.mask(MaskStrategy::Artistic, &set, Some(&bad_edges)).is_err());
    }

    #[test]
    fn artistic_rejects_mismatched_edges() {
        let err = compose_artistic(&GrayImage::new(10, 10), &GrayImage::new(8, 10)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { actual_width: 8, .. }));
    }

    #[test]
    fn contours_for_short_sets_are_empty() {
        let set = LandmarkSet::from_coords(&vec![[1, 2]; 42]);
        let contours = region_contours(&IBUG68_REGIONS, &set);
        assert_eq!(contours.len(), 8);
        assert!(contours[&Region::LeftEye].is_empty());
        assert_eq!(contours[&Region::RightEye].len(), 6);
        assert_eq!(contours[&Region::FaceOutline].len(), 17);
    }

    #[test]
    fn offsets_move_only_their_regions() {
        let set = LandmarkSet::from_coords(&vec![[10, 10]; 68]);
        let contours = region_contours(&IBUG68_REGIONS, &set);
        let offsets = ManualOffsets {
            mouth_offset_x: 2,
            mouth_offset_y: -3,
            eye_offset_y: 4,
        };
        let shifted = shift_contours(&contours, &offsets);
        assert_eq!(shifted[&Region::MouthOuter][0], Pixel::new(12, 7));
        assert_eq!(shifted[&Region::LeftEye][0], Pixel::new(10, 14));
        assert_eq!(shifted[&Region::Nose][0], Pixel::new(10, 10));
        // Input untouched
        assert_eq!(contours[&Region::MouthOuter][0], Pixel::new(10, 10));
    }

    #[test]
    fn generate_checks_source_size() {
        let set = LandmarkSet::from_coords(&vec![[10, 10]; 68]);
        let gen = generator(&IBUG68_REGIONS);
        let wrong = RgbImage::new(10, 10);
        assert!(matches!(
            gen.generate(&set, Some(&wrong)),
            Err(Error::DimensionMismatch { .. })
        ));

        let masks = gen.generate(&set, Some(&RgbImage::new(64, 48))).unwrap();
        let names: Vec<String> = masks.named("face").into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            ["face_mask_hull", "face_mask_outline", "face_mask_artistic", "face_debug"]
        );

        let without_source = gen.generate(&set, None).unwrap();
        assert!(without_source.debug.is_none());
        assert_eq!(without_source.named("x").len(), 3);
    }

    #[test]
    fn debug_image_marks_landmarks() {
        let set = LandmarkSet::from_coords(&vec![[20, 20]; 68]);
        let source = RgbImage::new(64, 48);
        let contours = region_contours(&IBUG68_REGIONS, &set);
        let debug = render_debug_image(&source, &set, &contours);
        assert_eq!(debug.dimensions(), (64, 48));
        assert_ne!(debug.get_pixel(20, 20), &Rgb([0, 0, 0]));
        assert_eq!(debug.get_pixel(50, 5), &Rgb([0, 0, 0]));
    }
}

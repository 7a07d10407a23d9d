//! CLI for landmark-based facial state analysis.
//!
//! Usage:
//!   face-state landmarks.json                          # Human-readable output
//!   face-state landmarks.json --json                   # JSON record
//!   face-state landmarks.json -o result.json           # Save to file
//!   face-state landmarks.json --image face.png --masks out/

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use face_state::logging::{init_tracing, LogConfig};
use face_state::{AnalysisConfig, AnalysisResult, FaceAnalyzer, ImageDimensions, LandmarkModel, LandmarkSet};
use serde::Deserialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "face-state")]
#[command(author, version, about = "Facial state analysis from landmarks", long_about = None)]
struct Args {
    /// Landmarks JSON: {"landmarks": [[x, y], ...], "width": W, "height": H}
    #[arg(required = true)]
    landmarks: PathBuf,

    /// Source image; supplies dimensions, edges and the debug overlay
    #[arg(long)]
    image: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory to write mask PNGs into
    #[arg(long)]
    masks: Option<PathBuf>,

    /// Base name for mask files
    #[arg(long, default_value = "face")]
    name: String,

    /// Analysis configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Landmark scheme (ibug68, face_mesh468); inferred from the point count if omitted
    #[arg(long)]
    model: Option<String>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Deserialize)]
struct LandmarkFile {
    landmarks: Vec<[i32; 2]>,
    width: Option<u32>,
    height: Option<u32>,
}

fn main() {
    let args = Args::parse();
    init_tracing(&LogConfig::verbose(args.verbose));

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input: LandmarkFile = serde_json::from_reader(BufReader::new(File::open(&args.landmarks)?))?;
    let landmarks = LandmarkSet::from(input.landmarks);

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    config.model = select_model(
        args.model.as_deref(),
        args.config.is_some().then_some(config.model),
        landmarks.len(),
    )?;
    let analyzer = FaceAnalyzer::new(config)?;

    let source = match &args.image {
        Some(path) => {
            info!(path = %path.display(), "loading image");
            Some(image::open(path)?.to_rgb8())
        }
        None => None,
    };
    let dims = match (&source, input.width, input.height) {
        (Some(img), _, _) => ImageDimensions::new(img.width(), img.height()),
        (None, Some(w), Some(h)) => ImageDimensions::new(w, h),
        (None, _, _) => return Err("image dimensions missing: pass --image or set width/height".into()),
    };

    let result = analyzer.analyze(&landmarks, dims)?;

    if let Some(dir) = &args.masks {
        write_masks(&analyzer, &landmarks, dims, source.as_ref(), dir, &args.name)?;
    }

    let output_str = if args.json {
        serde_json::to_string_pretty(&result)?
    } else {
        format_human_readable(&result)
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!(path = %path.display(), "output written");
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

/// An explicit `--model` wins, then the configured model, then a guess from
/// the point count. Counts matching no scheme use the default model so the
/// record reports the feature error instead of aborting.
fn select_model(
    requested: Option<&str>,
    configured: Option<LandmarkModel>,
    point_count: usize,
) -> face_state::Result<LandmarkModel> {
    match (requested, configured) {
        (Some(name), _) => name.parse(),
        (None, Some(model)) => Ok(model),
        (None, None) => Ok(LandmarkModel::from_point_count(point_count)
            .unwrap_or(AnalysisConfig::default().model)),
    }
}

fn write_masks(
    analyzer: &FaceAnalyzer,
    landmarks: &LandmarkSet,
    dims: ImageDimensions,
    source: Option<&image::RgbImage>,
    dir: &Path,
    base: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let masks = analyzer.masks(landmarks, dims, source)?;
    for (name, img) in masks.named(base) {
        let path = dir.join(format!("{name}.png"));
        img.save(&path)?;
        info!(path = %path.display(), "mask written");
    }
    Ok(())
}

fn format_human_readable(result: &AnalysisResult) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "Landmarks: {} points ({}x{} image)\n",
        result.landmarks_count, result.image_dimensions.width, result.image_dimensions.height
    ));

    let anim = &result.animation.facial_animation;
    match result.features.block() {
        None => {
            s.push_str(&format!("\nFeatures unavailable: {}\n", result.features.error().unwrap_or("unknown")));
        }
        Some(block) => {
            s.push_str("\nEyes:\n");
            s.push_str(&format!(
                "  Openness: L {:.3}, R {:.3}, avg {}\n",
                block.eyes.left_openness,
                block.eyes.right_openness,
                block
                    .eyes
                    .average_openness
                    .map_or("n/a".to_string(), |v| format!("{v:.3}"))
            ));
            s.push_str(&format!("  Blinking: {}\n", block.eyes.is_blinking));

            s.push_str("\nMouth:\n");
            s.push_str(&format!("  Aspect ratio: {:.3}\n", block.mouth.aspect_ratio));
            s.push_str(&format!("  Curvature:    {:.1}\n", block.mouth.curvature));
            s.push_str(&format!("  Open:         {}\n", block.mouth.is_open));

            s.push_str("\nEmotion scores:\n");
            for (emotion, score) in block.emotion.scores.iter() {
                s.push_str(&format!("  {:<10} {:.3}\n", emotion.name(), score));
            }
        }
    }

    s.push_str("\nAnimation:\n");
    s.push_str(&format!("  Emotion:        {} ({:.2})\n", anim.emotion.current, anim.emotion.intensity));
    s.push_str(&format!("  Eye openness:   {:.2}\n", anim.eye_openness));
    s.push_str(&format!("  Mouth openness: {:.2}\n", anim.mouth_openness));
    for (name, weight) in &anim.expression_weights {
        s.push_str(&format!("  {:<14}  {:.2}\n", format!("{name}:"), weight));
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_guessed_from_point_count() {
        assert_eq!(select_model(None, None, 68).unwrap(), LandmarkModel::Ibug68);
        assert_eq!(select_model(None, None, 468).unwrap(), LandmarkModel::FaceMesh468);
    }

    #[test]
    fn unrecognized_count_falls_back_to_default_model() {
        let model = select_model(None, None, 10).unwrap();
        assert_eq!(model, AnalysisConfig::default().model);

        let analyzer = FaceAnalyzer::new(AnalysisConfig::for_model(model)).unwrap();
        let landmarks = LandmarkSet::from_coords(&[[10, 10]; 10]);
        let result = analyzer
            .analyze(&landmarks, ImageDimensions::new(64, 64))
            .unwrap();
        assert!(result.features.error().is_some());
    }

    #[test]
    fn explicit_and_configured_models_win() {
        assert_eq!(
            select_model(Some("ibug68"), Some(LandmarkModel::FaceMesh468), 468).unwrap(),
            LandmarkModel::Ibug68
        );
        assert_eq!(
            select_model(None, Some(LandmarkModel::Ibug68), 468).unwrap(),
            LandmarkModel::Ibug68
        );
        assert!(select_model(Some("ibug81"), None, 68).is_err());
    }
}

//! CLI that replays recorded detector output through the identity flow.
//!
//! Usage:
//!   see-some-id <frames.json>                         # Human-readable output
//!   see-some-id <frames.json> --json                  # JSON output
//!   see-some-id <frames.json> --render out/           # One PNG overlay per frame
//!   see-some-id <frames.json> --reference ref.bin     # Skip card capture
//!
//! A frames file is a JSON array; each entry is one analyzed frame:
//! `{"faces": [...], "texts": [...], "confirm": true}`. `confirm` presses the
//! confirmation button after the frame is analyzed; `end` stops the session.

use clap::Parser;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{self, Blend};
use imageproc::rect::Rect;
use see_some_id::{
    EngineConfig, Error, FaceObservation, Frame, OverlayShape, Phase, PixelRect, Point,
    SessionState, SharedSession, ViewSize,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "see-some-id")]
#[command(author, version, about = "Replay face detections through the ID-card face match flow", long_about = None)]
struct Args {
    /// Frames file (JSON array of detector frames)
    #[arg(required = true)]
    frames: PathBuf,

    /// View width in pixels
    #[arg(long, default_value = "1000")]
    width: u32,

    /// View height in pixels
    #[arg(long, default_value = "1000")]
    height: u32,

    /// Engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in face capture using a saved reference snapshot
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Save the captured reference snapshot here
    #[arg(long)]
    save_reference: Option<PathBuf>,

    /// Write one overlay PNG per frame into this directory
    #[arg(long)]
    render: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One entry of the frames file.
#[derive(Deserialize)]
struct ScriptFrame {
    #[serde(flatten)]
    frame: Frame,

    #[serde(default)]
    confirm: bool,

    #[serde(default)]
    end: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    frames_file: String,
    width: u32,
    height: u32,
    frames: Vec<FrameReport>,
    final_phase: Phase,
}

#[derive(Serialize)]
struct FrameReport {
    /// Frame index (1-based)
    index: usize,
    phase: Phase,
    faces: usize,
    shapes: usize,
    score: Option<f32>,
    matched: Option<bool>,
    confirmed: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let state = match &args.reference {
        Some(path) => {
            info!(path = %path.display(), "loading reference snapshot");
            SessionState::with_reference(FaceObservation::load(path)?)
        }
        None => SessionState::new(),
    };
    let session = SharedSession::new(state);

    let script: Vec<ScriptFrame> = serde_json::from_reader(BufReader::new(File::open(&args.frames)?))?;
    info!(frames = script.len(), "loaded frames");

    if let Some(dir) = &args.render {
        std::fs::create_dir_all(dir)?;
    }

    let view = ViewSize::new(args.width as f32, args.height as f32);
    let mut reports = Vec::with_capacity(script.len());

    for (i, entry) in script.iter().enumerate() {
        let phase = session.phase();
        let output = session.process_frame(&entry.frame, view, &config);

        if let Some(dir) = &args.render {
            let path = dir.join(format!("frame_{:04}.png", i + 1));
            render_overlay(&output.shapes, args.width, args.height).save(&path)?;
        }

        let mut confirmed = false;
        if entry.confirm {
            match session.confirm(&entry.frame.faces) {
                Ok(()) => confirmed = true,
                Err(
                    e @ (Error::ConfirmationUnavailable { .. }
                    | Error::ReferenceWithoutLandmarks
                    | Error::InvalidTransition { .. }),
                ) => {
                    warn!(frame = i + 1, "{}", e)
                }
                Err(e) => return Err(e.into()),
            }
        }
        if entry.end {
            session.end();
        }

        reports.push(FrameReport {
            index: i + 1,
            phase,
            faces: entry.frame.faces.len(),
            shapes: output.shapes.len(),
            score: output.decision.map(|d| d.score),
            matched: output.decision.map(|d| d.matched),
            confirmed,
        });
    }

    let final_state = session.snapshot();
    if let Some(path) = &args.save_reference {
        save_reference(&final_state, path)?;
    }

    let output = Output {
        frames_file: args.frames.display().to_string(),
        width: args.width,
        height: args.height,
        frames: reports,
        final_phase: final_state.phase(),
    };

    // Generate output
    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };

    // Write output
    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!(path = %path.display(), "output written");
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn save_reference(state: &SessionState, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match state.reference() {
        Some(reference) => {
            reference.save(path)?;
            info!(path = %path.display(), "reference snapshot saved");
        }
        None => warn!("no reference captured; nothing saved"),
    }
    Ok(())
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "Frames: {} ({} analyzed, view {}x{})\n",
        output.frames_file,
        output.frames.len(),
        output.width,
        output.height
    ));

    for frame in &output.frames {
        s.push_str(&format!(
            "Frame {:>4} [{}] faces: {}, shapes: {}",
            frame.index, frame.phase, frame.faces, frame.shapes
        ));
        match (frame.score, frame.matched) {
            (Some(score), Some(matched)) => s.push_str(&format!(
                ", score: {:.4} ({})",
                score,
                if matched { "match" } else { "no match" }
            )),
            _ => s.push_str(", no comparison"),
        }
        if frame.confirmed {
            s.push_str(", reference captured");
        }
        s.push('\n');
    }

    s.push_str(&format!("\nFinal phase: {}\n", output.final_phase));
    s
}

// Drawing helpers

fn render_overlay(shapes: &[OverlayShape], width: u32, height: u32) -> RgbaImage {
    let mut canvas = Blend(RgbaImage::from_pixel(width, height, Rgba([32, 32, 32, 255])));

    for shape in shapes {
        let style = shape.style();
        if let (OverlayShape::AlertBanner { rect, .. }, Some(fill)) = (shape, style.fill) {
            if let Some(rect) = to_rect(rect) {
                drawing::draw_filled_rect_mut(&mut canvas, rect, with_opacity(fill, style.opacity));
            }
            continue;
        }

        let color = with_opacity(style.stroke, style.opacity);
        for (a, b) in shape.segments() {
            draw_stroke(&mut canvas, a, b, style.line_width, color);
        }
    }

    canvas.0
}

fn with_opacity(color: see_some_id::Rgba, opacity: f32) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    Rgba([r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8])
}

fn to_rect(rect: &PixelRect) -> Option<Rect> {
    let width = rect.width.round() as i64;
    let height = rect.height.round() as i64;
    if width <= 0 || height <= 0 {
        return None;
    }
    Some(Rect::at(rect.x.round() as i32, rect.y.round() as i32).of_size(width as u32, height as u32))
}

/// A segment `width` pixels wide, drawn as parallel one-pixel lines.
fn draw_stroke(canvas: &mut Blend<RgbaImage>, a: Point, b: Point, width: f32, color: Rgba<u8>) {
    let strokes = width.round().max(1.0) as i32;
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if len > 0.0 { (-dy / len, dx / len) } else { (0.0, 0.0) };

    for i in 0..strokes {
        let offset = i as f32 - (strokes - 1) as f32 / 2.0;
        drawing::draw_line_segment_mut(
            canvas,
            (a.x + nx * offset, a.y + ny * offset),
            (b.x + nx * offset, b.y + ny * offset),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use see_some_id::Style;

    const BACKGROUND: Rgba<u8> = Rgba([32, 32, 32, 255]);

    fn face_box(line_width: f32, opacity: f32) -> OverlayShape {
        OverlayShape::FaceBox {
            rect: PixelRect::new(10.0, 10.0, 20.0, 20.0),
            style: Style {
                line_width,
                opacity,
                ..Style::DETECTION
            },
        }
    }

    fn painted(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| **p != BACKGROUND).count()
    }

    #[test]
    fn stroke_width_is_honored() {
        let thin = render_overlay(&[face_box(1.0, 1.0)], 50, 50);
        let thick = render_overlay(&[face_box(3.0, 1.0)], 50, 50);
        assert!(painted(&thin) > 0);
        assert!(painted(&thick) > painted(&thin));
    }

    #[test]
    fn opacity_blends_with_background() {
        let opaque = render_overlay(&[face_box(1.0, 1.0)], 50, 50);
        assert!(opaque.pixels().any(|p| *p == Rgba([255, 255, 0, 255])));

        let translucent = render_overlay(&[face_box(1.0, 0.75)], 50, 50);
        assert!(painted(&translucent) > 0);
        assert!(translucent.pixels().all(|p| *p != Rgba([255, 255, 0, 255])));
    }

    #[test]
    fn banner_is_filled() {
        let banner = OverlayShape::AlertBanner {
            rect: PixelRect::new(5.0, 5.0, 30.0, 10.0),
            message: "ok".into(),
            style: Style::BANNER,
        };
        let img = render_overlay(&[banner], 50, 50);
        assert_ne!(*img.get_pixel(20, 10), BACKGROUND);
        assert_eq!(*img.get_pixel(20, 30), BACKGROUND);
    }

    #[test]
    fn degenerate_rect_is_skipped() {
        assert!(to_rect(&PixelRect::new(0.0, 0.0, 0.0, 10.0)).is_none());
        assert!(to_rect(&PixelRect::new(0.0, 0.0, 4.0, 3.0)).is_some());
    }
}

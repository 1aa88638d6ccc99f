//! Per-frame overlay descriptors.
//!
//! The builder turns one frame of detector output into the full list of shapes
//! to draw, in back-to-front order. Nothing is carried between frames; the
//! renderer replaces whatever it drew for the previous frame.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::landmarks::{FaceLandmarks, FaceObservation, Frame, LandmarkRegion};
use crate::mapper::{guide_box, rect_contains, to_frame_point, to_pixel_rect};
use crate::session::Phase;
use crate::types::{PixelRect, Point, ViewSize};

const CAPTION_HEIGHT: f32 = 25.0;
const CAPTION_INSET: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const YELLOW: Rgba = Rgba([255, 255, 0, 255]);
    pub const GREEN: Rgba = Rgba([0, 255, 0, 255]);
    pub const RED: Rgba = Rgba([255, 0, 0, 255]);
}

/// How a shape should be stroked and filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke: Rgba,
    pub fill: Option<Rgba>,
    pub line_width: f32,
    pub opacity: f32,
    pub corner_radius: f32,
}

impl Style {
    pub const GUIDE: Style = Style {
        stroke: Rgba::WHITE,
        fill: None,
        line_width: 3.0,
        opacity: 0.75,
        corner_radius: 10.0,
    };

    pub const DETECTION: Style = Style {
        stroke: Rgba::YELLOW,
        fill: None,
        line_width: 2.0,
        opacity: 0.75,
        corner_radius: 10.0,
    };

    pub const BANNER: Style = Style {
        stroke: Rgba::GREEN,
        fill: Some(Rgba::GREEN),
        line_width: 0.0,
        opacity: 0.9,
        corner_radius: 10.0,
    };

    pub fn landmark(role: LandmarkRole, line_width: f32) -> Style {
        Style {
            stroke: match role {
                LandmarkRole::Live => Rgba::GREEN,
                LandmarkRole::Reference => Rgba::RED,
            },
            fill: None,
            line_width,
            opacity: 1.0,
            corner_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GuideKind {
    /// ID-card shaped box shown while capturing the card.
    Card,
    /// Square box shown while capturing the live face.
    Face,
}

/// Whose landmarks a polyline traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LandmarkRole {
    Live,
    Reference,
}

/// A renderable primitive in view pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OverlayShape {
    GuideBox {
        guide: GuideKind,
        rect: PixelRect,
        caption: String,
        caption_rect: PixelRect,
        style: Style,
    },
    /// A detected text region lying on the card.
    CardBox { rect: PixelRect, style: Style },
    FaceBox { rect: PixelRect, style: Style },
    LandmarkPolyline {
        region: LandmarkRegion,
        role: LandmarkRole,
        points: Vec<Point>,
        closed: bool,
        style: Style,
    },
    AlertBanner {
        rect: PixelRect,
        message: String,
        style: Style,
    },
}

impl OverlayShape {
    pub fn style(&self) -> &Style {
        match self {
            OverlayShape::GuideBox { style, .. }
            | OverlayShape::CardBox { style, .. }
            | OverlayShape::FaceBox { style, .. }
            | OverlayShape::LandmarkPolyline { style, .. }
            | OverlayShape::AlertBanner { style, .. } => style,
        }
    }

    /// Line segments to stroke. Boxes yield their four edges; closed
    /// polylines include the segment from the last point back to the first.
    pub fn segments(&self) -> Vec<(Point, Point)> {
        match self {
            OverlayShape::GuideBox { rect, .. }
            | OverlayShape::CardBox { rect, .. }
            | OverlayShape::FaceBox { rect, .. }
            | OverlayShape::AlertBanner { rect, .. } => rect_segments(rect),
            OverlayShape::LandmarkPolyline { points, closed, .. } => {
                let mut segments: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
                if *closed && points.len() > 2 {
                    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                        segments.push((last, first));
                    }
                }
                segments
            }
        }
    }
}

fn rect_segments(rect: &PixelRect) -> Vec<(Point, Point)> {
    let tl = Point::new(rect.x, rect.y);
    let tr = Point::new(rect.max_x(), rect.y);
    let br = Point::new(rect.max_x(), rect.max_y());
    let bl = Point::new(rect.x, rect.max_y());
    vec![(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

/// Inputs for building one frame's overlay.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRequest<'a> {
    pub phase: Phase,
    pub frame: &'a Frame,
    pub reference: Option<&'a FaceObservation>,
    /// Whether the matcher accepted this frame's face.
    pub matched: bool,
    pub view: ViewSize,
}

/// Builds the overlay shape list for a frame.
#[derive(Debug, Clone, Copy)]
pub struct OverlayBuilder<'a> {
    config: &'a EngineConfig,
}

impl<'a> OverlayBuilder<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, request: &OverlayRequest<'_>) -> Vec<OverlayShape> {
        let mut shapes = Vec::new();

        match request.phase {
            Phase::CapturingCard => self.build_card_phase(request, &mut shapes),
            Phase::CapturingFace | Phase::Matched => self.build_face_phase(request, &mut shapes),
            Phase::SessionEnded => {}
        }

        debug!(
            phase = %request.phase,
            faces = request.frame.faces.len(),
            texts = request.frame.texts.len(),
            shapes = shapes.len(),
            "built overlay"
        );
        shapes
    }

    /// Guide box for the given phase kind.
    pub fn guide_rect(&self, guide: GuideKind, view: ViewSize) -> PixelRect {
        let aspect = match guide {
            GuideKind::Card => self.config.card_aspect_ratio,
            GuideKind::Face => 1.0,
        };
        guide_box(view, self.config.guide_width_fraction, aspect)
    }

    fn build_card_phase(&self, request: &OverlayRequest<'_>, shapes: &mut Vec<OverlayShape>) {
        let card = self.guide_rect(GuideKind::Card, request.view);
        shapes.push(self.guide_shape(GuideKind::Card, card, &self.config.card_caption));

        for text in &request.frame.texts {
            let rect = to_pixel_rect(*text, request.view);
            if rect_contains(&card, &rect) {
                shapes.push(OverlayShape::CardBox {
                    rect,
                    style: Style::DETECTION,
                });
            }
        }

        for face in &request.frame.faces {
            shapes.push(OverlayShape::FaceBox {
                rect: to_pixel_rect(face.bounding_box, request.view),
                style: Style::DETECTION,
            });
        }
    }

    fn build_face_phase(&self, request: &OverlayRequest<'_>, shapes: &mut Vec<OverlayShape>) {
        let guide = self.guide_rect(GuideKind::Face, request.view);
        shapes.push(self.guide_shape(GuideKind::Face, guide, &self.config.face_caption));

        for face in &request.frame.faces {
            let face_rect = to_pixel_rect(face.bounding_box, request.view);
            shapes.push(OverlayShape::FaceBox {
                rect: face_rect,
                style: Style::DETECTION,
            });

            match &face.landmarks {
                Some(landmarks) => {
                    self.push_polylines(landmarks, LandmarkRole::Live, &face_rect, shapes)
                }
                None => warn!("face observation has no landmarks; drawing box only"),
            }

            if let Some(reference) = request.reference.and_then(|r| r.landmarks.as_ref()) {
                self.push_polylines(reference, LandmarkRole::Reference, &face_rect, shapes);
            }
        }

        if request.matched {
            shapes.push(OverlayShape::AlertBanner {
                rect: PixelRect::new(
                    guide.x,
                    0.05 * request.view.height,
                    guide.width,
                    self.config.banner_height,
                ),
                message: self.config.banner_message.clone(),
                style: Style::BANNER,
            });
        }
    }

    fn guide_shape(&self, guide: GuideKind, rect: PixelRect, caption: &str) -> OverlayShape {
        OverlayShape::GuideBox {
            guide,
            rect,
            caption: caption.to_string(),
            caption_rect: PixelRect::new(
                rect.x + CAPTION_INSET,
                rect.max_y(),
                rect.width,
                CAPTION_HEIGHT,
            ),
            style: Style::GUIDE,
        }
    }

    /// One polyline per present region, projected into `face_rect`.
    fn push_polylines(
        &self,
        landmarks: &FaceLandmarks,
        role: LandmarkRole,
        face_rect: &PixelRect,
        shapes: &mut Vec<OverlayShape>,
    ) {
        let style = Style::landmark(role, self.config.landmark_line_width * face_rect.width);
        for (region, points) in landmarks.regions() {
            shapes.push(OverlayShape::LandmarkPolyline {
                region,
                role,
                points: points.iter().map(|p| to_frame_point(*p, face_rect)).collect(),
                closed: region.is_closed(),
                style,
            });
        }
    }
}

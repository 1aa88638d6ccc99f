//! # see-some-id
//!
//! Landmark-based face matching and overlay geometry for an identity check:
//! the user shows an ID card, the face on it is captured as a reference, and
//! live faces from a front camera are compared against it.
//!
//! This crate provides:
//! - **Landmark Model**: named facial regions and the concatenated point set
//! - **Coordinate Mapping**: detector space (normalized, bottom-left origin)
//!   to view pixels (top-left origin)
//! - **Matching**: sum of squared landmark distances against a fixed threshold
//! - **Overlays**: per-frame shape lists (guide box, card text boxes, face
//!   boxes, landmark polylines, match banner) for a renderer to draw
//! - **Session**: the card -> face -> matched flow and its shared state
//!
//! Camera control, detection and drawing belong to the caller, which feeds
//! one [`Frame`] per analyzed camera frame.
//!
//! ## Quick Start
//!
//! ```rust
//! use see_some_id::{
//!     EngineConfig, FaceLandmarks, FaceObservation, Frame, LandmarkRegion, NormalizedRect,
//!     Phase, Point, SharedSession, ViewSize,
//! };
//!
//! let face = FaceObservation::new(
//!     NormalizedRect::new(0.3, 0.3, 0.4, 0.4),
//!     FaceLandmarks::from_regions(vec![(
//!         LandmarkRegion::FaceContour,
//!         vec![Point::new(0.1, 0.6), Point::new(0.5, 0.1), Point::new(0.9, 0.6)],
//!     )]),
//! );
//! let frame = Frame { faces: vec![face], texts: vec![] };
//! let config = EngineConfig::default();
//! let view = ViewSize::new(1080.0, 1920.0);
//!
//! let session = SharedSession::default();
//! session.confirm(&frame.faces).unwrap();
//!
//! let output = session.process_frame(&frame, view, &config);
//! assert!(output.matched());
//! assert_eq!(session.phase(), Phase::Matched);
//! ```

mod config;
mod error;
mod landmarks;
pub mod mapper;
pub mod matcher;
mod overlay;
mod session;
mod types;

pub use config::{EngineConfig, CARD_ASPECT_RATIO};
pub use error::{ComparisonGap, Error, Result};
pub use landmarks::{FaceLandmarks, FaceObservation, Frame, LandmarkRegion};
pub use matcher::{is_match, score, MatchDecision, Matcher, MATCH_THRESHOLD};
pub use overlay::{
    GuideKind, LandmarkRole, OverlayBuilder, OverlayRequest, OverlayShape, Rgba, Style,
};
pub use session::{analyze_frame, FrameOutput, Phase, SessionState, SharedSession};
pub use types::{NormalizedRect, PixelRect, Point, ViewSize};

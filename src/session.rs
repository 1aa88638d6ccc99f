//! Capture flow state and per-frame analysis.
//!
//! A session moves `CapturingCard -> CapturingFace -> Matched`, and can be
//! ended from any of those. Going back to card capture requires a reset.
//!
//! [`analyze_frame`] is pure and may run on any thread. [`SharedSession`] is
//! the single-writer handle: confirmation, match recording and reset take the
//! write lock, frame analysis only reads a snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::landmarks::{FaceObservation, Frame};
use crate::matcher::{MatchDecision, Matcher};
use crate::overlay::{OverlayBuilder, OverlayRequest, OverlayShape};
use crate::types::ViewSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    CapturingCard,
    CapturingFace,
    Matched,
    SessionEnded,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::CapturingCard => "capturing card",
            Phase::CapturingFace => "capturing face",
            Phase::Matched => "matched",
            Phase::SessionEnded => "session ended",
        };
        f.write_str(name)
    }
}

/// Phase plus the reference snapshot taken at confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: Phase,
    reference: Option<Arc<FaceObservation>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::CapturingCard,
            reference: None,
        }
    }

    /// Start directly in face capture with a previously captured reference.
    pub fn with_reference(reference: FaceObservation) -> Self {
        Self {
            phase: Phase::CapturingFace,
            reference: Some(Arc::new(reference)),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reference(&self) -> Option<&FaceObservation> {
        self.reference.as_deref()
    }

    /// Whether a confirmation would be accepted for these faces.
    pub fn can_confirm(&self, faces: &[FaceObservation]) -> bool {
        self.phase == Phase::CapturingCard
            && matches!(faces, [face] if has_points(face))
    }

    /// Snapshot the sole face into the reference and move to face capture.
    pub fn confirm(&mut self, faces: &[FaceObservation]) -> Result<()> {
        if self.phase != Phase::CapturingCard {
            return Err(Error::InvalidTransition {
                from: self.phase,
                action: "confirm the reference",
            });
        }
        let [face] = faces else {
            return Err(Error::ConfirmationUnavailable { faces: faces.len() });
        };
        if !has_points(face) {
            return Err(Error::ReferenceWithoutLandmarks);
        }

        self.reference = Some(Arc::new(face.clone()));
        self.phase = Phase::CapturingFace;
        info!("reference captured, switching to face capture");
        Ok(())
    }

    pub fn record_match(&mut self) -> Result<()> {
        match self.phase {
            Phase::CapturingFace => {
                self.phase = Phase::Matched;
                info!("live face matched the reference");
                Ok(())
            }
            Phase::Matched => Ok(()),
            from => Err(Error::InvalidTransition {
                from,
                action: "record a match",
            }),
        }
    }

    /// Record a match scored against `scored`, if that snapshot was taken in
    /// face capture and its reference is still the current one.
    pub(crate) fn record_match_for(&mut self, scored: &SessionState) -> bool {
        let same_reference = match (&self.reference, &scored.reference) {
            (Some(current), Some(scored)) => Arc::ptr_eq(current, scored),
            _ => false,
        };
        if scored.phase != Phase::CapturingFace || self.phase != Phase::CapturingFace || !same_reference {
            debug!(phase = %self.phase, same_reference, "match not recorded");
            return false;
        }
        self.phase = Phase::Matched;
        info!("live face matched the reference");
        true
    }

    pub fn end(&mut self) {
        if self.phase != Phase::SessionEnded {
            info!(from = %self.phase, "session ended");
            self.phase = Phase::SessionEnded;
        }
    }

    /// Drop the reference and start over at card capture.
    pub fn reset(&mut self) {
        *self = Self::new();
        info!("session reset");
    }
}

fn has_points(face: &FaceObservation) -> bool {
    face.landmarks.as_ref().is_some_and(|l| !l.is_empty())
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of analyzing one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    pub shapes: Vec<OverlayShape>,

    /// `None` when no comparison was made this frame: wrong phase, no
    /// reference, not exactly one face, or incomparable landmarks.
    pub decision: Option<MatchDecision>,
}

impl FrameOutput {
    pub fn matched(&self) -> bool {
        self.decision.is_some_and(|d| d.matched)
    }
}

/// Score the frame's face against the reference (when one applies) and build
/// the overlay.
pub fn analyze_frame(
    state: &SessionState,
    frame: &Frame,
    view: ViewSize,
    config: &EngineConfig,
) -> FrameOutput {
    let decision = compare_to_reference(state, frame, config);
    let shapes = OverlayBuilder::new(config).build(&OverlayRequest {
        phase: state.phase(),
        frame,
        reference: state.reference(),
        matched: decision.is_some_and(|d| d.matched),
        view,
    });
    FrameOutput { shapes, decision }
}

fn compare_to_reference(
    state: &SessionState,
    frame: &Frame,
    config: &EngineConfig,
) -> Option<MatchDecision> {
    if !matches!(state.phase(), Phase::CapturingFace | Phase::Matched) {
        return None;
    }
    let reference = state.reference()?.landmarks.as_ref()?;

    let Some(face) = frame.sole_face() else {
        debug!(faces = frame.faces.len(), "skipping comparison: need exactly one face");
        return None;
    };
    let current = face.landmarks.as_ref()?;

    match Matcher::new(config.match_threshold).compare(current, reference) {
        Ok(decision) => Some(decision),
        Err(e) => {
            debug!(error = %e, "skipping comparison");
            None
        }
    }
}

/// Session state shared between the confirmation action and frame analysis.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    state: Arc<RwLock<SessionState>>,
}

impl SharedSession {
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// A consistent copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> Phase {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .phase()
    }

    pub fn confirm(&self, faces: &[FaceObservation]) -> Result<()> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .confirm(faces)
    }

    pub fn end(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .end();
    }

    pub fn reset(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }

    /// Analyze a frame against a snapshot of the state. On a match the
    /// session advances to [`Phase::Matched`], unless the reference was
    /// replaced while the frame was being analyzed.
    pub fn process_frame(&self, frame: &Frame, view: ViewSize, config: &EngineConfig) -> FrameOutput {
        let snapshot = self.snapshot();
        let output = analyze_frame(&snapshot, frame, view, config);

        if output.matched() {
            self.state
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .record_match_for(&snapshot);
        }

        output
    }
}

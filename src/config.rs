//! Tunables for matching and overlay geometry.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matcher::MATCH_THRESHOLD;

/// Standard ID-1 card width:height ratio.
pub const CARD_ASPECT_RATIO: f32 = 1.586;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A face matches the reference when its score is strictly below this.
    pub match_threshold: f32,

    /// Guide box width as a fraction of the view width.
    pub guide_width_fraction: f32,

    pub card_aspect_ratio: f32,

    /// Landmark stroke width as a fraction of the face box width.
    pub landmark_line_width: f32,

    pub banner_height: f32,
    pub banner_message: String,

    pub card_caption: String,
    pub face_caption: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: MATCH_THRESHOLD,
            guide_width_fraction: 0.9,
            card_aspect_ratio: CARD_ASPECT_RATIO,
            landmark_line_width: 0.02,
            banner_height: 40.0,
            banner_message: "Identity confirmed".into(),
            card_caption: "Fit your identity card in the box".into(),
            face_caption: "Make sure the yellow square is inside the white".into(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.match_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "match_threshold must be positive, got {}",
                self.match_threshold
            )));
        }
        if !(self.guide_width_fraction > 0.0 && self.guide_width_fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "guide_width_fraction must be in (0, 1], got {}",
                self.guide_width_fraction
            )));
        }
        if !(self.card_aspect_ratio > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "card_aspect_ratio must be positive, got {}",
                self.card_aspect_ratio
            )));
        }
        if self.landmark_line_width < 0.0 || self.banner_height < 0.0 {
            return Err(Error::InvalidConfig(
                "line width and banner height must not be negative".into(),
            ));
        }
        Ok(())
    }
}

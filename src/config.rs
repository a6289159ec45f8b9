//! Renderer configuration.
//!
//! Values come from code, from JSON through serde, or from `FOLIO_*`
//! environment variables via [`RenderConfig::from_env`].

use crate::error::PipelineError;
use folio_render_lopdf::{DEFAULT_DOTS_PER_POINT, DeviceSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DOTS_PER_PIXEL: u32 = 20;

/// PDF versions the writer can declare in the file header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PdfVersion {
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    V1_6,
    #[default]
    V1_7,
}

impl PdfVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            PdfVersion::V1_2 => "1.2",
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

impl FromStr for PdfVersion {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.2" => Ok(PdfVersion::V1_2),
            "1.3" => Ok(PdfVersion::V1_3),
            "1.4" => Ok(PdfVersion::V1_4),
            "1.5" => Ok(PdfVersion::V1_5),
            "1.6" => Ok(PdfVersion::V1_6),
            "1.7" => Ok(PdfVersion::V1_7),
            other => Err(PipelineError::Config(format!(
                "Invalid PDF version '{}', expected one of 1.2 to 1.7",
                other
            ))),
        }
    }
}

impl TryFrom<String> for PdfVersion {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PdfVersion> for String {
    fn from(version: PdfVersion) -> Self {
        version.as_str().to_string()
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Layout device units per PDF point.
    pub dots_per_point: f32,
    /// Layout device units per CSS pixel.
    pub dots_per_pixel: u32,
    /// Write a tagged (structure-annotated) PDF.
    pub tagged: bool,
    pub replace_missing_characters: bool,
    pub missing_character_replacement: char,
    pub round_rect_dimensions_down: bool,
    /// Overlay baseline, ascent and descent lines on every text run.
    pub debug_font_metrics: bool,
    pub pdf_version: PdfVersion,
    /// Document language written to the catalog, e.g. `en-US`.
    pub language: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dots_per_point: DEFAULT_DOTS_PER_POINT,
            dots_per_pixel: DEFAULT_DOTS_PER_PIXEL,
            tagged: true,
            replace_missing_characters: false,
            missing_character_replacement: '#',
            round_rect_dimensions_down: false,
            debug_font_metrics: false,
            pdf_version: PdfVersion::default(),
            language: None,
        }
    }
}

impl RenderConfig {
    /// Defaults overridden by any `FOLIO_*` variables that are set.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("FOLIO_DOTS_PER_POINT") {
            config.dots_per_point = parse_value("FOLIO_DOTS_PER_POINT", &v)?;
        }
        if let Some(v) = lookup("FOLIO_DOTS_PER_PIXEL") {
            config.dots_per_pixel = parse_value("FOLIO_DOTS_PER_PIXEL", &v)?;
        }
        if let Some(v) = lookup("FOLIO_TAGGED") {
            config.tagged = parse_flag("FOLIO_TAGGED", &v)?;
        }
        if let Some(v) = lookup("FOLIO_REPLACE_MISSING_CHARACTERS") {
            config.replace_missing_characters = parse_flag("FOLIO_REPLACE_MISSING_CHARACTERS", &v)?;
        }
        if let Some(v) = lookup("FOLIO_MISSING_CHARACTER_REPLACEMENT") {
            config.missing_character_replacement = parse_value("FOLIO_MISSING_CHARACTER_REPLACEMENT", &v)?;
        }
        if let Some(v) = lookup("FOLIO_ROUND_RECT_DIMENSIONS_DOWN") {
            config.round_rect_dimensions_down = parse_flag("FOLIO_ROUND_RECT_DIMENSIONS_DOWN", &v)?;
        }
        if let Some(v) = lookup("FOLIO_DEBUG_FONT_METRICS") {
            config.debug_font_metrics = parse_flag("FOLIO_DEBUG_FONT_METRICS", &v)?;
        }
        if let Some(v) = lookup("FOLIO_PDF_VERSION") {
            config.pdf_version = v.parse()?;
        }
        if let Some(v) = lookup("FOLIO_LANGUAGE").filter(|v| !v.trim().is_empty()) {
            config.language = Some(v.trim().to_string());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.dots_per_point.is_finite() && self.dots_per_point > 0.0) {
            return Err(PipelineError::Config(format!(
                "dots_per_point must be positive, got {}",
                self.dots_per_point
            )));
        }
        if self.dots_per_pixel == 0 {
            return Err(PipelineError::Config("dots_per_pixel must be positive".into()));
        }
        Ok(())
    }

    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            dots_per_point: self.dots_per_point,
            tagged: self.tagged,
            replace_missing_characters: self.replace_missing_characters,
            missing_character_replacement: self.missing_character_replacement,
            round_rect_dimensions_down: self.round_rect_dimensions_down,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, PipelineError> {
    value
        .trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("{} has an invalid value '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, PipelineError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PipelineError::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

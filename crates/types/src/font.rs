use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn is_slanted(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::Oblique)
    }
}

fn default_weight() -> u16 {
    400
}

/// The font the resolver actually picked for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescription {
    /// PDF `BaseFont` name, e.g. `Helvetica-Bold`.
    pub base_font: String,
    #[serde(default = "default_weight")]
    pub weight: u16,
    #[serde(default)]
    pub style: FontStyle,
    /// Ascent in device units, positive upward from the baseline.
    #[serde(default)]
    pub ascent: f32,
    /// Descent in device units, positive downward from the baseline.
    #[serde(default)]
    pub descent: f32,
    /// Inclusive code point ranges the font has glyphs for. `None` means the
    /// font's encoding decides.
    #[serde(default)]
    pub coverage: Option<Vec<(u32, u32)>>,
}

impl FontDescription {
    pub fn new(base_font: impl Into<String>) -> Self {
        Self {
            base_font: base_font.into(),
            weight: default_weight(),
            style: FontStyle::Normal,
            ascent: 0.0,
            descent: 0.0,
            coverage: None,
        }
    }

    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_metrics(mut self, ascent: f32, descent: f32) -> Self {
        self.ascent = ascent;
        self.descent = descent;
        self
    }

    pub fn with_coverage(mut self, ranges: Vec<(u32, u32)>) -> Self {
        self.coverage = Some(ranges);
        self
    }

    /// `Some(answer)` when explicit coverage is known for `c`.
    pub fn explicit_coverage(&self, c: char) -> Option<bool> {
        self.coverage.as_ref().map(|ranges| {
            let cp = c as u32;
            ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&cp))
        })
    }
}

/// What the stylesheet asked for, before font fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSpecification {
    #[serde(default = "default_weight")]
    pub weight: u16,
    #[serde(default)]
    pub style: FontStyle,
}

impl Default for FontSpecification {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            style: FontStyle::Normal,
        }
    }
}

/// Extra advance, in device units, that justification adds after each glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JustificationInfo {
    pub space_adjust: f32,
    pub non_space_adjust: f32,
}

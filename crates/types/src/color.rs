use serde::{Deserialize, Deserializer, Serialize, de};

/// A resolved CSS color as the layout engine hands it over.
///
/// Only RGB and CMYK have a PDF representation here; anything else is kept
/// so the painter can reject it with a proper error instead of guessing.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Color {
    Rgb { r: u8, g: u8, b: u8 },
    Cmyk { c: f32, m: f32, y: f32, k: f32 },
    Other { space: String },
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    pub fn cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Color::Cmyk { c, m, y, k }
    }

    /// Parse `#RGB` or `#RRGGBB`.
    pub fn parse_hex(s: &str) -> Result<Color, String> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("Color must start with #, got: {}", s))?;
        let channel = |digits: &str, name: &str| {
            u8::from_str_radix(digits, 16).map_err(|e| format!("Invalid {} component: {}", name, e))
        };
        match hex.len() {
            3 => Ok(Color::Rgb {
                r: channel(&hex[0..1].repeat(2), "red")?,
                g: channel(&hex[1..2].repeat(2), "green")?,
                b: channel(&hex[2..3].repeat(2), "blue")?,
            }),
            6 => Ok(Color::Rgb {
                r: channel(&hex[0..2], "red")?,
                g: channel(&hex[2..4], "green")?,
                b: channel(&hex[4..6], "blue")?,
            }),
            n => Err(format!("Invalid hex color length: expected 3 or 6, got {}", n)),
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorDef {
            Hex(String),
            Rgb { r: u8, g: u8, b: u8 },
            Cmyk { c: f32, m: f32, y: f32, k: f32 },
            Other { space: String },
        }

        match ColorDef::deserialize(deserializer)? {
            ColorDef::Hex(s) => Color::parse_hex(&s).map_err(de::Error::custom),
            ColorDef::Rgb { r, g, b } => Ok(Color::Rgb { r, g, b }),
            ColorDef::Cmyk { c, m, y, k } => Ok(Color::Cmyk { c, m, y, k }),
            ColorDef::Other { space } => Ok(Color::Other { space }),
        }
    }
}

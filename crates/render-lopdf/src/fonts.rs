use folio_render_core::RenderError;
use lopdf::{Dictionary, Document, Encoding, Object, dictionary};
use std::collections::BTreeMap;

/// Assigns page resource names (`F1`, `F2`, ...) to base fonts. Every font is
/// a simple Type1 font with WinAnsiEncoding in the shared resource dictionary.
#[derive(Debug, Default)]
pub struct FontRegistry {
    names: BTreeMap<String, String>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name for `base_font`, registering it on first use.
    pub fn resource_name(&mut self, base_font: &str) -> String {
        let next = self.names.len() + 1;
        self.names
            .entry(base_font.to_string())
            .or_insert_with(|| format!("F{}", next))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_resource_dictionary(&self) -> Dictionary {
        let mut fonts = Dictionary::new();
        for (base_font, name) in &self.names {
            fonts.set(name.as_bytes().to_vec(), simple_font_dictionary(base_font));
        }
        fonts
    }
}

fn simple_font_dictionary(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Runs `f` with lopdf's WinAnsiEncoding table, resolved the way a reader
/// resolves it for the fonts written by [`FontRegistry`].
fn with_win_ansi<T>(f: impl FnOnce(&Encoding<'_>) -> T) -> Result<T, RenderError> {
    let font = simple_font_dictionary("Helvetica");
    let encoding = font.get_font_encoding(&Document::new())?;
    Ok(f(&encoding))
}

fn encode_char(encoding: &Encoding<'_>, c: char) -> Vec<u8> {
    // the table lists 0xA0 as a plain space
    let c = if c == '\u{a0}' { ' ' } else { c };
    encoding.string_to_bytes(c.encode_utf8(&mut [0; 4]))
}

/// Encodes `text` for a WinAnsiEncoding simple font, substituting `?`.
pub fn win_ansi_bytes(text: &str) -> Result<Vec<u8>, RenderError> {
    with_win_ansi(|encoding| {
        text.chars()
            .flat_map(|c| {
                let bytes = encode_char(encoding, c);
                if bytes.is_empty() { vec![b'?'] } else { bytes }
            })
            .collect()
    })
}

/// Whether WinAnsiEncoding has a code for `c`.
pub fn win_ansi_covers(c: char) -> Result<bool, RenderError> {
    with_win_ansi(|encoding| !encode_char(encoding, c).is_empty())
}

//! Shared helpers for PDF backends.

/// Convert layout Y coordinate to PDF Y coordinate (flip origin)
pub fn flip_y(y: f32, page_height: f32) -> f32 {
    page_height - y
}

/// Space characters that take the word-spacing adjustment when justifying.
pub fn is_justification_space(c: char) -> bool {
    matches!(c, ' ' | '\u{00a0}' | '\u{3000}')
}

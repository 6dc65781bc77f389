//! Text Measurement Adapter — the engine's only view of font metrics.
//!
//! The engine talks to a `TextMeasure` trait so a real shaping backend can be
//! plugged in by the desktop shell. The shipped `ApproxMetrics` uses a static
//! ASCII width table plus full-em CJK glyphs. This is an intentional
//! approximation: it catches the violations that matter (a field wrapping to
//! three lines, an image band with no room) while tolerating ±1–2% of line
//! width on mixed-script text.
//!
//! All widths are in em units relative to the font size. Line height is
//! `font_size * LINE_HEIGHT_FACTOR + line_gap_adjust` per line, where the
//! gap adjustment is an additive per-line delta chosen by the engine.

use thiserror::Error;

/// Per-line baseline advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MeasureError {
    #[error("font metrics unavailable: {0}")]
    MetricsUnavailable(String),
}

/// Contract for the measurement collaborator.
///
/// `height_of_wrapped` must account for the active glyph set (including CJK)
/// and apply `line_gap_adjust` additively per line.
pub trait TextMeasure {
    fn width_of(&self, text: &str, font_size: f32) -> Result<f32, MeasureError>;

    fn height_of_wrapped(
        &self,
        text: &str,
        font_size: f32,
        max_width: f32,
        line_gap_adjust: f32,
    ) -> Result<f32, MeasureError>;
}

// ────────────────────────────────────────────────────────────────────────────
// ApproxMetrics — static-table fallback implementation
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width metric covering ASCII exactly and everything else
/// by class. `widths[i]` = em width of ASCII character `(i + 32)`.
pub struct ApproxMetrics {
    widths: [f32; 95],
    average_char_width: f32,
}

/// Generic sans-serif widths for ASCII 0x20..=0x7E.
pub static APPROX_SANS: ApproxMetrics = ApproxMetrics {
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
        // 0     1     2     3     4     5     6     7     8     9
        0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
        // :     ;     <     =     >     ?     @
        0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
        // [     \     ]     ^     _     `
        0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
        // {     |     }     ~
        0.33, 0.26, 0.33, 0.59,
    ],
    average_char_width: 0.52,
};

/// Returns true for glyphs rendered at a full em: CJK ideographs, kana,
/// fullwidth forms (including the fullwidth colon the labels use), and the
/// ideographic space.
fn is_fullwidth(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F    // CJK punctuation + ideographic space
        | 0x3040..=0x30FF  // kana
        | 0x3400..=0x4DBF  // CJK ext A
        | 0x4E00..=0x9FFF  // CJK unified
        | 0xF900..=0xFAFF  // compatibility ideographs
        | 0xFF00..=0xFF60  // fullwidth forms
        | 0xFFE0..=0xFFE6)
}

impl ApproxMetrics {
    /// Em width of a single character.
    fn char_em(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else if is_fullwidth(c) {
            1.0
        } else {
            self.average_char_width
        }
    }

    fn str_em(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_em(c)).sum()
    }

    /// Counts wrapped lines with a greedy segment packer.
    ///
    /// ASCII words are atomic; each fullwidth glyph is its own segment (CJK
    /// text may break anywhere). A segment wider than the line is hard-split
    /// by character so a single long token cannot report a bogus one-line fit.
    fn wrapped_line_count(&self, text: &str, font_size: f32, max_width: f32) -> u32 {
        if text.is_empty() || max_width <= 0.0 {
            return if text.is_empty() { 0 } else { 1 };
        }
        let max_em = max_width / font_size;
        let space_em = self.widths[0];
        let mut lines = 1u32;
        let mut current = 0.0f32;
        let mut prev_was_word = false;

        for (is_word, segment) in segments(text) {
            let seg_w = self.str_em(segment);
            // Inter-word space is charged like the greedy word-wrap in any
            // plain-text layout; it is dropped at a break point.
            let lead = if is_word && prev_was_word && current > 0.0 {
                space_em
            } else {
                0.0
            };
            if seg_w > max_em {
                // Hard-split: place character by character.
                for c in segment.chars() {
                    let w = self.char_em(c);
                    if current > 0.0 && current + w > max_em {
                        lines += 1;
                        current = 0.0;
                    }
                    current += w;
                }
                prev_was_word = is_word;
                continue;
            }
            if current > 0.0 && current + lead + seg_w > max_em {
                lines += 1;
                current = seg_w;
            } else {
                current += lead + seg_w;
            }
            prev_was_word = is_word;
        }
        lines
    }
}

impl TextMeasure for ApproxMetrics {
    fn width_of(&self, text: &str, font_size: f32) -> Result<f32, MeasureError> {
        Ok(self.str_em(text) * font_size)
    }

    fn height_of_wrapped(
        &self,
        text: &str,
        font_size: f32,
        max_width: f32,
        line_gap_adjust: f32,
    ) -> Result<f32, MeasureError> {
        let lines = self.wrapped_line_count(text, font_size, max_width) as f32;
        Ok(lines * (font_size * LINE_HEIGHT_FACTOR + line_gap_adjust))
    }
}

/// Splits text into wrap segments: runs of non-fullwidth, non-space
/// characters stay together (`is_word = true`); each fullwidth glyph stands
/// alone (CJK may break anywhere); whitespace only separates.
fn segments(text: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() || is_fullwidth(c) {
            if let Some(s) = start.take() {
                out.push((true, &text[s..i]));
            }
            if is_fullwidth(c) {
                out.push((false, &text[i..i + c.len_utf8()]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((true, &text[s..]));
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

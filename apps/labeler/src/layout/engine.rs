//! Layout Engine — packs label fields and an optional nutrition image into a
//! fixed page without overflow, degrading gracefully when content exceeds
//! the available space.
//!
//! # Strategies (selected by policy class)
//! - `Small`  → Strategy A: every field concatenated into one flowing text
//!   block; a single 0.9 font-shrink pass when the block measures too tall.
//! - `Medium`/`Large` → Strategy B: one field per line, hard truncation at
//!   the bottom bound — trailing fields are silently dropped, never wrapped
//!   to a second page.
//!
//! The engine is pure and deterministic: same request, same op list. It
//! never fails — measurement and image problems are recorded as warnings and
//! the run continues without the affected element.

use std::collections::BTreeMap;

use crate::errors::LayoutWarning;
use crate::layout::catalog::FieldSpec;
use crate::layout::measure::{MeasureError, TextMeasure, LINE_HEIGHT_FACTOR};
use crate::layout::ops::{DrawOp, ImageFit, TextAlign};
use crate::layout::paper::{PaperProfile, PolicyClass};
use crate::layout::units::mm;
use crate::models::image::NutritionImage;
use crate::models::label::{ExtraField, ProductMode};

// ────────────────────────────────────────────────────────────────────────────
// Request / output
// ────────────────────────────────────────────────────────────────────────────

/// One immutable layout request. Values are the already-resolved field map
/// (derived shelf-life/expiry text included); `fields` is the catalog for
/// the product mode.
#[derive(Debug)]
pub struct LayoutRequest<'a> {
    pub profile: &'a PaperProfile,
    pub fields: &'a [FieldSpec],
    pub values: &'a BTreeMap<String, String>,
    pub extra_fields: &'a [ExtraField],
    pub mode: ProductMode,
    /// Show the product name as a centered title (pre-packaged only).
    pub title_on_top: bool,
    pub corner_tag: Option<&'a str>,
    pub nutrition_image: Option<&'a NutritionImage>,
}

/// The ordered draw operations plus every non-fatal degradation that
/// happened along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutput {
    pub ops: Vec<DrawOp>,
    pub warnings: Vec<LayoutWarning>,
}

// ────────────────────────────────────────────────────────────────────────────
// Tunables
// ────────────────────────────────────────────────────────────────────────────

/// Separator between entries in the Strategy A flow (ideographic space).
const FLOW_SEPARATOR: &str = "\u{3000}";

/// Single shrink pass applied when the Strategy A block measures too tall.
/// Not iterated: the result is accepted even if it still overflows.
const SHRINK_FACTOR: f32 = 0.9;

/// Fraction of content height reserved for the image under Strategy A.
const SMALL_TEXT_RESERVE: f32 = 0.33;

/// Bottom band (fraction of usable height) the image fills on small paper.
const SMALL_IMAGE_FRACTION: f32 = 0.40;

/// Bottom band the image fills on medium paper. Revisions of the original
/// varied between 0.2 and 0.3; 0.3 is the canonical value here.
const MEDIUM_IMAGE_FRACTION: f32 = 0.30;

/// On large paper the image height is also capped by this fraction of the
/// content width.
const LARGE_IMAGE_WIDTH_FACTOR: f32 = 0.8;

/// Below this box height the image is skipped entirely.
const MIN_IMAGE_HEIGHT_PT: f32 = 12.0;

const CORNER_TAG_FONT: f32 = 8.0;
const CORNER_TAG_MAX_WIDTH_MM: f32 = 15.0;
const CORNER_TAG_PADDING: f32 = 2.0;

/// Asset key the renderer resolves to the label's nutrition image.
pub const NUTRITION_SOURCE_REF: &str = "nutrition";

fn base_font_size(mode: ProductMode, policy: PolicyClass, content_width: f32) -> f32 {
    match (mode, policy) {
        (ProductMode::Bulk, PolicyClass::Small) => 9.0,
        (ProductMode::Bulk, PolicyClass::Medium) => 10.0,
        (ProductMode::Bulk, PolicyClass::Large) => (content_width / 18.0).min(14.0),
        (ProductMode::PrePackaged, PolicyClass::Small) => 8.0,
        (ProductMode::PrePackaged, PolicyClass::Medium) => 8.0,
        (ProductMode::PrePackaged, PolicyClass::Large) => (content_width / 20.0).min(12.0),
    }
}

/// Strategy A line-gap delta: tighter for pre-packaged to fit more, slightly
/// looser for bulk for readability.
fn flow_line_gap(mode: ProductMode) -> f32 {
    match mode {
        ProductMode::PrePackaged => -1.0,
        ProductMode::Bulk => 0.5,
    }
}

/// Strategy B inter-field gap.
fn field_gap(mode: ProductMode) -> f32 {
    match mode {
        ProductMode::PrePackaged => 2.0,
        ProductMode::Bulk => 3.0,
    }
}

const EXTRA_FIELD_GAP: f32 = 2.0;

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out one label. Pure; never panics; on overflow it degrades
/// (font shrink / truncation) rather than failing.
pub fn layout(req: &LayoutRequest<'_>, measure: &dyn TextMeasure) -> LayoutOutput {
    let mut out = LayoutOutput { ops: Vec::new(), warnings: Vec::new() };
    let profile = req.profile;
    let bulk = req.mode == ProductMode::Bulk;
    let content_width = profile.content_width();
    let base_font = base_font_size(req.mode, profile.policy, content_width);

    let mut cursor = profile.top_margin;
    let mut title_shown = false;

    // Title block: bulk always carries the fixed caption; pre-packaged shows
    // the product name when the option is set.
    if bulk {
        emit_title(&mut out, profile, "散装食品标签", base_font, measure);
        out.ops.push(DrawOp::Line {
            x1: profile.side_margin,
            y1: cursor + base_font * 1.9,
            x2: profile.side_margin + content_width,
            y2: cursor + base_font * 1.9,
        });
        cursor += base_font * 2.2;
    } else if req.title_on_top {
        if let Some(name) = non_empty(req.values.get("productName")) {
            emit_title(&mut out, profile, name, base_font, measure);
            cursor += base_font * 1.8;
            title_shown = true;
        }
    }

    // Corner tag overlays the top-right corner; pre-packaged only.
    if !bulk {
        if let Some(tag) = req.corner_tag.filter(|t| !t.is_empty()) {
            emit_corner_tag(&mut out, profile, tag, measure);
        }
    }

    let image = if bulk { None } else { req.nutrition_image };

    match profile.policy {
        PolicyClass::Small => {
            strategy_a(&mut out, req, cursor, base_font, title_shown, image.is_some(), measure);
            if let Some(img) = image {
                place_image_bottom_band(&mut out, profile, img, SMALL_IMAGE_FRACTION);
            }
        }
        PolicyClass::Medium => {
            strategy_b(&mut out, req, cursor, base_font, title_shown, measure);
            if let Some(img) = image {
                place_image_bottom_band(&mut out, profile, img, MEDIUM_IMAGE_FRACTION);
            }
        }
        PolicyClass::Large => {
            let end = strategy_b(&mut out, req, cursor, base_font, title_shown, measure);
            if let Some(img) = image {
                place_image_flowed(&mut out, profile, img, end);
            }
        }
    }

    out
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy A — continuous flow (small paper)
// ────────────────────────────────────────────────────────────────────────────

fn strategy_a(
    out: &mut LayoutOutput,
    req: &LayoutRequest<'_>,
    cursor: f32,
    base_font: f32,
    title_shown: bool,
    has_image: bool,
    measure: &dyn TextMeasure,
) {
    let profile = req.profile;
    let content_width = profile.content_width();
    let gap = flow_line_gap(req.mode);

    let mut entries: Vec<String> = Vec::new();
    for spec in req.fields {
        if title_shown && spec.key == "productName" {
            continue;
        }
        if let Some(value) = non_empty(req.values.get(spec.key)) {
            entries.push(format!("{}：{}", spec.label, value));
        }
    }
    if req.mode == ProductMode::PrePackaged {
        for extra in req.extra_fields.iter().filter(|f| f.is_complete()) {
            entries.push(format!("{}：{}", extra.label, extra.value));
        }
    }
    if entries.is_empty() {
        return;
    }
    let full_text = entries.join(FLOW_SEPARATOR);

    // The bottom third of the content area is reserved when an image will be
    // placed below the text.
    let reserve = if has_image {
        profile.content_height() * SMALL_TEXT_RESERVE
    } else {
        0.0
    };
    let text_area_height = (profile.bottom_bound() - cursor - reserve).max(0.0);

    let measured = measured_height(out, measure, &full_text, base_font, content_width, gap);
    let font_size = if measured > text_area_height {
        let shrunk = base_font * SHRINK_FACTOR;
        // Single pass: no re-measure, the shrunk result is accepted as-is.
        out.warnings.push(LayoutWarning::FontShrunk { from: base_font, to: shrunk });
        shrunk
    } else {
        base_font
    };

    out.ops.push(DrawOp::TextBlock {
        x: profile.side_margin,
        y: cursor,
        max_width: content_width,
        max_height: Some(text_area_height),
        text: full_text,
        font_size,
        align: TextAlign::Left,
        line_gap_adjust: gap,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy B — one field per line (medium/large paper)
// ────────────────────────────────────────────────────────────────────────────

/// Emits catalog rows then extra rows, truncating hard at the bottom bound.
/// Returns the cursor position after the last emitted row.
fn strategy_b(
    out: &mut LayoutOutput,
    req: &LayoutRequest<'_>,
    mut cursor: f32,
    base_font: f32,
    title_shown: bool,
    measure: &dyn TextMeasure,
) -> f32 {
    let profile = req.profile;
    let content_width = profile.content_width();
    let bottom = profile.bottom_bound();

    // Assemble every printable row up front so the truncation warning can
    // count exactly what was dropped.
    let mut rows: Vec<(String, f32)> = Vec::new();
    for spec in req.fields {
        if title_shown && spec.key == "productName" {
            continue;
        }
        if let Some(value) = non_empty(req.values.get(spec.key)) {
            rows.push((format!("{}：{}", spec.label, value), field_gap(req.mode)));
        }
    }
    if req.mode == ProductMode::PrePackaged {
        for extra in req.extra_fields.iter().filter(|f| f.is_complete()) {
            rows.push((format!("{}：{}", extra.label, extra.value), EXTRA_FIELD_GAP));
        }
    }

    for (index, (text, gap)) in rows.iter().enumerate() {
        let height = measured_height(out, measure, text, base_font, content_width, 0.0);
        if cursor + height > bottom {
            // Hard truncation: everything from here on is silently dropped.
            out.warnings.push(LayoutWarning::FieldsTruncated { dropped: rows.len() - index });
            break;
        }
        out.ops.push(DrawOp::TextBlock {
            x: profile.side_margin,
            y: cursor,
            max_width: content_width,
            max_height: None,
            text: text.clone(),
            font_size: base_font,
            align: TextAlign::Left,
            line_gap_adjust: 0.0,
        });
        cursor += height + gap;
    }
    cursor
}

// ────────────────────────────────────────────────────────────────────────────
// Title + corner tag
// ────────────────────────────────────────────────────────────────────────────

fn emit_title(
    out: &mut LayoutOutput,
    profile: &PaperProfile,
    text: &str,
    base_font: f32,
    measure: &dyn TextMeasure,
) {
    let title_font = base_font * 1.5;
    // Measured only so a metrics failure surfaces as a warning here too; the
    // title always occupies the fixed advance applied by the caller.
    let _ = measured_height(out, measure, text, title_font, profile.content_width(), 0.0);
    out.ops.push(DrawOp::TextBlock {
        x: profile.side_margin,
        y: profile.top_margin,
        max_width: profile.content_width(),
        max_height: None,
        text: text.to_string(),
        font_size: title_font,
        align: TextAlign::Center,
        line_gap_adjust: 0.0,
    });
}

fn emit_corner_tag(
    out: &mut LayoutOutput,
    profile: &PaperProfile,
    tag: &str,
    measure: &dyn TextMeasure,
) {
    let max_box = mm(CORNER_TAG_MAX_WIDTH_MM);
    let text_width = match measure.width_of(tag, CORNER_TAG_FONT) {
        Ok(w) => w,
        Err(e) => {
            out.warnings.push(LayoutWarning::MeasurementFallback { detail: e.to_string() });
            max_box
        }
    };
    let box_width = (text_width + 2.0 * CORNER_TAG_PADDING).min(max_box);
    let inner_width = box_width - 2.0 * CORNER_TAG_PADDING;
    let text_height =
        measured_height(out, measure, tag, CORNER_TAG_FONT, inner_width, 0.0);
    let box_height = text_height + 2.0 * CORNER_TAG_PADDING;
    let x = profile.page_width - profile.side_margin - box_width;
    let y = profile.top_margin;

    out.ops.push(DrawOp::RectOutline { x, y, w: box_width, h: box_height });
    out.ops.push(DrawOp::TextBlock {
        x: x + CORNER_TAG_PADDING,
        y: y + CORNER_TAG_PADDING,
        max_width: inner_width,
        max_height: None,
        text: tag.to_string(),
        font_size: CORNER_TAG_FONT,
        align: TextAlign::Center,
        line_gap_adjust: 0.0,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Image placement
// ────────────────────────────────────────────────────────────────────────────

/// Pins the image into the bottom band of the *actual usable height*,
/// stretched to fill. Distortion is accepted: the regulated nutrition table
/// must be fully visible.
fn place_image_bottom_band(
    out: &mut LayoutOutput,
    profile: &PaperProfile,
    _img: &NutritionImage,
    fraction: f32,
) {
    let height = profile.usable_height * fraction - profile.bottom_margin;
    if height < MIN_IMAGE_HEIGHT_PT {
        out.warnings.push(LayoutWarning::ImageSkipped {
            reason: format!("bottom band too small ({height:.1}pt)"),
        });
        return;
    }
    out.ops.push(DrawOp::ImageBlock {
        x: profile.side_margin,
        y: profile.bottom_bound() - height,
        width: profile.content_width(),
        height,
        source_ref: NUTRITION_SOURCE_REF.to_string(),
        fit: ImageFit::Stretch,
    });
}

/// Places the image directly below the last text row, contain-fit and
/// horizontally centered (large paper only).
fn place_image_flowed(
    out: &mut LayoutOutput,
    profile: &PaperProfile,
    img: &NutritionImage,
    cursor: f32,
) {
    let content_width = profile.content_width();
    let remaining = profile.bottom_bound() - cursor;
    let box_height = remaining.min(content_width * LARGE_IMAGE_WIDTH_FACTOR);
    if box_height < MIN_IMAGE_HEIGHT_PT {
        out.warnings.push(LayoutWarning::ImageSkipped {
            reason: format!("remaining space too small ({box_height:.1}pt)"),
        });
        return;
    }
    let width = (box_height * img.aspect()).min(content_width);
    let height = width / img.aspect();
    out.ops.push(DrawOp::ImageBlock {
        x: profile.side_margin + (content_width - width) / 2.0,
        y: cursor,
        width,
        height,
        source_ref: NUTRITION_SOURCE_REF.to_string(),
        fit: ImageFit::ContainPreserveAspect,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Measurement with fallback
// ────────────────────────────────────────────────────────────────────────────

/// Measures wrapped height, degrading to a character-count approximation on
/// failure. The failure is recorded once per call; the layout continues.
fn measured_height(
    out: &mut LayoutOutput,
    measure: &dyn TextMeasure,
    text: &str,
    font_size: f32,
    max_width: f32,
    line_gap_adjust: f32,
) -> f32 {
    match measure.height_of_wrapped(text, font_size, max_width, line_gap_adjust) {
        Ok(h) => h,
        Err(MeasureError::MetricsUnavailable(detail)) => {
            out.warnings
                .push(LayoutWarning::MeasurementFallback { detail });
            fallback_height(text, font_size, max_width, line_gap_adjust)
        }
    }
}

/// Crude height estimate used when metrics are unavailable: every glyph is
/// assumed one em wide.
fn fallback_height(text: &str, font_size: f32, max_width: f32, line_gap_adjust: f32) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let per_line = (max_width / font_size).floor().max(1.0);
    let lines = (text.chars().count() as f32 / per_line).ceil();
    lines * (font_size * LINE_HEIGHT_FACTOR + line_gap_adjust)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

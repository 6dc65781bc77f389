//! Positioned draw operations — the engine's output and the renderer's input.
//!
//! A layout run produces a flat, immutable op list against a declared page.
//! Ops are serde-tagged so the list can be handed to an external renderer
//! process as JSON. Coordinates are internal units (points), origin top-left.

use serde::{Deserialize, Serialize};

/// Horizontal alignment inside a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
}

/// How an image is fitted into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFit {
    /// Fill the box exactly; aspect ratio is not preserved.
    Stretch,
    /// Scale to fit inside the box preserving aspect ratio, centered.
    ContainPreserveAspect,
}

/// One positioned draw operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    #[serde(rename_all = "camelCase")]
    TextBlock {
        x: f32,
        y: f32,
        max_width: f32,
        /// Clip bound for the block, when the strategy reserves space below.
        max_height: Option<f32>,
        text: String,
        font_size: f32,
        align: TextAlign,
        /// Additive per-line spacing delta handed through to the renderer.
        line_gap_adjust: f32,
    },
    #[serde(rename_all = "camelCase")]
    ImageBlock {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        /// Asset key resolved by the renderer (e.g. `"nutrition"`).
        source_ref: String,
        fit: ImageFit,
    },
    #[serde(rename_all = "camelCase")]
    RectOutline { x: f32, y: f32, w: f32, h: f32 },
    #[serde(rename_all = "camelCase")]
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// The page box and margins the renderer must declare for the document.
/// `height` is the declared page height (the 60×80 profile declares 100mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub width: f32,
    pub height: f32,
    pub top_margin: f32,
    pub side_margin: f32,
    pub bottom_margin: f32,
}

impl PageSpec {
    pub fn of(profile: &crate::layout::paper::PaperProfile) -> PageSpec {
        PageSpec {
            width: profile.page_width,
            height: profile.page_height,
            top_margin: profile.top_margin,
            side_margin: profile.side_margin,
            bottom_margin: profile.bottom_margin,
        }
    }
}

//! Paper Profile Resolver — maps a requested paper-size identifier (plus
//! optional custom dimensions) to concrete page geometry and a layout-policy
//! class.
//!
//! # Policy classes
//! - `Small`  → Strategy A (continuous flow, single text block)
//! - `Medium` → Strategy B with a bottom-anchored compressed image
//! - `Large`  → Strategy B with a flowed, aspect-preserving image
//!
//! The bulk-food flag never changes the paper profile — it only changes the
//! engine's font table and field set — so it is not an input here.

use serde::{Deserialize, Serialize};

use crate::layout::units::mm;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// The paper sizes the print dialog offers. Serialized with the same string
/// identifiers the original settings JSON uses; any unrecognized identifier
/// deserializes to the 76×130 default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum PaperSize {
    #[serde(rename = "70x70mm")]
    Square70,
    #[serde(rename = "70x100mm")]
    Tall70x100,
    #[serde(rename = "60x80mm")]
    Narrow60x80,
    /// 76×130mm — the fallback for any unrecognized identifier.
    #[default]
    #[serde(rename = "76x130mm")]
    Standard76x130,
    #[serde(rename = "custom")]
    Custom,
}

impl From<String> for PaperSize {
    fn from(id: String) -> Self {
        match id.as_str() {
            "70x70mm" => PaperSize::Square70,
            "70x100mm" => PaperSize::Tall70x100,
            "60x80mm" => PaperSize::Narrow60x80,
            "custom" => PaperSize::Custom,
            _ => PaperSize::Standard76x130,
        }
    }
}

/// Which layout strategy and font-size table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyClass {
    Small,
    Medium,
    Large,
}

// ────────────────────────────────────────────────────────────────────────────
// Resolved profile
// ────────────────────────────────────────────────────────────────────────────

/// Custom paper is classified `Small` when both dimensions are under this
/// threshold (millimeters). This is the one canonical rule — named paper
/// sizes carry their class explicitly and never consult the threshold.
const SMALL_CUSTOM_THRESHOLD_MM: f32 = 75.0;

/// Resolved page geometry in internal units (points).
///
/// `usable_height` is the true physical print-area height. It equals
/// `page_height` for every profile except 60×80mm, which declares a 100mm
/// backing page to absorb a printer feed offset while only 80mm is actually
/// printable. Bottom-anchored placement must use `usable_height`; the
/// renderer's coordinate space still uses `page_height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperProfile {
    pub page_width: f32,
    pub page_height: f32,
    pub top_margin: f32,
    pub side_margin: f32,
    pub bottom_margin: f32,
    pub policy: PolicyClass,
    pub usable_height: f32,
}

impl PaperProfile {
    /// Resolves concrete page geometry for a paper-size identifier.
    ///
    /// Custom sizes with a missing dimension fall back to the 76×130 default,
    /// matching the original form behavior (empty custom inputs).
    pub fn resolve(size: PaperSize, custom_width_mm: Option<f32>, custom_height_mm: Option<f32>) -> PaperProfile {
        match size {
            PaperSize::Square70 => Self::uniform(70.0, 70.0, 3.0, PolicyClass::Small),
            PaperSize::Tall70x100 => Self::uniform(70.0, 100.0, 3.0, PolicyClass::Medium),
            PaperSize::Narrow60x80 => PaperProfile {
                page_width: mm(60.0),
                // Declared backing page is 100mm tall; only 80mm is printable.
                page_height: mm(100.0),
                top_margin: mm(2.0),
                side_margin: mm(2.0),
                bottom_margin: mm(2.0),
                policy: PolicyClass::Small,
                usable_height: mm(80.0),
            },
            PaperSize::Custom => match (custom_width_mm, custom_height_mm) {
                (Some(w), Some(h)) if w > 0.0 && h > 0.0 => {
                    let small = w < SMALL_CUSTOM_THRESHOLD_MM && h < SMALL_CUSTOM_THRESHOLD_MM;
                    let (margin, policy) = if small {
                        (3.0, PolicyClass::Small)
                    } else {
                        (5.0, PolicyClass::Large)
                    };
                    Self::uniform(w, h, margin, policy)
                }
                _ => Self::default_profile(),
            },
            PaperSize::Standard76x130 => Self::default_profile(),
        }
    }

    fn default_profile() -> PaperProfile {
        Self::uniform(76.0, 130.0, 5.0, PolicyClass::Large)
    }

    /// A profile with equal margins on all sides and no feed compensation.
    fn uniform(width_mm: f32, height_mm: f32, margin_mm: f32, policy: PolicyClass) -> PaperProfile {
        PaperProfile {
            page_width: mm(width_mm),
            page_height: mm(height_mm),
            top_margin: mm(margin_mm),
            side_margin: mm(margin_mm),
            bottom_margin: mm(margin_mm),
            policy,
            usable_height: mm(height_mm),
        }
    }

    /// Horizontal width available to content.
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.side_margin
    }

    /// Vertical space available to content, measured against the *actual*
    /// usable height (not the declared page height).
    pub fn content_height(&self) -> f32 {
        self.usable_height - self.top_margin - self.bottom_margin
    }

    /// The y coordinate content may not cross.
    pub fn bottom_bound(&self) -> f32 {
        self.usable_height - self.bottom_margin
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

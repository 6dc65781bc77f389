//! Configuration — per-label print settings plus app-level environment
//! configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::layout::paper::{PaperProfile, PaperSize};

/// Print settings stored per label. A closed struct: every option is a typed
/// field, unknown JSON keys are dropped on load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintSettings {
    pub paper_size: PaperSize,
    pub custom_width_mm: Option<f32>,
    pub custom_height_mm: Option<f32>,
    /// Show the product name as a centered title above the body.
    pub show_product_name_on_top: bool,
    pub is_bulk_food: bool,
    pub printer: Option<String>,
    pub copies: u32,
}

impl PrintSettings {
    pub fn profile(&self) -> PaperProfile {
        PaperProfile::resolve(self.paper_size, self.custom_width_mm, self.custom_height_mm)
    }

    /// Copies clamp to at least one; a saved `0` means "never set".
    pub fn effective_copies(&self) -> u32 {
        self.copies.max(1)
    }
}

/// Application configuration loaded from environment variables. Everything
/// has a default; nothing is required.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: std::path::PathBuf,
    /// External renderer command; `None` keeps the JSON op-list output.
    pub renderer_command: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = std::env::var("LABELER_DATA_DIR")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from("data"));

        Ok(Config {
            data_dir,
            renderer_command: std::env::var("LABELER_RENDERER").ok().filter(|v| !v.is_empty()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::paper::PolicyClass;

    #[test]
    fn test_settings_default_to_standard_paper() {
        let settings = PrintSettings::default();
        assert_eq!(settings.paper_size, PaperSize::Standard76x130);
        assert!(!settings.is_bulk_food);
        assert_eq!(settings.effective_copies(), 1);
    }

    #[test]
    fn test_settings_deserialize_with_missing_keys() {
        // Settings saved by older versions carry only a subset of keys.
        let settings: PrintSettings =
            serde_json::from_str(r#"{"paperSize":"70x70mm"}"#).unwrap();
        assert_eq!(settings.paper_size, PaperSize::Square70);
        assert_eq!(settings.profile().policy, PolicyClass::Small);
        assert!(!settings.show_product_name_on_top);
    }

    #[test]
    fn test_settings_round_trip_camel_case() {
        let settings = PrintSettings {
            paper_size: PaperSize::Custom,
            custom_width_mm: Some(50.0),
            custom_height_mm: Some(40.0),
            show_product_name_on_top: true,
            is_bulk_food: false,
            printer: Some("Zebra-ZD420".to_string()),
            copies: 3,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"customWidthMm\":50.0"), "camelCase keys: {json}");
        let back: PrintSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}

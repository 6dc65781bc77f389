use thiserror::Error;

/// Application-level error type.
///
/// No variant here is fatal to the process: layout degrades instead of
/// failing, and render/print errors are reported upward as result values
/// at the pipeline boundary.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Print dispatch failed: {message}")]
    PrintDispatch { message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A non-fatal degradation recorded during a layout run.
///
/// The engine never aborts: whatever could not be placed or measured exactly
/// is noted here and the layout continues. Callers log these with `tracing`
/// and may surface them in the UI.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum LayoutWarning {
    /// The text measurer failed; a character-count approximation was used.
    MeasurementFallback { detail: String },
    /// The nutrition image was present but skipped.
    ImageSkipped { reason: String },
    /// Strategy A shrank the base font by the single 0.9 pass.
    FontShrunk { from: f32, to: f32 },
    /// Strategy B ran out of vertical space; trailing fields were dropped.
    FieldsTruncated { dropped: usize },
}

//! Document Renderer — the seam between the layout engine and whatever
//! produces printable output.
//!
//! The engine hands over a `PageSpec`, the ordered draw-op list, and the
//! decoded image assets; the renderer is a black box behind
//! `DocumentRenderer`. Two adapters ship:
//! - `OpListRenderer` writes the document as JSON (the hand-off format, also
//!   what previews and tests consume),
//! - `ExternalCommandRenderer` pipes that JSON through a configured external
//!   program that produces the actual printable file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LabelError;
use crate::layout::ops::{DrawOp, PageSpec};

/// One image asset, keyed by the `source_ref` the draw ops use. Bytes are
/// the original encoded image; the renderer owns rasterization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

/// The complete render input: one page, its ops, its assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub page: PageSpec,
    pub ops: Vec<DrawOp>,
    pub assets: BTreeMap<String, ImageAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub path: PathBuf,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, job: &RenderJob, output: &Path) -> Result<RenderedDocument, LabelError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Adapters
// ────────────────────────────────────────────────────────────────────────────

/// Writes the render job as JSON. This is the canonical hand-off format; a
/// downstream renderer (or a test) consumes it as-is.
#[derive(Debug, Default)]
pub struct OpListRenderer;

#[async_trait]
impl DocumentRenderer for OpListRenderer {
    async fn render(&self, job: &RenderJob, output: &Path) -> Result<RenderedDocument, LabelError> {
        let json = serde_json::to_vec_pretty(job)?;
        tokio::fs::write(output, json).await?;
        debug!(ops = job.ops.len(), path = %output.display(), "wrote op-list document");
        Ok(RenderedDocument { path: output.to_path_buf() })
    }
}

/// Spawns an external renderer process: `<command> <job.json> <output>`.
/// The job JSON is written next to the output file first.
#[derive(Debug)]
pub struct ExternalCommandRenderer {
    command: String,
}

impl ExternalCommandRenderer {
    pub fn new(command: impl Into<String>) -> Self {
        ExternalCommandRenderer { command: command.into() }
    }
}

#[async_trait]
impl DocumentRenderer for ExternalCommandRenderer {
    async fn render(&self, job: &RenderJob, output: &Path) -> Result<RenderedDocument, LabelError> {
        let job_path = output.with_extension("job.json");
        tokio::fs::write(&job_path, serde_json::to_vec_pretty(job)?).await?;

        let status = tokio::process::Command::new(&self.command)
            .arg(&job_path)
            .arg(output)
            .output()
            .await?;
        if !status.status.success() {
            return Err(LabelError::Render(format!(
                "renderer '{}' failed: {}",
                self.command,
                String::from_utf8_lossy(&status.stderr).trim()
            )));
        }
        debug!(command = %self.command, path = %output.display(), "external renderer finished");
        Ok(RenderedDocument { path: output.to_path_buf() })
    }
}

/// Serde helper: image bytes travel base64-encoded inside the job JSON.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64.decode(text).map_err(serde::de::Error::custom)
    }
}

//! Preview/print pipeline — resolves a label into a rendered document and
//! optionally hands it to the spooler.
//!
//! Render results are cached by SHA-256 over the canonical JSON of
//! (label, settings, production date): re-previewing identical input is a
//! cache hit, any content change invalidates. Overlapping previews are
//! last-call-wins; a superseded result is discarded, never surfaced.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::PrintSettings;
use crate::errors::{LabelError, LayoutWarning};
use crate::layout::catalog::fields_for;
use crate::layout::engine::{self, LayoutRequest, NUTRITION_SOURCE_REF};
use crate::layout::measure::APPROX_SANS;
use crate::layout::ops::PageSpec;
use crate::models::image::NutritionImage;
use crate::models::label::{LabelRecord, ProductMode};
use crate::print;
use crate::render::{DocumentRenderer, ImageAsset, RenderJob, RenderedDocument};

/// A finished preview: the rendered document plus every degradation the
/// layout accepted along the way.
#[derive(Debug, Clone)]
pub struct Preview {
    pub document: RenderedDocument,
    pub warnings: Vec<LayoutWarning>,
    pub from_cache: bool,
}

pub struct Pipeline<R> {
    renderer: R,
    out_dir: PathBuf,
    cache: Mutex<HashMap<String, RenderedDocument>>,
    generation: AtomicU64,
}

impl<R: DocumentRenderer> Pipeline<R> {
    pub fn new(renderer: R, out_dir: impl Into<PathBuf>) -> Self {
        Pipeline {
            renderer,
            out_dir: out_dir.into(),
            cache: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Lays out and renders one label. Returns `None` when a newer preview
    /// superseded this one while it was rendering.
    pub async fn preview(
        &self,
        label: &LabelRecord,
        settings: &PrintSettings,
        production: Option<NaiveDate>,
    ) -> Result<Option<Preview>, LabelError> {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = content_hash(label, settings, production)?;

        if let Some(document) = self.cache.lock().await.get(&hash).cloned() {
            debug!(hash = %&hash[..12], "render cache hit");
            return Ok(Some(Preview { document, warnings: Vec::new(), from_cache: true }));
        }

        let mode = effective_mode(label, settings);
        let profile = settings.profile();
        let fields = fields_for(mode, label.has_packing_date());
        let values = label.resolved_fields(production);

        let mut warnings = Vec::new();
        let image = match &label.nutrition_image {
            Some(uri) => match NutritionImage::from_data_uri(uri) {
                Ok(img) => Some(img),
                Err(e) => {
                    warnings.push(LayoutWarning::ImageSkipped { reason: e.to_string() });
                    None
                }
            },
            None => None,
        };

        let request = LayoutRequest {
            profile: &profile,
            fields: &fields,
            values: &values,
            extra_fields: &label.extra_fields,
            mode,
            title_on_top: settings.show_product_name_on_top,
            corner_tag: label.corner_tag.as_deref(),
            nutrition_image: image.as_ref(),
        };
        let output = engine::layout(&request, &APPROX_SANS);
        warnings.extend(output.warnings);
        for warning in &warnings {
            warn!(?warning, label = %label.display_name(), "layout degradation");
        }

        let mut assets = BTreeMap::new();
        if let Some(img) = &image {
            assets.insert(
                NUTRITION_SOURCE_REF.to_string(),
                ImageAsset { width: img.width, height: img.height, bytes: img.bytes.clone() },
            );
        }
        let job = RenderJob { page: PageSpec::of(&profile), ops: output.ops, assets };

        tokio::fs::create_dir_all(&self.out_dir).await?;
        let path = self.out_dir.join(format!("label-{}.json", &hash[..16]));
        let document = self.renderer.render(&job, &path).await?;

        if self.generation.load(Ordering::SeqCst) != my_generation {
            debug!(hash = %&hash[..12], "preview superseded, discarding");
            return Ok(None);
        }
        self.cache.lock().await.insert(hash, document.clone());
        Ok(Some(Preview { document, warnings, from_cache: false }))
    }

    /// Renders (or reuses) the document and sends it to the spooler.
    /// Returns the layout warnings so the caller can show them.
    pub async fn print(
        &self,
        label: &LabelRecord,
        settings: &PrintSettings,
        production: Option<NaiveDate>,
    ) -> Result<Vec<LayoutWarning>, LabelError> {
        let preview = self
            .preview(label, settings, production)
            .await?
            .ok_or_else(|| anyhow::anyhow!("print preview superseded by a concurrent request"))?;
        print::dispatch(
            &preview.document.path,
            settings.printer.as_deref(),
            settings.effective_copies(),
        )
        .await?;
        Ok(preview.warnings)
    }
}

/// The bulk-food toggle in the print settings wins over whatever mode the
/// record was saved with.
fn effective_mode(label: &LabelRecord, settings: &PrintSettings) -> ProductMode {
    if settings.is_bulk_food {
        ProductMode::Bulk
    } else {
        label.mode
    }
}

fn content_hash(
    label: &LabelRecord,
    settings: &PrintSettings,
    production: Option<NaiveDate>,
) -> Result<String, LabelError> {
    // BTreeMap fields make the JSON canonical for identical content.
    let payload = serde_json::to_vec(&(label, settings, production))?;
    let digest = Sha256::digest(&payload);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::layout::ops::DrawOp;
    use crate::layout::paper::PaperSize;

    /// Counts renders and captures the last job instead of touching disk.
    #[derive(Default)]
    struct MockRenderer {
        renders: AtomicUsize,
        last_job: std::sync::Mutex<Option<RenderJob>>,
    }

    #[async_trait]
    impl DocumentRenderer for Arc<MockRenderer> {
        async fn render(
            &self,
            job: &RenderJob,
            output: &Path,
        ) -> Result<RenderedDocument, LabelError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            *self.last_job.lock().unwrap() = Some(job.clone());
            Ok(RenderedDocument { path: output.to_path_buf() })
        }
    }

    fn make_pipeline() -> (tempfile::TempDir, Arc<MockRenderer>, Pipeline<Arc<MockRenderer>>) {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(MockRenderer::default());
        let pipeline = Pipeline::new(renderer.clone(), dir.path());
        (dir, renderer, pipeline)
    }

    fn make_label() -> LabelRecord {
        let mut label = LabelRecord::new();
        label.fields.insert("productName".to_string(), "酱鸭".to_string());
        label
    }

    #[tokio::test]
    async fn test_identical_preview_is_a_cache_hit() {
        let (_dir, renderer, pipeline) = make_pipeline();
        let label = make_label();
        let settings = PrintSettings::default();

        let first = pipeline.preview(&label, &settings, None).await.unwrap().unwrap();
        assert!(!first.from_cache);
        let second = pipeline.preview(&label, &settings, None).await.unwrap().unwrap();
        assert!(second.from_cache, "identical input must not re-render");
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
        assert_eq!(first.document, second.document);
    }

    #[tokio::test]
    async fn test_any_content_change_invalidates_cache() {
        let (_dir, renderer, pipeline) = make_pipeline();
        let mut label = make_label();
        let mut settings = PrintSettings::default();

        pipeline.preview(&label, &settings, None).await.unwrap();
        label.fields.insert("origin".to_string(), "杭州".to_string());
        pipeline.preview(&label, &settings, None).await.unwrap();
        settings.paper_size = PaperSize::Square70;
        pipeline.preview(&label, &settings, None).await.unwrap();

        assert_eq!(renderer.renders.load(Ordering::SeqCst), 3, "every change re-renders");
    }

    #[tokio::test]
    async fn test_production_date_participates_in_the_hash() {
        let (_dir, renderer, pipeline) = make_pipeline();
        let label = make_label();
        let settings = PrintSettings::default();
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();

        pipeline.preview(&label, &settings, None).await.unwrap();
        pipeline.preview(&label, &settings, Some(date)).await.unwrap();
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bad_nutrition_image_degrades_to_warning() {
        let (_dir, renderer, pipeline) = make_pipeline();
        let mut label = make_label();
        label.nutrition_image = Some("data:image/png;base64,!!!".to_string());
        let settings = PrintSettings::default();

        let preview = pipeline.preview(&label, &settings, None).await.unwrap().unwrap();
        assert!(preview
            .warnings
            .iter()
            .any(|w| matches!(w, LayoutWarning::ImageSkipped { .. })));
        let job = renderer.last_job.lock().unwrap().clone().unwrap();
        assert!(job.assets.is_empty(), "undecodable image ships no asset");
        assert!(!job.ops.iter().any(|op| matches!(op, DrawOp::ImageBlock { .. })));
    }

    #[tokio::test]
    async fn test_bulk_setting_overrides_record_mode() {
        let (_dir, renderer, pipeline) = make_pipeline();
        let label = make_label();
        let settings = PrintSettings { is_bulk_food: true, ..Default::default() };

        pipeline.preview(&label, &settings, None).await.unwrap();
        let job = renderer.last_job.lock().unwrap().clone().unwrap();
        let first_text = job.ops.iter().find_map(|op| match op {
            DrawOp::TextBlock { text, .. } => Some(text.clone()),
            _ => None,
        });
        assert_eq!(first_text.as_deref(), Some("散装食品标签"));
    }
}

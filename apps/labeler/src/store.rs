//! Persistence — a flat key→JSON document store backed by a single file.
//!
//! Layout of the document:
//! - `savedLabels`            → array of `LabelRecord`
//! - `labelSettings_<id>`     → `PrintSettings` for that label
//! - `lastProductionDate`     → the production date last used for printing
//!
//! Writes go through a tempfile in the same directory and an atomic rename,
//! so a crash mid-save never corrupts the store.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::config::PrintSettings;
use crate::errors::LabelError;
use crate::models::label::LabelRecord;

const LABELS_KEY: &str = "savedLabels";
const LAST_PRODUCTION_DATE_KEY: &str = "lastProductionDate";

fn settings_key(id: Uuid) -> String {
    format!("labelSettings_{id}")
}

/// Flat key→JSON store over one file. Loaded eagerly; every mutation
/// persists immediately.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonStore {
    /// Opens the store, creating an empty one if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<JsonStore, LabelError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(JsonStore { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── raw access ──────────────────────────────────────────────────────────

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LabelError> {
        match self.entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), LabelError> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.save()
    }

    pub fn delete(&mut self, key: &str) -> Result<bool, LabelError> {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    // ── label collection ────────────────────────────────────────────────────

    pub fn labels(&self) -> Result<Vec<LabelRecord>, LabelError> {
        Ok(self.get(LABELS_KEY)?.unwrap_or_default())
    }

    pub fn label(&self, id: Uuid) -> Result<Option<LabelRecord>, LabelError> {
        Ok(self.labels()?.into_iter().find(|l| l.id == id))
    }

    /// Inserts or replaces a label by id.
    pub fn save_label(&mut self, label: &LabelRecord) -> Result<(), LabelError> {
        let mut labels = self.labels()?;
        match labels.iter_mut().find(|l| l.id == label.id) {
            Some(slot) => *slot = label.clone(),
            None => labels.push(label.clone()),
        }
        self.set(LABELS_KEY, &labels)
    }

    /// Removes a label and its per-label settings.
    pub fn delete_label(&mut self, id: Uuid) -> Result<bool, LabelError> {
        let mut labels = self.labels()?;
        let before = labels.len();
        labels.retain(|l| l.id != id);
        if labels.len() == before {
            return Ok(false);
        }
        self.entries.remove(&settings_key(id));
        self.set(LABELS_KEY, &labels)?;
        Ok(true)
    }

    // ── per-label settings + production date ────────────────────────────────

    pub fn settings_for(&self, id: Uuid) -> Result<PrintSettings, LabelError> {
        Ok(self.get(&settings_key(id))?.unwrap_or_default())
    }

    pub fn save_settings(&mut self, id: Uuid, settings: &PrintSettings) -> Result<(), LabelError> {
        self.set(&settings_key(id), settings)
    }

    pub fn last_production_date(&self) -> Result<Option<NaiveDate>, LabelError> {
        self.get(LAST_PRODUCTION_DATE_KEY)
    }

    pub fn set_last_production_date(&mut self, date: NaiveDate) -> Result<(), LabelError> {
        self.set(LAST_PRODUCTION_DATE_KEY, &date)
    }

    // ── import / export ─────────────────────────────────────────────────────

    /// Writes the label collection to a standalone JSON file.
    pub fn export_labels(&self, path: &Path) -> Result<usize, LabelError> {
        let labels = self.labels()?;
        let json = serde_json::to_string_pretty(&labels)?;
        std::fs::write(path, json)?;
        info!(count = labels.len(), path = %path.display(), "exported labels");
        Ok(labels.len())
    }

    /// Merges labels from an exported file into the store. Existing ids are
    /// replaced; new ids are appended. Returns the number imported.
    pub fn import_labels(&mut self, path: &Path) -> Result<usize, LabelError> {
        let text = std::fs::read_to_string(path)?;
        let imported: Vec<LabelRecord> = serde_json::from_str(&text)?;
        let count = imported.len();
        let mut labels = self.labels()?;
        for label in imported {
            match labels.iter_mut().find(|l| l.id == label.id) {
                Some(slot) => *slot = label,
                None => labels.push(label),
            }
        }
        self.set(LABELS_KEY, &labels)?;
        info!(count, path = %path.display(), "imported labels");
        Ok(count)
    }

    // ── persistence ─────────────────────────────────────────────────────────

    fn save(&self) -> Result<(), LabelError> {
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(&self.entries)?.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| LabelError::Persistence(e.error))?;
        Ok(())
    }
}

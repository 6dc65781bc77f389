//! Label data model — the persisted record plus the shelf-life derivations.
//!
//! Serialized camelCase throughout. Field values live in a flat key→string
//! map keyed by the catalog's camelCase identifiers; `resolved_fields` layers
//! the derived values (shelf-life text, storage condition, expiry date) on
//! top for the layout engine to consume.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Classifications
// ────────────────────────────────────────────────────────────────────────────

/// Product classification. Bulk food gets its own field catalog, larger
/// fonts, and no nutrition image / corner tag / extra fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductMode {
    #[default]
    PrePackaged,
    Bulk,
}

/// Shelf-life classification, per GB 7718 wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShelfLifeKind {
    #[default]
    Normal,
    NormalWithCold,
    NormalWithFrozen,
    Frozen,
    Dual,
}

/// Shelf-life classification plus the day counts the printed text derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShelfLife {
    #[serde(rename = "shelfLifeType")]
    pub kind: ShelfLifeKind,
    pub normal_days: Option<u32>,
    pub frozen_days: Option<u32>,
}

impl ShelfLife {
    /// The printed shelf-life text, or `None` when the relevant day count is
    /// missing.
    pub fn shelf_life_text(&self) -> Option<String> {
        match self.kind {
            ShelfLifeKind::Dual => match (self.normal_days, self.frozen_days) {
                (Some(n), Some(f)) => Some(format!("常温{n}天，冷冻{f}天")),
                _ => None,
            },
            ShelfLifeKind::Frozen => self.frozen_days.map(|f| format!("{f}天")),
            _ => self.normal_days.map(|n| format!("{n}天")),
        }
    }

    /// The default storage-condition text for this classification. Used only
    /// when the label does not carry an explicit storage condition.
    pub fn storage_condition(&self) -> &'static str {
        match self.kind {
            ShelfLifeKind::NormalWithCold => "常温贮存，开封后需冷藏",
            ShelfLifeKind::NormalWithFrozen => "常温贮存，开封后需冷冻",
            ShelfLifeKind::Frozen => "冷冻贮存（≤-18℃）",
            ShelfLifeKind::Dual => "常温贮存或冷冻贮存（≤-18℃）",
            ShelfLifeKind::Normal => "常温贮存，避免阳光直射",
        }
    }

    /// The "保质期至" text for a given production date, or `None` when the
    /// relevant day count is missing.
    pub fn expiry_text(&self, production: NaiveDate) -> Option<String> {
        let add = |days: u32| production.checked_add_days(Days::new(days as u64));
        match self.kind {
            ShelfLifeKind::Dual => match (self.normal_days, self.frozen_days) {
                (Some(n), Some(f)) => {
                    let normal = format_cn_date(add(n)?);
                    let frozen = format_cn_date(add(f)?);
                    Some(format!("常温{normal}，冷冻{frozen}"))
                }
                _ => None,
            },
            ShelfLifeKind::Frozen => self.frozen_days.and_then(add).map(format_cn_date),
            _ => self.normal_days.and_then(add).map(format_cn_date),
        }
    }
}

/// Formats a date the way the printed label expects: `YYYY年MM月DD日`.
pub fn format_cn_date(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Record
// ────────────────────────────────────────────────────────────────────────────

/// A user-defined extra field, appended after the catalog fields
/// (pre-packaged mode only).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtraField {
    pub label: String,
    pub value: String,
}

impl ExtraField {
    /// Only rows with both halves filled in are printed.
    pub fn is_complete(&self) -> bool {
        !self.label.is_empty() && !self.value.is_empty()
    }
}

/// A named collection of field values — one saved label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelRecord {
    pub id: Uuid,
    pub label_name: Option<String>,
    /// Flat field-key → value map, keyed by the catalog's camelCase keys.
    pub fields: BTreeMap<String, String>,
    pub extra_fields: Vec<ExtraField>,
    pub corner_tag: Option<String>,
    /// Nutrition-facts image as a data URI, exactly as uploaded.
    pub nutrition_image: Option<String>,
    #[serde(flatten)]
    pub shelf_life: ShelfLife,
    pub mode: ProductMode,
    pub created_at: DateTime<Utc>,
}

impl Default for LabelRecord {
    fn default() -> Self {
        LabelRecord {
            id: Uuid::new_v4(),
            label_name: None,
            fields: BTreeMap::new(),
            extra_fields: Vec::new(),
            corner_tag: None,
            nutrition_image: None,
            shelf_life: ShelfLife::default(),
            mode: ProductMode::default(),
            created_at: Utc::now(),
        }
    }
}

impl LabelRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// The name shown in lists: the label name, else the product name.
    pub fn display_name(&self) -> &str {
        self.label_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.fields.get("productName").map(String::as_str))
            .unwrap_or("未命名标签")
    }

    /// A stored field value, empty values treated as absent.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn has_packing_date(&self) -> bool {
        self.field("packingDate").is_some()
    }

    /// The field map the layout engine consumes: stored values overlaid with
    /// the derived shelf-life text, storage condition, production date, and
    /// expiry date. Explicitly stored values win over derivations.
    pub fn resolved_fields(&self, production: Option<NaiveDate>) -> BTreeMap<String, String> {
        let mut out = self.fields.clone();
        out.retain(|_, v| !v.is_empty());

        if let Some(text) = self.shelf_life.shelf_life_text() {
            out.insert("shelfLife".to_string(), text);
        }
        if !out.contains_key("storageCondition") {
            out.insert(
                "storageCondition".to_string(),
                self.shelf_life.storage_condition().to_string(),
            );
        }
        if let Some(date) = production {
            out.insert("productionDate".to_string(), format_cn_date(date));
            if let Some(expiry) = self.shelf_life.expiry_text(date) {
                out.insert("expiryDate".to_string(), expiry);
            }
        }
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

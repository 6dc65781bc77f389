//! Field Catalog — the canonical, ordered field lists for each product mode.
//!
//! Field keys are the camelCase identifiers used by the stored label JSON;
//! display labels are the regulated Chinese captions printed on the label.
//! Long-form fields carry prose (ingredients, addresses, usage notes) and are
//! never packed onto a shared line by any future compaction pass.

use crate::models::label::ProductMode;

/// A single catalog entry: storage key, printed caption, prose flag.
/// Static per product mode; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub long_form: bool,
}

const fn field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label, long_form: false }
}

const fn long_field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label, long_form: true }
}

/// Pre-packaged catalog — 17 fields in regulated order.
const PRE_PACKAGED: [FieldSpec; 17] = [
    field("productName", "品名"),
    long_field("ingredients", "配料"),
    field("standardNo", "产品标准号"),
    field("licenseNo", "生产许可证号"),
    field("shelfLife", "保质期"),
    field("productionDate", "生产日期"),
    field("expiryDate", "保质期至"),
    field("storageCondition", "贮存条件"),
    field("netContent", "净含量"),
    field("boxSpec", "箱规"),
    field("origin", "产地"),
    long_field("usage", "食用方法"),
    field("manufacturer", "生产商"),
    field("phone", "联系电话"),
    long_field("address", "地址"),
    long_field("allergen", "致敏物质提示"),
    long_field("tips", "温馨提示"),
];

/// Bulk-food catalog. `packingDate` is the one data-conditional entry: it is
/// present only when the label actually carries a packing date.
fn bulk_food(has_packing_date: bool) -> Vec<FieldSpec> {
    let mut fields = vec![
        field("productName", "品名"),
        field("origin", "产地"),
        long_field("ingredients", "配料"),
        field("licenseNo", "生产许可证号"),
        field("productionDate", "生产日期"),
        field("shelfLife", "保质期"),
    ];
    if has_packing_date {
        fields.push(field("packingDate", "分装日期"));
    }
    fields.extend([
        field("storageCondition", "贮存条件"),
        long_field("usage", "食用方法"),
        field("manufacturer", "生产商"),
        long_field("address", "地址"),
        field("phone", "联系电话"),
        field("operator", "经营者"),
        field("operatorPhone", "经营者电话"),
        long_field("tips", "温馨提示"),
    ]);
    fields
}

/// Returns the ordered catalog for a product mode.
///
/// `has_packing_date` is only consulted in bulk mode. Extra (user-defined)
/// fields are not part of the catalog — the engine appends them after these,
/// and only in pre-packaged mode.
pub fn fields_for(mode: ProductMode, has_packing_date: bool) -> Vec<FieldSpec> {
    match mode {
        ProductMode::PrePackaged => PRE_PACKAGED.to_vec(),
        ProductMode::Bulk => bulk_food(has_packing_date),
    }
}

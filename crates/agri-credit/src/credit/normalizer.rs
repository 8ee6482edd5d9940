use serde_json::Value;
use tracing::debug;

use super::domain::{AttributeOrigin, FarmerAttributes, RawAttributes};
use super::ruleset::{CropClassification, IncomeScale, NormalizationConventions, ScoringRuleSet};

const LEGACY_CASH_CROPS: &[&str] = &["cotton", "sugarcane", "wheat"];
const HIGH_VALUE_CROPS: &[&str] = &["cotton", "sugarcane", "vegetables", "fruits", "spices"];
const STAPLE_CROPS: &[&str] = &["rice", "wheat", "maize", "millet", "pulses"];

/// Spelling variants folded before vocabulary lookup. Only spellings are merged here,
/// never one version's vocabulary into another's.
const LABEL_ALIASES: &[(&str, &str)] = &[
    ("tube_well", "tubewell"),
    ("rain_water", "rainwater"),
    ("rain_fed", "rainfed"),
    ("farm_pond", "pond"),
    ("no-default", "no_default"),
    ("minor-delay", "minor_delay"),
];

/// Coerces raw payloads into [`FarmerAttributes`] following one rule set's conventions.
///
/// Never fails: absent or malformed values fall back to the field default.
#[derive(Debug, Clone, Copy)]
pub struct AttributeNormalizer<'a> {
    conventions: &'a NormalizationConventions,
}

impl<'a> AttributeNormalizer<'a> {
    pub fn new(conventions: &'a NormalizationConventions) -> Self {
        Self { conventions }
    }

    pub fn for_rule_set(rule_set: &'a ScoringRuleSet) -> Self {
        Self::new(rule_set.conventions())
    }

    pub fn normalize(&self, raw: &RawAttributes, origin: AttributeOrigin) -> FarmerAttributes {
        let income = coerce_amount("annualIncome", raw.annual_income.as_ref());
        let annual_income = match (origin, self.conventions.income_scale) {
            (AttributeOrigin::ProfileRecord, IncomeScale::Lakhs) => income / IncomeScale::LAKH,
            _ => income,
        };

        let repayment_history = coerce_label(raw.repayment_history.as_ref())
            .unwrap_or_else(|| self.conventions.default_repayment_history.clone());
        let irrigation_source = coerce_label(raw.irrigation_source.as_ref())
            .unwrap_or_else(|| self.conventions.default_irrigation_source.clone());

        FarmerAttributes {
            land_holding: coerce_amount("landHolding", raw.land_holding.as_ref()),
            crop_type: classify_crop(
                coerce_label(raw.crop_type.as_ref()),
                self.conventions.crop_classification,
            ),
            annual_income,
            existing_loans: coerce_amount("existingLoans", raw.existing_loans.as_ref()),
            repayment_history,
            crop_yield: coerce_amount("cropYield", raw.crop_yield.as_ref()),
            irrigation_source,
            farming_experience: coerce_years(raw.farming_experience.as_ref()),
        }
    }
}

/// Lowercases, strips invisible characters, and joins words with `_`.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let lowered = joined.to_ascii_lowercase();
    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lowered)
}

fn coerce_label(value: Option<&Value>) -> Option<String> {
    let label = match value? {
        Value::String(text) => normalize_label(text),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        // Accepts grouped figures such as "1,20,000".
        Value::String(text) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

fn coerce_amount(field: &'static str, value: Option<&Value>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    if matches!(value, Value::String(text) if text.trim().is_empty()) {
        return 0.0;
    }
    match parse_number(value) {
        Some(amount) if amount.is_finite() && amount >= 0.0 => amount,
        _ => {
            debug!(field, %value, "malformed attribute replaced by default");
            0.0
        }
    }
}

fn coerce_years(value: Option<&Value>) -> u32 {
    let years = coerce_amount("farmingExperience", value).trunc();
    if years >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        years as u32
    }
}

fn classify_crop(label: Option<String>, classification: CropClassification) -> String {
    let label = label.unwrap_or_default();
    match classification {
        CropClassification::Legacy => match label.as_str() {
            "cash_crop" | "mixed_crop" | "staple" | "other" => label,
            name if LEGACY_CASH_CROPS.contains(&name) => "cash_crop".to_string(),
            _ => "mixed_crop".to_string(),
        },
        CropClassification::Tiered => match label.as_str() {
            "high_value" | "staple" | "other" => label,
            name if HIGH_VALUE_CROPS.contains(&name) => "high_value".to_string(),
            name if STAPLE_CROPS.contains(&name) => "staple".to_string(),
            _ => "other".to_string(),
        },
    }
}

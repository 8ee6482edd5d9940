use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for farmers known to the profile store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FarmerId(pub String);

impl fmt::Display for FarmerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FarmerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where a raw payload came from. Profile records carry income in whole currency
/// units, while evaluation requests are already expressed in the rule set's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeOrigin {
    EvaluationRequest,
    ProfileRecord,
}

/// Untyped attribute payload as received from a caller or a profile row.
///
/// Every slot is optional and holds whatever JSON value was supplied; coercion into
/// [`FarmerAttributes`] happens in the normalizer. Keys are matched without regard
/// to case, `_` or `-`, so `land_holding`, `landHolding` and `LAND-HOLDING` all land
/// in the same slot. Unrecognised keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", rename_all = "camelCase")]
pub struct RawAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_holding: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_loans: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repayment_history: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_yield: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation_source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farming_experience: Option<Value>,
}

impl RawAttributes {
    /// Stores `value` under the slot matching `key`. Returns `false` when the key is
    /// not a recognised attribute. `null` clears the slot.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        let folded: String = key
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-' && !ch.is_whitespace())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        let slot = match folded.as_str() {
            "landholding" => &mut self.land_holding,
            "croptype" | "primarycrop" | "crop" => &mut self.crop_type,
            "annualincome" | "income" => &mut self.annual_income,
            "existingloans" | "loans" => &mut self.existing_loans,
            "repaymenthistory" => &mut self.repayment_history,
            "cropyield" | "yield" => &mut self.crop_yield,
            "irrigationsource" | "irrigation" => &mut self.irrigation_source,
            "farmingexperience" | "experience" => &mut self.farming_experience,
            _ => return false,
        };

        *slot = if value.is_null() { None } else { Some(value) };
        true
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Map<String, Value>> for RawAttributes {
    fn from(map: Map<String, Value>) -> Self {
        let mut raw = Self::default();
        for (key, value) in map {
            raw.set(&key, value);
        }
        raw
    }
}

/// Complete, typed attribute record consumed by the evaluator.
///
/// Categorical fields stay as normalized strings because each rule-set version has
/// its own vocabulary for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerAttributes {
    pub land_holding: f64,
    pub crop_type: String,
    pub annual_income: f64,
    pub existing_loans: f64,
    pub repayment_history: String,
    pub crop_yield: f64,
    pub irrigation_source: String,
    pub farming_experience: u32,
}

impl FarmerAttributes {
    /// Outstanding loans relative to income, with the denominator floored at 1 so
    /// the ratio stays finite for zero income.
    pub fn debt_ratio(&self) -> f64 {
        self.existing_loans / self.annual_income.max(1.0)
    }
}

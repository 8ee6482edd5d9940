//! Versioned scoring tables.
//!
//! A [`ScoringRuleSet`] is built once through [`ScoringRuleSetBuilder`] and never
//! mutated afterwards; tuning the algorithm means registering a new version. Each
//! [`FactorRule`] maps one farmer attribute to points using either descending
//! `>=` thresholds, ascending `<=` thresholds, a category lookup with a fallback
//! entry, or the debt-ratio measure applied to outstanding loans.

mod catalog;
mod registry;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::evaluation::RatingPolicy;

pub use catalog::{POINTS_V2, POINTS_V2_1, WEIGHTED_V1};
pub use registry::{RegistryError, RuleSetRegistry, RuleSetSummary};

/// Attributes a rule can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
    LandHolding,
    CropType,
    AnnualIncome,
    ExistingLoans,
    RepaymentHistory,
    CropYield,
    IrrigationSource,
    FarmingExperience,
}

impl Factor {
    pub const fn key(self) -> &'static str {
        match self {
            Factor::LandHolding => "landHolding",
            Factor::CropType => "cropType",
            Factor::AnnualIncome => "annualIncome",
            Factor::ExistingLoans => "existingLoans",
            Factor::RepaymentHistory => "repaymentHistory",
            Factor::CropYield => "cropYield",
            Factor::IrrigationSource => "irrigationSource",
            Factor::FarmingExperience => "farmingExperience",
        }
    }

    pub const fn is_categorical(self) -> bool {
        matches!(
            self,
            Factor::CropType | Factor::RepaymentHistory | Factor::IrrigationSource
        )
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The two scoring families observed across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringFamily {
    /// Every bucket contributes 1x, 2x or 3x the factor's importance weight.
    WeightMultiplier,
    /// Buckets carry absolute points whose maxima add up to `ceiling`.
    MaxPoints { ceiling: i32 },
}

/// Unit the rule set expects `annualIncome` in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeScale {
    Currency,
    /// Multiples of 100,000 currency units.
    Lakhs,
}

impl IncomeScale {
    pub const LAKH: f64 = 100_000.0;
}

/// How a raw crop name is folded into the rule set's crop vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropClassification {
    /// cotton, sugarcane and wheat are `cash_crop`; other crop names `mixed_crop`.
    /// Already categorised labels (`staple`, `other`) pass through.
    Legacy,
    /// `high_value`, `staple` or `other`.
    Tiered,
}

/// Input conventions a rule set expects the normalizer to honour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationConventions {
    pub income_scale: IncomeScale,
    pub crop_classification: CropClassification,
    pub default_repayment_history: String,
    pub default_irrigation_source: String,
}

impl NormalizationConventions {
    pub fn legacy() -> Self {
        Self {
            income_scale: IncomeScale::Lakhs,
            crop_classification: CropClassification::Legacy,
            default_repayment_history: "no_data".to_string(),
            default_irrigation_source: "rainfed".to_string(),
        }
    }

    pub fn tiered() -> Self {
        Self {
            income_scale: IncomeScale::Currency,
            crop_classification: CropClassification::Tiered,
            default_repayment_history: "none".to_string(),
            default_irrigation_source: "rainwater".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Highest bound the value meets or exceeds wins.
    AtLeast,
    /// Lowest bound the value does not exceed wins.
    AtMost,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub bound: f64,
    pub points: i32,
}

/// How a factor's value is turned into points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measure {
    Threshold {
        comparison: Comparison,
        buckets: Vec<Bucket>,
        otherwise: i32,
    },
    Category {
        entries: BTreeMap<String, i32>,
        fallback: String,
    },
    /// No loans earn `no_debt` flat; otherwise `existingLoans / max(annualIncome, 1)`
    /// is scored against `<=` buckets.
    DebtRatio {
        no_debt: i32,
        buckets: Vec<Bucket>,
        otherwise: i32,
    },
}

/// One factor's scoring table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRule {
    factor: Factor,
    weight: Option<i32>,
    measure: Measure,
    /// Set when weighting pushed a bucket past `i32`; rejected by `build()`.
    #[serde(skip)]
    overflowed: bool,
}

impl FactorRule {
    pub fn at_least(factor: Factor, buckets: &[(f64, i32)], otherwise: i32) -> Self {
        Self::threshold(factor, Comparison::AtLeast, buckets, otherwise)
    }

    pub fn at_most(factor: Factor, buckets: &[(f64, i32)], otherwise: i32) -> Self {
        Self::threshold(factor, Comparison::AtMost, buckets, otherwise)
    }

    fn threshold(
        factor: Factor,
        comparison: Comparison,
        buckets: &[(f64, i32)],
        otherwise: i32,
    ) -> Self {
        Self {
            factor,
            weight: None,
            measure: Measure::Threshold {
                comparison,
                buckets: ordered_buckets(comparison, buckets),
                otherwise,
            },
            overflowed: false,
        }
    }

    pub fn category(factor: Factor, entries: &[(&str, i32)], fallback: &str) -> Self {
        Self {
            factor,
            weight: None,
            measure: Measure::Category {
                entries: entries
                    .iter()
                    .map(|(key, points)| (key.to_string(), *points))
                    .collect(),
                fallback: fallback.to_string(),
            },
            overflowed: false,
        }
    }

    pub fn debt_ratio(no_debt: i32, buckets: &[(f64, i32)], otherwise: i32) -> Self {
        Self {
            factor: Factor::ExistingLoans,
            weight: None,
            measure: Measure::DebtRatio {
                no_debt,
                buckets: ordered_buckets(Comparison::AtMost, buckets),
                otherwise,
            },
            overflowed: false,
        }
    }

    /// Scales every bucket by `weight`, turning 1/2/3 multipliers into points.
    pub fn weighted(mut self, weight: i32) -> Self {
        let mut overflowed = false;
        let mut scale = |points: &mut i32| {
            let current = *points;
            *points = current.checked_mul(weight).unwrap_or_else(|| {
                overflowed = true;
                current.saturating_mul(weight)
            });
        };
        match &mut self.measure {
            Measure::Threshold {
                buckets, otherwise, ..
            }
            | Measure::DebtRatio {
                buckets, otherwise, ..
            } => {
                buckets.iter_mut().for_each(|bucket| scale(&mut bucket.points));
                scale(otherwise);
            }
            Measure::Category { entries, .. } => entries.values_mut().for_each(&mut scale),
        }
        if let Measure::DebtRatio { no_debt, .. } = &mut self.measure {
            scale(no_debt);
        }
        self.overflowed |= overflowed;
        self.weight = Some(weight);
        self
    }

    pub fn factor(&self) -> Factor {
        self.factor
    }

    pub fn weight(&self) -> Option<i32> {
        self.weight
    }

    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    /// Largest contribution this rule can make.
    pub fn max_points(&self) -> i32 {
        match &self.measure {
            Measure::Threshold {
                buckets, otherwise, ..
            } => buckets
                .iter()
                .map(|bucket| bucket.points)
                .fold(*otherwise, i32::max),
            Measure::Category { entries, .. } => entries.values().copied().max().unwrap_or(0),
            Measure::DebtRatio {
                no_debt,
                buckets,
                otherwise,
            } => buckets
                .iter()
                .map(|bucket| bucket.points)
                .fold((*no_debt).max(*otherwise), i32::max),
        }
    }

    fn min_points(&self) -> i32 {
        match &self.measure {
            Measure::Threshold {
                buckets, otherwise, ..
            } => buckets
                .iter()
                .map(|bucket| bucket.points)
                .fold(*otherwise, i32::min),
            Measure::Category { entries, .. } => entries.values().copied().min().unwrap_or(0),
            Measure::DebtRatio {
                no_debt,
                buckets,
                otherwise,
            } => buckets
                .iter()
                .map(|bucket| bucket.points)
                .fold((*no_debt).min(*otherwise), i32::min),
        }
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        let factor = self.factor;
        if self.overflowed {
            return Err(RuleSetError::PointsOverflow(factor));
        }
        match &self.measure {
            Measure::Threshold { buckets, .. } => {
                if factor.is_categorical() {
                    return Err(RuleSetError::MeasureMismatch(factor));
                }
                validate_bounds(factor, buckets)
            }
            Measure::Category { entries, fallback } => {
                if !factor.is_categorical() {
                    return Err(RuleSetError::MeasureMismatch(factor));
                }
                if !entries.contains_key(fallback) {
                    return Err(RuleSetError::UnknownFallback {
                        factor,
                        fallback: fallback.clone(),
                    });
                }
                Ok(())
            }
            Measure::DebtRatio { buckets, .. } => validate_bounds(factor, buckets),
        }
    }
}

fn checked_total(values: impl IntoIterator<Item = i32>) -> Option<i32> {
    values
        .into_iter()
        .try_fold(0i32, |total, value| total.checked_add(value))
}

fn ordered_buckets(comparison: Comparison, buckets: &[(f64, i32)]) -> Vec<Bucket> {
    let mut ordered: Vec<Bucket> = buckets
        .iter()
        .map(|(bound, points)| Bucket {
            bound: *bound,
            points: *points,
        })
        .collect();
    match comparison {
        Comparison::AtLeast => ordered.sort_by(|a, b| b.bound.total_cmp(&a.bound)),
        Comparison::AtMost => ordered.sort_by(|a, b| a.bound.total_cmp(&b.bound)),
    }
    ordered
}

fn validate_bounds(factor: Factor, buckets: &[Bucket]) -> Result<(), RuleSetError> {
    if buckets.iter().any(|bucket| !bucket.bound.is_finite()) {
        return Err(RuleSetError::InvalidBound(factor));
    }
    if buckets.windows(2).any(|pair| pair[0].bound == pair[1].bound) {
        return Err(RuleSetError::InvalidBound(factor));
    }
    Ok(())
}

/// Immutable, versioned collection of factor rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringRuleSet {
    version: String,
    family: ScoringFamily,
    conventions: NormalizationConventions,
    rating: RatingPolicy,
    rules: Vec<FactorRule>,
}

impl ScoringRuleSet {
    pub fn builder(version: impl Into<String>, family: ScoringFamily) -> ScoringRuleSetBuilder {
        ScoringRuleSetBuilder {
            version: version.into(),
            family,
            conventions: NormalizationConventions::tiered(),
            rating: RatingPolicy::Unrated,
            rules: Vec::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn family(&self) -> ScoringFamily {
        self.family
    }

    pub fn conventions(&self) -> &NormalizationConventions {
        &self.conventions
    }

    pub fn rating_policy(&self) -> &RatingPolicy {
        &self.rating
    }

    pub fn rules(&self) -> &[FactorRule] {
        &self.rules
    }

    pub fn rule(&self, factor: Factor) -> Option<&FactorRule> {
        self.rules.iter().find(|rule| rule.factor == factor)
    }

    /// Sum of importance weights; zero for unweighted families.
    pub fn total_weight(&self) -> i32 {
        self.rules.iter().filter_map(|rule| rule.weight).sum()
    }

    pub fn max_score(&self) -> i32 {
        self.rules.iter().map(FactorRule::max_points).sum()
    }

    pub fn uses_debt_ratio(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(rule.measure, Measure::DebtRatio { .. }))
    }
}

/// Collects rules and validates them into a [`ScoringRuleSet`].
#[derive(Debug, Clone)]
pub struct ScoringRuleSetBuilder {
    version: String,
    family: ScoringFamily,
    conventions: NormalizationConventions,
    rating: RatingPolicy,
    rules: Vec<FactorRule>,
}

impl ScoringRuleSetBuilder {
    pub fn conventions(mut self, conventions: NormalizationConventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn rating(mut self, rating: RatingPolicy) -> Self {
        self.rating = rating;
        self
    }

    pub fn rule(mut self, rule: FactorRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Result<ScoringRuleSet, RuleSetError> {
        let version = self.version.trim().to_string();
        if version.is_empty() {
            return Err(RuleSetError::MissingVersion);
        }
        if self.rules.is_empty() {
            return Err(RuleSetError::NoRules(version));
        }

        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.factor) {
                return Err(RuleSetError::DuplicateFactor(rule.factor));
            }
            rule.validate()?;
            match (self.family, rule.weight) {
                (ScoringFamily::WeightMultiplier, None) => {
                    return Err(RuleSetError::MissingWeight(rule.factor));
                }
                (ScoringFamily::WeightMultiplier, Some(weight)) if weight <= 0 => {
                    return Err(RuleSetError::MissingWeight(rule.factor));
                }
                (ScoringFamily::MaxPoints { .. }, Some(_)) => {
                    return Err(RuleSetError::UnexpectedWeight(rule.factor));
                }
                _ => {}
            }
        }

        if matches!(self.rating, RatingPolicy::WeightFraction { .. })
            && self.family != ScoringFamily::WeightMultiplier
        {
            return Err(RuleSetError::RatingRequiresWeights(version));
        }

        let totals_fit = checked_total(self.rules.iter().map(FactorRule::max_points)).is_some()
            && checked_total(self.rules.iter().map(FactorRule::min_points)).is_some()
            && checked_total(self.rules.iter().filter_map(|rule| rule.weight)).is_some();
        if !totals_fit {
            return Err(RuleSetError::ScoreOverflow(version));
        }

        let rule_set = ScoringRuleSet {
            version,
            family: self.family,
            conventions: self.conventions,
            rating: self.rating,
            rules: self.rules,
        };

        if let ScoringFamily::MaxPoints { ceiling } = rule_set.family {
            let max_score = rule_set.max_score();
            if max_score > ceiling {
                return Err(RuleSetError::ExceedsCeiling { max_score, ceiling });
            }
        }

        Ok(rule_set)
    }
}

/// Validation failures raised while building a rule set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleSetError {
    #[error("rule set version must not be empty")]
    MissingVersion,
    #[error("rule set {0} has no factor rules")]
    NoRules(String),
    #[error("factor {0} is scored more than once")]
    DuplicateFactor(Factor),
    #[error("factor {0} does not support this measure")]
    MeasureMismatch(Factor),
    #[error("factor {0} has duplicate or non-finite bucket bounds")]
    InvalidBound(Factor),
    #[error("fallback '{fallback}' is not an entry of factor {factor}")]
    UnknownFallback { factor: Factor, fallback: String },
    #[error("factor {0} needs a positive importance weight")]
    MissingWeight(Factor),
    #[error("factor {0} carries a weight outside the weight-multiplier family")]
    UnexpectedWeight(Factor),
    #[error("rule set {0} derives rating thresholds from weights but is not weighted")]
    RatingRequiresWeights(String),
    #[error("weighting factor {0} overflows its bucket points")]
    PointsOverflow(Factor),
    #[error("scores of rule set {0} do not fit in 32 bits")]
    ScoreOverflow(String),
    #[error("maximum score {max_score} exceeds the family ceiling {ceiling}")]
    ExceedsCeiling { max_score: i32, ceiling: i32 },
}

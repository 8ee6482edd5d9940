//! Loan and government-scheme eligibility derived from a persisted credit score.
//!
//! The tiers are expressed on the 850-point scale; weight-multiplier scores always
//! land in the lowest tier.

use serde::{Deserialize, Serialize};

use super::domain::FarmerAttributes;

const DEFAULT_SCHEME_LIMIT: usize = 3;
const HIGH_MATCH_THRESHOLD: u32 = 70;

/// Loan terms offered for a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanEligibility {
    pub status: &'static str,
    /// Rupees.
    pub max_amount: u64,
    pub interest_rate_percent: u8,
    pub term: &'static str,
}

pub fn loan_eligibility(score: i32) -> LoanEligibility {
    let (max_amount, interest_rate_percent) = match score {
        s if s >= 750 => (1_000_000, 8),
        s if s >= 650 => (750_000, 10),
        s if s >= 550 => (500_000, 12),
        _ => (250_000, 14),
    };

    LoanEligibility {
        status: if score >= 550 {
            "Eligible"
        } else {
            "Limited Options"
        },
        max_amount,
        interest_rate_percent,
        term: "12 months",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeCategory {
    Credit,
    Infrastructure,
    #[serde(rename = "Technical Support")]
    TechnicalSupport,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDescriptor {
    pub id: String,
    pub name: String,
    pub category: SchemeCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchLevel {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeMatch {
    pub scheme: SchemeDescriptor,
    pub eligibility_score: u32,
    pub level: MatchLevel,
}

/// Base points by score tier plus a category-specific bonus, out of 75.
pub fn scheme_eligibility_score(
    score: i32,
    inputs: &FarmerAttributes,
    category: &SchemeCategory,
) -> u32 {
    let base = match score {
        s if s >= 750 => 40,
        s if s >= 650 => 30,
        s if s >= 550 => 20,
        _ => 10,
    };

    let bonus = match category {
        SchemeCategory::Credit if score >= 650 => 35,
        SchemeCategory::Infrastructure if inputs.land_holding >= 5.0 => 35,
        SchemeCategory::TechnicalSupport if inputs.farming_experience >= 5 => 35,
        SchemeCategory::Credit
        | SchemeCategory::Infrastructure
        | SchemeCategory::TechnicalSupport => 20,
        SchemeCategory::Other(_) => 25,
    };

    base + bonus
}

/// Best matches first; ties keep input order. `limit` defaults to three.
pub fn rank_schemes(
    score: i32,
    inputs: &FarmerAttributes,
    schemes: Vec<SchemeDescriptor>,
    limit: Option<usize>,
) -> Vec<SchemeMatch> {
    let mut matches: Vec<SchemeMatch> = schemes
        .into_iter()
        .map(|scheme| {
            let eligibility_score = scheme_eligibility_score(score, inputs, &scheme.category);
            let level = if eligibility_score >= HIGH_MATCH_THRESHOLD {
                MatchLevel::High
            } else {
                MatchLevel::Medium
            };
            SchemeMatch {
                scheme,
                eligibility_score,
                level,
            }
        })
        .collect();

    matches.sort_by(|a, b| b.eligibility_score.cmp(&a.eligibility_score));
    matches.truncate(limit.unwrap_or(DEFAULT_SCHEME_LIMIT));
    matches
}

use super::super::domain::FarmerAttributes;
use super::super::ruleset::{Bucket, Comparison, Factor, FactorRule, Measure};
use super::ScoreComponent;

enum FactorValue<'a> {
    Numeric(f64),
    Category(&'a str),
}

fn factor_value(factor: Factor, attributes: &FarmerAttributes) -> FactorValue<'_> {
    match factor {
        Factor::LandHolding => FactorValue::Numeric(attributes.land_holding),
        Factor::CropType => FactorValue::Category(&attributes.crop_type),
        Factor::AnnualIncome => FactorValue::Numeric(attributes.annual_income),
        Factor::ExistingLoans => FactorValue::Numeric(attributes.existing_loans),
        Factor::RepaymentHistory => FactorValue::Category(&attributes.repayment_history),
        Factor::CropYield => FactorValue::Numeric(attributes.crop_yield),
        Factor::IrrigationSource => FactorValue::Category(&attributes.irrigation_source),
        Factor::FarmingExperience => {
            FactorValue::Numeric(f64::from(attributes.farming_experience))
        }
    }
}

/// Buckets arrive pre-sorted: descending for `AtLeast`, ascending for `AtMost`.
fn resolve_threshold(
    comparison: Comparison,
    buckets: &[Bucket],
    otherwise: i32,
    value: f64,
) -> (i32, Option<f64>) {
    buckets
        .iter()
        .find(|bucket| match comparison {
            Comparison::AtLeast => value >= bucket.bound,
            Comparison::AtMost => value <= bucket.bound,
        })
        .map(|bucket| (bucket.points, Some(bucket.bound)))
        .unwrap_or((otherwise, None))
}

fn threshold_notes(comparison: Comparison, value: f64, bound: Option<f64>) -> String {
    match (comparison, bound) {
        (Comparison::AtLeast, Some(bound)) => format!("{value:.2} meets >= {bound:.2}"),
        (Comparison::AtMost, Some(bound)) => format!("{value:.2} within <= {bound:.2}"),
        (_, None) => format!("{value:.2} falls in the base bucket"),
    }
}

pub(crate) fn score_factor(rule: &FactorRule, attributes: &FarmerAttributes) -> ScoreComponent {
    let factor = rule.factor();
    let (points, notes) = match (rule.measure(), factor_value(factor, attributes)) {
        (
            Measure::Threshold {
                comparison,
                buckets,
                otherwise,
            },
            FactorValue::Numeric(value),
        ) => {
            let (points, bound) = resolve_threshold(*comparison, buckets, *otherwise, value);
            (points, threshold_notes(*comparison, value, bound))
        }
        (Measure::Category { entries, fallback }, FactorValue::Category(value)) => {
            match entries.get(value) {
                Some(points) => (*points, format!("'{value}' matched")),
                None => (
                    entries.get(fallback).copied().unwrap_or(0),
                    format!("'{value}' unrecognised, scored as '{fallback}'"),
                ),
            }
        }
        (
            Measure::DebtRatio {
                no_debt,
                buckets,
                otherwise,
            },
            _,
        ) => {
            if attributes.existing_loans <= 0.0 {
                (*no_debt, "no outstanding loans".to_string())
            } else {
                let ratio = attributes.debt_ratio();
                let (points, bound) =
                    resolve_threshold(Comparison::AtMost, buckets, *otherwise, ratio);
                (
                    points,
                    format!(
                        "debt ratio {}",
                        threshold_notes(Comparison::AtMost, ratio, bound)
                    ),
                )
            }
        }
        // Rule sets are validated so a measure always matches its factor's kind.
        _ => (0, "measure does not apply to this factor".to_string()),
    };

    ScoreComponent {
        factor,
        points,
        notes,
    }
}

use super::super::evaluation::RatingPolicy;
use super::{
    Factor, FactorRule, NormalizationConventions, RuleSetError, ScoringFamily, ScoringRuleSet,
};

pub const WEIGHTED_V1: &str = "1.0";
pub const POINTS_V2: &str = "2.0";
pub const POINTS_V2_1: &str = "2.1";

const POINTS_CEILING: i32 = 850;

pub(crate) fn standard_rule_sets() -> Result<Vec<ScoringRuleSet>, RuleSetError> {
    Ok(vec![weighted_v1()?, points_v2()?, points_v2_1()?])
}

/// Importance weights with 1x/2x/3x buckets; income in lakhs.
pub(crate) fn weighted_v1() -> Result<ScoringRuleSet, RuleSetError> {
    ScoringRuleSet::builder(WEIGHTED_V1, ScoringFamily::WeightMultiplier)
        .conventions(NormalizationConventions::legacy())
        .rating(RatingPolicy::weight_fraction())
        .rule(FactorRule::at_least(Factor::LandHolding, &[(10.0, 3), (5.0, 2)], 1).weighted(3))
        .rule(
            FactorRule::category(
                Factor::CropType,
                &[("cash_crop", 3), ("mixed_crop", 2), ("other", 1)],
                "other",
            )
            .weighted(2),
        )
        .rule(FactorRule::at_least(Factor::AnnualIncome, &[(10.0, 3), (5.0, 2)], 1).weighted(3))
        .rule(FactorRule::at_most(Factor::ExistingLoans, &[(0.0, 3), (2.0, 2)], 1).weighted(2))
        .rule(
            FactorRule::category(
                Factor::RepaymentHistory,
                &[("no_default", 3), ("minor_delay", 2), ("no_data", 1)],
                "no_data",
            )
            .weighted(4),
        )
        .rule(FactorRule::at_least(Factor::CropYield, &[(25.0, 3), (15.0, 2)], 1).weighted(3))
        .rule(
            FactorRule::category(
                Factor::IrrigationSource,
                &[("full", 3), ("partial", 2), ("rainfed", 1)],
                "rainfed",
            )
            .weighted(2),
        )
        .rule(
            FactorRule::at_least(Factor::FarmingExperience, &[(10.0, 3), (5.0, 2)], 1)
                .weighted(3),
        )
        .build()
}

/// Five-factor absolute-points table; income in currency units.
pub(crate) fn points_v2() -> Result<ScoringRuleSet, RuleSetError> {
    ScoringRuleSet::builder(
        POINTS_V2,
        ScoringFamily::MaxPoints {
            ceiling: POINTS_CEILING,
        },
    )
    .conventions(NormalizationConventions::tiered())
    .rule(FactorRule::at_least(
        Factor::LandHolding,
        &[(10.0, 170), (5.0, 128), (2.0, 85)],
        40,
    ))
    .rule(FactorRule::at_least(
        Factor::AnnualIncome,
        &[(500_000.0, 212), (300_000.0, 170), (100_000.0, 127)],
        85,
    ))
    .rule(FactorRule::at_least(
        Factor::FarmingExperience,
        &[(15.0, 128), (10.0, 106), (5.0, 85)],
        42,
    ))
    .rule(FactorRule::category(
        Factor::RepaymentHistory,
        &[
            ("excellent", 212),
            ("good", 170),
            ("fair", 127),
            ("none", 106),
            ("poor", 42),
        ],
        "poor",
    ))
    .rule(FactorRule::at_least(
        Factor::CropYield,
        &[(30.0, 128), (20.0, 85), (10.0, 64)],
        21,
    ))
    .build()
}

/// Eight factors plus debt ratio, tiered crops and named irrigation sources.
pub(crate) fn points_v2_1() -> Result<ScoringRuleSet, RuleSetError> {
    ScoringRuleSet::builder(
        POINTS_V2_1,
        ScoringFamily::MaxPoints {
            ceiling: POINTS_CEILING,
        },
    )
    .conventions(NormalizationConventions::tiered())
    .rule(FactorRule::at_least(
        Factor::LandHolding,
        &[(10.0, 127), (5.0, 95), (2.0, 64)],
        32,
    ))
    .rule(FactorRule::category(
        Factor::CropType,
        &[("high_value", 85), ("staple", 64), ("other", 32)],
        "other",
    ))
    .rule(FactorRule::at_least(
        Factor::AnnualIncome,
        &[(500_000.0, 127), (300_000.0, 95), (100_000.0, 64)],
        32,
    ))
    .rule(FactorRule::debt_ratio(
        26,
        &[(0.2, 106), (0.4, 80), (0.6, 53)],
        13,
    ))
    .rule(FactorRule::category(
        Factor::RepaymentHistory,
        &[
            ("excellent", 170),
            ("good", 128),
            ("fair", 85),
            ("none", 64),
            ("poor", 21),
        ],
        "poor",
    ))
    .rule(FactorRule::at_least(
        Factor::CropYield,
        &[(30.0, 85), (20.0, 64), (10.0, 43)],
        21,
    ))
    .rule(FactorRule::category(
        Factor::IrrigationSource,
        &[
            ("canal", 85),
            ("tubewell", 85),
            ("pond", 64),
            ("rainwater", 32),
            ("rainfed", 32),
            ("other", 21),
        ],
        "other",
    ))
    .rule(FactorRule::at_least(
        Factor::FarmingExperience,
        &[(15.0, 65), (10.0, 52), (5.0, 39)],
        13,
    ))
    .build()
}

use serde::{Deserialize, Serialize};

/// Three-tier rating produced by rule sets that carry a rating policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditRating {
    #[serde(rename = "Low Credit Rating")]
    Low,
    #[serde(rename = "Average Credit Rating")]
    Average,
    #[serde(rename = "High Credit Rating")]
    High,
}

impl CreditRating {
    pub const fn label(self) -> &'static str {
        match self {
            CreditRating::Low => "Low Credit Rating",
            CreditRating::Average => "Average Credit Rating",
            CreditRating::High => "High Credit Rating",
        }
    }
}

/// Whether and how a rule set turns a score into a [`CreditRating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatingPolicy {
    /// Score only.
    Unrated,
    /// Thresholds are `tenths * total_weight / 10`, compared as real numbers.
    WeightFraction {
        high_tenths: i32,
        average_tenths: i32,
    },
}

impl RatingPolicy {
    /// High at 150% and Average at 80% of the summed factor weights.
    pub const fn weight_fraction() -> Self {
        RatingPolicy::WeightFraction {
            high_tenths: 15,
            average_tenths: 8,
        }
    }

    pub const fn is_rated(&self) -> bool {
        !matches!(self, RatingPolicy::Unrated)
    }

    /// `(high, average)` cut-offs for the given total weight.
    pub fn thresholds(&self, total_weight: i32) -> Option<(f64, f64)> {
        match *self {
            RatingPolicy::Unrated => None,
            RatingPolicy::WeightFraction {
                high_tenths,
                average_tenths,
            } => Some((
                f64::from(high_tenths) * f64::from(total_weight) / 10.0,
                f64::from(average_tenths) * f64::from(total_weight) / 10.0,
            )),
        }
    }

    pub fn rate(&self, score: i32, total_weight: i32) -> Option<CreditRating> {
        let (high, average) = self.thresholds(total_weight)?;
        let score = f64::from(score);
        let rating = if score >= high {
            CreditRating::High
        } else if score >= average {
            CreditRating::Average
        } else {
            CreditRating::Low
        };
        Some(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_fraction_thresholds_are_not_truncated() {
        // 15 * 22 / 10 = 33.0, 8 * 22 / 10 = 17.6
        let policy = RatingPolicy::weight_fraction();
        assert_eq!(policy.thresholds(22), Some((33.0, 17.6)));
        assert_eq!(policy.rate(17, 22), Some(CreditRating::Low));
        assert_eq!(policy.rate(18, 22), Some(CreditRating::Average));
        assert_eq!(policy.rate(32, 22), Some(CreditRating::Average));
        assert_eq!(policy.rate(33, 22), Some(CreditRating::High));
    }

    #[test]
    fn tiers_partition_the_score_range_without_gaps() {
        let policy = RatingPolicy::weight_fraction();
        let mut previous = CreditRating::Low;
        for score in 0..=100 {
            let rating = policy.rate(score, 22).expect("weighted policy rates");
            assert!(rating >= previous, "rating regressed at score {score}");
            previous = rating;
        }
        assert_eq!(previous, CreditRating::High);
    }

    #[test]
    fn unrated_policy_yields_nothing() {
        assert_eq!(RatingPolicy::Unrated.rate(800, 0), None);
        assert_eq!(RatingPolicy::Unrated.thresholds(22), None);
        assert!(!RatingPolicy::Unrated.is_rated());
        assert!(RatingPolicy::weight_fraction().is_rated());
    }

    #[test]
    fn ratings_serialize_as_labels() {
        let json = serde_json::to_string(&CreditRating::High).expect("serializes");
        assert_eq!(json, "\"High Credit Rating\"");
        assert_eq!(CreditRating::Average.label(), "Average Credit Rating");
    }
}

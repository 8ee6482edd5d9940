use crate::credit::domain::FarmerAttributes;
use crate::credit::eligibility::{
    loan_eligibility, rank_schemes, scheme_eligibility_score, MatchLevel, SchemeCategory,
    SchemeDescriptor,
};

fn farmer(land_holding: f64, farming_experience: u32) -> FarmerAttributes {
    FarmerAttributes {
        land_holding,
        crop_type: "staple".to_string(),
        annual_income: 300_000.0,
        existing_loans: 0.0,
        repayment_history: "good".to_string(),
        crop_yield: 20.0,
        irrigation_source: "canal".to_string(),
        farming_experience,
    }
}

fn scheme(id: &str, category: SchemeCategory) -> SchemeDescriptor {
    SchemeDescriptor {
        id: id.to_string(),
        name: format!("Scheme {id}"),
        category,
    }
}

#[test]
fn loan_tiers_follow_score_bands() {
    assert_eq!(loan_eligibility(750).max_amount, 1_000_000);
    assert_eq!(loan_eligibility(749).interest_rate_percent, 10);
    assert_eq!(loan_eligibility(650).max_amount, 750_000);
    assert_eq!(loan_eligibility(550).status, "Eligible");
    assert_eq!(loan_eligibility(549).status, "Limited Options");
    assert_eq!(loan_eligibility(66).max_amount, 250_000);
    assert_eq!(loan_eligibility(0).term, "12 months");
}

#[test]
fn category_bonus_depends_on_farm_profile() {
    let small = farmer(2.0, 3);
    let large = farmer(8.0, 12);

    assert_eq!(scheme_eligibility_score(700, &small, &SchemeCategory::Credit), 65);
    assert_eq!(scheme_eligibility_score(600, &small, &SchemeCategory::Credit), 40);
    assert_eq!(scheme_eligibility_score(600, &small, &SchemeCategory::Infrastructure), 40);
    assert_eq!(scheme_eligibility_score(600, &large, &SchemeCategory::Infrastructure), 55);
    assert_eq!(scheme_eligibility_score(500, &large, &SchemeCategory::TechnicalSupport), 45);
    assert_eq!(
        scheme_eligibility_score(800, &small, &SchemeCategory::Other("Insurance".into())),
        65
    );
}

#[test]
fn ranking_is_stable_and_truncated() {
    let inputs = farmer(8.0, 12);
    let schemes = vec![
        scheme("a", SchemeCategory::Other("Insurance".into())),
        scheme("b", SchemeCategory::Infrastructure),
        scheme("c", SchemeCategory::TechnicalSupport),
        scheme("d", SchemeCategory::Credit),
    ];

    let ranked = rank_schemes(760, &inputs, schemes, None);

    let ids: Vec<&str> = ranked.iter().map(|m| m.scheme.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "d"]);
    assert!(ranked.iter().all(|m| m.level == MatchLevel::High));

    let low = rank_schemes(100, &inputs, vec![scheme("x", SchemeCategory::Credit)], Some(5));
    assert_eq!(low[0].eligibility_score, 30);
    assert_eq!(low[0].level, MatchLevel::Medium);
}

#[test]
fn categories_deserialize_from_display_names() {
    let parsed: Vec<SchemeCategory> =
        serde_json::from_str(r#"["Credit", "Technical Support", "Seeds"]"#).expect("categories");
    assert_eq!(
        parsed,
        vec![
            SchemeCategory::Credit,
            SchemeCategory::TechnicalSupport,
            SchemeCategory::Other("Seeds".to_string()),
        ]
    );
}

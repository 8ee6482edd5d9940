use crate::infra::{build_scoring_service, InMemoryFarmerStore};
use agri_credit::config::AppConfig;
use agri_credit::credit::{
    CreditScorePayload, FarmerCsvImporter, FarmerId, RawAttributes, RuleSetRegistry,
};
use agri_credit::error::AppError;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Farmer identifier used for profile lookup and persistence
    pub(crate) farmer_id: String,
    /// JSON object of raw attributes. Omit to score the stored profile.
    pub(crate) payload: Option<String>,
    /// Rule-set version to score with (defaults to CREDIT_RULE_SET)
    #[arg(long)]
    pub(crate) rule_set: Option<String>,
    /// Profile CSV export to look the farmer up in when no payload is given
    #[arg(long)]
    pub(crate) profiles: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Profile CSV export with a farmer_id column
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Rule-set version to score with (defaults to CREDIT_RULE_SET)
    #[arg(long)]
    pub(crate) rule_set: Option<String>,
}

/// Prints the credit score payload; any failure, persistence included, is returned.
pub(crate) fn run_evaluate(args: EvaluateArgs, config: &AppConfig) -> Result<(), AppError> {
    let EvaluateArgs {
        farmer_id,
        payload,
        rule_set,
        profiles,
    } = args;

    let raw = payload.as_deref().map(parse_payload).transpose()?;
    let store = Arc::new(InMemoryFarmerStore::default());
    if let Some(path) = profiles {
        import_profiles(&store, &path)?;
    }
    let service = build_scoring_service(store, &config.scoring.rule_set_version)?;

    let outcome = service.calculate_with_version(&FarmerId(farmer_id), raw, rule_set.as_deref());
    print_json(&CreditScorePayload::from_outcome(&outcome), true)?;
    outcome.map(|_| ()).map_err(AppError::from)
}

/// Scores every profile in the export, one JSON payload per line.
pub(crate) fn run_batch(args: BatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let store = Arc::new(InMemoryFarmerStore::default());
    let farmer_ids = import_profiles(&store, &args.csv)?;
    let service = build_scoring_service(store, &config.scoring.rule_set_version)?;

    for farmer_id in farmer_ids {
        let outcome = service.calculate_with_version(&farmer_id, None, args.rule_set.as_deref());
        let line = BatchLine {
            farmer_id: &farmer_id,
            payload: CreditScorePayload::from_outcome(&outcome),
        };
        print_json(&line, false)?;
    }
    Ok(())
}

pub(crate) fn run_rule_sets() -> Result<(), AppError> {
    let registry = RuleSetRegistry::standard()?;
    print_json(&registry.summaries(), true)
}

#[derive(Serialize)]
struct BatchLine<'a> {
    farmer_id: &'a FarmerId,
    #[serde(flatten)]
    payload: CreditScorePayload,
}

pub(crate) fn parse_payload(raw: &str) -> Result<RawAttributes, AppError> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::Usage(format!("attribute payload must be a JSON object: {err}")))
}

pub(crate) fn import_profiles(
    store: &InMemoryFarmerStore,
    path: &Path,
) -> Result<Vec<FarmerId>, AppError> {
    let profiles = FarmerCsvImporter::from_path(path)?;
    let farmer_ids = profiles.iter().map(|(id, _)| id.clone()).collect();
    store
        .load_profiles(profiles)
        .map_err(std::io::Error::other)?;
    Ok(farmer_ids)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), AppError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_credit::credit::CreditServiceError;

    #[test]
    fn payload_must_be_an_object() {
        let raw = parse_payload(r#"{"landHolding": "4", "crop": "wheat"}"#).expect("object");
        assert_eq!(raw.land_holding, Some(serde_json::json!("4")));

        assert!(matches!(parse_payload("[1, 2]"), Err(AppError::Usage(_))));
        assert!(matches!(parse_payload("not json"), Err(AppError::Usage(_))));
    }

    #[test]
    fn imported_profiles_are_scored_in_file_order() {
        let path = std::env::temp_dir().join(format!("agri-credit-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "farmer_id,land_holding,annual_income\nF-2,12,1200000\nF-1,1,10000\n",
        )
        .expect("write csv");

        let store = Arc::new(InMemoryFarmerStore::default());
        let ids = import_profiles(&store, &path).expect("import succeeds");
        std::fs::remove_file(&path).ok();
        assert_eq!(ids, vec![FarmerId::from("F-2"), FarmerId::from("F-1")]);

        let service = build_scoring_service(store.clone(), "1.0").expect("service builds");
        let scored = service
            .calculate_credit_score(&ids[0], None)
            .expect("profile scored");
        assert_eq!(scored.inputs().annual_income, 12.0);

        match service.calculate_credit_score(&FarmerId::from("F-404"), None) {
            Err(CreditServiceError::MissingData(_)) => {}
            other => panic!("expected missing data, got {other:?}"),
        }
    }
}

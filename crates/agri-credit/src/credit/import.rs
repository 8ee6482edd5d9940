use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use super::domain::{FarmerId, RawAttributes};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingFarmerId { row: usize },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read profile export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid profile CSV data: {}", err),
            ImportError::MissingFarmerId { row } => {
                write!(f, "profile row {} has no farmer_id", row)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::MissingFarmerId { .. } => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads headered profile exports into raw attribute payloads keyed by farmer.
pub struct FarmerCsvImporter;

impl FarmerCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<(FarmerId, RawAttributes)>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<(FarmerId, RawAttributes)>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut profiles = Vec::new();

        for (index, row) in csv_reader
            .deserialize::<BTreeMap<String, String>>()
            .enumerate()
        {
            let row = row?;
            // Header is line 1.
            let line = index + 2;
            let mut farmer_id = None;
            let mut raw = RawAttributes::default();

            for (column, cell) in row {
                if cell.is_empty() {
                    continue;
                }
                if is_farmer_id_column(&column) {
                    farmer_id = Some(FarmerId(cell));
                } else {
                    raw.set(&column, Value::String(cell));
                }
            }

            let farmer_id = farmer_id.ok_or(ImportError::MissingFarmerId { row: line })?;
            profiles.push((farmer_id, raw));
        }

        Ok(profiles)
    }
}

fn is_farmer_id_column(column: &str) -> bool {
    let folded: String = column
        .chars()
        .filter(|ch| *ch != '_' && *ch != '-' && !ch.is_whitespace())
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    folded == "farmerid"
}

//! Client-side search over a record listing.

use std::str::FromStr;

use tracing::debug;

use crate::error::ValidationError;
use crate::record::{Record, RecordId};

/// Record attribute a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Filename,
    Dataset,
    Model,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [Self::Filename, Self::Dataset, Self::Model];

    pub fn value(self, record: &Record) -> &str {
        match self {
            Self::Filename => &record.filename,
            Self::Dataset => &record.dataset,
            Self::Model => &record.model,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Dataset => "dataset",
            Self::Model => "model",
        }
    }
}

impl FromStr for SearchField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filename" => Ok(Self::Filename),
            "dataset" => Ok(Self::Dataset),
            "model" => Ok(Self::Model),
            other => Err(ValidationError::UnknownSearchField(other.to_string())),
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter records by a case-insensitive substring match on the named field.
///
/// An empty `term` returns every record in input order. A field name other
/// than `filename`, `dataset` or `model` matches nothing.
pub fn filter<'a>(records: &'a [Record], term: &str, field: &str) -> Vec<&'a Record> {
    if term.is_empty() {
        return records.iter().collect();
    }
    match field.parse::<SearchField>() {
        Ok(field) => filter_by(records, term, field),
        Err(e) => {
            debug!(error = %e, "Search field not recognised, returning no matches");
            Vec::new()
        }
    }
}

/// Typed variant of [`filter`].
pub fn filter_by<'a>(records: &'a [Record], term: &str, field: SearchField) -> Vec<&'a Record> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| field.value(r).to_lowercase().contains(&needle))
        .collect()
}

/// Look a record up by id in an already fetched listing.
pub fn find<'a>(records: &'a [Record], id: &RecordId) -> Option<&'a Record> {
    records.iter().find(|r| &r.id == id)
}

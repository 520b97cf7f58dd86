//! Wire format of the remote registry.
//!
//! The registry speaks a positional, Candid-style protocol rendered as JSON:
//! optional values travel as zero-or-one element sequences, results as
//! `{"Ok": ..}` / `{"Err": ..}` variants. This module is the only place that
//! knows about those conventions; everything above it works with
//! [`Record`] and `Option`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::WireError;
use crate::record::{NewRecord, Principal, Record, RecordId};

/// Encode an optional id as an empty or one-element sequence.
pub fn encode_opt(value: Option<&RecordId>) -> Vec<String> {
    value.map(|id| vec![id.as_str().to_string()]).unwrap_or_default()
}

/// Decode a zero-or-one element sequence back into an optional id. A blank
/// value carries no link and decodes as absent.
pub fn decode_opt(seq: Vec<String>) -> Result<Option<RecordId>, WireError> {
    match <[String; 1]>::try_from(seq) {
        Ok([value]) if value.trim().is_empty() => {
            warn!("Blank optional id on the wire, treating as absent");
            Ok(None)
        }
        Ok([value]) => Ok(Some(RecordId::new(value))),
        Err(seq) if seq.is_empty() => Ok(None),
        Err(seq) => Err(WireError::OptionArity(seq.len())),
    }
}

/// Positional upload arguments:
/// `(id, filename, model, dataset, prompt, previous_hash_opt)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadArgs(
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub Vec<String>,
);

/// Upload arguments after decoding, as seen by a registry implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub id: RecordId,
    pub filename: String,
    pub model: String,
    pub dataset: String,
    pub prompt: String,
    pub previous_hash: Option<RecordId>,
}

impl UploadArgs {
    pub fn encode(record: &NewRecord) -> Self {
        let draft = &record.draft;
        Self(
            record.id.as_str().to_string(),
            draft.filename().to_string(),
            draft.model().to_string(),
            draft.dataset().to_string(),
            draft.prompt().to_string(),
            encode_opt(draft.previous_hash()),
        )
    }

    pub fn decode(self) -> Result<UploadRequest, WireError> {
        let Self(id, filename, model, dataset, prompt, previous) = self;
        Ok(UploadRequest {
            id: RecordId::new(id),
            filename,
            model,
            dataset,
            prompt,
            previous_hash: decode_opt(previous)?,
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!([self.0, self.1, self.2, self.3, self.4, self.5])
    }
}

/// Tagged result of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadReply {
    Ok(String),
    Err(String),
}

impl UploadReply {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Ok(msg) => serde_json::json!({ "Ok": msg }),
            Self::Err(msg) => serde_json::json!({ "Err": msg }),
        }
    }
}

/// Decode an upload reply; anything but a single `Ok`/`Err` tag is a shape
/// error.
pub fn decode_reply(value: Value) -> Result<UploadReply, WireError> {
    serde_json::from_value(value).map_err(|e| WireError::Shape(format!("upload reply: {e}")))
}

/// Record as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub id: String,
    pub filename: String,
    pub model: String,
    pub dataset: String,
    pub prompt: String,
    pub previous_hash: Vec<String>,
    pub creator: String,
    #[serde(deserialize_with = "nat64")]
    pub timestamp: u64,
}

impl From<&Record> for WireRecord {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            filename: record.filename.clone(),
            model: record.model.clone(),
            dataset: record.dataset.clone(),
            prompt: record.prompt.clone(),
            previous_hash: encode_opt(record.previous_hash.as_ref()),
            creator: record.creator.as_str().to_string(),
            timestamp: record.timestamp,
        }
    }
}

impl TryFrom<WireRecord> for Record {
    type Error = WireError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecordId::new(wire.id),
            filename: wire.filename,
            model: wire.model,
            dataset: wire.dataset,
            prompt: wire.prompt,
            previous_hash: decode_opt(wire.previous_hash)?,
            creator: Principal::new(wire.creator),
            timestamp: wire.timestamp,
        })
    }
}

/// 64-bit naturals may arrive as JSON numbers or, from bigint-aware
/// encoders, as decimal strings.
fn nat64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Nat64 {
        Number(u64),
        Text(String),
    }

    match Nat64::deserialize(deserializer)? {
        Nat64::Number(n) => Ok(n),
        Nat64::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Decode a single wire record.
pub fn decode_record(value: Value) -> Result<Record, WireError> {
    let wire: WireRecord =
        serde_json::from_value(value).map_err(|e| WireError::Shape(format!("record: {e}")))?;
    Record::try_from(wire)
}

pub fn encode_record(record: &Record) -> Value {
    serde_json::to_value(WireRecord::from(record)).unwrap_or(Value::Null)
}

/// A listing element that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: WireError,
}

/// Result of decoding a record listing element by element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRecord>,
}

/// Decode a listing. Only a non-sequence reply fails as a whole; bad
/// elements are skipped and reported.
pub fn decode_listing(value: Value) -> Result<Listing, WireError> {
    let Value::Array(items) = value else {
        return Err(WireError::Shape("listing is not a sequence".into()));
    };

    let mut listing = Listing::default();
    for (index, item) in items.into_iter().enumerate() {
        match decode_record(item) {
            Ok(record) => listing.records.push(record),
            Err(reason) => {
                warn!(index, error = %reason, "Skipping undecodable record in listing");
                listing.skipped.push(SkippedRecord { index, reason });
            }
        }
    }
    Ok(listing)
}

pub fn encode_listing(records: &[Record]) -> Value {
    Value::Array(records.iter().map(encode_record).collect())
}

/// Decode a lookup reply: `null` or `[]` for not found, `[record]` for found.
pub fn decode_lookup(value: Value) -> Result<Option<Record>, WireError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(mut items) => match items.len() {
            0 => Ok(None),
            1 => decode_record(items.remove(0)).map(Some),
            n => Err(WireError::OptionArity(n)),
        },
        other => Err(WireError::Shape(format!(
            "lookup reply must be a sequence, got {}",
            kind_of(&other)
        ))),
    }
}

pub fn encode_lookup(record: Option<&Record>) -> Value {
    Value::Array(record.map(encode_record).into_iter().collect())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "object",
    }
}

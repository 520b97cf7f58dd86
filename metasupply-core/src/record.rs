use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RequiredField, ValidationError};
use crate::ident::{derive_id, Nonce};

/// Nanoseconds per millisecond; registry timestamps are nanoseconds.
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Opaque identity of the principal that submitted a record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The principal used when no identity has been configured.
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-derived identifier of a record (lowercase hex digest).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One immutable metadata record as stored by the registry.
///
/// Updating a file never touches an existing record: a revision is a new
/// record whose `previous_hash` names the record it supersedes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Content-derived identifier, never reused
    pub id: RecordId,
    /// Human name of the logical file (not unique)
    pub filename: String,
    /// Model that produced the file
    pub model: String,
    /// Dataset the model was trained or prompted on
    pub dataset: String,
    /// Prompt or free-text description, may be empty
    pub prompt: String,
    /// Id of the superseded version; `None` marks a chain root
    pub previous_hash: Option<RecordId>,
    /// Principal that submitted the record
    pub creator: Principal,
    /// Creation instant, nanoseconds since the Unix epoch
    pub timestamp: u64,
}

impl Record {
    /// Creation instant truncated to milliseconds.
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp / NANOS_PER_MILLI
    }

    /// Creation instant as a UTC date-time, if representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.timestamp_millis()).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    pub fn is_root(&self) -> bool {
        self.previous_hash.is_none()
    }

    /// Start a revision of this record: same fields, linked to this id.
    pub fn revise(&self) -> RecordDraft {
        RecordDraft {
            filename: self.filename.clone(),
            model: self.model.clone(),
            dataset: self.dataset.clone(),
            prompt: self.prompt.clone(),
            previous_hash: Some(self.id.clone()),
        }
    }

    /// Encode the whole record as a JSON document suitable for a scannable
    /// (QR) payload.
    pub fn scan_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Validated field values for a record that has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    filename: String,
    model: String,
    dataset: String,
    prompt: String,
    previous_hash: Option<RecordId>,
}

impl RecordDraft {
    /// Create a root draft. `filename`, `model` and `dataset` must be
    /// non-blank; `prompt` may be empty.
    pub fn new(
        filename: impl Into<String>,
        model: impl Into<String>,
        dataset: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let draft = Self {
            filename: filename.into(),
            model: model.into(),
            dataset: dataset.into(),
            prompt: prompt.into(),
            previous_hash: None,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Link this draft to the version it supersedes. A blank id clears the
    /// link, as an empty "previous version" form field would.
    pub fn with_previous(mut self, previous: Option<RecordId>) -> Self {
        self.previous_hash = previous.filter(|id| !id.as_str().trim().is_empty());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Result<Self, ValidationError> {
        self.model = model.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Result<Self, ValidationError> {
        self.dataset = dataset.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (value, field) in [
            (&self.filename, RequiredField::Filename),
            (&self.model, RequiredField::Model),
            (&self.dataset, RequiredField::Dataset),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(field));
            }
        }
        Ok(())
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn previous_hash(&self) -> Option<&RecordId> {
        self.previous_hash.as_ref()
    }

    /// Derive the identifier for this draft and freeze it for submission.
    pub fn prepare(self, creator: &Principal, nonce: &Nonce) -> NewRecord {
        let id = derive_id(
            &self.filename,
            &self.model,
            &self.dataset,
            &self.prompt,
            creator,
            nonce,
        );
        NewRecord { id, draft: self }
    }
}

/// A draft with its derived identifier, ready to be uploaded.
///
/// The registry stamps `creator` and `timestamp` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub id: RecordId,
    pub draft: RecordDraft,
}

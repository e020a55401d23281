//! Decoding of the catalog's response envelope.
//!
//! Every endpoint answers with the same wrapper:
//!
//! ```json
//! {
//!   "datos": [...],
//!   "metadatos": { "fechaActualizacion": "...", "fuenteInfo": "..." },
//!   "numReg": 1
//! }
//! ```
//!
//! Single-item endpoints sometimes send `datos` as an object instead of an
//! array, and answers for missing entries may send it as `null`. All of these
//! decode to a list. Envelope-level fields are optional; record fields are
//! not.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

use crate::error::DecodeError;
use crate::types::{Lookup, Metadata};
use crate::wire::lenient_u64;

/// A decoded envelope carrying raw records of type `T`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Envelope<T> {
    #[serde(rename = "datos", default, deserialize_with = "one_or_many")]
    pub records: Vec<T>,
    #[serde(rename = "metadatos", default)]
    pub metadata: Option<MetadataBlock>,
    #[serde(rename = "numReg", default, deserialize_with = "lenient_u64")]
    pub record_count: Option<u64>,
    /// Upstream status message, present on some error answers.
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataBlock {
    #[serde(rename = "fechaActualizacion", default)]
    pub updated_at: Option<String>,
    #[serde(rename = "fuenteInfo", default)]
    pub source: Option<String>,
}

impl<T> Envelope<T> {
    pub fn metadata(&self) -> Metadata {
        let block = self.metadata.clone().unwrap_or_default();
        Metadata {
            updated_at: block.updated_at,
            source: block.source,
            record_count: self.record_count,
            message: self.message.clone(),
        }
    }

    /// Resolve a single-item answer. Only a record count of exactly one is a
    /// match, whatever `datos` holds.
    pub fn into_lookup(self) -> Lookup<T> {
        match self.record_count {
            Some(1) => self
                .records
                .into_iter()
                .next()
                .map_or(Lookup::NotFound, Lookup::Found),
            Some(count) if count > 1 => Lookup::Ambiguous(count),
            _ => Lookup::NotFound,
        }
    }

    /// Drop records rejected by `keep`. The record count is left untouched.
    pub fn retain(mut self, keep: impl FnMut(&T) -> bool) -> Self {
        self.records.retain(keep);
        self
    }
}

/// Parse `body` as an envelope of `T` records.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<Envelope<T>, DecodeError> {
    Ok(serde_json::from_str(body)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(records)) => records,
        Some(OneOrMany::One(record)) => vec![record],
    })
}

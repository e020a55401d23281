//! Domain entities of the administrative hierarchy.
//!
//! # Design
//! These are the public value types. They are independent from the wire
//! records in `wire.rs`, which mirror the upstream field names; mapping
//! happens in one place so upstream schema changes stay out of the public
//! API. Ids are zero-padded codes and stay strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// A federal entity (first-level division).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
}

/// A municipality (second-level division) inside a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    /// Id of the owning state.
    pub state: String,
    pub name: String,
    /// Locality id of the municipal seat.
    pub first_city: String,
}

/// Urban/rural classification of a locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Urban,
    Rural,
}

impl FromStr for Scope {
    type Err = DecodeError;

    /// Accepts the upstream `ambito` codes, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "U" | "URBAN" | "URBANO" | "URBANA" => Ok(Scope::Urban),
            "R" | "RURAL" => Ok(Scope::Rural),
            _ => Err(DecodeError::UnknownScope(s.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Urban => f.write_str("URBAN"),
            Scope::Rural => f.write_str("RURAL"),
        }
    }
}

/// A locality (third-level division) inside a municipality.
///
/// Coordinates are decimal degrees, altitude is meters above sea level. Each
/// is `None` only when the upstream record omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub id: String,
    pub state: String,
    pub region: String,
    pub name: String,
    pub scope: Scope,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

/// Per-response bookkeeping from the envelope. Only used for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub updated_at: Option<String>,
    pub source: Option<String>,
    pub record_count: Option<u64>,
    /// Free-text `mensaje` the catalog attaches to some answers.
    pub message: Option<String>,
}

/// Outcome of a single-item lookup.
///
/// The catalog reports a missing entry as a successful answer with a zero
/// record count, so "not found" and "matched several records" are results,
/// not errors. Only an exact count of one is `Found`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// The record count was greater than one.
    Ambiguous(u64),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::Ambiguous(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Ambiguous(count) => Lookup::Ambiguous(count),
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Lookup<U>, E> {
        Ok(match self {
            Lookup::Found(value) => Lookup::Found(f(value)?),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Ambiguous(count) => Lookup::Ambiguous(count),
        })
    }
}

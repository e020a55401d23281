//! Raw records as the upstream catalog sends them.
//!
//! Field names follow the upstream JSON. Unknown fields are ignored. Numbers
//! and flags are accepted both as JSON scalars and as strings, because the
//! catalog has published both over time.

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::DecodeError;
use crate::types::{Locality, Region, Scope, State};

#[derive(Debug, Clone, Deserialize)]
pub struct WireState {
    pub cve_agee: String,
    pub nom_agee: String,
    pub nom_abrev: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRegion {
    pub cve_agee: String,
    pub cve_agem: String,
    pub nom_agem: String,
    pub cve_cab: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLocality {
    pub cve_agee: String,
    pub cve_agem: String,
    pub cve_loc: String,
    pub nom_loc: String,
    pub ambito: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitud: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitud: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitud: Option<f64>,
    /// Enabled flag. A record without it counts as disabled.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub estatus: bool,
}

impl From<WireState> for State {
    fn from(raw: WireState) -> Self {
        State {
            id: raw.cve_agee,
            name: raw.nom_agee,
            abbreviation: raw.nom_abrev,
        }
    }
}

impl From<WireRegion> for Region {
    fn from(raw: WireRegion) -> Self {
        Region {
            id: raw.cve_agem,
            state: raw.cve_agee,
            name: raw.nom_agem,
            first_city: raw.cve_cab,
        }
    }
}

impl TryFrom<WireLocality> for Locality {
    type Error = DecodeError;

    fn try_from(raw: WireLocality) -> Result<Self, Self::Error> {
        Ok(Locality {
            scope: raw.ambito.parse::<Scope>()?,
            id: raw.cve_loc,
            state: raw.cve_agee,
            region: raw.cve_agem,
            name: raw.nom_loc,
            latitude: raw.latitud,
            longitude: raw.longitud,
            altitude: raw.altitud,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number '{s}'"))),
    }
}

/// Record count as a JSON number or numeric string.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) if n >= 0.0 && n.fract() == 0.0 => Ok(Some(n as u64)),
        Some(NumberOrString::Number(n)) => {
            Err(de::Error::custom(format!("invalid record count {n}")))
        }
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid record count '{s}'"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    String(String),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(b)) => Ok(b),
        Some(Flag::Number(n)) => Ok(n != 0),
        Some(Flag::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            _ => Err(de::Error::custom(format!("invalid status flag '{s}'"))),
        },
    }
}

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// How long `/slow/...` routes stall before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

pub const UPDATED_AT: &str = "2024-03-01";
pub const SOURCE: &str = "Marco Geoestadístico, diciembre 2023";

#[derive(Clone, Debug, Serialize)]
pub struct StateRecord {
    pub cve_agee: &'static str,
    pub nom_agee: &'static str,
    pub nom_abrev: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegionRecord {
    pub cve_agee: &'static str,
    pub cve_agem: &'static str,
    pub nom_agem: &'static str,
    pub cve_cab: &'static str,
}

/// Coordinates are strings, as the catalog publishes them.
#[derive(Clone, Debug, Serialize)]
pub struct LocalityRecord {
    pub cve_agee: &'static str,
    pub cve_agem: &'static str,
    pub cve_loc: &'static str,
    pub nom_loc: &'static str,
    pub ambito: &'static str,
    pub latitud: &'static str,
    pub longitud: &'static str,
    pub altitud: &'static str,
    pub estatus: bool,
}

/// The data a mock instance serves.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub states: Vec<StateRecord>,
    pub regions: Vec<RegionRecord>,
    pub localities: Vec<LocalityRecord>,
}

impl Catalog {
    /// A small slice of the real catalog.
    #[rustfmt::skip]
    pub fn fixture() -> Self {
        let state = |cve_agee, nom_agee, nom_abrev| StateRecord {
            cve_agee,
            nom_agee,
            nom_abrev,
        };
        let region = |cve_agee, cve_agem, nom_agem| RegionRecord {
            cve_agee,
            cve_agem,
            nom_agem,
            cve_cab: "0001",
        };
        #[allow(clippy::too_many_arguments)]
        fn locality(
            cve_agee: &'static str,
            cve_agem: &'static str,
            cve_loc: &'static str,
            nom_loc: &'static str,
            ambito: &'static str,
            latitud: &'static str,
            longitud: &'static str,
            altitud: &'static str,
            estatus: bool,
        ) -> LocalityRecord {
            LocalityRecord {
                cve_agee,
                cve_agem,
                cve_loc,
                nom_loc,
                ambito,
                latitud,
                longitud,
                altitud,
                estatus,
            }
        }

        Catalog {
            states: vec![
                state("09", "Ciudad de México", "CDMX"),
                state("14", "Jalisco", "Jal."),
                state("19", "Nuevo León", "NL"),
                state("26", "Sonora", "Son."),
            ],
            regions: vec![
                region("09", "013", "Xochimilco"),
                region("14", "039", "Guadalajara"),
                region("14", "120", "Zapopan"),
                region("19", "026", "Guadalupe"),
                region("19", "039", "Monterrey"),
                region("26", "030", "Hermosillo"),
            ],
            localities: vec![
                locality("09", "013", "0001", "Xochimilco", "U", "19.2572", "-99.1030", "2240", true),
                locality("09", "013", "0096", "Ixotitla", "R", "19.2372167", "-99.0569950", "2350", true),
                locality("14", "039", "0001", "Guadalajara", "U", "20.6767", "-103.3475", "1560", true),
                locality("19", "026", "0001", "Guadalupe", "U", "25.6775", "-100.2597", "500", true),
                locality("19", "039", "0001", "Monterrey", "U", "25.6775", "-100.3119", "540", true),
                locality("19", "039", "0090", "Los Remates", "R", "25.5311", "-100.2603", "1120", false),
                locality("19", "039", "0107", "La Estanzuela", "R", "25.5489", "-100.2467", "760", true),
                locality("26", "030", "0001", "Hermosillo", "U", "29.0729", "-110.9559", "210", true),
            ],
        }
    }
}

pub type Db = Arc<Catalog>;

pub fn app() -> Router {
    app_with(Catalog::fixture())
}

pub fn app_with(catalog: Catalog) -> Router {
    let db: Db = Arc::new(catalog);
    Router::new()
        .route("/mgee", get(list_states))
        .route("/mgee/{state}", get(get_state))
        .route("/mgem/{state}", get(list_regions))
        .route("/mgem/{state}/{region}", get(get_region))
        .route("/localidades/{state}/{region}", get(list_localities))
        .route("/localidades/{state}/{region}/{locality}", get(get_locality))
        .route("/legacy/{*path}", get(legacy_redirect))
        .route("/slow/{*path}", get(slow))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Envelope for list answers. Missing entries still answer 200.
fn envelope<T: Serialize>(records: Vec<T>) -> Json<Value> {
    let count = records.len();
    Json(json!({
        "datos": records,
        "metadatos": { "fechaActualizacion": UPDATED_AT, "fuenteInfo": SOURCE },
        "numReg": count,
    }))
}

async fn list_states(State(db): State<Db>) -> Json<Value> {
    envelope(db.states.clone())
}

/// The single-state endpoint sends `datos` as an object, or `null` when the
/// id is unknown.
async fn get_state(State(db): State<Db>, Path(state): Path<String>) -> Json<Value> {
    let found = db.states.iter().find(|s| s.cve_agee == state);
    tracing::debug!(state, found = found.is_some(), "state lookup");
    Json(json!({
        "datos": found,
        "metadatos": { "fechaActualizacion": UPDATED_AT, "fuenteInfo": SOURCE },
        "numReg": usize::from(found.is_some()),
    }))
}

async fn list_regions(State(db): State<Db>, Path(state): Path<String>) -> Json<Value> {
    envelope(
        db.regions
            .iter()
            .filter(|r| r.cve_agee == state)
            .cloned()
            .collect(),
    )
}

async fn get_region(
    State(db): State<Db>,
    Path((state, region)): Path<(String, String)>,
) -> Json<Value> {
    envelope(
        db.regions
            .iter()
            .filter(|r| r.cve_agee == state && r.cve_agem == region)
            .cloned()
            .collect(),
    )
}

/// Disabled localities are served too; filtering is the client's job.
async fn list_localities(
    State(db): State<Db>,
    Path((state, region)): Path<(String, String)>,
) -> Json<Value> {
    envelope(
        db.localities
            .iter()
            .filter(|l| l.cve_agee == state && l.cve_agem == region)
            .cloned()
            .collect(),
    )
}

async fn get_locality(
    State(db): State<Db>,
    Path((state, region, locality)): Path<(String, String, String)>,
) -> Json<Value> {
    envelope(
        db.localities
            .iter()
            .filter(|l| l.cve_agee == state && l.cve_agem == region && l.cve_loc == locality)
            .cloned()
            .collect(),
    )
}

async fn legacy_redirect(Path(path): Path<String>) -> Redirect {
    Redirect::permanent(&format!("/{path}"))
}

async fn slow(Path(path): Path<String>) -> Json<Value> {
    tracing::debug!(path, "stalling");
    tokio::time::sleep(SLOW_DELAY).await;
    envelope(Vec::<StateRecord>::new())
}

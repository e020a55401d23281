//! Hierarchical client for the INEGI geo catalog.
//!
//! # Design
//! Every operation comes in three layers:
//! - `build_*` turns hierarchy ids into an `HttpRequest` (pure).
//! - `parse_*` turns an `HttpResponse` into typed results and reports every
//!   failure as an `ApiError` (pure apart from trace logging).
//! - the plain method (`list_states`, `get_state`, ...) runs both through the
//!   transport and never fails: errors are logged and collapse to an empty
//!   list or `None`.
//!
//! Callers who need to tell a failed request from a missing entry can drive
//! `build_*` / `Transport::fetch` / `parse_*` themselves.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::config::{GeoConfig, DEFAULT_BASE_URL};
use crate::envelope::{self, Envelope};
use crate::error::{ApiError, ConfigError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Locality, Lookup, Region, State};
use crate::wire::{WireLocality, WireRegion, WireState};

const STATES: &str = "mgee";
const REGIONS: &str = "mgem";
const LOCALITIES: &str = "localidades";

/// Client for states, municipalities and localities.
///
/// Holds the base URL and an owned transport, nothing per-request. It is
/// `Send + Sync` whenever the transport is, so one instance can serve many
/// threads.
#[derive(Clone)]
pub struct GeoClient<T = HttpTransport> {
    base_url: String,
    transport: T,
}

impl GeoClient<HttpTransport> {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Ok(Self::with_transport(base_url, HttpTransport::new()?))
    }

    /// Client for the public INEGI endpoint.
    pub fn inegi() -> Result<Self, TransportError> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Build a client from configuration. Returns `Ok(None)` when the client
    /// is disabled.
    pub fn from_config(config: &GeoConfig) -> Result<Option<Self>, ConfigError> {
        if !config.enabled {
            tracing::info!("geo catalog client disabled by configuration");
            return Ok(None);
        }
        config.validate()?;
        tracing::debug!(
            base_url = %config.base_url,
            timeout_secs = config.read_timeout_secs,
            "geo catalog client enabled"
        );
        let transport = HttpTransport::with_read_timeout(config.read_timeout())?;
        Ok(Some(Self::with_transport(&config.base_url, transport)))
    }
}

impl<T> GeoClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, family: &str, ids: &[&str]) -> String {
        let mut url = format!("{}/{family}", self.base_url);
        for id in ids {
            url.push('/');
            url.push_str(&urlencoding::encode(id));
        }
        url
    }

    pub fn build_list_states(&self) -> HttpRequest {
        HttpRequest::get(self.url(STATES, &[]))
    }

    pub fn build_get_state(&self, state_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(STATES, &[state_id]))
    }

    pub fn build_list_regions(&self, state_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(REGIONS, &[state_id]))
    }

    pub fn build_get_region(&self, state_id: &str, region_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(REGIONS, &[state_id, region_id]))
    }

    pub fn build_list_localities(&self, state_id: &str, region_id: &str) -> HttpRequest {
        HttpRequest::get(self.url(LOCALITIES, &[state_id, region_id]))
    }

    pub fn build_get_locality(
        &self,
        state_id: &str,
        region_id: &str,
        locality_id: &str,
    ) -> HttpRequest {
        HttpRequest::get(self.url(LOCALITIES, &[state_id, region_id, locality_id]))
    }

    pub fn parse_list_states(&self, response: HttpResponse) -> Result<Vec<State>, ApiError> {
        let envelope = decode_response::<WireState>(response, "states")?;
        Ok(envelope.records.into_iter().map(State::from).collect())
    }

    pub fn parse_get_state(&self, response: HttpResponse) -> Result<Lookup<State>, ApiError> {
        let envelope = decode_response::<WireState>(response, "state")?;
        Ok(envelope.into_lookup().map(State::from))
    }

    pub fn parse_list_regions(&self, response: HttpResponse) -> Result<Vec<Region>, ApiError> {
        let envelope = decode_response::<WireRegion>(response, "regions")?;
        Ok(envelope.records.into_iter().map(Region::from).collect())
    }

    pub fn parse_get_region(
        &self,
        response: HttpResponse,
    ) -> Result<Lookup<Region>, ApiError> {
        let envelope = decode_response::<WireRegion>(response, "region")?;
        Ok(envelope.into_lookup().map(Region::from))
    }

    /// Disabled localities are dropped before mapping. An enabled record
    /// whose scope code is unknown is skipped with a warning; the rest of the
    /// list is kept.
    pub fn parse_list_localities(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Locality>, ApiError> {
        let envelope = decode_response::<WireLocality>(response, "localities")?;
        let received = envelope.records.len();
        let envelope = envelope.retain(|raw| raw.estatus);
        if envelope.records.len() < received {
            tracing::debug!(
                dropped = received - envelope.records.len(),
                "skipped disabled localities"
            );
        }
        let localities = envelope
            .records
            .into_iter()
            .filter_map(|raw| {
                let key = format!("{}/{}/{}", raw.cve_agee, raw.cve_agem, raw.cve_loc);
                match Locality::try_from(raw) {
                    Ok(locality) => Some(locality),
                    Err(err) => {
                        tracing::warn!(
                            locality = %key,
                            error = %err,
                            "skipped locality with unreadable record"
                        );
                        None
                    }
                }
            })
            .collect();
        Ok(localities)
    }

    /// A uniquely matched locality is returned even when it is disabled.
    pub fn parse_get_locality(
        &self,
        response: HttpResponse,
    ) -> Result<Lookup<Locality>, ApiError> {
        let envelope = decode_response::<WireLocality>(response, "locality")?;
        Ok(envelope.into_lookup().try_map(Locality::try_from)?)
    }
}

impl<T: Transport> GeoClient<T> {
    /// All states. Empty if the request fails.
    pub fn list_states(&self) -> Vec<State> {
        let request = self.build_list_states();
        self.execute(&request, |response| self.parse_list_states(response))
            .unwrap_or_default()
    }

    pub fn get_state(&self, state_id: &str) -> Option<State> {
        let request = self.build_get_state(state_id);
        match self.execute(&request, |response| self.parse_get_state(response))? {
            Lookup::Found(state) => Some(state),
            Lookup::NotFound => {
                tracing::warn!(state_id, "state was not found");
                None
            }
            Lookup::Ambiguous(count) => {
                tracing::warn!(state_id, count, "state id matched more than one record");
                None
            }
        }
    }

    /// Municipalities of `state`. Empty if the request fails.
    pub fn list_regions(&self, state: &State) -> Vec<Region> {
        let request = self.build_list_regions(&state.id);
        self.execute(&request, |response| self.parse_list_regions(response))
            .unwrap_or_default()
    }

    pub fn get_region(&self, state_id: &str, region_id: &str) -> Option<Region> {
        let request = self.build_get_region(state_id, region_id);
        match self.execute(&request, |response| self.parse_get_region(response))? {
            Lookup::Found(region) => Some(region),
            Lookup::NotFound => {
                tracing::warn!(state_id, region_id, "region was not found");
                None
            }
            Lookup::Ambiguous(count) => {
                tracing::warn!(
                    state_id,
                    region_id,
                    count,
                    "region id matched more than one record"
                );
                None
            }
        }
    }

    /// Enabled localities of `region`. Empty if the request fails.
    pub fn list_localities(&self, region: &Region) -> Vec<Locality> {
        let request = self.build_list_localities(&region.state, &region.id);
        self.execute(&request, |response| self.parse_list_localities(response))
            .unwrap_or_default()
    }

    pub fn get_locality(
        &self,
        state_id: &str,
        region_id: &str,
        locality_id: &str,
    ) -> Option<Locality> {
        let request = self.build_get_locality(state_id, region_id, locality_id);
        match self.execute(&request, |response| self.parse_get_locality(response))? {
            Lookup::Found(locality) => Some(locality),
            Lookup::NotFound => {
                tracing::warn!(state_id, region_id, locality_id, "locality was not found");
                None
            }
            Lookup::Ambiguous(count) => {
                tracing::warn!(
                    state_id,
                    region_id,
                    locality_id,
                    count,
                    "locality id matched more than one record"
                );
                None
            }
        }
    }

    /// Fetch and parse, logging any failure. `None` means the request failed.
    fn execute<R>(
        &self,
        request: &HttpRequest,
        parse: impl FnOnce(HttpResponse) -> Result<R, ApiError>,
    ) -> Option<R> {
        let result = self
            .transport
            .fetch(request)
            .map_err(ApiError::from)
            .and_then(parse);
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(
                    url = %request.url,
                    error = %err,
                    "geo catalog request failed"
                );
                None
            }
        }
    }
}

impl<T> fmt::Debug for GeoClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Reject non-2xx statuses, decode the envelope and trace its metadata.
fn decode_response<W: DeserializeOwned>(
    response: HttpResponse,
    kind: &'static str,
) -> Result<Envelope<W>, ApiError> {
    if !response.is_success() {
        return Err(ApiError::HttpStatus {
            status: response.status,
            body: response.body,
        });
    }
    let envelope = envelope::decode::<W>(&response.body)?;
    let metadata = envelope.metadata();
    tracing::trace!(
        kind,
        records = envelope.records.len(),
        record_count = ?metadata.record_count,
        updated_at = ?metadata.updated_at,
        source = ?metadata.source,
        "received catalog records"
    );
    if let Some(message) = &metadata.message {
        tracing::debug!(kind, message = %message, "catalog attached a message");
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::{DecodeError, TransportError};
    use crate::types::Scope;

    const BASE_URL: &str = "https://gaia.inegi.org.mx/wscatgeo";

    fn client() -> GeoClient<HttpTransport> {
        GeoClient::new(BASE_URL).unwrap()
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// Transport that answers every request with `status` and `body`.
    fn canned(status: u16, body: &str) -> impl Transport + Clone {
        let body = body.to_string();
        move |_: &HttpRequest| -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.clone(),
            })
        }
    }

    fn failing(make: fn() -> TransportError) -> impl Transport {
        move |_: &HttpRequest| -> Result<HttpResponse, TransportError> {
            Err(make())
        }
    }

    /// Transport that records requested URLs and answers with `body`.
    fn recording(body: &str) -> (impl Transport, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let body = body.to_string();
        let transport = move |request: &HttpRequest| -> Result<HttpResponse, TransportError> {
            log.lock().unwrap().push(request.url.clone());
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.clone(),
            })
        };
        (transport, seen)
    }

    const SONORA: &str = r#"{
        "datos": [{"cvegeo": "26", "cve_agee": "26", "nom_agee": "Sonora",
                   "nom_abrev": "Son.", "pob": "2944840"}],
        "metadatos": {"fechaActualizacion": "2024-03-01",
                      "fuenteInfo": "Marco Geoestadístico"},
        "numReg": 1
    }"#;

    const NOT_FOUND: &str = r#"{
        "datos": [],
        "metadatos": {"fechaActualizacion": "2024-03-01",
                      "fuenteInfo": "Marco Geoestadístico"},
        "numReg": 0
    }"#;

    const MONTERREY_LOCALITIES: &str = r#"{"datos": [
        {"cve_agee": "19", "cve_agem": "039", "cve_loc": "0001", "nom_loc": "Monterrey",
         "ambito": "U", "latitud": "25.6775", "longitud": "-100.3119", "altitud": "540",
         "estatus": true},
        {"cve_agee": "19", "cve_agem": "039", "cve_loc": "0090", "nom_loc": "Los Remates",
         "ambito": "R", "latitud": 25.5311, "longitud": -100.2603, "altitud": 1120,
         "estatus": false},
        {"cve_agee": "19", "cve_agem": "039", "cve_loc": "0107", "nom_loc": "La Estanzuela",
         "ambito": "R", "latitud": 25.5489, "longitud": -100.2467, "altitud": 760,
         "estatus": true}
    ], "numReg": 3}"#;

    /// One enabled locality record with the given scope code and status.
    fn one_locality(id: &str, ambito: &str, estatus: bool) -> String {
        format!(
            r#"{{"cve_agee": "19", "cve_agem": "039", "cve_loc": "{id}",
                "nom_loc": "Locality {id}", "ambito": "{ambito}", "estatus": {estatus}}}"#
        )
    }

    // --- URL construction ---

    #[test]
    fn builds_state_urls() {
        let c = client();
        assert_eq!(c.build_list_states().url, format!("{BASE_URL}/mgee"));
        assert_eq!(c.build_get_state("26").url, format!("{BASE_URL}/mgee/26"));
    }

    #[test]
    fn builds_region_urls() {
        let c = client();
        assert_eq!(
            c.build_list_regions("19").url,
            format!("{BASE_URL}/mgem/19")
        );
        assert_eq!(
            c.build_get_region("14", "039").url,
            format!("{BASE_URL}/mgem/14/039")
        );
    }

    #[test]
    fn builds_locality_urls() {
        let c = client();
        assert_eq!(
            c.build_list_localities("19", "039").url,
            format!("{BASE_URL}/localidades/19/039")
        );
        assert_eq!(
            c.build_get_locality("09", "013", "0096").url,
            format!("{BASE_URL}/localidades/09/013/0096")
        );
    }

    #[test]
    fn requests_ask_for_json_without_query() {
        let req = client().build_get_state("26");
        assert!(!req.url.contains('?'));
        assert_eq!(
            req.headers,
            vec![("accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let req = client().build_get_region("1 9", "03/9");
        assert_eq!(req.url, format!("{BASE_URL}/mgem/1%209/03%2F9"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = GeoClient::new("http://localhost:3000/").unwrap();
        assert_eq!(c.build_list_states().url, "http://localhost:3000/mgee");
    }

    // --- parse layer ---

    #[test]
    fn parse_get_state_found() {
        let state = client()
            .parse_get_state(ok(SONORA))
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(
            state,
            State {
                id: "26".to_string(),
                name: "Sonora".to_string(),
                abbreviation: "Son.".to_string(),
            }
        );
    }

    #[test]
    fn parse_get_state_zero_count_is_not_found() {
        let lookup = client().parse_get_state(ok(NOT_FOUND)).unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }

    #[test]
    fn parse_non_success_status_is_an_error() {
        let response = HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: "unavailable".to_string(),
        };
        let err = client().parse_list_states(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn parse_bad_json_is_a_decode_error() {
        let err = client().parse_list_regions(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(DecodeError::Json(_))));
    }

    #[test]
    fn parse_list_localities_drops_disabled() {
        let localities = client()
            .parse_list_localities(ok(MONTERREY_LOCALITIES))
            .unwrap();
        let ids: Vec<&str> = localities.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["0001", "0107"]);
        assert_eq!(localities[0].scope, Scope::Urban);
        assert_eq!(localities[0].altitude, Some(540.0));
    }

    #[test]
    fn parse_list_localities_skips_unknown_scope() {
        let body = format!(
            r#"{{"datos": [{}, {}, {}], "numReg": 3}}"#,
            one_locality("0001", "U", true),
            one_locality("0002", "X", true),
            one_locality("0003", "R", true),
        );
        let localities = client().parse_list_localities(ok(&body)).unwrap();
        let ids: Vec<&str> = localities.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["0001", "0003"]);
    }

    #[test]
    fn parse_list_localities_ignores_bad_scope_on_disabled_record() {
        let body = format!(
            r#"{{"datos": [{}], "numReg": 1}}"#,
            one_locality("0001", "X", false)
        );
        assert!(client().parse_list_localities(ok(&body)).unwrap().is_empty());
    }

    #[test]
    fn parse_get_locality_unknown_scope_fails() {
        let body = format!(
            r#"{{"datos": [{}], "numReg": 1}}"#,
            one_locality("0001", "X", true)
        );
        let err = client().parse_get_locality(ok(&body)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(DecodeError::UnknownScope(_))));
    }

    #[test]
    fn parse_get_locality_keeps_disabled_match() {
        let body = format!(
            r#"{{"datos": [{}], "numReg": 1}}"#,
            one_locality("0090", "R", false)
        );
        let locality = client()
            .parse_get_locality(ok(&body))
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(locality.name, "Locality 0090");
        assert_eq!(locality.altitude, None);
    }

    // --- high-level operations ---

    #[test]
    fn get_state_sends_one_request_to_the_state_endpoint() {
        let (transport, seen) = recording(SONORA);
        let c = GeoClient::with_transport(BASE_URL, transport);
        let state = c.get_state("26").unwrap();
        assert_eq!(state.name, "Sonora");
        assert_eq!(*seen.lock().unwrap(), [format!("{BASE_URL}/mgee/26")]);
    }

    #[test]
    fn list_regions_uses_state_id() {
        let body = r#"{"datos": [{"cve_agee": "19", "cve_agem": "039",
                                  "nom_agem": "Monterrey", "cve_cab": "0001"}],
                       "numReg": 1}"#;
        let (transport, seen) = recording(body);
        let c = GeoClient::with_transport(BASE_URL, transport);
        let state = State {
            id: "19".to_string(),
            name: "Nuevo León".to_string(),
            abbreviation: "NL".to_string(),
        };
        let regions = c.list_regions(&state);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].state, "19");
        assert_eq!(*seen.lock().unwrap(), [format!("{BASE_URL}/mgem/19")]);
    }

    #[test]
    fn list_localities_uses_region_and_state_ids() {
        let (transport, seen) = recording(MONTERREY_LOCALITIES);
        let c = GeoClient::with_transport(BASE_URL, transport);
        let region = Region {
            id: "039".to_string(),
            state: "19".to_string(),
            name: "Monterrey".to_string(),
            first_city: "0001".to_string(),
        };
        let localities = c.list_localities(&region);
        assert_eq!(localities.len(), 2);
        assert!(localities.iter().all(|l| l.state == "19" && l.region == "039"));
        assert_eq!(
            *seen.lock().unwrap(),
            [format!("{BASE_URL}/localidades/19/039")]
        );
    }

    #[test]
    fn singleton_with_count_other_than_one_is_absent() {
        let guadalajara = r#"{"cve_agee": "14", "cve_agem": "039",
                              "nom_agem": "Guadalajara", "cve_cab": "0001"}"#;
        let two = format!(r#"{{"datos": [{guadalajara}, {guadalajara}], "numReg": 2}}"#);
        let c = GeoClient::with_transport(BASE_URL, canned(200, &two));
        assert!(c.get_region("14", "039").is_none());

        let zero_with_data = format!(r#"{{"datos": [{guadalajara}], "numReg": 0}}"#);
        let c = GeoClient::with_transport(BASE_URL, canned(200, &zero_with_data));
        assert!(c.get_region("14", "039").is_none());

        let locality = one_locality("0001", "U", true);
        let two = format!(r#"{{"datos": [{locality}, {locality}], "numReg": 2}}"#);
        let c = GeoClient::with_transport(BASE_URL, canned(200, &two));
        assert!(c.get_locality("19", "039", "0001").is_none());

        let zero_with_data = format!(r#"{{"datos": [{locality}], "numReg": 0}}"#);
        let c = GeoClient::with_transport(BASE_URL, canned(200, &zero_with_data));
        assert!(c.get_locality("19", "039", "0001").is_none());

        let c = GeoClient::with_transport(BASE_URL, canned(200, NOT_FOUND));
        assert!(c.get_state("XX").is_none());
        assert!(c.get_locality("09", "013", "XXXX").is_none());
    }

    #[test]
    fn transport_failures_collapse_to_empty() {
        let c = GeoClient::with_transport(BASE_URL, failing(|| TransportError::Timeout));
        assert!(c.list_states().is_empty());
        assert!(c.get_state("26").is_none());
        assert!(c.get_region("14", "039").is_none());
        assert!(c.get_locality("09", "013", "0096").is_none());

        let c = GeoClient::with_transport(
            BASE_URL,
            failing(|| TransportError::Connection("tls handshake failed".to_string())),
        );
        let region = Region {
            id: "039".to_string(),
            state: "19".to_string(),
            name: "Monterrey".to_string(),
            first_city: "0001".to_string(),
        };
        assert!(c.list_localities(&region).is_empty());
    }

    #[test]
    fn decode_and_status_failures_collapse_to_empty() {
        let c = GeoClient::with_transport(BASE_URL, canned(200, "<html>oops</html>"));
        assert!(c.list_states().is_empty());
        assert!(c.get_state("26").is_none());

        let c = GeoClient::with_transport(BASE_URL, canned(500, SONORA));
        assert!(c.list_states().is_empty());
        assert!(c.get_state("26").is_none());
    }

    #[test]
    fn repeated_calls_are_equal() {
        let c = GeoClient::with_transport(BASE_URL, canned(200, MONTERREY_LOCALITIES));
        let region = Region {
            id: "039".to_string(),
            state: "19".to_string(),
            name: "Monterrey".to_string(),
            first_city: "0001".to_string(),
        };
        assert_eq!(c.list_localities(&region), c.list_localities(&region));
    }

    // --- configuration ---

    #[test]
    fn disabled_config_builds_no_client() {
        let config = GeoConfig::default();
        assert!(GeoClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn enabled_config_builds_client() {
        let config = GeoConfig {
            enabled: true,
            base_url: "http://localhost:3000/".to_string(),
            read_timeout_secs: 3,
        };
        let client = GeoClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.transport().read_timeout(),
            std::time::Duration::from_secs(3)
        );
    }

    #[test]
    fn enabled_config_with_bad_url_fails() {
        let config = GeoConfig {
            enabled: true,
            base_url: "ftp://example.test".to_string(),
            read_timeout_secs: 20,
        };
        assert!(matches!(
            GeoClient::from_config(&config),
            Err(ConfigError::BaseUrl(_))
        ));
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeoClient>();
    }
}

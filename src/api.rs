use crate::auth::{CredentialAuthority, HttpAuthority, TokenManager};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{AirportList, FlightSearchResponse, SearchCriteria};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const FLIGHT_OFFERS_PATH: &str = "v2/shopping/flight-offers";
const LOCATIONS_PATH: &str = "v1/reference-data/locations";
const AIRPORT_RESULT_LIMIT: u32 = 10;
/// Keywords shorter than this are answered locally with an empty list.
pub const MIN_AIRPORT_KEYWORD_LEN: usize = 2;

/// Client for the flight-offers API. Construct one per process and share it
/// by reference; every call carries a bearer token from the embedded
/// [`TokenManager`].
pub struct FlightApiClient {
    http: Client,
    base_url: Url,
    tokens: TokenManager,
}

impl FlightApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        let base_url = parse_base_url(&config.base_url)?;
        let authority = HttpAuthority::new(
            http.clone(),
            &base_url,
            config.client_id.clone(),
            config.client_secret.clone(),
        )?;

        Ok(Self {
            tokens: TokenManager::new(Arc::new(authority)),
            http,
            base_url,
        })
    }

    /// Client whose credentials come from `authority` instead of the token endpoint.
    pub fn with_authority(
        base_url: &str,
        authority: Arc<dyn CredentialAuthority>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: Client::new(),
            base_url: parse_base_url(base_url)?,
            tokens: TokenManager::new(authority),
        })
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Airports and cities matching `keyword`, at most ten.
    pub async fn search_airports(&self, keyword: &str) -> Result<AirportList, ApiError> {
        let keyword = keyword.trim();
        if keyword.chars().count() < MIN_AIRPORT_KEYWORD_LEN {
            return Ok(AirportList::default());
        }
        let request = self.airport_search_request(keyword)?;
        self.fetch(request).await
    }

    pub async fn search_flights(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<FlightSearchResponse, ApiError> {
        let request = self.flight_search_request(criteria)?;
        let response: FlightSearchResponse = self.fetch(request).await?;
        debug!(
            "Flight search {} returned {} offers",
            criteria,
            response.offers.len()
        );
        Ok(response)
    }

    fn airport_search_request(&self, keyword: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(LOCATIONS_PATH)?;
        let limit = AIRPORT_RESULT_LIMIT.to_string();
        Ok(self.http.get(url).query(&[
            ("subType", "AIRPORT,CITY"),
            ("keyword", keyword),
            ("page[limit]", limit.as_str()),
        ]))
    }

    fn flight_search_request(&self, criteria: &SearchCriteria) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(FLIGHT_OFFERS_PATH)?;
        Ok(self.http.get(url).query(&criteria.query_pairs()))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = self.tokens.authorize(request).await?;
        let response = request.send().await?;
        debug!("GET {} -> {}", response.url().path(), response.status());

        let status = response.status();
        let body = response.text().await?;
        decode_response(status, body)
    }
}

/// Non-2xx statuses become [`ApiError::Upstream`] with the body kept for
/// display; anything else must decode as `T`.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: String) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Upstream { status, body });
    }
    Ok(serde_json::from_str(&body)?)
}

// `Url::join` drops the last path segment unless the base ends with a slash.
fn parse_base_url(base: &str) -> Result<Url, url::ParseError> {
    let trimmed = base.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{}/", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenGrant;
    use crate::error::AuthError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct StaticAuthority;

    #[async_trait]
    impl CredentialAuthority for StaticAuthority {
        async fn grant(&self) -> Result<TokenGrant, AuthError> {
            Ok(TokenGrant {
                access_token: "abc".into(),
                expires_in: 1799,
            })
        }
    }

    fn client() -> FlightApiClient {
        FlightApiClient::with_authority("https://test.api.amadeus.com", Arc::new(StaticAuthority))
            .unwrap()
    }

    fn query_of(request: &reqwest::Request) -> HashMap<String, String> {
        request.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn test_flight_request_omits_unset_parameters() {
        let criteria = SearchCriteria::builder(
            "JFK",
            "LAX",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
        .adults(1)
        .build()
        .unwrap();

        let request = client()
            .flight_search_request(&criteria)
            .unwrap()
            .build()
            .unwrap();
        let query = query_of(&request);

        assert_eq!(request.url().path(), "/v2/shopping/flight-offers");
        assert_eq!(query.get("originLocationCode").map(String::as_str), Some("JFK"));
        assert_eq!(query.get("destinationLocationCode").map(String::as_str), Some("LAX"));
        assert_eq!(query.get("departureDate").map(String::as_str), Some("2024-06-01"));
        assert_eq!(query.get("adults").map(String::as_str), Some("1"));
        assert!(!query.contains_key("children"));
        assert!(!query.contains_key("infants"));
        assert!(!query.contains_key("returnDate"));
        assert!(!query.contains_key("nonStop"));
        assert!(!request.url().as_str().contains("children="));
    }

    #[test]
    fn test_airport_request_shape() {
        let request = client()
            .airport_search_request("lon")
            .unwrap()
            .build()
            .unwrap();
        let query = query_of(&request);

        assert_eq!(request.url().path(), "/v1/reference-data/locations");
        assert_eq!(query.get("subType").map(String::as_str), Some("AIRPORT,CITY"));
        assert_eq!(query.get("keyword").map(String::as_str), Some("lon"));
        assert_eq!(query.get("page[limit]").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_base_url_with_path_keeps_prefix() {
        let client =
            FlightApiClient::with_authority("https://proxy.local/amadeus", Arc::new(StaticAuthority))
                .unwrap();
        let request = client
            .airport_search_request("par")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/amadeus/v1/reference-data/locations");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = FlightApiClient::with_authority("not a url", Arc::new(StaticAuthority));
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_error_status_is_upstream_not_decode() {
        let body = r#"{"errors":[{"status":500,"title":"SYSTEM ERROR HAS OCCURRED"}]}"#;
        let result: Result<FlightSearchResponse, _> =
            decode_response(StatusCode::INTERNAL_SERVER_ERROR, body.to_string());

        match result {
            Err(ApiError::Upstream { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body.contains("SYSTEM ERROR"));
            }
            other => panic!("expected upstream error, got {:?}", other.map(|r| r.offers.len())),
        }
    }

    #[test]
    fn test_success_status_decodes_or_reports_decode_error() {
        let ok: AirportList =
            decode_response(StatusCode::OK, r#"{"meta":{"count":0},"data":[]}"#.to_string()).unwrap();
        assert!(ok.data.is_empty());

        let bad: Result<AirportList, _> = decode_response(StatusCode::OK, "<html>".to_string());
        assert!(matches!(bad, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_short_keyword_skips_network() {
        let client = client();
        let list = client.search_airports(" a ").await.unwrap();
        assert!(list.data.is_empty());
        assert!(!client.tokens().is_authenticated().await);
    }
}

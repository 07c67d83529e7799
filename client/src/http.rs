use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use traffic_shared::{ChatReply, ChatRequest, City, GeocodeResult, Incident, Route, RouteQuery};

use crate::error::ApiError;
use crate::ports::TrafficApi;

/// [`TrafficApi`] over `fetch`, rooted at a configurable base path.
#[derive(Debug, Clone)]
pub struct HttpTrafficApi {
    base: String,
}

impl HttpTrafficApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn network(e: gloo_net::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

impl TrafficApi for HttpTrafficApi {
    async fn cities(&self) -> Result<Vec<City>, ApiError> {
        let resp = Request::get(&self.url("cities"))
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn incidents(&self, bbox: &str) -> Result<Vec<Incident>, ApiError> {
        let resp = Request::get(&self.url("incidents"))
            .query([("bbox", bbox)])
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn geocode(&self, query: &str, city_context: &str) -> Result<GeocodeResult, ApiError> {
        let resp = Request::get(&self.url("geocode"))
            .query([("query", query), ("cityContext", city_context)])
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn route(&self, query: &RouteQuery) -> Result<Route, ApiError> {
        let resp = Request::get(&self.url("route"))
            .query(query.query_pairs())
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let resp = Request::post(&self.url("chat"))
            .json(request)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }
}

//! HTTP client for the Motorpool API, used by the MCP tools

use std::time::Duration;

use reqwest::{Response, StatusCode, Url};
use serde_json::Number;

use super::server::SearchCarsParams;
use crate::error::{Error, Result};
use crate::types::{CarsResponse, User};

/// Thin client over `GET /users/{id}` and `GET /cars`
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API URL {:?}: {}", base_url, e)))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the user lookup endpoint
    pub fn user_url(&self, id: &Number) -> Result<Url> {
        self.endpoint(&format!("users/{}", number_param(id)))
    }

    /// URL of the car search endpoint carrying only the supplied parameters
    pub fn cars_url(&self, params: &SearchCarsParams) -> Result<Url> {
        let mut url = self.endpoint("cars")?;

        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(brand) = params.brand.as_deref().filter(|b| !b.is_empty()) {
            pairs.push(("brand", brand.to_string()));
        }
        if let Some(model) = params.model.as_deref().filter(|m| !m.is_empty()) {
            pairs.push(("model", model.to_string()));
        }
        if let Some(year) = &params.year {
            pairs.push(("year", number_param(year)));
        }
        if let Some(max_price) = &params.max_price {
            pairs.push(("maxPrice", number_param(max_price)));
        }

        // Touching query_pairs_mut leaves a bare `?` behind, so only do it with pairs
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }

    /// Fetch one user
    pub async fn get_user(&self, id: &Number) -> Result<User> {
        let url = self.user_url(id)?;
        tracing::debug!("GET {}", url);

        let response = self.send(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(upstream_error("Failed to fetch user", status, None));
        }

        Ok(response.json::<User>().await?)
    }

    /// Search cars
    pub async fn search_cars(&self, params: &SearchCarsParams) -> Result<CarsResponse> {
        let url = self.cars_url(params)?;
        tracing::debug!("GET {}", url);

        let response = self.send(url).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(upstream_error("Failed to fetch cars", status, Some(body)));
        }

        Ok(response.json::<CarsResponse>().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid API URL {:?}: {}", raw, e)))
    }

    async fn send(&self, url: Url) -> Result<Response> {
        self.http.get(url).send().await.map_err(|e| {
            if e.is_connect() {
                tracing::warn!("API unreachable at {}: {}", self.base_url, e);
                Error::UpstreamUnavailable
            } else {
                Error::Http(e)
            }
        })
    }
}

/// Render a tool argument for a URL: integral values without a fraction, the rest as written
fn number_param(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                return (f as i64).to_string();
            }
        }
    }
    n.to_string()
}

fn upstream_error(context: &'static str, status: StatusCode, body: Option<String>) -> Error {
    Error::UpstreamError {
        context,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    }
}

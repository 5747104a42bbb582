//! HTTP client implementation

use backend_api::ErrorResponse;
use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::DashboardError;
use crate::options::ClientOptions;
use crate::utils::user_agent;

/// HTTP client for the deployment backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    persist_db_passwords: bool,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &ClientOptions) -> Result<Self, DashboardError> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            DashboardError::Config(format!("invalid backend URL {}: {}", options.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!(
                "backend URL cannot carry a path: {}",
                options.base_url
            )));
        }

        let client = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            base_url,
            persist_db_passwords: options.persist_db_passwords,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether saved templates keep their SQL passwords
    pub fn persists_db_passwords(&self) -> bool {
        self.persist_db_passwords
    }

    /// Absolute URL for path segments, each percent-encoded
    pub fn url(&self, segments: &[&str]) -> Result<Url, DashboardError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Config("backend URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, DashboardError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(&Method::GET, &url, e))?;

        decode(Method::GET, &url, response).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, DashboardError> {
        let url = self.url(segments)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&Method::POST, &url, e))?;

        decode(Method::POST, &url, response).await
    }
}

fn transport_error(method: &Method, url: &Url, e: reqwest::Error) -> DashboardError {
    error!("HTTP {} {} failed: {}", method, url, e);
    if e.is_timeout() {
        DashboardError::Timeout(format!("{} {}", method, url.path()))
    } else {
        DashboardError::Network(format!("{} {}: {}", method, url.path(), e))
    }
}

async fn decode<T: DeserializeOwned>(
    method: Method,
    url: &Url,
    response: Response,
) -> Result<T, DashboardError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("HTTP {} {} failed: {} - {}", method, url, status, body);
        return Err(DashboardError::Network(format!(
            "{} {}: {} - {}",
            method,
            url.path(),
            status,
            error_detail(&body)
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(&method, url, e))?;
    serde_json::from_str(&body).map_err(|e| {
        DashboardError::Parse(format!("{} {}: unexpected response body: {}", method, url.path(), e))
    })
}

/// The backend's `{"error": ...}` message, else the raw body
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => response.error,
        Err(_) => body.to_string(),
    }
}

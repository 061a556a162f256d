//! reqwest implementation of the backend endpoints.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{CourtsApi, COURTS_PATH};
use crate::config::BackendSettings;
use crate::error::{ClientError, ClientResult, ErrorContext};
use crate::models::Court;
use crate::services::QueryDescriptor;

/// Base URL plus a shared connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Build a client from the `[backend]` settings.
    ///
    /// # Errors
    /// Returns `ClientError::Configuration` if the URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(settings: &BackendSettings) -> ClientResult<Self> {
        let base_url = Url::parse(&settings.url).map_err(|e| ClientError::Configuration {
            message: format!("invalid backend url '{}': {}", settings.url, e),
            context: ErrorContext::new("backend_client"),
        })?;
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ClientError::configuration(format!("http client: {}", e)))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint path, keeping any path prefix of the base.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| {
            ClientError::configuration(format!("invalid endpoint '{}': {}", joined, e))
        })
    }

    pub fn get(&self, path: &str, bearer: Option<&str>) -> ClientResult<RequestBuilder> {
        Ok(with_bearer(self.http.get(self.endpoint(path)?), bearer))
    }

    pub fn post(&self, path: &str, bearer: Option<&str>) -> ClientResult<RequestBuilder> {
        Ok(with_bearer(self.http.post(self.endpoint(path)?), bearer))
    }

    /// Send a request and decode a JSON body, mapping failures to `ClientError`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
        path: &str,
    ) -> ClientResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from(e).with_operation(operation).with_endpoint(path))?;
        let response = check_status(response, operation, path).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| {
                ClientError::decode(e.to_string())
                    .with_operation(operation)
                    .with_endpoint(path)
            })
    }
}

fn with_bearer(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(token) if !token.is_empty() => request.header(AUTHORIZATION, format!("Bearer {}", token)),
        _ => request,
    }
}

/// Turn a non-success status into `ClientError::Http`, keeping the body text.
async fn check_status(response: Response, operation: &str, path: &str) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };
    Err(ClientError::http(status.as_u16(), message)
        .with_operation(operation)
        .with_endpoint(path))
}

/// `GET /courts` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCourtsApi {
    backend: BackendClient,
}

impl HttpCourtsApi {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub fn from_settings(settings: &BackendSettings) -> ClientResult<Self> {
        Ok(Self::new(BackendClient::new(settings)?))
    }
}

#[async_trait]
impl CourtsApi for HttpCourtsApi {
    async fn list_courts(
        &self,
        query: &QueryDescriptor,
        bearer: Option<&str>,
    ) -> ClientResult<Vec<Court>> {
        let request = self.backend.get(COURTS_PATH, bearer)?.query(query.pairs());
        debug!(query = %query, "GET {}", COURTS_PATH);
        self.backend
            .send_json(request, "list_courts", COURTS_PATH)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> BackendSettings {
        BackendSettings {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let client = BackendClient::new(&settings("https://example.com/api/")).unwrap();
        assert_eq!(
            client.endpoint("/courts").unwrap().as_str(),
            "https://example.com/api/courts"
        );
    }

    #[test]
    fn test_endpoint_plain_host() {
        let client = BackendClient::new(&settings("http://localhost:8000")).unwrap();
        assert_eq!(
            client.endpoint(COURTS_PATH).unwrap().as_str(),
            "http://localhost:8000/courts"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = BackendClient::new(&settings("::nope"));
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }

    #[test]
    fn test_bearer_header_attached() {
        let client = BackendClient::new(&settings("http://localhost:8000")).unwrap();
        let request = client.get("/courts", Some("tok")).unwrap().build().unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer tok"
        );

        let anonymous = client.get("/courts", None).unwrap().build().unwrap();
        assert!(anonymous.headers().get(AUTHORIZATION).is_none());
    }
}

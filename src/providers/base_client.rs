use crate::core::error::GeoChatError;
use reqwest::{Client, Response};
use serde::Serialize;
use std::collections::HashMap;

/// Thin JSON-over-HTTP client shared by the LLM providers and the GIS server
/// client. Requests go to `{endpoint}/{path}`.
#[derive(Clone)]
pub struct BaseApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    extra_headers: HashMap<String, String>,
    query_params: Vec<(String, String)>,
}

impl BaseApiClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            extra_headers: extra_headers.unwrap_or_default(),
            query_params: Vec::new(),
        }
    }

    pub fn add_query_param(&mut self, key: &str, value: String) {
        self.query_params.push((key.to_string(), value));
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    pub async fn send_request<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, GeoChatError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        for (key, value) in &self.extra_headers {
            request = request.header(key, value);
        }

        if !self.query_params.is_empty() {
            request = request.query(&self.query_params);
        }

        let response = request.json(payload).send().await?;
        Ok(response)
    }
}

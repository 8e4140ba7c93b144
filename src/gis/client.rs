use super::{Capability, ToolRequest, interpret_response};
use crate::core::error::GeoChatError;
use crate::gateway::{ChatBackend, GeocodeResult, GisBackend};
use crate::providers::base_client::BaseApiClient;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct HttpGisBackend {
    client: BaseApiClient,
}

impl HttpGisBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            client: BaseApiClient::new(base_url, None, None),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.endpoint()
    }

    pub async fn send(&self, request: &ToolRequest) -> Result<Value, GeoChatError> {
        let response = self
            .client
            .send_request(request.capability.path(), &request.params)
            .await?;
        let status = response.status();
        let body = response.text().await?;
        interpret_response(status, &body)
    }
}

/// Pulls `result` out of `{result: ...}` envelopes; bare payloads pass through.
fn unwrap_result(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl GisBackend for HttpGisBackend {
    async fn geocode(&self, location: &str) -> Result<GeocodeResult, GeoChatError> {
        let request = ToolRequest::new(Capability::Geocode).param("location", location);
        let value = self.send(&request).await?;
        serde_json::from_value(value)
            .map_err(|e| GeoChatError::Transport(format!("Malformed geocode response: {}", e)))
    }

    async fn buffer(&self, lat: f64, lon: f64, distance_km: f64) -> Result<Value, GeoChatError> {
        let request = ToolRequest::new(Capability::Buffer)
            .param("lat", lat)
            .param("lon", lon)
            .param("distance_km", distance_km);
        self.send(&request).await.map(unwrap_result)
    }

    async fn invoke_tool(
        &self,
        tool: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, GeoChatError> {
        let request = ToolRequest::new(Capability::Tool)
            .param("tool", tool)
            .param("params", Value::Object(params.clone()));
        self.send(&request).await.map(unwrap_result)
    }
}

#[async_trait]
impl ChatBackend for HttpGisBackend {
    async fn chat(&self, query: &str) -> Result<String, GeoChatError> {
        let request = ToolRequest::new(Capability::Chat).param("query", query);
        let value = self.send(&request).await?;
        value
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GeoChatError::Transport("Malformed chat response".to_string()))
    }
}

//! Client for the GIS server that backs geocoding, buffering and named tools
//! (and optionally chat).
//!
//! Every endpoint takes a JSON body and answers either with its payload or
//! with `{"error": "..."}`. The HTTP status is secondary: an `error` field is a
//! backend error whatever the status, and a success status with an unreadable
//! body is a transport error.

pub mod client;

pub use client::HttpGisBackend;

use crate::core::error::GeoChatError;
use reqwest::StatusCode;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Chat,
    Geocode,
    Buffer,
    Tool,
}

impl Capability {
    pub fn path(&self) -> &'static str {
        match self {
            Capability::Chat => "api/chat",
            Capability::Geocode => "api/geocode",
            Capability::Buffer => "api/buffer",
            Capability::Tool => "api/tools",
        }
    }
}

/// One outbound call: which capability, with which JSON parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub capability: Capability,
    pub params: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            params: Map::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// Normalises one server answer into a payload or a backend/transport error.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Value, GeoChatError> {
    let parsed = serde_json::from_str::<Value>(body);

    if let Ok(Value::Object(map)) = &parsed {
        if let Some(error) = map.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(GeoChatError::Backend(message));
        }
    }

    if !status.is_success() {
        return Err(GeoChatError::Backend(format!("Server returned {}", status)));
    }

    parsed.map_err(|e| GeoChatError::Transport(format!("Invalid response body: {}", e)))
}

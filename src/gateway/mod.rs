//! Dispatches classified commands to the backend capability that serves them.
//!
//! The gateway issues exactly one collaborator call per dispatch. It does not
//! retry, cache, or time out on its own; collaborator errors come back
//! unchanged as `Backend` or `Transport` errors.

use crate::commands::Command;
use crate::core::error::GeoChatError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Whether the pair lies within WGS84 latitude/longitude bounds.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub location: String,
    pub coordinates: Coordinates,
}

/// Answers free-text questions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, query: &str) -> Result<String, GeoChatError>;
}

/// Deterministic GIS capabilities.
#[async_trait]
pub trait GisBackend: Send + Sync {
    async fn geocode(&self, location: &str) -> Result<GeocodeResult, GeoChatError>;

    async fn buffer(&self, lat: f64, lon: f64, distance_km: f64) -> Result<Value, GeoChatError>;

    async fn invoke_tool(&self, tool: &str, params: &Map<String, Value>)
    -> Result<Value, GeoChatError>;
}

/// Successful outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    Answer(String),
    Geocoded(GeocodeResult),
    Buffer {
        lat: f64,
        lon: f64,
        distance_km: f64,
        result: Value,
    },
    Tool {
        name: String,
        result: Value,
    },
}

pub type ToolResult = Result<ToolPayload, GeoChatError>;

pub struct ToolGateway {
    chat: Arc<dyn ChatBackend>,
    gis: Arc<dyn GisBackend>,
}

impl ToolGateway {
    pub fn new(chat: Arc<dyn ChatBackend>, gis: Arc<dyn GisBackend>) -> Self {
        Self { chat, gis }
    }

    pub async fn dispatch(&self, command: &Command) -> ToolResult {
        tracing::info!(kind = command.kind(), "dispatching command");

        let result = match command {
            Command::Chat { text } => self.chat.chat(text).await.map(ToolPayload::Answer),
            Command::Geocode { location } => self.geocode(location).await.map(ToolPayload::Geocoded),
            Command::Buffer {
                lat,
                lon,
                distance_km,
            } => self
                .gis
                .buffer(*lat, *lon, *distance_km)
                .await
                .map(|result| ToolPayload::Buffer {
                    lat: *lat,
                    lon: *lon,
                    distance_km: *distance_km,
                    result,
                }),
            Command::Tool { name, params } => {
                self.gis
                    .invoke_tool(name, params)
                    .await
                    .map(|result| ToolPayload::Tool {
                        name: name.clone(),
                        result,
                    })
            }
            Command::Help | Command::Quit | Command::Unknown { .. } => Err(GeoChatError::Input(
                format!("'{}' is handled locally and has no backend", command.kind()),
            )),
        };

        if let Err(e) = &result {
            match e {
                GeoChatError::Transport(_) => tracing::error!(kind = command.kind(), error = %e, "dispatch failed"),
                _ => tracing::warn!(kind = command.kind(), error = %e, "dispatch returned an error"),
            }
        }

        result
    }

    /// Geocodes a single name. Also used by the automatic place-detection path.
    pub async fn geocode(&self, location: &str) -> Result<GeocodeResult, GeoChatError> {
        self.gis.geocode(location).await
    }
}

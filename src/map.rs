use crate::core::error::GeoChatError;
use crate::gateway::Coordinates;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub label: String,
    pub coordinates: Coordinates,
    pub zoom: u8,
}

/// Opaque identifier of a rendered map, handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapHandle(String);

impl MapHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait MapRenderer: Send + Sync {
    fn render(&self, request: &MapRequest) -> Result<MapHandle, GeoChatError>;
}

/// Renders maps as OpenStreetMap links centred on the point, with a marker.
pub struct OsmLinkRenderer;

impl MapRenderer for OsmLinkRenderer {
    fn render(&self, request: &MapRequest) -> Result<MapHandle, GeoChatError> {
        let Coordinates { lat, lon } = request.coordinates;
        if !request.coordinates.is_valid() {
            return Err(GeoChatError::Input(format!(
                "Cannot map {}: coordinates ({}, {}) are out of range",
                request.label, lat, lon
            )));
        }
        Ok(MapHandle::new(format!(
            "https://www.openstreetmap.org/?mlat={lat:.5}&mlon={lon:.5}#map={zoom}/{lat:.5}/{lon:.5}",
            zoom = request.zoom
        )))
    }
}

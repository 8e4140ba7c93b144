pub mod handler;
pub mod registry;
pub mod router;

use serde_json::{Map, Value};

pub use router::{CommandRouter, create_command_router};

/// A classified user utterance. Built once per turn and consumed by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Free-text question for the AI backend
    Chat { text: String },
    /// `/geocode <name...>`
    Geocode { location: String },
    /// `/buffer <lat> <lon> <distance_km>`
    Buffer { lat: f64, lon: f64, distance_km: f64 },
    /// `/tool <name> <json-params>`
    Tool {
        name: String,
        params: Map<String, Value>,
    },
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// A slash command nobody registered
    Unknown { raw: String, name: String },
}

impl Command {
    /// Whether handling this command needs a backend round-trip.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Command::Chat { .. } | Command::Geocode { .. } | Command::Buffer { .. } | Command::Tool { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::Chat { .. } => "chat",
            Command::Geocode { .. } => "geocode",
            Command::Buffer { .. } => "buffer",
            Command::Tool { .. } => "tool",
            Command::Help => "help",
            Command::Quit => "quit",
            Command::Unknown { .. } => "unknown",
        }
    }
}

use super::Command;
use crate::core::error::GeoChatError;
use serde_json::Value;

/// Turns the whitespace-split arguments of one slash command into a `Command`.
/// Parsing either yields a complete variant or an error; nothing in between.
pub trait CommandHandler: Send + Sync {
    fn parse(&self, args: &[&str]) -> Result<Command, GeoChatError>;
    fn help(&self) -> &'static str;
}

pub struct GeocodeCommand;
pub struct BufferCommand;
pub struct ToolCommand;
pub struct HelpCommand;
pub struct QuitCommand;

pub const GEOCODE_USAGE: &str = "/geocode [location name]";
pub const BUFFER_USAGE: &str = "/buffer [lat] [lon] [distance_km]";
pub const TOOL_USAGE: &str = "/tool [tool_name] [json_params]";

impl CommandHandler for GeocodeCommand {
    fn parse(&self, args: &[&str]) -> Result<Command, GeoChatError> {
        if args.is_empty() {
            return Err(GeoChatError::Usage(GEOCODE_USAGE.to_string()));
        }
        Ok(Command::Geocode {
            location: args.join(" "),
        })
    }

    fn help(&self) -> &'static str {
        "/geocode <location name> - Resolve a place name to coordinates"
    }
}

impl CommandHandler for BufferCommand {
    fn parse(&self, args: &[&str]) -> Result<Command, GeoChatError> {
        if args.len() < 3 {
            return Err(GeoChatError::Usage(BUFFER_USAGE.to_string()));
        }

        let numbers = args[..3]
            .iter()
            .map(|token| token.parse::<f64>().ok().filter(|n| n.is_finite()))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| GeoChatError::Parse("Invalid coordinates or distance".to_string()))?;

        Ok(Command::Buffer {
            lat: numbers[0],
            lon: numbers[1],
            distance_km: numbers[2],
        })
    }

    fn help(&self) -> &'static str {
        "/buffer <lat> <lon> <distance_km> - Create a buffer zone around a point"
    }
}

impl CommandHandler for ToolCommand {
    fn parse(&self, args: &[&str]) -> Result<Command, GeoChatError> {
        if args.len() < 2 {
            return Err(GeoChatError::Usage(TOOL_USAGE.to_string()));
        }

        let name = args[0].to_string();
        let raw_params = args[1..].join(" ");
        let params = match serde_json::from_str::<Value>(&raw_params) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(GeoChatError::Parse(
                    "Invalid JSON parameters: expected a JSON object".to_string(),
                ));
            }
            Err(e) => {
                return Err(GeoChatError::Parse(format!("Invalid JSON parameters: {}", e)));
            }
        };

        Ok(Command::Tool { name, params })
    }

    fn help(&self) -> &'static str {
        "/tool <name> <json> - Invoke a named GIS tool with JSON parameters"
    }
}

impl CommandHandler for HelpCommand {
    fn parse(&self, _args: &[&str]) -> Result<Command, GeoChatError> {
        Ok(Command::Help)
    }

    fn help(&self) -> &'static str {
        "/help - Show available commands"
    }
}

impl CommandHandler for QuitCommand {
    fn parse(&self, _args: &[&str]) -> Result<Command, GeoChatError> {
        Ok(Command::Quit)
    }

    fn help(&self) -> &'static str {
        "/quit - Exit the chat session"
    }
}

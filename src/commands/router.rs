use super::{
    Command,
    handler::{BufferCommand, GeocodeCommand, HelpCommand, QuitCommand, ToolCommand},
    registry::CommandRegistry,
};
use crate::core::error::GeoChatError;
use console::style;
use std::sync::Arc;

/// Classifies raw utterances. Pure and synchronous: no I/O happens here.
#[derive(Clone)]
pub struct CommandRouter {
    registry: Arc<CommandRegistry>,
}

impl CommandRouter {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Maps every input to exactly one `Command`, or to the usage/parse error
    /// of a recognised command with bad arguments.
    ///
    /// Input whose first non-blank character is `/` is a command; the name is
    /// matched case-insensitively and unregistered names become
    /// `Command::Unknown`. Everything else is a chat query.
    pub fn classify(&self, raw: &str) -> Result<Command, GeoChatError> {
        let trimmed = raw.trim_start();
        if !trimmed.starts_with('/') {
            return Ok(Command::Chat {
                text: raw.to_string(),
            });
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let command = parts[0];
        let args = &parts[1..];
        let name = command[1..].to_lowercase();

        tracing::debug!(command = %name, args = args.len(), "classifying slash command");

        match self.registry.parse(&name, args) {
            Some(result) => result,
            None => Ok(Command::Unknown {
                raw: raw.to_string(),
                name: command.to_string(),
            }),
        }
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }

    pub fn help_text(&self) -> String {
        let title = style("Available Commands").bold().underlined();
        let mut lines = vec![title.to_string()];
        lines.extend(self.registry.help_lines().into_iter().map(str::to_string));
        lines.push("Anything else is sent to the assistant as a question.".to_string());
        lines.join("\n")
    }
}

pub fn create_command_router() -> CommandRouter {
    let mut registry = CommandRegistry::new();

    registry.register("geocode", GeocodeCommand);
    registry.register("buffer", BufferCommand);
    registry.register("tool", ToolCommand);
    registry.register("help", HelpCommand);
    registry.register("quit", QuitCommand);

    CommandRouter::new(Arc::new(registry))
}

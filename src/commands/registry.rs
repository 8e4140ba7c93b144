use crate::commands::handler::CommandHandler;
use crate::commands::Command;
use crate::core::error::GeoChatError;
use std::collections::HashMap;
use std::sync::Arc;

/// Slash-command handlers keyed by lowercase command name (without the `/`).
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    order: Vec<String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register<C: CommandHandler + 'static>(&mut self, name: &str, command: C) {
        let name = name.to_lowercase();
        if !self.handlers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.handlers.insert(name, Arc::new(command));
    }

    /// Parses `args` with the handler registered under `name`, or `None` when
    /// no handler is registered.
    pub fn parse(&self, name: &str, args: &[&str]) -> Option<Result<Command, GeoChatError>> {
        self.handlers.get(name).map(|handler| handler.parse(args))
    }

    /// Command names in registration order.
    pub fn get_command_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Help lines in registration order.
    pub fn help_lines(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|handler| handler.help())
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

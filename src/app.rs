use crate::cli::Args;
use crate::core::error::GeoChatError;
use crate::display;
use crate::input;
use crate::session::{ChatSession, LocatedPlace};
use is_terminal::IsTerminal;
use std::io::{self, Read};
use tokio::task::JoinHandle;

pub struct Application {
    pub args: Args,
    pub session: ChatSession,
}

impl Application {
    pub fn new(args: Args, session: ChatSession) -> Self {
        Self { args, session }
    }

    pub async fn run(&mut self) -> Result<(), GeoChatError> {
        if self.args.chat {
            return self.handle_continuous_chat_mode().await;
        }

        if let Some(query) = self.args.query.clone() {
            return self.handle_single_turn(&query).await;
        }

        if !io::stdin().is_terminal() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| GeoChatError::Input(format!("Failed to read from stdin: {}", e)))?;
            return self.handle_single_turn(&buffer).await;
        }

        self.handle_continuous_chat_mode().await
    }

    async fn handle_single_turn(&mut self, query: &str) -> Result<(), GeoChatError> {
        if query.trim().is_empty() {
            return Err(GeoChatError::Input("No query provided".to_string()));
        }
        self.turn(query).await
    }

    async fn handle_continuous_chat_mode(&mut self) -> Result<(), GeoChatError> {
        display::display_welcome();

        let mut editor = input::create_editor(self.session.router().clone())?;

        while self.session.should_continue() {
            let line = match input::read_input(&mut editor)? {
                Some(line) => line,
                None => break,
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Err(e) = self.turn(&line).await {
                display::display_error(&e.to_string());
            }
        }

        input::save_history(&mut editor)?;

        Ok(())
    }

    /// Runs one turn, prints what it appended, then waits for the automatic
    /// geocode so its map link lands under the answer.
    async fn turn(&mut self, line: &str) -> Result<(), GeoChatError> {
        let before = self.session.messages().len();
        let outcome = self.session.submit(line).await?;

        display::display_new_messages(self.session.messages(), before);

        if let Some(map) = &outcome.map {
            display::display_map("Map:", map);
        }

        if let Some(task) = outcome.auto_geocode {
            report_auto_geocode(task).await;
        }

        Ok(())
    }
}

async fn report_auto_geocode(task: JoinHandle<Option<LocatedPlace>>) {
    match task.await {
        Ok(Some(place)) => display::display_located(&place),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "automatic geocode task did not complete"),
    }
}

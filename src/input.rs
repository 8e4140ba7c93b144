use crate::commands::CommandRouter;
use crate::config::Config;
use crate::core::error::GeoChatError;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::{self, MatchingBracketValidator, Validator};
use rustyline::{CompletionType, Context, EditMode, Editor, Helper};
use std::borrow::Cow;

/// Completes slash-command names from the router's registry.
pub struct CommandCompleter {
    router: CommandRouter,
}

impl CommandCompleter {
    pub fn new(router: CommandRouter) -> Self {
        Self { router }
    }

    fn candidates(&self, line: &str, pos: usize) -> Vec<Pair> {
        let Some(typed) = line.get(1..pos) else {
            return Vec::new();
        };
        if !line.starts_with('/') || typed.contains(char::is_whitespace) {
            return Vec::new();
        }
        let typed = typed.to_lowercase();

        self.router
            .get_command_names()
            .into_iter()
            .filter(|name| name.starts_with(&typed))
            .map(|name| Pair {
                display: format!("/{}", name),
                replacement: name,
            })
            .collect()
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // 1 is the position after '/'
        Ok((1, self.candidates(line, pos)))
    }
}

/// Helper struct that combines all rustyline components
pub struct GeoHelper {
    completer: CommandCompleter,
    highlighter: MatchingBracketHighlighter,
    hinter: HistoryHinter,
    validator: MatchingBracketValidator,
}

impl GeoHelper {
    pub fn new(router: CommandRouter) -> Self {
        Self {
            completer: CommandCompleter::new(router),
            highlighter: MatchingBracketHighlighter::new(),
            hinter: HistoryHinter {},
            validator: MatchingBracketValidator::new(),
        }
    }
}

impl Helper for GeoHelper {}

impl Completer for GeoHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for GeoHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for GeoHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(style(hint).dim().to_string())
    }

    fn highlight_candidate<'c>(
        &self,
        candidate: &'c str,
        completion: CompletionType,
    ) -> Cow<'c, str> {
        self.highlighter.highlight_candidate(candidate, completion)
    }
}

impl Validator for GeoHelper {
    fn validate(
        &self,
        ctx: &mut validate::ValidationContext,
    ) -> rustyline::Result<validate::ValidationResult> {
        self.validator.validate(ctx)
    }

    fn validate_while_typing(&self) -> bool {
        self.validator.validate_while_typing()
    }
}

/// Creates a configured rustyline editor
pub fn create_editor(router: CommandRouter) -> Result<Editor<GeoHelper, FileHistory>, GeoChatError> {
    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| GeoChatError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(GeoHelper::new(router)));

    if let Err(e) = editor.load_history(&Config::history_path()) {
        tracing::debug!(error = %e, "no input history loaded");
    }

    Ok(editor)
}

/// Reads a line of input using rustyline. `None` means the user wants out.
pub fn read_input(
    editor: &mut Editor<GeoHelper, FileHistory>,
) -> Result<Option<String>, GeoChatError> {
    let prompt = if cfg!(windows) && std::env::var("PSModulePath").is_ok() {
        "> ".to_string()
    } else {
        style("> ").bold().cyan().to_string()
    };
    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                editor
                    .add_history_entry(line.as_str())
                    .map_err(|e| GeoChatError::Input(format!("Failed to add history entry: {}", e)))?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            println!("Exiting...");
            Ok(None)
        }
        Err(err) => Err(GeoChatError::Input(format!("Input error: {}", err))),
    }
}

/// Saves the editor history
pub fn save_history(editor: &mut Editor<GeoHelper, FileHistory>) -> Result<(), GeoChatError> {
    let history_path = Config::history_path();

    if let Some(parent) = history_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    editor
        .save_history(&history_path)
        .map_err(|e| GeoChatError::Input(format!("Failed to save history: {}", e)))
}

//! Slash commands for interactive mode

mod examples;
mod history;

pub use examples::ExamplesCommand;
pub use history::HistoryCommand;

use crate::session::ChatSession;

/// Result of executing a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Remove the last exchange
    Undo,
    /// Remove the last exchange and send its message again
    Retry,
    /// Send a message as if the user had typed it
    Send(String),
    /// Show a message to the user (not sent to the model)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, session: &ChatSession) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "undo" | "u" => CommandResult::Undo,

        "retry" | "r" => CommandResult::Retry,

        "examples" | "e" => ExamplesCommand::list(),

        "example" => ExamplesCommand::execute(args),

        "history" => HistoryCommand::execute(session),

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /examples, /e        List example questions
  /example <n>         Ask example question number n
  /history             Show the conversation so far
  /retry, /r           Ask the last question again
  /undo, /u            Forget the last question and answer
  /clear, /c           Clear conversation history
  /quit, /exit, /q     Exit socra

Press Ctrl-C while an answer is streaming to stop it.
Press Ctrl-C or Ctrl-D at the prompt to exit."#
        .to_string()
}

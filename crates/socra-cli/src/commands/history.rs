//! /history command - show the conversation so far

use super::CommandResult;
use crate::session::ChatSession;

pub struct HistoryCommand;

impl HistoryCommand {
    pub fn execute(session: &ChatSession) -> CommandResult {
        if session.is_empty() {
            return CommandResult::Message("No messages yet.".to_string());
        }

        let mut output = String::new();
        for (i, turn) in session.history().iter().enumerate() {
            output.push_str(&format!("[{}] > {}\n", i + 1, turn.user));
            output.push_str(&format!("    {}\n", turn.assistant));
        }
        CommandResult::Message(output.trim_end().to_string())
    }
}

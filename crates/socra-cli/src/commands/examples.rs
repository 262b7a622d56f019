//! /examples and /example commands - starter questions

use super::CommandResult;

/// Questions offered to a new student
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "¿Por qué el cielo es azul?",
    "Explícame la teoría de la relatividad",
    "¿Qué es la ética?",
    "Ayúdame a entender las derivadas",
];

pub struct ExamplesCommand;

impl ExamplesCommand {
    pub fn list() -> CommandResult {
        let mut output = String::from("Example questions:\n\n");
        for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, prompt));
        }
        output.push_str("\nAsk one with: /example <n>");
        CommandResult::Message(output)
    }

    pub fn execute(args: &str) -> CommandResult {
        match args
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| EXAMPLE_PROMPTS.get(i))
        {
            Some(prompt) => CommandResult::Send(prompt.to_string()),
            None => CommandResult::Message(format!(
                "Unknown example: '{}'\nChoose a number from 1 to {}",
                args,
                EXAMPLE_PROMPTS.len()
            )),
        }
    }
}

//! Instruction-delimited prompt building for Mistral-style instruct models

use crate::types::ConversationTurn;

/// Default system instruction: a Spanish-speaking Socratic tutor
pub const SOCRATIC_TUTOR_PROMPT: &str = "Eres un tutor socrático experto y empático.
Tu objetivo es guiar al estudiante para que descubra las respuestas por sí mismo mediante el pensamiento crítico.
1. No des la respuesta directa.
2. Haz preguntas reflexivas y abiertas.
3. Mantén tus respuestas concisas (máximo 3 oraciones).
4. Usa un tono profesional pero alentador.
5. Responde siempre en español.
";

/// Build the full prompt for a new message.
///
/// The system instruction and every completed turn are closed with `</s>`;
/// the new message is left open after `[/INST]` so generation continues there.
pub fn format_prompt(
    system_instruction: &str,
    history: &[ConversationTurn],
    message: &str,
) -> String {
    let mut prompt = format!("<s>[INST] {system_instruction} [/INST]</s>");
    for turn in history {
        prompt.push_str(&format!(
            "<s>[INST] {} [/INST] {} </s>",
            turn.user, turn.assistant
        ));
    }
    prompt.push_str(&format!("<s>[INST] {message} [/INST]"));
    prompt
}

/// Prompt formatter bound to one system instruction
#[derive(Debug, Clone)]
pub struct PromptFormatter {
    system_instruction: String,
}

impl PromptFormatter {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn format(&self, history: &[ConversationTurn], message: &str) -> String {
        format_prompt(&self.system_instruction, history, message)
    }
}

impl Default for PromptFormatter {
    fn default() -> Self {
        Self::new(SOCRATIC_TUTOR_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::new("¿Qué es la ética?", "¿Qué crees tú que es actuar bien?"),
            ConversationTurn::new("Hacer lo correcto", "¿Y quién decide qué es correcto?"),
        ]
    }

    #[test]
    fn test_empty_history() {
        let prompt = format_prompt("Sé breve.", &[], "Hola");
        assert_eq!(prompt, "<s>[INST] Sé breve. [/INST]</s><s>[INST] Hola [/INST]");
    }

    #[test]
    fn test_history_turns_in_order() {
        let prompt = format_prompt("SYS", &history(), "No lo sé");
        assert_eq!(
            prompt,
            "<s>[INST] SYS [/INST]</s>\
             <s>[INST] ¿Qué es la ética? [/INST] ¿Qué crees tú que es actuar bien? </s>\
             <s>[INST] Hacer lo correcto [/INST] ¿Y quién decide qué es correcto? </s>\
             <s>[INST] No lo sé [/INST]"
        );
    }

    #[test]
    fn test_segment_counts() {
        let turns = history();
        let prompt = format_prompt("SYS", &turns, "next");
        // One opening per system turn, history turn and open turn
        assert_eq!(prompt.matches("<s>[INST] ").count(), turns.len() + 2);
        // Every segment but the last one is closed
        assert_eq!(prompt.matches("</s>").count(), turns.len() + 1);
        assert!(prompt.starts_with("<s>[INST] SYS [/INST]</s>"));
        assert!(prompt.ends_with("<s>[INST] next [/INST]"));
    }

    #[test]
    fn test_empty_message_is_well_formed() {
        let prompt = format_prompt("SYS", &[], "");
        assert_eq!(prompt, "<s>[INST] SYS [/INST]</s><s>[INST]  [/INST]");
    }

    #[test]
    fn test_deterministic() {
        let turns = history();
        let a = format_prompt(SOCRATIC_TUTOR_PROMPT, &turns, "¿Por qué el cielo es azul?");
        let b = format_prompt(SOCRATIC_TUTOR_PROMPT, &turns, "¿Por qué el cielo es azul?");
        assert_eq!(a, b);
    }

    #[test]
    fn test_formatter_uses_its_instruction() {
        let formatter = PromptFormatter::new("Tutor");
        assert_eq!(formatter.system_instruction(), "Tutor");
        assert_eq!(
            formatter.format(&[], "hola"),
            format_prompt("Tutor", &[], "hola")
        );
        assert!(
            PromptFormatter::default()
                .format(&[], "x")
                .starts_with("<s>[INST] Eres un tutor socrático")
        );
    }
}

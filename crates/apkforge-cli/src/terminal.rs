//! Terminal-backed prompts.

use apkforge_core::{PipelineError, PromptProvider, Result, Secret};
use dialoguer::{Input, Password};

/// Reads answers from the controlling terminal; passwords are not echoed.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

/// dialoguer appends its own `": "` after the prompt.
fn prompt_label(label: &str) -> &str {
    label.trim_end().trim_end_matches(':').trim_end()
}

fn prompt_error(err: dialoguer::Error) -> PipelineError {
    PipelineError::Prompt(err.to_string())
}

impl PromptProvider for TerminalPrompter {
    fn input(&self, label: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt_label(label))
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn password(&self, label: &str) -> Result<Secret> {
        Password::new()
            .with_prompt(prompt_label(label))
            .allow_empty_password(true)
            .interact()
            .map(Secret::new)
            .map_err(prompt_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_label_strips_trailing_colon() {
        assert_eq!(prompt_label("Keystore Path: "), "Keystore Path");
        assert_eq!(prompt_label("Whats your alias: "), "Whats your alias");
        assert_eq!(prompt_label("Alias"), "Alias");
    }

    #[test]
    fn test_prompt_label_keeps_menu_body() {
        let menu = "Choose:\n1. Create\n2. Use\n3. Skip\nChoice: ";
        assert_eq!(prompt_label(menu), "Choose:\n1. Create\n2. Use\n3. Skip\nChoice");
    }
}

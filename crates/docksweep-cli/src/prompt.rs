//! Interactive prompts, injected as a capability so command logic can be
//! exercised with deterministic answers while the production binary talks
//! to a real terminal.

use dialoguer::{theme::ColorfulTheme, Confirm, Input};

pub trait Prompter {
    /// Yes/no confirmation before a destructive filesystem action.
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool>;

    /// Asks how many jobs to launch. `None` means the operator chose to
    /// exit instead of launching anything.
    fn job_count(&self) -> anyhow::Result<Option<usize>>;
}

/// Production prompter bound to the interactive terminal.
pub struct TermPrompter;

impl Prompter for TermPrompter {
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    fn job_count(&self) -> anyhow::Result<Option<usize>> {
        loop {
            let answer: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("How many jobs should be launched? (n to exit)")
                .interact_text()?;
            let answer = answer.trim().to_lowercase();
            if matches!(answer.as_str(), "n" | "no") {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(count) if count > 0 => return Ok(Some(count)),
                _ => println!("Invalid input. Please enter a positive integer greater than 0."),
            }
        }
    }
}

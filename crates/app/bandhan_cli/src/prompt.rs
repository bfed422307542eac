//! Terminal interaction: the sign-in URL and numbered pickers.

use bandhan_core::auth::provider::ProviderError;
use bandhan_core::entra::InteractivePrompt;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use url::Url;

use crate::{Error, Result};

/// Asks the user to open the authorize URL in a browser.
pub struct TerminalPrompt;

impl InteractivePrompt for TerminalPrompt {
    fn present(&self, authorize_url: &Url) -> std::result::Result<(), ProviderError> {
        eprintln!("\nOpen this URL in a browser to sign in:\n\n  {authorize_url}\n");
        Ok(())
    }
}

/// An item offered by [`Picker::choose`].
pub struct Choice<'a> {
    pub id: &'a str,
    pub label: &'a str,
}

/// Numbered selection over stdin.
pub struct Picker {
    lines: tokio::io::Lines<BufReader<Stdin>>,
}

impl Picker {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `choices` and read a selection. Empty input takes `default`.
    pub async fn choose(
        &mut self,
        title: &str,
        choices: &[Choice<'_>],
        default: Option<&str>,
    ) -> Result<String> {
        if choices.is_empty() {
            return Err(Error::Custom(format!("No {title} available")));
        }
        println!("{title}:");
        for (i, choice) in choices.iter().enumerate() {
            let marker = if Some(choice.id) == default { "*" } else { " " };
            println!("{marker} {:>2}) {} ({})", i + 1, choice.label, choice.id);
        }

        loop {
            println!("Select {title} [1-{}]:", choices.len());
            let Some(line) = self.lines.next_line().await? else {
                return Err(Error::Custom(format!("No {title} selected")));
            };
            match parse_choice(&line, choices, default) {
                Some(id) => return Ok(id),
                None => println!("'{}' is not a valid choice", line.trim()),
            }
        }
    }
}

fn parse_choice(line: &str, choices: &[Choice<'_>], default: Option<&str>) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return default.map(str::to_string);
    }
    if let Ok(n) = line.parse::<usize>() {
        return choices.get(n.checked_sub(1)?).map(|c| c.id.to_string());
    }
    choices.iter().find(|c| c.id == line).map(|c| c.id.to_string())
}

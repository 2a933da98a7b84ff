//! User interaction seam. The workflow only ever talks to `UserPrompt`, so
//! notifications and confirmations are scriptable in tests and replaceable
//! by any host surface.

use std::io::{self, BufRead, Write};

pub trait UserPrompt: Send + Sync {
    /// Blocking notification the user has to acknowledge mentally, not
    /// programmatically.
    fn notify(&self, message: &str);

    /// Explicit yes/no confirmation; defaults to no.
    fn confirm(&self, message: &str) -> bool;

    /// Free-text prompt with a pre-filled suggestion. `None` means the
    /// prompt was dismissed.
    fn prompt(&self, message: &str, suggestion: &str) -> Option<String>;
}

/// Stdio implementation used by the CLI.
pub struct StdioPrompt;

impl UserPrompt for StdioPrompt {
    fn notify(&self, message: &str) {
        println!("{message}");
    }

    fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N]: ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn prompt(&self, message: &str, suggestion: &str) -> Option<String> {
        print!("{message} [{suggestion}]: ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            // EOF counts as a dismissed prompt.
            Ok(0) => None,
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    Some(suggestion.to_string())
                } else {
                    Some(line.to_string())
                }
            }
            Err(_) => None,
        }
    }
}

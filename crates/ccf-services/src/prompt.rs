//! Interactive confirmation before destructive archive operations.

use ccf_core::{ArchiveError, ArchiveResult};
use std::io::{self, BufRead, IsTerminal, Write};

pub trait Prompt: Send + Sync {
    /// Ask `question` and return the raw answer, or `None` when nobody can answer.
    fn ask(&self, question: &str) -> ArchiveResult<Option<String>>;
}

/// Prompts on stdout and reads one line from stdin when stdin is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&self, question: &str) -> ArchiveResult<Option<String>> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Ok(None);
        }

        let mut stdout = io::stdout();
        write!(stdout, "{} [y/N] ", question)
            .and_then(|_| stdout.flush())
            .map_err(|e| ArchiveError::io("<stdout>", e))?;

        let mut answer = String::new();
        stdin
            .lock()
            .read_line(&mut answer)
            .map_err(|e| ArchiveError::io("<stdin>", e))?;
        Ok(Some(answer))
    }
}

/// Never asks; batch jobs proceed without confirmation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompt;

impl Prompt for NonInteractivePrompt {
    fn ask(&self, _question: &str) -> ArchiveResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_never_answers() {
        assert_eq!(NonInteractivePrompt.ask("Delete?").unwrap(), None);
    }
}

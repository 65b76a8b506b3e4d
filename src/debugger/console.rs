use std::io::{self, Write};

/// A source of command lines for the debugger.
pub trait Console {
    /// Show `prompt` (if the console shows prompts at all) and read one line.
    /// Returns `Ok(None)` on EOF.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Ask a yes/no question. Only an answer of `y` confirms; EOF declines.
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.read_line(&format!("{question} (y/n)? "))?;
        Ok(answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y")))
    }
}

/// Line console over stdin for piped, non-interactive sessions.
///
/// Stdin is locked per line only, so the program's own `,` reads can share it.
#[derive(Debug, Default)]
pub struct StdinConsole {
    show_prompts: bool,
}

impl StdinConsole {
    pub fn new(show_prompts: bool) -> Self {
        Self { show_prompts }
    }

    fn read_raw(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
        }
    }
}

fn show(text: &str) -> io::Result<()> {
    let mut stderr = io::stderr();
    write!(stderr, "{text}")?;
    stderr.flush()
}

impl Console for StdinConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.show_prompts {
            show(prompt)?;
        }
        self.read_raw()
    }

    /// Questions are shown even when prompts are hidden.
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        show(&format!("{question} (y/n)? "))?;
        let answer = self.read_raw()?;
        if !self.show_prompts {
            show("\n")?;
        }
        Ok(answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y")))
    }
}

use std::env;
use std::io::{self, IsTerminal};
use reedline::{
    DefaultPrompt, DefaultPromptSegment, Highlighter, HistoryItem, Reedline, Signal, StyledText,
};
use nu_ansi_term::Style;

use crate::config::{self, Settings};
use crate::debugger::commands;
use crate::debugger::console::Console;

/// Prompt shown before every debugger command.
pub const PROMPT: &str = "(bfdbg) ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    // Flag override
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !io::stdin().is_terminal() {
                return Err("cannot start editor: stdin is not a TTY (use --bare or BFDBG_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    // Environment override
    if let Ok(val) = env::var("BFDBG_MODE") {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !io::stdin().is_terminal() {
                    return Err("cannot start editor: stdin is not a TTY (use BFDBG_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid BFDBG_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    // Auto-detect
    if io::stdin().is_terminal() {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

/// Interactive console backed by a line editor with history and highlighting.
pub struct EditorConsole {
    editor: Reedline,
}

impl EditorConsole {
    pub fn new() -> io::Result<Self> {
        Ok(Self { editor: init_line_editor(config::settings())? })
    }
}

impl Console for EditorConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(prompt.trim_end().to_string()),
            DefaultPromptSegment::Empty,
        );

        match self.editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                if !buffer.trim().is_empty() {
                    let _ = self
                        .editor
                        .history_mut()
                        .save(HistoryItem::from_command_line(buffer.clone()));
                }
                Ok(Some(buffer))
            }
            Ok(Signal::CtrlC) => Ok(Some(String::new())), // abandon the line, keep the session
            Ok(Signal::CtrlD) => Ok(None),                // EOF, exit cleanly
            Err(e) => Err(io::Error::other(format!("editor error: {e}"))),
        }
    }
}

fn init_line_editor(settings: &Settings) -> io::Result<Reedline> {
    use reedline::{default_emacs_keybindings, Emacs, FileBackedHistory};

    let keybindings = default_emacs_keybindings();
    let history = FileBackedHistory::new(settings.history_size)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(CommandHighlighter::from_settings(settings)))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

/// Colors debugger input: known verbs, numbers, comparison operators, and
/// anything unrecognized.
#[derive(Default)]
pub struct CommandHighlighter {
    verb: Style,
    number: Style,
    operator: Style,
    unknown: Style,
    plain: Style,
}

impl CommandHighlighter {
    pub fn from_settings(settings: &Settings) -> Self {
        let c = &settings.colors;
        Self {
            verb: Style::new().fg(c.verb).bold(),
            number: Style::new().fg(c.number),
            operator: Style::new().fg(c.operator).bold(),
            unknown: Style::new().fg(c.unknown).underline(),
            plain: Style::new(),
        }
    }

    fn style_for(&self, token: &str, first: bool) -> Style {
        if first {
            if commands::lookup(token).is_some() || commands::is_help(token) {
                self.verb
            } else {
                self.unknown
            }
        } else if token.parse::<i64>().is_ok() {
            self.number
        } else if token.chars().all(|c| matches!(c, '=' | '!' | '<' | '>')) {
            self.operator
        } else {
            self.plain
        }
    }
}

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out = StyledText::new();
        let mut seen_verb = false;
        let mut rest = line;

        while !rest.is_empty() {
            // Whitespace runs are kept verbatim so the buffer renders unchanged.
            let ws = rest.len() - rest.trim_start().len();
            if ws > 0 {
                out.push((self.plain, rest[..ws].to_string()));
                rest = &rest[ws..];
                continue;
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let token = &rest[..end];
            out.push((self.style_for(token, !seen_verb), token.to_string()));
            seen_verb = true;
            rest = &rest[end..];
        }
        out
    }
}
